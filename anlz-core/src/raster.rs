//! Waveform rasters
//!
//! A raster is a fixed-size grid of RGB pixels stored bottom row first, so
//! `(row, column)` reads the way a waveform is drawn: bars grow upward from
//! row 0. Channels hold unclamped values while a raster is being composed and
//! land in `[0, 1]` once [`Raster::normalize`] has run.

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

use crate::error::Result;

/// One pixel: red, green, blue
pub type Pixel = [f32; 3];

/// Full-scale channel value before normalization
pub const CHANNEL_MAX: f32 = 127.0;

/// Added to every channel of the foreground band
pub const FOREGROUND_BOOST: f32 = 32.0;

/// Brighten a color for the foreground band
pub fn boost(color: Pixel) -> Pixel {
    color.map(|c| c + FOREGROUND_BOOST)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl Raster {
    /// All-black raster
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 3]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Pixel at `row` (0 = bottom) and `column`
    pub fn get(&self, row: usize, column: usize) -> Option<Pixel> {
        if row >= self.height || column >= self.width {
            return None;
        }
        Some(self.pixels[row * self.width + column])
    }

    /// Overwrite rows `0..rows` of `column` with `color`
    ///
    /// Rows past the top are dropped; an out-of-range column is ignored.
    pub fn fill_column(&mut self, column: usize, rows: usize, color: Pixel) {
        if column >= self.width {
            return;
        }
        for row in 0..rows.min(self.height) {
            self.pixels[row * self.width + column] = color;
        }
    }

    /// Clamp every channel to `[0, 127]` and scale to `[0, 1]`
    pub fn normalize(&mut self) {
        for channel in self.pixels.iter_mut().flatten() {
            *channel = channel.clamp(0.0, CHANNEL_MAX) / CHANNEL_MAX;
        }
    }

    /// True when every channel lies in `[0, 1]`
    pub fn is_normalized(&self) -> bool {
        self.pixels
            .iter()
            .flatten()
            .all(|c| (0.0..=1.0).contains(c))
    }

    /// 8-bit image of a normalized raster, top row first
    pub fn to_rgb_image(&self) -> RgbImage {
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let row = self.height - 1 - y as usize;
            let [r, g, b] = self.pixels[row * self.width + x as usize];
            Rgb([to_u8(r), to_u8(g), to_u8(b)])
        })
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_rgb_image()
            .save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Builds a raster layer by layer
///
/// Later fills replace earlier ones cell by cell, so paint the background
/// band of a column before its foreground band. [`finish`](Self::finish)
/// applies the shared clamp-and-normalize step.
pub struct RasterComposer {
    raster: Raster,
}

impl RasterComposer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            raster: Raster::new(width, height),
        }
    }

    pub fn background(&mut self, column: usize, height: usize, color: Pixel) -> &mut Self {
        self.raster.fill_column(column, height, color);
        self
    }

    /// Foreground band, brightened by [`FOREGROUND_BOOST`]
    pub fn foreground(&mut self, column: usize, height: usize, color: Pixel) -> &mut Self {
        self.raster.fill_column(column, height, boost(color));
        self
    }

    pub fn finish(mut self) -> Raster {
        self.raster.normalize();
        self.raster
    }
}
