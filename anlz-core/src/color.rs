//! PWV4 color preview waveform
//!
//! The payload stores one 6-byte entry per column. Channel meanings as far
//! as they are known:
//! - 0: unknown
//! - 1: luminance multiplier (used unmasked)
//! - 2: inverse intensity of the blue waveform
//! - 3: red
//! - 4: green
//! - 5: blue, and the height of the front waveform
//!
//! Every channel except 1 is a 7-bit magnitude (`byte & 0x7F`).

use tracing::debug;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::raster::{Pixel, Raster, RasterComposer, CHANNEL_MAX};
use crate::tag::{tag_payload, PWV4_TAG};

/// Bytes per column
pub const CHANNELS: usize = 6;

/// Unscaled raster height: one row per magnitude step
pub const COLOR_PREVIEW_HEIGHT: usize = 128;

/// Tint of each channel in the single-channel views
const CHANNEL_TINTS: [Pixel; CHANNELS] = [
    [0.5, 0.5, 0.5],
    [0.5, 0.5, 0.5],
    [1.0, 1.0, 1.0],
    [1.0, 0.5, 0.5],
    [0.5, 1.0, 0.5],
    [0.5, 0.5, 1.0],
];

/// Base level of the blue waveform before channel 2 is subtracted
const BLUE_BASE: f32 = 95.0;

/// 7-bit magnitude of a PWV4 byte
pub fn magnitude(byte: u8) -> u8 {
    byte & 0x7F
}

/// One decoded PWV4 column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorWaveformFrame {
    raw: [u8; CHANNELS],
}

impl ColorWaveformFrame {
    pub fn from_bytes(bytes: [u8; CHANNELS]) -> Self {
        Self { raw: bytes }
    }

    /// Masked magnitude of `channel` (0..6)
    pub fn channel(&self, channel: usize) -> u8 {
        magnitude(self.raw[channel])
    }

    /// All six masked magnitudes
    pub fn magnitudes(&self) -> [u8; CHANNELS] {
        self.raw.map(magnitude)
    }

    /// Unmasked channel 1
    pub fn luminance(&self) -> u8 {
        self.raw[1]
    }

    /// Tallest of channels 2..=5
    pub fn background_height(&self) -> u8 {
        (2..CHANNELS).map(|i| self.channel(i)).max().unwrap_or(0)
    }

    pub fn foreground_height(&self) -> u8 {
        self.channel(5)
    }

    /// Red/green/blue from channels 3..=5, scaled by luminance
    pub fn color(&self) -> Pixel {
        let lum = self.luminance() as f32 / CHANNEL_MAX;
        [
            self.channel(3) as f32 * lum,
            self.channel(4) as f32 * lum,
            self.channel(5) as f32 * lum,
        ]
    }

    /// Color of the blue waveform, darker as channel 2 grows
    pub fn blue_color(&self) -> Pixel {
        let d2 = self.channel(2) as f32;
        [BLUE_BASE - d2, BLUE_BASE - d2 * 0.5, BLUE_BASE - d2 * 0.25]
    }
}

/// Decoded PWV4 columns plus the settings they were sampled with
#[derive(Debug, Clone)]
pub struct ColorPreview {
    frames: Vec<ColorWaveformFrame>,
    config: RenderConfig,
}

impl ColorPreview {
    /// One frame per raster column
    pub fn frames(&self) -> &[ColorWaveformFrame] {
        &self.frames
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn composer(&self) -> RasterComposer {
        RasterComposer::new(
            self.frames.len(),
            self.config.raster_height(COLOR_PREVIEW_HEIGHT),
        )
    }

    /// Single channel as flat tinted bars
    ///
    /// Panics if `channel >= CHANNELS`.
    pub fn channel_raster(&self, channel: usize) -> Raster {
        let tint = CHANNEL_TINTS[channel].map(|s| s * CHANNEL_MAX);
        let mut composer = self.composer();
        for (x, frame) in self.frames.iter().enumerate() {
            let height = self.config.scale_height(frame.channel(channel));
            composer.background(x, height, tint);
        }
        composer.finish()
    }

    /// All six single-channel views, channel 0 first
    pub fn channel_rasters(&self) -> Vec<Raster> {
        (0..CHANNELS).map(|i| self.channel_raster(i)).collect()
    }

    /// The colored waveform shown in track browsers
    pub fn color_raster(&self) -> Raster {
        self.layered(ColorWaveformFrame::color)
    }

    /// The blue waveform variant
    pub fn blue_raster(&self) -> Raster {
        self.layered(ColorWaveformFrame::blue_color)
    }

    fn layered(&self, color: impl Fn(&ColorWaveformFrame) -> Pixel) -> Raster {
        let mut composer = self.composer();
        for (x, frame) in self.frames.iter().enumerate() {
            let back = self.config.scale_height(frame.background_height());
            let front = self.config.scale_height(frame.foreground_height());
            let c = color(frame);
            composer.background(x, back, c).foreground(x, front, c);
        }
        composer.finish()
    }
}

/// Decode the PWV4 tag of an ANLZ buffer
///
/// Needs `config.width * 6` bytes after the tag header; fails before
/// touching any column otherwise.
pub fn decode_color_preview(buffer: &[u8], config: &RenderConfig) -> Result<ColorPreview> {
    config.validate(COLOR_PREVIEW_HEIGHT)?;
    let span = config.width.checked_mul(CHANNELS).ok_or_else(|| {
        Error::Config(format!("width {} overflows the PWV4 span", config.width))
    })?;
    let payload = tag_payload(buffer, PWV4_TAG, span)?;

    let frames: Vec<_> = (0..config.raster_width())
        .map(|x| {
            let start = config.source_column(x) * CHANNELS;
            let mut group = [0u8; CHANNELS];
            group.copy_from_slice(&payload[start..start + CHANNELS]);
            ColorWaveformFrame::from_bytes(group)
        })
        .collect();
    debug!(
        "Decoded {} PWV4 columns (width_scale={}, height_scale={})",
        frames.len(),
        config.width_scale,
        config.height_scale
    );

    Ok(ColorPreview {
        frames,
        config: config.clone(),
    })
}
