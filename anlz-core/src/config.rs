//! Render configuration

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Native column count of the `PWV4` color preview
pub const COLOR_PREVIEW_WIDTH: usize = 1200;
/// Native column count of the `PWAV` preview
pub const PREVIEW_WIDTH: usize = 400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// ANLZ file the buffer was read from (informational)
    pub input_path: Option<PathBuf>,
    /// Number of stored columns to render
    pub width: usize,
    /// Vertical divisor applied to every bar height
    pub height_scale: usize,
    /// Column stride; one raster column per `width_scale` stored columns
    pub width_scale: usize,
}

impl RenderConfig {
    /// Defaults for the `PWV4` color preview
    pub fn for_color_preview() -> Self {
        Self {
            input_path: None,
            width: COLOR_PREVIEW_WIDTH,
            height_scale: 1,
            width_scale: 1,
        }
    }

    /// Defaults for the `PWAV`/`PWV2` preview pair
    pub fn for_preview() -> Self {
        Self {
            width: PREVIEW_WIDTH,
            ..Self::for_color_preview()
        }
    }

    pub fn with_input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Reject settings that would produce an empty raster or divide by zero
    ///
    /// `native_height` is the unscaled raster height of the waveform being
    /// decoded (128 for PWV4, 32 for PWAV).
    pub fn validate(&self, native_height: usize) -> Result<()> {
        if self.height_scale == 0 {
            return Err(Error::Config("height scale must be at least 1".into()));
        }
        if self.height_scale > native_height {
            return Err(Error::Config(format!(
                "height scale {} leaves no rows of a {}-row waveform",
                self.height_scale, native_height
            )));
        }
        if self.width_scale == 0 {
            return Err(Error::Config("width scale must be at least 1".into()));
        }
        if self.width == 0 {
            return Err(Error::Config("width must be at least 1".into()));
        }
        if self.width < self.width_scale {
            return Err(Error::Config(format!(
                "width {} is smaller than width scale {}",
                self.width, self.width_scale
            )));
        }
        Ok(())
    }

    /// Columns in the rendered raster
    pub fn raster_width(&self) -> usize {
        self.width / self.width_scale
    }

    /// Rows in a raster whose unscaled height is `native_height`
    pub fn raster_height(&self, native_height: usize) -> usize {
        native_height / self.height_scale
    }

    /// Index of the stored column drawn at raster column `x`
    pub(crate) fn source_column(&self, x: usize) -> usize {
        x * self.width_scale
    }

    pub(crate) fn scale_height(&self, magnitude: u8) -> usize {
        magnitude as usize / self.height_scale
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::for_color_preview()
    }
}
