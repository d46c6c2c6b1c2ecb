//! anlz-core: Pioneer ANLZ waveform decoding
//!
//! This crate reads the tagged sections of ANLZ files (.DAT, .EXT, .2EX) and
//! renders their preview waveforms into RGB rasters:
//! - PWV4: color preview (6 bytes per column)
//! - PWAV / PWV2: monochrome preview and its coarse companion
//!
//! Based on Deep Symmetry's reverse engineering of the ANLZ format.

pub mod config;
pub mod error;
pub mod tag;
pub mod color;
pub mod preview;
pub mod raster;

#[cfg(test)]
mod testutil;

pub use config::RenderConfig;
pub use error::{Error, Result};
pub use tag::{find_tag, read_anlz_file, tag_payload, AnlzFile, TagBlock, TagStream};
pub use color::{decode_color_preview, ColorPreview, ColorWaveformFrame};
pub use preview::{decode_preview, PreviewColumn, PreviewWaveform};
pub use raster::{Pixel, Raster, RasterComposer};
