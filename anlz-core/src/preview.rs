//! PWAV / PWV2 preview waveforms
//!
//! Both tags store one byte per column: height in bits 4-0, whiteness in
//! bits 7-5. PWAV holds the 400-column preview; PWV2 is a separate,
//! four-times coarser encoding (one byte per four preview columns) and
//! can't be derived from PWAV.

use tracing::debug;

use crate::config::RenderConfig;
use crate::error::Result;
use crate::raster::{Raster, RasterComposer};
use crate::tag::{tag_payload, PWAV_TAG, PWV2_TAG};

/// Unscaled raster height: one row per height step
pub const PREVIEW_HEIGHT: usize = 32;

/// Preview columns covered by one PWV2 byte
pub const COARSE_FACTOR: usize = 4;

/// Column height of a preview byte
pub fn height_byte(byte: u8) -> u8 {
    byte % 32
}

/// Single column in a preview waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreviewColumn {
    /// Stored byte
    pub raw: u8,
    /// Height 0-31 (5 bits)
    pub height: u8,
    /// Whiteness 0-7 (3 bits)
    pub whiteness: u8,
}

impl PreviewColumn {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            raw: byte,
            height: height_byte(byte),
            whiteness: byte >> 5,
        }
    }

    /// Gray level of the column, before the foreground boost
    pub fn intensity(&self) -> f32 {
        self.raw as f32 / 32.0
    }
}

/// Decoded PWAV (fine) and PWV2 (coarse) columns, one per raster column
#[derive(Debug, Clone)]
pub struct PreviewWaveform {
    fine: Vec<PreviewColumn>,
    coarse: Vec<PreviewColumn>,
    config: RenderConfig,
}

impl PreviewWaveform {
    pub fn fine(&self) -> &[PreviewColumn] {
        &self.fine
    }

    /// PWV2 columns, each repeated across the four preview columns it covers
    pub fn coarse(&self) -> &[PreviewColumn] {
        &self.coarse
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn fine_raster(&self) -> Raster {
        self.render(&self.fine)
    }

    pub fn coarse_raster(&self) -> Raster {
        self.render(&self.coarse)
    }

    /// Single gray layer; there is no background band in the preview
    fn render(&self, columns: &[PreviewColumn]) -> Raster {
        let mut composer =
            RasterComposer::new(columns.len(), self.config.raster_height(PREVIEW_HEIGHT));
        for (x, column) in columns.iter().enumerate() {
            let level = column.intensity();
            composer.foreground(x, self.config.scale_height(column.height), [level; 3]);
        }
        composer.finish()
    }
}

/// Decode the PWAV and PWV2 tags of an ANLZ buffer
///
/// Both tags are required. PWAV must hold `config.width` bytes and PWV2
/// `ceil(config.width / 4)`.
pub fn decode_preview(buffer: &[u8], config: &RenderConfig) -> Result<PreviewWaveform> {
    config.validate(PREVIEW_HEIGHT)?;
    let fine_bytes = tag_payload(buffer, PWAV_TAG, config.width)?;
    let coarse_bytes = tag_payload(buffer, PWV2_TAG, config.width.div_ceil(COARSE_FACTOR))?;

    let mut fine = Vec::with_capacity(config.raster_width());
    let mut coarse = Vec::with_capacity(config.raster_width());
    for x in 0..config.raster_width() {
        let source = config.source_column(x);
        fine.push(PreviewColumn::from_byte(fine_bytes[source]));
        coarse.push(PreviewColumn::from_byte(coarse_bytes[source / COARSE_FACTOR]));
    }
    debug!(
        "Decoded {} PWAV/PWV2 columns (width_scale={}, height_scale={})",
        fine.len(),
        config.width_scale,
        config.height_scale
    );

    Ok(PreviewWaveform {
        fine,
        coarse,
        config: config.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testutil::{container, preview_section};

    fn preview_file(fine: &[u8], coarse: &[u8]) -> Vec<u8> {
        container(&[
            preview_section(PWAV_TAG, fine),
            preview_section(PWV2_TAG, coarse),
        ])
    }

    #[test]
    fn test_height_byte_range() {
        for b in 0..=255u8 {
            assert!(height_byte(b) < 32);
        }
        assert_eq!(height_byte(37), 5);
    }

    #[test]
    fn test_column_from_byte() {
        let column = PreviewColumn::from_byte(0b1010_0111);
        assert_eq!(column.height, 7);
        assert_eq!(column.whiteness, 5);
        assert_eq!(column.intensity(), 167.0 / 32.0);
    }

    #[test]
    fn test_fine_column_saturates() {
        let mut fine = vec![0u8; 400];
        fine[0] = 37;
        let data = preview_file(&fine, &[0; 100]);
        let raster = decode_preview(&data, &RenderConfig::for_preview())
            .unwrap()
            .fine_raster();

        assert_eq!((raster.width(), raster.height()), (400, 32));
        // 37/32 + 32 stays below 127
        let level = (37.0 / 32.0 + 32.0) / 127.0;
        for row in 0..5 {
            assert_eq!(raster.get(row, 0), Some([level; 3]));
        }
        assert_eq!(raster.get(5, 0), Some([0.0; 3]));
        assert_eq!(raster.get(0, 1), Some([0.0; 3]));
    }

    #[test]
    fn test_coarse_index_quartered() {
        let fine = vec![0u8; 400];
        let coarse: Vec<u8> = (0..100u8).map(|i| i % 32).collect();
        let preview = decode_preview(&preview_file(&fine, &coarse), &RenderConfig::for_preview())
            .unwrap();

        assert_eq!(preview.coarse().len(), 400);
        for x in 0..400 {
            assert_eq!(preview.coarse()[x].raw, coarse[x / 4]);
        }

        let raster = preview.coarse_raster();
        assert_eq!(raster.get(0, 7), Some([(1.0 / 32.0 + 32.0) / 127.0; 3]));
        assert_eq!(raster.get(1, 7), Some([0.0; 3]));
        assert_eq!(raster.get(0, 3), Some([0.0; 3]));
    }

    #[test]
    fn test_rasters_normalized() {
        let fine: Vec<u8> = (0..400u32).map(|i| (i * 7 % 256) as u8).collect();
        let coarse: Vec<u8> = (0..100u32).map(|i| (i * 13 % 256) as u8).collect();
        let preview = decode_preview(&preview_file(&fine, &coarse), &RenderConfig::for_preview())
            .unwrap();
        assert!(preview.fine_raster().is_normalized());
        assert!(preview.coarse_raster().is_normalized());
    }

    #[test]
    fn test_missing_pwv2() {
        let data = container(&[preview_section(PWAV_TAG, &[0; 400])]);
        match decode_preview(&data, &RenderConfig::for_preview()) {
            Err(Error::TagNotFound { tag }) => assert_eq!(tag, "PWV2"),
            other => panic!("expected TagNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_pwav() {
        let data = container(&[preview_section(PWV2_TAG, &[0; 100])]);
        match decode_preview(&data, &RenderConfig::for_preview()) {
            Err(Error::TagNotFound { tag }) => assert_eq!(tag, "PWAV"),
            other => panic!("expected TagNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_short_coarse_payload() {
        let data = preview_file(&[0; 400], &[0; 99]);
        match decode_preview(&data, &RenderConfig::for_preview()) {
            Err(Error::BufferTooShort { tag, needed, available }) => {
                assert_eq!(tag, "PWV2");
                assert_eq!(needed, 100);
                assert_eq!(available, 99);
            }
            other => panic!("expected BufferTooShort, got {:?}", other),
        }
    }

    #[test]
    fn test_scaled_preview() {
        let fine: Vec<u8> = (0..400u32).map(|i| (i % 32) as u8).collect();
        let config = RenderConfig {
            width_scale: 2,
            height_scale: 2,
            ..RenderConfig::for_preview()
        };
        let preview = decode_preview(&preview_file(&fine, &[0; 100]), &config).unwrap();
        assert_eq!(preview.fine().len(), 200);
        assert_eq!(preview.fine()[3].raw, 6);

        let raster = preview.fine_raster();
        assert_eq!((raster.width(), raster.height()), (200, 16));
        // Column 3 reads byte 6: 6 / 2 = 3 rows
        assert_ne!(raster.get(2, 3), Some([0.0; 3]));
        assert_eq!(raster.get(3, 3), Some([0.0; 3]));
    }

    #[test]
    fn test_height_scale_taller_than_waveform() {
        let data = preview_file(&[0; 400], &[0; 100]);
        let config = RenderConfig {
            height_scale: 33,
            ..RenderConfig::for_preview()
        };
        assert!(matches!(decode_preview(&data, &config), Err(Error::Config(_))));
    }

    #[test]
    fn test_fine_columns_are_independent() {
        let fine: Vec<u8> = (0..400u32).map(|i| (i % 32) as u8).collect();
        let coarse = vec![10u8; 100];
        let mut changed = fine.clone();
        changed[123] = 3;

        let config = RenderConfig::for_preview();
        let a = decode_preview(&preview_file(&fine, &coarse), &config).unwrap();
        let b = decode_preview(&preview_file(&changed, &coarse), &config).unwrap();

        let (fa, fb) = (a.fine_raster(), b.fine_raster());
        for column in 0..400 {
            let same = (0..32).all(|row| fa.get(row, column) == fb.get(row, column));
            assert_eq!(same, column != 123, "column {}", column);
        }
        assert_eq!(a.coarse_raster(), b.coarse_raster());
    }

    #[test]
    fn test_coarse_byte_covers_four_columns() {
        let fine = vec![5u8; 400];
        let coarse = vec![10u8; 100];
        let mut changed = coarse.clone();
        changed[10] = 25;

        let config = RenderConfig::for_preview();
        let a = decode_preview(&preview_file(&fine, &coarse), &config).unwrap();
        let b = decode_preview(&preview_file(&fine, &changed), &config).unwrap();

        let (ca, cb) = (a.coarse_raster(), b.coarse_raster());
        for column in 0..400 {
            let same = (0..32).all(|row| ca.get(row, column) == cb.get(row, column));
            assert_eq!(same, !(40..44).contains(&column), "column {}", column);
        }
        assert_eq!(a.fine_raster(), b.fine_raster());
    }
}
