//! ANLZ tag location and walking (.DAT, .EXT, .2EX)
//!
//! ANLZ files are **big-endian**: a PMAI file header followed by tagged
//! sections. Every section starts with the same 12 bytes:
//! - 4 bytes: tag code (`PWAV`, `PWV4`, ...)
//! - 4 bytes: header length (tag code included)
//! - 4 bytes: tag length (header + body)
//!
//! Waveform decoders don't need the walker: they locate their tag by plain
//! byte search and skip a fixed header to reach the samples.
//!
//! Reference: https://djl-analysis.deepsymmetry.org/rekordbox-export-analysis/anlz.html

use std::fs;
use std::io::Cursor;
use std::path::Path;

use binrw::{binread, BinRead};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{tag_name, Error, Result};

/// File header tag
pub const PMAI_TAG: &[u8; 4] = b"PMAI";
pub const PWAV_TAG: &[u8; 4] = b"PWAV";
pub const PWV2_TAG: &[u8; 4] = b"PWV2";
pub const PWV4_TAG: &[u8; 4] = b"PWV4";

/// Common section header: code + header length + tag length
pub const TAG_HEADER_LEN: usize = 12;

/// Bytes from the tag code to the first sample, per waveform tag
const PAYLOAD_SKIPS: [(&[u8; 4], usize); 3] = [
    (PWV4_TAG, 0x18),
    (PWAV_TAG, 0x14),
    (PWV2_TAG, 0x14),
];

/// Known tags: code, name, expected header length
const KNOWN_TAGS: [(&[u8; 4], &str, u32); 15] = [
    (b"PQTZ", "beat_grid", 24),
    (b"PQT2", "beat_grid2", 56),
    (b"PCOB", "cue_list", 24),
    (b"PCO2", "cue_list2", 20),
    (b"PPTH", "path", 16),
    (b"PVBR", "vbr", 16),
    (b"PSSI", "structure", 32),
    (PWAV_TAG, "wf_preview", 20),
    (PWV2_TAG, "wf_tiny_preview", 20),
    (b"PWV3", "wf_detail", 24),
    (PWV4_TAG, "wf_color", 24),
    (b"PWV5", "wf_color_detail", 24),
    (b"PWV6", "PWV6", 20),
    (b"PWV7", "PWV7", 24),
    (b"PWVC", "PWVC", 14),
];

/// Position of the first occurrence of `needle` in `haystack`
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Byte offset of the first `code` in `buffer`
pub fn find_tag(buffer: &[u8], code: &[u8; 4]) -> Result<usize> {
    let offset = find_subsequence(buffer, code).ok_or_else(|| Error::TagNotFound {
        tag: tag_name(code),
    })?;
    debug!("Found {} at offset {:#x}", tag_name(code), offset);
    Ok(offset)
}

/// Header bytes to skip between a tag code and its samples
///
/// Tags outside the waveform table fall back to the common 12-byte header.
pub fn payload_skip(code: &[u8; 4]) -> usize {
    PAYLOAD_SKIPS
        .iter()
        .find(|(tag, _)| *tag == code)
        .map(|(_, skip)| *skip)
        .unwrap_or(TAG_HEADER_LEN)
}

/// Locate `code` and return exactly `span` sample bytes after its header
///
/// Header-declared lengths are not consulted; only the remaining buffer
/// length is checked.
pub fn tag_payload<'a>(buffer: &'a [u8], code: &[u8; 4], span: usize) -> Result<&'a [u8]> {
    let offset = find_tag(buffer, code)?;
    let start = offset + payload_skip(code);
    let available = buffer.len().saturating_sub(start);
    if available < span {
        return Err(Error::BufferTooShort {
            tag: tag_name(code),
            needed: span,
            available,
        });
    }
    Ok(&buffer[start..start + span])
}

/// Human-readable name of a tag code
pub fn tag_label(code: &[u8; 4]) -> &'static str {
    KNOWN_TAGS
        .iter()
        .find(|(tag, _, _)| *tag == code)
        .map(|(_, name, _)| *name)
        .unwrap_or("unknown")
}

fn expected_header_len(code: &[u8; 4]) -> Option<u32> {
    KNOWN_TAGS
        .iter()
        .find(|(tag, _, _)| *tag == code)
        .map(|(_, _, len)| *len)
}

/// PMAI file header (28 bytes)
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Always "PMAI"
    pub magic: [u8; 4],
    /// Header length, where the first tag starts
    pub len_header: u32,
    /// Total file length
    pub len_file: u32,
    /// Unknown
    pub unknown: [u32; 4],
}

/// The 12 bytes every tag starts with
#[binread]
#[br(big)]
#[derive(Debug, Clone, Copy)]
struct TagHeader {
    type_code: [u8; 4],
    len_header: u32,
    len_tag: u32,
}

/// One tagged section, borrowed from the source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagBlock<'a> {
    pub type_code: [u8; 4],
    /// Offset of the tag code in the source buffer
    pub offset: usize,
    pub len_header: u32,
    pub len_tag: u32,
    /// The whole section, tag code included
    pub data: &'a [u8],
}

impl<'a> TagBlock<'a> {
    /// Section body after the declared header
    pub fn payload(&self) -> &'a [u8] {
        let start = (self.len_header as usize).min(self.data.len());
        &self.data[start..]
    }

    pub fn code(&self) -> String {
        tag_name(&self.type_code)
    }

    pub fn label(&self) -> &'static str {
        tag_label(&self.type_code)
    }
}

/// Walks the tags of a PMAI container in file order
pub struct TagStream<'a> {
    buffer: &'a [u8],
    header: FileHeader,
    pos: usize,
    end: usize,
    done: bool,
}

impl<'a> TagStream<'a> {
    pub fn new(buffer: &'a [u8]) -> Result<Self> {
        if !buffer.starts_with(PMAI_TAG) {
            return Err(Error::InvalidHeader(format!(
                "expected PMAI, found {}",
                buffer[..buffer.len().min(4)].escape_ascii()
            )));
        }
        let header = FileHeader::read(&mut Cursor::new(buffer))?;
        let pos = header.len_header as usize;
        let end = (header.len_file as usize).min(buffer.len());
        if (header.len_file as usize) > buffer.len() {
            warn!(
                "PMAI declares {} bytes but buffer holds {}",
                header.len_file,
                buffer.len()
            );
        }

        Ok(Self {
            buffer,
            header,
            pos,
            end,
            done: false,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    fn malformed(&mut self, reason: impl Into<String>) -> Error {
        self.done = true;
        Error::MalformedTag {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn next_block(&mut self) -> Result<TagBlock<'a>> {
        if self.end - self.pos < TAG_HEADER_LEN {
            return Err(self.malformed("truncated tag header"));
        }
        let tag = TagHeader::read(&mut Cursor::new(&self.buffer[self.pos..]))?;
        let len_tag = tag.len_tag as usize;

        if len_tag < TAG_HEADER_LEN {
            return Err(self.malformed(format!("tag length {} below header size", len_tag)));
        }
        if self.pos + len_tag > self.buffer.len() {
            return Err(self.malformed(format!(
                "{} runs {} bytes past end of buffer",
                tag_name(&tag.type_code),
                self.pos + len_tag - self.buffer.len()
            )));
        }
        if let Some(expected) = expected_header_len(&tag.type_code) {
            if expected != tag.len_header {
                warn!(
                    "len_header ({}) of {} doesn't match the expected value {}",
                    tag.len_header,
                    tag_name(&tag.type_code),
                    expected
                );
            }
        }

        let block = TagBlock {
            type_code: tag.type_code,
            offset: self.pos,
            len_header: tag.len_header,
            len_tag: tag.len_tag,
            data: &self.buffer[self.pos..self.pos + len_tag],
        };
        debug!(
            "Parsed {} at {:#x} (len_header={}, len_tag={})",
            block.code(),
            block.offset,
            block.len_header,
            block.len_tag
        );
        self.pos += len_tag;
        Ok(block)
    }
}

impl<'a> Iterator for TagStream<'a> {
    type Item = Result<TagBlock<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.end {
            return None;
        }
        match self.next_block() {
            Ok(block) => Some(Ok(block)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Row of a tag listing
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TagSummary {
    pub code: String,
    pub name: &'static str,
    pub offset: usize,
    pub len_header: u32,
    pub len_tag: u32,
}

/// A fully walked ANLZ container
#[derive(Debug, Clone)]
pub struct AnlzFile<'a> {
    pub header: FileHeader,
    pub tags: Vec<TagBlock<'a>>,
}

impl<'a> AnlzFile<'a> {
    /// Walk every tag; the first malformed tag aborts the parse
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        let stream = TagStream::new(buffer)?;
        let header = stream.header().clone();
        let tags = stream.collect::<Result<Vec<_>>>()?;
        Ok(Self { header, tags })
    }

    /// First tag with this code
    pub fn tag(&self, code: &[u8; 4]) -> Option<&TagBlock<'a>> {
        self.tags.iter().find(|t| &t.type_code == code)
    }

    /// Every tag with this code
    pub fn tags<'s>(&'s self, code: &'s [u8; 4]) -> impl Iterator<Item = &'s TagBlock<'a>> + 's {
        self.tags.iter().filter(move |t| &t.type_code == code)
    }

    pub fn contains(&self, code: &[u8; 4]) -> bool {
        self.tag(code).is_some()
    }

    pub fn tag_types(&self) -> Vec<String> {
        self.tags.iter().map(TagBlock::code).collect()
    }

    pub fn summaries(&self) -> Vec<TagSummary> {
        self.tags
            .iter()
            .map(|t| TagSummary {
                code: t.code(),
                name: t.label(),
                offset: t.offset,
                len_header: t.len_header,
                len_tag: t.len_tag,
            })
            .collect()
    }
}

/// Read an ANLZ file into memory
///
/// Anything other than .DAT, .EXT or .2EX is read anyway, with a warning.
pub fn read_anlz_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_uppercase);
    if !matches!(ext.as_deref(), Some("DAT" | "EXT" | "2EX")) {
        warn!("{:?} does not look like an ANLZ file", path);
    }
    let data = fs::read(path)?;
    debug!("Read {} bytes from {:?}", data.len(), path);
    Ok(data)
}
