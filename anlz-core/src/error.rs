//! Error types for anlz-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binary format error: {0}")]
    BinRw(String),

    #[error("Tag {tag} not found")]
    TagNotFound { tag: String },

    #[error("Buffer too short for {tag}: need {needed} bytes after header, {available} available")]
    BufferTooShort {
        tag: String,
        needed: usize,
        available: usize,
    },

    #[error("Invalid file header: {0}")]
    InvalidHeader(String),

    #[error("Malformed tag at offset {offset}: {reason}")]
    MalformedTag { offset: usize, reason: String },

    #[error("Invalid render config: {0}")]
    Config(String),

    #[error("Image error: {0}")]
    Image(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<binrw::Error> for Error {
    fn from(e: binrw::Error) -> Self {
        Error::BinRw(e.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

/// Render a 4-byte tag code for messages, escaping anything non-printable
pub(crate) fn tag_name(code: &[u8; 4]) -> String {
    code.escape_ascii().to_string()
}
