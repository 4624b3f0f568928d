//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::types::Tag;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(binrw::Error),

    /// file is not a valid mdb archive
    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    /// packet tag {0} has no decoder
    #[error("packet tag {0} has no decoder")]
    UnsupportedVariant(Tag),

    /// packet slot {0} is empty and cannot be written
    #[error("packet slot {0} is empty and cannot be written")]
    #[diagnostic(help("call `MdbArchive::retain_supported` to drop unsupported packets before saving"))]
    EmptySlot(usize),

    /// mesh already holds {0} vertices, faces cannot address more
    #[error("mesh already holds {0} vertices, faces cannot address more")]
    VertexLimit(usize),

    /// skinned mesh {0} has no skeleton binding
    #[error("skinned mesh {0} has no skeleton binding")]
    MissingSkeleton(String),

    /// archive of {0} bytes exceeds the 32-bit offset range
    #[error("archive of {0} bytes exceeds the 32-bit offset range")]
    ArchiveTooLarge(usize),
}

/// Structural problems that make a whole archive unreadable
#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// header signature {0} is not NWN2
    #[error("header signature {0} is not NWN2")]
    BadSignature(Tag),

    /// stream ended before a fixed size record was complete
    #[error("stream ended before a fixed size record was complete")]
    Truncated,
}

impl From<binrw::Error> for Error {
    fn from(value: binrw::Error) -> Self {
        if value.is_eof() {
            return Error::Format(FormatError::Truncated);
        }

        match value {
            binrw::Error::Io(e) => Error::IOError(e),
            other => Error::BinRWError(other),
        }
    }
}

/// Conditions that are recovered from locally and reported to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A polygon with `corners` vertices was skipped
    NonTriangleFace { polygon: usize, corners: usize },

    /// A fifth or later bone influence on one vertex was dropped
    BoneOverflow {
        polygon: usize,
        corner: usize,
        bone: String,
    },

    /// The packet at `index` was kept as an empty slot
    UnsupportedVariant { index: usize, tag: Tag },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::NonTriangleFace { polygon, corners } => {
                write!(f, "polygon {polygon} has {corners} vertices, only triangles are supported")
            }
            Warning::BoneOverflow {
                polygon,
                corner,
                bone,
            } => write!(
                f,
                "vertex {corner} of polygon {polygon} has more than 4 bones, dropped {bone}"
            ),
            Warning::UnsupportedVariant { index, tag } => {
                write!(f, "packet {index} with tag {tag} is not supported")
            }
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
