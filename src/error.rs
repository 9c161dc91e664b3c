use std::path::PathBuf;

use thiserror::Error;

use crate::grouping::GroupKey;

pub type Result<T> = std::result::Result<T, StitchError>;

/// Everything that can go wrong between a directory listing and a written mosaic.
#[derive(Debug, Error)]
pub enum StitchError {
    #[error("malformed Cellomics filename {filename:?}: {reason}")]
    MalformedFilename { filename: String, reason: String },

    #[error("duplicate field {field} in group {key}: {filename}")]
    DuplicateField {
        key: GroupKey,
        field: u32,
        filename: String,
    },

    #[error("incomplete group {key}: {found} tiles, missing fields {missing:?}, unexpected fields {unexpected:?}")]
    IncompleteGroup {
        key: GroupKey,
        found: usize,
        missing: Vec<u32>,
        unexpected: Vec<u32>,
    },

    #[error("tile {filename} is {found}, expected {expected}")]
    TileShapeMismatch {
        filename: String,
        expected: String,
        found: String,
    },

    #[error("concatenation failed: {0}")]
    Concatenate(#[from] ndarray::ShapeError),

    #[error("unsupported image layout: {0}")]
    UnsupportedLayout(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TIFF error on {path:?}: {source}")]
    Tiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("TIFF decoder panicked while reading {path:?}")]
    DecoderPanic { path: PathBuf },

    #[error("invalid listing pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl StitchError {
    pub(crate) fn malformed(filename: &str, reason: impl Into<String>) -> Self {
        StitchError::MalformedFilename {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StitchError::Io {
            path: path.into(),
            source,
        }
    }
}
