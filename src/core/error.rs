//! Error types for the conversion pipeline

use thiserror::Error;

/// Main error type for the pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("pixel buffer holds {got} samples, expected {expected}")]
    PixelCount { expected: usize, got: usize },

    #[error("palette '{0}' has no entries")]
    EmptyPalette(String),

    #[error("unknown palette '{0}'")]
    UnknownPalette(String),

    #[error("unknown fill mode '{0}'")]
    UnknownFillMode(String),

    #[error("grid size {0}x{1}x{2} exceeds the schematic dimension limit")]
    SchematicTooLarge(i32, i32, i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("palette file error: {0}")]
    PaletteFile(#[from] serde_json::Error),
}
