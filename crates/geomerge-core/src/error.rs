//! Error types for geomerge

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeomergeError {
    // Scanning errors
    #[error("No GeoTIFF files found in {dir}")]
    NoInputFiles { dir: PathBuf },

    // Selection errors (recoverable, the CLI re-prompts)
    #[error("Invalid selection '{input}': {reason}")]
    InvalidSelection { input: String, reason: String },

    #[error("File #{index} does not exist (valid range is 1-{count})")]
    IndexOutOfRange { index: usize, count: usize },

    // CRS errors
    #[error("Unknown EPSG code {code}")]
    InvalidEpsg { code: u32 },

    #[error("Raster has no usable spatial reference: {path}")]
    MissingCrs { path: PathBuf },

    // Processing errors
    #[error("Reproject-only mode needs exactly one input file, got {count}")]
    ReprojectNeedsOneFile { count: usize },

    #[error("None of the selected files could be opened")]
    NoReadableInputs,

    #[error("Output file already exists: {path}")]
    OutputExists { path: PathBuf },

    // Wrapped library errors
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeomergeError {
    /// Recoverable errors loop back to the relevant prompt instead of
    /// aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GeomergeError::InvalidSelection { .. }
                | GeomergeError::IndexOutOfRange { .. }
                | GeomergeError::InvalidEpsg { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GeomergeError>;
