//! Processing configuration

use std::path::PathBuf;

use crate::crs::TargetCrs;

/// Processing mode chosen at the mode prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    MergeOnly,
    ReprojectOnly,
    MergeReproject,
}

impl Mode {
    pub fn needs_crs(&self) -> bool {
        !matches!(self, Mode::MergeOnly)
    }

    pub fn default_output_name(&self) -> &'static str {
        match self {
            Mode::ReprojectOnly => "reprojected.tif",
            Mode::MergeOnly | Mode::MergeReproject => "merged_result.tif",
        }
    }
}

/// Immutable configuration consumed by the processing driver.
///
/// Resampling is fixed to bilinear and the output GeoTIFF is always
/// written with DEFLATE compression and internal tiling; neither is
/// user-configurable.
#[derive(Debug)]
pub struct ProcessingConfig {
    pub mode: Mode,
    /// Resolved before the driver runs; `None` only for merge-only.
    pub target: Option<TargetCrs>,
    pub output: PathBuf,
    /// Set by the CLI after the user confirmed replacing an existing
    /// file. The driver refuses to touch an existing output otherwise.
    pub overwrite: bool,
}
