//! geomerge-core - Merging and reprojection of GeoTIFF rasters
//!
//! This crate holds everything behind the interactive prompts: directory
//! scanning, selection parsing, CRS resolution and the GDAL-backed
//! processing driver. The CLI crate only wires user input into these
//! pieces.

pub mod config;
pub mod crs;
pub mod error;
pub mod process;
pub mod progress;
pub mod scan;
pub mod selection;

pub use config::{Mode, ProcessingConfig};
pub use crs::{CrsChoice, TargetCrs};
pub use error::{GeomergeError, Result};
pub use process::{run, OutputSummary};
pub use progress::{progress_channel, ProgressEvent, ProgressSender};
pub use scan::{scan_directory, CandidateFile, RasterInfo};
pub use selection::{parse_selection, Selection};
