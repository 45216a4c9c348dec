//! Directory scanning for candidate GeoTIFF files

use std::path::{Path, PathBuf};

use gdal::Dataset;
use tracing::debug;

use crate::crs;
use crate::error::{GeomergeError, Result};

const RASTER_EXTENSIONS: [&str; 3] = ["tif", "tiff", "geotiff"];

/// Display metadata read from a light `Dataset::open` probe.
#[derive(Debug, Clone)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub data_type: String,
    pub crs: Option<String>,
}

/// A raster file found in the working directory. Rebuilt on every run;
/// `info` is `None` when the probe failed (the file is still listed, but
/// flagged unreadable and skipped at processing time).
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub info: Option<RasterInfo>,
}

impl CandidateFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0 / 1024.0
    }
}

/// Enumerate candidate rasters in `dir`, sorted by file name.
pub fn scan_directory(dir: &Path) -> Result<Vec<CandidateFile>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && has_raster_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

    if paths.is_empty() {
        return Err(GeomergeError::NoInputFiles { dir: dir.to_path_buf() });
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let size_bytes = std::fs::metadata(&path)?.len();
        let info = probe(&path);
        if info.is_none() {
            debug!(path = %path.display(), "probe failed, listing file as unreadable");
        }
        files.push(CandidateFile { path, size_bytes, info });
    }
    Ok(files)
}

fn has_raster_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            RASTER_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

fn probe(path: &Path) -> Option<RasterInfo> {
    let ds = Dataset::open(path).ok()?;
    let (width, height) = ds.raster_size();
    let bands = ds.raster_count() as usize;
    let data_type = ds
        .rasterband(1)
        .map(|b| format!("{:?}", b.band_type()))
        .unwrap_or_else(|_| "Unknown".to_string());
    let crs = ds.spatial_ref().ok().map(|sr| crs::crs_label(&sr));
    Some(RasterInfo {
        width,
        height,
        bands,
        data_type,
        crs,
    })
}
