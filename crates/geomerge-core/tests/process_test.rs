//! Integration tests for the processing driver and CRS resolver
//!
//! These write small GeoTIFF fixtures into temporary directories and
//! run the real GDAL-backed pipeline over them.

use std::path::Path;

use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use tempfile::TempDir;

use geomerge_core::crs::{self, CrsChoice};
use geomerge_core::{
    process, scan, GeomergeError, Mode, ProcessingConfig, ProgressSender,
};

/// Write a single-band Float32 tile with a north-up grid.
fn write_tile(
    path: &Path,
    origin: (f64, f64),
    size: (usize, usize),
    res: f64,
    epsg: u32,
    value: f64,
) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut ds = driver
        .create_with_band_type::<f32, _>(path, size.0, size.1, 1)
        .unwrap();
    ds.set_geo_transform(&[origin.0, res, 0.0, origin.1, 0.0, -res])
        .unwrap();
    ds.set_spatial_ref(&SpatialRef::from_epsg(epsg).unwrap())
        .unwrap();
    let mut band = ds.rasterband(1).unwrap();
    band.fill(value, None).unwrap();
}

fn merge_config(output: &Path) -> ProcessingConfig {
    ProcessingConfig {
        mode: Mode::MergeOnly,
        target: None,
        output: output.to_path_buf(),
        overwrite: false,
    }
}

#[test]
fn test_merge_two_adjacent_tiles_covers_union() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    // Two 10x10 tiles at 10 m resolution, side by side in UTM 33N.
    write_tile(
        &input_dir.path().join("a.tif"),
        (500_000.0, 6_000_000.0),
        (10, 10),
        10.0,
        32633,
        1.0,
    );
    write_tile(
        &input_dir.path().join("b.tif"),
        (500_100.0, 6_000_000.0),
        (10, 10),
        10.0,
        32633,
        2.0,
    );

    let files = scan::scan_directory(input_dir.path()).unwrap();
    assert_eq!(files.len(), 2);

    let output = output_dir.path().join("merged.tif");
    let summary = process::run(&files, &merge_config(&output), &ProgressSender::sink()).unwrap();

    // Union bounding box of the two inputs: 20x10 pixels from the
    // western origin.
    assert_eq!(summary.width, 20);
    assert_eq!(summary.height, 10);

    let ds = Dataset::open(&output).unwrap();
    let gt = ds.geo_transform().unwrap();
    assert_eq!(gt[0], 500_000.0);
    assert_eq!(gt[3], 6_000_000.0);
    assert_eq!(ds.spatial_ref().unwrap().auth_code().unwrap(), 32633);
}

#[test]
fn test_merge_mixed_resolution_tiles_stays_within_grid() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    // 10 m base tile, plus a 3 m tile whose extent ends mid-pixel on the
    // base grid (x 500095..500131). The write window for the finer tile
    // must be clamped to the mosaic instead of rounding one column past
    // its edge.
    write_tile(
        &input_dir.path().join("a.tif"),
        (500_000.0, 6_000_000.0),
        (10, 10),
        10.0,
        32633,
        1.0,
    );
    write_tile(
        &input_dir.path().join("b.tif"),
        (500_095.0, 6_000_000.0),
        (12, 12),
        3.0,
        32633,
        2.0,
    );

    let files = scan::scan_directory(input_dir.path()).unwrap();
    let output = output_dir.path().join("merged.tif");
    let summary = process::run(&files, &merge_config(&output), &ProgressSender::sink()).unwrap();

    // Union extent x 500000..500131 at 10 m rounds to 13 columns.
    assert_eq!(summary.width, 13);
    assert_eq!(summary.height, 10);

    // Uncovered cells default to 0; covered cells carry the fill values.
    let (lo, hi) = process::sample_min_max(&output).unwrap().unwrap();
    assert_eq!(lo, 0.0);
    assert!(hi > 1.5 && hi <= 2.0);
}

#[test]
fn test_reproject_only_rejects_multiple_files() {
    let input_dir = TempDir::new().unwrap();
    write_tile(
        &input_dir.path().join("a.tif"),
        (500_000.0, 6_000_000.0),
        (4, 4),
        10.0,
        32633,
        1.0,
    );
    write_tile(
        &input_dir.path().join("b.tif"),
        (500_040.0, 6_000_000.0),
        (4, 4),
        10.0,
        32633,
        2.0,
    );
    let files = scan::scan_directory(input_dir.path()).unwrap();

    let output = input_dir.path().join("out").join("reprojected.tif");
    let config = ProcessingConfig {
        mode: Mode::ReprojectOnly,
        target: None,
        output,
        overwrite: false,
    };
    let err = process::run(&files, &config, &ProgressSender::sink()).unwrap_err();
    assert!(matches!(
        err,
        GeomergeError::ReprojectNeedsOneFile { count: 2 }
    ));
}

#[test]
fn test_existing_output_preserved_without_overwrite() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    write_tile(
        &input_dir.path().join("a.tif"),
        (500_000.0, 6_000_000.0),
        (4, 4),
        10.0,
        32633,
        1.0,
    );
    let files = scan::scan_directory(input_dir.path()).unwrap();

    let output = output_dir.path().join("merged.tif");
    std::fs::write(&output, b"sentinel").unwrap();

    let err = process::run(&files, &merge_config(&output), &ProgressSender::sink()).unwrap_err();
    assert!(matches!(err, GeomergeError::OutputExists { .. }));
    assert_eq!(std::fs::read(&output).unwrap(), b"sentinel");
}

#[test]
fn test_unreadable_input_skipped_with_remainder_processed() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    write_tile(
        &input_dir.path().join("a.tif"),
        (500_000.0, 6_000_000.0),
        (4, 4),
        10.0,
        32633,
        1.0,
    );
    std::fs::write(input_dir.path().join("broken.tif"), b"not a tiff").unwrap();

    let files = scan::scan_directory(input_dir.path()).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|f| f.info.is_none()));

    let output = output_dir.path().join("merged.tif");
    let summary = process::run(&files, &merge_config(&output), &ProgressSender::sink()).unwrap();
    assert_eq!(summary.width, 4);
    assert!(output.exists());
}

#[test]
fn test_merge_reproject_targets_requested_crs() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    write_tile(
        &input_dir.path().join("a.tif"),
        (500_000.0, 6_000_000.0),
        (8, 8),
        10.0,
        32633,
        5.0,
    );
    let files = scan::scan_directory(input_dir.path()).unwrap();
    let target = crs::resolve_for_files(CrsChoice::Wgs84, &files).unwrap();

    let output = output_dir.path().join("merged.tif");
    let config = ProcessingConfig {
        mode: Mode::MergeReproject,
        target: Some(target),
        output: output.clone(),
        overwrite: false,
    };
    let summary = process::run(&files, &config, &ProgressSender::sink()).unwrap();
    assert_eq!(summary.crs.as_deref(), Some("EPSG:4326"));

    let ds = Dataset::open(&output).unwrap();
    assert_eq!(ds.spatial_ref().unwrap().auth_code().unwrap(), 4326);
}

#[test]
fn test_reproject_only_same_crs_copies_file() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let src = input_dir.path().join("a.tif");
    write_tile(&src, (500_000.0, 6_000_000.0), (4, 4), 10.0, 32633, 1.0);
    let files = scan::scan_directory(input_dir.path()).unwrap();
    let target = crs::resolve_for_files(CrsChoice::Keep, &files).unwrap();

    let output = output_dir.path().join("reprojected.tif");
    let config = ProcessingConfig {
        mode: Mode::ReprojectOnly,
        target: Some(target),
        output: output.clone(),
        overwrite: false,
    };
    process::run(&files, &config, &ProgressSender::sink()).unwrap();
    assert_eq!(
        std::fs::read(&src).unwrap(),
        std::fs::read(&output).unwrap()
    );
}

#[test]
fn test_auto_utm_resolution_from_geometry() {
    let input_dir = TempDir::new().unwrap();
    // A small tile near Berlin, already geographic.
    write_tile(
        &input_dir.path().join("a.tif"),
        (13.0, 53.0),
        (10, 10),
        0.01,
        4326,
        1.0,
    );
    let files = scan::scan_directory(input_dir.path()).unwrap();

    let target = crs::resolve_for_files(CrsChoice::AutoUtm, &files).unwrap();
    assert_eq!(target.epsg, Some(32633));
    assert!(target.auto_selected);

    // Deterministic for a fixed bounding box.
    let again = crs::resolve_for_files(CrsChoice::AutoUtm, &files).unwrap();
    assert_eq!(again.epsg, Some(32633));
}

#[test]
fn test_custom_epsg_4326_is_wgs84() {
    assert!(crs::validate_epsg(4326).is_ok());
    let target = crs::resolve(CrsChoice::Epsg(4326), &[]).unwrap();
    assert_eq!(target.label(), "EPSG:4326");
}

#[test]
fn test_unknown_epsg_is_recoverable() {
    let err = crs::validate_epsg(999_999).unwrap_err();
    assert!(matches!(err, GeomergeError::InvalidEpsg { code: 999_999 }));
    assert!(err.is_recoverable());
}

#[test]
fn test_last_write_wins_on_overlap() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    // Two fully overlapping tiles; the later selection must win.
    write_tile(
        &input_dir.path().join("a.tif"),
        (500_000.0, 6_000_000.0),
        (4, 4),
        10.0,
        32633,
        1.0,
    );
    write_tile(
        &input_dir.path().join("b.tif"),
        (500_000.0, 6_000_000.0),
        (4, 4),
        10.0,
        32633,
        9.0,
    );
    let files = scan::scan_directory(input_dir.path()).unwrap();

    let output = output_dir.path().join("merged.tif");
    process::run(&files, &merge_config(&output), &ProgressSender::sink()).unwrap();

    let (lo, hi) = process::sample_min_max(&output).unwrap().unwrap();
    assert_eq!(lo, 9.0);
    assert_eq!(hi, 9.0);
}
