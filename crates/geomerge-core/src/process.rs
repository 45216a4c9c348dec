//! Processing driver: mosaic merge, warp, GeoTIFF output
//!
//! All raster math is delegated to GDAL. The mosaic is composited on the
//! first input's pixel grid (last write wins on overlap) and
//! merge+reproject warps the merged result exactly once, never the
//! individual inputs. Resampling is bilinear throughout.

use std::path::{Path, PathBuf};

use gdal::raster::{GdalDataType, RasterCreationOptions, ResampleAlg};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::{Dataset, DriverManager, Metadata};
use tracing::{info, warn};

use crate::config::{Mode, ProcessingConfig};
use crate::crs::{self, TargetCrs};
use crate::error::{GeomergeError, Result};
use crate::progress::{ProgressEvent, ProgressSender};
use crate::scan::CandidateFile;

/// Fixed GeoTIFF driver options: DEFLATE compression, internal tiling.
fn gtiff_creation_options() -> RasterCreationOptions {
    RasterCreationOptions::from_iter(["COMPRESS=DEFLATE", "TILED=YES"])
}

/// Metadata of the written output, for the result panel.
#[derive(Debug)]
pub struct OutputSummary {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub data_type: String,
    pub crs: Option<String>,
    pub size_bytes: u64,
}

/// Run the configured processing over the selected files and write one
/// output GeoTIFF.
pub fn run(
    files: &[CandidateFile],
    config: &ProcessingConfig,
    progress: &ProgressSender,
) -> Result<OutputSummary> {
    // Guards that must fire before any dataset is opened or written.
    if config.mode == Mode::ReprojectOnly && files.len() != 1 {
        return Err(GeomergeError::ReprojectNeedsOneFile { count: files.len() });
    }
    if config.output.exists() && !config.overwrite {
        return Err(GeomergeError::OutputExists {
            path: config.output.clone(),
        });
    }

    let sources = open_sources(files, progress)?;

    let result = execute(&sources, config, progress);
    if result.is_err() {
        // No partial output is retained on failure.
        let _ = std::fs::remove_file(&config.output);
    }
    result?;

    summarize(&config.output)
}

fn open_sources(
    files: &[CandidateFile],
    progress: &ProgressSender,
) -> Result<Vec<(PathBuf, Dataset)>> {
    let total = files.len();
    let mut sources = Vec::with_capacity(total);
    for (i, file) in files.iter().enumerate() {
        progress.send(ProgressEvent::Opening {
            index: i + 1,
            total,
            name: file.file_name(),
        });
        match Dataset::open(&file.path) {
            Ok(ds) => sources.push((file.path.clone(), ds)),
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "skipping unreadable input");
                progress.send(ProgressEvent::Warning(format!(
                    "Skipping unreadable file {}: {}",
                    file.file_name(),
                    e
                )));
            }
        }
    }
    if sources.is_empty() {
        return Err(GeomergeError::NoReadableInputs);
    }
    Ok(sources)
}

fn execute(
    sources: &[(PathBuf, Dataset)],
    config: &ProcessingConfig,
    progress: &ProgressSender,
) -> Result<()> {
    let datasets: Vec<&Dataset> = sources.iter().map(|(_, ds)| ds).collect();

    match config.mode {
        Mode::MergeOnly => {
            warn_on_mixed_crs(&datasets, progress);
            merge(&datasets, Destination::GeoTiff(&config.output), progress)?;
        }
        Mode::ReprojectOnly => {
            let (path, ds) = &sources[0];
            match warp_target(ds, config.target.as_ref())? {
                Some(target) => reproject(ds, &config.output, target, progress)?,
                None => {
                    // Same CRS (or keep-original): plain copy.
                    info!(path = %path.display(), "no reprojection needed, copying file");
                    progress.send(ProgressEvent::Writing {
                        path: config.output.clone(),
                    });
                    std::fs::copy(path, &config.output)?;
                }
            }
        }
        Mode::MergeReproject => {
            warn_on_mixed_crs(&datasets, progress);
            match warp_target(datasets[0], config.target.as_ref())? {
                Some(target) => {
                    // Merge once into memory, then warp the mosaic once.
                    let mosaic = merge(&datasets, Destination::Memory, progress)?;
                    reproject(&mosaic, &config.output, target, progress)?;
                }
                None => {
                    merge(&datasets, Destination::GeoTiff(&config.output), progress)?;
                }
            }
        }
    }
    Ok(())
}

/// Decide whether warping is actually required. `None` means the output
/// keeps the source CRS (no target, or the target equals the source).
fn warp_target<'a>(
    src: &Dataset,
    target: Option<&'a TargetCrs>,
) -> Result<Option<&'a TargetCrs>> {
    let Some(target) = target else {
        return Ok(None);
    };
    let src_sr = native_spatial_ref(src)?;
    if crs::same_crs(&src_sr, &target.spatial_ref) {
        Ok(None)
    } else {
        Ok(Some(target))
    }
}

/// Policy for mixed native CRSs: warn, do not prevent.
fn warn_on_mixed_crs(datasets: &[&Dataset], progress: &ProgressSender) {
    let first = match datasets[0].spatial_ref() {
        Ok(sr) => sr,
        Err(_) => return,
    };
    for ds in &datasets[1..] {
        let matches = ds
            .spatial_ref()
            .map(|sr| crs::same_crs(&first, &sr))
            .unwrap_or(false);
        if !matches {
            warn!("selected files have differing native CRSs");
            progress.send(ProgressEvent::Warning(
                "Input files have differing native CRSs; compositing raw coordinates \
                 without per-input reprojection"
                    .to_string(),
            ));
            return;
        }
    }
}

/// Pixel grid of an output raster.
struct GridSpec {
    gt: [f64; 6],
    width: usize,
    height: usize,
}

enum Destination<'a> {
    GeoTiff(&'a Path),
    Memory,
}

/// Mosaic all inputs onto the first input's grid. Inputs are composited
/// in selection order, so later files win on overlap.
fn merge(
    datasets: &[&Dataset],
    dest: Destination,
    progress: &ProgressSender,
) -> Result<Dataset> {
    let grid = union_grid(datasets, progress)?;
    let bands = datasets[0].raster_count();
    let band_type = datasets[0].rasterband(1)?.band_type();
    progress.send(ProgressEvent::MosaicReady {
        width: grid.width,
        height: grid.height,
        bands: bands as usize,
    });

    let mut out = match dest {
        Destination::GeoTiff(path) => {
            progress.send(ProgressEvent::Writing {
                path: path.to_path_buf(),
            });
            create_raster(
                "GTiff",
                path,
                grid.width,
                grid.height,
                bands,
                band_type,
                &gtiff_creation_options(),
            )?
        }
        Destination::Memory => create_raster(
            "MEM",
            Path::new(""),
            grid.width,
            grid.height,
            bands,
            band_type,
            &RasterCreationOptions::default(),
        )?,
    };
    out.set_geo_transform(&grid.gt)?;
    if let Ok(sr) = datasets[0].spatial_ref() {
        out.set_spatial_ref(&sr)?;
    }

    // Background and nodata follow the first input.
    for b in 1..=bands {
        if let Some(nodata) = datasets[0].rasterband(b)?.no_data_value() {
            let mut out_band = out.rasterband(b)?;
            out_band.set_no_data_value(Some(nodata))?;
            out_band.fill(nodata, None)?;
        }
    }

    let total = datasets.len();
    for (i, ds) in datasets.iter().enumerate() {
        progress.send(ProgressEvent::Merging {
            index: i + 1,
            total,
            name: ds.description().unwrap_or_default(),
        });
        composite(ds, &mut out, &grid)?;
    }
    Ok(out)
}

/// Union bounding box of all inputs on the first input's resolution.
fn union_grid(datasets: &[&Dataset], progress: &ProgressSender) -> Result<GridSpec> {
    let first_gt = datasets[0].geo_transform()?;
    if first_gt[2] != 0.0 || first_gt[4] != 0.0 {
        progress.send(ProgressEvent::Warning(
            "Input raster is not north-up; rotation terms are ignored".to_string(),
        ));
    }
    let res_x = first_gt[1];
    let res_y = first_gt[5];

    let (mut minx, mut miny) = (f64::INFINITY, f64::INFINITY);
    let (mut maxx, mut maxy) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for ds in datasets {
        let (x0, y0, x1, y1) = crs::dataset_bounds(ds)?;
        minx = minx.min(x0);
        miny = miny.min(y0);
        maxx = maxx.max(x1);
        maxy = maxy.max(y1);
    }

    let width = ((maxx - minx) / res_x.abs()).round().max(1.0) as usize;
    let height = ((maxy - miny) / res_y.abs()).round().max(1.0) as usize;
    let origin_y = if res_y < 0.0 { maxy } else { miny };
    Ok(GridSpec {
        gt: [minx, res_x, 0.0, origin_y, 0.0, res_y],
        width,
        height,
    })
}

/// Write one input into the mosaic at its grid position, resampling
/// bilinearly only when the input's resolution differs from the grid.
///
/// The window is derived from the input's bounds against the grid, with
/// the same rounding `union_grid` applied to the overall extent, and
/// clamped to the mosaic. Rounding the offset and size independently of
/// the grid can land the window one pixel past the edge on
/// mixed-resolution input, which GDAL rejects.
fn composite(src: &Dataset, out: &mut Dataset, grid: &GridSpec) -> Result<()> {
    let (w, h) = src.raster_size();
    let (x0, y0, x1, y1) = crs::dataset_bounds(src)?;

    let x_off = (((x0 - grid.gt[0]) / grid.gt[1]).round().max(0.0)) as isize;
    let x_end = ((((x1 - grid.gt[0]) / grid.gt[1]).round()) as isize).min(grid.width as isize);
    // grid.gt[5] may be negative; the row axis runs from the grid origin.
    let (y_near, y_far) = if grid.gt[5] < 0.0 { (y1, y0) } else { (y0, y1) };
    let y_off = (((y_near - grid.gt[3]) / grid.gt[5]).round().max(0.0)) as isize;
    let y_end = ((((y_far - grid.gt[3]) / grid.gt[5]).round()) as isize).min(grid.height as isize);
    if x_end <= x_off || y_end <= y_off {
        return Ok(());
    }
    let tw = (x_end - x_off) as usize;
    let th = (y_end - y_off) as usize;
    let resample = if tw == w && th == h {
        None
    } else {
        Some(ResampleAlg::Bilinear)
    };

    let bands = src.raster_count().min(out.raster_count());
    for b in 1..=bands {
        let src_band = src.rasterband(b)?;
        let mut buf = src_band.read_as::<f64>((0, 0), (w, h), (tw, th), resample)?;
        let mut out_band = out.rasterband(b)?;
        out_band.write((x_off, y_off), (tw, th), &mut buf)?;
    }
    Ok(())
}

/// Warp `src` into `output` with bilinear resampling.
fn reproject(
    src: &Dataset,
    output: &Path,
    target: &TargetCrs,
    progress: &ProgressSender,
) -> Result<()> {
    progress.send(ProgressEvent::Reprojecting {
        target: target.label(),
    });

    let grid = warped_grid(src, &target.spatial_ref)?;
    let bands = src.raster_count();
    let band_type = src.rasterband(1)?.band_type();

    progress.send(ProgressEvent::Writing {
        path: output.to_path_buf(),
    });
    let mut dst = create_raster(
        "GTiff",
        output,
        grid.width,
        grid.height,
        bands,
        band_type,
        &gtiff_creation_options(),
    )?;
    dst.set_geo_transform(&grid.gt)?;
    dst.set_spatial_ref(&target.spatial_ref)?;
    for b in 1..=bands {
        if let Some(nodata) = src.rasterband(b)?.no_data_value() {
            let mut dst_band = dst.rasterband(b)?;
            dst_band.set_no_data_value(Some(nodata))?;
            dst_band.fill(nodata, None)?;
        }
    }

    gdal::raster::reproject(src, &dst)?;
    Ok(())
}

/// Target pixel grid for a warp: envelope of the source boundary in the
/// target CRS, keeping the source pixel count.
fn warped_grid(src: &Dataset, dst_sr: &SpatialRef) -> Result<GridSpec> {
    let mut src_sr = native_spatial_ref(src)?;
    src_sr.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    let mut dst_sr = dst_sr.clone();
    dst_sr.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    let transform = CoordTransform::new(&src_sr, &dst_sr)?;

    let gt = src.geo_transform()?;
    let (w, h) = src.raster_size();
    let (wf, hf) = (w as f64, h as f64);

    // Corners plus edge midpoints so curved edges stay inside the envelope.
    let samples = [
        (0.0, 0.0),
        (wf, 0.0),
        (0.0, hf),
        (wf, hf),
        (wf / 2.0, 0.0),
        (wf / 2.0, hf),
        (0.0, hf / 2.0),
        (wf, hf / 2.0),
    ];
    let mut xs: Vec<f64> = samples.iter().map(|(px, py)| gt[0] + px * gt[1] + py * gt[2]).collect();
    let mut ys: Vec<f64> = samples.iter().map(|(px, py)| gt[3] + px * gt[4] + py * gt[5]).collect();
    let mut zs = vec![0.0; samples.len()];
    transform.transform_coords(&mut xs, &mut ys, &mut zs)?;

    let (minx, maxx) = min_max(&xs);
    let (miny, maxy) = min_max(&ys);

    Ok(GridSpec {
        gt: [
            minx,
            (maxx - minx) / wf,
            0.0,
            maxy,
            0.0,
            -((maxy - miny) / hf),
        ],
        width: w,
        height: h,
    })
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), &v| (lo.min(v), hi.max(v)),
    )
}

/// Create a raster dataset with the requested runtime band type.
fn create_raster(
    driver_name: &str,
    path: &Path,
    width: usize,
    height: usize,
    bands: usize,
    band_type: GdalDataType,
    options: &RasterCreationOptions,
) -> Result<Dataset> {
    let driver = DriverManager::get_driver_by_name(driver_name)?;
    let ds = match band_type {
        GdalDataType::UInt8 => {
            driver.create_with_band_type_with_options::<u8, _>(path, width, height, bands, options)?
        }
        GdalDataType::UInt16 => {
            driver.create_with_band_type_with_options::<u16, _>(path, width, height, bands, options)?
        }
        GdalDataType::Int16 => {
            driver.create_with_band_type_with_options::<i16, _>(path, width, height, bands, options)?
        }
        GdalDataType::UInt32 => {
            driver.create_with_band_type_with_options::<u32, _>(path, width, height, bands, options)?
        }
        GdalDataType::Int32 => {
            driver.create_with_band_type_with_options::<i32, _>(path, width, height, bands, options)?
        }
        GdalDataType::Float32 => {
            driver.create_with_band_type_with_options::<f32, _>(path, width, height, bands, options)?
        }
        _ => {
            driver.create_with_band_type_with_options::<f64, _>(path, width, height, bands, options)?
        }
    };
    Ok(ds)
}

fn native_spatial_ref(ds: &Dataset) -> Result<SpatialRef> {
    ds.spatial_ref().map_err(|_| GeomergeError::MissingCrs {
        path: PathBuf::from(ds.description().unwrap_or_default()),
    })
}

fn summarize(path: &Path) -> Result<OutputSummary> {
    let size_bytes = std::fs::metadata(path)?.len();
    let ds = Dataset::open(path)?;
    let (width, height) = ds.raster_size();
    let bands = ds.raster_count() as usize;
    let data_type = ds
        .rasterband(1)
        .map(|b| format!("{:?}", b.band_type()))
        .unwrap_or_else(|_| "Unknown".to_string());
    let crs = ds.spatial_ref().ok().map(|sr| crs::crs_label(&sr));
    Ok(OutputSummary {
        path: path.to_path_buf(),
        width,
        height,
        bands,
        data_type,
        crs,
        size_bytes,
    })
}

/// Min/max over a small corner window of band 1, for the result panel.
/// Nodata and NaN cells are ignored; `None` when nothing valid remains.
pub fn sample_min_max(path: &Path) -> Result<Option<(f64, f64)>> {
    let ds = Dataset::open(path)?;
    let band = ds.rasterband(1)?;
    let (w, h) = ds.raster_size();
    let (sw, sh) = (w.min(100), h.min(100));
    let buf = band.read_as::<f64>((0, 0), (sw, sh), (sw, sh), None)?;
    let nodata = band.no_data_value();

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in buf.data() {
        if v.is_nan() || nodata.map(|nd| v == nd).unwrap_or(false) {
            continue;
        }
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo <= hi {
        Ok(Some((lo, hi)))
    } else {
        Ok(None)
    }
}
