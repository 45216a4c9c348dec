//! CRS resolution policy
//!
//! Turns the user's CRS choice into one concrete [`SpatialRef`] before
//! the processing driver runs. The only interesting branch is automatic
//! UTM selection: the centroid of the union bounding box of the inputs
//! is transformed to WGS84 and mapped onto the standard zone grid.

use std::path::PathBuf;

use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::{Dataset, Metadata};
use tracing::debug;

use crate::error::{GeomergeError, Result};

/// User-facing CRS choices offered by the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsChoice {
    /// Fixed EPSG:4326.
    Wgs84,
    /// UTM zone derived from the input geometry.
    AutoUtm,
    /// A user-supplied EPSG code, validated on entry.
    Epsg(u32),
    /// First selected file's native CRS, unchanged.
    Keep,
}

/// A resolved, concrete target spatial reference.
#[derive(Debug)]
pub struct TargetCrs {
    pub spatial_ref: SpatialRef,
    pub epsg: Option<u32>,
    /// True when the zone was picked by [`CrsChoice::AutoUtm`].
    pub auto_selected: bool,
}

impl TargetCrs {
    pub fn label(&self) -> String {
        crs_label(&self.spatial_ref)
    }
}

/// Resolve `choice` against the already-opened input datasets.
pub fn resolve(choice: CrsChoice, datasets: &[Dataset]) -> Result<TargetCrs> {
    match choice {
        CrsChoice::Wgs84 => from_epsg(4326, false),
        CrsChoice::Epsg(code) => from_epsg(code, false),
        CrsChoice::AutoUtm => {
            let (lon, lat) = geographic_center(datasets)?;
            let code = utm_epsg_for(lon, lat);
            debug!(lon, lat, epsg = code, "auto-selected UTM zone");
            from_epsg(code, true)
        }
        CrsChoice::Keep => {
            let first = datasets.first().ok_or(GeomergeError::NoReadableInputs)?;
            let spatial_ref = native_spatial_ref(first)?;
            let epsg = spatial_ref.auth_code().ok().map(|c| c as u32);
            Ok(TargetCrs {
                spatial_ref,
                epsg,
                auto_selected: false,
            })
        }
    }
}

/// Resolve `choice` from file paths, opening the datasets just long
/// enough to read their bounding geometry. Unreadable files are ignored
/// here; the driver warns about them separately.
pub fn resolve_for_files(choice: CrsChoice, files: &[crate::scan::CandidateFile]) -> Result<TargetCrs> {
    let mut datasets = Vec::with_capacity(files.len());
    for file in files {
        if let Ok(ds) = Dataset::open(&file.path) {
            datasets.push(ds);
        }
    }
    if datasets.is_empty() {
        return Err(GeomergeError::NoReadableInputs);
    }
    resolve(choice, &datasets)
}

/// Validate a custom EPSG code without resolving anything else; used by
/// the prompt loop so a typo re-prompts instead of aborting.
pub fn validate_epsg(code: u32) -> Result<()> {
    SpatialRef::from_epsg(code).map_err(|_| GeomergeError::InvalidEpsg { code })?;
    Ok(())
}

/// Standard UTM zone grid: zone `floor((lon+180)/6)+1`, EPSG 326xx for
/// the northern hemisphere and 327xx for the southern.
pub fn utm_epsg_for(lon: f64, lat: f64) -> u32 {
    let zone = (((lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u32;
    if lat >= 0.0 {
        32600 + zone
    } else {
        32700 + zone
    }
}

/// Centroid of the union bounding box of `datasets`, as (lon, lat) in
/// EPSG:4326 with traditional axis order.
pub fn geographic_center(datasets: &[Dataset]) -> Result<(f64, f64)> {
    let first = datasets.first().ok_or(GeomergeError::NoReadableInputs)?;

    let (mut minx, mut miny) = (f64::INFINITY, f64::INFINITY);
    let (mut maxx, mut maxy) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for ds in datasets {
        let (x0, y0, x1, y1) = dataset_bounds(ds)?;
        minx = minx.min(x0);
        miny = miny.min(y0);
        maxx = maxx.max(x1);
        maxy = maxy.max(y1);
    }
    let cx = (minx + maxx) / 2.0;
    let cy = (miny + maxy) / 2.0;

    let mut src = native_spatial_ref(first)?;
    src.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    let mut wgs84 = SpatialRef::from_epsg(4326)?;
    wgs84.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

    let transform = CoordTransform::new(&src, &wgs84)?;
    let mut xs = [cx];
    let mut ys = [cy];
    let mut zs = [0.0];
    transform.transform_coords(&mut xs, &mut ys, &mut zs)?;
    Ok((xs[0], ys[0]))
}

/// Bounding box (minx, miny, maxx, maxy) of a dataset in its native CRS.
pub fn dataset_bounds(ds: &Dataset) -> Result<(f64, f64, f64, f64)> {
    let gt = ds.geo_transform()?;
    let (w, h) = ds.raster_size();
    let (w, h) = (w as f64, h as f64);

    let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
    let (mut minx, mut miny) = (f64::INFINITY, f64::INFINITY);
    let (mut maxx, mut maxy) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (px, py) in corners {
        let x = gt[0] + px * gt[1] + py * gt[2];
        let y = gt[3] + px * gt[4] + py * gt[5];
        minx = minx.min(x);
        miny = miny.min(y);
        maxx = maxx.max(x);
        maxy = maxy.max(y);
    }
    Ok((minx, miny, maxx, maxy))
}

/// Short display label for a spatial reference, preferring the
/// authority code over the full name.
pub fn crs_label(sr: &SpatialRef) -> String {
    match (sr.auth_name(), sr.auth_code()) {
        (Ok(auth), Ok(code)) => format!("{}:{}", auth, code),
        _ => sr.name().unwrap_or_else(|_| "unknown CRS".to_string()),
    }
}

/// Whether two spatial references describe the same CRS. Authority codes
/// are compared when both sides carry one, otherwise the WKT forms.
pub fn same_crs(a: &SpatialRef, b: &SpatialRef) -> bool {
    match (a.auth_code(), b.auth_code()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a.to_wkt().ok() == b.to_wkt().ok(),
    }
}

fn from_epsg(code: u32, auto_selected: bool) -> Result<TargetCrs> {
    let spatial_ref =
        SpatialRef::from_epsg(code).map_err(|_| GeomergeError::InvalidEpsg { code })?;
    Ok(TargetCrs {
        spatial_ref,
        epsg: Some(code),
        auto_selected,
    })
}

fn native_spatial_ref(ds: &Dataset) -> Result<SpatialRef> {
    ds.spatial_ref().map_err(|_| GeomergeError::MissingCrs {
        path: PathBuf::from(ds.description().unwrap_or_default()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_zone_formula() {
        // Berlin: zone 33 north
        assert_eq!(utm_epsg_for(13.4, 52.5), 32633);
        // Same longitude, southern hemisphere
        assert_eq!(utm_epsg_for(13.4, -20.0), 32733);
        // Zone edges
        assert_eq!(utm_epsg_for(-180.0, 10.0), 32601);
        assert_eq!(utm_epsg_for(179.9, 10.0), 32660);
        // Equator counts as north
        assert_eq!(utm_epsg_for(0.0, 0.0), 32631);
    }

    #[test]
    fn test_utm_zone_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(utm_epsg_for(-58.4, -34.6), 32721);
        }
    }
}
