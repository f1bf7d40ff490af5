//! Grid reading through the native netcdf library.
//!
//! The netCDF-4 library reads both the reanalysis netCDF files and the HDF5
//! AOD container, so all three sources share one code path.

use std::path::Path;
use std::sync::Once;

use pm_common::{GridField, GridKind, GridSource};
use tracing::debug;

use crate::array::{check_raster_shape, select_index, squeeze, time_axis, Dim, Packing};
use crate::error::{NetCdfError, NetCdfResult};
use crate::layout::SourceLayout;

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// Call this early in `main()`, before any HDF5/NetCDF operations occur.
/// Safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Read one grid source from a file on disk.
pub fn load_grid<P: AsRef<Path>>(path: P, kind: GridKind, layout: &SourceLayout) -> NetCdfResult<GridSource> {
    silence_hdf5_errors();

    let path = path.as_ref();
    let file = netcdf::open(path).map_err(|e| NetCdfError::OpenFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let lat = read_coordinate(&file, &layout.lat_var, layout.decode_cf)?;
    let lon = read_coordinate(&file, &layout.lon_var, layout.decode_cf)?;

    let mut fields = Vec::with_capacity(layout.value_vars.len());
    for name in &layout.value_vars {
        let values = read_raster(&file, name, layout, lat.len(), lon.len())?;
        fields.push(GridField::new(name.clone(), values));
    }

    let grid = GridSource::new(kind, lat, lon, fields);
    grid.validate().map_err(NetCdfError::ShapeMismatch)?;

    debug!(
        source = %kind,
        path = %path.display(),
        n_lat = grid.lat.len(),
        n_lon = grid.lon.len(),
        fields = layout.value_vars.len(),
        "Loaded grid source"
    );

    Ok(grid)
}

/// Read a 1-D coordinate vector (size-1 axes are squeezed away).
fn read_coordinate(file: &netcdf::File, name: &str, decode_cf: bool) -> NetCdfResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingVariable(name.to_string()))?;
    let dims = dims_of(&var);
    if squeeze(&dims).len() > 1 {
        return Err(NetCdfError::ShapeMismatch(format!(
            "coordinate '{}' must be 1-D, found shape {:?}",
            name,
            dims.iter().map(|d| d.len).collect::<Vec<_>>()
        )));
    }
    read_values(&var, name, decode_cf)
}

/// Read a value raster, pick the first time step and check it against the grid.
fn read_raster(
    file: &netcdf::File,
    name: &str,
    layout: &SourceLayout,
    n_lat: usize,
    n_lon: usize,
) -> NetCdfResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingVariable(name.to_string()))?;

    let mut dims = dims_of(&var);
    let mut values = read_values(&var, name, layout.decode_cf)?;

    if let Some(time_dim) = &layout.time_dim {
        if let Some(axis) = time_axis(&dims, time_dim) {
            let (selected, rest) = select_index(&values, &dims, axis, 0)?;
            values = selected;
            dims = rest;
        }
    }

    check_raster_shape(name, &dims, n_lat, n_lon)?;
    Ok(values)
}

fn read_values(var: &netcdf::Variable, name: &str, decode_cf: bool) -> NetCdfResult<Vec<f64>> {
    let raw: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("failed to read '{}': {}", name, e)))?;

    if !decode_cf {
        return Ok(raw);
    }

    let packing = Packing {
        fill_value: get_f64_attr(var, "_FillValue"),
        missing_value: get_f64_attr(var, "missing_value"),
        scale_factor: get_f64_attr(var, "scale_factor"),
        add_offset: get_f64_attr(var, "add_offset"),
    };
    Ok(packing.unpack(raw))
}

fn dims_of(var: &netcdf::Variable) -> Vec<Dim> {
    var.dimensions()
        .iter()
        .map(|d| Dim::new(d.name(), d.len()))
        .collect()
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get a numeric attribute as f64.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}
