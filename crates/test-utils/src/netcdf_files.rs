//! Writers for small netCDF-4 grid files.
//!
//! netCDF-4 files are HDF5 files, so the AOD writer also produces a valid
//! stand-in for the satellite HDF5 product.

use std::path::Path;

use crate::fixtures::GridFixture;

/// Fill value used by the reanalysis products.
pub const REANALYSIS_FILL: f64 = 1.0e15;

/// Write an AOD container: `AOD(latitude, longitude)` plus coordinate datasets.
pub fn write_aod_file(path: &Path, grid: &GridFixture) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    file.add_dimension("latitude", grid.lat.len())?;
    file.add_dimension("longitude", grid.lon.len())?;

    {
        let mut var = file.add_variable::<f64>("latitude", &["latitude"])?;
        var.put_values(&grid.lat, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("longitude", &["longitude"])?;
        var.put_values(&grid.lon, ..)?;
    }
    for (name, values) in &grid.fields {
        let mut var = file.add_variable::<f64>(name, &["latitude", "longitude"])?;
        var.put_values(values, ..)?;
    }
    Ok(())
}

/// Write a reanalysis file: every field over `(time=1, lat, lon)`.
///
/// NaN values are stored as [`REANALYSIS_FILL`] with a matching `_FillValue`
/// attribute, the way the real products mark missing cells.
pub fn write_reanalysis_file(path: &Path, grid: &GridFixture) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    file.add_dimension("time", 1)?;
    file.add_dimension("lat", grid.lat.len())?;
    file.add_dimension("lon", grid.lon.len())?;

    {
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_attribute("units", "minutes since 2024-01-01 00:30:00")?;
        var.put_values(&[0.0f64], ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("lat", &["lat"])?;
        var.put_values(&grid.lat, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("lon", &["lon"])?;
        var.put_values(&grid.lon, ..)?;
    }
    for (name, values) in &grid.fields {
        let stored: Vec<f64> = values
            .iter()
            .map(|v| if v.is_nan() { REANALYSIS_FILL } else { *v })
            .collect();
        let mut var = file.add_variable::<f64>(name, &["time", "lat", "lon"])?;
        var.put_attribute("_FillValue", REANALYSIS_FILL)?;
        var.put_values(&stored, ..)?;
    }
    Ok(())
}
