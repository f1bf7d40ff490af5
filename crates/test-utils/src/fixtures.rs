//! Ready-made input grids.

use std::path::{Path, PathBuf};

use crate::generators::axis;
use crate::netcdf_files::{write_aod_file, write_reanalysis_file};

/// One source grid before it is written to disk.
#[derive(Debug, Clone)]
pub struct GridFixture {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// (variable name, row-major values)
    pub fields: Vec<(String, Vec<f64>)>,
}

impl GridFixture {
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> Self {
        Self {
            lat,
            lon,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: &str, values: Vec<f64>) -> Self {
        self.fields.push((name.to_string(), values));
        self
    }

    pub fn n_cells(&self) -> usize {
        self.lat.len() * self.lon.len()
    }
}

/// Paths of a scenario written to disk.
#[derive(Debug, Clone)]
pub struct ScenarioFiles {
    pub aod: PathBuf,
    pub met: PathBuf,
    pub pblh: PathBuf,
}

/// The three inputs of one prediction request.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub aod: GridFixture,
    pub met: GridFixture,
    pub pblh: GridFixture,
}

impl Scenario {
    /// One AOD cell at (10.00, 80.00) with matching MET and PBLH cells
    /// offset by a few hundredths of a degree.
    ///
    /// Expected feature vector: `[0.5, 500, 101325, 300, 0.01, 1.0, -1.0]`.
    pub fn single_cell() -> Self {
        Self {
            aod: GridFixture::new(vec![10.00], vec![80.00]).with_field("AOD", vec![0.5]),
            met: GridFixture::new(vec![10.04], vec![80.02])
                .with_field("PS", vec![101325.0])
                .with_field("T2M", vec![300.0])
                .with_field("QV2M", vec![0.01])
                .with_field("U10M", vec![1.0])
                .with_field("V10M", vec![-1.0]),
            pblh: GridFixture::new(vec![10.04], vec![80.02]).with_field("PBLH", vec![500.0]),
        }
    }

    /// A 4x4 AOD tile at 0.1 degree spacing over a 3x4 MET grid and a
    /// 4x2 PBLH grid with one missing cell.
    ///
    /// Rounded keys shared by all three sources: lat 10.0..=10.2 by
    /// lon 80.0..=80.1, minus the PBLH gap at (10.1, 80.1): five rows.
    pub fn regional() -> Self {
        let aod_lat = axis(10.0, 0.1, 4);
        let aod_lon = axis(80.0, 0.1, 4);
        let aod_values: Vec<f64> = (0..16).map(|i| 0.2 + 0.05 * i as f64).collect();

        let met_lat = axis(10.01, 0.1, 3);
        let met_lon = axis(80.02, 0.1, 4);
        let n_met = met_lat.len() * met_lon.len();
        let met = GridFixture::new(met_lat, met_lon)
            .with_field("PS", (0..n_met).map(|i| 100000.0 + 10.0 * i as f64).collect())
            .with_field("T2M", (0..n_met).map(|i| 295.0 + 0.5 * i as f64).collect())
            .with_field("QV2M", vec![0.012; n_met])
            .with_field("U10M", vec![2.0; n_met])
            .with_field("V10M", vec![-0.5; n_met]);

        let pblh_values = vec![400.0, 410.0, 420.0, f64::NAN, 440.0, 450.0, 460.0, 470.0];
        let pblh = GridFixture::new(axis(10.0, 0.1, 4), axis(80.0, 0.1, 2))
            .with_field("PBLH", pblh_values);

        Self {
            aod: GridFixture::new(aod_lat, aod_lon).with_field("AOD", aod_values),
            met,
            pblh,
        }
    }

    /// Write the three files into `dir` using the upload file names.
    pub fn write_to(&self, dir: &Path) -> Result<ScenarioFiles, netcdf::Error> {
        let files = ScenarioFiles {
            aod: dir.join("aod.h5"),
            met: dir.join("met.nc4"),
            pblh: dir.join("pblh.nc"),
        };
        write_aod_file(&files.aod, &self.aod)?;
        write_reanalysis_file(&files.met, &self.met)?;
        write_reanalysis_file(&files.pblh, &self.pblh)?;
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cell_shapes() {
        let s = Scenario::single_cell();
        assert_eq!(s.aod.n_cells(), 1);
        assert_eq!(s.met.fields.len(), 5);
        assert_eq!(s.pblh.fields[0].1, vec![500.0]);
    }

    #[test]
    fn test_regional_field_lengths_match_grids() {
        let s = Scenario::regional();
        for grid in [&s.aod, &s.met, &s.pblh] {
            for (name, values) in &grid.fields {
                assert_eq!(values.len(), grid.n_cells(), "{}", name);
            }
        }
    }
}
