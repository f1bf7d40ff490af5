//! Grid → table flattening.

use std::collections::HashMap;

use pm_common::{CoordKey, GridKind, GridSource, JoinResolution};

/// One grid source as a flat table, one row per raster cell.
///
/// Row `k = i * n_lon + j` holds cell `(lat[i], lon[j])`: the outer product
/// of the coordinate vectors in the same row-major order as the rasters.
#[derive(Debug, Clone)]
pub struct FlatTable {
    pub kind: GridKind,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// Rounded join key per row (`None` for non-finite coordinates)
    pub keys: Vec<Option<CoordKey>>,
    columns: Vec<(String, Vec<f64>)>,
}

impl FlatTable {
    /// Build the coordinate mesh and attach rounded keys.
    pub fn from_grid(grid: &GridSource, resolution: JoinResolution) -> Self {
        let n = grid.n_cells();
        let mut lat = Vec::with_capacity(n);
        let mut lon = Vec::with_capacity(n);
        for &y in &grid.lat {
            for &x in &grid.lon {
                lat.push(y);
                lon.push(x);
            }
        }

        let keys = lat
            .iter()
            .zip(&lon)
            .map(|(&y, &x)| resolution.key(y, x))
            .collect();

        let columns = grid
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.values.clone()))
            .collect();

        Self {
            kind: grid.kind,
            lat,
            lon,
            keys,
            columns,
        }
    }

    pub fn len(&self) -> usize {
        self.lat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Row indices grouped by rounded key, each group in row order.
    pub fn key_index(&self) -> HashMap<CoordKey, Vec<usize>> {
        let mut index: HashMap<CoordKey, Vec<usize>> = HashMap::with_capacity(self.len());
        for (row, key) in self.keys.iter().enumerate() {
            if let Some(key) = key {
                index.entry(*key).or_default().push(row);
            }
        }
        index
    }
}
