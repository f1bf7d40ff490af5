//! Shape handling for values read as flat row-major buffers.

use crate::error::{NetCdfError, NetCdfResult};

/// A named dimension of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dim {
    pub name: String,
    pub len: usize,
}

impl Dim {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
        }
    }
}

/// Axis to reduce to its first index.
///
/// A dimension called `time_dim` wins; otherwise the leading axis of a
/// variable with three or more dimensions is taken as time.
pub fn time_axis(dims: &[Dim], time_dim: &str) -> Option<usize> {
    dims.iter()
        .position(|d| d.name.eq_ignore_ascii_case(time_dim))
        .or(if dims.len() >= 3 { Some(0) } else { None })
}

/// Keep index `index` along `axis`, dropping that axis.
pub fn select_index(
    values: &[f64],
    dims: &[Dim],
    axis: usize,
    index: usize,
) -> NetCdfResult<(Vec<f64>, Vec<Dim>)> {
    let len = dims
        .get(axis)
        .map(|d| d.len)
        .ok_or_else(|| NetCdfError::ShapeMismatch(format!("no axis {} in {:?}", axis, dims)))?;
    if index >= len {
        return Err(NetCdfError::ShapeMismatch(format!(
            "index {} out of range for dimension '{}' of length {}",
            index, dims[axis].name, len
        )));
    }

    let total: usize = dims.iter().map(|d| d.len).product();
    if total != values.len() {
        return Err(NetCdfError::InvalidFormat(format!(
            "read {} values for shape {:?}",
            values.len(),
            dims.iter().map(|d| d.len).collect::<Vec<_>>()
        )));
    }

    let outer: usize = dims[..axis].iter().map(|d| d.len).product();
    let inner: usize = dims[axis + 1..].iter().map(|d| d.len).product();

    let mut out = Vec::with_capacity(outer * inner);
    for o in 0..outer {
        let start = o * len * inner + index * inner;
        out.extend_from_slice(&values[start..start + inner]);
    }

    let mut remaining = dims.to_vec();
    remaining.remove(axis);
    Ok((out, remaining))
}

/// Drop every size-1 dimension.
pub fn squeeze(dims: &[Dim]) -> Vec<Dim> {
    dims.iter().filter(|d| d.len != 1).cloned().collect()
}

/// Verify a squeezed raster lines up with its coordinate vectors.
///
/// Size-1 coordinate axes are squeezed the same way, so single-row or
/// single-cell grids compare equal to their squeezed rasters.
pub fn check_raster_shape(name: &str, dims: &[Dim], n_lat: usize, n_lon: usize) -> NetCdfResult<()> {
    let squeezed: Vec<usize> = squeeze(dims).iter().map(|d| d.len).collect();
    let expected: Vec<usize> = [n_lat, n_lon].into_iter().filter(|&n| n != 1).collect();
    if squeezed != expected {
        return Err(NetCdfError::ShapeMismatch(format!(
            "{} has shape {:?} after squeezing, coordinates give ({}, {})",
            name, squeezed, n_lat, n_lon
        )));
    }
    Ok(())
}

/// CF packing attributes of a variable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Packing {
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
}

impl Packing {
    /// Mask fill/missing values to NaN, then scale and offset.
    pub fn unpack(&self, raw: Vec<f64>) -> Vec<f64> {
        let scale = self.scale_factor.unwrap_or(1.0);
        let offset = self.add_offset.unwrap_or(0.0);
        raw.into_iter()
            .map(|v| {
                if Some(v) == self.fill_value || Some(v) == self.missing_value {
                    f64::NAN
                } else {
                    v * scale + offset
                }
            })
            .collect()
    }
}
