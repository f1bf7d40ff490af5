//! Inner join on rounded coordinate keys.

use std::collections::HashMap;

use pm_common::CoordKey;

use crate::flatten::FlatTable;

/// Result of joining a keyed left side against a table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutput<L> {
    /// (left row, right row index, key) in left order, then right order
    pub rows: Vec<(L, usize, CoordKey)>,
    /// Left rows whose key matched more than one right row
    pub multiplied_rows: usize,
}

/// Relational inner join of `left` against `right` on the rounded key.
///
/// Unmatched rows are dropped. A key present several times on the right
/// yields one output row per match; no deduplication happens here.
pub fn inner_join<L: Clone>(left: &[(L, CoordKey)], right: &FlatTable) -> JoinOutput<L> {
    let index = right.key_index();
    join_with_index(left, &index)
}

fn join_with_index<L: Clone>(
    left: &[(L, CoordKey)],
    index: &HashMap<CoordKey, Vec<usize>>,
) -> JoinOutput<L> {
    let mut rows = Vec::with_capacity(left.len());
    let mut multiplied_rows = 0;

    for (row, key) in left {
        let Some(matches) = index.get(key) else {
            continue;
        };
        if matches.len() > 1 {
            multiplied_rows += 1;
        }
        for &r in matches {
            rows.push((row.clone(), r, *key));
        }
    }

    JoinOutput {
        rows,
        multiplied_rows,
    }
}

/// Left side for the first join: every keyed row of a table.
pub fn keyed_rows(table: &FlatTable) -> Vec<(usize, CoordKey)> {
    table
        .keys
        .iter()
        .enumerate()
        .filter_map(|(row, key)| key.map(|k| (row, k)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_common::{GridField, GridKind, GridSource, JoinResolution};

    fn table(kind: GridKind, lat: Vec<f64>, lon: Vec<f64>) -> FlatTable {
        let n = lat.len() * lon.len();
        let grid = GridSource::new(kind, lat, lon, vec![GridField::new("v", vec![0.0; n])]);
        FlatTable::from_grid(&grid, JoinResolution::default())
    }

    #[test]
    fn test_unmatched_rows_dropped() {
        let left = table(GridKind::Aod, vec![10.0], vec![80.0, 80.5]);
        let right = table(GridKind::Met, vec![10.02], vec![80.03]);
        let out = inner_join(&keyed_rows(&left), &right);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].0, 0);
        assert_eq!(out.rows[0].1, 0);
        assert_eq!(out.multiplied_rows, 0);
    }

    #[test]
    fn test_duplicate_keys_multiply() {
        // Two right cells round to the same key.
        let left = table(GridKind::Aod, vec![10.0], vec![80.0]);
        let right = table(GridKind::Met, vec![10.01], vec![79.99, 80.04]);
        let out = inner_join(&keyed_rows(&left), &right);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].1, 0);
        assert_eq!(out.rows[1].1, 1);
        assert_eq!(out.multiplied_rows, 1);
    }

    #[test]
    fn test_left_order_preserved() {
        let left = table(GridKind::Aod, vec![10.0, 10.1], vec![80.0]);
        let right = table(GridKind::Met, vec![10.1, 10.0], vec![80.0]);
        let out = inner_join(&keyed_rows(&left), &right);
        let pairs: Vec<(usize, usize)> = out.rows.iter().map(|(l, r, _)| (*l, *r)).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_nan_coordinates_never_join() {
        let left = table(GridKind::Aod, vec![f64::NAN], vec![80.0]);
        assert!(keyed_rows(&left).is_empty());
    }
}
