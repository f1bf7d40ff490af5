//! Three-way alignment of AOD, MET and PBLH grids.
//!
//! The AOD table drives the join: it is joined with MET and the result with
//! PBLH, both on the rounded `(lat, lon)` key. The surviving rows keep the
//! unrounded AOD coordinates as their output location.

use serde::Serialize;
use tracing::{debug, info, warn};

use pm_common::{
    Feature, FeatureRow, FeatureSchema, GridKind, GridSource, JoinResolution, MergedRecord,
    PipelineError, PipelineResult, FEATURE_COUNT,
};

use crate::flatten::FlatTable;
use crate::join::{inner_join, keyed_rows};

/// Where a model feature comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureBinding {
    pub feature: Feature,
    pub source: GridKind,
    pub column: String,
}

/// Source column for every feature of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureBindings {
    bindings: Vec<FeatureBinding>,
}

impl FeatureBindings {
    /// AOD from the AOD file, PBLH from the PBLH file, the rest from MET.
    pub fn standard() -> Self {
        let bindings = [
            Feature::Aod,
            Feature::Pblh,
            Feature::Ps,
            Feature::T2m,
            Feature::Qv2m,
            Feature::U10m,
            Feature::V10m,
        ]
        .into_iter()
        .map(|feature| {
            let (source, column) = match feature {
                Feature::Aod => (GridKind::Aod, "AOD"),
                Feature::Pblh => (GridKind::Pblh, "PBLH"),
                other => (GridKind::Met, other.column_name()),
            };
            FeatureBinding {
                feature,
                source,
                column: column.to_string(),
            }
        })
        .collect();
        Self { bindings }
    }

    /// Point a feature at a differently named variable.
    pub fn rename(mut self, feature: Feature, column: impl Into<String>) -> Self {
        if let Some(b) = self.bindings.iter_mut().find(|b| b.feature == feature) {
            b.column = column.into();
        }
        self
    }

    pub fn get(&self, feature: Feature) -> Option<&FeatureBinding> {
        self.bindings.iter().find(|b| b.feature == feature)
    }

    /// Columns a source must provide.
    pub fn columns_for(&self, source: GridKind) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|b| b.source == source)
            .map(|b| b.column.as_str())
            .collect()
    }
}

impl Default for FeatureBindings {
    fn default() -> Self {
        Self::standard()
    }
}

/// Row counts at each alignment stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignStats {
    pub aod_cells: usize,
    pub met_cells: usize,
    pub pblh_cells: usize,
    pub after_met_join: usize,
    pub after_pblh_join: usize,
    pub dropped_missing: usize,
    /// Rows that matched more than one cell on the right side of a join
    pub multiplied_rows: usize,
    pub merged_rows: usize,
}

/// Output of [`align_sources`].
#[derive(Debug, Clone)]
pub struct Alignment {
    pub records: Vec<MergedRecord>,
    pub stats: AlignStats,
}

impl Alignment {
    /// Feature vectors in record order.
    pub fn feature_matrix(&self) -> Vec<FeatureRow> {
        self.records.iter().map(|r| r.features).collect()
    }
}

/// Resolved column slice for one feature position.
struct ColumnRef<'a> {
    source: GridKind,
    values: &'a [f64],
}

fn resolve_columns<'a>(
    schema: &FeatureSchema,
    bindings: &FeatureBindings,
    tables: [&'a FlatTable; 3],
) -> PipelineResult<Vec<ColumnRef<'a>>> {
    schema
        .columns()
        .iter()
        .map(|&feature| {
            let binding = bindings.get(feature).ok_or_else(|| {
                PipelineError::schema(
                    "model",
                    format!("no source bound for feature '{}'", feature.column_name()),
                )
            })?;
            let table = tables
                .iter()
                .find(|t| t.kind == binding.source)
                .ok_or_else(|| {
                    PipelineError::schema(binding.source.as_str(), "source table not provided")
                })?;
            let values = table.column(&binding.column).ok_or_else(|| {
                PipelineError::schema(
                    binding.source.as_str(),
                    format!(
                        "variable '{}' not found (available: {})",
                        binding.column,
                        table.column_names().join(", ")
                    ),
                )
            })?;
            Ok(ColumnRef {
                source: binding.source,
                values,
            })
        })
        .collect()
}

fn check_source(grid: &GridSource, expected: GridKind) -> PipelineResult<()> {
    if grid.kind != expected {
        return Err(PipelineError::schema(
            expected.as_str(),
            format!("expected a {} grid, got {}", expected, grid.kind),
        ));
    }
    grid.validate()
        .map_err(|msg| PipelineError::schema(expected.as_str(), msg))
}

/// Join the three grids on rounded coordinates and build model inputs.
///
/// Rows missing any feature are dropped after the joins. Duplicate keys
/// multiply rows; the count is reported in the stats and logged.
pub fn align_sources(
    aod: &GridSource,
    met: &GridSource,
    pblh: &GridSource,
    schema: &FeatureSchema,
    bindings: &FeatureBindings,
    resolution: JoinResolution,
) -> PipelineResult<Alignment> {
    check_source(aod, GridKind::Aod)?;
    check_source(met, GridKind::Met)?;
    check_source(pblh, GridKind::Pblh)?;

    let aod_table = FlatTable::from_grid(aod, resolution);
    let met_table = FlatTable::from_grid(met, resolution);
    let pblh_table = FlatTable::from_grid(pblh, resolution);

    let columns = resolve_columns(schema, bindings, [&aod_table, &met_table, &pblh_table])?;

    let mut stats = AlignStats {
        aod_cells: aod_table.len(),
        met_cells: met_table.len(),
        pblh_cells: pblh_table.len(),
        ..Default::default()
    };
    debug!(
        aod_cells = stats.aod_cells,
        met_cells = stats.met_cells,
        pblh_cells = stats.pblh_cells,
        decimals = resolution.decimals,
        "Flattened grid sources"
    );

    let with_met = inner_join(&keyed_rows(&aod_table), &met_table);
    stats.after_met_join = with_met.rows.len();
    stats.multiplied_rows += with_met.multiplied_rows;

    let left: Vec<_> = with_met
        .rows
        .into_iter()
        .map(|(aod_row, met_row, key)| ((aod_row, met_row), key))
        .collect();
    let with_pblh = inner_join(&left, &pblh_table);
    stats.after_pblh_join = with_pblh.rows.len();
    stats.multiplied_rows += with_pblh.multiplied_rows;

    info!(
        after_met_join = stats.after_met_join,
        after_pblh_join = stats.after_pblh_join,
        "Joined grid sources"
    );
    if stats.multiplied_rows > 0 {
        warn!(
            multiplied_rows = stats.multiplied_rows,
            "Several source cells share a rounded coordinate; joined rows were multiplied"
        );
    }

    let mut records = Vec::with_capacity(with_pblh.rows.len());
    for ((aod_row, met_row), pblh_row, key) in with_pblh.rows {
        let mut features = [f64::NAN; FEATURE_COUNT];
        for (slot, col) in features.iter_mut().zip(&columns) {
            let row = match col.source {
                GridKind::Aod => aod_row,
                GridKind::Met => met_row,
                GridKind::Pblh => pblh_row,
            };
            *slot = col.values[row];
        }
        let record = MergedRecord {
            lat: aod_table.lat[aod_row],
            lon: aod_table.lon[aod_row],
            key,
            features,
        };
        if record.has_missing_feature() {
            stats.dropped_missing += 1;
        } else {
            records.push(record);
        }
    }
    stats.merged_rows = records.len();

    info!(
        merged_rows = stats.merged_rows,
        dropped_missing = stats.dropped_missing,
        "Aligned feature rows"
    );

    if records.is_empty() {
        return Err(PipelineError::EmptyJoin);
    }

    Ok(Alignment { records, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm_common::{CoordKey, GridField};

    fn met(lat: Vec<f64>, lon: Vec<f64>, value: f64) -> GridSource {
        let n = lat.len() * lon.len();
        let fields = ["PS", "T2M", "QV2M", "U10M", "V10M"]
            .iter()
            .map(|name| GridField::new(*name, vec![value; n]))
            .collect();
        GridSource::new(GridKind::Met, lat, lon, fields)
    }

    fn single(kind: GridKind, name: &str, lat: f64, lon: f64, value: f64) -> GridSource {
        GridSource::new(kind, vec![lat], vec![lon], vec![GridField::new(name, vec![value])])
    }

    fn align(aod: &GridSource, met: &GridSource, pblh: &GridSource) -> PipelineResult<Alignment> {
        align_sources(
            aod,
            met,
            pblh,
            &FeatureSchema::pm25(),
            &FeatureBindings::standard(),
            JoinResolution::default(),
        )
    }

    #[test]
    fn test_standard_bindings() {
        let b = FeatureBindings::standard();
        assert_eq!(b.columns_for(GridKind::Aod), vec!["AOD"]);
        assert_eq!(b.columns_for(GridKind::Pblh), vec!["PBLH"]);
        assert_eq!(
            b.columns_for(GridKind::Met),
            vec!["PS", "T2M", "QV2M", "U10M", "V10M"]
        );
    }

    #[test]
    fn test_rename_binding() {
        let b = FeatureBindings::standard().rename(Feature::Aod, "Optical_Depth_055");
        assert_eq!(b.get(Feature::Aod).unwrap().column, "Optical_Depth_055");
    }

    #[test]
    fn test_features_follow_schema_order() {
        let aod = single(GridKind::Aod, "AOD", 10.0, 80.0, 0.5);
        let met = met(vec![10.04], vec![80.02], 7.0);
        let pblh = single(GridKind::Pblh, "PBLH", 10.04, 80.02, 500.0);

        let alignment = align(&aod, &met, &pblh).unwrap();
        assert_eq!(alignment.records.len(), 1);
        let record = &alignment.records[0];
        assert_eq!(record.key, CoordKey { lat: 100, lon: 800 });
        assert_eq!(record.lat, 10.0);
        assert_eq!(record.lon, 80.0);
        assert_eq!(record.features, [0.5, 500.0, 7.0, 7.0, 7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_no_overlap_is_empty_join() {
        let aod = single(GridKind::Aod, "AOD", 10.0, 80.0, 0.5);
        let met = met(vec![20.0], vec![80.0], 1.0);
        let pblh = single(GridKind::Pblh, "PBLH", 10.0, 80.0, 500.0);

        let err = align(&aod, &met, &pblh).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyJoin));
    }

    #[test]
    fn test_missing_feature_rows_dropped() {
        let aod = GridSource::new(
            GridKind::Aod,
            vec![10.0],
            vec![80.0, 80.1],
            vec![GridField::new("AOD", vec![0.4, f64::NAN])],
        );
        let met = met(vec![10.0], vec![80.0, 80.1], 1.0);
        let pblh = GridSource::new(
            GridKind::Pblh,
            vec![10.0],
            vec![80.0, 80.1],
            vec![GridField::new("PBLH", vec![300.0, 310.0])],
        );

        let alignment = align(&aod, &met, &pblh).unwrap();
        assert_eq!(alignment.records.len(), 1);
        assert_eq!(alignment.stats.after_pblh_join, 2);
        assert_eq!(alignment.stats.dropped_missing, 1);
    }

    #[test]
    fn test_duplicate_keys_are_counted_not_removed() {
        let aod = single(GridKind::Aod, "AOD", 10.0, 80.0, 0.5);
        // Both MET columns round to lon 80.0.
        let met = met(vec![10.0], vec![79.98, 80.03], 1.0);
        let pblh = single(GridKind::Pblh, "PBLH", 10.0, 80.0, 500.0);

        let alignment = align(&aod, &met, &pblh).unwrap();
        assert_eq!(alignment.records.len(), 2);
        assert_eq!(alignment.stats.multiplied_rows, 1);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let aod = single(GridKind::Aod, "AOD", 10.0, 80.0, 0.5);
        let mut met = met(vec![10.0], vec![80.0], 1.0);
        met.fields.retain(|f| f.name != "QV2M");
        let pblh = single(GridKind::Pblh, "PBLH", 10.0, 80.0, 500.0);

        let err = align(&aod, &met, &pblh).unwrap_err();
        match err {
            PipelineError::SchemaMismatch { source_name, message } => {
                assert_eq!(source_name, "met");
                assert!(message.contains("QV2M"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_swapped_sources_rejected() {
        let aod = single(GridKind::Aod, "AOD", 10.0, 80.0, 0.5);
        let met = met(vec![10.0], vec![80.0], 1.0);
        let pblh = single(GridKind::Pblh, "PBLH", 10.0, 80.0, 500.0);

        let err = align(&aod, &pblh, &met).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_feature_matrix_matches_records() {
        let aod = single(GridKind::Aod, "AOD", 10.0, 80.0, 0.5);
        let met = met(vec![10.0], vec![80.0], 2.0);
        let pblh = single(GridKind::Pblh, "PBLH", 10.0, 80.0, 500.0);

        let alignment = align(&aod, &met, &pblh).unwrap();
        assert_eq!(alignment.feature_matrix(), vec![alignment.records[0].features]);
    }
}
