use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::*};

use crate::types::AggregateRecord;

/// Stable column names of the statistics table, in order.
pub const STATS_COLUMNS: [&str; 9] = ["id", "label", "count", "total_weight", "min_x", "min_y", "max_x", "max_y", "area"];

/// Convert aggregate records into a DataFrame (one row per park).
/// The envelope is flattened into its four corner ordinates.
pub fn stats_to_dataframe(records: &[AggregateRecord]) -> Result<DataFrame> {
    let column = |name: &str, values: Vec<f64>| Column::new(name.into(), values);

    Ok(DataFrame::new(vec![
        Column::new("id".into(), records.iter().map(|r| r.id).collect::<Vec<i64>>()),
        Column::new("label".into(), records.iter().map(|r| r.label.as_deref().map(str::to_string)).collect::<Vec<Option<String>>>()),
        Column::new("count".into(), records.iter().map(|r| r.count).collect::<Vec<u64>>()),
        Column::new("total_weight".into(), records.iter().map(|r| r.total_weight).collect::<Vec<u64>>()),
        column("min_x", records.iter().map(|r| r.envelope.min().x).collect()),
        column("min_y", records.iter().map(|r| r.envelope.min().y).collect()),
        column("max_x", records.iter().map(|r| r.envelope.max().x).collect()),
        column("max_y", records.iter().map(|r| r.envelope.max().y).collect()),
        column("area", records.iter().map(|r| r.area).collect()),
    ]).context("[io::stats] Failed to build statistics DataFrame")?)
}

/// Write the statistics table to a CSV file.
pub fn write_stats_csv(path: &Path, records: &[AggregateRecord]) -> Result<()> {
    let mut df = stats_to_dataframe(records)?;
    let file = File::create(path)
        .with_context(|| format!("[io::stats] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(BufWriter::new(file))
        .finish(&mut df)
        .with_context(|| format!("[io::stats] Failed to write CSV to {}", path.display()))
}

/// Write the statistics table to a JSON file (array of row objects).
pub fn write_stats_json(path: &Path, records: &[AggregateRecord]) -> Result<()> {
    let mut df = stats_to_dataframe(records)?;
    let file = File::create(path)
        .with_context(|| format!("[io::stats] Failed to create JSON file: {}", path.display()))?;
    JsonWriter::new(BufWriter::new(file))
        .with_json_format(polars::io::json::JsonFormat::Json)
        .finish(&mut df)
        .with_context(|| format!("[io::stats] Failed to write JSON to {}", path.display()))
}

/// Write the statistics table to a Parquet file.
#[cfg(feature = "parquet")]
pub fn write_stats_parquet(path: &Path, records: &[AggregateRecord]) -> Result<()> {
    let mut df = stats_to_dataframe(records)?;
    let file = File::create(path)
        .with_context(|| format!("[io::stats] Failed to create Parquet file: {}", path.display()))?;
    ParquetWriter::new(BufWriter::new(file))
        .finish(&mut df)
        .with_context(|| format!("[io::stats] Failed to write Parquet to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use geo::{coord, polygon, MultiPolygon, Rect};

    use super::*;

    fn records() -> Vec<AggregateRecord> {
        let boundary = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 3.0), (x: 0.0, y: 3.0)]]);
        vec![
            AggregateRecord {
                id: 7, label: Some("Plaza".into()), count: 3, total_weight: 4,
                boundary: boundary.clone(),
                envelope: Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 3.0 }),
                area: 6.0,
            },
            AggregateRecord {
                id: 8, label: None, count: 0, total_weight: 0,
                boundary,
                envelope: Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 3.0 }),
                area: 6.0,
            },
        ]
    }

    #[test]
    fn dataframe_has_stable_columns() {
        let df = stats_to_dataframe(&records()).unwrap();
        assert_eq!(df.height(), 2);
        let names = df.get_column_names().iter().map(|n| n.as_str()).collect::<Vec<_>>();
        assert_eq!(names, STATS_COLUMNS);
    }

    #[test]
    fn dataframe_values() {
        let df = stats_to_dataframe(&records()).unwrap();
        assert_eq!(df.column("count").unwrap().u64().unwrap().get(0), Some(3));
        assert_eq!(df.column("total_weight").unwrap().u64().unwrap().get(1), Some(0));
        assert_eq!(df.column("label").unwrap().str().unwrap().get(1), None);
        assert_eq!(df.column("max_y").unwrap().f64().unwrap().get(0), Some(3.0));
    }

    #[test]
    fn empty_records_give_empty_table() {
        let df = stats_to_dataframe(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), STATS_COLUMNS.len());
    }

    #[test]
    fn writes_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("park_stats.csv");
        let json = dir.path().join("park_stats.json");
        write_stats_csv(&csv, &records()).unwrap();
        write_stats_json(&json, &records()).unwrap();

        let text = std::fs::read_to_string(&csv).unwrap();
        assert!(text.starts_with("id,label,count,total_weight"));
        assert_eq!(text.lines().count(), 3);
        let rows: Vec<serde_json::Value> = serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["label"], "Plaza");
    }

    #[cfg(feature = "parquet")]
    #[test]
    fn parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("park_stats.parquet");
        write_stats_parquet(&path, &records()).unwrap();

        let df = ParquetReader::new(File::open(&path).unwrap()).finish().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("id").unwrap().i64().unwrap().get(1), Some(8));
    }
}
