//! The tabular dataset consumed by the plot builder, and its intake from a
//! saved world object.
//!
//! Raw feed layout:
//!   row 0   : the three default axis column indices
//!   row 1   : column labels (if any field is non-numeric), otherwise a record
//!   row 2.. : records, one numeric field per column

use crate::error::{Result, VizError};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    axes: [usize; 3],
    labels: Vec<String>,
    records: Vec<Vec<f64>>,
}

impl Dataset {
    /// Builds a dataset, checking that it is rectangular and finite and that
    /// the default axes name existing columns.
    pub fn new(axes: [usize; 3], labels: Vec<String>, records: Vec<Vec<f64>>) -> Result<Self> {
        let columns = if labels.is_empty() {
            records.first().map_or(0, Vec::len)
        } else {
            labels.len()
        };

        if let Some(col) = axes.iter().copied().find(|&c| c >= columns) {
            return Err(VizError::InvalidArgument(format!(
                "default axis column {} out of range ({} columns)",
                col, columns
            )));
        }

        for (i, record) in records.iter().enumerate() {
            if record.len() != columns {
                return Err(VizError::InvalidArgument(format!(
                    "record {} has {} columns, expected {}",
                    i,
                    record.len(),
                    columns
                )));
            }
            if let Some(col) = record.iter().position(|v| !v.is_finite()) {
                return Err(VizError::InvalidArgument(format!(
                    "record {} column {} is not a finite number",
                    i, col
                )));
            }
        }

        let labels = if labels.is_empty() {
            (0..columns).map(|c| format!("column {}", c)).collect()
        } else {
            labels
        };

        Ok(Self {
            axes,
            labels,
            records,
        })
    }

    /// Parses the raw row feed (metadata row, optional label row, records).
    pub fn from_raw_rows(rows: &[Value]) -> Result<Self> {
        let (meta, rest) = rows
            .split_first()
            .ok_or_else(|| VizError::InvalidArgument("dataset has no metadata row".into()))?;

        let axes = parse_axes(meta)?;

        let mut rest = rest;
        let mut labels = Vec::new();
        if let Some((first, tail)) = rest.split_first() {
            let fields = row_fields(first, 1)?;
            if fields.iter().any(|f| field_number(f).is_none()) {
                labels = fields.iter().map(field_label).collect();
                rest = tail;
            }
        }

        let records = rest
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let fields = row_fields(row, i)?;
                fields
                    .iter()
                    .enumerate()
                    .map(|(col, f)| {
                        field_number(f).ok_or_else(|| {
                            VizError::InvalidArgument(format!(
                                "record {} column {} is not numeric: {}",
                                i, col, f
                            ))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(axes, labels, records)
    }

    /// Parses a saved world: either the bare row array, or a scene object
    /// carrying the rows in `userData` (optionally nested under `object`).
    pub fn from_world_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let rows = locate_rows(&value).ok_or_else(|| {
            VizError::Dataset("no dataset rows found (expected an array or userData)".into())
        })?;
        Self::from_raw_rows(rows)
    }

    /// Default axis column triple carried in the metadata row.
    #[inline]
    pub fn default_axes(&self) -> [usize; 3] {
        self.axes
    }

    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn records(&self) -> &[Vec<f64>] {
        &self.records
    }

    /// Verifies that the dataset can be plotted along `axes`.
    pub fn check_axes(&self, axes: [usize; 3]) -> Result<()> {
        if self.is_empty() {
            return Err(VizError::InvalidArgument("dataset has no records".into()));
        }
        for (name, col) in ["x", "y", "z"].iter().zip(axes) {
            if col >= self.column_count() {
                return Err(VizError::InvalidArgument(format!(
                    "{} column index {} out of range ({} columns)",
                    name,
                    col,
                    self.column_count()
                )));
            }
        }
        Ok(())
    }
}

fn locate_rows(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(rows) => Some(rows),
        Value::Object(map) => map
            .get("userData")
            .and_then(locate_rows)
            .or_else(|| map.get("object").and_then(locate_rows)),
        _ => None,
    }
}

fn row_fields(row: &Value, index: usize) -> Result<&[Value]> {
    row.as_array().map(Vec::as_slice).ok_or_else(|| {
        VizError::InvalidArgument(format!("row {} is not an array", index))
    })
}

fn field_number(field: &Value) -> Option<f64> {
    match field {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn field_label(field: &Value) -> String {
    match field {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_axes(meta: &Value) -> Result<[usize; 3]> {
    let fields = row_fields(meta, 0)?;
    if fields.len() < 3 {
        return Err(VizError::InvalidArgument(format!(
            "metadata row holds {} axis indices, expected 3",
            fields.len()
        )));
    }

    let mut axes = [0usize; 3];
    for (slot, field) in axes.iter_mut().zip(fields) {
        let n = field_number(field)
            .filter(|n| *n >= 0.0 && n.fract() == 0.0)
            .ok_or_else(|| {
                VizError::InvalidArgument(format!(
                    "axis index must be a non-negative integer, got {}",
                    field
                ))
            })?;
        *slot = n as usize;
    }
    Ok(axes)
}

/// External collaborator delivering the dataset to the bootstrapper.
pub trait DatasetSource {
    fn fetch(&self) -> Result<Dataset>;
}

/// A world saved as JSON on disk.
#[derive(Debug, Clone)]
pub struct WorldFile {
    path: PathBuf,
}

impl WorldFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for WorldFile {
    fn fetch(&self) -> Result<Dataset> {
        let text = std::fs::read_to_string(&self.path)?;
        Dataset::from_world_json(&text)
    }
}

/// An already-parsed dataset handed over in memory.
impl DatasetSource for Dataset {
    fn fetch(&self) -> Result<Dataset> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_metadata_labels_and_records() {
        let rows = json!([[0, 1, 2], ["colA", "colB", "colC"], [1, 2, 3], [4, 8, 12], [2, 4, 6]]);
        let ds = Dataset::from_raw_rows(rows.as_array().unwrap()).unwrap();

        assert_eq!(ds.default_axes(), [0, 1, 2]);
        assert_eq!(ds.labels(), ["colA", "colB", "colC"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records()[1], vec![4.0, 8.0, 12.0]);
    }

    #[test]
    fn numeric_second_row_is_a_record() {
        let rows = json!([[2, 0, 1], [1, 2, 3], ["4", "5", "6"]]);
        let ds = Dataset::from_raw_rows(rows.as_array().unwrap()).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels(), ["column 0", "column 1", "column 2"]);
        assert_eq!(ds.records()[1], vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn ragged_records_are_rejected() {
        let rows = json!([[0, 1, 2], ["a", "b", "c"], [1, 2, 3], [1, 2]]);
        let err = Dataset::from_raw_rows(rows.as_array().unwrap()).unwrap_err();
        assert!(matches!(err, VizError::InvalidArgument(_)));
    }

    #[test]
    fn negative_axis_index_is_rejected() {
        let rows = json!([[0, -1, 2], [1, 2, 3]]);
        let err = Dataset::from_raw_rows(rows.as_array().unwrap()).unwrap_err();
        assert!(matches!(err, VizError::InvalidArgument(_)));
    }

    #[test]
    fn default_axes_outside_the_columns_are_rejected() {
        let rows = json!([[0, 1, 5], [1, 2, 3]]);
        let err = Dataset::from_raw_rows(rows.as_array().unwrap()).unwrap_err();
        assert!(matches!(err, VizError::InvalidArgument(_)));

        let err = Dataset::new([3, 0, 1], vec!["a".into(); 3], vec![]).unwrap_err();
        assert!(matches!(err, VizError::InvalidArgument(_)));

        assert!(Dataset::new([2, 2, 2], vec![], vec![vec![1.0, 2.0, 3.0]]).is_ok());
    }

    #[test]
    fn check_axes_bounds() {
        let ds = Dataset::new([0, 1, 2], vec![], vec![vec![1.0, 2.0, 3.0]]).unwrap();
        assert!(ds.check_axes([0, 1, 2]).is_ok());
        assert!(ds.check_axes([0, 3, 2]).is_err());

        let empty = Dataset::new([0, 1, 2], vec!["a".into(); 3], vec![]).unwrap();
        assert!(empty.check_axes([0, 1, 2]).is_err());
    }

    #[test]
    fn world_json_finds_nested_user_data() {
        let text = r#"{
            "metadata": { "type": "Object" },
            "object": { "type": "Scene", "userData": [[0, 1, 2], ["a", "b", "c"], [1, 1, 1]] }
        }"#;
        let ds = Dataset::from_world_json(text).unwrap();
        assert_eq!(ds.len(), 1);

        assert!(matches!(
            Dataset::from_world_json(r#"{"object": {}}"#),
            Err(VizError::Dataset(_))
        ));
    }
}
