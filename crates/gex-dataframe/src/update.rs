//! Write-side table: externally supplied columnar edits.

use crate::series::{Series, SeriesValues};
use gex_core::{GexError, GexResult};

/// A table of incoming edits: one or two index columns identifying target
/// items, plus zero or more value columns to apply.
///
/// Columns keep their insertion order; all must match the declared row
/// count.
#[derive(Debug, Clone, Default)]
pub struct UpdatingDataframe {
    row_count: usize,
    columns: Vec<Series>,
}

impl UpdatingDataframe {
    pub fn new(row_count: usize) -> Self {
        Self {
            row_count,
            columns: Vec::new(),
        }
    }

    /// Add a column. Rejects duplicate names and length mismatches.
    pub fn add_series(&mut self, series: Series) -> GexResult<()> {
        if series.len() != self.row_count {
            return Err(GexError::Validation(format!(
                "Column '{}' has {} rows, expected {}",
                series.name(),
                series.len(),
                self.row_count
            )));
        }
        if self.column(series.name()).is_some() {
            return Err(GexError::Validation(format!(
                "Duplicate column '{}'",
                series.name()
            )));
        }
        self.columns.push(series);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// The index columns, in insertion order.
    pub fn index_columns(&self) -> Vec<&Series> {
        self.columns
            .iter()
            .filter(|c| c.metadata().is_index())
            .collect()
    }

    /// The value (non-index) columns, in insertion order.
    pub fn value_columns(&self) -> Vec<&Series> {
        self.columns
            .iter()
            .filter(|c| !c.metadata().is_index())
            .collect()
    }

    pub fn string_value(&self, name: &str, row: usize) -> Option<&str> {
        self.column(name).and_then(|c| c.string_value(row))
    }

    pub fn double_value(&self, name: &str, row: usize) -> Option<f64> {
        self.column(name).and_then(|c| c.double_value(row))
    }

    pub fn int_value(&self, name: &str, row: usize) -> Option<i32> {
        self.column(name).and_then(|c| c.int_value(row))
    }

    pub fn boolean_value(&self, name: &str, row: usize) -> Option<bool> {
        self.column(name).and_then(|c| c.boolean_value(row))
    }
}

/// Build an updating dataframe from already materialized columns.
impl TryFrom<Vec<Series>> for UpdatingDataframe {
    type Error = GexError;

    fn try_from(columns: Vec<Series>) -> GexResult<Self> {
        let row_count = columns.first().map(Series::len).unwrap_or(0);
        let mut df = UpdatingDataframe::new(row_count);
        for series in columns {
            df.add_series(series)?;
        }
        Ok(df)
    }
}
