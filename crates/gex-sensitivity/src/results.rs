//! Result routing: decode flat factor addresses back to their owning
//! matrix, row, column and scenario, and expose per-matrix 2D views.

use crate::factors::Contingency;
use crate::matrix::FactorPlan;
use gex_core::{GexError, GexResult};

/// Decoded position of a factor address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactorLocation {
    pub matrix_index: usize,
    pub row: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy)]
struct RouteEntry {
    offset_data: usize,
    offset_column: usize,
    column_count: usize,
    factor_count: usize,
}

/// Floor lookup over matrix data offsets: an address belongs to the matrix
/// with the greatest offset less than or equal to it.
#[derive(Debug, Clone)]
pub struct FactorRouter {
    // sorted by offset_data by construction (prefix sums)
    entries: Vec<RouteEntry>,
    total_factor_count: usize,
}

impl FactorRouter {
    pub fn new(plan: &FactorPlan) -> Self {
        let entries = plan
            .matrices()
            .iter()
            .map(|m| RouteEntry {
                offset_data: m.offset_data(),
                offset_column: m.offset_column(),
                column_count: m.column_count(),
                factor_count: m.factor_count(),
            })
            .collect();
        Self {
            entries,
            total_factor_count: plan.total_factor_count(),
        }
    }

    pub fn total_factor_count(&self) -> usize {
        self.total_factor_count
    }

    /// Decode an address into (matrix, row, column).
    pub fn decode(&self, address: usize) -> GexResult<FactorLocation> {
        if address >= self.total_factor_count {
            return Err(GexError::Validation(format!(
                "Factor address {address} out of range (total {})",
                self.total_factor_count
            )));
        }
        let matrix_index = self
            .entries
            .partition_point(|e| e.offset_data <= address)
            .saturating_sub(1);
        let entry = &self.entries[matrix_index];
        debug_assert!(address < entry.offset_data + entry.factor_count);
        let local = address - entry.offset_data;
        Ok(FactorLocation {
            matrix_index,
            row: local / entry.column_count,
            column: local % entry.column_count,
        })
    }

    /// Slot of the address's column in the flat reference array.
    fn reference_slot(&self, address: usize) -> GexResult<usize> {
        let location = self.decode(address)?;
        let entry = &self.entries[location.matrix_index];
        Ok(entry.offset_column + location.column)
    }
}

/// Sink the analysis engine pushes values into, once per emitted factor per
/// applicable scenario.
pub trait ValueSink {
    /// `contingency_index` of `None` denotes the base case.
    fn accept_value(
        &mut self,
        factor_address: usize,
        contingency_index: Option<usize>,
        value: f64,
        reference: f64,
    ) -> GexResult<()>;
}

/// Per-scenario flat result buffers plus the plan needed to slice them back
/// into matrices. Owned exclusively by one analysis run.
#[derive(Debug)]
pub struct SensitivityAnalysisResult {
    plan: FactorPlan,
    router: FactorRouter,
    contingency_ids: Vec<String>,
    base_values: Vec<f64>,
    base_references: Vec<f64>,
    contingency_values: Vec<Vec<f64>>,
    contingency_references: Vec<Vec<f64>>,
}

impl SensitivityAnalysisResult {
    pub fn new(plan: FactorPlan, contingencies: &[Contingency]) -> Self {
        let router = FactorRouter::new(&plan);
        let factor_count = plan.total_factor_count();
        let column_count = plan.total_column_count();
        Self {
            router,
            contingency_ids: contingencies.iter().map(|c| c.id.clone()).collect(),
            base_values: vec![f64::NAN; factor_count],
            base_references: vec![f64::NAN; column_count],
            contingency_values: vec![vec![f64::NAN; factor_count]; contingencies.len()],
            contingency_references: vec![vec![f64::NAN; column_count]; contingencies.len()],
            plan,
        }
    }

    pub fn plan(&self) -> &FactorPlan {
        &self.plan
    }

    pub fn router(&self) -> &FactorRouter {
        &self.router
    }

    /// 2D view of one matrix under one scenario (`None` = base case), plus
    /// its 1-D reference row.
    pub fn matrix(&self, id: &str, contingency_id: Option<&str>) -> GexResult<MatrixView<'_>> {
        let info = self
            .plan
            .matrix(id)
            .ok_or_else(|| GexError::Validation(format!("Matrix '{id}' is not registered")))?;
        let (values, references) = match contingency_id {
            None => (&self.base_values, &self.base_references),
            Some(cid) => {
                let index = self
                    .contingency_ids
                    .iter()
                    .position(|c| c == cid)
                    .ok_or_else(|| GexError::UnresolvedContingency(cid.to_string()))?;
                (&self.contingency_values[index], &self.contingency_references[index])
            }
        };
        let data_start = info.offset_data();
        let column_start = info.offset_column();
        Ok(MatrixView {
            row_count: info.row_count(),
            column_count: info.column_count(),
            values: &values[data_start..data_start + info.factor_count()],
            references: &references[column_start..column_start + info.column_count()],
        })
    }
}

impl ValueSink for SensitivityAnalysisResult {
    fn accept_value(
        &mut self,
        factor_address: usize,
        contingency_index: Option<usize>,
        value: f64,
        reference: f64,
    ) -> GexResult<()> {
        let reference_slot = self.router.reference_slot(factor_address)?;
        let (values, references) = match contingency_index {
            None => (&mut self.base_values, &mut self.base_references),
            Some(index) => {
                if index >= self.contingency_ids.len() {
                    return Err(GexError::Validation(format!(
                        "Contingency index {index} out of range ({} registered)",
                        self.contingency_ids.len()
                    )));
                }
                (&mut self.contingency_values[index], &mut self.contingency_references[index])
            }
        };
        // Re-writing an address is accepted: last write wins.
        values[factor_address] = value;
        references[reference_slot] = reference;
        Ok(())
    }
}

/// Row-major 2D slice of one matrix's results for one scenario.
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a> {
    row_count: usize,
    column_count: usize,
    values: &'a [f64],
    references: &'a [f64],
}

impl<'a> MatrixView<'a> {
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.column_count + column]
    }

    /// One row of sensitivity values.
    pub fn row(&self, row: usize) -> &'a [f64] {
        &self.values[row * self.column_count..(row + 1) * self.column_count]
    }

    /// Function reference value for a column (one per column, not per cell).
    pub fn reference(&self, column: usize) -> f64 {
        self.references[column]
    }

    pub fn references(&self) -> &'a [f64] {
        self.references
    }
}
