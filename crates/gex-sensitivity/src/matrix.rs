//! Matrix registry: declare any number of named sensitivity matrices, then
//! flatten them into one linear factor/column address space.
//!
//! Offsets are assigned once, at plan construction, in fixed category order:
//! branch-flow matrices, pre-contingency matrices, post-contingency
//! matrices, then the single bus-voltage matrix. Each matrix's data offset
//! is the running prefix sum of the factor counts before it; its column
//! offset the prefix sum of column counts.

use crate::engine::{EngineRegistry, SensitivityParameters};
use crate::factors::{
    AddressedFactor, Contingency, ContingencyContext, SensitivityFactor, SensitivityFunctionType,
    SensitivityVariableType, VariableSet,
};
use crate::results::SensitivityAnalysisResult;
use gex_core::{GexError, GexResult, Network};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Contingency scope of a whole matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContingencyScope {
    All,
    None,
    Specific,
}

/// One registered matrix: row ids x column ids tied to a function type and
/// a contingency scope, plus its two offsets into the flat address space.
#[derive(Debug, Clone)]
pub struct MatrixInfo {
    id: String,
    scope: ContingencyScope,
    function_type: SensitivityFunctionType,
    row_ids: Vec<String>,
    column_ids: Vec<String>,
    contingency_ids: Vec<String>,
    offset_data: usize,
    offset_column: usize,
}

impl MatrixInfo {
    fn new(
        id: &str,
        scope: ContingencyScope,
        function_type: SensitivityFunctionType,
        row_ids: &[&str],
        column_ids: &[&str],
        contingency_ids: &[&str],
    ) -> Self {
        Self {
            id: id.to_string(),
            scope,
            function_type,
            row_ids: row_ids.iter().map(|s| s.to_string()).collect(),
            column_ids: column_ids.iter().map(|s| s.to_string()).collect(),
            contingency_ids: contingency_ids.iter().map(|s| s.to_string()).collect(),
            offset_data: 0,
            offset_column: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scope(&self) -> ContingencyScope {
        self.scope
    }

    pub fn function_type(&self) -> SensitivityFunctionType {
        self.function_type
    }

    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    pub fn column_ids(&self) -> &[String] {
        &self.column_ids
    }

    pub fn contingency_ids(&self) -> &[String] {
        &self.contingency_ids
    }

    pub fn row_count(&self) -> usize {
        self.row_ids.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_ids.len()
    }

    /// rowCount x columnCount factors occupied in the flat value array.
    pub fn factor_count(&self) -> usize {
        self.row_count() * self.column_count()
    }

    pub fn offset_data(&self) -> usize {
        self.offset_data
    }

    pub fn offset_column(&self) -> usize {
        self.offset_column
    }
}

/// Registry of sensitivity matrices, contingencies and variable sets for
/// one analysis run.
///
/// Internal structures are not designed for concurrent mutation; a run is
/// single-threaded up to the engine hand-off.
#[derive(Debug, Default)]
pub struct SensitivityAnalysisContext {
    branch_flow_matrices: Vec<MatrixInfo>,
    pre_contingency_matrices: Vec<MatrixInfo>,
    post_contingency_matrices: Vec<MatrixInfo>,
    bus_voltage_matrix: Option<MatrixInfo>,
    contingencies: Vec<Contingency>,
    variable_sets: Vec<VariableSet>,
}

impl SensitivityAnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contingency(&mut self, contingency: Contingency) {
        self.contingencies.push(contingency);
    }

    pub fn set_variable_sets(&mut self, variable_sets: Vec<VariableSet>) {
        self.variable_sets = variable_sets;
    }

    pub fn contingencies(&self) -> &[Contingency] {
        &self.contingencies
    }

    pub fn variable_sets(&self) -> &[VariableSet] {
        &self.variable_sets
    }

    fn validate_ids(id: &str, row_ids: &[&str], column_ids: &[&str]) -> GexResult<()> {
        if row_ids.is_empty() {
            return Err(GexError::Validation(format!(
                "Matrix '{id}': row id list is empty"
            )));
        }
        if column_ids.is_empty() {
            return Err(GexError::Validation(format!(
                "Matrix '{id}': column id list is empty"
            )));
        }
        Ok(())
    }

    fn check_duplicate(category: &[MatrixInfo], id: &str) -> GexResult<()> {
        if category.iter().any(|m| m.id == id) {
            return Err(GexError::Validation(format!(
                "Matrix '{id}' is already registered in this category"
            )));
        }
        Ok(())
    }

    /// Branch-flow matrix evaluated under the base case and every
    /// contingency.
    pub fn add_branch_flow_factor_matrix(
        &mut self,
        id: &str,
        variable_ids: &[&str],
        branch_ids: &[&str],
    ) -> GexResult<()> {
        Self::validate_ids(id, variable_ids, branch_ids)?;
        Self::check_duplicate(&self.branch_flow_matrices, id)?;
        self.branch_flow_matrices.push(MatrixInfo::new(
            id,
            ContingencyScope::All,
            SensitivityFunctionType::BranchActivePower,
            variable_ids,
            branch_ids,
            &[],
        ));
        Ok(())
    }

    /// Branch-flow matrix evaluated under the base case only.
    pub fn add_precontingency_branch_flow_factor_matrix(
        &mut self,
        id: &str,
        variable_ids: &[&str],
        branch_ids: &[&str],
    ) -> GexResult<()> {
        Self::validate_ids(id, variable_ids, branch_ids)?;
        Self::check_duplicate(&self.pre_contingency_matrices, id)?;
        self.pre_contingency_matrices.push(MatrixInfo::new(
            id,
            ContingencyScope::None,
            SensitivityFunctionType::BranchActivePower,
            variable_ids,
            branch_ids,
            &[],
        ));
        Ok(())
    }

    /// Branch-flow matrix evaluated under the listed contingencies only.
    pub fn add_postcontingency_branch_flow_factor_matrix(
        &mut self,
        id: &str,
        variable_ids: &[&str],
        branch_ids: &[&str],
        contingency_ids: &[&str],
    ) -> GexResult<()> {
        Self::validate_ids(id, variable_ids, branch_ids)?;
        Self::check_duplicate(&self.post_contingency_matrices, id)?;
        if contingency_ids.is_empty() {
            return Err(GexError::Validation(format!(
                "Matrix '{id}': post-contingency matrix requires contingency ids"
            )));
        }
        self.post_contingency_matrices.push(MatrixInfo::new(
            id,
            ContingencyScope::Specific,
            SensitivityFunctionType::BranchActivePower,
            variable_ids,
            branch_ids,
            contingency_ids,
        ));
        Ok(())
    }

    /// The single bus-voltage matrix. Replaces any previous one.
    pub fn set_bus_voltage_factor_matrix(
        &mut self,
        id: &str,
        target_voltage_ids: &[&str],
        bus_voltage_ids: &[&str],
    ) -> GexResult<()> {
        Self::validate_ids(id, target_voltage_ids, bus_voltage_ids)?;
        self.bus_voltage_matrix = Some(MatrixInfo::new(
            id,
            ContingencyScope::All,
            SensitivityFunctionType::BusVoltage,
            target_voltage_ids,
            bus_voltage_ids,
            &[],
        ));
        Ok(())
    }

    /// Finalize registration: check post-contingency matrices against the registered
    /// contingencies and assign offsets in the fixed category order.
    pub fn prepare(&self) -> GexResult<FactorPlan> {
        for matrix in &self.post_contingency_matrices {
            for contingency_id in &matrix.contingency_ids {
                if !self.contingencies.iter().any(|c| &c.id == contingency_id) {
                    return Err(GexError::UnresolvedContingency(contingency_id.clone()));
                }
            }
        }

        let mut matrices: Vec<MatrixInfo> = Vec::new();
        let mut offset_data = 0;
        let mut offset_column = 0;
        let categories = self
            .branch_flow_matrices
            .iter()
            .chain(self.pre_contingency_matrices.iter())
            .chain(self.post_contingency_matrices.iter())
            .chain(self.bus_voltage_matrix.iter());
        for matrix in categories {
            let mut matrix = matrix.clone();
            matrix.offset_data = offset_data;
            matrix.offset_column = offset_column;
            offset_data += matrix.factor_count();
            offset_column += matrix.column_count();
            matrices.push(matrix);
        }
        Ok(FactorPlan { matrices })
    }

    /// Full run: resolve and emit factors, hand them to the named engine,
    /// route its callbacks into per-scenario buffers.
    ///
    /// All resolution failures abort before the engine does any work.
    pub fn run(
        &self,
        network: &Network,
        registry: &EngineRegistry,
        engine_name: &str,
        parameters: &SensitivityParameters,
    ) -> GexResult<SensitivityAnalysisResult> {
        let engine = registry.find(engine_name)?;
        let plan = self.prepare()?;
        let factors = plan.emit_factors(network, &self.variable_sets)?;
        debug!(
            "Prepared {} matrices ({} factors, {} columns) for engine '{}'",
            plan.matrices().len(),
            plan.total_factor_count(),
            plan.total_column_count(),
            engine_name
        );

        let mut result = SensitivityAnalysisResult::new(plan, &self.contingencies);
        engine
            .run(
                network,
                network.working_variant_id(),
                &factors,
                &mut result,
                &self.contingencies,
                &self.variable_sets,
                parameters,
            )
            .map_err(|e| GexError::Engine(e.to_string()))?;
        info!("Sensitivity analysis completed with engine '{engine_name}'");
        Ok(result)
    }
}

/// The finalized linear address space: every registered matrix with its
/// offsets assigned, in category order.
#[derive(Debug, Clone)]
pub struct FactorPlan {
    matrices: Vec<MatrixInfo>,
}

impl FactorPlan {
    pub fn matrices(&self) -> &[MatrixInfo] {
        &self.matrices
    }

    pub fn matrix(&self, id: &str) -> Option<&MatrixInfo> {
        self.matrices.iter().find(|m| m.id == id)
    }

    /// Sum of rowCount x columnCount over all matrices.
    pub fn total_factor_count(&self) -> usize {
        self.matrices.iter().map(MatrixInfo::factor_count).sum()
    }

    /// Sum of columnCount over all matrices.
    pub fn total_column_count(&self) -> usize {
        self.matrices.iter().map(MatrixInfo::column_count).sum()
    }

    /// Emit one factor descriptor per (row, column) pair in row-major
    /// order, per contingency context implied by the matrix scope.
    ///
    /// Fail-fast: the first unresolvable id aborts the run with no factor
    /// stream handed to the engine.
    pub fn emit_factors(
        &self,
        network: &Network,
        variable_sets: &[VariableSet],
    ) -> GexResult<Vec<AddressedFactor>> {
        let mut factors = Vec::new();
        for matrix in &self.matrices {
            let contexts = contexts_for(matrix);
            match matrix.function_type {
                SensitivityFunctionType::BranchActivePower => {
                    emit_branch_flow_factors(matrix, &contexts, network, variable_sets, &mut factors)?;
                }
                SensitivityFunctionType::BusVoltage => {
                    emit_bus_voltage_factors(matrix, &contexts, network, &mut factors)?;
                }
            }
        }
        Ok(factors)
    }
}

fn contexts_for(matrix: &MatrixInfo) -> Vec<ContingencyContext> {
    match matrix.scope {
        ContingencyScope::All => vec![ContingencyContext::All],
        ContingencyScope::None => vec![ContingencyContext::None],
        ContingencyScope::Specific => matrix
            .contingency_ids
            .iter()
            .map(|id| ContingencyContext::Specific(id.clone()))
            .collect(),
    }
}

/// Resolution ladder for a branch-flow row id: injection, then phase
/// shifter, then variable set.
fn resolve_variable(
    network: &Network,
    variable_sets: &[VariableSet],
    row_id: &str,
) -> GexResult<(SensitivityVariableType, bool)> {
    if network.injection_kind(row_id).is_some() {
        return Ok((SensitivityVariableType::InjectionActivePower, false));
    }
    if let Some(transformer) = network.transformer(row_id) {
        if !transformer.has_phase_tap_changer {
            return Err(GexError::NotPhaseShifter(row_id.to_string()));
        }
        return Ok((SensitivityVariableType::TransformerPhase, false));
    }
    if variable_sets.iter().any(|vs| vs.id == row_id) {
        return Ok((SensitivityVariableType::InjectionActivePower, true));
    }
    Err(GexError::UnresolvedVariable(row_id.to_string()))
}

fn emit_branch_flow_factors(
    matrix: &MatrixInfo,
    contexts: &[ContingencyContext],
    network: &Network,
    variable_sets: &[VariableSet],
    factors: &mut Vec<AddressedFactor>,
) -> GexResult<()> {
    for (row, row_id) in matrix.row_ids.iter().enumerate() {
        let (variable_type, is_variable_set) = resolve_variable(network, variable_sets, row_id)?;
        for (column, branch_id) in matrix.column_ids.iter().enumerate() {
            if !network.has_branch(branch_id) {
                return Err(GexError::UnresolvedFunction(branch_id.clone()));
            }
            let address = matrix.offset_data + row * matrix.column_count() + column;
            for context in contexts {
                factors.push(AddressedFactor {
                    address,
                    factor: SensitivityFactor {
                        function_type: SensitivityFunctionType::BranchActivePower,
                        function_id: branch_id.clone(),
                        variable_type,
                        variable_id: row_id.clone(),
                        is_variable_set,
                        contingency_context: context.clone(),
                    },
                });
            }
        }
    }
    Ok(())
}

fn emit_bus_voltage_factors(
    matrix: &MatrixInfo,
    contexts: &[ContingencyContext],
    network: &Network,
    factors: &mut Vec<AddressedFactor>,
) -> GexResult<()> {
    for (row, target_voltage_id) in matrix.row_ids.iter().enumerate() {
        for (column, bus_voltage_id) in matrix.column_ids.iter().enumerate() {
            if !network.has_target_voltage(bus_voltage_id) {
                return Err(GexError::UnresolvedFunction(bus_voltage_id.clone()));
            }
            let address = matrix.offset_data + row * matrix.column_count() + column;
            for context in contexts {
                factors.push(AddressedFactor {
                    address,
                    factor: SensitivityFactor {
                        function_type: SensitivityFunctionType::BusVoltage,
                        function_id: bus_voltage_id.clone(),
                        variable_type: SensitivityVariableType::BusTargetVoltage,
                        variable_id: target_voltage_id.clone(),
                        is_variable_set: false,
                        contingency_context: context.clone(),
                    },
                });
            }
        }
    }
    Ok(())
}
