//! # gex-sensitivity: multi-matrix sensitivity bookkeeping
//!
//! Runs several logically distinct sensitivity matrices (row ids x column
//! ids, each tied to a function type and a contingency scope) inside one
//! physical engine invocation, and routes the engine's flat results back to
//! the correct matrix, row, column and scenario.
//!
//! ## How a run works
//!
//! 1. Declare matrices, contingencies and variable sets on a
//!    [`SensitivityAnalysisContext`].
//! 2. `run()` finalizes the registration into a [`FactorPlan`]: offsets are
//!    assigned as prefix sums in fixed category order (branch-flow, then
//!    pre-contingency, then post-contingency, then bus-voltage).
//! 3. Factors are resolved against the network catalog and emitted in
//!    row-major order; any unresolvable id aborts before the engine starts.
//! 4. The engine pushes values into a [`ValueSink`]; a floor lookup over
//!    data offsets routes each address to its owning matrix.
//! 5. [`SensitivityAnalysisResult::matrix`] slices the flat buffers back
//!    into per-matrix, per-scenario 2D views.
//!
//! The crate performs no numerical computation; solving lives behind the
//! [`SensitivityEngine`] trait.

pub mod engine;
pub mod factors;
pub mod matrix;
pub mod results;

pub use engine::{EngineRegistry, SensitivityEngine, SensitivityParameters};
pub use factors::{
    AddressedFactor, Contingency, ContingencyContext, SensitivityFactor, SensitivityFunctionType,
    SensitivityVariableType, VariableSet, WeightedVariable,
};
pub use matrix::{ContingencyScope, FactorPlan, MatrixInfo, SensitivityAnalysisContext};
pub use results::{FactorLocation, FactorRouter, MatrixView, SensitivityAnalysisResult, ValueSink};
