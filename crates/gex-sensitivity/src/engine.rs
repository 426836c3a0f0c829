//! Analysis-engine collaborator contract and the per-call engine registry.
//!
//! The registry performs no numerical computation; the engine behind a name
//! is handed the emitted factor stream and must invoke the value sink
//! exactly once per factor per applicable scenario.

use crate::factors::{AddressedFactor, Contingency, VariableSet};
use crate::results::ValueSink;
use anyhow::Result;
use gex_core::{GexError, GexResult, Network};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Parameters forwarded to the analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityParameters {
    /// Sensitivity values below this magnitude may be reported as zero.
    pub epsilon: f64,
    /// Whether the engine distributes slack over participating units.
    pub distributed_slack: bool,
}

impl Default for SensitivityParameters {
    fn default() -> Self {
        Self {
            epsilon: 1e-8,
            distributed_slack: true,
        }
    }
}

impl SensitivityParameters {
    /// Load parameters from a JSON document. Missing fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> GexResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| GexError::Validation(format!("Invalid parameters: {e}")))
    }
}

/// Contract an external sensitivity engine implements.
///
/// The engine may execute anywhere it likes, but factor consumption and
/// value delivery are synchronous: every sink call happens before `run`
/// returns, and a run either completes fully or fails.
pub trait SensitivityEngine: Send + Sync {
    /// The engine name used for registry lookup.
    fn name(&self) -> &'static str;

    /// Solve for all factors and push one value per factor per applicable
    /// scenario (base case plus each contingency unless the factor's
    /// context excludes it).
    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        network: &Network,
        working_variant_id: &str,
        factors: &[AddressedFactor],
        sink: &mut dyn ValueSink,
        contingencies: &[Contingency],
        variable_sets: &[VariableSet],
        parameters: &SensitivityParameters,
    ) -> Result<()>;
}

impl std::fmt::Debug for dyn SensitivityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitivityEngine")
            .field("name", &self.name())
            .finish()
    }
}

/// Name-to-implementation registry, resolved once per call.
#[derive(Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Arc<dyn SensitivityEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, engine: Arc<dyn SensitivityEngine>) {
        self.engines.insert(engine.name().to_string(), engine);
    }

    pub fn find(&self, name: &str) -> GexResult<Arc<dyn SensitivityEngine>> {
        self.engines.get(name).cloned().ok_or_else(|| {
            let mut known: Vec<&str> = self.engines.keys().map(String::as_str).collect();
            known.sort_unstable();
            GexError::Validation(format!(
                "No sensitivity engine named '{name}' (known: {})",
                known.join(", ")
            ))
        })
    }
}
