//! # gex-core: shared element catalog and error types
//!
//! Provides the minimal network element catalog the GEX crates resolve
//! identifiers against, plus the unified [`GexError`] type.
//!
//! ## Design Philosophy
//!
//! Topology modeling, file import and numerical solving live outside this
//! workspace. The sensitivity bookkeeping only needs to answer identity
//! questions about a network: "is this id an injection, and of what kind?",
//! "is this transformer a phase shifter?", "does this branch exist?". The
//! [`Network`] catalog holds exactly those answers, keyed by the string ids
//! the external model uses, and nothing else.
//!
//! ## Quick Start
//!
//! ```rust
//! use gex_core::{InjectionKind, Network};
//!
//! let mut network = Network::new("sim1");
//! network.add_injection("GEN", InjectionKind::Generator);
//! network.add_branch("NHV1_NHV2_1");
//! network.add_two_windings_transformer("NGEN_NHV1", false);
//! network.add_target_voltage("VLHV1_0");
//!
//! assert_eq!(network.injection_kind("GEN"), Some(InjectionKind::Generator));
//! assert!(network.has_branch("NHV1_NHV2_1"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub mod error;

pub use error::{GexError, GexResult};

/// Kind of power injection an id resolves to.
///
/// Sensitivity variables referencing an injection are perturbed as active
/// power regardless of kind; the kind is kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjectionKind {
    Generator,
    Load,
    ConverterStation,
}

/// A two-winding transformer entry.
///
/// Only the phase-tap-changer flag matters here: a transformer without one
/// cannot serve as a phase sensitivity variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transformer {
    pub id: String,
    pub has_phase_tap_changer: bool,
}

/// Identity catalog of the network elements sensitivity analysis can
/// reference.
///
/// All lookups are by the external model's string ids. The catalog is
/// read-only once populated; concurrent reads are safe.
#[derive(Debug, Clone, Default)]
pub struct Network {
    name: String,
    working_variant_id: String,
    injections: HashMap<String, InjectionKind>,
    transformers: HashMap<String, Transformer>,
    branches: HashSet<String>,
    target_voltages: HashSet<String>,
}

impl Network {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            working_variant_id: "InitialState".to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variant the next analysis run operates on.
    pub fn working_variant_id(&self) -> &str {
        &self.working_variant_id
    }

    pub fn set_working_variant_id(&mut self, variant_id: &str) {
        self.working_variant_id = variant_id.to_string();
    }

    pub fn add_injection(&mut self, id: &str, kind: InjectionKind) {
        self.injections.insert(id.to_string(), kind);
    }

    pub fn add_two_windings_transformer(&mut self, id: &str, has_phase_tap_changer: bool) {
        self.transformers.insert(
            id.to_string(),
            Transformer {
                id: id.to_string(),
                has_phase_tap_changer,
            },
        );
    }

    pub fn add_branch(&mut self, id: &str) {
        self.branches.insert(id.to_string());
    }

    /// Register a bus id usable as a voltage sensitivity target.
    pub fn add_target_voltage(&mut self, id: &str) {
        self.target_voltages.insert(id.to_string());
    }

    /// Kind of injection behind `id`, if any.
    pub fn injection_kind(&self, id: &str) -> Option<InjectionKind> {
        self.injections.get(id).copied()
    }

    /// Two-winding transformer behind `id`, if any.
    pub fn transformer(&self, id: &str) -> Option<&Transformer> {
        self.transformers.get(id)
    }

    pub fn has_branch(&self, id: &str) -> bool {
        self.branches.contains(id)
    }

    pub fn has_target_voltage(&self, id: &str) -> bool {
        self.target_voltages.contains(id)
    }

    /// Number of catalogued elements, all kinds together.
    pub fn element_count(&self) -> usize {
        self.injections.len()
            + self.transformers.len()
            + self.branches.len()
            + self.target_voltages.len()
    }
}
