//! Sensitivity factor protocol types.
//!
//! A factor is a (function, variable) pair whose influence is requested from
//! the analysis engine, evaluated under one or more scenarios according to
//! its contingency context.

use serde::{Deserialize, Serialize};

/// The measured quantity of a factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensitivityFunctionType {
    BranchActivePower,
    BusVoltage,
}

/// The perturbed quantity of a factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensitivityVariableType {
    InjectionActivePower,
    TransformerPhase,
    BusTargetVoltage,
}

/// Which scenarios a factor is evaluated under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContingencyContext {
    /// Base case and every contingency.
    All,
    /// Base case only.
    None,
    /// The named contingency only.
    Specific(String),
}

/// One factor descriptor, as handed to the analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityFactor {
    pub function_type: SensitivityFunctionType,
    pub function_id: String,
    pub variable_type: SensitivityVariableType,
    pub variable_id: String,
    /// The variable id names a variable set rather than a single element.
    pub is_variable_set: bool,
    pub contingency_context: ContingencyContext,
}

/// A factor descriptor paired with its flat result address.
///
/// Factors emitted for the same (matrix, row, column) under different
/// contingency contexts share one address; the scenario index of the value
/// callback disambiguates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressedFactor {
    pub address: usize,
    pub factor: SensitivityFactor,
}

/// A hypothetical network event evaluated relative to the base case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contingency {
    pub id: String,
    /// Ids of the elements lost in this contingency.
    pub elements: Vec<String>,
}

impl Contingency {
    pub fn new(id: &str, elements: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            elements: elements.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// One weighted entry of a variable set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedVariable {
    pub id: String,
    pub weight: f64,
}

/// A named group of weighted variables usable as a single sensitivity
/// variable (e.g. a GLSK zone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSet {
    pub id: String,
    pub variables: Vec<WeightedVariable>,
}

impl VariableSet {
    pub fn new(id: &str, variables: Vec<WeightedVariable>) -> Self {
        Self {
            id: id.to_string(),
            variables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_serde_roundtrip() {
        let factor = SensitivityFactor {
            function_type: SensitivityFunctionType::BranchActivePower,
            function_id: "NHV1_NHV2_1".to_string(),
            variable_type: SensitivityVariableType::InjectionActivePower,
            variable_id: "GEN".to_string(),
            is_variable_set: false,
            contingency_context: ContingencyContext::Specific("C1".to_string()),
        };
        let json = serde_json::to_string(&factor).unwrap();
        let back: SensitivityFactor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, factor);
    }

    #[test]
    fn test_contingency_constructor() {
        let c = Contingency::new("C1", &["NHV1_NHV2_1", "NHV1_NHV2_2"]);
        assert_eq!(c.id, "C1");
        assert_eq!(c.elements.len(), 2);
    }
}
