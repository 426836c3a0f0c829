//! Attribute filtering: which declared columns survive an emission.

use crate::series::SeriesMetadata;

/// Selects the columns a `create_dataframe` call emits.
///
/// Index columns always survive: a table without its index is unusable by
/// the consumer, whatever the requested selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeFilter {
    /// Every declared column.
    All,
    /// Only columns flagged as default attributes.
    Defaults,
    /// Exactly the named columns, plus index columns.
    Selection(Vec<String>),
}

impl AttributeFilter {
    /// Whether a column with this metadata survives the filter.
    pub fn keeps(&self, metadata: &SeriesMetadata) -> bool {
        if metadata.is_index() {
            return true;
        }
        match self {
            AttributeFilter::All => true,
            AttributeFilter::Defaults => metadata.is_default_attribute(),
            AttributeFilter::Selection(names) => names.iter().any(|n| n == metadata.name()),
        }
    }
}

impl Default for AttributeFilter {
    fn default() -> Self {
        AttributeFilter::Defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SeriesDataType;

    fn meta(name: &str, index: bool, default: bool) -> SeriesMetadata {
        SeriesMetadata::new(name, SeriesDataType::Double, index, default)
    }

    #[test]
    fn test_all_keeps_everything() {
        assert!(AttributeFilter::All.keeps(&meta("a", false, false)));
        assert!(AttributeFilter::All.keeps(&meta("id", true, false)));
    }

    #[test]
    fn test_defaults_keeps_flagged_and_index() {
        let f = AttributeFilter::Defaults;
        assert!(f.keeps(&meta("a", false, true)));
        assert!(!f.keeps(&meta("b", false, false)));
        assert!(f.keeps(&meta("id", true, false)));
    }

    #[test]
    fn test_selection_always_includes_index() {
        let f = AttributeFilter::Selection(vec!["str".to_string()]);
        assert!(f.keeps(&meta("str", false, false)));
        assert!(!f.keeps(&meta("int", false, true)));
        assert!(f.keeps(&meta("id", true, true)));
    }
}
