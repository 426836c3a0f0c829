//! Materialized columns and their metadata.
//!
//! A [`Series`] is one named, typed column of equal length with every other
//! column of the same table. [`SeriesMetadata`] is the exchange-contract
//! half: name, type, index flag and default-emission flag, everything a
//! downstream transport needs to marshal the column without inspecting
//! values.

use serde::{Deserialize, Serialize};

/// Semantic type of a series.
///
/// `Enum` columns carry 0-based ordinals over a declared enumeration and are
/// stored as ints on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesDataType {
    String,
    Double,
    Int,
    Boolean,
    Enum,
}

/// Descriptive half of a series: everything but the values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    name: String,
    data_type: SeriesDataType,
    index: bool,
    default_attribute: bool,
}

impl SeriesMetadata {
    pub fn new(name: &str, data_type: SeriesDataType, index: bool, default_attribute: bool) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            // Index columns are always emitted, so they are default by construction.
            default_attribute: default_attribute || index,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> SeriesDataType {
        self.data_type
    }

    pub fn is_index(&self) -> bool {
        self.index
    }

    pub fn is_default_attribute(&self) -> bool {
        self.default_attribute
    }
}

/// Homogeneous value payload of a series.
///
/// Enum ordinals are stored in the `Ints` variant; the metadata records that
/// the column is an enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeriesValues {
    Strings(Vec<String>),
    Doubles(Vec<f64>),
    Ints(Vec<i32>),
    Booleans(Vec<bool>),
}

impl SeriesValues {
    pub fn len(&self) -> usize {
        match self {
            SeriesValues::Strings(v) => v.len(),
            SeriesValues::Doubles(v) => v.len(),
            SeriesValues::Ints(v) => v.len(),
            SeriesValues::Booleans(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One materialized column: metadata plus values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    metadata: SeriesMetadata,
    values: SeriesValues,
}

impl Series {
    pub fn new(metadata: SeriesMetadata, values: SeriesValues) -> Self {
        debug_assert!(matches!(
            (metadata.data_type(), &values),
            (SeriesDataType::String, SeriesValues::Strings(_))
                | (SeriesDataType::Double, SeriesValues::Doubles(_))
                | (SeriesDataType::Int, SeriesValues::Ints(_))
                | (SeriesDataType::Enum, SeriesValues::Ints(_))
                | (SeriesDataType::Boolean, SeriesValues::Booleans(_))
        ));
        Self { metadata, values }
    }

    /// String column, optionally flagged index.
    pub fn strings(name: &str, index: bool, values: Vec<String>) -> Self {
        Self::new(
            SeriesMetadata::new(name, SeriesDataType::String, index, true),
            SeriesValues::Strings(values),
        )
    }

    pub fn doubles(name: &str, values: Vec<f64>) -> Self {
        Self::new(
            SeriesMetadata::new(name, SeriesDataType::Double, false, true),
            SeriesValues::Doubles(values),
        )
    }

    /// Int column, optionally flagged index.
    pub fn ints(name: &str, index: bool, values: Vec<i32>) -> Self {
        Self::new(
            SeriesMetadata::new(name, SeriesDataType::Int, index, true),
            SeriesValues::Ints(values),
        )
    }

    pub fn booleans(name: &str, values: Vec<bool>) -> Self {
        Self::new(
            SeriesMetadata::new(name, SeriesDataType::Boolean, false, true),
            SeriesValues::Booleans(values),
        )
    }

    /// Enum-ordinal column.
    pub fn enums(name: &str, ordinals: Vec<i32>) -> Self {
        Self::new(
            SeriesMetadata::new(name, SeriesDataType::Enum, false, true),
            SeriesValues::Ints(ordinals),
        )
    }

    pub fn metadata(&self) -> &SeriesMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn values(&self) -> &SeriesValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// String cell accessor; `None` when out of range or not a string column.
    pub fn string_value(&self, row: usize) -> Option<&str> {
        match &self.values {
            SeriesValues::Strings(v) => v.get(row).map(String::as_str),
            _ => None,
        }
    }

    pub fn double_value(&self, row: usize) -> Option<f64> {
        match &self.values {
            SeriesValues::Doubles(v) => v.get(row).copied(),
            _ => None,
        }
    }

    /// Int cell accessor; also serves enum-ordinal columns.
    pub fn int_value(&self, row: usize) -> Option<i32> {
        match &self.values {
            SeriesValues::Ints(v) => v.get(row).copied(),
            _ => None,
        }
    }

    pub fn boolean_value(&self, row: usize) -> Option<bool> {
        match &self.values {
            SeriesValues::Booleans(v) => v.get(row).copied(),
            _ => None,
        }
    }
}
