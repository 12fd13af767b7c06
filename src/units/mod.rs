//! Parsing of `"<number> <unit>"` measurement strings into canonical units.

mod corrections;
mod parser;
mod table;

use std::fmt;

use thiserror::Error;

pub use corrections::{CorrectionRule, default_correction_rules};
pub use parser::UnitParser;
pub use table::{AllowedUnits, EntityUnitMap};

/// A parsed value paired with a canonical unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub unit: String,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Errors raised while parsing a measurement string.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitParseError {
    /// The input does not look like `<number> <unit words>`.
    #[error("Invalid format in {input:?}")]
    InvalidFormat { input: String },
    /// The unit is not canonical, even after spelling correction.
    #[error("Invalid unit [{unit}] found in {input:?}. Allowed units: {}", allowed.join(", "))]
    InvalidUnit {
        unit: String,
        input: String,
        allowed: Vec<String>,
    },
    /// The unit is canonical but not valid for the requested entity.
    #[error("Unit [{unit}] is not allowed for entity {entity:?}. Allowed units: {}", allowed.join(", "))]
    UnitNotAllowedForEntity {
        unit: String,
        entity: String,
        allowed: Vec<String>,
    },
    /// The entity has no unit table.
    #[error("Unknown entity {0:?}")]
    UnknownEntity(String),
}
