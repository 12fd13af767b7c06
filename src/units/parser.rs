use std::sync::OnceLock;

use regex::Regex;

use super::{AllowedUnits, CorrectionRule, EntityUnitMap, Measurement, UnitParseError};

/// Textual missing-value marker produced by tabular exports.
const MISSING_MARKER: &str = "nan";

fn measurement_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^-?[0-9]+(\.[0-9]+)?\s+[a-zA-Z\s]+$").expect("measurement regex must compile")
    })
}

/// Parses measurement strings against a fixed unit table.
#[derive(Clone, Debug)]
pub struct UnitParser {
    entities: EntityUnitMap,
    allowed: AllowedUnits,
    corrections: Vec<CorrectionRule>,
}

impl Default for UnitParser {
    fn default() -> Self {
        Self::new(EntityUnitMap::default(), super::default_correction_rules())
    }
}

impl UnitParser {
    /// Build a parser whose allowed set is the union of `entities`.
    pub fn new(entities: EntityUnitMap, corrections: Vec<CorrectionRule>) -> Self {
        let allowed = entities.allowed_units();
        Self {
            entities,
            allowed,
            corrections,
        }
    }

    /// Build a parser over an explicit allowed set with no entity table.
    pub fn with_allowed_units(allowed: AllowedUnits, corrections: Vec<CorrectionRule>) -> Self {
        Self {
            entities: EntityUnitMap::new(Default::default()),
            allowed,
            corrections,
        }
    }

    /// Replace the accepted set while keeping the entity table.
    pub fn with_allowed_set(mut self, allowed: AllowedUnits) -> Self {
        self.allowed = allowed;
        self
    }

    pub fn allowed_units(&self) -> &AllowedUnits {
        &self.allowed
    }

    pub fn entities(&self) -> &EntityUnitMap {
        &self.entities
    }

    /// Parse `"<number> <unit words>"`.
    ///
    /// Missing, blank and `"nan"` inputs mean no measurement and return `Ok(None)`.
    pub fn parse(&self, input: Option<&str>) -> Result<Option<Measurement>, UnitParseError> {
        let raw = match input {
            None => return Ok(None),
            Some(value) if value == MISSING_MARKER => return Ok(None),
            Some(value) => value,
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if !measurement_pattern().is_match(trimmed) {
            return Err(UnitParseError::InvalidFormat {
                input: raw.to_string(),
            });
        }
        let (number, phrase) = trimmed
            .split_once(char::is_whitespace)
            .ok_or_else(|| UnitParseError::InvalidFormat {
                input: raw.to_string(),
            })?;
        let value = number
            .parse::<f64>()
            .map_err(|_| UnitParseError::InvalidFormat {
                input: raw.to_string(),
            })?;
        let phrase = phrase.trim_start();
        let unit = self
            .correct_unit(phrase)
            .ok_or_else(|| UnitParseError::InvalidUnit {
                unit: phrase.to_string(),
                input: raw.to_string(),
                allowed: self.allowed.to_vec(),
            })?;
        Ok(Some(Measurement { value, unit }))
    }

    /// Parse and additionally require the unit to belong to `entity`.
    pub fn parse_for_entity(
        &self,
        entity: &str,
        input: Option<&str>,
    ) -> Result<Option<Measurement>, UnitParseError> {
        let units = self
            .entities
            .units_for(entity)
            .ok_or_else(|| UnitParseError::UnknownEntity(entity.to_string()))?;
        let Some(measurement) = self.parse(input)? else {
            return Ok(None);
        };
        if !units.contains(&measurement.unit) {
            return Err(UnitParseError::UnitNotAllowedForEntity {
                unit: measurement.unit,
                entity: entity.to_string(),
                allowed: units.to_vec(),
            });
        }
        Ok(Some(measurement))
    }

    /// First of the phrase and its rule rewrites that is canonical.
    fn correct_unit(&self, phrase: &str) -> Option<String> {
        if self.allowed.contains(phrase) {
            return Some(phrase.to_string());
        }
        self.corrections
            .iter()
            .filter_map(|rule| rule.apply(phrase))
            .find(|candidate| self.allowed.contains(candidate))
    }
}
