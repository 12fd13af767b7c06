use std::collections::{BTreeMap, BTreeSet};

const LENGTH_UNITS: &[&str] = &["centimetre", "foot", "inch", "metre", "millimetre", "yard"];
const WEIGHT_UNITS: &[&str] = &[
    "gram",
    "kilogram",
    "microgram",
    "milligram",
    "ounce",
    "pound",
    "ton",
];
const VOLTAGE_UNITS: &[&str] = &["kilovolt", "millivolt", "volt"];
const WATTAGE_UNITS: &[&str] = &["kilowatt", "watt"];
const VOLUME_UNITS: &[&str] = &[
    "centilitre",
    "cubic foot",
    "cubic inch",
    "cup",
    "decilitre",
    "fluid ounce",
    "gallon",
    "imperial gallon",
    "litre",
    "microlitre",
    "millilitre",
    "pint",
    "quart",
];

/// The set of canonical unit strings a parser accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowedUnits(BTreeSet<String>);

impl AllowedUnits {
    pub fn new<I, S>(units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(units.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.0.contains(unit)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Units in sorted order.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Canonical units allowed for each entity name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityUnitMap(BTreeMap<String, AllowedUnits>);

impl EntityUnitMap {
    pub fn new(entries: BTreeMap<String, AllowedUnits>) -> Self {
        Self(entries)
    }

    pub fn units_for(&self, entity: &str) -> Option<&AllowedUnits> {
        self.0.get(entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Union of every entity's units.
    pub fn allowed_units(&self) -> AllowedUnits {
        AllowedUnits::new(self.0.values().flat_map(|units| units.iter().map(str::to_string)))
    }
}

impl Default for EntityUnitMap {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        for (entity, units) in [
            ("width", LENGTH_UNITS),
            ("depth", LENGTH_UNITS),
            ("height", LENGTH_UNITS),
            ("item_weight", WEIGHT_UNITS),
            ("maximum_weight_recommendation", WEIGHT_UNITS),
            ("voltage", VOLTAGE_UNITS),
            ("wattage", WATTAGE_UNITS),
            ("item_volume", VOLUME_UNITS),
        ] {
            entries.insert(entity.to_string(), AllowedUnits::new(units.iter().copied()));
        }
        Self(entries)
    }
}
