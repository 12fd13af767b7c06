use product_prep::units::{
    AllowedUnits, Measurement, UnitParseError, UnitParser, default_correction_rules,
};

fn parser(units: &[&str]) -> UnitParser {
    UnitParser::with_allowed_units(
        AllowedUnits::new(units.iter().copied()),
        default_correction_rules(),
    )
}

fn measurement(value: f64, unit: &str) -> Option<Measurement> {
    Some(Measurement {
        value,
        unit: unit.to_string(),
    })
}

#[test]
fn parses_canonical_unit() {
    assert_eq!(parser(&["cm"]).parse(Some("10.5 cm")), Ok(measurement(10.5, "cm")));
}

#[test]
fn corrects_known_spellings_only_when_needed() {
    assert_eq!(parser(&["metre"]).parse(Some("5 meter")), Ok(measurement(5.0, "metre")));
    assert_eq!(parser(&["foot"]).parse(Some("3 feet")), Ok(measurement(3.0, "foot")));
    assert_eq!(
        parser(&["feet", "foot"]).parse(Some("3 feet")),
        Ok(measurement(3.0, "feet"))
    );
}

#[test]
fn empty_input_is_not_an_error() {
    let parser = parser(&["cm"]);
    assert_eq!(parser.parse(Some("")), Ok(None));
    assert_eq!(parser.parse(None), Ok(None));
}

#[test]
fn reports_format_and_unit_failures() {
    let parser = parser(&["cm", "metre"]);
    assert!(matches!(
        parser.parse(Some("abc")),
        Err(UnitParseError::InvalidFormat { .. })
    ));
    let err = parser.parse(Some("10 bogusunit")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("bogusunit"));
    assert!(message.contains("cm, metre"));
}

#[test]
fn default_table_checks_entity_families() {
    let parser = UnitParser::default();
    assert_eq!(
        parser.parse_for_entity("item_volume", Some("2 cubic feet")),
        Ok(measurement(2.0, "cubic foot"))
    );
    assert!(matches!(
        parser.parse_for_entity("width", Some("5 volt")),
        Err(UnitParseError::UnitNotAllowedForEntity { .. })
    ));
}
