use musicxml_model::{DocumentNode, ModelError, Schema, Value, Violation};

fn element(name: &str) -> DocumentNode<'static> {
    Schema::musicxml()
        .expect("built-in catalog should resolve")
        .element(name)
        .expect("element kind should exist")
}

fn violation(err: ModelError) -> Violation {
    match err {
        ModelError::SchemaViolation { violation, .. } => violation,
        other => panic!("expected a schema violation, got {:?}", other),
    }
}

#[test]
fn test_enumeration() {
    let mut step = element("step");
    let err = step.set_value("H").unwrap_err();
    match violation(err) {
        Violation::NotInEnumeration { value, permitted } => {
            assert_eq!(value, "H");
            assert_eq!(permitted, vec!["A", "B", "C", "D", "E", "F", "G"]);
        }
        other => panic!("unexpected violation {:?}", other),
    }
    assert!(step.value().is_none(), "a rejected value is not stored");
}

#[test]
fn test_type_mismatch_names_expected_kind() {
    let mut octave = element("octave");
    match octave.set_value("four").unwrap_err() {
        ModelError::TypeMismatch {
            element, value, ..
        } => {
            assert_eq!(element, "octave");
            assert_eq!(value, "four");
        }
        other => panic!("expected a type mismatch, got {:?}", other),
    }
    assert!(octave.set_value(4.5).is_err(), "decimal is not an integer");
}

#[test]
fn test_numeric_bounds() {
    let mut octave = element("octave");
    assert!(matches!(
        violation(octave.set_value(10).unwrap_err()),
        Violation::OutOfBounds { .. }
    ));
    octave.set_value(9).unwrap();

    let mut duration = element("duration");
    assert!(duration.set_value(0).is_err(), "positive divisions exclude zero");
    duration.set_value(0.5).unwrap();
    duration.set_value(3).unwrap();
}

#[test]
fn test_forced_permitted_empty_string() {
    let mut ensemble = element("ensemble");
    ensemble.set_value("").unwrap();
    ensemble.set_value(4).unwrap();
    assert!(ensemble.set_value(0).is_err());
    assert!(ensemble.set_value("x").is_err());
}

#[test]
fn test_non_finite_decimals_are_rejected() {
    let mut duration = element("duration");
    assert!(matches!(
        duration.set_value(f64::INFINITY),
        Err(ModelError::TypeMismatch { .. })
    ));
    assert!(duration.value().is_none());

    let mut alter = element("alter");
    assert!(matches!(
        alter.set_value(f64::NAN),
        Err(ModelError::TypeMismatch { .. })
    ));
    alter.set_value(-0.5).unwrap();
    assert_eq!(alter.to_xml().unwrap(), "<alter>-0.5</alter>\n");
}

#[test]
fn test_union_of_number_and_keyword() {
    let mut part_name = element("part-name");
    part_name.set_attribute("font-size", 12.5).unwrap();
    part_name.set_attribute("font-size", "x-large").unwrap();

    match violation(part_name.set_attribute("font-size", "huge").unwrap_err()) {
        Violation::NoUnionMember { value, errors } => {
            assert_eq!(value, "huge");
            assert_eq!(errors.len(), 2);
            for error in &errors {
                assert!(error.starts_with("part-name: "), "member error {:?}", error);
            }
        }
        other => panic!("unexpected violation {:?}", other),
    }
    assert_eq!(part_name.attribute("font-size"), Some(&Value::from("x-large")));
}

#[test]
fn test_pattern() {
    let mut ending = element("ending")
        .with_attribute("type", "start")
        .unwrap();
    ending.set_attribute("number", "1, 2").unwrap();
    ending.set_attribute("number", "").unwrap();
    assert!(matches!(
        violation(ending.set_attribute("number", "0").unwrap_err()),
        Violation::PatternMismatch { .. }
    ));

    let mut note = element("note");
    note.set_attribute("color", "#FF0000").unwrap();
    assert!(note.set_attribute("color", "red").is_err());
}

#[test]
fn test_length_bound_after_whitespace_collapse() {
    let mut measure = element("measure");
    measure.set_attribute("text", "  1a ").unwrap();
    assert!(matches!(
        violation(measure.set_attribute("text", "").unwrap_err()),
        Violation::OutOfBounds { .. }
    ));
}

#[test]
fn test_value_not_allowed_on_composite_element() {
    let mut pitch = element("pitch");
    assert!(matches!(
        violation(pitch.set_value("C4").unwrap_err()),
        Violation::ValueNotAllowed { .. }
    ));
}

#[test]
fn test_unknown_attribute() {
    let mut note = element("note");
    match violation(note.set_attribute("pitch", "C").unwrap_err()) {
        Violation::UnknownAttribute {
            name,
            allowed_attributes,
            allowed_children,
        } => {
            assert_eq!(name, "pitch");
            assert!(allowed_attributes.contains(&"dynamics".to_string()));
            assert!(allowed_children.contains(&"pitch".to_string()));
        }
        other => panic!("unexpected violation {:?}", other),
    }
}

#[test]
fn test_date_attribute_checks_base_pattern_too() {
    let mut encoding_date = element("encoding-date");
    encoding_date.set_value("2024-02-29").unwrap();
    assert!(encoding_date.set_value("2024-13-01").is_err());
    assert!(encoding_date.set_value("24-01-01").is_err());
}
