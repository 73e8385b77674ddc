//! Value Validator
//!
//! A single data-driven validator for every scalar type of the catalog. The
//! checks for one descriptor run in a fixed order:
//!
//! 1. forced-permitted literals (anywhere on the base chain) accept immediately
//! 2. runtime kind against the accepted primitive kinds (`TypeMismatch`)
//! 3. the base descriptor, recursively
//! 4. union members, in declaration order, until one accepts
//! 5. enumeration, then pattern, on the whitespace-normalized lexical form
//! 6. numeric and length bounds, in declaration order
//!
//! The stored value is never rewritten; normalization only affects checking.

use std::borrow::Cow;

use crate::error::{ModelError, Violation};
use crate::models::value::Value;
use crate::schema::types::{Bound, TypeId, TypeTable};

/// Validate `value` against the descriptor `id`
///
/// `owner` names the element kind the value belongs to and is carried in
/// every error.
pub fn validate(types: &TypeTable, value: &Value, id: TypeId, owner: &str) -> Result<(), ModelError> {
    if is_forced_permitted(types, value, id) {
        return Ok(());
    }
    check(types, value, id, owner)
}

fn is_forced_permitted(types: &TypeTable, value: &Value, id: TypeId) -> bool {
    match value {
        Value::Text(text) => types
            .chain(id)
            .any(|d| d.forced_permitted.iter().any(|literal| literal == text)),
        _ => false,
    }
}

fn check(types: &TypeTable, value: &Value, id: TypeId, owner: &str) -> Result<(), ModelError> {
    let descriptor = types.get(id);

    if !descriptor.kinds.iter().any(|kind| value.is_instance_of(*kind)) {
        return Err(ModelError::TypeMismatch {
            element: owner.to_string(),
            value: value.to_string(),
            found: value.primitive(),
            expected: descriptor.kinds.clone(),
            permitted: permitted_literals(types, id),
        });
    }

    if let Some(base) = descriptor.base {
        check(types, value, base, owner)?;
    }

    if descriptor.is_union() {
        let mut errors = Vec::new();
        let accepted = descriptor.union.iter().any(|member| {
            match validate(types, value, *member, owner) {
                Ok(()) => true,
                Err(err) => {
                    errors.push(err.to_string());
                    false
                }
            }
        });
        if !accepted {
            return Err(ModelError::violation(
                owner,
                Violation::NoUnionMember {
                    value: value.to_string(),
                    errors,
                },
            ));
        }
    }

    check_facets(types, value, id, owner)
}

fn check_facets(types: &TypeTable, value: &Value, id: TypeId, owner: &str) -> Result<(), ModelError> {
    let descriptor = types.get(id);
    let lexical = value.to_string();
    let normalized: Cow<str> = match value {
        Value::Text(_) => types.effective_whitespace(id).apply(&lexical),
        _ => Cow::Borrowed(lexical.as_str()),
    };

    if !descriptor.enumeration.is_empty()
        && !descriptor.enumeration.iter().any(|e| e == normalized.as_ref())
    {
        return Err(ModelError::violation(
            owner,
            Violation::NotInEnumeration {
                value: lexical.clone(),
                permitted: descriptor.enumeration.clone(),
            },
        ));
    }

    if let Some(pattern) = &descriptor.pattern {
        if !pattern.is_full_match(&normalized) {
            return Err(ModelError::violation(
                owner,
                Violation::PatternMismatch {
                    value: lexical.clone(),
                    pattern: pattern.source().to_string(),
                },
            ));
        }
    }

    for bound in &descriptor.bounds {
        if !satisfies(*bound, value, &normalized) {
            return Err(ModelError::violation(
                owner,
                Violation::OutOfBounds {
                    value: lexical.clone(),
                    bound: *bound,
                },
            ));
        }
    }

    Ok(())
}

fn satisfies(bound: Bound, value: &Value, normalized: &str) -> bool {
    let number = value.as_f64();
    match bound {
        Bound::MinLength(n) => normalized.chars().count() >= n,
        Bound::MaxLength(n) => normalized.chars().count() <= n,
        Bound::MinExclusive(b) => number.map_or(true, |v| v > b),
        Bound::MinInclusive(b) => number.map_or(true, |v| v >= b),
        Bound::MaxInclusive(b) => number.map_or(true, |v| v <= b),
        Bound::MaxExclusive(b) => number.map_or(true, |v| v < b),
    }
}

/// Literals worth listing in a `TypeMismatch`
fn permitted_literals(types: &TypeTable, id: TypeId) -> Vec<String> {
    types
        .chain(id)
        .flat_map(|d| d.forced_permitted.iter().chain(d.enumeration.iter()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::Primitive;
    use crate::schema::Schema;

    fn check_named(type_name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let schema = Schema::musicxml().expect("catalog");
        let id = schema.type_id(type_name).expect("type exists");
        validate(schema.types(), &value.into(), id, "test")
    }

    #[test]
    fn test_every_enumerated_literal_is_accepted() {
        let schema = Schema::musicxml().unwrap();
        let step = schema.type_descriptor("step").unwrap();
        for literal in &step.enumeration {
            assert!(check_named("step", literal.as_str()).is_ok(), "{} rejected", literal);
        }

        let err = check_named("step", "H").unwrap_err();
        assert!(matches!(
            err.as_violation(),
            Some(Violation::NotInEnumeration { value, .. }) if value == "H"
        ));
    }

    #[test]
    fn test_kind_mismatch() {
        let err = check_named("octave", "four").unwrap_err();
        match err {
            ModelError::TypeMismatch { found, expected, .. } => {
                assert_eq!(found, Primitive::String);
                assert_eq!(expected, vec![Primitive::Integer]);
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
        assert!(matches!(check_named("octave", 4.5), Err(ModelError::TypeMismatch { .. })));
    }

    #[test]
    fn test_numeric_bounds() {
        assert!(check_named("octave", 0).is_ok());
        assert!(check_named("octave", 9).is_ok());
        let err = check_named("octave", 10).unwrap_err();
        assert!(matches!(
            err.as_violation(),
            Some(Violation::OutOfBounds { bound: Bound::MaxInclusive(_), .. })
        ));

        assert!(check_named("positive-divisions", 0.5).is_ok());
        assert!(check_named("positive-divisions", 0).is_err());
    }

    #[test]
    fn test_forced_permitted_empty_string() {
        assert!(check_named("positive-integer-or-empty", "").is_ok());
        assert!(check_named("positive-integer-or-empty", 3).is_ok());
        assert!(check_named("positive-integer-or-empty", 0).is_err());
        assert!(matches!(
            check_named("positive-integer-or-empty", "three"),
            Err(ModelError::TypeMismatch { ref permitted, .. }) if permitted == &vec![String::new()]
        ));
    }

    #[test]
    fn test_union_accepts_any_member() {
        assert!(check_named("font-size", 12).is_ok());
        assert!(check_named("font-size", 10.5).is_ok());
        assert!(check_named("font-size", "large").is_ok());

        let err = check_named("font-size", "huge").unwrap_err();
        match err.as_violation() {
            Some(Violation::NoUnionMember { errors, .. }) => assert_eq!(errors.len(), 2),
            other => panic!("expected NoUnionMember, got {:?}", other),
        }

        assert!(check_named("yes-no-number", "yes").is_ok());
        assert!(check_named("yes-no-number", 50).is_ok());
        assert!(check_named("yes-no-number", "maybe").is_err());
    }

    #[test]
    fn test_token_whitespace_is_collapsed_before_checks() {
        assert!(check_named("yes-no", "  yes ").is_ok());
        assert!(check_named("start-stop", "\tstop\n").is_ok());
        // minLength applies to the collapsed form
        assert!(check_named("measure-text", "1a").is_ok());
        assert!(matches!(
            check_named("measure-text", "   ").unwrap_err().as_violation(),
            Some(Violation::OutOfBounds { bound: Bound::MinLength(1), .. })
        ));
    }

    #[test]
    fn test_pattern_checks_base_first() {
        assert!(check_named("yyyy-mm-dd", "2024-02-29").is_ok());
        // month 13 fails the base date pattern
        assert!(matches!(
            check_named("yyyy-mm-dd", "2024-13-01").unwrap_err().as_violation(),
            Some(Violation::PatternMismatch { .. })
        ));
        // a valid date with a time zone fails only the derived pattern
        assert!(check_named("date", "2024-01-01Z").is_ok());
        assert!(check_named("yyyy-mm-dd", "2024-01-01Z").is_err());
    }

    #[test]
    fn test_ending_number_and_color_patterns() {
        assert!(check_named("ending-number", "1, 2").is_ok());
        assert!(check_named("ending-number", " ").is_ok());
        assert!(check_named("ending-number", "0").is_err());
        assert!(check_named("color", "#FF0000").is_ok());
        assert!(check_named("color", "#80FF0000").is_ok());
        assert!(check_named("color", "red").is_err());
    }
}
