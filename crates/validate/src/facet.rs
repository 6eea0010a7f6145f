// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::cmp::Ordering;

use ldvalid_context::{Primitive, ResolvedDatatype};

/// A facet a literal does not satisfy.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("Value '{value}' is not a valid lexical form of {datatype}")]
    Lexical { value: String, datatype: String },

    #[error("Value '{value}' does not match pattern '{pattern}'")]
    Pattern { value: String, pattern: String },

    #[error("Expected length={expected}, but found length={found}")]
    Length { expected: u64, found: u64 },

    #[error("Expected minLength={expected}, but found length={found}")]
    MinLength { expected: u64, found: u64 },

    #[error("Expected maxLength={expected}, but found length={found}")]
    MaxLength { expected: u64, found: u64 },

    #[error("Expected {facet}={bound}, but found {value}")]
    Bound {
        facet: &'static str,
        bound: String,
        value: String,
    },

    #[error("Expected totalDigits={expected}, but found totalDigits={found}")]
    TotalDigits { expected: u32, found: u32 },

    #[error("Expected fractionDigits={expected}, but found fractionDigits={found}")]
    FractionDigits { expected: u32, found: u32 },
}

/// Compares two values of the given primitive type;
/// `None` if they are not comparable.
fn compare(primitive: Primitive, value: &str, bound: &str) -> Option<Ordering> {
    if primitive == Primitive::Decimal {
        let value = Primitive::decimal_value(value)?;
        let bound = Primitive::decimal_value(bound)?;
        Some(value.cmp(&bound))
    } else if primitive.is_numeric() {
        let value = Primitive::numeric_value(value)?;
        let bound = Primitive::numeric_value(bound)?;
        value.partial_cmp(&bound)
    } else if primitive.is_temporal() {
        let value = primitive.temporal_value(value)?;
        let bound = primitive.temporal_value(bound)?;
        Some(value.cmp(&bound))
    } else {
        None
    }
}

/// Counts the significant digits before and after the decimal point.
fn digits(value: &str) -> (u32, u32) {
    let unsigned = value.trim_start_matches(['+', '-']);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let integer = integer.trim_start_matches('0');
    let fraction = fraction.trim_end_matches('0');
    let count = |digits: &str| u32::try_from(digits.len()).unwrap_or(u32::MAX);
    (count(integer), count(fraction))
}

fn length(value: &str) -> u64 {
    u64::try_from(value.chars().count()).unwrap_or(u64::MAX)
}

/// Checks `value` against all facets of `datatype`,
/// stopping at the first one that is violated.
///
/// Whitespace normalization is applied first;
/// the lexical form is checked against the primitive type next,
/// then pattern, length and bounds facets.
///
/// # Errors
///
/// The first facet violated.
pub fn check(value: &str, datatype: &ResolvedDatatype) -> Result<(), Violation> {
    let normalized = datatype.whitespace().apply(value);
    let value = normalized.as_ref();
    let facets = &datatype.facets;
    let primitive = datatype.primitive;

    if !primitive.is_valid_lexical(value) {
        return Err(Violation::Lexical {
            value: value.to_owned(),
            datatype: datatype.uri.clone(),
        });
    }

    if let Some(pattern) = &facets.pattern {
        if !pattern.is_match(value) {
            return Err(Violation::Pattern {
                value: value.to_owned(),
                pattern: pattern.as_str().to_owned(),
            });
        }
    }

    let found = length(value);
    if let Some(expected) = facets.length {
        if found != expected {
            return Err(Violation::Length { expected, found });
        }
    }
    if let Some(expected) = facets.min_length {
        if found < expected {
            return Err(Violation::MinLength { expected, found });
        }
    }
    if let Some(expected) = facets.max_length {
        if found > expected {
            return Err(Violation::MaxLength { expected, found });
        }
    }

    let bounds: [(&'static str, &Option<String>, fn(Ordering) -> bool); 4] = [
        ("maxInclusive", &facets.max_inclusive, |ord| ord != Ordering::Greater),
        ("minInclusive", &facets.min_inclusive, |ord| ord != Ordering::Less),
        ("maxExclusive", &facets.max_exclusive, |ord| ord == Ordering::Less),
        ("minExclusive", &facets.min_exclusive, |ord| ord == Ordering::Greater),
    ];
    for (facet, bound, satisfied) in bounds {
        let Some(bound) = bound else {
            continue;
        };
        match compare(primitive, value, bound) {
            Some(ordering) if !satisfied(ordering) => {
                return Err(Violation::Bound {
                    facet,
                    bound: bound.clone(),
                    value: value.to_owned(),
                });
            }
            Some(_) => {}
            None => tracing::debug!("Can not compare '{value}' to {facet}={bound}; skipping"),
        }
    }

    if primitive == Primitive::Decimal {
        let (integer, fraction) = digits(value);
        if let Some(expected) = facets.total_digits {
            let found = (integer + fraction).max(1);
            if found > expected {
                return Err(Violation::TotalDigits { expected, found });
            }
        }
        if let Some(expected) = facets.fraction_digits {
            if fraction > expected {
                return Err(Violation::FractionDigits {
                    expected,
                    found: fraction,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldvalid_context::{Context, ContextBuilder, Datatype, Facets, Pattern, Term};
    use ldvalid_vocab::xsd;

    fn resolve(ctx: &Context, uri: &str) -> ResolvedDatatype {
        ctx.resolve_datatype(uri).unwrap()
    }

    fn builtin(uri: &str) -> ResolvedDatatype {
        resolve(&ContextBuilder::new().build(), uri)
    }

    fn custom(base: &str, facets: Facets) -> ResolvedDatatype {
        let uri = "http://example.org/ns#Custom";
        let mut builder = ContextBuilder::new();
        builder.add_term(
            Term::new("Custom", uri).with_datatype(Datatype::new(uri).with_base(base).with_facets(facets)),
        );
        resolve(&builder.build(), uri)
    }

    #[test]
    fn max_length_after_whitespace_replacement() {
        let guid = custom(
            xsd::NORMALIZED_STRING.as_str(),
            Facets {
                max_length: Some(64),
                ..Facets::default()
            },
        );
        assert_eq!(check(&"a".repeat(64), &guid), Ok(()));
        assert_eq!(
            check(&"a".repeat(70), &guid),
            Err(Violation::MaxLength {
                expected: 64,
                found: 70
            })
        );
        let message = check(&"a".repeat(70), &guid).unwrap_err().to_string();
        assert!(message.contains("maxLength=64"));
        assert!(message.contains("length=70"));
    }

    #[test]
    fn collapse_applies_before_length() {
        let token = custom(
            xsd::TOKEN.as_str(),
            Facets {
                length: Some(3),
                ..Facets::default()
            },
        );
        assert_eq!(check("  a  b ", &token), Ok(()));
        assert!(matches!(check("abcd", &token), Err(Violation::Length { .. })));
    }

    #[test]
    fn patterns() {
        let code = custom(
            xsd::STRING.as_str(),
            Facets {
                pattern: Some(Pattern::new("[A-Z]{3}").unwrap()),
                min_length: Some(3),
                ..Facets::default()
            },
        );
        assert_eq!(check("ABC", &code), Ok(()));
        assert!(matches!(check("ABCD", &code), Err(Violation::Pattern { .. })));
        assert!(matches!(check("AB", &code), Err(Violation::Pattern { .. })));
    }

    #[test]
    fn integer_ranges() {
        let byte = builtin(xsd::BYTE.as_str());
        assert_eq!(check("127", &byte), Ok(()));
        assert_eq!(check(" -128 ", &byte), Ok(()));
        assert!(matches!(
            check("128", &byte),
            Err(Violation::Bound { facet: "maxInclusive", .. })
        ));
        assert!(matches!(check("1.5", &byte), Err(Violation::Pattern { .. })));
        assert!(matches!(check("abc", &byte), Err(Violation::Lexical { .. })));
        let positive = builtin(xsd::POSITIVE_INTEGER.as_str());
        assert!(matches!(
            check("0", &positive),
            Err(Violation::Bound { facet: "minInclusive", .. })
        ));
    }

    #[test]
    fn exclusive_bounds_and_digits() {
        let percent = custom(
            xsd::DECIMAL.as_str(),
            Facets {
                min_exclusive: Some("0".to_owned()),
                max_exclusive: Some("100".to_owned()),
                total_digits: Some(4),
                fraction_digits: Some(2),
                ..Facets::default()
            },
        );
        assert_eq!(check("99.99", &percent), Ok(()));
        assert!(matches!(check("0", &percent), Err(Violation::Bound { facet: "minExclusive", .. })));
        assert!(matches!(check("100", &percent), Err(Violation::Bound { facet: "maxExclusive", .. })));
        assert!(matches!(
            check("9.999", &percent),
            Err(Violation::FractionDigits { expected: 2, found: 3 })
        ));
        assert_eq!(check("050.500", &percent), Ok(()));
    }

    #[test]
    fn sixty_four_bit_bounds_are_exact() {
        let long = builtin(xsd::LONG.as_str());
        assert_eq!(check("9223372036854775807", &long), Ok(()));
        assert_eq!(check("-9223372036854775808", &long), Ok(()));
        assert!(matches!(
            check("9223372036854775808", &long),
            Err(Violation::Bound { facet: "maxInclusive", .. })
        ));
        assert!(matches!(
            check("-9223372036854775809", &long),
            Err(Violation::Bound { facet: "minInclusive", .. })
        ));
        let unsigned_long = builtin(xsd::UNSIGNED_LONG.as_str());
        assert_eq!(check("18446744073709551615", &unsigned_long), Ok(()));
        assert!(matches!(
            check("18446744073709551616", &unsigned_long),
            Err(Violation::Bound { facet: "maxInclusive", .. })
        ));
    }

    #[test]
    fn impossible_dates_and_times_are_lexical_errors() {
        let date = builtin(xsd::DATE.as_str());
        assert!(matches!(check("2023-02-30", &date), Err(Violation::Lexical { .. })));
        assert!(matches!(check("2024-13-45", &date), Err(Violation::Lexical { .. })));
        let date_time = builtin(xsd::DATE_TIME.as_str());
        assert!(matches!(
            check("2024-01-01T99:99:99Z", &date_time),
            Err(Violation::Lexical { .. })
        ));
        assert_eq!(check("2024-02-29T23:59:59Z", &date_time), Ok(()));
    }

    #[test]
    fn date_times_compare_across_timezones() {
        let before_noon = custom(
            xsd::DATE_TIME.as_str(),
            Facets {
                max_inclusive: Some("2024-01-01T12:00:00Z".to_owned()),
                ..Facets::default()
            },
        );
        // 15:00 UTC
        assert!(matches!(
            check("2024-01-01T10:00:00-05:00", &before_noon),
            Err(Violation::Bound { facet: "maxInclusive", .. })
        ));
        // 11:00 UTC
        assert_eq!(check("2024-01-01T13:00:00+02:00", &before_noon), Ok(()));
        assert_eq!(check("2024-01-01T12:00:00", &before_noon), Ok(()));
    }

    #[test]
    fn dates_compare_chronologically() {
        let recent = custom(
            xsd::DATE.as_str(),
            Facets {
                min_inclusive: Some("2000-01-01".to_owned()),
                ..Facets::default()
            },
        );
        assert_eq!(check("2024-05-01", &recent), Ok(()));
        assert!(matches!(check("1999-12-31", &recent), Err(Violation::Bound { .. })));
        assert!(matches!(check("2024-5-1", &recent), Err(Violation::Lexical { .. })));
    }

    #[test]
    fn booleans() {
        let boolean = builtin(xsd::BOOLEAN.as_str());
        assert_eq!(check("true", &boolean), Ok(()));
        assert!(check("yes", &boolean).is_err());
    }
}
