// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use ldvalid_vocab::xsd;
use once_cell::sync::Lazy;
use oxrdf::NamedNodeRef;
use regex::Regex;

use crate::context::Context;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unsupported datatype '{uri}': no built-in primitive type found in its base chain")]
    Unsupported { uri: String },

    #[error("The base chain of datatype '{uri}' is cyclic")]
    Cyclic { uri: String },
}

/// XSD whitespace normalization policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Whitespace {
    Preserve,
    Replace,
    Collapse,
}

impl Whitespace {
    /// Normalizes `value` according to this policy.
    #[must_use]
    pub fn apply(self, value: &str) -> Cow<'_, str> {
        match self {
            Self::Preserve => Cow::Borrowed(value),
            Self::Replace => {
                if value.contains(['\t', '\n', '\r']) {
                    Cow::Owned(value.replace(['\t', '\n', '\r'], " "))
                } else {
                    Cow::Borrowed(value)
                }
            }
            Self::Collapse => {
                let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
                if collapsed == value {
                    Cow::Borrowed(value)
                } else {
                    Cow::Owned(collapsed)
                }
            }
        }
    }
}

impl FromStr for Whitespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preserve" => Ok(Self::Preserve),
            "replace" => Ok(Self::Replace),
            "collapse" => Ok(Self::Collapse),
            other => Err(format!(
                "unknown whitespace policy '{other}'; expected one of: preserve, replace, collapse"
            )),
        }
    }
}

impl Display for Whitespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Preserve => "preserve",
            Self::Replace => "replace",
            Self::Collapse => "collapse",
        };
        f.write_str(name)
    }
}

/// The built-in primitive types every datatype chain has to end in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Boolean,
    Decimal,
    Float,
    Double,
    DateTime,
    Date,
    Time,
    Duration,
    GYear,
    AnyUri,
    HexBinary,
    Base64Binary,
}

static RE_BOOLEAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(true|false|1|0)$").unwrap());
static RE_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+\-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)$").unwrap());
static RE_FLOATING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+\-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+\-]?[0-9]+)?|[+\-]?INF|NaN)$").unwrap()
});
static RE_DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?[0-9]{4,}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?(Z|[+\-][0-9]{2}:[0-9]{2})?$").unwrap()
});
static RE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?[0-9]{4,}-[0-9]{2}-[0-9]{2}(Z|[+\-][0-9]{2}:[0-9]{2})?$").unwrap()
});
static RE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?(Z|[+\-][0-9]{2}:[0-9]{2})?$").unwrap()
});
static RE_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P([0-9]+Y)?([0-9]+M)?([0-9]+D)?(T([0-9]+H)?([0-9]+M)?([0-9]+(\.[0-9]+)?S)?)?$")
        .unwrap()
});
static RE_G_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]{4,}(Z|[+\-][0-9]{2}:[0-9]{2})?$").unwrap());
static RE_HEX_BINARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9a-fA-F]{2})*$").unwrap());
static RE_BASE64_BINARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9+/] ?)*(=( ?=)?)?$").unwrap());

/// Splits a trailing time-zone designator (`Z` or `[+-]HH:MM`) off a temporal value.
/// No designator means UTC.
fn split_timezone(value: &str) -> Option<(&str, FixedOffset)> {
    if let Some(local) = value.strip_suffix('Z') {
        return Some((local, FixedOffset::east_opt(0)?));
    }
    let Some(at) = value.len().checked_sub(6) else {
        return Some((value, FixedOffset::east_opt(0)?));
    };
    let zone = value.get(at..)?;
    if !zone.starts_with(['+', '-']) || zone.get(3..4) != Some(":") {
        return Some((value, FixedOffset::east_opt(0)?));
    }
    let hours: i32 = zone.get(1..3)?.parse().ok()?;
    let minutes: i32 = zone.get(4..6)?.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    let seconds = (hours * 60 + minutes) * 60;
    let offset = if zone.starts_with('-') {
        FixedOffset::west_opt(seconds)?
    } else {
        FixedOffset::east_opt(seconds)?
    };
    Some((value.get(..at)?, offset))
}

impl Primitive {
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Decimal | Self::Float | Self::Double)
    }

    /// Whether values are points in time,
    /// compared after normalizing to UTC.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::DateTime | Self::Date | Self::Time | Self::GYear)
    }

    /// Checks the (whitespace normalized) lexical form.
    #[must_use]
    pub fn is_valid_lexical(self, value: &str) -> bool {
        match self {
            Self::String | Self::AnyUri => true,
            Self::Boolean => RE_BOOLEAN.is_match(value),
            Self::Decimal => RE_DECIMAL.is_match(value),
            Self::Float | Self::Double => RE_FLOATING.is_match(value),
            Self::DateTime => RE_DATE_TIME.is_match(value) && self.temporal_value(value).is_some(),
            Self::Date => RE_DATE.is_match(value) && self.temporal_value(value).is_some(),
            Self::Time => RE_TIME.is_match(value) && self.temporal_value(value).is_some(),
            Self::Duration => {
                RE_DURATION.is_match(value) && !value.ends_with(['P', 'T'])
            }
            Self::GYear => RE_G_YEAR.is_match(value) && self.temporal_value(value).is_some(),
            Self::HexBinary => RE_HEX_BINARY.is_match(value),
            Self::Base64Binary => RE_BASE64_BINARY.is_match(value),
        }
    }

    /// Parses a floating point lexical form.
    #[must_use]
    pub fn numeric_value(value: &str) -> Option<f64> {
        match value {
            "INF" | "+INF" => Some(f64::INFINITY),
            "-INF" => Some(f64::NEG_INFINITY),
            "NaN" => Some(f64::NAN),
            other => other.parse().ok(),
        }
    }

    /// Parses a decimal (or integer) lexical form without loss of precision.
    #[must_use]
    pub fn decimal_value(value: &str) -> Option<BigDecimal> {
        let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
        let mut normalized = String::with_capacity(value.len() + 2);
        if value.starts_with('-') {
            normalized.push('-');
        }
        if unsigned.starts_with('.') {
            normalized.push('0');
        }
        normalized.push_str(unsigned);
        if unsigned.ends_with('.') {
            normalized.push('0');
        }
        BigDecimal::from_str(&normalized).ok()
    }

    /// Parses a temporal lexical form into a point on the UTC time line.
    /// Times are placed on the reference day 1972-12-31,
    /// years on their first of January.
    ///
    /// `None` for invalid calendar dates and clock times,
    /// and for non-temporal types.
    #[must_use]
    pub fn temporal_value(self, value: &str) -> Option<NaiveDateTime> {
        let (local, offset) = split_timezone(value)?;
        let naive = match self {
            Self::DateTime => NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S%.f").ok()?,
            Self::Date => NaiveDate::parse_from_str(local, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)?,
            Self::Time => NaiveDate::from_ymd_opt(1972, 12, 31)?
                .and_time(NaiveTime::parse_from_str(local, "%H:%M:%S%.f").ok()?),
            Self::GYear => NaiveDate::from_ymd_opt(local.parse().ok()?, 1, 1)?.and_hms_opt(0, 0, 0)?,
            Self::String
            | Self::Boolean
            | Self::Decimal
            | Self::Float
            | Self::Double
            | Self::Duration
            | Self::AnyUri
            | Self::HexBinary
            | Self::Base64Binary => return None,
        };
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|at| at.naive_utc())
    }
}

/// A regular expression facet, matched against the whole value.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles an XSD style pattern;
    /// these are implicitly anchored at both ends.
    ///
    /// # Errors
    ///
    /// If the pattern is not a valid regular expression.
    pub fn new<S: Into<String>>(source: S) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self { source, regex })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

/// Constraints on the lexical form of a literal.
/// Bounds are kept in their lexical form;
/// how they are compared depends on the primitive type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Facets {
    pub length: Option<u64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,
    pub whitespace: Option<Whitespace>,
    pub max_inclusive: Option<String>,
    pub min_inclusive: Option<String>,
    pub max_exclusive: Option<String>,
    pub min_exclusive: Option<String>,
    pub total_digits: Option<u32>,
    pub fraction_digits: Option<u32>,
}

macro_rules! inherit {
    ($target:ident, $base:ident, $($field:ident),+) => {
        $(
            if $target.$field.is_none() {
                $target.$field.clone_from(&$base.$field);
            }
        )+
    };
}

impl Facets {
    /// Fills every facet we do not define ourselves from `base`.
    pub fn inherit_from(&mut self, base: &Self) {
        inherit!(
            self,
            base,
            length,
            min_length,
            max_length,
            pattern,
            whitespace,
            max_inclusive,
            min_inclusive,
            max_exclusive,
            min_exclusive,
            total_digits,
            fraction_digits
        );
    }
}

/// A simple type: either one of the built-in XSD types,
/// or a custom one, restricting a base type by facets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datatype {
    uri: String,
    local_name: String,
    namespace: String,
    base: Option<String>,
    facets: Facets,
    primitive: Option<Primitive>,
}

impl Datatype {
    #[must_use]
    pub fn new<U: Into<String>>(uri: U) -> Self {
        let uri = uri.into();
        Self {
            local_name: ldvalid_iri::local_name(&uri).to_owned(),
            namespace: ldvalid_iri::namespace_of(&uri).to_owned(),
            uri,
            base: None,
            facets: Facets::default(),
            primitive: None,
        }
    }

    #[must_use]
    pub fn with_base<B: Into<String>>(mut self, base: B) -> Self {
        self.base = Some(base.into());
        self
    }

    #[must_use]
    pub fn with_facets(mut self, facets: Facets) -> Self {
        self.facets = facets;
        self
    }

    const fn with_primitive(mut self, primitive: Primitive) -> Self {
        self.primitive = Some(primitive);
        self
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// The facets declared on this very type (not inherited ones).
    #[must_use]
    pub const fn facets(&self) -> &Facets {
        &self.facets
    }

    /// Set only for the built-in primitive types.
    #[must_use]
    pub const fn primitive(&self) -> Option<Primitive> {
        self.primitive
    }

    pub(crate) fn expanded<F: Fn(&str) -> String>(&self, uri: &str, expand: &F) -> Self {
        Self {
            base: self.base.as_deref().map(expand),
            ..Self::new(uri).with_facets(self.facets.clone())
        }
    }
}

/// A datatype together with all the facets it inherits,
/// and the primitive type its chain ends in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedDatatype {
    /// The most derived type's URI.
    pub uri: String,
    pub primitive: Primitive,
    pub facets: Facets,
    /// URIs from the most derived type down to the primitive one.
    pub chain: Vec<String>,
}

impl ResolvedDatatype {
    /// The whitespace policy in effect; `collapse` for everything but strings.
    #[must_use]
    pub fn whitespace(&self) -> Whitespace {
        self.facets.whitespace.unwrap_or(match self.primitive {
            Primitive::String => Whitespace::Preserve,
            _ => Whitespace::Collapse,
        })
    }
}

/// A read-only table of datatypes by URI.
#[derive(Clone, Debug, Default)]
pub struct DatatypeRegistry {
    types: HashMap<String, Datatype>,
}

/// The built-in XSD types; constructed once, never mutated.
pub static BUILTIN_DATATYPES: Lazy<DatatypeRegistry> = Lazy::new(DatatypeRegistry::builtin);

fn primitive(node: NamedNodeRef<'_>, primitive: Primitive) -> Datatype {
    Datatype::new(node.as_str()).with_primitive(primitive)
}

fn derived(node: NamedNodeRef<'_>, base: NamedNodeRef<'_>, facets: Facets) -> Datatype {
    Datatype::new(node.as_str())
        .with_base(base.as_str())
        .with_facets(facets)
}

fn range(min: Option<&str>, max: Option<&str>) -> Facets {
    Facets {
        min_inclusive: min.map(ToOwned::to_owned),
        max_inclusive: max.map(ToOwned::to_owned),
        ..Facets::default()
    }
}

fn pattern(source: &str) -> Facets {
    let pattern = Pattern::new(source)
        .map_err(|err| tracing::warn!("Invalid built-in pattern '{source}': {err}"))
        .ok();
    Facets {
        pattern,
        ..Facets::default()
    }
}

impl DatatypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, datatype: Datatype) {
        self.types.insert(datatype.uri.clone(), datatype);
    }

    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&Datatype> {
        self.types.get(uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn builtin() -> Self {
        let mut registry = Self::new();
        for datatype in [
            primitive(xsd::STRING, Primitive::String),
            primitive(xsd::BOOLEAN, Primitive::Boolean),
            primitive(xsd::DECIMAL, Primitive::Decimal),
            primitive(xsd::FLOAT, Primitive::Float),
            primitive(xsd::DOUBLE, Primitive::Double),
            primitive(xsd::DATE_TIME, Primitive::DateTime),
            primitive(xsd::DATE, Primitive::Date),
            primitive(xsd::TIME, Primitive::Time),
            primitive(xsd::DURATION, Primitive::Duration),
            primitive(xsd::G_YEAR, Primitive::GYear),
            primitive(xsd::ANY_URI, Primitive::AnyUri),
            primitive(xsd::HEX_BINARY, Primitive::HexBinary),
            primitive(xsd::BASE_64_BINARY, Primitive::Base64Binary),
            derived(
                xsd::NORMALIZED_STRING,
                xsd::STRING,
                Facets {
                    whitespace: Some(Whitespace::Replace),
                    ..Facets::default()
                },
            ),
            derived(
                xsd::TOKEN,
                xsd::NORMALIZED_STRING,
                Facets {
                    whitespace: Some(Whitespace::Collapse),
                    ..Facets::default()
                },
            ),
            derived(
                xsd::LANGUAGE,
                xsd::TOKEN,
                pattern("[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*"),
            ),
            derived(xsd::NAME, xsd::TOKEN, pattern(r"[\p{L}_:][\p{L}\p{N}._:\-]*")),
            derived(xsd::NC_NAME, xsd::NAME, pattern(r"[\p{L}_][\p{L}\p{N}._\-]*")),
            derived(xsd::NMTOKEN, xsd::TOKEN, pattern(r"[\p{L}\p{N}._:\-]+")),
            derived(
                xsd::INTEGER,
                xsd::DECIMAL,
                Facets {
                    fraction_digits: Some(0),
                    ..pattern(r"[+\-]?[0-9]+")
                },
            ),
            derived(
                xsd::NON_POSITIVE_INTEGER,
                xsd::INTEGER,
                range(None, Some("0")),
            ),
            derived(
                xsd::NEGATIVE_INTEGER,
                xsd::NON_POSITIVE_INTEGER,
                range(None, Some("-1")),
            ),
            derived(
                xsd::LONG,
                xsd::INTEGER,
                range(Some("-9223372036854775808"), Some("9223372036854775807")),
            ),
            derived(
                xsd::INT,
                xsd::LONG,
                range(Some("-2147483648"), Some("2147483647")),
            ),
            derived(xsd::SHORT, xsd::INT, range(Some("-32768"), Some("32767"))),
            derived(xsd::BYTE, xsd::SHORT, range(Some("-128"), Some("127"))),
            derived(
                xsd::NON_NEGATIVE_INTEGER,
                xsd::INTEGER,
                range(Some("0"), None),
            ),
            derived(
                xsd::POSITIVE_INTEGER,
                xsd::NON_NEGATIVE_INTEGER,
                range(Some("1"), None),
            ),
            derived(
                xsd::UNSIGNED_LONG,
                xsd::NON_NEGATIVE_INTEGER,
                range(None, Some("18446744073709551615")),
            ),
            derived(
                xsd::UNSIGNED_INT,
                xsd::UNSIGNED_LONG,
                range(None, Some("4294967295")),
            ),
            derived(
                xsd::UNSIGNED_SHORT,
                xsd::UNSIGNED_INT,
                range(None, Some("65535")),
            ),
            derived(
                xsd::UNSIGNED_BYTE,
                xsd::UNSIGNED_SHORT,
                range(None, Some("255")),
            ),
        ] {
            registry.insert(datatype);
        }
        registry
    }
}

impl Context {
    /// Finds a datatype declared in this context (or its components and parent),
    /// falling back to the built-in XSD types.
    #[must_use]
    pub fn find_datatype_by_uri(&self, uri: &str) -> Option<&Datatype> {
        self.find_declared_datatype(uri)
            .or_else(|| BUILTIN_DATATYPES.get(uri))
    }

    /// Walks the base chain of the datatype `uri`,
    /// from the most derived type down to its primitive type,
    /// collecting inherited facets along the way.
    ///
    /// # Errors
    ///
    /// - `Error::Unsupported` if the chain does not end in a built-in primitive type
    /// - `Error::Cyclic` if the chain loops
    pub fn resolve_datatype(&self, uri: &str) -> Result<ResolvedDatatype, Error> {
        let mut facets = Facets::default();
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(uri);
        while let Some(current_uri) = current {
            if !visited.insert(current_uri) {
                return Err(Error::Cyclic {
                    uri: uri.to_owned(),
                });
            }
            let Some(datatype) = self.find_datatype_by_uri(current_uri) else {
                break;
            };
            chain.push(datatype.uri().to_owned());
            facets.inherit_from(datatype.facets());
            if let Some(primitive) = datatype.primitive() {
                return Ok(ResolvedDatatype {
                    uri: uri.to_owned(),
                    primitive,
                    facets,
                    chain,
                });
            }
            current = datatype.base();
        }
        Err(Error::Unsupported {
            uri: uri.to_owned(),
        })
    }
}
