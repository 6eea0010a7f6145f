// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use oxiri::{Iri, IriParseError};

/// The URI schemes we accept as "already fully qualified".
/// Anything else that contains a colon is treated as a (potentially) compact IRI,
/// i.e. `prefix:suffix`.
pub const ABSOLUTE_SCHEMES: [&str; 9] = [
    "http://", "https://", "urn:", "tag:", "mailto:", "file:", "ftp://", "did:", "data:",
];

const NAMESPACE_DELIMITERS: [char; 3] = ['#', '/', ':'];

/// Checks whether the given identifier starts with one of the
/// recognized absolute URI schemes (see [`ABSOLUTE_SCHEMES`]).
///
/// # Examples
///
/// - `http://schema.org/name` -> `true`
/// - `urn:uuid:1234` -> `true`
/// - `schema:name` -> `false`
/// - `name` -> `false`
#[must_use]
pub fn is_absolute(id: &str) -> bool {
    ABSOLUTE_SCHEMES
        .iter()
        .any(|scheme| id.len() > scheme.len() && id.starts_with(scheme))
}

/// Splits a compact IRI like `schema:name` into `("schema", "name")`.
///
/// Returns `None` if there is no colon,
/// if the prefix is empty,
/// or if the suffix starts with `//`
/// (which indicates an absolute IRI like `http://...`, never a compact one).
#[must_use]
pub fn split_compact(id: &str) -> Option<(&str, &str)> {
    let (prefix, suffix) = id.split_once(':')?;
    if prefix.is_empty() || suffix.starts_with("//") {
        return None;
    }
    Some((prefix, suffix))
}

fn last_delimiter(uri: &str) -> Option<usize> {
    uri.trim_end_matches(NAMESPACE_DELIMITERS)
        .rfind(NAMESPACE_DELIMITERS)
}

/// Returns the local name of a URI,
/// which is the part after the last `#`, `/` or `:`.
/// Trailing delimiters are ignored,
/// so `http://schema.org/` yields `schema.org`.
///
/// # Examples
///
/// - `http://www.w3.org/2001/XMLSchema#string` -> `string`
/// - `http://purl.imsglobal.org/vocab/lis/v2/GUID.Type` -> `GUID.Type`
/// - `urn:example:thing` -> `thing`
#[must_use]
pub fn local_name(uri: &str) -> &str {
    let trimmed = uri.trim_end_matches(NAMESPACE_DELIMITERS);
    last_delimiter(uri)
        .and_then(|idx| trimmed.get(idx + 1..))
        .unwrap_or(trimmed)
}

/// Returns the namespace of a URI,
/// which is everything up to and including the last `#`, `/` or `:`.
/// A URI that ends in a delimiter is its own namespace.
///
/// # Examples
///
/// - `http://www.w3.org/2001/XMLSchema#string` -> `http://www.w3.org/2001/XMLSchema#`
/// - `http://www.w3.org/2001/XMLSchema#` -> `http://www.w3.org/2001/XMLSchema#`
/// - `urn:example:thing` -> `urn:example:`
#[must_use]
pub fn namespace_of(uri: &str) -> &str {
    if uri.ends_with(NAMESPACE_DELIMITERS) {
        return uri;
    }
    uri.rfind(NAMESPACE_DELIMITERS)
        .and_then(|idx| uri.get(..=idx))
        .unwrap_or("")
}

/// Syntactically validates an absolute IRI.
///
/// # Errors
///
/// Returns an `IriParseError` if the given `iri` is invalid.
pub fn check(iri: &str) -> Result<(), IriParseError> {
    Iri::parse(iri).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_schemes() {
        assert!(is_absolute("http://schema.org/name"));
        assert!(is_absolute("https://schema.org/name"));
        assert!(is_absolute("urn:uuid:1234"));
        assert!(is_absolute("tag:example.org,2024:x"));
        assert!(!is_absolute("schema:name"));
        assert!(!is_absolute("name"));
        assert!(!is_absolute("http://"));
    }

    #[test]
    fn compact_split() {
        assert_eq!(split_compact("schema:name"), Some(("schema", "name")));
        assert_eq!(split_compact("xsd:"), Some(("xsd", "")));
        assert_eq!(split_compact("name"), None);
        assert_eq!(split_compact(":name"), None);
        assert_eq!(split_compact("http://schema.org/name"), None);
    }

    #[test]
    fn local_names() {
        assert_eq!(
            local_name("http://www.w3.org/2001/XMLSchema#string"),
            "string"
        );
        assert_eq!(
            local_name("http://purl.imsglobal.org/vocab/lis/v2/GUID.Type"),
            "GUID.Type"
        );
        assert_eq!(local_name("urn:example:thing"), "thing");
        assert_eq!(local_name("http://schema.org/"), "schema.org");
        assert_eq!(local_name("plain"), "plain");
    }

    #[test]
    fn namespaces() {
        assert_eq!(
            namespace_of("http://www.w3.org/2001/XMLSchema#string"),
            "http://www.w3.org/2001/XMLSchema#"
        );
        assert_eq!(
            namespace_of("http://www.w3.org/2001/XMLSchema#"),
            "http://www.w3.org/2001/XMLSchema#"
        );
        assert_eq!(namespace_of("urn:example:thing"), "urn:example:");
        assert_eq!(namespace_of("plain"), "");
    }

    #[test]
    fn syntax_check() {
        assert!(check("http://schema.org/name").is_ok());
        assert!(check("not an iri").is_err());
    }
}
