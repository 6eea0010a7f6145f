// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Provides ready to use [`NamedNodeRef`](oxrdf::NamedNodeRef)s
//! for the RDF vocabularies the validator needs,
//! and the set of namespaces that are always known.

pub mod owl;
pub mod rdfs;

pub use oxrdf::vocab::xsd;

// This tests rust code in the README with doc-tests.
// Though, It will not appear in the generated documentation.
#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;

#[macro_export]
macro_rules! named_node {
    ($const:ident, $base:expr, $node:literal, $doc:literal) => {
        #[doc=$doc]
        pub const $const: oxrdf::NamedNodeRef<'_> =
            oxrdf::NamedNodeRef::new_unchecked(const_format::concatcp!($base, $node));
    };
}

pub const NS_BASE_XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const NS_BASE_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Namespaces whose terms are built into the validator.
/// These never need to be supplied by an ontology source,
/// and are never reported as missing.
pub const BUILTIN_NAMESPACES: [&str; 4] = [NS_BASE_XSD, NS_BASE_RDF, rdfs::NS_BASE, owl::NS_BASE];

#[must_use]
pub fn is_builtin_namespace(namespace: &str) -> bool {
    BUILTIN_NAMESPACES.contains(&namespace)
}
