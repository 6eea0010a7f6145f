// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Resolves JSON-LD terms and compact IRIs
//! through prefix chains, parent and component contexts,
//! and holds the class, restriction and datatype facts
//! the validator checks documents against.

pub mod class;
pub mod context;
pub mod datatype;
pub mod enhance;
pub mod error;
pub mod reader;
pub mod term;

pub use class::{
    AmbiguousRestriction, Class, ClassHierarchy, QualifiedCandidate, QualifiedRestriction,
    Restriction,
};
pub use context::{Context, ContextBuilder};
pub use datatype::{
    Datatype, DatatypeRegistry, Error as DatatypeError, Facets, Pattern, Primitive,
    ResolvedDatatype, Whitespace, BUILTIN_DATATYPES,
};
pub use enhance::{Error as EnhanceError, OntologyProvider};
pub use error::Error;
pub use reader::ContextReader;
pub use term::{Container, Property, Term};

// This tests rust code in the README with doc-tests.
// Though, It will not appear in the generated documentation.
#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
