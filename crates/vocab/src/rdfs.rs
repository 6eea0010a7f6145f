// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! [RDF Schema](
//! http://www.w3.org/2000/01/rdf-schema)
//! vocabulary, as far as it is not already covered by `oxrdf::vocab::rdfs`.

use crate::named_node;

pub const NS_BASE: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const NS_PREFERRED_PREFIX: &str = "rdfs";

named_node!(
    LITERAL,
    NS_BASE,
    "Literal",
    "The class of literal values, e.g. textual strings and integers."
);
named_node!(
    RESOURCE,
    NS_BASE,
    "Resource",
    "The class resource, everything."
);
