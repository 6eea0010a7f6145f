// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::{BTreeSet, HashSet, VecDeque};

use ldvalid_iri::{is_absolute, namespace_of};
use ldvalid_vocab::is_builtin_namespace;

use crate::class::Class;
use crate::context::Context;
use crate::datatype::Datatype;
use crate::term::Property;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Failed to enhance the context; missing namespaces: {}", .namespaces.join(", "))]
    MissingNamespaces {
        /// Sorted, without duplicates.
        namespaces: Vec<String>,
    },
}

/// Supplies class, property and datatype facts,
/// usually derived from an ontology.
pub trait OntologyProvider {
    /// Whether facts about terms in `namespace` are available at all.
    fn has_namespace(&self, namespace: &str) -> bool;

    fn resolve_class(&self, uri: &str) -> Option<Class>;

    fn resolve_property(&self, uri: &str) -> Option<Property>;

    fn resolve_datatype(&self, uri: &str) -> Option<Datatype>;
}

/// A closed context may serve as ontology source for another one,
/// which is how ontologies written as annotated contexts are used.
impl OntologyProvider for Context {
    fn has_namespace(&self, namespace: &str) -> bool {
        self.visible_terms().into_iter().any(|term| {
            let id = term.id();
            namespace_of(id) == namespace || id == namespace
        })
    }

    fn resolve_class(&self, uri: &str) -> Option<Class> {
        self.find_class(uri).cloned()
    }

    fn resolve_property(&self, uri: &str) -> Option<Property> {
        self.find_property(uri).cloned()
    }

    fn resolve_datatype(&self, uri: &str) -> Option<Datatype> {
        self.find_declared_datatype(uri).cloned()
    }
}

impl Context {
    /// Attaches class, property and datatype facts from `provider`
    /// to the terms of this context,
    /// following every URI those facts refer to in turn.
    /// Contexts that already carry facts are returned as they are.
    ///
    /// # Errors
    ///
    /// `Error::MissingNamespaces`, listing every namespace
    /// referenced but unknown to `provider`.
    /// Built-in namespaces (XSD, RDF, RDFS, OWL) are never reported.
    pub fn enhance<P: OntologyProvider + ?Sized>(mut self, provider: &P) -> Result<Self, Error> {
        if self.is_enhanced() {
            tracing::debug!("Context is enhanced already; skipping");
            return Ok(self);
        }

        let mut queue: VecDeque<String> = self
            .visible_terms()
            .into_iter()
            .flat_map(|term| [Some(term.id()), term.resolved_type()])
            .flatten()
            .map(ToOwned::to_owned)
            .collect();
        let mut seen = HashSet::new();
        let mut missing = BTreeSet::new();
        while let Some(uri) = queue.pop_front() {
            if !is_absolute(&uri) || !seen.insert(uri.clone()) {
                continue;
            }
            let namespace = namespace_of(&uri);
            if namespace.is_empty() || is_builtin_namespace(namespace) {
                continue;
            }
            if !provider.has_namespace(namespace) {
                missing.insert(namespace.to_owned());
                continue;
            }

            let class = if self.find_class(&uri).is_none() {
                provider.resolve_class(&uri)
            } else {
                None
            };
            let property = if self.find_property(&uri).is_none() {
                provider.resolve_property(&uri)
            } else {
                None
            };
            let datatype = if self.find_declared_datatype(&uri).is_none() {
                provider.resolve_datatype(&uri)
            } else {
                None
            };
            if class.is_none() && property.is_none() && datatype.is_none() {
                tracing::trace!("No facts found for '{uri}'");
                continue;
            }

            if let Some(class) = &class {
                queue.extend(class.referenced_uris().into_iter().map(ToOwned::to_owned));
            }
            if let Some(property) = &property {
                queue.extend(property.domain.iter().cloned());
            }
            if let Some(base) = datatype.as_ref().and_then(Datatype::base) {
                queue.push_back(base.to_owned());
            }

            let term = self.ensure_local_term(&uri);
            tracing::trace!("Enhancing term '{}' ({uri})", term.name());
            if class.is_some() {
                term.class = class;
            }
            if property.is_some() {
                term.property = property;
            }
            if datatype.is_some() {
                term.datatype = datatype;
            }
        }

        if !missing.is_empty() {
            return Err(Error::MissingNamespaces {
                namespaces: missing.into_iter().collect(),
            });
        }
        self.rebuild_hierarchy();
        Ok(self)
    }
}
