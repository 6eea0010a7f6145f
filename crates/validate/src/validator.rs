// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashSet;

use ldvalid_context::{AmbiguousRestriction, Context, DatatypeError, Restriction, Term};

use crate::facet;
use crate::node::{Field, Literal, Node, ObjectNode};
use crate::report::Report;

pub const MSG_INVALID_DOMAIN: &str = "Invalid domain for this property";

/// Unexpected problems while validating one field;
/// these end up as warnings, and never stop the validation of the rest of the document.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Datatype(#[from] DatatypeError),

    #[error(transparent)]
    Ambiguous(#[from] AmbiguousRestriction),
}

fn child_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_owned()
    } else {
        format!("{path}.{name}")
    }
}

/// Validates document node trees against a closed (and usually enhanced) context.
///
/// Holds no mutable state, so one context may be used
/// by any number of validators at the same time.
pub struct Validator<'c> {
    context: &'c Context,
}

impl<'c> Validator<'c> {
    #[must_use]
    pub const fn new(context: &'c Context) -> Self {
        Self { context }
    }

    /// Validates `node` and everything below it,
    /// collecting every problem found.
    #[must_use]
    pub fn validate(&self, node: &Node) -> Report {
        let mut report = Report::new();
        self.visit(node, "", None, &mut report);
        report
    }

    fn visit(&self, node: &Node, path: &str, expected: Option<&str>, report: &mut Report) {
        match node {
            Node::Object(object) => self.visit_object(object, path, expected, report),
            Node::Container(container) => {
                for (idx, item) in container.items.iter().enumerate() {
                    self.visit(item, &format!("{path}[{idx}]"), expected, report);
                }
            }
            Node::Literal(literal) => {
                if let Err(err) = self.check_literal(literal, expected, path, report) {
                    report.warning(path, err.to_string());
                }
            }
            Node::Iri(_) | Node::Blank(_) => {}
        }
    }

    /// The classes an object is an instance of:
    /// its declared types, or else the range expected by its parent.
    fn classes_of<'n>(object: &'n ObjectNode, expected: Option<&'n str>) -> Vec<&'n str> {
        if object.types.is_empty() {
            expected.into_iter().collect()
        } else {
            object.types.iter().map(String::as_str).collect()
        }
    }

    /// One restriction per property, over all `classes`; the first class wins.
    fn restrictions_of(&self, classes: &[&str]) -> Vec<&'c Restriction> {
        let mut properties = HashSet::new();
        classes
            .iter()
            .flat_map(|class| self.context.restrictions_in_scope(class))
            .filter(|restriction| properties.insert(restriction.property.as_str()))
            .collect()
    }

    fn visit_object(
        &self,
        object: &ObjectNode,
        path: &str,
        expected: Option<&str>,
        report: &mut Report,
    ) {
        let classes = Self::classes_of(object, expected);

        for restriction in self.restrictions_of(&classes) {
            self.check_cardinality(object, restriction, path, report);
        }

        for field in &object.fields {
            let field_path = child_path(path, self.label(&field.property, &field.name));
            if !classes.is_empty() && !self.is_in_domain(&classes, &field.property) {
                report.error(&field_path, MSG_INVALID_DOMAIN);
            }
            match self.expected_range(&classes, field) {
                Ok(range) => self.visit(&field.value, &field_path, range.as_deref(), report),
                Err(err) => {
                    report.warning(&field_path, err.to_string());
                    self.visit(&field.value, &field_path, None, report);
                }
            }
        }
    }

    /// Reported paths use the context's short name for a property,
    /// however the document spelled the key.
    fn label<'a>(&'a self, property: &str, written: &'a str) -> &'a str {
        self.context.short_name(property).unwrap_or(written)
    }

    fn check_cardinality(
        &self,
        object: &ObjectNode,
        restriction: &Restriction,
        path: &str,
        report: &mut Report,
    ) {
        let found = u64::try_from(object.cardinality(&restriction.property)).unwrap_or(u64::MAX);
        let name = self
            .context
            .short_name(&restriction.property)
            .or_else(|| object.field_name(&restriction.property))
            .unwrap_or_else(|| ldvalid_iri::local_name(&restriction.property));
        let field_path = child_path(path, name);
        if found < restriction.min_cardinality {
            report.error(
                &field_path,
                format!(
                    "Expected minCardinality={}, but found cardinality={found}",
                    restriction.min_cardinality
                ),
            );
        }
        if let Some(max) = restriction.max_cardinality {
            if found > max {
                report.error(
                    &field_path,
                    format!("Expected maxCardinality={max}, but found cardinality={found}"),
                );
            }
        }
    }

    /// A property without declared domain may be used anywhere;
    /// otherwise one of `classes` has to be (a subclass of) one of its domains,
    /// or restrict the property itself.
    fn is_in_domain(&self, classes: &[&str], property: &str) -> bool {
        let Some(facts) = self.context.find_property(property) else {
            return true;
        };
        if facts.domain.is_empty() {
            return true;
        }
        classes.iter().any(|class| {
            facts
                .domain
                .iter()
                .any(|domain| self.context.is_sub_class_of(class, domain))
                || self.context.find_restriction(class, property).is_some()
        })
    }

    /// The range the values of `field` are expected to have:
    /// `allValuesFrom`, else the range implied by qualified restrictions,
    /// else the type declared on the term.
    fn expected_range(&self, classes: &[&str], field: &Field) -> Result<Option<String>, Error> {
        for class in classes {
            if let Some(range) = self
                .context
                .find_restriction(class, &field.property)
                .and_then(|restriction| restriction.all_values_from.clone())
            {
                return Ok(Some(range));
            }
            if let Some(range) = self
                .context
                .infer_qualified_property_type(class, &field.property)?
            {
                return Ok(Some(range));
            }
        }
        Ok(self
            .context
            .get_term(&field.name)
            .and_then(Term::resolved_type)
            .filter(|type_| !type_.starts_with('@'))
            .map(ToOwned::to_owned))
    }

    /// Checks the facets of the literal's own datatype,
    /// or of the expected range, if that is a datatype.
    fn check_literal(
        &self,
        literal: &Literal,
        expected: Option<&str>,
        path: &str,
        report: &mut Report,
    ) -> Result<(), Error> {
        let datatype = literal.datatype().or_else(|| {
            expected.filter(|range| self.context.find_datatype_by_uri(range).is_some())
        });
        let Some(datatype) = datatype else {
            return Ok(());
        };
        let resolved = self.context.resolve_datatype(datatype)?;
        if let Err(violation) = facet::check(&literal.lexical(), &resolved) {
            report.error(path, violation.to_string());
        }
        Ok(())
    }
}
