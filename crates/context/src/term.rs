// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::OnceLock;

use uuid::Uuid;

use crate::class::Class;
use crate::datatype::Datatype;

/// How many numeric suffixes we try
/// when deriving a unique short name for a synthetic term,
/// before falling back to a random suffix.
pub const MAX_NAME_SUFFIX: usize = 100;

/// The `@container` kind of a term.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Container {
    #[default]
    None,
    List,
    Set,
}

impl Container {
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "@list" => Some(Self::List),
            "@set" => Some(Self::Set),
            _ => None,
        }
    }

    #[must_use]
    pub const fn keyword(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::List => Some("@list"),
            Self::Set => Some("@set"),
        }
    }
}

/// Facts about a property,
/// as declared inline in a context or supplied by an ontology source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Property {
    /// The classes this property may be used on.
    /// Empty means: no domain restriction.
    pub domain: Vec<String>,
}

impl Property {
    #[must_use]
    pub fn new(domain: Vec<String>) -> Self {
        Self { domain }
    }

    pub(crate) fn expanded<F: Fn(&str) -> String>(&self, expand: F) -> Self {
        Self {
            domain: self.domain.iter().map(|uri| expand(uri)).collect(),
        }
    }
}

/// A named binding from a short name to a (compact or fully qualified) identifier,
/// optionally carrying type, container, language
/// and semantic facts (class, property, datatype).
#[derive(Clone, Debug)]
pub struct Term {
    pub(crate) name: String,
    pub(crate) raw_id: String,
    /// Write-once; set when the owning context is closed,
    /// or the first time the term is used as a namespace prefix.
    pub(crate) resolved_id: OnceLock<String>,
    pub(crate) raw_type: Option<String>,
    pub(crate) resolved_type: Option<String>,
    pub(crate) container: Container,
    pub(crate) language: Option<String>,
    pub(crate) class: Option<Class>,
    pub(crate) property: Option<Property>,
    pub(crate) datatype: Option<Datatype>,
    pub(crate) synthetic: bool,
}

impl Term {
    #[must_use]
    pub fn new<N: Into<String>, I: Into<String>>(name: N, raw_id: I) -> Self {
        Self {
            name: name.into(),
            raw_id: raw_id.into(),
            resolved_id: OnceLock::new(),
            raw_type: None,
            resolved_type: None,
            container: Container::None,
            language: None,
            class: None,
            property: None,
            datatype: None,
            synthetic: false,
        }
    }

    /// Creates a term that was not declared,
    /// but is needed to cross-reference a fully qualified `uri`.
    pub(crate) fn synthetic(name: String, uri: &str) -> Self {
        let term = Self {
            synthetic: true,
            ..Self::new(name, uri)
        };
        term.resolve_once(uri.to_owned());
        term
    }

    #[must_use]
    pub fn with_type<T: Into<String>>(mut self, raw_type: T) -> Self {
        self.raw_type = Some(raw_type.into());
        self
    }

    #[must_use]
    pub const fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    #[must_use]
    pub fn with_language<L: Into<String>>(mut self, language: L) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: Class) -> Self {
        self.class = Some(class);
        self
    }

    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.property = Some(property);
        self
    }

    #[must_use]
    pub fn with_datatype(mut self, datatype: Datatype) -> Self {
        self.datatype = Some(datatype);
        self
    }

    /// The short name, e.g. `name` or `GUID.Type`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identifier as declared, e.g. `schema:name`.
    #[must_use]
    pub fn raw_id(&self) -> &str {
        &self.raw_id
    }

    /// The fully qualified identifier,
    /// if this term was already expanded.
    #[must_use]
    pub fn resolved_id(&self) -> Option<&str> {
        self.resolved_id.get().map(String::as_str)
    }

    /// The resolved identifier if present,
    /// the raw one otherwise.
    #[must_use]
    pub fn id(&self) -> &str {
        self.resolved_id().unwrap_or(&self.raw_id)
    }

    /// Sets the resolved identifier, unless it is already set.
    /// Returns the (possibly pre-existing) resolved identifier.
    pub(crate) fn resolve_once(&self, resolved: String) -> &str {
        self.resolved_id.get_or_init(|| resolved)
    }

    #[must_use]
    pub fn raw_type(&self) -> Option<&str> {
        self.raw_type.as_deref()
    }

    /// The expanded `@type`; keywords like `@id` are kept as they are.
    #[must_use]
    pub fn resolved_type(&self) -> Option<&str> {
        self.resolved_type.as_deref().or(self.raw_type.as_deref())
    }

    #[must_use]
    pub const fn container(&self) -> Container {
        self.container
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    #[must_use]
    pub const fn class(&self) -> Option<&Class> {
        self.class.as_ref()
    }

    #[must_use]
    pub const fn property(&self) -> Option<&Property> {
        self.property.as_ref()
    }

    #[must_use]
    pub const fn datatype(&self) -> Option<&Datatype> {
        self.datatype.as_ref()
    }

    /// Whether this term was created on demand
    /// rather than declared in a context document.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Whether this term carries any semantic facts,
    /// not counting the implicit top-level `owl:Thing` class.
    #[must_use]
    pub fn has_facts(&self) -> bool {
        let real_class = self
            .class
            .as_ref()
            .is_some_and(|class| class.uri() != ldvalid_vocab::owl::THING.as_str());
        real_class || self.property.is_some() || self.datatype.is_some()
    }
}

/// Derives a short name for a synthetic term from the local name of `uri`,
/// appending a numeric suffix if that name is already taken.
pub(crate) fn synthetic_name<F: Fn(&str) -> bool>(uri: &str, is_taken: F) -> String {
    let local = ldvalid_iri::local_name(uri);
    let base = if local.is_empty() { "term" } else { local };
    if !is_taken(base) {
        return base.to_owned();
    }
    for suffix in 2..=MAX_NAME_SUFFIX {
        let candidate = format!("{base}{suffix}");
        if !is_taken(&candidate) {
            return candidate;
        }
    }
    let fallback = format!("{base}_{}", Uuid::new_v4().simple());
    tracing::debug!("Using random short name '{fallback}' for '{uri}'");
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_id_is_write_once() {
        let term = Term::new("name", "schema:name");
        assert_eq!(term.resolved_id(), None);
        assert_eq!(term.id(), "schema:name");
        assert_eq!(
            term.resolve_once("http://schema.org/name".to_owned()),
            "http://schema.org/name"
        );
        assert_eq!(
            term.resolve_once("http://other.org/name".to_owned()),
            "http://schema.org/name"
        );
        assert_eq!(term.resolved_id(), Some("http://schema.org/name"));
    }

    #[test]
    fn synthetic_names_are_unique() {
        let taken = ["Person", "Person2", "Person3"];
        let name = synthetic_name("http://schema.org/Person", |name| taken.contains(&name));
        assert_eq!(name, "Person4");
        assert_eq!(
            synthetic_name("http://schema.org/Place", |_| false),
            "Place"
        );
    }

    #[test]
    fn synthetic_name_falls_back_to_random_suffix() {
        let name = synthetic_name("http://schema.org/Person", |name| {
            name == "Person" || name.strip_prefix("Person").is_some_and(|rest| rest.parse::<usize>().is_ok())
        });
        assert!(name.starts_with("Person_"));
    }

    #[test]
    fn thing_is_no_fact() {
        let term = Term::new("Thing", "owl:Thing")
            .with_class(Class::new(ldvalid_vocab::owl::THING.as_str()));
        assert!(!term.has_facts());
        let term = Term::new("Person", "schema:Person").with_class(Class::new("http://schema.org/Person"));
        assert!(term.has_facts());
    }
}
