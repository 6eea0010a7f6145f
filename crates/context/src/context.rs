// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::borrow::Cow;
use std::collections::HashMap;
use std::ptr;
use std::sync::Arc;

use crate::class::{Class, ClassHierarchy};
use crate::datatype::Datatype;
use crate::term::{self, Property, Term};

/// Terms currently being resolved, to break prefix cycles.
type Guard = Vec<*const Term>;

#[derive(Debug)]
enum Component {
    Open(ContextBuilder),
    Closed(Context),
}

impl Component {
    fn close(self) -> Context {
        match self {
            Self::Open(builder) => builder.build(),
            Self::Closed(context) => context,
        }
    }
}

/// Accumulates terms, a parent and component contexts,
/// and eventually turns into an immutable [`Context`] with [`Self::build`].
#[derive(Debug, Default)]
pub struct ContextBuilder {
    id: Option<String>,
    terms: Vec<Term>,
    parent: Option<Arc<Context>>,
    components: Vec<Component>,
}

impl ContextBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id<I: Into<String>>(&mut self, id: I) {
        self.id = Some(id.into());
    }

    #[must_use]
    pub fn with_id<I: Into<String>>(mut self, id: I) -> Self {
        self.set_id(id);
        self
    }

    pub fn set_parent(&mut self, parent: Arc<Context>) {
        self.parent = Some(parent);
    }

    #[must_use]
    pub fn with_parent(mut self, parent: Arc<Context>) -> Self {
        self.set_parent(parent);
        self
    }

    /// Adds a locally declared term.
    /// A term with the same name declared earlier is replaced.
    pub fn add_term(&mut self, term: Term) {
        if let Some(existing) = self.terms.iter_mut().find(|local| local.name == term.name) {
            tracing::debug!("Term '{}' is declared more than once; the last one wins", term.name);
            *existing = term;
        } else {
            self.terms.push(term);
        }
    }

    /// Adds a component context, which will be closed together with this one.
    /// Components added later shadow those added earlier.
    pub fn add_component(&mut self, component: Self) {
        self.components.push(Component::Open(component));
    }

    /// Adds an already closed component context.
    pub fn add_closed_component(&mut self, component: Context) {
        self.components.push(Component::Closed(component));
    }

    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.components.is_empty()
    }

    /// Returns the local term declared for `uri`,
    /// creating a synthetic one if there is none yet.
    pub fn ensure_term(&mut self, uri: &str) -> &mut Term {
        let idx = if let Some(idx) = self.terms.iter().position(|term| term.raw_id == uri) {
            idx
        } else {
            let name = term::synthetic_name(uri, |name| {
                self.terms.iter().any(|term| term.name == name)
            });
            self.terms.push(Term::synthetic(name, uri));
            self.terms.len() - 1
        };
        &mut self.terms[idx]
    }

    /// Returns the class facts of the local term for `uri`,
    /// creating the term and/or the class if needed.
    pub fn ensure_class(&mut self, uri: &str) -> &mut Class {
        self.ensure_term(uri)
            .class
            .get_or_insert_with(|| Class::new(uri))
    }

    /// Closes this context: closes all components,
    /// resolves every local term and expands all its facts.
    #[must_use]
    pub fn build(self) -> Context {
        let mut context = Context {
            id: self.id,
            terms: self.terms,
            by_key: HashMap::new(),
            by_uri: HashMap::new(),
            parent: self.parent,
            components: self.components.into_iter().map(Component::close).collect(),
            hierarchy: ClassHierarchy::default(),
        };
        context.index_keys();
        for term in &context.terms {
            if ldvalid_iri::is_absolute(&term.raw_id) {
                if let Err(err) = ldvalid_iri::check(&term.raw_id) {
                    tracing::warn!("Term '{}' has a malformed IRI '{}': {err}", term.name, term.raw_id);
                }
                term.resolve_once(term.raw_id.clone());
            }
        }
        for term in &context.terms {
            context.resolve_term(term, &mut Vec::new());
        }
        context.expand_facts();
        context.index_uris();
        context.rebuild_hierarchy();
        tracing::trace!(
            "Closed context {} with {} local terms and {} components",
            context.id.as_deref().unwrap_or("<anonymous>"),
            context.terms.len(),
            context.components.len()
        );
        context
    }
}

/// A closed term-resolution scope:
/// local terms, an optional parent and component contexts.
///
/// Immutable, and thus freely shareable between threads;
/// only `Context::enhance` (which consumes it) adds facts.
#[derive(Debug)]
pub struct Context {
    id: Option<String>,
    terms: Vec<Term>,
    /// Short names and raw identifiers, to term index.
    by_key: HashMap<String, usize>,
    /// Resolved identifiers, to term index.
    by_uri: HashMap<String, usize>,
    parent: Option<Arc<Context>>,
    components: Vec<Context>,
    pub(crate) hierarchy: ClassHierarchy,
}

impl Context {
    #[must_use]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Closing an already closed context changes nothing.
    #[must_use]
    pub fn close(self) -> Self {
        self
    }

    /// The fully qualified identifier of this context, if it has one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The locally declared (and synthetic) terms, in declaration order.
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn components(&self) -> &[Self] {
        &self.components
    }

    fn index_keys(&mut self) {
        self.by_key.clear();
        for (idx, term) in self.terms.iter().enumerate() {
            self.by_key.insert(term.name.clone(), idx);
        }
        for (idx, term) in self.terms.iter().enumerate() {
            self.by_key.entry(term.raw_id.clone()).or_insert(idx);
        }
    }

    fn index_uris(&mut self) {
        self.by_uri.clear();
        for (idx, term) in self.terms.iter().enumerate() {
            let replace = match self.by_uri.get(term.id()).and_then(|&prev| self.terms.get(prev)) {
                None => true,
                Some(prev) => !prev.has_facts() && term.has_facts(),
            };
            if replace {
                self.by_uri.insert(term.id().to_owned(), idx);
            }
        }
    }

    pub(crate) fn rebuild_hierarchy(&mut self) {
        self.hierarchy = ClassHierarchy::build(self.visible_classes().into_iter());
    }

    fn visible_classes(&self) -> Vec<&Class> {
        let mut classes: Vec<&Class> = self.terms.iter().filter_map(Term::class).collect();
        for component in &self.components {
            classes.extend(component.visible_classes());
        }
        if let Some(parent) = &self.parent {
            classes.extend(parent.visible_classes());
        }
        classes
    }

    /// Expands every identifier mentioned in the facts of local terms.
    fn expand_facts(&mut self) {
        let expand = |key: &str| self.expand(key).into_owned();
        let expanded: Vec<_> = self
            .terms
            .iter()
            .map(|term| {
                let uri = term.id();
                (
                    term.raw_type.as_deref().map(|raw| {
                        if raw.starts_with('@') {
                            raw.to_owned()
                        } else {
                            expand(raw)
                        }
                    }),
                    term.class.as_ref().map(|class| class.expanded(uri, &expand)),
                    term.property.as_ref().map(|property| property.expanded(&expand)),
                    term.datatype.as_ref().map(|datatype| datatype.expanded(uri, &expand)),
                )
            })
            .collect();
        for (term, (resolved_type, class, property, datatype)) in
            self.terms.iter_mut().zip(expanded)
        {
            term.resolved_type = resolved_type;
            term.class = class;
            term.property = property;
            term.datatype = datatype;
        }
    }

    /// Finds the term for a short name or raw identifier,
    /// together with the context that owns it.
    /// Lookup order: local terms, components (last added first), parent.
    fn lookup(&self, key: &str) -> Option<(&Self, &Term)> {
        if let Some(term) = self.by_key.get(key).and_then(|&idx| self.terms.get(idx)) {
            return Some((self, term));
        }
        self.components
            .iter()
            .rev()
            .find_map(|component| component.lookup(key))
            .or_else(|| self.parent.as_deref().and_then(|parent| parent.lookup(key)))
    }

    /// Finds the term for a short name or raw identifier.
    #[must_use]
    pub fn get_term(&self, key: &str) -> Option<&Term> {
        self.lookup(key).map(|(_, term)| term)
    }

    /// Resolves `term` (owned by this context),
    /// memoizing the result in the term.
    /// Returns `None` if its definition is cyclic.
    fn resolve_term<'a>(&'a self, term: &'a Term, guard: &mut Guard) -> Option<&'a str> {
        if let Some(resolved) = term.resolved_id() {
            return Some(resolved);
        }
        if guard.iter().any(|&visiting| ptr::eq(visiting, term)) {
            tracing::debug!("Cyclic definition of term '{}'", term.name);
            return None;
        }
        guard.push(term);
        let expanded = self.expand_guarded(&term.raw_id, guard).into_owned();
        guard.pop();
        Some(term.resolve_once(expanded))
    }

    /// Expands a short name or compact IRI into a fully qualified identifier.
    /// Anything that can not be resolved is returned unchanged.
    #[must_use]
    pub fn expand<'k>(&self, key: &'k str) -> Cow<'k, str> {
        self.expand_guarded(key, &mut Vec::new())
    }

    fn expand_guarded<'k>(&self, key: &'k str, guard: &mut Guard) -> Cow<'k, str> {
        let resolved = match ldvalid_iri::split_compact(key) {
            None if key.contains(':') => None,
            None => self
                .lookup(key)
                .and_then(|(owner, term)| owner.resolve_term(term, guard))
                .map(ToOwned::to_owned),
            Some((prefix, suffix)) => self
                .lookup(prefix)
                .and_then(|(owner, term)| owner.resolve_term(term, guard))
                .map(|namespace| format!("{namespace}{suffix}")),
        };
        resolved.map_or(Cow::Borrowed(key), Cow::Owned)
    }

    /// Searches local terms, then components (last added first), then the parent,
    /// for a term with the resolved identifier `uri` that carries `fact`.
    pub(crate) fn find_by_uri<'a, T, F>(&'a self, uri: &str, fact: F) -> Option<&'a T>
    where
        F: Fn(&'a Term) -> Option<&'a T> + Copy,
    {
        self.by_uri
            .get(uri)
            .and_then(|&idx| self.terms.get(idx))
            .and_then(fact)
            .or_else(|| {
                self.components
                    .iter()
                    .rev()
                    .find_map(|component| component.find_by_uri(uri, fact))
            })
            .or_else(|| {
                self.parent
                    .as_deref()
                    .and_then(|parent| parent.find_by_uri(uri, fact))
            })
    }

    /// Finds the term whose resolved identifier is `uri`.
    #[must_use]
    pub fn find_term_by_uri(&self, uri: &str) -> Option<&Term> {
        self.find_by_uri(uri, Some)
    }

    #[must_use]
    pub fn find_class(&self, uri: &str) -> Option<&Class> {
        self.find_by_uri(uri, Term::class)
    }

    #[must_use]
    pub fn find_property(&self, uri: &str) -> Option<&Property> {
        self.find_by_uri(uri, Term::property)
    }

    /// Only declared datatypes; see [`Self::find_datatype_by_uri`]
    /// for a lookup that includes the built-in ones.
    #[must_use]
    pub fn find_declared_datatype(&self, uri: &str) -> Option<&Datatype> {
        self.find_by_uri(uri, Term::datatype)
    }

    /// The short name of the term for `uri`.
    #[must_use]
    pub fn short_name(&self, uri: &str) -> Option<&str> {
        self.find_term_by_uri(uri).map(Term::name)
    }

    /// Whether any local, component or inherited term
    /// carries class, property or datatype facts.
    #[must_use]
    pub fn is_enhanced(&self) -> bool {
        self.terms.iter().any(Term::has_facts)
            || self.components.iter().any(|component| component.is_enhanced())
            || self.parent.as_ref().is_some_and(|parent| parent.is_enhanced())
    }

    /// All terms visible from this context,
    /// in lookup order, possibly containing shadowed ones.
    pub(crate) fn visible_terms(&self) -> Vec<&Term> {
        let mut terms: Vec<&Term> = self.terms.iter().collect();
        for component in self.components.iter().rev() {
            terms.extend(component.visible_terms());
        }
        if let Some(parent) = &self.parent {
            terms.extend(parent.visible_terms());
        }
        terms
    }

    /// Returns the local term with the resolved identifier `uri`.
    /// A term for `uri` declared in a component or the parent
    /// is copied in under its own name;
    /// otherwise a synthetic one is created.
    pub(crate) fn ensure_local_term(&mut self, uri: &str) -> &mut Term {
        let idx = if let Some(&idx) = self.by_uri.get(uri) {
            idx
        } else {
            let term = match self.find_term_by_uri(uri) {
                Some(inherited) if !self.by_key.contains_key(inherited.name()) => inherited.clone(),
                _ => Term::synthetic(
                    term::synthetic_name(uri, |name| self.lookup(name).is_some()),
                    uri,
                ),
            };
            let idx = self.terms.len();
            self.by_key.insert(term.name().to_owned(), idx);
            self.by_key.entry(uri.to_owned()).or_insert(idx);
            self.by_uri.insert(uri.to_owned(), idx);
            self.terms.push(term);
            idx
        };
        &mut self.terms[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "http://schema.org/";

    fn schema_context() -> Context {
        let mut builder = ContextBuilder::new();
        builder.add_term(Term::new("schema", SCHEMA));
        builder.add_term(Term::new("name", "schema:name"));
        builder.add_term(Term::new("Person", "schema:Person"));
        builder.build()
    }

    #[test]
    fn expands_short_names_and_compact_iris() {
        let ctx = schema_context();
        assert_eq!(ctx.expand("name"), "http://schema.org/name");
        assert_eq!(ctx.expand("schema:address"), "http://schema.org/address");
        assert_eq!(ctx.expand("unknown"), "unknown");
        assert_eq!(ctx.expand("urn:isbn:123"), "urn:isbn:123");
        assert_eq!(ctx.expand("foo:bar"), "foo:bar");
    }

    #[test]
    fn expansion_is_idempotent() {
        let ctx = schema_context();
        for key in ["name", "schema:Person", "http://example.org/x", "urn:a:b"] {
            let once = ctx.expand(key).into_owned();
            assert_eq!(ctx.expand(&once), once);
        }
    }

    #[test]
    fn closing_twice_changes_nothing() {
        let ctx = schema_context();
        let before: Vec<_> = ctx.terms().map(|term| term.id().to_owned()).collect();
        let ctx = ctx.close().close();
        let after: Vec<_> = ctx.terms().map(|term| term.id().to_owned()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn terms_resolve_through_prefix_chains() {
        let mut builder = ContextBuilder::new();
        // declared before the prefix it depends on
        builder.add_term(Term::new("vocab", "lis:vocab/"));
        builder.add_term(Term::new("lis", "http://purl.imsglobal.org/"));
        builder.add_term(Term::new("GUID.Type", "vocab:GUID.Type"));
        let ctx = builder.build();
        assert_eq!(
            ctx.get_term("GUID.Type").and_then(Term::resolved_id),
            Some("http://purl.imsglobal.org/vocab/GUID.Type")
        );
        assert_eq!(
            ctx.find_term_by_uri("http://purl.imsglobal.org/vocab/GUID.Type")
                .map(Term::name),
            Some("GUID.Type")
        );
    }

    #[test]
    fn raw_ids_are_keys_too() {
        let ctx = schema_context();
        assert_eq!(ctx.get_term("schema:name").map(Term::name), Some("name"));
    }

    #[test]
    fn cyclic_prefixes_terminate() {
        let mut builder = ContextBuilder::new();
        builder.add_term(Term::new("a", "b:x"));
        builder.add_term(Term::new("b", "a:y"));
        builder.add_term(Term::new("c", "c"));
        let ctx = builder.build();
        assert!(ctx.get_term("a").and_then(Term::resolved_id).is_some());
        assert_eq!(ctx.expand("c"), "c");
    }

    #[test]
    fn lookup_order() {
        let parent = Arc::new({
            let mut builder = ContextBuilder::new();
            builder.add_term(Term::new("name", "http://parent.org/name"));
            builder.add_term(Term::new("only", "http://parent.org/only"));
            builder.build()
        });
        let mut first = ContextBuilder::new();
        first.add_term(Term::new("name", "http://first.org/name"));
        first.add_term(Term::new("shared", "http://first.org/shared"));
        let mut second = ContextBuilder::new();
        second.add_term(Term::new("shared", "http://second.org/shared"));

        let mut builder = ContextBuilder::new().with_parent(Arc::clone(&parent));
        builder.add_term(Term::new("local", "http://local.org/local"));
        builder.add_component(first);
        builder.add_component(second);
        let ctx = builder.build();

        assert_eq!(ctx.expand("local"), "http://local.org/local");
        assert_eq!(ctx.expand("name"), "http://first.org/name");
        assert_eq!(ctx.expand("shared"), "http://second.org/shared");
        assert_eq!(ctx.expand("only"), "http://parent.org/only");
        assert_eq!(ctx.components().len(), 2);
    }

    #[test]
    fn last_declaration_wins() {
        let mut builder = ContextBuilder::new();
        builder.add_term(Term::new("name", "http://a.org/name"));
        builder.add_term(Term::new("name", "http://b.org/name"));
        assert_eq!(builder.terms().len(), 1);
        assert_eq!(builder.build().expand("name"), "http://b.org/name");
    }

    #[test]
    fn ensure_term_is_idempotent() {
        let mut builder = ContextBuilder::new();
        builder.add_term(Term::new("Person", "http://example.org/other#Person"));
        builder.ensure_class("http://schema.org/Person");
        builder.ensure_class("http://schema.org/Person");
        assert_eq!(builder.terms().len(), 2);
        let ctx = builder.build();
        assert_eq!(ctx.short_name("http://schema.org/Person"), Some("Person2"));
        assert!(ctx.find_class("http://schema.org/Person").is_some());
        assert!(ctx.get_term("Person2").is_some_and(Term::is_synthetic));
    }

    #[test]
    fn facts_are_expanded() {
        let mut builder = ContextBuilder::new();
        builder.add_term(Term::new("ex", "http://example.org/"));
        builder.add_term(
            Term::new("Item", "ex:Item").with_class(Class::new("").with_supertype("ex:Base")),
        );
        builder.add_term(
            Term::new("size", "ex:size")
                .with_type("xsd:int")
                .with_property(Property::new(vec!["Item".to_owned()])),
        );
        builder.add_term(Term::new("xsd", "http://www.w3.org/2001/XMLSchema#"));
        builder.add_term(Term::new("ref", "ex:ref").with_type("@id"));
        let ctx = builder.build();

        let class = ctx.find_class("http://example.org/Item").unwrap();
        assert_eq!(class.uri(), "http://example.org/Item");
        assert_eq!(class.supertypes(), ["http://example.org/Base"]);
        assert_eq!(
            ctx.find_property("http://example.org/size").unwrap().domain,
            ["http://example.org/Item"]
        );
        assert_eq!(
            ctx.get_term("size").and_then(Term::resolved_type),
            Some("http://www.w3.org/2001/XMLSchema#int")
        );
        assert_eq!(ctx.get_term("ref").and_then(Term::resolved_type), Some("@id"));
        assert!(ctx.is_sub_class_of("http://example.org/Item", "http://example.org/Base"));
        assert!(ctx.is_enhanced());
    }

    #[test]
    fn thing_alone_is_not_enhanced() {
        let mut builder = ContextBuilder::new();
        builder.ensure_class(ldvalid_vocab::owl::THING.as_str());
        assert!(!builder.build().is_enhanced());
        assert!(!schema_context().is_enhanced());
    }

    #[test]
    fn closed_contexts_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Context>();
    }
}
