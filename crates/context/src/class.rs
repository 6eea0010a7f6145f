// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Display;

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DefaultIx, DiGraph, NodeIndex};

use crate::context::Context;
use crate::error::Error;

/// A cardinality constraint narrowed to a specific range type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedRestriction {
    pub range: String,
    pub min_cardinality: u64,
    pub max_cardinality: Option<u64>,
}

impl QualifiedRestriction {
    #[must_use]
    pub fn new<R: Into<String>>(range: R) -> Self {
        Self {
            range: range.into(),
            min_cardinality: 0,
            max_cardinality: None,
        }
    }

    #[must_use]
    pub const fn with_min(mut self, min: u64) -> Self {
        self.min_cardinality = min;
        self
    }

    #[must_use]
    pub const fn with_max(mut self, max: u64) -> Self {
        self.max_cardinality = Some(max);
        self
    }
}

/// A cardinality/range restriction of a class on one property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Restriction {
    /// The class declaring this restriction.
    pub class: String,
    pub property: String,
    pub min_cardinality: u64,
    /// `None` means unbounded.
    pub max_cardinality: Option<u64>,
    pub all_values_from: Option<String>,
    pub qualified: Vec<QualifiedRestriction>,
}

impl Restriction {
    #[must_use]
    pub fn new<C: Into<String>, P: Into<String>>(class: C, property: P) -> Self {
        Self {
            class: class.into(),
            property: property.into(),
            min_cardinality: 0,
            max_cardinality: None,
            all_values_from: None,
            qualified: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_min(mut self, min: u64) -> Self {
        self.min_cardinality = min;
        self
    }

    #[must_use]
    pub const fn with_max(mut self, max: u64) -> Self {
        self.max_cardinality = Some(max);
        self
    }

    #[must_use]
    pub fn with_all_values_from<R: Into<String>>(mut self, range: R) -> Self {
        self.all_values_from = Some(range.into());
        self
    }

    #[must_use]
    pub fn with_qualified(mut self, qualified: QualifiedRestriction) -> Self {
        self.qualified.push(qualified);
        self
    }

    /// The single qualified restriction whose upper bound equals our own,
    /// if there is exactly one qualified restriction.
    #[must_use]
    pub fn unambiguous_qualified(&self) -> Option<&QualifiedRestriction> {
        match self.qualified.as_slice() {
            [single] if single.max_cardinality == self.max_cardinality => Some(single),
            _ => None,
        }
    }

    fn expanded<F: Fn(&str) -> String>(&self, class: &str, expand: &F) -> Self {
        Self {
            class: class.to_owned(),
            property: expand(&self.property),
            min_cardinality: self.min_cardinality,
            max_cardinality: self.max_cardinality,
            all_values_from: self.all_values_from.as_deref().map(expand),
            qualified: self
                .qualified
                .iter()
                .map(|qualified| QualifiedRestriction {
                    range: expand(&qualified.range),
                    ..qualified.clone()
                })
                .collect(),
        }
    }
}

/// Class facts: supertypes and per-property restrictions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    uri: String,
    /// May contain forward references; resolved on use.
    supertypes: Vec<String>,
    /// At most one per property, in declaration order.
    restrictions: Vec<Restriction>,
}

impl Class {
    #[must_use]
    pub fn new<U: Into<String>>(uri: U) -> Self {
        Self {
            uri: uri.into(),
            supertypes: Vec::new(),
            restrictions: Vec::new(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn add_supertype<S: Into<String>>(&mut self, supertype: S) {
        let supertype = supertype.into();
        if !self.supertypes.contains(&supertype) {
            self.supertypes.push(supertype);
        }
    }

    #[must_use]
    pub fn with_supertype<S: Into<String>>(mut self, supertype: S) -> Self {
        self.add_supertype(supertype);
        self
    }

    pub fn restrictions(&self) -> impl Iterator<Item = &Restriction> {
        self.restrictions.iter()
    }

    #[must_use]
    pub fn restriction(&self, property: &str) -> Option<&Restriction> {
        self.restrictions
            .iter()
            .find(|restriction| restriction.property == property)
    }

    /// Adds a restriction; its owning class is set to this class.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateRestriction`
    /// if this class already restricts the same property.
    pub fn add_restriction(&mut self, mut restriction: Restriction) -> Result<(), Error> {
        if self.restriction(&restriction.property).is_some() {
            return Err(Error::DuplicateRestriction {
                class: self.uri.clone(),
                property: restriction.property,
            });
        }
        restriction.class.clone_from(&self.uri);
        self.restrictions.push(restriction);
        Ok(())
    }

    /// Same as [`Self::add_restriction`], builder style.
    ///
    /// # Errors
    ///
    /// See [`Self::add_restriction`].
    pub fn with_restriction(mut self, restriction: Restriction) -> Result<Self, Error> {
        self.add_restriction(restriction)?;
        Ok(self)
    }

    /// All the URIs this class refers to:
    /// supertypes, restricted properties and restriction ranges.
    #[must_use]
    pub fn referenced_uris(&self) -> Vec<&str> {
        let mut uris: Vec<&str> = self.supertypes.iter().map(String::as_str).collect();
        for restriction in &self.restrictions {
            uris.push(&restriction.property);
            uris.extend(restriction.all_values_from.as_deref());
            uris.extend(restriction.qualified.iter().map(|q| q.range.as_str()));
        }
        uris
    }

    pub(crate) fn expanded<F: Fn(&str) -> String>(&self, uri: &str, expand: &F) -> Self {
        Self {
            uri: uri.to_owned(),
            supertypes: self.supertypes.iter().map(|s| expand(s)).collect(),
            restrictions: self
                .restrictions
                .iter()
                .map(|restriction| restriction.expanded(uri, expand))
                .collect(),
        }
    }
}

/// One candidate answer of [`Context::infer_qualified_property_type`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedCandidate {
    /// The class declaring the restriction.
    pub class: String,
    pub range: String,
    pub min_cardinality: u64,
    pub max_cardinality: Option<u64>,
}

impl QualifiedCandidate {
    fn new(class: &str, qualified: &QualifiedRestriction) -> Self {
        Self {
            class: class.to_owned(),
            range: qualified.range.clone(),
            min_cardinality: qualified.min_cardinality,
            max_cardinality: qualified.max_cardinality,
        }
    }
}

impl Display for QualifiedCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let max = self
            .max_cardinality
            .map_or_else(|| "*".to_owned(), |max| max.to_string());
        write!(
            f,
            "{} -> {} [{}..{max}]",
            self.class, self.range, self.min_cardinality
        )
    }
}

/// Two or more qualified restrictions from unrelated class branches
/// imply different ranges for the same property.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Ambiguous qualified restrictions of class '{class}' on property '{property}': {}", join_candidates(.candidates))]
pub struct AmbiguousRestriction {
    pub class: String,
    pub property: String,
    pub candidates: Vec<QualifiedCandidate>,
}

fn join_candidates(candidates: &[QualifiedCandidate]) -> String {
    candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The subclass relation over all classes visible in a context,
/// as a directed graph (edges point from subclass to supertype).
#[derive(Clone, Debug, Default)]
pub struct ClassHierarchy {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex<DefaultIx>>,
}

impl ClassHierarchy {
    pub(crate) fn build<'a, I: Iterator<Item = &'a Class>>(classes: I) -> Self {
        let mut hierarchy = Self::default();
        for class in classes {
            let sub = hierarchy.node(class.uri());
            for supertype in class.supertypes() {
                let sup = hierarchy.node(supertype);
                hierarchy.graph.update_edge(sub, sup, ());
            }
        }
        hierarchy
    }

    fn node(&mut self, uri: &str) -> NodeIndex<DefaultIx> {
        if let Some(idx) = self.nodes.get(uri) {
            return *idx;
        }
        let idx = self.graph.add_node(uri.to_owned());
        self.nodes.insert(uri.to_owned(), idx);
        idx
    }

    /// Whether `sup` is reachable from `sub` (reflexive).
    /// Terminates on cyclic and diamond-shaped hierarchies.
    #[must_use]
    pub fn reaches(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        match (self.nodes.get(sub), self.nodes.get(sup)) {
            (Some(from), Some(to)) => has_path_connecting(&self.graph, *from, *to, None),
            _ => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

impl Context {
    /// Whether `sub` is `sup` or a (transitive) subclass of it.
    #[must_use]
    pub fn is_sub_class_of(&self, sub: &str, sup: &str) -> bool {
        self.hierarchy.reaches(sub, sup)
    }

    /// Whether `sup` is a proper (transitive) supertype of `class`.
    #[must_use]
    pub fn has_super_type(&self, class: &str, sup: &str) -> bool {
        self.find_class(class).is_some_and(|class| {
            class
                .supertypes()
                .iter()
                .any(|direct| self.hierarchy.reaches(direct, sup))
        })
    }

    /// Breadth-first walk over `class_uri` and all its ancestors,
    /// visiting every class at most once.
    fn ancestors_and_self<'a>(&'a self, class_uri: &str) -> Vec<&'a Class> {
        let Some(start) = self.find_class(class_uri) else {
            return Vec::new();
        };
        let mut visited: HashSet<&'a str> = HashSet::from([start.uri()]);
        let mut queue: VecDeque<&'a str> = VecDeque::from([start.uri()]);
        let mut classes = Vec::new();
        while let Some(uri) = queue.pop_front() {
            let Some(class) = self.find_class(uri) else {
                continue;
            };
            classes.push(class);
            for supertype in class.supertypes() {
                if visited.insert(supertype.as_str()) {
                    queue.push_back(supertype);
                }
            }
        }
        classes
    }

    /// The restriction on `property` declared by `class_uri`,
    /// or by its nearest ancestor declaring one.
    #[must_use]
    pub fn find_restriction(&self, class_uri: &str, property: &str) -> Option<&Restriction> {
        self.ancestors_and_self(class_uri)
            .into_iter()
            .find_map(|class| class.restriction(property))
    }

    /// All restrictions applying to instances of `class_uri`,
    /// one per property, the nearest declaration winning.
    #[must_use]
    pub fn restrictions_in_scope(&self, class_uri: &str) -> Vec<&Restriction> {
        let mut seen = HashSet::new();
        let mut restrictions = Vec::new();
        for class in self.ancestors_and_self(class_uri) {
            for restriction in class.restrictions() {
                if seen.insert(restriction.property.as_str()) {
                    restrictions.push(restriction);
                }
            }
        }
        restrictions
    }

    /// Infers the most specific range of `property` on instances of `class_uri`,
    /// as implied by qualified cardinality restrictions.
    ///
    /// Returns `Ok(None)` if nothing can be inferred.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousRestriction` if restrictions from unrelated
    /// class branches remain after discarding the less specific ones.
    pub fn infer_qualified_property_type(
        &self,
        class_uri: &str,
        property: &str,
    ) -> Result<Option<String>, AmbiguousRestriction> {
        let Some(class) = self.find_class(class_uri) else {
            return Ok(None);
        };
        if let Some(qualified) = class
            .restriction(property)
            .and_then(Restriction::unambiguous_qualified)
        {
            return Ok(Some(qualified.range.clone()));
        }

        let mut candidates = self.collect_qualified_candidates(class, property);
        match candidates.len() {
            0 => Ok(None),
            1 => Ok(candidates.pop().map(|candidate| candidate.range)),
            _ => Err(AmbiguousRestriction {
                class: class_uri.to_owned(),
                property: property.to_owned(),
                candidates,
            }),
        }
    }

    /// Walks the ancestors of `class`, starting at its direct supertypes.
    /// An ancestor with a matching restriction becomes a candidate,
    /// and its own ancestors are not searched any further.
    fn collect_qualified_candidates(
        &self,
        class: &Class,
        property: &str,
    ) -> Vec<QualifiedCandidate> {
        let mut candidates = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([class.uri()]);
        let mut stack: Vec<&str> = class.supertypes().iter().rev().map(String::as_str).collect();
        while let Some(uri) = stack.pop() {
            if !visited.insert(uri) {
                continue;
            }
            let Some(ancestor) = self.find_class(uri) else {
                continue;
            };
            match ancestor
                .restriction(property)
                .and_then(Restriction::unambiguous_qualified)
            {
                Some(qualified) => {
                    self.add_candidate(&mut candidates, QualifiedCandidate::new(uri, qualified));
                }
                None => stack.extend(ancestor.supertypes().iter().rev().map(String::as_str)),
            }
        }
        candidates
    }

    /// Adds `candidate`, unless an already present one is at least as specific;
    /// drops every present candidate that the new one is more specific than.
    fn add_candidate(&self, candidates: &mut Vec<QualifiedCandidate>, candidate: QualifiedCandidate) {
        if candidates
            .iter()
            .any(|present| self.is_sub_class_of(&present.class, &candidate.class))
        {
            tracing::trace!("Discarding less specific candidate {candidate}");
            return;
        }
        candidates.retain(|present| !self.is_sub_class_of(&candidate.class, &present.class));
        candidates.push(candidate);
    }
}
