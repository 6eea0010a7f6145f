// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use ldvalid_base::AssetRepository;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::class::{Class, QualifiedRestriction, Restriction};
use crate::context::{Context, ContextBuilder};
use crate::datatype::{Datatype, Facets, Pattern, Whitespace};
use crate::error::Error;
use crate::term::{Container, Property, Term};

const KEY_CONTEXT: &str = "@context";

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct QualifiedDef {
    on_class: String,
    #[serde(default)]
    min_cardinality: u64,
    max_cardinality: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct RestrictionDef {
    on_property: String,
    #[serde(default)]
    min_cardinality: u64,
    max_cardinality: Option<u64>,
    all_values_from: Option<String>,
    #[serde(default)]
    qualified_restriction: Vec<QualifiedDef>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ClassDef {
    #[serde(default)]
    supertype: Vec<String>,
    #[serde(default)]
    restriction: Vec<RestrictionDef>,
}

/// Numeric bounds may be given as JSON numbers or as strings.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Bound {
    Number(serde_json::Number),
    Text(String),
}

impl From<Bound> for String {
    fn from(bound: Bound) -> Self {
        match bound {
            Bound::Number(number) => number.to_string(),
            Bound::Text(text) => text,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct DatatypeDef {
    base: Option<String>,
    length: Option<u64>,
    min_length: Option<u64>,
    max_length: Option<u64>,
    pattern: Option<String>,
    whitespace: Option<String>,
    max_inclusive: Option<Bound>,
    min_inclusive: Option<Bound>,
    max_exclusive: Option<Bound>,
    min_exclusive: Option<Bound>,
    total_digits: Option<u32>,
    fraction_digits: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
struct PropertyDef {
    #[serde(default)]
    domain: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TermDef {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@type")]
    type_: Option<String>,
    #[serde(rename = "@language")]
    language: Option<String>,
    #[serde(rename = "@container")]
    container: Option<String>,
    class: Option<ClassDef>,
    datatype: Option<DatatypeDef>,
    property: Option<PropertyDef>,
}

fn invalid<M: ToString>(term: &str, message: M) -> Error {
    Error::InvalidDefinition {
        term: term.to_owned(),
        message: message.to_string(),
    }
}

impl ClassDef {
    fn into_class(self) -> Result<Class, Error> {
        // the URI is filled in when the context gets closed
        let mut class = Class::new("");
        for supertype in self.supertype {
            class.add_supertype(supertype);
        }
        for def in self.restriction {
            let mut restriction =
                Restriction::new("", def.on_property).with_min(def.min_cardinality);
            restriction.max_cardinality = def.max_cardinality;
            restriction.all_values_from = def.all_values_from;
            for qualified in def.qualified_restriction {
                let mut entry =
                    QualifiedRestriction::new(qualified.on_class).with_min(qualified.min_cardinality);
                entry.max_cardinality = qualified.max_cardinality;
                restriction = restriction.with_qualified(entry);
            }
            class.add_restriction(restriction)?;
        }
        Ok(class)
    }
}

impl DatatypeDef {
    fn into_datatype(self, term: &str) -> Result<Datatype, Error> {
        let pattern = self
            .pattern
            .map(|source| {
                Pattern::new(source.as_str()).map_err(|err| Error::InvalidPattern {
                    pattern: source.clone(),
                    message: err.to_string(),
                })
            })
            .transpose()?;
        let whitespace = self
            .whitespace
            .map(|policy| policy.parse::<Whitespace>())
            .transpose()
            .map_err(|msg| invalid(term, msg))?;
        let facets = Facets {
            length: self.length,
            min_length: self.min_length,
            max_length: self.max_length,
            pattern,
            whitespace,
            max_inclusive: self.max_inclusive.map(Into::into),
            min_inclusive: self.min_inclusive.map(Into::into),
            max_exclusive: self.max_exclusive.map(Into::into),
            min_exclusive: self.min_exclusive.map(Into::into),
            total_digits: self.total_digits,
            fraction_digits: self.fraction_digits,
        };
        let datatype = Datatype::new("").with_facets(facets);
        Ok(match self.base {
            Some(base) => datatype.with_base(base),
            None => datatype,
        })
    }
}

/// Parses a single term definition.
/// Returns `None` for terms that are explicitly unset (`null`).
fn read_term(name: &str, value: &Value) -> Result<Option<Term>, Error> {
    let def = match value {
        Value::Null => {
            tracing::debug!("Ignoring unset term '{name}'");
            return Ok(None);
        }
        Value::String(id) => TermDef {
            id: Some(id.clone()),
            ..TermDef::default()
        },
        Value::Object(_) => TermDef::deserialize(value).map_err(|err| invalid(name, err))?,
        Value::Bool(_) | Value::Number(_) | Value::Array(_) => {
            return Err(invalid(
                name,
                "a term definition has to be a string or an object",
            ))
        }
    };

    let mut term = Term::new(name, def.id.unwrap_or_else(|| name.to_owned()));
    if let Some(raw_type) = def.type_ {
        term = term.with_type(raw_type);
    }
    if let Some(language) = def.language {
        term = term.with_language(language);
    }
    if let Some(keyword) = def.container {
        let container = Container::from_keyword(&keyword).ok_or_else(|| {
            invalid(
                name,
                format!("unsupported @container '{keyword}'; expected @list or @set"),
            )
        })?;
        term = term.with_container(container);
    }
    if let Some(class) = def.class {
        term = term.with_class(class.into_class()?);
    }
    if let Some(datatype) = def.datatype {
        term = term.with_datatype(datatype.into_datatype(name)?);
    }
    if let Some(property) = def.property {
        term = term.with_property(Property::new(property.domain));
    }
    Ok(Some(term))
}

/// Reads JSON-LD context documents into closed [`Context`]s.
///
/// External contexts (referenced by URI) are loaded
/// through the optional [`AssetRepository`].
#[derive(Default)]
pub struct ContextReader<'r> {
    repository: Option<&'r dyn AssetRepository>,
    parent: Option<Arc<Context>>,
}

impl<'r> ContextReader<'r> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_repository(mut self, repository: &'r dyn AssetRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// All contexts read will inherit the terms of `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: Arc<Context>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Reads a context document from JSON text.
    ///
    /// # Errors
    ///
    /// - `Error::Parse` if the text is not valid JSON
    /// - any error of [`Self::read_value`]
    pub fn read_str(&self, json: &str) -> Result<Context, Error> {
        let value: Value = serde_json::from_str(json)?;
        self.read_value(&value)
    }

    /// Reads a context document from JSON bytes.
    ///
    /// # Errors
    ///
    /// See [`Self::read_str`].
    pub fn read_slice(&self, json: &[u8]) -> Result<Context, Error> {
        let value: Value = serde_json::from_slice(json)?;
        self.read_value(&value)
    }

    /// Reads a context from an already parsed document.
    /// If the document has no `@context` key,
    /// the whole document is taken to be the context.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDefinition` or `Error::InvalidPattern` for malformed terms
    /// - `Error::DuplicateRestriction` if a class restricts a property twice
    /// - `Error::NoRepository`, `Error::Asset` or `Error::Cyclic`
    ///   if an external context could not be loaded
    pub fn read_value(&self, document: &Value) -> Result<Context, Error> {
        let mut builder = self.read_document(document, &mut Vec::new())?;
        if let Some(parent) = &self.parent {
            builder.set_parent(Arc::clone(parent));
        }
        Ok(builder.build())
    }

    /// Loads the context document identified by `uri` through the repository.
    ///
    /// # Errors
    ///
    /// See [`Self::read_value`].
    pub fn read_uri(&self, uri: &str) -> Result<Context, Error> {
        let mut builder = self.load_external(uri, &mut Vec::new())?;
        if let Some(parent) = &self.parent {
            builder.set_parent(Arc::clone(parent));
        }
        Ok(builder.build())
    }

    fn read_document(
        &self,
        document: &Value,
        loading: &mut Vec<String>,
    ) -> Result<ContextBuilder, Error> {
        let mut builder = ContextBuilder::new();
        match document.as_object().and_then(|doc| doc.get(KEY_CONTEXT)) {
            Some(context) => self.fill(&mut builder, context, loading)?,
            None => self.fill(&mut builder, document, loading)?,
        }
        Ok(builder)
    }

    fn fill(
        &self,
        builder: &mut ContextBuilder,
        context: &Value,
        loading: &mut Vec<String>,
    ) -> Result<(), Error> {
        match context {
            Value::Null => {}
            Value::Object(terms) => Self::add_terms(builder, terms)?,
            Value::String(uri) => builder.add_component(self.load_external(uri, loading)?),
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Null => {}
                        // inline definitions see the terms of the external contexts
                        Value::Object(terms) => Self::add_terms(builder, terms)?,
                        Value::String(uri) => {
                            builder.add_component(self.load_external(uri, loading)?);
                        }
                        Value::Bool(_) | Value::Number(_) | Value::Array(_) => {
                            return Err(invalid(
                                KEY_CONTEXT,
                                "array entries have to be context objects or URIs",
                            ));
                        }
                    }
                }
            }
            Value::Bool(_) | Value::Number(_) => {
                return Err(invalid(
                    KEY_CONTEXT,
                    "has to be an object, a URI or an array of these",
                ));
            }
        }
        Ok(())
    }

    fn add_terms(builder: &mut ContextBuilder, terms: &Map<String, Value>) -> Result<(), Error> {
        for (name, value) in terms {
            if name.starts_with('@') {
                tracing::warn!("Ignoring unsupported context keyword '{name}'");
                continue;
            }
            if let Some(term) = read_term(name, value)? {
                builder.add_term(term);
            }
        }
        Ok(())
    }

    fn load_external(&self, uri: &str, loading: &mut Vec<String>) -> Result<ContextBuilder, Error> {
        if loading.iter().any(|current| current == uri) {
            return Err(Error::Cyclic {
                uri: uri.to_owned(),
            });
        }
        let repository = self.repository.ok_or_else(|| Error::NoRepository {
            uri: uri.to_owned(),
        })?;
        tracing::debug!("Loading external context '{uri}' ...");
        let content = repository.load(uri)?;
        let document: Value = serde_json::from_slice(&content)?;
        loading.push(uri.to_owned());
        let builder = self.read_document(&document, loading);
        loading.pop();
        Ok(builder?.with_id(uri))
    }
}
