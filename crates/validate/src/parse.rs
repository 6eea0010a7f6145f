// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use ldvalid_context::{Container, Context, Term};
use ldvalid_vocab::xsd;
use serde_json::{Map, Value};

use crate::node::{ContainerKind, ContainerNode, Field, Literal, LiteralValue, Node, ObjectNode};

const KEY_CONTEXT: &str = "@context";
const KEY_GRAPH: &str = "@graph";
const KEY_ID: &str = "@id";
const KEY_TYPE: &str = "@type";
const KEY_VALUE: &str = "@value";
const KEY_LANGUAGE: &str = "@language";
const KEY_LIST: &str = "@list";
const KEY_SET: &str = "@set";
const BLANK_PREFIX: &str = "_:";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to parse the document at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        let message = message
            .rfind(" at line ")
            .and_then(|idx| message.get(..idx))
            .unwrap_or(&message)
            .to_owned();
        Self {
            line: err.line(),
            column: err.column(),
            message,
        }
    }
}

/// Turns JSON-LD documents into [`Node`] trees,
/// expanding every key and type through a closed context.
pub struct DocumentParser<'c> {
    context: &'c Context,
}

impl<'c> DocumentParser<'c> {
    #[must_use]
    pub const fn new(context: &'c Context) -> Self {
        Self { context }
    }

    /// # Errors
    ///
    /// If `json` is not valid JSON.
    pub fn parse_str(&self, json: &str) -> Result<Node, ParseError> {
        let document: Value = serde_json::from_str(json)?;
        Ok(self.parse_value(&document))
    }

    /// # Errors
    ///
    /// If `json` is not valid JSON.
    pub fn parse_slice(&self, json: &[u8]) -> Result<Node, ParseError> {
        let document: Value = serde_json::from_slice(json)?;
        Ok(self.parse_value(&document))
    }

    /// Parses an already read JSON document.
    /// A top-level array or `@graph` becomes a set container.
    #[must_use]
    pub fn parse_value(&self, document: &Value) -> Node {
        match document {
            Value::Array(items) => self.top_level_set(items),
            Value::Object(object) => match object.get(KEY_GRAPH) {
                Some(Value::Array(items)) => self.top_level_set(items),
                _ => Node::Object(self.parse_object(object)),
            },
            other => self
                .parse_item(None, other)
                .unwrap_or_else(|| Node::Object(ObjectNode::default())),
        }
    }

    fn top_level_set(&self, items: &[Value]) -> Node {
        Node::Container(ContainerNode {
            kind: ContainerKind::Set,
            property: KEY_GRAPH.to_owned(),
            items: items
                .iter()
                .filter_map(|item| self.parse_item(None, item))
                .collect(),
        })
    }

    fn expand(&self, key: &str) -> String {
        self.context.expand(key).into_owned()
    }

    fn reference(&self, id: &str) -> Node {
        if id.starts_with(BLANK_PREFIX) {
            Node::Blank(id.to_owned())
        } else {
            Node::Iri(self.expand(id))
        }
    }

    fn parse_object(&self, object: &Map<String, Value>) -> ObjectNode {
        let mut node = ObjectNode::default();
        for (key, value) in object {
            match key.as_str() {
                KEY_CONTEXT => tracing::debug!("Ignoring embedded {KEY_CONTEXT}"),
                KEY_ID => match value {
                    Value::String(id) if id.starts_with(BLANK_PREFIX) => node.id = Some(id.clone()),
                    Value::String(id) => node.id = Some(self.expand(id)),
                    _ => tracing::warn!("Ignoring non-string {KEY_ID}: {value}"),
                },
                KEY_TYPE => {
                    let types = match value {
                        Value::Array(types) => types.iter().collect(),
                        single => vec![single],
                    };
                    for type_ in types {
                        match type_ {
                            Value::String(type_) => node.types.push(self.expand(type_)),
                            _ => tracing::warn!("Ignoring non-string {KEY_TYPE}: {type_}"),
                        }
                    }
                }
                keyword if keyword.starts_with('@') => {
                    tracing::debug!("Ignoring unsupported keyword '{keyword}'");
                }
                name => {
                    let term = self.context.get_term(name);
                    let property = self.expand(name);
                    if let Some(value) = self.parse_field_value(term, &property, value) {
                        node.fields.push(Field {
                            property,
                            name: name.to_owned(),
                            value,
                        });
                    }
                }
            }
        }
        node
    }

    fn parse_field_value(&self, term: Option<&Term>, property: &str, value: &Value) -> Option<Node> {
        let container = |kind, items: &Vec<Value>| {
            Node::Container(ContainerNode {
                kind,
                property: property.to_owned(),
                items: items
                    .iter()
                    .filter_map(|item| self.parse_item(term, item))
                    .collect(),
            })
        };
        match value {
            Value::Array(items) => {
                let kind = match term.map(Term::container) {
                    Some(Container::List) => ContainerKind::List,
                    Some(Container::Set | Container::None) | None => ContainerKind::Set,
                };
                Some(container(kind, items))
            }
            Value::Object(object) => match (object.get(KEY_LIST), object.get(KEY_SET)) {
                (Some(Value::Array(items)), _) => Some(container(ContainerKind::List, items)),
                (_, Some(Value::Array(items))) => Some(container(ContainerKind::Set, items)),
                _ => self.parse_item(term, value),
            },
            _ => self.parse_item(term, value),
        }
    }

    /// The declared `@type` of a term, unless it is a keyword.
    fn term_datatype(term: Option<&Term>) -> Option<&str> {
        term.and_then(Term::resolved_type)
            .filter(|type_| !type_.starts_with('@'))
    }

    fn parse_item(&self, term: Option<&Term>, value: &Value) -> Option<Node> {
        let datatype = Self::term_datatype(term);
        match value {
            Value::Null => None,
            Value::Object(object) if object.contains_key(KEY_VALUE) => self.parse_value_object(term, object),
            Value::Object(object) => Some(Node::Object(self.parse_object(object))),
            Value::Array(items) => Some(Node::Container(ContainerNode {
                kind: ContainerKind::Set,
                property: String::new(),
                items: items
                    .iter()
                    .filter_map(|item| self.parse_item(term, item))
                    .collect(),
            })),
            Value::String(text) => {
                let type_ = term.and_then(Term::resolved_type);
                if matches!(type_, Some("@id" | "@vocab")) {
                    return Some(self.reference(text));
                }
                let mut literal = Literal::string(text.as_str());
                if let Some(datatype) = datatype {
                    literal = literal.with_datatype(datatype);
                }
                if let Some(language) = term.and_then(Term::language) {
                    literal = literal.with_language(language);
                }
                Some(Node::Literal(literal))
            }
            Value::Number(number) => {
                let (literal, default_type) = number.as_i64().map_or_else(
                    || {
                        (
                            Literal::double(number.as_f64().unwrap_or(f64::NAN)),
                            xsd::DOUBLE,
                        )
                    },
                    |long| (Literal::long(long), xsd::INTEGER),
                );
                Some(Node::Literal(
                    literal.with_datatype(datatype.unwrap_or(default_type.as_str())),
                ))
            }
            Value::Bool(boolean) => Some(Node::Literal(
                Literal::boolean(*boolean)
                    .with_datatype(datatype.unwrap_or(xsd::BOOLEAN.as_str())),
            )),
        }
    }

    fn parse_value_object(&self, term: Option<&Term>, object: &Map<String, Value>) -> Option<Node> {
        let value = match object.get(KEY_VALUE)? {
            Value::Null => return None,
            Value::String(text) => LiteralValue::String(text.clone()),
            Value::Bool(boolean) => LiteralValue::Boolean(*boolean),
            Value::Number(number) => number.as_i64().map_or_else(
                || LiteralValue::Double(number.as_f64().unwrap_or(f64::NAN)),
                LiteralValue::Long,
            ),
            other => {
                tracing::warn!("Ignoring non-scalar {KEY_VALUE}: {other}");
                return None;
            }
        };
        let mut literal = Literal::new(value);
        let datatype = match object.get(KEY_TYPE) {
            Some(Value::String(type_)) => Some(self.expand(type_)),
            _ => Self::term_datatype(term).map(ToOwned::to_owned),
        };
        if let Some(datatype) = datatype {
            literal = literal.with_datatype(datatype);
        }
        let language = object
            .get(KEY_LANGUAGE)
            .and_then(Value::as_str)
            .or_else(|| term.and_then(Term::language));
        if let Some(language) = language {
            literal = literal.with_language(language);
        }
        Some(Node::Literal(literal))
    }
}
