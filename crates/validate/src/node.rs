// SPDX-FileCopyrightText: 2024 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::borrow::Cow;
use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Object,
    Container,
    Literal,
    Iri,
    Blank,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Container => "container",
            Self::Literal => "literal",
            Self::Iri => "IRI reference",
            Self::Blank => "blank node",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Expected a node of kind {expected}, but found a {found}")]
    WrongKind { expected: NodeKind, found: NodeKind },

    #[error("Literal '{value}' can not be converted to {target}")]
    NotConvertible { value: String, target: &'static str },
}

/// The value of a literal, in the representation it was parsed from.
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    value: LiteralValue,
    datatype: Option<String>,
    language: Option<String>,
}

impl Literal {
    #[must_use]
    pub const fn new(value: LiteralValue) -> Self {
        Self {
            value,
            datatype: None,
            language: None,
        }
    }

    #[must_use]
    pub fn string<S: Into<String>>(value: S) -> Self {
        Self::new(LiteralValue::String(value.into()))
    }

    #[must_use]
    pub const fn long(value: i64) -> Self {
        Self::new(LiteralValue::Long(value))
    }

    #[must_use]
    pub const fn double(value: f64) -> Self {
        Self::new(LiteralValue::Double(value))
    }

    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::new(LiteralValue::Boolean(value))
    }

    #[must_use]
    pub fn with_datatype<D: Into<String>>(mut self, datatype: D) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    #[must_use]
    pub fn with_language<L: Into<String>>(mut self, language: L) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub const fn value(&self) -> &LiteralValue {
        &self.value
    }

    #[must_use]
    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The lexical (string) form of the value,
    /// which is what facets are checked against.
    #[must_use]
    pub fn lexical(&self) -> Cow<'_, str> {
        match &self.value {
            LiteralValue::String(value) => Cow::Borrowed(value),
            LiteralValue::Long(value) => Cow::Owned(value.to_string()),
            LiteralValue::Double(value) if value.is_nan() => Cow::Borrowed("NaN"),
            LiteralValue::Double(value) if value.is_infinite() => {
                Cow::Borrowed(if value.is_sign_positive() { "INF" } else { "-INF" })
            }
            LiteralValue::Double(value) => Cow::Owned(value.to_string()),
            LiteralValue::Boolean(value) => Cow::Borrowed(if *value { "true" } else { "false" }),
        }
    }

    fn not_convertible(&self, target: &'static str) -> Error {
        Error::NotConvertible {
            value: self.lexical().into_owned(),
            target,
        }
    }

    /// # Errors
    ///
    /// If the value is neither an integer nor a string holding one.
    pub fn as_long(&self) -> Result<i64, Error> {
        match &self.value {
            LiteralValue::Long(value) => Ok(*value),
            LiteralValue::String(value) => value
                .trim()
                .parse()
                .map_err(|_| self.not_convertible("long")),
            LiteralValue::Double(_) | LiteralValue::Boolean(_) => Err(self.not_convertible("long")),
        }
    }

    /// # Errors
    ///
    /// If the value is a boolean or a string not holding a number.
    pub fn as_double(&self) -> Result<f64, Error> {
        match &self.value {
            LiteralValue::Double(value) => Ok(*value),
            LiteralValue::Long(_) | LiteralValue::String(_) => self
                .lexical()
                .trim()
                .parse()
                .map_err(|_| self.not_convertible("double")),
            LiteralValue::Boolean(_) => Err(self.not_convertible("double")),
        }
    }

    /// # Errors
    ///
    /// If the value is neither a boolean nor one of `true`, `false`, `1`, `0`.
    pub fn as_boolean(&self) -> Result<bool, Error> {
        match &self.value {
            LiteralValue::Boolean(value) => Ok(*value),
            LiteralValue::String(value) => match value.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(self.not_convertible("boolean")),
            },
            LiteralValue::Long(_) | LiteralValue::Double(_) => {
                Err(self.not_convertible("boolean"))
            }
        }
    }
}

/// One property value of an object.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// The expanded property identifier.
    pub property: String,
    /// The key as written in the document; used in report paths.
    pub name: String,
    pub value: Node,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectNode {
    pub id: Option<String>,
    /// Expanded `@type` identifiers.
    pub types: Vec<String>,
    pub fields: Vec<Field>,
}

impl ObjectNode {
    pub fn values<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a Node> {
        self.fields
            .iter()
            .filter(move |field| field.property == property)
            .flat_map(|field| match &field.value {
                Node::Container(container) => container.items.iter().collect::<Vec<_>>(),
                single => vec![single],
            })
    }

    /// The number of values given for `property`.
    #[must_use]
    pub fn cardinality(&self, property: &str) -> usize {
        self.values(property).count()
    }

    /// The name under which `property` appears in this object.
    #[must_use]
    pub fn field_name(&self, property: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.property == property)
            .map(|field| field.name.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Ordered
    List,
    /// Unordered
    Set,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContainerNode {
    pub kind: ContainerKind,
    /// The property of the field holding this container.
    pub property: String,
    pub items: Vec<Node>,
}

/// A node of a parsed document.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Object(ObjectNode),
    Container(ContainerNode),
    Literal(Literal),
    /// A reference to another resource.
    Iri(String),
    /// A document-local identifier, like `_:b0`.
    Blank(String),
}

impl Node {
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Object(_) => NodeKind::Object,
            Self::Container(_) => NodeKind::Container,
            Self::Literal(_) => NodeKind::Literal,
            Self::Iri(_) => NodeKind::Iri,
            Self::Blank(_) => NodeKind::Blank,
        }
    }

    fn wrong_kind(&self, expected: NodeKind) -> Error {
        Error::WrongKind {
            expected,
            found: self.kind(),
        }
    }

    /// # Errors
    ///
    /// If this is not an object node.
    pub fn as_object(&self) -> Result<&ObjectNode, Error> {
        match self {
            Self::Object(object) => Ok(object),
            _ => Err(self.wrong_kind(NodeKind::Object)),
        }
    }

    /// # Errors
    ///
    /// If this is not a container node.
    pub fn as_container(&self) -> Result<&ContainerNode, Error> {
        match self {
            Self::Container(container) => Ok(container),
            _ => Err(self.wrong_kind(NodeKind::Container)),
        }
    }

    /// # Errors
    ///
    /// If this is not a literal.
    pub fn as_literal(&self) -> Result<&Literal, Error> {
        match self {
            Self::Literal(literal) => Ok(literal),
            _ => Err(self.wrong_kind(NodeKind::Literal)),
        }
    }

    /// The referenced identifier of an IRI reference or blank node.
    ///
    /// # Errors
    ///
    /// If this is neither an IRI reference nor a blank node.
    pub fn as_reference(&self) -> Result<&str, Error> {
        match self {
            Self::Iri(id) | Self::Blank(id) => Ok(id),
            _ => Err(self.wrong_kind(NodeKind::Iri)),
        }
    }
}
