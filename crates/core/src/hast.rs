//! Typed element tree the passes operate on.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Name of the pseudo-element that groups children without a wrapper.
pub const FRAGMENT_NAME: &str = "Fragment";

/// A path that the host module system must load at build time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalAssetReference {
    /// Path as written by the author, e.g. `./a.png`.
    pub path: String,
}

/// Attribute value on an element.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// A literal (string, number, boolean, null, or a JSON array/object).
    Literal(JsonValue),
    /// Source text of an attribute expression that is not a JSON literal.
    Expression(String),
    /// Deferred local load.
    LocalAsset(LocalAssetReference),
}

impl PropValue {
    /// String literal value.
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(JsonValue::String(value.into()))
    }

    /// Returns the string when this is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Literal(JsonValue::String(value)) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Literal(JsonValue::Bool(value))
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

/// Element attributes, ordered by name.
pub type Props = BTreeMap<String, PropValue>;

/// An element with a tag or component name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Tag (`p`, `html.p`) or component name (`Note`).
    pub name: String,
    /// Attributes.
    pub props: Props,
    /// Ordered children.
    pub children: Vec<Node>,
}

impl Element {
    /// Element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: Props::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Builder-style children setter.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }
}

/// Node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Element or component.
    Element(Element),
    /// Text run.
    Text(String),
    /// Children rendered without a wrapping element.
    Fragment(Vec<Node>),
}

impl Node {
    /// Text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Whitespace-only text (empty strings included).
    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, Self::Text(value) if value.trim().is_empty())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// Visits `element` and every nested element, parents before children.
///
/// Fragments are transparent: their element children are visited as if they
/// belonged to the enclosing element.
pub fn visit_elements_mut(element: &mut Element, visitor: &mut dyn FnMut(&mut Element)) {
    visitor(element);
    visit_children_mut(&mut element.children, visitor);
}

fn visit_children_mut(children: &mut [Node], visitor: &mut dyn FnMut(&mut Element)) {
    for child in children {
        match child {
            Node::Element(element) => visit_elements_mut(element, visitor),
            Node::Fragment(nodes) => visit_children_mut(nodes, visitor),
            Node::Text(_) => {}
        }
    }
}

/// Concatenated text content of a subtree.
pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(value) => out.push_str(value),
            Node::Element(element) => collect_text(&element.children, out),
            Node::Fragment(children) => collect_text(children, out),
        }
    }
}
