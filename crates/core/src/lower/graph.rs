//! Serializable lowering: the JSON node graph sent to remote renderers.

use super::{is_preformatted, rendered_children};
use crate::error::Diagnostics;
use crate::frontmatter::Frontmatter;
use crate::hast::{Element, FRAGMENT_NAME, Node, PropValue};
use crate::transform::DEFAULT_TAG_PREFIX;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Node of the wire format: `{type:"text", value}` or
/// `{type:"element", name, props?, children?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphNode {
    /// Text run.
    Text {
        /// Text content.
        value: String,
    },
    /// Element, component, or `Fragment`.
    Element {
        /// Prefixed built-in or custom component name.
        name: String,
        /// Decoded attributes; omitted when empty.
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        props: Map<String, JsonValue>,
        /// Children; omitted when empty.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<GraphNode>,
    },
}

impl GraphNode {
    /// Element name, if this is an element.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Element { name, .. } => Some(name),
            Self::Text { .. } => None,
        }
    }

    /// Children of an element; empty for text.
    pub fn children(&self) -> &[GraphNode] {
        match self {
            Self::Element { children, .. } => children,
            Self::Text { .. } => &[],
        }
    }
}

/// A compiled document in serializable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledDocument {
    /// Root element wrapping the document.
    pub tree: GraphNode,
    /// Frontmatter; omitted when the document had none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<Frontmatter>,
}

impl CompiledDocument {
    /// Serialize to the wire JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse the wire JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Maps a build-time local asset path to an absolute URL.
pub trait LocalAssetResolver {
    /// Returns the URL for `path`, or `None` if it cannot be served remotely.
    fn resolve(&self, path: &str) -> Option<String>;
}

impl<F> LocalAssetResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, path: &str) -> Option<String> {
        (self)(path)
    }
}

/// Resolver that knows no local assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocalAssets;

impl LocalAssetResolver for NoLocalAssets {
    fn resolve(&self, _path: &str) -> Option<String> {
        None
    }
}

/// A graph plus the diagnostics raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphLowering {
    /// The serializable document.
    pub document: CompiledDocument,
    /// Dropped attributes and similar recovered conditions.
    pub diagnostics: Diagnostics,
}

/// Lowers a tree without local asset resolution.
///
/// Local asset attributes are dropped; use [`lower_to_graph_with`] to resolve
/// them or to inspect the diagnostics.
pub fn lower_to_graph(root: &Element, frontmatter: Option<Frontmatter>) -> CompiledDocument {
    lower_to_graph_with(root, frontmatter, &NoLocalAssets, DEFAULT_TAG_PREFIX).document
}

/// Lowers a tree into the wire format, resolving local assets through `assets`.
///
/// `prefix` is the tag prefix the tree was compiled with.
pub fn lower_to_graph_with(
    root: &Element,
    frontmatter: Option<Frontmatter>,
    assets: &dyn LocalAssetResolver,
    prefix: &str,
) -> GraphLowering {
    let mut lowering = GraphBuilder {
        assets,
        prefix,
        diagnostics: Diagnostics::new(),
    };
    let tree = lowering.element(root, false);
    GraphLowering {
        document: CompiledDocument {
            tree,
            frontmatter: frontmatter.filter(|map| !map.is_empty()),
        },
        diagnostics: lowering.diagnostics,
    }
}

struct GraphBuilder<'a> {
    assets: &'a dyn LocalAssetResolver,
    prefix: &'a str,
    diagnostics: Diagnostics,
}

impl GraphBuilder<'_> {
    fn element(&mut self, element: &Element, preformatted: bool) -> GraphNode {
        let preformatted = preformatted || is_preformatted(&element.name, self.prefix);
        let mut props = Map::new();
        for (key, value) in &element.props {
            if let Some(value) = self.prop(&element.name, key, value) {
                props.insert(key.clone(), value);
            }
        }
        GraphNode::Element {
            name: element.name.clone(),
            props,
            children: self.children(&element.children, preformatted),
        }
    }

    fn children(&mut self, children: &[Node], preformatted: bool) -> Vec<GraphNode> {
        rendered_children(children, preformatted, self.prefix)
            .into_iter()
            .map(|(child, _)| match child {
                Node::Text(value) => GraphNode::Text {
                    value: value.clone(),
                },
                Node::Element(element) => self.element(element, preformatted),
                Node::Fragment(nodes) => GraphNode::Element {
                    name: FRAGMENT_NAME.to_string(),
                    props: Map::new(),
                    children: self.children(nodes, preformatted),
                },
            })
            .collect()
    }

    fn prop(&mut self, element: &str, key: &str, value: &PropValue) -> Option<JsonValue> {
        match value {
            PropValue::Literal(literal) => Some(literal.clone()),
            PropValue::Expression(source) => Some(JsonValue::String(source.clone())),
            PropValue::LocalAsset(reference) => match self.assets.resolve(&reference.path) {
                Some(url) => Some(JsonValue::String(url)),
                None => {
                    log::warn!(
                        "Local asset `{}` on <{element}> has no remote URL; `{key}` dropped",
                        reference.path
                    );
                    self.diagnostics.warn(format!(
                        "Local asset \"{}\" cannot be serialized; `{key}` removed from <{element}>",
                        reference.path
                    ));
                    None
                }
            },
        }
    }
}
