//! Lowering of the transformed tree into generated source or a node graph.

mod graph;
mod source;

pub use graph::{
    CompiledDocument, GraphLowering, GraphNode, LocalAssetResolver, NoLocalAssets, lower_to_graph,
    lower_to_graph_with,
};
pub use source::{SourceOptions, js_string_literal, lower_to_source};

use crate::hast::Node;
use crate::order::{OrderMetadata, sibling_order};
use crate::transform::strip_prefix;

/// Formatting text between blocks: whitespace-only and spanning a line break.
fn is_formatting_whitespace(node: &Node) -> bool {
    matches!(node, Node::Text(value) if value.contains('\n') && value.trim().is_empty())
}

/// Tags whose whitespace is content.
fn is_preformatted(name: &str, prefix: &str) -> bool {
    matches!(strip_prefix(name, prefix), "pre" | "code")
}

/// Children that will actually be emitted, paired with their order metadata.
fn rendered_children<'a>(
    children: &'a [Node],
    preformatted: bool,
    prefix: &str,
) -> Vec<(&'a Node, OrderMetadata)> {
    let kept: Vec<&Node> = children
        .iter()
        .filter(|child| preformatted || !is_formatting_whitespace(child))
        .collect();
    let order = sibling_order(kept.iter().map(|child| match child {
        Node::Element(element) => Some(strip_prefix(&element.name, prefix)),
        Node::Fragment(_) => Some(crate::hast::FRAGMENT_NAME),
        Node::Text(_) => None,
    }));
    kept.into_iter().zip(order).collect()
}
