//! Renders a compiled document to HTML.
//!
//! Prefixed names resolve through the built-in keys; unprefixed names resolve
//! through the merged namespace. An unknown capitalized component renders its
//! children bare and produces one diagnostic per name per render. An unknown
//! lowercase name is an error. A broken image source becomes a placeholder.

use crate::asset::{AssetRegistry, AssetResolver};
use crate::components::{Component, ComponentMap, Props, RenderContext};
use crate::error::RenderError;
use crate::namespace::ComponentScopes;
use crate::styles::{StyleMap, StyleScopes};
use natmdx_core::transform::strip_prefix;
use natmdx_core::{
    CompiledDocument, DEFAULT_TAG_PREFIX, Diagnostics, FRAGMENT_NAME, GraphNode, OrderMetadata,
    sibling_order,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Device pixel ratio assumed when none is configured.
pub const DEFAULT_PIXEL_RATIO: f64 = 1.0;

/// HTML plus what went wrong along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    /// Rendered markup.
    pub html: String,
    /// Missing components, placeholder images.
    pub diagnostics: Diagnostics,
}

/// Graph renderer with a fixed namespace, styles, and asset registry.
pub struct Renderer {
    components: ComponentMap,
    styles: StyleMap,
    registry: AssetRegistry,
    pixel_ratio: f64,
    prefix: String,
}

impl Renderer {
    /// Renderer over the default components.
    pub fn new() -> Self {
        Self::with_scopes(&ComponentScopes::new())
    }

    /// Renderer over the merged `scopes`.
    pub fn with_scopes(scopes: &ComponentScopes) -> Self {
        Self {
            components: scopes.merged(),
            styles: StyleMap::new(),
            registry: AssetRegistry::new(),
            pixel_ratio: DEFAULT_PIXEL_RATIO,
            prefix: DEFAULT_TAG_PREFIX.to_string(),
        }
    }

    /// Applies per-render overrides over the namespace.
    pub fn with_overrides(mut self, overrides: ComponentMap) -> Self {
        self.components.extend(overrides);
        self
    }

    /// Uses the merged `styles`.
    pub fn with_styles(mut self, styles: &StyleScopes) -> Self {
        self.styles = styles.merged();
        self
    }

    /// Resolves numeric image sources through `registry` at `pixel_ratio`.
    pub fn with_assets(mut self, registry: AssetRegistry, pixel_ratio: f64) -> Self {
        self.registry = registry;
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// Tag prefix the document was compiled with.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Renders `document`.
    pub fn render(&self, document: &CompiledDocument) -> Result<RenderOutput, RenderError> {
        let assets = AssetResolver::new(&self.registry, self.pixel_ratio);
        let mut pass = RenderPass {
            renderer: self,
            assets: &assets,
            diagnostics: Diagnostics::new(),
            reported: BTreeSet::new(),
        };
        let root = OrderMetadata {
            index: 0,
            first_child: true,
            last_child: true,
            first_of_type: true,
            prev_sibling_name: natmdx_core::order::ROOT_SIBLING_NAME.to_string(),
        };
        let html = pass.node(&document.tree, &root)?;
        Ok(RenderOutput {
            html,
            diagnostics: pass.diagnostics,
        })
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

struct RenderPass<'r> {
    renderer: &'r Renderer,
    assets: &'r AssetResolver<'r>,
    diagnostics: Diagnostics,
    reported: BTreeSet<String>,
}

impl RenderPass<'_> {
    fn node(&mut self, node: &GraphNode, order: &OrderMetadata) -> Result<String, RenderError> {
        let (name, props, children) = match node {
            GraphNode::Text { value } => return Ok(html_escape::encode_text(value).into_owned()),
            GraphNode::Element {
                name,
                props,
                children,
            } => (name, props, children),
        };
        if name == FRAGMENT_NAME {
            return self.children(children);
        }

        let prefix = self.renderer.prefix.as_str();
        let builtin = !prefix.is_empty() && name.starts_with(prefix);
        let key = strip_prefix(name, prefix);
        let Some(component) = self.lookup(key, builtin)? else {
            return self.children(children);
        };

        let inner = self.children(children)?;
        let ctx = RenderContext {
            name: key,
            order,
            style: self.renderer.styles.get(key),
            assets: self.assets,
        };
        match component.render(&ctx, props, &inner) {
            Err(RenderError::Asset(err)) => Ok(self.placeholder(key, props, &err.to_string())),
            other => other,
        }
    }

    fn lookup(
        &mut self,
        key: &str,
        builtin: bool,
    ) -> Result<Option<Arc<dyn Component>>, RenderError> {
        if let Some(component) = self.renderer.components.get(key) {
            return Ok(Some(Arc::clone(component)));
        }
        if builtin || key.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(RenderError::MissingBuiltin {
                name: key.to_string(),
            });
        }
        if self.reported.insert(key.to_string()) {
            log::warn!(
                "No component found for \"{key}\". Provide it via overrides or ComponentScopes."
            );
            self.diagnostics
                .warn(format!("No component found for \"{key}\"; rendered its children"));
        }
        Ok(None)
    }

    fn children(&mut self, children: &[GraphNode]) -> Result<String, RenderError> {
        let prefix = self.renderer.prefix.as_str();
        let order = sibling_order(children.iter().map(|child| match child {
            GraphNode::Element { name, .. } => Some(strip_prefix(name, prefix)),
            GraphNode::Text { .. } => None,
        }));
        let mut html = String::new();
        for (child, order) in children.iter().zip(&order) {
            html.push_str(&self.node(child, order)?);
        }
        Ok(html)
    }

    fn placeholder(&mut self, key: &str, props: &Props, reason: &str) -> String {
        log::warn!("Rendering placeholder for <{key}>: {reason}");
        self.diagnostics.warn(format!("<{key}> replaced by a placeholder: {reason}"));
        let label = props.get("alt").and_then(|alt| alt.as_str()).unwrap_or("image");
        format!(
            "<span data-missing-asset=\"true\">[{}]</span>",
            html_escape::encode_text(label)
        )
    }
}
