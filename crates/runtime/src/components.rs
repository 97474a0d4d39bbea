//! Components render decoded props and pre-rendered children to HTML.

use crate::asset::{AssetResolver, AssetSource};
use crate::error::RenderError;
use natmdx_core::OrderMetadata;
use natmdx_core::transform::HTML_TAGS;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::sync::Arc;

/// Props as they arrive from the wire graph.
pub type Props = Map<String, JsonValue>;

/// Component key to implementation.
pub type ComponentMap = BTreeMap<String, Arc<dyn Component>>;

/// Everything a component receives besides its props and children.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Key the component was resolved under, without the tag prefix.
    pub name: &'a str,
    /// Position among rendered siblings.
    pub order: &'a OrderMetadata,
    /// Style scoped to this component key, if any.
    pub style: Option<&'a JsonValue>,
    /// Resolver for image sources.
    pub assets: &'a AssetResolver<'a>,
}

/// Something that renders to an HTML string.
pub trait Component: Send + Sync {
    /// Renders with already-rendered `children`.
    fn render(
        &self,
        ctx: &RenderContext<'_>,
        props: &Props,
        children: &str,
    ) -> Result<String, RenderError>;
}

impl<F> Component for F
where
    F: Fn(&RenderContext<'_>, &Props, &str) -> Result<String, RenderError> + Send + Sync,
{
    fn render(
        &self,
        ctx: &RenderContext<'_>,
        props: &Props,
        children: &str,
    ) -> Result<String, RenderError> {
        (self)(ctx, props, children)
    }
}

/// Wraps a closure as a shareable component.
pub fn from_fn<F>(render: F) -> Arc<dyn Component>
where
    F: Fn(&RenderContext<'_>, &Props, &str) -> Result<String, RenderError> + Send + Sync + 'static,
{
    Arc::new(render)
}

const VOID_TAGS: [&str; 6] = ["br", "col", "hr", "img", "input", "wbr"];
const FLUSH_HEADINGS: [&str; 4] = ["h1", "h2", "h3", "h4"];
const UNITLESS: [&str; 7] = [
    "flex",
    "flexGrow",
    "flexShrink",
    "fontWeight",
    "lineHeight",
    "opacity",
    "zIndex",
];

/// A plain HTML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    tag: String,
    flush_first: bool,
}

impl HtmlElement {
    /// Element rendering as `<tag>`.
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let flush_first = FLUSH_HEADINGS.contains(&tag.as_str());
        Self { tag, flush_first }
    }

    /// The rendered tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Component for HtmlElement {
    fn render(
        &self,
        ctx: &RenderContext<'_>,
        props: &Props,
        children: &str,
    ) -> Result<String, RenderError> {
        let mut style = Map::new();
        if self.flush_first && ctx.order.index == 0 {
            style.insert("marginTop".into(), JsonValue::from(0));
        }
        Ok(element_html(&self.tag, props, ctx.style, style, children))
    }
}

/// Renders children with no wrapping element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Component for Passthrough {
    fn render(
        &self,
        _ctx: &RenderContext<'_>,
        _props: &Props,
        children: &str,
    ) -> Result<String, RenderError> {
        Ok(children.to_string())
    }
}

/// `img` resolving `src`/`source` through the asset resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct Image;

impl Component for Image {
    fn render(
        &self,
        ctx: &RenderContext<'_>,
        props: &Props,
        children: &str,
    ) -> Result<String, RenderError> {
        let mut props = props.clone();
        let source = props.remove("source");
        if let Some(value) = props.get("src").cloned().or(source) {
            let source = AssetSource::from_json(&value).ok_or_else(|| {
                crate::error::AssetError::Unresolved {
                    value: value.to_string(),
                }
            })?;
            let resolved = ctx.assets.resolve(&source)?;
            props.insert("src".into(), JsonValue::String(resolved.uri));
            for (key, dimension) in [("width", resolved.width), ("height", resolved.height)] {
                if let Some(dimension) = dimension {
                    props.entry(key).or_insert_with(|| JsonValue::from(dimension));
                }
            }
        }
        Ok(element_html("img", &props, ctx.style, Map::new(), children))
    }
}

/// Namespace for every standard tag plus `Wrapper`, `inlineCode`, and an
/// asset-aware `img`.
pub fn default_components() -> ComponentMap {
    let mut map = ComponentMap::new();
    for tag in HTML_TAGS {
        map.insert((*tag).to_string(), Arc::new(HtmlElement::new(*tag)) as Arc<dyn Component>);
    }
    map.insert("img".into(), Arc::new(Image));
    map.insert("inlineCode".into(), Arc::new(HtmlElement::new("code")));
    map.insert("Wrapper".into(), Arc::new(Passthrough));
    map
}

/// Renders `<tag ...>children</tag>` with escaped attributes.
///
/// `base_style` is the scoped style and `extra_style` is applied over it;
/// a `style` prop wins over both.
pub fn element_html(
    tag: &str,
    props: &Props,
    base_style: Option<&JsonValue>,
    extra_style: Map<String, JsonValue>,
    children: &str,
) -> String {
    let mut style = match base_style {
        Some(JsonValue::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    style.extend(extra_style);
    if let Some(JsonValue::Object(inline)) = props.get("style") {
        style.extend(inline.clone());
    }

    let mut html = format!("<{tag}");
    for (key, value) in props {
        if key == "style" || key == "children" || key == "components" {
            continue;
        }
        push_attribute(&mut html, attribute_name(key), value);
    }
    let css = css_text(&style);
    if !css.is_empty() {
        let _ = write!(
            html,
            " style=\"{}\"",
            html_escape::encode_double_quoted_attribute(&css)
        );
    }
    html.push('>');
    if VOID_TAGS.contains(&tag) {
        return html;
    }
    html.push_str(children);
    let _ = write!(html, "</{tag}>");
    html
}

fn attribute_name(key: &str) -> &str {
    match key {
        "className" => "class",
        "htmlFor" => "for",
        "ariaDescribedBy" => "aria-describedby",
        "dataFootnoteRef" => "data-footnote-ref",
        "dataFootnoteBackref" => "data-footnote-backref",
        "dataFootnotes" => "data-footnotes",
        other => other,
    }
}

fn push_attribute(html: &mut String, name: &str, value: &JsonValue) {
    let text = match value {
        JsonValue::Null | JsonValue::Bool(false) => return,
        JsonValue::Bool(true) => {
            let _ = write!(html, " {name}");
            return;
        }
        JsonValue::String(text) => text.clone(),
        JsonValue::Number(number) => number.to_string(),
        JsonValue::Array(items) if items.iter().all(JsonValue::is_string) => items
            .iter()
            .filter_map(JsonValue::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    };
    let _ = write!(
        html,
        " {name}=\"{}\"",
        html_escape::encode_double_quoted_attribute(&text)
    );
}

fn css_text(style: &Map<String, JsonValue>) -> String {
    let mut css = String::new();
    for (key, value) in style {
        let value = match value {
            JsonValue::Number(number) if !UNITLESS.contains(&key.as_str()) => {
                format!("{number}px")
            }
            JsonValue::Number(number) => number.to_string(),
            JsonValue::String(text) => text.clone(),
            _ => continue,
        };
        if !css.is_empty() {
            css.push(' ');
        }
        let _ = write!(css, "{}: {value};", kebab_case(key));
    }
    css
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetRegistry;
    use crate::error::AssetError;
    use natmdx_core::sibling_order;
    use serde_json::json;

    fn props(value: JsonValue) -> Props {
        match value {
            JsonValue::Object(map) => map,
            _ => Props::new(),
        }
    }

    fn render(
        component: &dyn Component,
        index: usize,
        props: &Props,
        children: &str,
    ) -> Result<String, RenderError> {
        let registry = AssetRegistry::new();
        let assets = AssetResolver::new(&registry, 1.0);
        let orders = sibling_order([Some("h1"), Some("h1")]);
        let ctx = RenderContext {
            name: "test",
            order: &orders[index],
            style: None,
            assets: &assets,
        };
        component.render(&ctx, props, children)
    }

    #[test]
    fn attributes_are_mapped_and_escaped() {
        let html = render(
            &HtmlElement::new("a"),
            1,
            &props(json!({
                "href": "/x?a=1&b=\"2\"",
                "className": ["one", "two"],
                "hidden": true,
                "draft": false,
                "style": {"fontSize": 12, "fontWeight": 700}
            })),
            "link",
        )
        .expect("render should succeed");
        insta::assert_snapshot!(html, @r#"<a class="one two" hidden href="/x?a=1&amp;b=&quot;2&quot;" style="font-size: 12px; font-weight: 700;">link</a>"#);
    }

    #[test]
    fn first_heading_drops_top_margin() {
        let heading = HtmlElement::new("h1");
        let first = render(&heading, 0, &Props::new(), "A").expect("render should succeed");
        let second = render(&heading, 1, &Props::new(), "B").expect("render should succeed");
        assert_eq!(first, "<h1 style=\"margin-top: 0px;\">A</h1>");
        assert_eq!(second, "<h1>B</h1>");
    }

    #[test]
    fn void_elements_ignore_children() {
        let html =
            render(&HtmlElement::new("br"), 0, &Props::new(), "x").expect("render should succeed");
        assert_eq!(html, "<br>");
    }

    #[test]
    fn image_resolves_sources() {
        let html = render(&Image, 0, &props(json!({"src": "/a.png", "alt": "A"})), "")
            .expect("render should succeed");
        assert_eq!(html, "<img alt=\"A\" src=\"/a.png\">");

        let err = render(&Image, 0, &props(json!({"src": 4})), "").unwrap_err();
        assert!(matches!(err, RenderError::Asset(AssetError::NotFound { id: 4 })));
    }

    #[test]
    fn closures_are_components() {
        let shout = from_fn(|ctx: &RenderContext<'_>, _props: &Props, children: &str| {
            Ok(format!("{}:{}", ctx.name, children.to_uppercase()))
        });
        assert_eq!(
            render(shout.as_ref(), 0, &Props::new(), "hi").expect("render should succeed"),
            "test:HI"
        );
    }

    #[test]
    fn defaults_cover_html_and_special_keys() {
        let map = default_components();
        for key in ["p", "table", "img", "inlineCode", "Wrapper"] {
            assert!(map.contains_key(key), "missing {key}");
        }
    }
}
