//! Conversion from markdown-rs mdast into the element tree.
//!
//! Output follows the HTML mapping used by mdast-util-to-hast: block siblings
//! are separated by `"\n"` text nodes, tight list items unwrap their
//! paragraphs, task items carry a disabled checkbox, and footnote
//! definitions are gathered into a trailing `section.footnotes`.

use crate::hast::{Element, Node, PropValue};
use markdown::mdast::{self, AlignKind, AttributeContent, AttributeValue, ReferenceKind};
use std::collections::HashMap;

/// Element tree and hoisted ESM produced from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    /// Root `div` wrapping every top-level block.
    pub root: Element,
    /// `import`/`export` statements, in document order.
    pub esm: Vec<String>,
}

/// Converts a parsed document into an element tree.
pub fn mdast_to_tree(root: &mdast::Node) -> Converted {
    let mut ctx = ConvertContext::default();
    collect_definitions(root, &mut ctx);

    let mut children = match root {
        mdast::Node::Root(root) => ctx.block_children(&root.children, false),
        other => {
            let mut out = Vec::new();
            ctx.convert(other, &mut out);
            out
        }
    };

    if let Some(section) = ctx.footnote_section() {
        if !children.is_empty() {
            children.push(Node::text("\n"));
        }
        children.push(section.into());
    }

    Converted {
        root: Element::new("div").with_children(children),
        esm: ctx.esm,
    }
}

#[derive(Default)]
struct ConvertContext {
    definitions: HashMap<String, (String, Option<String>)>,
    footnote_definitions: HashMap<String, Vec<mdast::Node>>,
    footnote_order: Vec<String>,
    footnote_refs: HashMap<String, usize>,
    esm: Vec<String>,
}

fn collect_definitions(node: &mdast::Node, ctx: &mut ConvertContext) {
    match node {
        mdast::Node::Definition(definition) => {
            ctx.definitions
                .entry(definition.identifier.clone())
                .or_insert_with(|| (definition.url.clone(), definition.title.clone()));
        }
        mdast::Node::FootnoteDefinition(definition) => {
            ctx.footnote_definitions
                .entry(definition.identifier.clone())
                .or_insert_with(|| definition.children.clone());
        }
        _ => {}
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, ctx);
        }
    }
}

/// Joins block nodes with line breaks, also at both ends when `loose`.
fn wrap(nodes: Vec<Node>, loose: bool) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len() * 2 + 1);
    if loose {
        out.push(Node::text("\n"));
    }
    let had_nodes = !nodes.is_empty();
    for (index, node) in nodes.into_iter().enumerate() {
        if index > 0 {
            out.push(Node::text("\n"));
        }
        out.push(node);
    }
    if loose && had_nodes {
        out.push(Node::text("\n"));
    }
    out
}

fn footnote_id(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

impl ConvertContext {
    fn all(&mut self, children: &[mdast::Node]) -> Vec<Node> {
        let mut out = Vec::new();
        for child in children {
            self.convert(child, &mut out);
        }
        out
    }

    fn block_children(&mut self, children: &[mdast::Node], loose: bool) -> Vec<Node> {
        let converted = self.all(children);
        wrap(converted, loose)
    }

    fn element(&mut self, name: &str, children: &[mdast::Node]) -> Element {
        Element::new(name).with_children(self.all(children))
    }

    fn convert(&mut self, node: &mdast::Node, out: &mut Vec<Node>) {
        match node {
            mdast::Node::Root(root) => out.extend(self.all(&root.children)),
            mdast::Node::Text(text) => out.push(Node::text(text.value.clone())),
            mdast::Node::Paragraph(paragraph) => {
                out.push(self.element("p", &paragraph.children).into())
            }
            mdast::Node::Heading(heading) => {
                let name = format!("h{}", heading.depth);
                out.push(self.element(&name, &heading.children).into());
            }
            mdast::Node::Emphasis(emphasis) => {
                out.push(self.element("em", &emphasis.children).into())
            }
            mdast::Node::Strong(strong) => {
                out.push(self.element("strong", &strong.children).into())
            }
            mdast::Node::Delete(delete) => out.push(self.element("del", &delete.children).into()),
            mdast::Node::InlineCode(code) => out.push(
                Element::new("code")
                    .with_children(vec![Node::text(code.value.clone())])
                    .into(),
            ),
            mdast::Node::Break(_) => {
                out.push(Element::new("br").into());
                out.push(Node::text("\n"));
            }
            mdast::Node::ThematicBreak(_) => out.push(Element::new("hr").into()),
            mdast::Node::Blockquote(quote) => {
                let children = self.block_children(&quote.children, true);
                out.push(Element::new("blockquote").with_children(children).into());
            }
            mdast::Node::Code(code) => out.push(convert_code(code).into()),
            mdast::Node::Math(math) => {
                let value = if math.value.is_empty() {
                    String::new()
                } else {
                    format!("{}\n", math.value)
                };
                let code = Element::new("code")
                    .with_prop("className", "language-math math-display")
                    .with_children(vec![Node::text(value)]);
                out.push(Element::new("pre").with_children(vec![code.into()]).into());
            }
            mdast::Node::InlineMath(math) => out.push(
                Element::new("code")
                    .with_prop("className", "language-math math-inline")
                    .with_children(vec![Node::text(math.value.clone())])
                    .into(),
            ),
            mdast::Node::Link(link) => {
                let mut element = self.element("a", &link.children);
                element.props.insert("href".into(), PropValue::string(&link.url));
                if let Some(title) = &link.title {
                    element.props.insert("title".into(), PropValue::string(title));
                }
                out.push(element.into());
            }
            mdast::Node::Image(image) => {
                out.push(image_element(&image.url, &image.alt, image.title.as_deref()).into())
            }
            mdast::Node::LinkReference(reference) => self.convert_link_reference(reference, out),
            mdast::Node::ImageReference(reference) => {
                match self.definitions.get(&reference.identifier) {
                    Some((url, title)) => {
                        out.push(image_element(url, &reference.alt, title.as_deref()).into())
                    }
                    None => out.push(Node::text(format!(
                        "![{}]{}",
                        reference.alt,
                        reference_suffix(&reference.reference_kind, reference.label.as_deref())
                    ))),
                }
            }
            mdast::Node::List(list) => out.push(self.convert_list(list).into()),
            mdast::Node::ListItem(item) => {
                let loose = item.spread;
                out.push(self.convert_list_item(item, loose).into());
            }
            mdast::Node::Table(table) => out.push(self.convert_table(table).into()),
            mdast::Node::FootnoteReference(reference) => {
                out.push(self.convert_footnote_reference(&reference.identifier).into())
            }
            mdast::Node::Html(html) => {
                log::debug!("Raw HTML kept as literal text: {}", html.value);
                out.push(Node::text(html.value.clone()));
            }
            mdast::Node::MdxJsxFlowElement(element) => out.push(self.convert_jsx(
                element.name.as_deref(),
                &element.attributes,
                &element.children,
            )),
            mdast::Node::MdxJsxTextElement(element) => out.push(self.convert_jsx(
                element.name.as_deref(),
                &element.attributes,
                &element.children,
            )),
            mdast::Node::MdxjsEsm(esm) => self.esm.push(esm.value.clone()),
            mdast::Node::MdxFlowExpression(expression) => {
                log::debug!("Dropping MDX expression `{{{}}}`", expression.value);
            }
            mdast::Node::MdxTextExpression(expression) => {
                log::debug!("Dropping MDX expression `{{{}}}`", expression.value);
            }
            mdast::Node::Definition(_)
            | mdast::Node::FootnoteDefinition(_)
            | mdast::Node::Yaml(_)
            | mdast::Node::Toml(_) => {}
            mdast::Node::TableRow(_) | mdast::Node::TableCell(_) => {
                log::warn!("Table row or cell outside of a table; skipped");
            }
        }
    }

    fn convert_link_reference(&mut self, reference: &mdast::LinkReference, out: &mut Vec<Node>) {
        let children = self.all(&reference.children);
        match self.definitions.get(&reference.identifier) {
            Some((url, title)) => {
                let mut element = Element::new("a").with_prop("href", url.as_str());
                if let Some(title) = title {
                    element.props.insert("title".into(), PropValue::string(title));
                }
                out.push(element.with_children(children).into());
            }
            None => {
                out.push(Node::text("["));
                out.extend(children);
                out.push(Node::text(format!(
                    "]{}",
                    reference_suffix(&reference.reference_kind, reference.label.as_deref())
                )));
            }
        }
    }

    fn convert_list(&mut self, list: &mdast::List) -> Element {
        let loose = list.spread || list.children.iter().any(is_loose_item);
        let mut items = Vec::new();
        let mut has_task = false;
        for child in &list.children {
            match child {
                mdast::Node::ListItem(item) => {
                    has_task |= item.checked.is_some();
                    items.push(self.convert_list_item(item, loose).into());
                }
                other => self.convert(other, &mut items),
            }
        }

        let mut element = Element::new(if list.ordered { "ol" } else { "ul" });
        if let Some(start) = list.start.filter(|start| list.ordered && *start != 1) {
            element
                .props
                .insert("start".into(), PropValue::Literal(start.into()));
        }
        if has_task {
            element
                .props
                .insert("className".into(), PropValue::string("contains-task-list"));
        }
        element.with_children(wrap(items, true))
    }

    fn convert_list_item(&mut self, item: &mdast::ListItem, loose: bool) -> Element {
        let mut converted = self.all(&item.children);
        let mut element = Element::new("li");

        if let Some(checked) = item.checked {
            element
                .props
                .insert("className".into(), PropValue::string("task-list-item"));
            let input = Element::new("input")
                .with_prop("type", "checkbox")
                .with_prop("checked", checked)
                .with_prop("disabled", true);
            if !matches!(converted.first(), Some(Node::Element(e)) if e.name == "p") {
                converted.insert(0, Element::new("p").into());
            }
            if let Some(Node::Element(head)) = converted.first_mut() {
                if !head.children.is_empty() {
                    head.children.insert(0, Node::text(" "));
                }
                head.children.insert(0, input.into());
            }
        }

        let mut children = Vec::new();
        let count = converted.len();
        let last_is_paragraph = matches!(converted.last(), Some(Node::Element(e)) if e.name == "p");
        for (index, child) in converted.into_iter().enumerate() {
            let is_paragraph = matches!(&child, Node::Element(e) if e.name == "p");
            if loose || index != 0 || !is_paragraph {
                children.push(Node::text("\n"));
            }
            match child {
                Node::Element(paragraph) if is_paragraph && !loose => {
                    children.extend(paragraph.children)
                }
                other => children.push(other),
            }
        }
        if count > 0 && (loose || !last_is_paragraph) {
            children.push(Node::text("\n"));
        }

        element.with_children(children)
    }

    fn convert_table(&mut self, table: &mdast::Table) -> Element {
        let mut rows = table.children.iter().filter_map(|row| match row {
            mdast::Node::TableRow(row) => Some(row),
            _ => None,
        });

        let mut sections = Vec::new();
        if let Some(head) = rows.next() {
            let row = self.convert_table_row(head, "th", &table.align);
            sections.push(Element::new("thead").with_children(wrap(vec![row.into()], true)).into());
        }
        let body: Vec<Node> = rows
            .map(|row| self.convert_table_row(row, "td", &table.align).into())
            .collect();
        if !body.is_empty() {
            sections.push(Element::new("tbody").with_children(wrap(body, true)).into());
        }

        Element::new("table").with_children(wrap(sections, true))
    }

    fn convert_table_row(
        &mut self,
        row: &mdast::TableRow,
        cell_name: &str,
        aligns: &[AlignKind],
    ) -> Element {
        let mut cells = Vec::new();
        for (index, cell) in row.children.iter().enumerate() {
            let mdast::Node::TableCell(cell) = cell else {
                continue;
            };
            let mut element = self.element(cell_name, &cell.children);
            let align = match aligns.get(index) {
                Some(AlignKind::Left) => Some("left"),
                Some(AlignKind::Right) => Some("right"),
                Some(AlignKind::Center) => Some("center"),
                Some(AlignKind::None) | None => None,
            };
            if let Some(align) = align {
                element.props.insert("align".into(), PropValue::string(align));
            }
            cells.push(element.into());
        }
        Element::new("tr").with_children(wrap(cells, true))
    }

    fn convert_footnote_reference(&mut self, identifier: &str) -> Element {
        let id = footnote_id(identifier);
        let ordinal = match self.footnote_order.iter().position(|known| known == identifier) {
            Some(position) => position + 1,
            None => {
                self.footnote_order.push(identifier.to_string());
                self.footnote_order.len()
            }
        };
        let count = self.footnote_refs.entry(identifier.to_string()).or_insert(0);
        *count += 1;
        let suffix = if *count == 1 {
            String::new()
        } else {
            format!("-{}", count)
        };

        let link = Element::new("a")
            .with_prop("href", format!("#user-content-fn-{id}"))
            .with_prop("id", format!("user-content-fnref-{id}{suffix}"))
            .with_prop("dataFootnoteRef", true)
            .with_prop("ariaDescribedBy", "footnote-label")
            .with_children(vec![Node::text(ordinal.to_string())]);
        Element::new("sup").with_children(vec![link.into()])
    }

    fn footnote_section(&mut self) -> Option<Element> {
        if self.footnote_order.is_empty() {
            return None;
        }

        let mut items = Vec::new();
        let order = std::mem::take(&mut self.footnote_order);
        for (index, identifier) in order.iter().enumerate() {
            let Some(definition) = self.footnote_definitions.get(identifier).cloned() else {
                log::warn!("Footnote `{identifier}` is referenced but never defined");
                continue;
            };
            let id = footnote_id(identifier);
            let mut content = self.all(&definition);
            let backref = Element::new("a")
                .with_prop("href", format!("#user-content-fnref-{id}"))
                .with_prop("dataFootnoteBackref", "")
                .with_prop("ariaLabel", format!("Back to reference {}", index + 1))
                .with_prop("className", "data-footnote-backref")
                .with_children(vec![Node::text("↩")]);
            match content.last_mut() {
                Some(Node::Element(paragraph)) if paragraph.name == "p" => {
                    paragraph.children.push(Node::text(" "));
                    paragraph.children.push(backref.into());
                }
                _ => content.push(backref.into()),
            }
            items.push(
                Element::new("li")
                    .with_prop("id", format!("user-content-fn-{id}"))
                    .with_children(wrap(content, true))
                    .into(),
            );
        }

        let heading = Element::new("h2")
            .with_prop("id", "footnote-label")
            .with_prop("className", "sr-only")
            .with_children(vec![Node::text("Footnotes")]);
        let list = Element::new("ol").with_children(wrap(items, true));
        Some(
            Element::new("section")
                .with_prop("dataFootnotes", true)
                .with_prop("className", "footnotes")
                .with_children(wrap(vec![heading.into(), list.into()], true)),
        )
    }

    fn convert_jsx(
        &mut self,
        name: Option<&str>,
        attributes: &[AttributeContent],
        children: &[mdast::Node],
    ) -> Node {
        let children = self.all(children);
        let Some(name) = name else {
            return Node::Fragment(children);
        };

        let mut element = Element::new(name);
        for attribute in attributes {
            match attribute {
                AttributeContent::Property(property) => {
                    element.props.insert(
                        property.name.clone(),
                        jsx_attribute_value(property.value.as_ref()),
                    );
                }
                AttributeContent::Expression(expression) => {
                    log::debug!(
                        "Spread attribute `{{{}}}` on <{name}> is not supported",
                        expression.value
                    );
                }
            }
        }
        element.with_children(children).into()
    }
}

fn is_loose_item(node: &mdast::Node) -> bool {
    matches!(node, mdast::Node::ListItem(item) if item.spread)
}

fn convert_code(code: &mdast::Code) -> Element {
    let value = if code.value.is_empty() {
        String::new()
    } else {
        format!("{}\n", code.value)
    };
    let mut inner = Element::new("code").with_children(vec![Node::text(value)]);
    if let Some(lang) = &code.lang {
        inner
            .props
            .insert("className".into(), PropValue::string(format!("language-{lang}")));
    }
    Element::new("pre").with_children(vec![inner.into()])
}

fn image_element(url: &str, alt: &str, title: Option<&str>) -> Element {
    let mut element = Element::new("img")
        .with_prop("src", url)
        .with_prop("alt", alt);
    if let Some(title) = title {
        element.props.insert("title".into(), PropValue::string(title));
    }
    element
}

fn reference_suffix(kind: &ReferenceKind, label: Option<&str>) -> String {
    match kind {
        ReferenceKind::Shortcut => String::new(),
        ReferenceKind::Collapsed => "[]".to_string(),
        ReferenceKind::Full => format!("[{}]", label.unwrap_or_default()),
    }
}

/// Attribute value as written on a JSX tag.
///
/// A bare attribute is `true`; an expression that is a JSON literal is decoded,
/// anything else keeps its source text.
pub fn jsx_attribute_value(value: Option<&AttributeValue>) -> PropValue {
    match value {
        None => PropValue::Literal(true.into()),
        Some(AttributeValue::Literal(literal)) => PropValue::string(literal),
        Some(AttributeValue::Expression(expression)) => {
            match serde_json::from_str(expression.value.trim()) {
                Ok(literal) => PropValue::Literal(literal),
                Err(_) => PropValue::Expression(expression.value.clone()),
            }
        }
    }
}
