//! Executable-source lowering: an ES module building the tree with `_jsx`.

use super::{is_preformatted, rendered_children};
use crate::frontmatter::Frontmatter;
use crate::hast::{Element, Node, PropValue};
use crate::order::{OrderMetadata, ROOT_SIBLING_NAME};
use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite;

/// Converts a Rust string to a JavaScript string literal.
///
/// Uses JSON serialization to properly escape special characters.
///
/// ```
/// use natmdx_core::lower::js_string_literal;
///
/// assert_eq!(js_string_literal("say \"hi\""), "\"say \\\"hi\\\"\"");
/// ```
pub fn js_string_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Settings for one generated module.
#[derive(Debug, Clone, Copy)]
pub struct SourceOptions<'a> {
    /// Module exporting `useMDXComponents`.
    pub component_library: &'a str,
    /// Package providing `jsx-runtime`, e.g. `react`.
    pub jsx_import_source: &'a str,
    /// Prefix marking built-in tags.
    pub tag_prefix: &'a str,
}

impl Default for SourceOptions<'_> {
    fn default() -> Self {
        Self {
            component_library: "@natmdx/runtime",
            jsx_import_source: "react",
            tag_prefix: "html.",
        }
    }
}

const LAYOUT_BINDING: &str = "MDXLayout";

/// Emits an ES module whose default export renders `root`.
///
/// The generated `_createMdxContent` merges `props.components` over
/// `useMDXComponents()`, resolves prefixed names through the built-in
/// lookup (which throws for unknown keys) and custom names through a
/// lookup that falls back to a warning and a `span`.
pub fn lower_to_source(
    root: &Element,
    frontmatter: Option<&Frontmatter>,
    esm: &[String],
    options: &SourceOptions<'_>,
) -> String {
    let (statements, has_layout) = rewrite_default_export(esm);
    let bound = bound_identifiers(&statements);

    let mut code = String::new();
    emit_imports(&mut code, options, &statements);
    emit_frontmatter(&mut code, frontmatter);
    emit_lookup_helpers(&mut code);

    let lowering = SourceLowering {
        prefix: options.tag_prefix,
        bound: &bound,
    };
    let root_order = OrderMetadata {
        index: 0,
        first_child: true,
        last_child: true,
        first_of_type: true,
        prev_sibling_name: ROOT_SIBLING_NAME.to_string(),
    };
    let mut tree = String::new();
    lowering.emit_element(&mut tree, root, &root_order, false);

    let _ = writeln!(code, "function _createMdxContent(props) {{");
    let _ = writeln!(
        code,
        "  const components = {{...useMDXComponents(), ...props.components}};"
    );
    let _ = writeln!(code, "  return {};", tree);
    let _ = writeln!(code, "}}");

    emit_default_export(&mut code, has_layout);
    code
}

fn emit_imports(code: &mut String, options: &SourceOptions<'_>, statements: &[String]) {
    let _ = writeln!(
        code,
        "import {{useMDXComponents}} from {};",
        js_string_literal(options.component_library)
    );
    let runtime = format!("{}/jsx-runtime", options.jsx_import_source);
    let _ = writeln!(
        code,
        "import {{Fragment as _Fragment, jsx as _jsx, jsxs as _jsxs}} from {};",
        js_string_literal(&runtime)
    );
    for statement in statements {
        let _ = writeln!(code, "{}", statement);
    }
}

fn emit_frontmatter(code: &mut String, frontmatter: Option<&Frontmatter>) {
    let literal = frontmatter
        .and_then(|map| serde_json::to_string(map).ok())
        .unwrap_or_else(|| "undefined".to_string());
    let _ = writeln!(code, "export const frontmatter = {};", literal);
}

fn emit_lookup_helpers(code: &mut String) {
    let _ = writeln!(code, "function _builtinComponent(components, name) {{");
    let _ = writeln!(code, "  const component = components[name];");
    let _ = writeln!(code, "  if (component === undefined) {{");
    let _ = writeln!(
        code,
        "    throw new Error(\"No MDX component found for key: \" + JSON.stringify(name) + \". Define it using the React provider: <MDXComponents components={{{{ \" + name + \": ... }}}} />\");"
    );
    let _ = writeln!(code, "  }}");
    let _ = writeln!(code, "  return component;");
    let _ = writeln!(code, "}}");
    let _ = writeln!(code, "function _customComponent(components, name) {{");
    let _ = writeln!(code, "  const component = components[name];");
    let _ = writeln!(code, "  if (component !== undefined) return component;");
    let _ = writeln!(code, "  return function MissingComponent(props) {{");
    let _ = writeln!(
        code,
        "    console.warn(\"Component \" + name + \" was not imported, exported, or provided by MDXProvider as global scope\");"
    );
    let _ = writeln!(
        code,
        "    return _jsx(_builtinComponent(components, \"span\"), props);"
    );
    let _ = writeln!(code, "  }};");
    let _ = writeln!(code, "}}");
}

fn emit_default_export(code: &mut String, has_layout: bool) {
    let _ = writeln!(code, "export default function MDXContent(props = {{}}) {{");
    if has_layout {
        let _ = writeln!(
            code,
            "  return _jsx({LAYOUT_BINDING}, {{...props, children: _jsx(_createMdxContent, {{...props}})}});"
        );
    } else {
        let _ = writeln!(
            code,
            "  const Wrapper = {{...useMDXComponents(), ...props.components}}.Wrapper;"
        );
        let _ = writeln!(
            code,
            "  return Wrapper ? _jsx(Wrapper, {{...props, children: _jsx(_createMdxContent, {{...props}})}}) : _createMdxContent(props);"
        );
    }
    let _ = writeln!(code, "}}");
}

/// Turns `export default <expr>` into a `MDXLayout` binding.
fn rewrite_default_export(esm: &[String]) -> (Vec<String>, bool) {
    let mut has_layout = false;
    let statements = esm
        .iter()
        .map(|block| {
            block
                .lines()
                .map(|line| {
                    let trimmed = line.trim_start();
                    match trimmed.strip_prefix("export default ") {
                        Some(rest) if !has_layout => {
                            has_layout = true;
                            format!("const {LAYOUT_BINDING} = {rest}")
                        }
                        _ => line.to_string(),
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();
    (statements, has_layout)
}

/// Local names bound by `import` and `export const|let|function|class`.
fn bound_identifiers(blocks: &[String]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for statement in esm_statements(blocks) {
        if let Some(rest) = statement.strip_prefix("import ") {
            collect_import_bindings(rest, &mut names);
        } else if let Some(rest) = statement.strip_prefix("export ") {
            let rest = rest.trim_start();
            for keyword in ["const ", "let ", "var ", "function ", "class "] {
                if let Some(decl) = rest.strip_prefix(keyword) {
                    if let Some(name) = leading_identifier(decl) {
                        names.insert(name.to_string());
                    }
                    break;
                }
            }
        } else if let Some(rest) = statement.strip_prefix(&format!("const {LAYOUT_BINDING}")) {
            if rest.trim_start().starts_with('=') {
                names.insert(LAYOUT_BINDING.to_string());
            }
        }
    }
    names
}

/// Splits ESM blocks into top-level statements, one line each.
///
/// A statement ends at `;` or where the next `import`/`export` line begins,
/// so a clause formatted over several lines is seen whole.
fn esm_statements(blocks: &[String]) -> Vec<String> {
    const STARTS: [&str; 3] = ["import ", "export ", "const "];
    let mut statements: Vec<String> = Vec::new();
    for block in blocks {
        let mut open = false;
        for line in block.lines() {
            for piece in line.split_inclusive(';') {
                let ended = piece.ends_with(';');
                let piece = piece.trim().trim_end_matches(';').trim_end();
                if !piece.is_empty() {
                    let starts = STARTS.iter().any(|start| piece.starts_with(start));
                    match statements.last_mut() {
                        Some(current) if open && !starts => {
                            current.push(' ');
                            current.push_str(piece);
                        }
                        _ => statements.push(piece.to_string()),
                    }
                    open = true;
                }
                if ended {
                    open = false;
                }
            }
        }
    }
    statements
}

fn collect_import_bindings(clause: &str, names: &mut BTreeSet<String>) {
    let Some((specifiers, _)) = clause.rsplit_once(" from ") else {
        return;
    };
    let mut rest = specifiers.trim();
    if let Some(named_start) = rest.find('{') {
        let named_end = rest[named_start..]
            .find('}')
            .map_or(rest.len(), |offset| named_start + offset);
        for specifier in rest[named_start + 1..named_end].split(',') {
            let specifier = specifier.trim();
            let local = specifier
                .rsplit_once(" as ")
                .map(|(_, local)| local)
                .unwrap_or(specifier);
            if let Some(name) = leading_identifier(local.trim()) {
                names.insert(name.to_string());
            }
        }
        rest = rest[..named_start].trim_end_matches([' ', ',']);
    }
    if let Some(namespace) = rest.split_once("* as ").map(|(_, ns)| ns) {
        if let Some(name) = leading_identifier(namespace.trim()) {
            names.insert(name.to_string());
        }
        rest = rest.split("* as ").next().unwrap_or_default();
    }
    let default = rest.trim().trim_end_matches(',').trim();
    if let Some(name) = leading_identifier(default) {
        names.insert(name.to_string());
    }
}

fn leading_identifier(text: &str) -> Option<&str> {
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    let name = &text[..end];
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
    starts_ok.then_some(name)
}

struct SourceLowering<'a> {
    prefix: &'a str,
    bound: &'a BTreeSet<String>,
}

impl SourceLowering<'_> {
    fn component_reference(&self, name: &str) -> String {
        if let Some(tag) = name.strip_prefix(self.prefix).filter(|_| !self.prefix.is_empty()) {
            return format!("_builtinComponent(components, {})", js_string_literal(tag));
        }
        let head = name.split('.').next().unwrap_or(name);
        if self.bound.contains(head) {
            return name.to_string();
        }
        if name.starts_with(|c: char| c.is_ascii_lowercase()) {
            format!("_builtinComponent(components, {})", js_string_literal(name))
        } else {
            format!("_customComponent(components, {})", js_string_literal(name))
        }
    }

    fn emit_node(&self, out: &mut String, node: &Node, order: &OrderMetadata, preformatted: bool) {
        match node {
            Node::Text(value) => out.push_str(&js_string_literal(value)),
            Node::Element(element) => self.emit_element(out, element, order, preformatted),
            Node::Fragment(children) => {
                let children = self.children_expression(children, preformatted);
                emit_call(out, "_Fragment", &[], children);
            }
        }
    }

    fn emit_element(
        &self,
        out: &mut String,
        element: &Element,
        order: &OrderMetadata,
        preformatted: bool,
    ) {
        let preformatted = preformatted || is_preformatted(&element.name, self.prefix);
        let mut entries = Vec::with_capacity(element.props.len() + 6);
        for (key, value) in &element.props {
            entries.push((js_string_literal(key), prop_expression(value)));
        }
        entries.push(("components".to_string(), "components".to_string()));
        entries.push(("index".to_string(), order.index.to_string()));
        entries.push(("firstChild".to_string(), order.first_child.to_string()));
        entries.push(("lastChild".to_string(), order.last_child.to_string()));
        entries.push(("firstOfType".to_string(), order.first_of_type.to_string()));
        entries.push((
            "prevSiblingName".to_string(),
            js_string_literal(&order.prev_sibling_name),
        ));

        let children = self.children_expression(&element.children, preformatted);
        emit_call(out, &self.component_reference(&element.name), &entries, children);
    }

    fn children_expression(&self, children: &[Node], preformatted: bool) -> Children {
        let rendered = rendered_children(children, preformatted, self.prefix);
        let mut expressions: Vec<String> = rendered
            .into_iter()
            .map(|(child, order)| {
                let mut expr = String::new();
                self.emit_node(&mut expr, child, &order, preformatted);
                expr
            })
            .collect();
        match expressions.len() {
            0 => Children::None,
            1 => Children::One(expressions.remove(0)),
            _ => Children::Many(expressions),
        }
    }
}

enum Children {
    None,
    One(String),
    Many(Vec<String>),
}

fn emit_call(out: &mut String, component: &str, entries: &[(String, String)], children: Children) {
    let function = if matches!(children, Children::Many(_)) {
        "_jsxs"
    } else {
        "_jsx"
    };
    let mut props: Vec<String> = entries
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();
    match children {
        Children::None => {}
        Children::One(child) => props.push(format!("children: {child}")),
        Children::Many(list) => props.push(format!("children: [{}]", list.join(", "))),
    }
    let _ = write!(out, "{function}({component}, {{{}}})", props.join(", "));
}

fn prop_expression(value: &PropValue) -> String {
    match value {
        PropValue::Literal(literal) => {
            serde_json::to_string(literal).unwrap_or_else(|_| "null".to_string())
        }
        PropValue::Expression(source) => js_string_literal(source),
        PropValue::LocalAsset(reference) => {
            format!("require({})", js_string_literal(&reference.path))
        }
    }
}
