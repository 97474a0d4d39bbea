//! markdown-rs adapter and the mdast extension seam.

use crate::error::{CompilationError, PassError, SourceLocation};
use markdown::mdast::Node;
use markdown::message::{Message, Place};

/// Constructs enabled when handing a document to markdown-rs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// JSX, ESM, and `{expression}` constructs.
    pub mdx: bool,
    /// Tables, strikethrough, task lists, footnotes, autolink literals.
    pub gfm: bool,
    /// Leading YAML (or TOML) metadata block.
    pub frontmatter: bool,
    /// `$inline$` and `$$block$$` math.
    pub math: bool,
}

impl ParseOptions {
    /// Plain markdown: no JSX or ESM.
    pub const fn markdown() -> Self {
        Self {
            mdx: false,
            gfm: true,
            frontmatter: true,
            math: false,
        }
    }

    /// MDX documents.
    pub const fn mdx() -> Self {
        Self {
            mdx: true,
            gfm: true,
            frontmatter: true,
            math: false,
        }
    }

    /// Same options with math toggled.
    pub const fn with_math(mut self, math: bool) -> Self {
        self.math = math;
        self
    }

    /// Convert to markdown-rs `ParseOptions`.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        // MDX forbids indented code and raw HTML; plain markdown keeps indented code.
        let mut constructs = markdown::Constructs {
            frontmatter: self.frontmatter,
            code_indented: !self.mdx,
            html_flow: !self.mdx,
            html_text: !self.mdx,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        if self.mdx {
            constructs.mdx_esm = true;
            constructs.mdx_expression_flow = true;
            constructs.mdx_expression_text = true;
            constructs.mdx_jsx_flow = true;
            constructs.mdx_jsx_text = true;
        }

        if self.math {
            constructs.math_flow = true;
            constructs.math_text = true;
        }

        // Without a parse hook markdown-rs treats import/export lines as paragraphs.
        let mdx_esm_parse: Option<Box<markdown::MdxEsmParse>> = if self.mdx {
            Some(Box::new(|_: &str| markdown::MdxSignal::Ok))
        } else {
            None
        };

        markdown::ParseOptions {
            constructs,
            math_text_single_dollar: self.math,
            mdx_esm_parse,
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::mdx()
    }
}

/// Pass over the parsed mdast, run before conversion to the element tree.
pub trait AstTransform: Send + Sync {
    /// Name reported when the pass fails.
    fn name(&self) -> &str {
        "custom"
    }

    /// Mutate the parsed markdown AST in place.
    fn transform(&self, root: &mut Node) -> Result<(), PassError>;
}

impl<F> AstTransform for F
where
    F: Fn(&mut Node) -> Result<(), PassError> + Send + Sync,
{
    fn transform(&self, root: &mut Node) -> Result<(), PassError> {
        (self)(root)
    }
}

/// Parse markdown into an MDAST tree.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, CompilationError> {
    markdown::to_mdast(input, &options.to_markdown()).map_err(|err| {
        CompilationError::parse_error(err.reason.clone(), message_location(&err))
    })
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}

/// Depth-first visit of every mdast node, parents before children.
pub fn visit_mdast_mut(node: &mut Node, visitor: &mut dyn FnMut(&mut Node)) {
    visitor(node);
    if let Some(children) = node.children_mut() {
        for child in children {
            visit_mdast_mut(child, visitor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mdx_options_enable_jsx_and_disable_raw_html() {
        let options = ParseOptions::mdx().to_markdown();
        assert!(options.constructs.mdx_jsx_flow);
        assert!(options.constructs.mdx_esm);
        assert!(!options.constructs.html_flow);
        assert!(!options.constructs.code_indented);
        assert!(!options.constructs.math_flow);
        assert!(options.mdx_esm_parse.is_some());
        assert!(ParseOptions::markdown().to_markdown().mdx_esm_parse.is_none());
    }

    #[test]
    fn math_toggle_enables_both_math_constructs() {
        let options = ParseOptions::mdx().with_math(true).to_markdown();
        assert!(options.constructs.math_flow);
        assert!(options.constructs.math_text);
    }

    #[test]
    fn parses_jsx_flow_element() {
        let root = parse_mdast("<Note>\n  hi\n</Note>", &ParseOptions::mdx())
            .expect("parse should succeed");
        let children = root.children().expect("root has children");
        assert!(matches!(children[0], Node::MdxJsxFlowElement(_)));

        let inline = parse_mdast("<Note>hi</Note>", &ParseOptions::mdx())
            .expect("parse should succeed");
        let paragraph = &inline.children().expect("root has children")[0];
        assert!(matches!(paragraph, Node::Paragraph(_)));
        assert!(matches!(
            paragraph.children().map(|c| &c[0]),
            Some(Node::MdxJsxTextElement(_))
        ));
    }

    #[test]
    fn esm_blocks_parse_as_esm_nodes() {
        let root = parse_mdast(
            "import {\n  Chart,\n  Legend\n} from './chart.js'\n\n<Chart />",
            &ParseOptions::mdx(),
        )
        .expect("parse should succeed");
        let children = root.children().expect("root has children");
        match &children[0] {
            Node::MdxjsEsm(esm) => assert!(esm.value.ends_with("} from './chart.js'")),
            other => panic!("expected esm node, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_jsx_reports_location() {
        let err = parse_mdast("Text\n\n<Note>", &ParseOptions::mdx()).unwrap_err();
        match err {
            CompilationError::Parse { message, location } => {
                assert!(!message.is_empty());
                assert!(location.line >= 1);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn closures_are_ast_transforms() {
        let strip_headings = |root: &mut Node| -> Result<(), PassError> {
            if let Some(children) = root.children_mut() {
                children.retain(|child| !matches!(child, Node::Heading(_)));
            }
            Ok(())
        };
        let mut root = parse_mdast("# Title\n\nBody", &ParseOptions::mdx())
            .expect("parse should succeed");
        AstTransform::transform(&strip_headings, &mut root).expect("transform should succeed");
        assert_eq!(root.children().map(Vec::len), Some(1));
        assert_eq!(strip_headings.name(), "custom");
    }
}
