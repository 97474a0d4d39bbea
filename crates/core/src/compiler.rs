//! Configured compile pipeline: parse, mdast passes, frontmatter, conversion,
//! tree passes, then one of the two lowerings.

use crate::convert::mdast_to_tree;
use crate::error::CompilationError;
use crate::frontmatter::{Frontmatter, extract_frontmatter};
use crate::hast::Element;
use crate::lower::{
    CompiledDocument, GraphLowering, LocalAssetResolver, NoLocalAssets, SourceOptions,
    lower_to_graph_with, lower_to_source,
};
use crate::parse::{AstTransform, ParseOptions, parse_mdast};
use crate::transform::{
    BuiltinPass, CodeMetaPass, DEFAULT_TAG_PREFIX, DefaultLocalAssetMatcher, LocalAssetMatcher,
    PrefixTagNames, ResolveLocalAssets, TreePipeline, TreeTransform,
};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Module the generated source imports `useMDXComponents` from by default.
pub const DEFAULT_COMPONENT_LIBRARY: &str = "@natmdx/runtime";

/// Path reported for documents compiled through [`compile_mdx`].
pub const REMOTE_DOCUMENT_PATH: &str = "remote.mdx";

/// Options for [`Compiler::from_config`].
///
/// Every field has a default, so `{}` is a valid JSON configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    /// Prefix given to built-in HTML tags.
    pub tag_prefix: String,
    /// Module exporting `useMDXComponents` in generated source.
    pub component_library: String,
    /// Package whose `jsx-runtime` the generated source imports.
    pub jsx_import_source: String,
    /// Image sources starting with one of these are local assets.
    pub local_asset_prefixes: Vec<String>,
    /// Fold code fence meta strings into the code text.
    pub code_meta: bool,
    /// Parse `$` / `$$` math.
    pub math: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            component_library: DEFAULT_COMPONENT_LIBRARY.to_string(),
            jsx_import_source: "react".to_string(),
            local_asset_prefixes: vec![".".to_string(), "@".to_string()],
            code_meta: false,
            math: false,
        }
    }
}

impl CompilerConfig {
    /// Parse a JSON configuration, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Stable hash of every field, used to key cached compilers.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn source_options(&self) -> SourceOptions<'_> {
        SourceOptions {
            component_library: &self.component_library,
            jsx_import_source: &self.jsx_import_source,
            tag_prefix: &self.tag_prefix,
        }
    }
}

/// Input flavors, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Plain Markdown (`.md`): raw HTML allowed, no JSX or ESM.
    Markdown,
    /// MDX: JSX, ESM, and expressions.
    Mdx,
}

impl DocumentKind {
    /// `.md` and `.markdown` are Markdown; everything else is MDX.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".md") || lower.ends_with(".markdown") {
            Self::Markdown
        } else {
            Self::Mdx
        }
    }
}

/// The transformed tree of one document, before lowering.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    /// Root `div` (prefixed) wrapping the whole document.
    pub root: Element,
    /// Leading YAML block, if any.
    pub frontmatter: Option<Frontmatter>,
    /// Top-level `import`/`export` statements, in document order.
    pub esm: Vec<String>,
    /// Path the document was compiled under.
    pub path: String,
}

/// A reusable compile pipeline.
///
/// Passes hold no per-document state, so one compiler can serve concurrent
/// compiles. Reconfigure by building a new compiler.
pub struct Compiler {
    config: CompilerConfig,
    ast_transforms: Vec<Box<dyn AstTransform>>,
    tree: TreePipeline,
}

impl Compiler {
    /// Builds the pipeline described by `config`.
    pub fn from_config(config: CompilerConfig) -> Self {
        let matcher = DefaultLocalAssetMatcher::new(config.local_asset_prefixes.clone());
        let tree = TreePipeline::new(
            PrefixTagNames::new(config.tag_prefix.clone()),
            ResolveLocalAssets::new(config.tag_prefix.clone(), Arc::new(matcher)),
        );
        let mut ast_transforms: Vec<Box<dyn AstTransform>> = Vec::new();
        if config.code_meta {
            ast_transforms.push(Box::new(CodeMetaPass));
        }
        Self {
            config,
            ast_transforms,
            tree,
        }
    }

    /// Replaces the local asset predicate.
    pub fn with_local_asset_matcher(mut self, matcher: Arc<dyn LocalAssetMatcher>) -> Self {
        self.tree.set_local_assets(ResolveLocalAssets::new(
            self.config.tag_prefix.clone(),
            matcher,
        ));
        self
    }

    /// Adds a pass over the parsed mdast. Runs after the built-in mdast passes.
    pub fn add_ast_transform(&mut self, pass: Box<dyn AstTransform>) {
        self.ast_transforms.push(pass);
    }

    /// Adds a tree pass that runs after every built-in tree pass.
    pub fn add_tree_transform(&mut self, pass: Box<dyn TreeTransform>) {
        self.tree.push(pass);
    }

    /// Adds a tree pass that runs immediately before `builtin`.
    pub fn add_tree_transform_before(
        &mut self,
        builtin: BuiltinPass,
        pass: Box<dyn TreeTransform>,
    ) {
        self.tree.insert_before(builtin, pass);
    }

    /// The configuration this compiler was built from.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Tree pass names in execution order.
    pub fn tree_pass_names(&self) -> Vec<String> {
        self.tree.pass_names()
    }

    /// Runs every pass over `source` and returns the transformed tree.
    pub fn compile(&self, source: &str, path: &str) -> Result<ParsedDocument, CompilationError> {
        let options = match DocumentKind::from_path(path) {
            DocumentKind::Markdown => ParseOptions::markdown(),
            DocumentKind::Mdx => ParseOptions::mdx(),
        }
        .with_math(self.config.math);

        let mut mdast = parse_mdast(source, &options).map_err(|err| match err {
            CompilationError::Parse { message, location } => CompilationError::Parse {
                message,
                location: location.in_file(path),
            },
            other => other,
        })?;

        for pass in &self.ast_transforms {
            pass.transform(&mut mdast)
                .map_err(|source| CompilationError::Pass {
                    pass: pass.name().to_string(),
                    path: path.to_string(),
                    source,
                })?;
        }

        let frontmatter =
            extract_frontmatter(&mut mdast).map_err(|source| CompilationError::Frontmatter {
                path: path.to_string(),
                source,
            })?;

        let converted = mdast_to_tree(&mdast);
        let mut root = converted.root;
        self.tree.run(&mut root, path)?;

        Ok(ParsedDocument {
            root,
            frontmatter,
            esm: converted.esm,
            path: path.to_string(),
        })
    }

    /// Compiles `source` to an ES module.
    pub fn compile_to_source(&self, source: &str, path: &str) -> Result<String, CompilationError> {
        let document = self.compile(source, path)?;
        let code = lower_to_source(
            &document.root,
            document.frontmatter.as_ref(),
            &document.esm,
            &self.config.source_options(),
        );
        log::debug!("Compiled MDX file: {path}\n{code}");
        Ok(code)
    }

    /// Compiles `source` to the wire format. Local assets are dropped.
    pub fn compile_to_graph(
        &self,
        source: &str,
        path: &str,
    ) -> Result<CompiledDocument, CompilationError> {
        Ok(self
            .compile_to_graph_with(source, path, &NoLocalAssets)?
            .document)
    }

    /// Compiles `source` to the wire format, resolving local assets via `assets`.
    pub fn compile_to_graph_with(
        &self,
        source: &str,
        path: &str,
        assets: &dyn LocalAssetResolver,
    ) -> Result<GraphLowering, CompilationError> {
        let document = self.compile(source, path)?;
        Ok(lower_to_graph_with(
            &document.root,
            document.frontmatter,
            assets,
            &self.config.tag_prefix,
        ))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::from_config(CompilerConfig::default())
    }
}

/// Caller passes for [`compile_mdx`].
#[derive(Default)]
pub struct CompileOptions {
    /// Passes over the parsed mdast.
    pub remark_plugins: Vec<Box<dyn AstTransform>>,
    /// Passes over the element tree, run after the built-ins.
    pub rehype_plugins: Vec<Box<dyn TreeTransform>>,
}

/// One-shot compile of remote content to the wire format.
///
/// Uses the default configuration. Failures are wrapped in
/// [`CompilationError::Remote`] with the original error as the source.
pub fn compile_mdx(
    source: &str,
    options: Option<CompileOptions>,
) -> Result<CompiledDocument, CompilationError> {
    let options = options.unwrap_or_default();
    let mut compiler = Compiler::default();
    for pass in options.remark_plugins {
        compiler.add_ast_transform(pass);
    }
    for pass in options.rehype_plugins {
        compiler.add_tree_transform(pass);
    }
    compiler
        .compile_to_graph(source, REMOTE_DOCUMENT_PATH)
        .map_err(|source| CompilationError::Remote {
            source: Box::new(source),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PassError;
    use crate::hast::{Node, PropValue};
    use crate::lower::GraphNode;
    use markdown::mdast;
    use serde_json::json;

    fn names(element: &Element) -> Vec<&str> {
        element
            .children
            .iter()
            .filter_map(|child| match child {
                Node::Element(e) => Some(e.name.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn config_json_fills_defaults() {
        let config = CompilerConfig::from_json(r#"{"tagPrefix":"dom.","math":true}"#)
            .expect("config should parse");
        assert_eq!(config.tag_prefix, "dom.");
        assert!(config.math);
        assert_eq!(config.jsx_import_source, "react");
        assert_eq!(config.local_asset_prefixes, vec![".", "@"]);
    }

    #[test]
    fn fingerprint_tracks_every_field() {
        let base = CompilerConfig::default();
        assert_eq!(base.fingerprint(), CompilerConfig::default().fingerprint());
        let changed = CompilerConfig {
            code_meta: true,
            ..CompilerConfig::default()
        };
        assert_ne!(base.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn document_kind_follows_extension() {
        assert_eq!(DocumentKind::from_path("a/README.md"), DocumentKind::Markdown);
        assert_eq!(DocumentKind::from_path("page.mdx"), DocumentKind::Mdx);
        assert_eq!(DocumentKind::from_path("remote"), DocumentKind::Mdx);
    }

    #[test]
    fn compile_prefixes_and_extracts_frontmatter() {
        let document = Compiler::default()
            .compile("---\ntitle: X\n---\n# Body", "doc.mdx")
            .expect("compile should succeed");
        assert_eq!(document.root.name, "html.div");
        assert_eq!(names(&document.root), vec!["html.h1"]);
        assert_eq!(
            document.frontmatter.map(serde_json::Value::Object),
            Some(json!({"title": "X"}))
        );
    }

    #[test]
    fn esm_is_hoisted_out_of_the_tree() {
        const SOURCE: &str =
            "import {\n  Chart,\n  Legend\n} from './chart.js'\n\n<Chart />\n\n<Legend />";
        let compiler = Compiler::default();

        let document = compiler.compile(SOURCE, "doc.mdx").expect("compile should succeed");
        assert_eq!(
            document.esm,
            vec!["import {\n  Chart,\n  Legend\n} from './chart.js'".to_string()]
        );
        assert_eq!(names(&document.root), vec!["Chart", "Legend"]);
        assert!(!crate::hast::text_content(&document.root.children).contains("import"));

        let code = compiler.compile_to_source(SOURCE, "doc.mdx").expect("compile should succeed");
        assert!(code.contains("} from './chart.js'\n"), "{code}");
        assert!(code.contains("_jsx(Chart, {"), "{code}");
        assert!(code.contains("_jsx(Legend, {"), "{code}");
        assert!(!code.contains("_customComponent(components, \"Chart\")"), "{code}");
        assert!(!code.contains("\"import \""), "{code}");
    }

    #[test]
    fn default_export_wraps_content_in_layout() {
        let source = "export default function Page({children}) { return children }\n\n# Hi";
        let code = Compiler::default()
            .compile_to_source(source, "doc.mdx")
            .expect("compile should succeed");
        assert!(code.contains("const MDXLayout = function Page"), "{code}");
        assert!(code.contains("return _jsx(MDXLayout, {...props"), "{code}");
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let err = Compiler::default()
            .compile("Text\n\n<Note>", "broken.mdx")
            .unwrap_err();
        let CompilationError::Parse { location, .. } = err else {
            panic!("parse error expected, got {err:?}");
        };
        assert_eq!(location.file.as_deref(), Some("broken.mdx"));
    }

    #[test]
    fn code_meta_is_opt_in() {
        let source = "```js title=\"a.js\"\nx\n```";
        let plain = Compiler::default()
            .compile_to_graph(source, "doc.mdx")
            .expect("compile should succeed");
        let folded = Compiler::from_config(CompilerConfig {
            code_meta: true,
            ..CompilerConfig::default()
        })
        .compile_to_graph(source, "doc.mdx")
        .expect("compile should succeed");

        let code_text = |document: &CompiledDocument| {
            let pre = &document.tree.children()[0];
            match &pre.children()[0].children()[0] {
                GraphNode::Text { value } => value.clone(),
                other => panic!("text expected, got {other:?}"),
            }
        };
        assert_eq!(code_text(&plain), "x\n");
        assert_eq!(code_text(&folded), "@@@title=\"a.js\"@@@x\n");
    }

    #[test]
    fn caller_ast_pass_sees_mdast() {
        let mut compiler = Compiler::default();
        compiler.add_ast_transform(Box::new(|root: &mut mdast::Node| -> Result<(), PassError> {
            if let Some(children) = root.children_mut() {
                children.clear();
            }
            Ok(())
        }));
        let document = compiler
            .compile("# Gone", "doc.mdx")
            .expect("compile should succeed");
        assert!(document.root.children.is_empty());
    }

    #[test]
    fn interleaved_tree_pass_sees_unprefixed_names() {
        let mut compiler = Compiler::default();
        compiler.add_tree_transform_before(
            BuiltinPass::PrefixTagNames,
            Box::new(|root: &mut Element| -> Result<(), PassError> {
                root.props.insert("seen".into(), PropValue::string(root.name.clone()));
                Ok(())
            }),
        );
        let document = compiler
            .compile("hi", "doc.mdx")
            .expect("compile should succeed");
        assert_eq!(document.root.props.get("seen"), Some(&PropValue::string("div")));
        assert_eq!(compiler.tree_pass_names()[0], "custom");
    }

    #[test]
    fn compile_mdx_wraps_failures() {
        let options = CompileOptions {
            rehype_plugins: vec![Box::new(|_: &mut Element| -> Result<(), PassError> {
                Err(PassError::new("plugin exploded"))
            })],
            ..CompileOptions::default()
        };
        let err = compile_mdx("# Hi", Some(options)).unwrap_err();
        assert!(err.to_string().starts_with("Failed to compile remote MDX"));
        assert_eq!(err.root_cause().to_string(), "plugin exploded");
    }

    #[test]
    fn compile_mdx_produces_graph() {
        let document = compile_mdx("Hello **world**", None).expect("compile should succeed");
        insta::assert_snapshot!(document.to_json().expect("serialize should succeed"), @r#"{"tree":{"type":"element","name":"html.div","children":[{"type":"element","name":"html.p","children":[{"type":"text","value":"Hello "},{"type":"element","name":"html.strong","children":[{"type":"text","value":"world"}]}]}]}}"#);
    }
}
