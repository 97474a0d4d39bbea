#![deny(missing_docs)]
//! natmdx core: MDX parsing, tree passes, and lowering to source or JSON graphs.

/// Parallel batch compilation.
pub mod batch;
/// Bundler configuration hook and per-file transformer.
pub mod bundler;
/// Configuration-keyed compiler cache.
pub mod cache;
/// Configured compile pipeline.
pub mod compiler;
/// mdast to element tree conversion.
pub mod convert;
/// Core error and diagnostic types.
pub mod error;
/// YAML frontmatter extraction helpers.
pub mod frontmatter;
/// Typed element tree produced by conversion.
pub mod hast;
/// Lowering to executable source and to the wire graph.
pub mod lower;
/// Sibling position metadata.
pub mod order;
/// Markdown parsing utilities and extension hooks.
pub mod parse;
/// Built-in tree passes and the pass pipeline.
pub mod transform;

pub use batch::{
    BatchInput, BatchOptions, BatchOutput, BatchProcessingResult, BatchResult, BatchStats,
    BatchTarget,
};
pub use bundler::{BuildConfig, FileMatcher, MdxFileMatcher, MdxTransformer, TransformInput};
pub use cache::CompilerCache;
pub use compiler::{
    CompileOptions, Compiler, CompilerConfig, DocumentKind, ParsedDocument, compile_mdx,
};
pub use convert::{Converted, mdast_to_tree};
pub use error::{
    CompilationError, Diagnostic, Diagnostics, ErrorSeverity, PassError, SourceLocation,
};
pub use frontmatter::{Frontmatter, FrontmatterError, extract_frontmatter};
pub use hast::{Element, FRAGMENT_NAME, LocalAssetReference, Node, PropValue, Props};
pub use lower::{
    CompiledDocument, GraphLowering, GraphNode, LocalAssetResolver, NoLocalAssets,
    SourceOptions, lower_to_graph, lower_to_graph_with, lower_to_source,
};
pub use order::{OrderMetadata, sibling_order};
pub use parse::{AstTransform, ParseOptions, parse_mdast};
pub use transform::{
    BuiltinPass, CodeMetaPass, DEFAULT_TAG_PREFIX, LocalAssetMatcher, PrefixTagNames,
    ResolveLocalAssets, StripTableWhitespace, TreePipeline, TreeTransform,
};
