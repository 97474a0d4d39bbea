//! Bundler-facing hook: config installation and the per-file transformer.

use crate::cache::CompilerCache;
use crate::compiler::CompilerConfig;
use crate::error::CompilationError;

/// Transformer module installed by [`BuildConfig::with_mdx`].
pub const MDX_TRANSFORMER_PATH: &str = "@natmdx/core/transformer";

/// Suffix of the bundler's stock transformer, which is safe to replace.
pub const HOST_DEFAULT_TRANSFORMER_SUFFIX: &str = "metro-config/build/babel-transformer.js";

/// The parts of a bundler configuration the hook touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Module that transforms source files.
    pub transformer_path: Option<String>,
    /// Extensions resolvable as modules.
    pub source_exts: Vec<String>,
}

impl BuildConfig {
    /// Installs the MDX transformer and makes `.md`/`.mdx` importable.
    ///
    /// A custom transformer that is already configured is kept; it must
    /// delegate to [`MdxTransformer`] itself.
    pub fn with_mdx(mut self) -> Self {
        match self.transformer_path.as_deref() {
            Some(path) if !path.ends_with(HOST_DEFAULT_TRANSFORMER_SUFFIX) => {
                log::warn!("Using custom transformer: {path}");
                log::warn!("Ensure it includes the MDX transformer from {MDX_TRANSFORMER_PATH}");
            }
            _ => self.transformer_path = Some(MDX_TRANSFORMER_PATH.to_string()),
        }
        if !self.source_exts.iter().any(|ext| ext == "md") {
            self.source_exts.push("md".to_string());
            self.source_exts.push("mdx".to_string());
        }
        self
    }
}

/// A file handed to the transformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformInput {
    /// Path of the file.
    pub filename: String,
    /// Contents of the file; replaced with the generated module on success.
    pub src: String,
}

/// Decides which files the transformer compiles.
pub trait FileMatcher: Send + Sync {
    /// Returns true when `input` should be compiled.
    fn matches(&self, input: &TransformInput) -> bool;
}

impl<F> FileMatcher for F
where
    F: Fn(&TransformInput) -> bool + Send + Sync,
{
    fn matches(&self, input: &TransformInput) -> bool {
        (self)(input)
    }
}

/// Matches filenames ending in `.md` or `.mdx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MdxFileMatcher;

impl FileMatcher for MdxFileMatcher {
    fn matches(&self, input: &TransformInput) -> bool {
        input.filename.ends_with(".md") || input.filename.ends_with(".mdx")
    }
}

/// Compiles matching files to ES modules; other files pass through untouched.
pub struct MdxTransformer {
    config: CompilerConfig,
    matcher: Box<dyn FileMatcher>,
}

impl MdxTransformer {
    /// Transformer for `config` with the default file matcher.
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            matcher: Box::new(MdxFileMatcher),
        }
    }

    /// Replaces the file matcher.
    pub fn with_matcher(mut self, matcher: Box<dyn FileMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Compiles `input` through the shared compiler cache.
    pub fn transform(&self, input: TransformInput) -> Result<TransformInput, CompilationError> {
        if !self.matcher.matches(&input) {
            return Ok(input);
        }
        let compiler = CompilerCache::global().get(&self.config);
        let src = compiler
            .compile_to_source(&input.src, &input.filename)
            .map_err(|source| CompilationError::Transform {
                filename: input.filename.clone(),
                source: Box::new(source),
            })?;
        Ok(TransformInput {
            filename: input.filename,
            src,
        })
    }
}

impl Default for MdxTransformer {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(filename: &str, src: &str) -> TransformInput {
        TransformInput {
            filename: filename.to_string(),
            src: src.to_string(),
        }
    }

    #[test]
    fn installs_transformer_and_extensions() {
        let config = BuildConfig {
            transformer_path: Some(
                "node_modules/@expo/metro-config/build/babel-transformer.js".into(),
            ),
            source_exts: vec!["js".into(), "tsx".into()],
        }
        .with_mdx();
        assert_eq!(config.transformer_path.as_deref(), Some(MDX_TRANSFORMER_PATH));
        assert_eq!(config.source_exts, vec!["js", "tsx", "md", "mdx"]);

        let again = config.clone().with_mdx();
        assert_eq!(again, config);
    }

    #[test]
    fn keeps_custom_transformer() {
        let config = BuildConfig {
            transformer_path: Some("./my-transformer.js".into()),
            source_exts: Vec::new(),
        }
        .with_mdx();
        assert_eq!(config.transformer_path.as_deref(), Some("./my-transformer.js"));
        assert_eq!(config.source_exts, vec!["md", "mdx"]);
    }

    #[test]
    fn non_matching_files_pass_through() {
        let input = file("App.tsx", "export default 1");
        let output = MdxTransformer::default()
            .transform(input.clone())
            .expect("passthrough should succeed");
        assert_eq!(output, input);
    }

    #[test]
    fn compiles_matching_files() {
        let output = MdxTransformer::default()
            .transform(file("docs/intro.mdx", "# Intro"))
            .expect("transform should succeed");
        assert!(output.src.contains("export default function MDXContent"));
        assert!(output.src.contains("_builtinComponent(components, \"h1\")"));
    }

    #[test]
    fn injected_matcher_decides() {
        let transformer = MdxTransformer::default()
            .with_matcher(Box::new(|input: &TransformInput| input.filename.ends_with(".markdown")));
        let output = transformer
            .transform(file("a.mdx", "# A"))
            .expect("passthrough should succeed");
        assert_eq!(output.src, "# A");
    }

    #[test]
    fn failures_name_the_file() {
        let err = MdxTransformer::default()
            .transform(file("broken.mdx", "Text\n\n<Note>"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to process MDX for broken.mdx");
        let CompilationError::Transform { source, .. } = err else {
            panic!("transform error expected");
        };
        assert!(matches!(*source, CompilationError::Parse { .. }));
    }
}
