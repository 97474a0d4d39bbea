//! Ordered tree passes run between conversion and lowering.
//!
//! Built-in passes always run in the order of [`BuiltinPass::ORDER`]. Caller
//! passes run after every built-in unless they were registered in front of a
//! specific built-in with [`TreePipeline::insert_before`].

mod code_meta;
mod local_assets;
mod prefix;
mod table_whitespace;

pub use code_meta::{CODE_META_DELIMITER, CodeMetaPass, fold_code_meta, split_code_meta};
pub use local_assets::{DefaultLocalAssetMatcher, LocalAssetMatcher, ResolveLocalAssets};
pub use prefix::{DEFAULT_TAG_PREFIX, HTML_TAGS, PrefixTagNames, strip_prefix};
pub use table_whitespace::{StripTableWhitespace, TABLE_STRUCTURAL_TAGS};

use crate::error::{CompilationError, PassError};
use crate::hast::Element;

/// A pass over the element tree.
pub trait TreeTransform: Send + Sync {
    /// Name reported when the pass fails.
    fn name(&self) -> &str {
        "custom"
    }

    /// Rewrite the tree in place.
    fn transform(&self, root: &mut Element) -> Result<(), PassError>;
}

impl<F> TreeTransform for F
where
    F: Fn(&mut Element) -> Result<(), PassError> + Send + Sync,
{
    fn transform(&self, root: &mut Element) -> Result<(), PassError> {
        (self)(root)
    }
}

/// Names of the built-in structural passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinPass {
    /// [`PrefixTagNames`]
    PrefixTagNames,
    /// [`ResolveLocalAssets`]
    LocalAssets,
    /// [`StripTableWhitespace`]
    StripTableWhitespace,
}

impl BuiltinPass {
    /// Fixed execution order of the built-ins.
    pub const ORDER: [BuiltinPass; 3] = [
        BuiltinPass::PrefixTagNames,
        BuiltinPass::LocalAssets,
        BuiltinPass::StripTableWhitespace,
    ];
}

/// The built-in passes plus caller passes, in execution order.
pub struct TreePipeline {
    prefix: PrefixTagNames,
    local_assets: ResolveLocalAssets,
    table_whitespace: StripTableWhitespace,
    before: Vec<(BuiltinPass, Box<dyn TreeTransform>)>,
    after: Vec<Box<dyn TreeTransform>>,
}

impl TreePipeline {
    /// Pipeline with the given built-ins and no caller passes.
    pub fn new(prefix: PrefixTagNames, local_assets: ResolveLocalAssets) -> Self {
        let table_whitespace = StripTableWhitespace::new(prefix.prefix());
        Self {
            prefix,
            local_assets,
            table_whitespace,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Replaces the local asset pass, e.g. to inject a matcher.
    pub fn set_local_assets(&mut self, pass: ResolveLocalAssets) {
        self.local_assets = pass;
    }

    /// Appends a caller pass that runs after every built-in.
    pub fn push(&mut self, pass: Box<dyn TreeTransform>) {
        self.after.push(pass);
    }

    /// Registers a caller pass that runs right before `builtin`.
    pub fn insert_before(&mut self, builtin: BuiltinPass, pass: Box<dyn TreeTransform>) {
        self.before.push((builtin, pass));
    }

    /// Names of every pass in execution order.
    pub fn pass_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for builtin in BuiltinPass::ORDER {
            names.extend(
                self.before
                    .iter()
                    .filter(|(slot, _)| *slot == builtin)
                    .map(|(_, pass)| pass.name().to_string()),
            );
            names.push(self.builtin(builtin).name().to_string());
        }
        names.extend(self.after.iter().map(|pass| pass.name().to_string()));
        names
    }

    /// Runs every pass over `root`. The first failure stops the pipeline.
    pub fn run(&self, root: &mut Element, path: &str) -> Result<(), CompilationError> {
        for builtin in BuiltinPass::ORDER {
            for (_, pass) in self.before.iter().filter(|(slot, _)| *slot == builtin) {
                run_pass(pass.as_ref(), root, path)?;
            }
            run_pass(self.builtin(builtin), root, path)?;
        }
        for pass in &self.after {
            run_pass(pass.as_ref(), root, path)?;
        }
        Ok(())
    }

    fn builtin(&self, builtin: BuiltinPass) -> &dyn TreeTransform {
        match builtin {
            BuiltinPass::PrefixTagNames => &self.prefix,
            BuiltinPass::LocalAssets => &self.local_assets,
            BuiltinPass::StripTableWhitespace => &self.table_whitespace,
        }
    }
}

fn run_pass(
    pass: &dyn TreeTransform,
    root: &mut Element,
    path: &str,
) -> Result<(), CompilationError> {
    pass.transform(root)
        .map_err(|source| CompilationError::Pass {
            pass: pass.name().to_string(),
            path: path.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hast::Node;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl TreeTransform for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        fn transform(&self, root: &mut Element) -> Result<(), PassError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(format!("{}:{}", self.label, root.name));
            }
            Ok(())
        }
    }

    fn pipeline() -> TreePipeline {
        TreePipeline::new(PrefixTagNames::default(), ResolveLocalAssets::default())
    }

    #[test]
    fn caller_passes_run_after_builtins_by_default() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = pipeline();
        pipeline.push(Box::new(Recorder {
            label: "late",
            seen: Arc::clone(&seen),
        }));
        pipeline.insert_before(
            BuiltinPass::PrefixTagNames,
            Box::new(Recorder {
                label: "early",
                seen: Arc::clone(&seen),
            }),
        );

        let mut root = Element::new("div");
        pipeline.run(&mut root, "doc.mdx").expect("pipeline should succeed");

        let seen = seen.lock().expect("recorder lock").clone();
        assert_eq!(seen, vec!["early:div", "late:html.div"]);
        assert_eq!(
            pipeline.pass_names(),
            vec![
                "early",
                "prefix-tag-names",
                "local-assets",
                "strip-table-whitespace",
                "late"
            ]
        );
    }

    #[test]
    fn failing_pass_names_itself() {
        let mut pipeline = pipeline();
        pipeline.push(Box::new(|_: &mut Element| -> Result<(), PassError> {
            Err(PassError::new("nope"))
        }));
        let mut root = Element::new("div").with_children(vec![Node::text("x")]);
        let err = pipeline.run(&mut root, "doc.mdx").unwrap_err();
        assert!(matches!(
            err,
            CompilationError::Pass { ref pass, ref path, .. } if pass == "custom" && path == "doc.mdx"
        ));
    }
}
