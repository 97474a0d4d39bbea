use super::TreeTransform;
use super::prefix::{DEFAULT_TAG_PREFIX, strip_prefix};
use crate::error::PassError;
use crate::hast::{Element, LocalAssetReference, PropValue, visit_elements_mut};
use std::sync::Arc;

/// Decides whether an image source refers to a file next to the document.
pub trait LocalAssetMatcher: Send + Sync {
    /// Returns true when `src` should become a deferred local load.
    fn is_local(&self, src: &str) -> bool;
}

impl<F> LocalAssetMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_local(&self, src: &str) -> bool {
        (self)(src)
    }
}

/// Matches sources starting with any of a set of prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultLocalAssetMatcher {
    prefixes: Vec<String>,
}

impl DefaultLocalAssetMatcher {
    /// Matcher for the given prefixes.
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }
}

impl Default for DefaultLocalAssetMatcher {
    fn default() -> Self {
        Self::new(vec![".".to_string(), "@".to_string()])
    }
}

impl LocalAssetMatcher for DefaultLocalAssetMatcher {
    fn is_local(&self, src: &str) -> bool {
        self.prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && src.starts_with(prefix.as_str()))
    }
}

const SOURCE_PROPS: [&str; 2] = ["src", "source"];

/// Turns local image sources into [`PropValue::LocalAsset`] markers.
///
/// Runs on `img` with or without the tag prefix.
#[derive(Clone)]
pub struct ResolveLocalAssets {
    prefix: String,
    matcher: Arc<dyn LocalAssetMatcher>,
}

impl ResolveLocalAssets {
    /// Pass recognizing `img` and `<prefix>img`.
    pub fn new(prefix: impl Into<String>, matcher: Arc<dyn LocalAssetMatcher>) -> Self {
        Self {
            prefix: prefix.into(),
            matcher,
        }
    }

    fn rewrite(&self, element: &mut Element) {
        if strip_prefix(&element.name, &self.prefix) != "img" {
            return;
        }
        for key in SOURCE_PROPS {
            let Some(value) = element.props.get_mut(key) else {
                continue;
            };
            let Some(src) = value.as_str() else {
                continue;
            };
            if src.starts_with("require(") || !self.matcher.is_local(src) {
                continue;
            }
            let path = src.to_string();
            log::debug!("Deferring local asset `{path}` on <{}>", element.name);
            *value = PropValue::LocalAsset(LocalAssetReference { path });
        }
    }
}

impl Default for ResolveLocalAssets {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_PREFIX, Arc::new(DefaultLocalAssetMatcher::default()))
    }
}

impl TreeTransform for ResolveLocalAssets {
    fn name(&self) -> &str {
        "local-assets"
    }

    fn transform(&self, root: &mut Element) -> Result<(), PassError> {
        visit_elements_mut(root, &mut |element| self.rewrite(element));
        Ok(())
    }
}
