use super::TreeTransform;
use crate::error::PassError;
use crate::hast::{Element, visit_elements_mut};

/// Prefix applied to built-in tags unless configured otherwise.
pub const DEFAULT_TAG_PREFIX: &str = "html.";

/// Bare tag names the prefixer namespaces.
pub const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "article", "aside", "b", "bdi", "bdo", "blockquote", "br", "caption",
    "cite", "code", "col", "colgroup", "data", "dd", "del", "details", "dfn", "div", "dl", "dt",
    "em", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "i", "img", "input", "ins", "kbd", "li", "main", "mark", "nav", "ol", "p", "pre", "q", "s",
    "samp", "section", "small", "span", "strong", "sub", "summary", "sup", "table", "tbody", "td",
    "tfoot", "th", "thead", "time", "tr", "u", "ul", "var", "wbr",
];

/// Removes `prefix` from `name` when present.
pub fn strip_prefix<'a>(name: &'a str, prefix: &str) -> &'a str {
    name.strip_prefix(prefix).unwrap_or(name)
}

/// Rewrites bare HTML tag names to `<prefix><tag>`.
///
/// Names that already carry the prefix, custom components, and fragments are
/// left alone, so applying the pass twice is the same as applying it once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixTagNames {
    prefix: String,
}

impl PrefixTagNames {
    /// Prefixer for `prefix`, e.g. `"html."`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefix a single name if it is a bare HTML tag.
    pub fn prefixed(&self, name: &str) -> Option<String> {
        if self.prefix.is_empty() || name.starts_with(&self.prefix) {
            return None;
        }
        HTML_TAGS
            .contains(&name)
            .then(|| format!("{}{}", self.prefix, name))
    }
}

impl Default for PrefixTagNames {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_PREFIX)
    }
}

impl TreeTransform for PrefixTagNames {
    fn name(&self) -> &str {
        "prefix-tag-names"
    }

    fn transform(&self, root: &mut Element) -> Result<(), PassError> {
        visit_elements_mut(root, &mut |element| {
            if let Some(name) = self.prefixed(&element.name) {
                element.name = name;
            }
        });
        Ok(())
    }
}
