use super::TreeTransform;
use super::prefix::{DEFAULT_TAG_PREFIX, strip_prefix};
use crate::error::PassError;
use crate::hast::{Element, visit_elements_mut};

/// Elements that may not hold whitespace-only text children.
pub const TABLE_STRUCTURAL_TAGS: [&str; 6] = ["table", "thead", "tbody", "tfoot", "tr", "colgroup"];

/// Drops whitespace-only text directly inside table structure.
///
/// Cells (`td`, `th`) keep their whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripTableWhitespace {
    prefix: String,
}

impl StripTableWhitespace {
    /// Pass recognizing tags with or without `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for StripTableWhitespace {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_PREFIX)
    }
}

impl TreeTransform for StripTableWhitespace {
    fn name(&self) -> &str {
        "strip-table-whitespace"
    }

    fn transform(&self, root: &mut Element) -> Result<(), PassError> {
        visit_elements_mut(root, &mut |element| {
            let tag = strip_prefix(&element.name, &self.prefix);
            if TABLE_STRUCTURAL_TAGS.contains(&tag) {
                element.children.retain(|child| !child.is_whitespace_text());
            }
        });
        Ok(())
    }
}
