use markdown::mdast::Node;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Parsed frontmatter mapping.
pub type Frontmatter = Map<String, JsonValue>;

/// Errors emitted while parsing frontmatter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// YAML failed to parse.
    #[error("Frontmatter parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("Frontmatter must be a YAML mapping at the top level")]
    InvalidRootType,
}

/// Removes a leading metadata node from the document and parses it.
///
/// Returns `Ok(None)` when the document has no frontmatter, or when the block
/// is empty. TOML blocks are removed but not parsed.
pub fn extract_frontmatter(root: &mut Node) -> Result<Option<Frontmatter>, FrontmatterError> {
    let Some(children) = root.children_mut() else {
        return Ok(None);
    };

    match children.first() {
        Some(Node::Yaml(_)) => {}
        Some(Node::Toml(_)) => {
            children.remove(0);
            log::warn!("TOML frontmatter is not supported; block removed");
            return Ok(None);
        }
        _ => return Ok(None),
    }

    match children.remove(0) {
        Node::Yaml(yaml) => parse_yaml_block(&yaml.value),
        _ => Ok(None),
    }
}

/// Parses a YAML block into a JSON mapping.
pub fn parse_yaml_block(block: &str) -> Result<Option<Frontmatter>, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(None);
    }

    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    let json_value =
        serde_json::to_value(yaml_value).map_err(|err| FrontmatterError::Parse(err.to_string()))?;

    match json_value {
        JsonValue::Null => Ok(None),
        JsonValue::Object(map) if map.is_empty() => Ok(None),
        JsonValue::Object(map) => Ok(Some(map)),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}
