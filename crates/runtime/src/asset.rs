//! Asset references and their resolution to URLs.
//!
//! A source is a numeric registry id, a URI string, or a descriptor that
//! already carries a `uri`. Ids pick the registered scale closest to the
//! device scale; on a tie the earlier (smaller) scale wins.

use crate::error::AssetError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;utf8,";

/// A bundled asset as recorded by the bundler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntry {
    /// File stem, e.g. `logo`.
    pub name: String,
    /// File extension without the dot, e.g. `png`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Available pixel scales in ascending order.
    pub scales: Vec<f64>,
    /// Intrinsic width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Intrinsic height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Server path the files are served from, e.g. `/assets/img`.
    pub http_server_location: String,
}

/// Id-addressed asset table. Ids start at 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRegistry {
    assets: Vec<AssetEntry>,
}

impl AssetRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry` and returns its id.
    pub fn register(&mut self, entry: AssetEntry) -> u32 {
        self.assets.push(entry);
        self.assets.len() as u32
    }

    /// Entry for `id`.
    pub fn get(&self, id: u32) -> Option<&AssetEntry> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.assets.get(index)
    }

    /// Number of registered assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Descriptor form of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Resolved URI, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Anything an image `src` may hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetSource {
    /// Registry id.
    Id(u32),
    /// URI used as-is.
    Uri(String),
    /// Already-resolved descriptor.
    Descriptor(AssetDescriptor),
}

impl AssetSource {
    /// Reads a source from a decoded prop value.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

impl From<u32> for AssetSource {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for AssetSource {
    fn from(uri: &str) -> Self {
        Self::Uri(uri.to_string())
    }
}

/// A concrete URL plus optional dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAsset {
    /// Final URI.
    pub uri: String,
    /// Width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl ResolvedAsset {
    fn uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            width: None,
            height: None,
        }
    }
}

/// Picks the scale closest to `target`. Ties keep the earlier scale.
pub fn select_scale(scales: &[f64], target: f64) -> Option<f64> {
    let (first, rest) = scales.split_first()?;
    Some(rest.iter().fold(*first, |best, &candidate| {
        if (candidate - target).abs() < (best - target).abs() {
            candidate
        } else {
            best
        }
    }))
}

// Left unescaped by `encodeURIComponent`, escaped by `urlencoding`.
const URI_COMPONENT_MARKS: [(&str, &str); 5] =
    [("%21", "!"), ("%27", "'"), ("%28", "("), ("%29", ")"), ("%2A", "*")];

/// Percent-encodes the markup of an inline SVG data URI, leaving the prefix.
///
/// The escaped set matches `encodeURIComponent`. Returns `None` for any
/// other URI.
pub fn encode_svg_data_uri(uri: &str) -> Option<String> {
    let svg = uri.strip_prefix(SVG_DATA_URI_PREFIX)?;
    let mut encoded = urlencoding::encode(svg).into_owned();
    for (escape, mark) in URI_COMPONENT_MARKS {
        encoded = encoded.replace(escape, mark);
    }
    Some(format!("{SVG_DATA_URI_PREFIX}{encoded}"))
}

/// Resolves sources against a registry at a fixed device scale.
#[derive(Debug, Clone, Copy)]
pub struct AssetResolver<'a> {
    registry: &'a AssetRegistry,
    scale: f64,
}

impl<'a> AssetResolver<'a> {
    /// Resolver for `registry` on a device with pixel ratio `scale`.
    pub fn new(registry: &'a AssetRegistry, scale: f64) -> Self {
        Self { registry, scale }
    }

    /// Device pixel ratio used for scale selection.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Turns `source` into a URL.
    pub fn resolve(&self, source: &AssetSource) -> Result<ResolvedAsset, AssetError> {
        let resolved = match source {
            AssetSource::Id(id) => self.resolve_id(*id)?,
            AssetSource::Uri(uri) if !uri.is_empty() => ResolvedAsset::uri(uri.clone()),
            AssetSource::Descriptor(AssetDescriptor {
                uri: Some(uri),
                width,
                height,
            }) => {
                return Ok(ResolvedAsset {
                    uri: uri.clone(),
                    width: *width,
                    height: *height,
                });
            }
            other => {
                return Err(AssetError::Unresolved {
                    value: serde_json::to_string(other).unwrap_or_default(),
                });
            }
        };
        Ok(match encode_svg_data_uri(&resolved.uri) {
            Some(uri) => ResolvedAsset::uri(uri),
            None => resolved,
        })
    }

    fn resolve_id(&self, id: u32) -> Result<ResolvedAsset, AssetError> {
        let entry = self.registry.get(id).ok_or(AssetError::NotFound { id })?;
        let scale = select_scale(&entry.scales, self.scale).unwrap_or(1.0);
        let suffix = if scale == 1.0 {
            String::new()
        } else {
            format!("@{scale}x")
        };
        Ok(ResolvedAsset {
            uri: format!(
                "{}/{}{}.{}",
                entry.http_server_location, entry.name, suffix, entry.kind
            ),
            width: entry.width,
            height: entry.height,
        })
    }
}
