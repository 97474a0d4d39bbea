#![deny(missing_docs)]
//! natmdx runtime: renders compiled documents with scoped components and styles.

/// Asset registry and URL resolution.
pub mod asset;
/// Component trait and the default namespace.
pub mod components;
/// Runtime error types.
pub mod error;
/// Component provider scopes.
pub mod namespace;
/// Remote document fetch state.
pub mod remote;
/// Graph renderer.
pub mod render;
/// Style provider scopes.
pub mod styles;

pub use asset::{
    AssetDescriptor, AssetEntry, AssetRegistry, AssetResolver, AssetSource, ResolvedAsset,
    encode_svg_data_uri, select_scale,
};
pub use components::{
    Component, ComponentMap, HtmlElement, Image, Passthrough, Props, RenderContext,
    default_components, from_fn,
};
pub use error::{AssetError, FetchError, RenderError};
pub use namespace::{ComponentScopes, merge_components};
pub use remote::{FetchResponse, Fetcher, RemoteDocument, Ticket, parse_response};
pub use render::{RenderOutput, Renderer};
pub use styles::{StyleMap, StyleScopes, merge_styles};
