use thiserror::Error;

/// Failure to turn an asset reference into a URL.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    /// Numeric id not present in the registry.
    #[error("Image: asset with ID \"{id}\" could not be found. Please check the image source.")]
    NotFound {
        /// Requested id
        id: u32,
    },
    /// No branch produced a URI.
    #[error("Unknown image source \"{value}\" used in MDX.")]
    Unresolved {
        /// JSON rendering of the offending source
        value: String,
    },
}

/// Fatal render failures. Missing custom components are not among them.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A lowercase name has no component: the default namespace is incomplete.
    #[error(
        "No MDX component found for key: \"{name}\". Define it using the provider: ComponentScopes::push({{ \"{name}\": ... }})"
    )]
    MissingBuiltin {
        /// Unprefixed component key
        name: String,
    },
    /// An asset could not be resolved.
    #[error(transparent)]
    Asset(#[from] AssetError),
    /// A component reported a failure of its own.
    #[error("Component `{name}` failed: {message}")]
    Component {
        /// Component key
        name: String,
        /// Failure description
        message: String,
    },
}

/// Failure to fetch or validate remote content.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("Failed to fetch MDX: {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },
    /// The network layer failed before a response arrived.
    #[error("Failed to fetch MDX: {0}")]
    Transport(String),
    /// The body is not a compiled document.
    #[error("Invalid MDX response format")]
    InvalidFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        assert_eq!(
            AssetError::NotFound { id: 7 }.to_string(),
            "Image: asset with ID \"7\" could not be found. Please check the image source."
        );
        assert_eq!(
            FetchError::Status { status: 404 }.to_string(),
            "Failed to fetch MDX: 404"
        );
        let err = RenderError::from(AssetError::Unresolved {
            value: "{}".into(),
        });
        assert_eq!(err.to_string(), "Unknown image source \"{}\" used in MDX.");
    }
}
