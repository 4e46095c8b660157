use adminboard_core::error::CoreError;

/// Errors from the REST client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A domain-level error from `adminboard_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The HTTP request itself failed (network, DNS, TLS, timeout, body
    /// decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the raw body when it has none.
        message: String,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for client return values.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// HTTP status of an [`ClientError::Api`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text suitable for a blocking alert.
    pub fn user_message(&self) -> String {
        match self {
            Self::Core(CoreError::NotFound { entity, id }) => {
                format!("{entity} {id} no longer exists. Reload the list.")
            }
            Self::Core(CoreError::Validation(msg)) => msg.clone(),
            Self::Core(other) => other.to_string(),
            Self::Request(_) => {
                "The server could not be reached. Check your connection and try again.".into()
            }
            Self::Api { message, .. } => message.clone(),
            Self::Config(msg) => msg.clone(),
        }
    }
}
