use shared_utils::env::MissingEnvVarError;
use thiserror::Error;

/// Errors that can occur within a provider implementation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider's API returned a specific error message (e.g., invalid API key).
    #[error("API error: {0}")]
    Api(String),

    /// The response body was not the JSON we expected.
    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request parameters were invalid for this specific provider.
    #[error("Invalid parameters for provider: {0}")]
    Validation(String),

    /// Every attempt failed; carries the last error.
    #[error("{call} failed after {attempts} attempts: {last}")]
    Exhausted {
        call: String,
        attempts: u32,
        #[source]
        last: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Transport, HTTP status and decode failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Request(_) | ProviderError::Status { .. } | ProviderError::Decode(_)
        )
    }
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Error)]
pub enum ProviderInitError {
    /// missed environment variable.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),

    /// failed to init reqwest client
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    /// API token contains invalid characters.
    #[error("Invalid API token format: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),

    /// The archive directory could not be prepared.
    #[error("Cannot prepare response archive {path}: {source}")]
    Archive {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
