use std::str::FromStr;

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Errors raised while reading typed values from the environment.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The variable is required but not set.
    #[error(transparent)]
    Missing(#[from] MissingEnvVarError),

    /// The variable is set but its value does not parse.
    #[error("Invalid value for environment variable {name}: {value:?}")]
    Invalid { name: String, value: String },
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Reads an optional environment variable. Empty values count as unset.
pub fn get_env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses an optional variable value obtained from any source.
///
/// `raw` is what a lookup returned for `name`; empty values count as unset.
/// Returns [`EnvError::Invalid`] when the value is set but `T` cannot parse it.
pub fn parse_env_value<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, EnvError> {
    match raw.filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| EnvError::Invalid {
                name: name.to_string(),
                value: raw,
            }),
    }
}
