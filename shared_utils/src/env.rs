use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading process environment variables.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The variable is set but its value could not be parsed.
    #[error("Invalid value {value:?} for environment variable {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: String,
        /// Raw value found in the environment.
        value: String,
        /// Parser error message.
        reason: String,
    },
}

/// Reads an optional environment variable. Unset and blank values are both `None`.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an optional environment variable with [`FromStr`].
///
/// Returns `Ok(None)` when the variable is unset or blank, and
/// [`EnvError::Invalid`] when it is set but does not parse.
pub fn parse_env_var<T>(name: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_var_opt(name) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| EnvError::Invalid {
            name: name.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
