//! Environment variable helpers.

use std::str::FromStr;

/// Reads `name`, treating unset and blank values alike.
pub fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses `name` with `FromStr`, keeping the raw text for error reporting.
pub fn parse_var<T: FromStr>(name: &str) -> Option<Result<T, String>> {
    non_empty_var(name).map(|raw| raw.parse::<T>().map_err(|_| raw))
}
