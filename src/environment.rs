use std::env;
use std::str::FromStr;

/// Retrieves an environment variable and splits it into a vector of strings based on a delimiter.
///
/// Empty segments are skipped, so an unset variable yields an empty vector.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `delimiter`: The character to split the environment variable's value by.
///
/// # Returns
/// - `Vec<String>`
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    env::var(var)
        .unwrap_or_default()
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Retrieves an environment variable, treating blank values as unset.
pub fn get_env_var(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Retrieves and parses an environment variable.
///
/// # Returns
/// - `Ok(None)` if the variable is unset or blank
/// - `Err` with a readable message if the value does not parse
pub fn get_env_var_parsed<T: FromStr>(var: &str) -> Result<Option<T>, String> {
    match get_env_var(var) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("environment variable {var} has unparseable value '{value}'")),
        None => Ok(None),
    }
}
