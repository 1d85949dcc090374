use std::env;
use std::fmt::Debug;
use std::str::FromStr;

use crate::catalog::Catalog;

/// Nearby results returned when the request names no limit.
pub const DEFAULT_NEARBY_LIMIT: usize = 3;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the value of the named environment variable unless it is
/// missing or blank.
pub fn get_optional_variable(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Parses the named environment variable, falling back to `default`
/// when it is absent. Panics if it is present but unparseable.
pub fn get_parsed_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Debug,
{
    match get_optional_variable(name) {
        Some(value) => value
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("parse {} ({:?}): {:?}", name, value, e)),
        None => default,
    }
}

/// Reads the vaccine catalog from `UBS_VACCINE_CATALOG`, a
/// comma-separated list, or uses the built-in one.
pub fn get_catalog() -> Catalog {
    get_optional_variable("UBS_VACCINE_CATALOG")
        .map(|list| Catalog::from_list(&list))
        .filter(|catalog| !catalog.is_empty())
        .unwrap_or_default()
}
