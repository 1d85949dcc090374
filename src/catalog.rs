use serde::Serialize;

use crate::normalization::normalize_name;

/// The vaccines tracked when no catalog is configured.
pub const DEFAULT_VACCINES: &[&str] = &[
    "COVID-19",
    "Gripe",
    "Febre Amarela",
    "Tétano",
    "Hepatite B",
    "Sarampo",
];

/// The fixed, ordered set of vaccine names the application knows about.
/// Every other component treats it as the universe of valid keys.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    names: Vec<String>,
}

impl Catalog {
    /// Creates a catalog from the given names, keeping the first
    /// spelling of any name that appears twice and dropping blanks.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Catalog { names: Vec::new() };

        for name in names {
            let name = name.as_ref().trim();

            if !name.is_empty() && catalog.lookup(name).is_none() {
                catalog.names.push(name.to_owned());
            }
        }

        catalog
    }

    /// Parses a comma-separated list such as `"COVID-19, Gripe"`.
    pub fn from_list(list: &str) -> Self {
        Catalog::new(list.split(','))
    }

    /// Returns the catalog spelling of `name`, if it is a catalog vaccine.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        let wanted = normalize_name(name);

        self.names
            .iter()
            .find(|n| normalize_name(n) == wanted)
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(DEFAULT_VACCINES)
    }
}
