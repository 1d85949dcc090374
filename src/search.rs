//! Filtering and proximity ordering over a snapshot of clinics.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::clinic::Clinic;
use crate::geo::{distance_km, round_km, GeoPoint};
use crate::normalization::search_key;

/// The sentinel meaning "do not filter".
pub const ALL: &str = "all";

/// A single-valued filter that can be switched off.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Filter {
    All,
    Only(String),
}

impl Filter {
    /// Parses the wire form: blank or `"all"` disables the filter.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();

        if value.is_empty() || value == ALL {
            Filter::All
        } else {
            Filter::Only(value.to_owned())
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str(ALL),
            Filter::Only(value) => f.write_str(value),
        }
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;

        Ok(Filter::parse(&value))
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What the user asked for. Every part must match.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SearchCriteria {
    /// Free text matched against name and address.
    #[serde(default)]
    pub query: String,

    #[serde(default)]
    pub vaccine: Filter,

    #[serde(default)]
    pub city: Filter,
}

impl SearchCriteria {
    pub fn new(query: impl Into<String>, vaccine: Filter, city: Filter) -> Self {
        SearchCriteria {
            query: query.into(),
            vaccine,
            city,
        }
    }

    pub fn by_vaccine(vaccine: impl AsRef<str>) -> Self {
        SearchCriteria::new("", Filter::parse(vaccine.as_ref()), Filter::All)
    }

    pub fn by_city(city: impl AsRef<str>) -> Self {
        SearchCriteria::new("", Filter::All, Filter::parse(city.as_ref()))
    }

    /// Whether `clinic` passes every predicate.
    pub fn matches(&self, clinic: &Clinic) -> bool {
        self.matches_text(clinic) && self.matches_vaccine(clinic) && self.matches_city(clinic)
    }

    fn matches_text(&self, clinic: &Clinic) -> bool {
        let needle = search_key(&self.query);

        needle.is_empty()
            || search_key(&clinic.name).contains(&needle)
            || search_key(&clinic.address).contains(&needle)
    }

    fn matches_vaccine(&self, clinic: &Clinic) -> bool {
        match &self.vaccine {
            Filter::All => true,
            Filter::Only(vaccine) => clinic.vaccines.is_available(vaccine),
        }
    }

    // Containment against the address, not equality against `city`.
    fn matches_city(&self, clinic: &Clinic) -> bool {
        match &self.city {
            Filter::All => true,
            Filter::Only(city) => clinic.address.contains(city.as_str()),
        }
    }
}

/// Returns the clinics matching `criteria`, in input order.
pub fn search<'a>(criteria: &SearchCriteria, clinics: &'a [Clinic]) -> Vec<&'a Clinic> {
    clinics
        .iter()
        .filter(|clinic| criteria.matches(clinic))
        .collect()
}

/// A clinic together with its distance from the search origin.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Nearby<'a> {
    #[serde(flatten)]
    pub clinic: &'a Clinic,

    #[serde(serialize_with = "serialize_rounded")]
    pub distance_km: f64,
}

fn serialize_rounded<S: Serializer>(distance: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_km(*distance))
}

/// Returns up to `limit` clinics closest to `origin`, nearest first.
/// Clinics without coordinates are never candidates; equal distances
/// keep their input order.
pub fn nearest<'a>(origin: GeoPoint, clinics: &'a [Clinic], limit: usize) -> Vec<Nearby<'a>> {
    if limit == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<Nearby<'a>> = clinics
        .iter()
        .filter_map(|clinic| {
            clinic.location.map(|location| Nearby {
                clinic,
                distance_km: distance_km(origin, location),
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    candidates.truncate(limit);

    candidates
}
