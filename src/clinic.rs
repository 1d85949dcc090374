use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geo::GeoPoint;
use crate::normalization::{normalize_name, search_key};

/// An ID in the database.
pub type ClinicId = i32;

/// Opening hours shown when a record carries none.
pub const DEFAULT_OPENING_HOURS: &str = "08:00 - 18:00";

/// A single health unit in its canonical form: every catalog vaccine
/// has an entry, and the status is one of the two enum values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Clinic {
    pub id: ClinicId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub location: Option<GeoPoint>,
    pub status: ClinicStatus,
    pub opening_hours: String,
    pub vaccines: Availability,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClinicStatus {
    Open,
    Closed,
}

impl ClinicStatus {
    /// Maps any source representation onto the enum. `"open"`, its
    /// Portuguese equivalents and `true` are open; everything else,
    /// including a missing value, is closed.
    pub fn from_raw(raw: Option<&RawStatus>) -> Self {
        match raw {
            Some(RawStatus::Flag(true)) => ClinicStatus::Open,
            Some(RawStatus::Text(text)) => match search_key(text).as_str() {
                "open" | "aberto" | "aberta" => ClinicStatus::Open,
                _ => ClinicStatus::Closed,
            },
            _ => ClinicStatus::Closed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicStatus::Open => "open",
            ClinicStatus::Closed => "closed",
        }
    }
}

/// A status as it may appear in source data.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawStatus {
    Flag(bool),
    Text(String),
}

/// A clinic row exactly as the repository hands it over.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawClinic {
    pub id: ClinicId,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub status: Option<RawStatus>,
    #[serde(default, alias = "openingHours")]
    pub opening_hours: Option<String>,
    #[serde(default, deserialize_with = "deserialize_payload")]
    pub vaccines: Option<VaccinePayload>,
}

impl RawClinic {
    /// The clinic's position, if it has both coordinates and both are
    /// finite.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Some(GeoPoint::new(latitude, longitude))
            }
            _ => None,
        }
    }

    /// Checks the fields nothing downstream can repair.
    pub fn check(&self) -> Result<(), &'static str> {
        if self.id <= 0 {
            return Err("non-positive ID");
        }

        if self.name.trim().is_empty() {
            return Err("blank name");
        }

        Ok(())
    }
}

/// The vaccine availability carried by a raw row. Only the adapters
/// in this module produce it, so the normalizer never has to guess
/// which shape it is looking at.
#[derive(Clone, Debug, PartialEq)]
pub enum VaccinePayload {
    /// Names of the vaccines that are available.
    Names(Vec<String>),

    /// Availability keyed by vaccine name.
    Flags(BTreeMap<String, bool>),

    /// Rows from the clinic/vaccine join table.
    Associations(Vec<Association>),

    /// A payload that could not be decoded.
    Unreadable { reason: String },
}

/// One row of the clinic/vaccine association, with the join table's
/// own columns nested the way the ORM returned them.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Association {
    pub name: String,
    #[serde(rename = "joinAttributes")]
    pub join_attributes: JoinAttributes,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct JoinAttributes {
    #[serde(default)]
    pub available: bool,
}

impl Association {
    pub fn new(name: impl Into<String>, available: bool) -> Self {
        Association {
            name: name.into(),
            join_attributes: JoinAttributes { available },
        }
    }

    /// Collapses association rows into the name → flag form. A name
    /// listed twice keeps its last value.
    pub fn flatten(rows: &[Association]) -> BTreeMap<String, bool> {
        rows.iter()
            .map(|row| (row.name.clone(), row.join_attributes.available))
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePayload {
    Names(Vec<String>),
    Flags(BTreeMap<String, bool>),
    Associations(Vec<Association>),
}

impl From<WirePayload> for VaccinePayload {
    fn from(wire: WirePayload) -> Self {
        match wire {
            WirePayload::Names(names) => VaccinePayload::Names(names),
            WirePayload::Flags(flags) => VaccinePayload::Flags(flags),
            WirePayload::Associations(rows) => VaccinePayload::Associations(rows),
        }
    }
}

impl VaccinePayload {
    /// Decodes a JSON value. A string is treated as serialized JSON and
    /// decoded in turn. Anything that fits none of the known shapes
    /// becomes `Unreadable` instead of an error.
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(serialized) => VaccinePayload::from_json(&serialized),
            value => serde_json::from_value::<WirePayload>(value)
                .map(VaccinePayload::from)
                .unwrap_or_else(|e| VaccinePayload::Unreadable {
                    reason: e.to_string(),
                }),
        }
    }

    /// Decodes serialized JSON; see `from_value`.
    pub fn from_json(serialized: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(serialized) {
            Ok(serde_json::Value::String(_)) => VaccinePayload::Unreadable {
                reason: "doubly serialized payload".to_owned(),
            },
            Ok(value) => VaccinePayload::from_value(value),
            Err(e) => VaccinePayload::Unreadable {
                reason: e.to_string(),
            },
        }
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self, VaccinePayload::Unreadable { .. })
    }
}

fn deserialize_payload<'de, D>(deserializer: D) -> Result<Option<VaccinePayload>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Deserialize::deserialize(deserializer)?;

    Ok(value.map(VaccinePayload::from_value))
}

/// A dense availability map in catalog order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Availability {
    entries: Vec<(String, bool)>,
}

impl Availability {
    pub(crate) fn from_entries(entries: Vec<(String, bool)>) -> Self {
        Availability { entries }
    }

    /// Returns the flag for `name`, matching regardless of accent
    /// composition.
    pub fn get(&self, name: &str) -> Option<bool> {
        let wanted = normalize_name(name);

        self.entries
            .iter()
            .find(|(n, _)| normalize_name(n) == wanted)
            .map(|(_, available)| *available)
    }

    /// Whether `name` is available; unknown names never are.
    pub fn is_available(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), *a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the map in the name → flag payload form.
    pub fn to_flags(&self) -> BTreeMap<String, bool> {
        self.entries.iter().cloned().collect()
    }

    pub(crate) fn set(&mut self, name: &str, available: bool) -> bool {
        let wanted = normalize_name(name);

        match self.entries.iter_mut().find(|(n, _)| normalize_name(n) == wanted) {
            Some(entry) => {
                entry.1 = available;
                true
            }
            None => false,
        }
    }
}

impl Serialize for Availability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;

        for (name, available) in &self.entries {
            map.serialize_entry(name, available)?;
        }

        map.end()
    }
}
