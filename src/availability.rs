//! Turns raw clinic rows into the canonical, dense view.

use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::clinic::{
    Association, Availability, Clinic, ClinicStatus, RawClinic, VaccinePayload,
    DEFAULT_OPENING_HOURS,
};
use crate::normalization::normalize_name;

/// Normalizes a single row. Never fails: an unreadable vaccine payload
/// leaves every catalog vaccine unavailable for this clinic only.
pub fn normalize(raw: &RawClinic, catalog: &Catalog) -> Clinic {
    Clinic {
        id: raw.id,
        name: raw.name.trim().to_owned(),
        address: raw.address.trim().to_owned(),
        city: raw.city.trim().to_owned(),
        location: raw.location(),
        status: ClinicStatus::from_raw(raw.status.as_ref()),
        opening_hours: raw
            .opening_hours
            .as_deref()
            .map(str::trim)
            .filter(|hours| !hours.is_empty())
            .unwrap_or(DEFAULT_OPENING_HOURS)
            .to_owned(),
        vaccines: dense(raw.vaccines.as_ref(), catalog),
    }
}

/// Normalizes a batch, preserving order.
pub fn normalize_all<'a>(
    rows: impl IntoIterator<Item = &'a RawClinic>,
    catalog: &Catalog,
) -> Vec<Clinic> {
    rows.into_iter().map(|raw| normalize(raw, catalog)).collect()
}

/// Expands a payload into one entry per catalog vaccine, in catalog
/// order. Names outside the catalog are dropped.
pub fn dense(payload: Option<&VaccinePayload>, catalog: &Catalog) -> Availability {
    let explicit: BTreeMap<String, bool> = match payload {
        Some(VaccinePayload::Names(names)) => names
            .iter()
            .map(|name| (normalize_name(name), true))
            .collect(),
        Some(VaccinePayload::Flags(flags)) => normalize_keys(flags),
        Some(VaccinePayload::Associations(rows)) => normalize_keys(&Association::flatten(rows)),
        Some(VaccinePayload::Unreadable { .. }) | None => BTreeMap::new(),
    };

    let entries = catalog
        .names()
        .map(|name| {
            let available = explicit
                .get(&normalize_name(name))
                .copied()
                .unwrap_or(false);

            (name.to_owned(), available)
        })
        .collect();

    Availability::from_entries(entries)
}

fn normalize_keys(flags: &BTreeMap<String, bool>) -> BTreeMap<String, bool> {
    flags
        .iter()
        .map(|(name, available)| (normalize_name(name), *available))
        .collect()
}
