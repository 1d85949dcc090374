//! The demonstration clinics, also served whenever the database cannot
//! be reached.

use std::collections::BTreeMap;

use lazy_static::lazy_static;

use crate::clinic::{RawClinic, RawStatus, VaccinePayload};

lazy_static! {
    static ref CLINICS: Vec<RawClinic> = build();
}

/// Returns the six demonstration clinics.
pub fn clinics() -> &'static [RawClinic] {
    &CLINICS
}

/// Returns each city in the fixture once, sorted.
pub fn cities() -> Vec<String> {
    let mut cities: Vec<String> = CLINICS.iter().map(|c| c.city.clone()).collect();
    cities.sort();
    cities.dedup();

    cities
}

type Row<'a> = (
    i32,
    &'a str,
    &'a str,
    &'a str,
    (f64, f64),
    &'a str,
    &'a str,
    [bool; 6],
);

const VACCINES: [&str; 6] = [
    "COVID-19",
    "Gripe",
    "Febre Amarela",
    "Tétano",
    "Hepatite B",
    "Sarampo",
];

const ROWS: [Row<'static>; 6] = [
    (
        1,
        "UBS Vila Nova",
        "Rua das Flores, 123 - Teresina",
        "Teresina",
        (-5.0810, -42.8030),
        "open",
        "07:00 - 19:00",
        [true, true, false, true, true, false],
    ),
    (
        2,
        "UBS Central",
        "Av. Principal, 500 - Timon",
        "Timon",
        (-5.0940, -42.8367),
        "open",
        "08:00 - 18:00",
        [true, false, true, true, false, true],
    ),
    (
        3,
        "UBS Jardim América",
        "Rua dos Ipês, 78 - Teresina",
        "Teresina",
        (-5.1050, -42.7800),
        "open",
        "07:00 - 17:00",
        [false, true, true, false, true, true],
    ),
    (
        4,
        "UBS Parque das Árvores",
        "Alameda dos Cedros, 45 - Teresina",
        "Teresina",
        (-5.0600, -42.7700),
        "open",
        "08:00 - 20:00",
        [true, true, true, true, true, false],
    ),
    (
        5,
        "UBS São João",
        "Rua dos Pinheiros, 89 - Teresina",
        "Teresina",
        (-5.1300, -42.7900),
        "open",
        "07:00 - 17:00",
        [true, false, false, true, false, true],
    ),
    (
        6,
        "UBS Boa Vista",
        "Av. das Palmeiras, 321 - Demerval Lobão",
        "Demerval Lobão",
        (-5.3586, -42.6761),
        "closed",
        "08:00 - 18:00",
        [false, false, true, false, true, false],
    ),
];

fn build() -> Vec<RawClinic> {
    ROWS.iter()
        .map(
            |&(id, name, address, city, (latitude, longitude), status, hours, flags)| {
                let vaccines: BTreeMap<String, bool> = VACCINES
                    .iter()
                    .zip(flags.iter())
                    .map(|(name, available)| ((*name).to_owned(), *available))
                    .collect();

                RawClinic {
                    id,
                    name: name.to_owned(),
                    address: address.to_owned(),
                    city: city.to_owned(),
                    latitude: Some(latitude),
                    longitude: Some(longitude),
                    status: Some(RawStatus::Text(status.to_owned())),
                    opening_hours: Some(hours.to_owned()),
                    vaccines: Some(VaccinePayload::Flags(vaccines)),
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_rows_pass_the_check() {
        assert_eq!(clinics().len(), 6);
        assert!(clinics().iter().all(|c| c.check().is_ok()));
    }

    #[test]
    fn cities_are_unique_and_sorted() {
        assert_eq!(cities(), vec!["Demerval Lobão", "Teresina", "Timon"]);
    }
}
