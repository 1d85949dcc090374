use serde::Serialize;

use crate::catalog::Catalog;
use crate::clinic::Clinic;
use crate::directory::Source;
use crate::geo::GeoPoint;
use crate::search::Nearby;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Cities {
        source: Source,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<&'a str>,
        cities: Vec<String>,
    },
    Clinics {
        source: Source,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<&'a str>,
        clinics: Vec<&'a Clinic>,
    },
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
        source: Source,
        vaccines: usize,
    },
    Nearby {
        source: Source,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<&'a str>,
        origin: GeoPoint,
        clinics: Vec<Nearby<'a>>,
    },
    Vaccines {
        vaccines: &'a Catalog,
    },
}
