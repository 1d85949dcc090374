use serde::Deserialize;

/// Parameters of a nearby lookup. The client reports either the
/// coordinates it obtained or why it could not obtain any.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NearbyQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub limit: Option<usize>,
    pub error: Option<String>,
}

/// The body of an availability toggle.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AvailabilityUpdate {
    pub vaccine: String,
    pub available: bool,
}
