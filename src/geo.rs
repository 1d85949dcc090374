//! Great-circle distances and the one-shot geolocation boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }
}

/// Returns the haversine distance between two points in kilometres.
///
/// NaN or out-of-range input propagates as NaN; callers drop points
/// without coordinates before getting here.
///
/// ```
/// use ubs_finder::geo::{distance_km, GeoPoint};
/// let p = GeoPoint::new(-5.09, -42.80);
/// assert_eq!(distance_km(p, p), 0.0);
/// ```
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (delta_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Rounds a distance to two decimal places for display.
pub fn round_km(distance: f64) -> f64 {
    (distance * 100.0).round() / 100.0
}

/// The reasons a geolocation request can fail.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationError {
    PermissionDenied,
    Unavailable,
    Timeout,
}

impl GeolocationError {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => "permission_denied",
            GeolocationError::Unavailable => "unavailable",
            GeolocationError::Timeout => "timeout",
        }
    }
}

impl fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeolocationError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "permission_denied" => Ok(GeolocationError::PermissionDenied),
            "unavailable" => Ok(GeolocationError::Unavailable),
            "timeout" => Ok(GeolocationError::Timeout),
            other => Err(other.to_owned()),
        }
    }
}

/// Where a single geolocation request stands. `Pending` and `Failed`
/// are different outcomes and are never treated as an empty result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocationState {
    Pending,
    Located(GeoPoint),
    Failed(GeolocationError),
}

impl LocationState {
    /// Builds the state from what a client reported: a coordinate pair
    /// wins over a failure reason, and neither means no answer yet.
    pub fn from_report(
        latitude: Option<f64>,
        longitude: Option<f64>,
        error: Option<GeolocationError>,
    ) -> Self {
        match (latitude, longitude, error) {
            (Some(latitude), Some(longitude), _) => {
                LocationState::Located(GeoPoint::new(latitude, longitude))
            }
            (_, _, Some(error)) => LocationState::Failed(error),
            _ => LocationState::Pending,
        }
    }
}
