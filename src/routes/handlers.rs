use std::time::{Duration, Instant};

use log::{debug, o};
use warp::{
    http::StatusCode,
    reject,
    reply::{json, with_header, Reply},
};

use crate::environment::Environment;
use crate::errors::BackendError;
use crate::geo::{GeolocationError, LocationState};
use crate::routes::{
    query::{AvailabilityUpdate, NearbyQuery},
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::search::{self, SearchCriteria};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($body:tt)+) => {
        let start = Instant::now();

        let result = { $($body)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn search(environment: Environment, criteria: SearchCriteria) -> RouteResult {
    timed! {
        let logger = environment.logger.new(o!("query" => criteria.query.clone(), "vaccine" => criteria.vaccine.to_string(), "city" => criteria.city.to_string()));

        debug!(logger, "Searching clinics...");
        let snapshot = environment.directory.snapshot().await;
        let clinics = search::search(&criteria, &snapshot.clinics);
        debug!(logger, "Search complete"; "matches" => clinics.len(), "source" => ?snapshot.source);

        json(&SuccessResponse::Clinics {
            source: snapshot.source,
            notice: snapshot.source.notice(),
            clinics,
        })
    }
}

pub async fn nearby(environment: Environment, query: NearbyQuery) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::nearby(), e);

        let reported_error = query
            .error
            .as_deref()
            .map(str::parse::<GeolocationError>)
            .transpose()
            .map_err(|reason| error_handler(BackendError::InvalidLocationError(reason)))?;

        let origin = match LocationState::from_report(query.latitude, query.longitude, reported_error) {
            LocationState::Located(origin) => origin,
            LocationState::Pending => return Err(error_handler(BackendError::LocationPending).into()),
            LocationState::Failed(reason) => {
                return Err(error_handler(BackendError::LocationFailed(reason)).into())
            }
        };

        let limit = query.limit.unwrap_or(environment.config.nearby_limit);

        debug!(environment.logger, "Looking up nearby clinics..."; "latitude" => origin.latitude, "longitude" => origin.longitude, "limit" => limit);
        let snapshot = environment.directory.snapshot().await;
        let clinics = search::nearest(origin, &snapshot.clinics, limit);

        json(&SuccessResponse::Nearby {
            source: snapshot.source,
            notice: snapshot.source.notice(),
            origin,
            clinics,
        })
    }
}

pub async fn cities(environment: Environment) -> RouteResult {
    timed! {
        let (cities, source) = environment.directory.cities().await;

        json(&SuccessResponse::Cities {
            source,
            notice: source.notice(),
            cities,
        })
    }
}

pub async fn vaccines(environment: Environment) -> RouteResult {
    timed! {
        json(&SuccessResponse::Vaccines {
            vaccines: environment.directory.catalog(),
        })
    }
}

pub async fn set_availability(
    environment: Environment,
    clinic_id: i32,
    update: AvailabilityUpdate,
) -> RouteResult {
    timed! {
        let AvailabilityUpdate { vaccine, available } = update;
        let error_handler = |e: BackendError| Rejection::new(Context::set_availability(clinic_id, vaccine.clone()), e);

        environment
            .directory
            .set_availability(clinic_id, &vaccine, available)
            .await
            .map_err(error_handler)?;

        StatusCode::NO_CONTENT
    }
}

fn format_server_timing(elapsed: Duration) -> String {
    format!("handler;dur={}", elapsed.as_secs_f64() * 1000.0)
}
