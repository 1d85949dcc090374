use std::sync::Arc;

use log::{error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, Reply, WithStatus};
use warp::Filter;

use crate::environment::Environment;
use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);
        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status_code_for(e)));
    }

    Err(rej)
}

/// Combines every public route and turns known rejections into JSON.
pub fn make_api_routes(
    environment: Environment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    let logger = environment.logger.clone();

    make_search_route(environment.clone())
        .or(make_nearby_route(environment.clone()))
        .or(make_cities_route(environment.clone()))
        .or(make_vaccines_route(environment.clone()))
        .or(make_availability_route(environment))
        .recover(move |r| format_rejection(logger.clone(), r))
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        BadRequest | InvalidLocationError(..) => StatusCode::BAD_REQUEST,
        UnknownClinic(..) | UnknownVaccine(..) => StatusCode::NOT_FOUND,
        LocationPending => StatusCode::CONFLICT,
        LocationFailed(..) => StatusCode::UNPROCESSABLE_ENTITY,
        RepositoryUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{body, get as g, path as p, path::param as par, put, query};

    use super::{handlers, query as q};
    use crate::environment::Environment;
    use crate::search::SearchCriteria;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name(environment: Environment) -> Route {
            let $route_variable = warp::any()
                .map(move || environment.clone());

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_search_route => search, rt; p("clinics"), end(), g(), query::<SearchCriteria>());
    route!(make_nearby_route => nearby, rt; p!("clinics" / "nearby"), end(), g(), query::<q::NearbyQuery>());
    route!(make_cities_route => cities, rt; p("cities"), end(), g());
    route!(make_vaccines_route => vaccines, rt; p("vaccines"), end(), g());
    route!(make_availability_route => set_availability, rt; p("clinics"), par::<i32>(), p("vaccines"), end(), put(), body::json::<q::AvailabilityUpdate>());
}
