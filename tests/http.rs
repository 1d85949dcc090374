use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use log::o;
use warp::http::StatusCode;
use warp::Filter;

use ubs_finder::catalog::Catalog;
use ubs_finder::clinic::{ClinicId, RawClinic};
use ubs_finder::directory::{Directory, FALLBACK_NOTICE};
use ubs_finder::environment::{Config, Environment};
use ubs_finder::errors::BackendError;
use ubs_finder::repository::{MemoryRepository, Repository, Upsert};
use ubs_finder::routes;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClinicsResponse {
    source: String,
    notice: Option<String>,
    clinics: Vec<ClinicBody>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NearbyResponse {
    source: String,
    notice: Option<String>,
    origin: serde_json::Value,
    clinics: Vec<ClinicBody>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClinicBody {
    id: i32,
    name: String,
    address: String,
    city: String,
    location: Option<serde_json::Value>,
    status: String,
    opening_hours: String,
    vaccines: serde_json::Map<String, serde_json::Value>,
    distance_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CitiesResponse {
    source: String,
    notice: Option<String>,
    cities: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ErrorResponse {
    context: String,
    message: String,
    clinic_id: Option<i32>,
    vaccine: Option<String>,
}

static SLOG_SCOPE_GUARD: OnceCell<slog_scope::GlobalLoggerGuard> = OnceCell::new();

const TERESINA: (f64, f64) = (-5.0892, -42.8019);

/// A repository whose database is never reachable.
struct Unreachable;

fn unreachable() -> BackendError {
    BackendError::RepositoryUnavailable {
        source: sqlx::Error::PoolTimedOut,
    }
}

impl Repository for Unreachable {
    fn fetch_all(&self) -> BoxFuture<Result<Vec<RawClinic>, BackendError>> {
        async { Err(unreachable()) }.boxed()
    }

    fn fetch_distinct_cities(&self) -> BoxFuture<Result<Vec<String>, BackendError>> {
        async { Err(unreachable()) }.boxed()
    }

    fn set_availability(
        &self,
        _clinic_id: ClinicId,
        _vaccine: &str,
        _available: bool,
    ) -> BoxFuture<Result<Upsert, BackendError>> {
        async { Err(unreachable()) }.boxed()
    }
}

#[tokio::test]
async fn empty_search_returns_every_clinic_in_order() {
    let filter = make_filter("empty_search", live_repository());

    let response = warp::test::request()
        .path("/clinics?query=&vaccine=all&city=all")
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("server-timing"));

    let body: ClinicsResponse = parse(response.body());
    assert_eq!(body.source, "live");
    assert_eq!(body.notice, None);
    assert_eq!(ids(&body.clinics), vec![1, 2, 3, 4, 5, 6]);

    for clinic in &body.clinics {
        assert_eq!(clinic.vaccines.len(), 6, "{} has a dense vaccine map", clinic.name);
        assert!(clinic.location.is_some());
        assert!(clinic.distance_km.is_none());
    }

    assert_eq!(body.clinics[5].status, "closed");
    assert_eq!(body.clinics[0].opening_hours, "07:00 - 19:00");
}

#[tokio::test]
async fn search_without_parameters_is_unfiltered() {
    let filter = make_filter("search_without_parameters", live_repository());

    let response = warp::test::request().path("/clinics").reply(&filter).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ids(&parse::<ClinicsResponse>(response.body()).clinics).len(), 6);
}

#[tokio::test]
async fn text_search_finds_jardim_america() {
    let filter = make_filter("text_search", live_repository());

    let response = warp::test::request()
        .path("/clinics?query=jardim&vaccine=all&city=all")
        .reply(&filter)
        .await;

    let body: ClinicsResponse = parse(response.body());
    assert_eq!(body.clinics.len(), 1);
    assert_eq!(body.clinics[0].name, "UBS Jardim América");
    assert_eq!(body.clinics[0].address, "Rua dos Ipês, 78 - Teresina");
}

#[tokio::test]
async fn vaccine_filter_returns_clinics_with_stock() {
    let filter = make_filter("vaccine_filter", live_repository());

    let response = warp::test::request()
        .path("/clinics?query=&vaccine=Gripe&city=all")
        .reply(&filter)
        .await;

    let body: ClinicsResponse = parse(response.body());
    assert_eq!(ids(&body.clinics), vec![1, 3, 4]);
    assert!(body
        .clinics
        .iter()
        .all(|c| c.vaccines["Gripe"] == serde_json::Value::Bool(true)));

    let response = warp::test::request()
        .path("/clinics?vaccine=Febre%20Amarela&city=Teresina")
        .reply(&filter)
        .await;

    let body: ClinicsResponse = parse(response.body());
    assert_eq!(ids(&body.clinics), vec![3, 4]);
    assert!(body.clinics.iter().all(|c| c.city == "Teresina"));
}

#[tokio::test]
async fn unreachable_repository_serves_fallback_data() {
    let filter = make_filter("fallback", Arc::new(Unreachable));

    let response = warp::test::request()
        .path("/clinics?query=ubs")
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::OK);

    let body: ClinicsResponse = parse(response.body());
    assert_eq!(body.source, "fallback");
    assert_eq!(body.notice.as_deref(), Some(FALLBACK_NOTICE));
    assert_eq!(body.clinics.len(), 6);

    let response = warp::test::request().path("/cities").reply(&filter).await;

    let body: CitiesResponse = parse(response.body());
    assert_eq!(body.source, "fallback");
    assert!(body.notice.is_some());
    assert_eq!(body.cities, vec!["Demerval Lobão", "Teresina", "Timon"]);
}

#[tokio::test]
async fn cities_and_vaccines_are_listed() {
    let filter = make_filter("listings", live_repository());

    let response = warp::test::request().path("/cities").reply(&filter).await;
    let body: CitiesResponse = parse(response.body());
    assert_eq!(body.source, "live");
    assert_eq!(body.cities.len(), 3);

    let response = warp::test::request().path("/vaccines").reply(&filter).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = parse(response.body());
    assert_eq!(
        body["vaccines"],
        serde_json::json!(["COVID-19", "Gripe", "Febre Amarela", "Tétano", "Hepatite B", "Sarampo"])
    );
}

#[tokio::test]
async fn nearby_returns_closest_clinics_first() {
    let filter = make_filter("nearby", live_repository());

    let response = warp::test::request()
        .path(&format!(
            "/clinics/nearby?latitude={}&longitude={}&limit=3",
            TERESINA.0, TERESINA.1
        ))
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::OK);

    let body: NearbyResponse = parse(response.body());
    assert_eq!(body.source, "live");
    assert_eq!(body.notice, None);
    assert_eq!(body.origin["latitude"], serde_json::json!(TERESINA.0));
    assert_eq!(ids(&body.clinics), vec![1, 3, 2]);

    let distances: Vec<f64> = body
        .clinics
        .iter()
        .map(|c| c.distance_km.expect("nearby clinics carry a distance"))
        .collect();
    assert_eq!(distances[0], 0.92);
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn nearby_uses_the_configured_limit() {
    let filter = make_filter("nearby_limit", live_repository());

    let response = warp::test::request()
        .path(&format!(
            "/clinics/nearby?latitude={}&longitude={}",
            TERESINA.0, TERESINA.1
        ))
        .reply(&filter)
        .await;

    assert_eq!(parse::<NearbyResponse>(response.body()).clinics.len(), 3);

    let response = warp::test::request()
        .path(&format!(
            "/clinics/nearby?latitude={}&longitude={}&limit=0",
            TERESINA.0, TERESINA.1
        ))
        .reply(&filter)
        .await;

    assert!(parse::<NearbyResponse>(response.body()).clinics.is_empty());
}

#[tokio::test]
async fn nearby_distinguishes_missing_and_failed_locations() {
    let filter = make_filter("nearby_failures", live_repository());

    let response = warp::test::request()
        .path("/clinics/nearby")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(parse::<ErrorResponse>(response.body()).context, "nearby");

    let response = warp::test::request()
        .path("/clinics/nearby?error=permission_denied")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorResponse = parse(response.body());
    assert!(body.message.contains("permission_denied"), "{}", body.message);

    let response = warp::test::request()
        .path("/clinics/nearby?error=timeout")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = warp::test::request()
        .path("/clinics/nearby?error=sunspots")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = warp::test::request()
        .path(&format!(
            "/clinics/nearby?latitude={}&longitude={}&limit=-1",
            TERESINA.0, TERESINA.1
        ))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggling_availability_changes_search_results() {
    let filter = make_filter("toggle", live_repository());

    for _ in 0..2 {
        let response = warp::test::request()
            .method("PUT")
            .path("/clinics/2/vaccines")
            .json(&serde_json::json!({ "vaccine": "Gripe", "available": true }))
            .reply(&filter)
            .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = warp::test::request()
        .path("/clinics?vaccine=Gripe")
        .reply(&filter)
        .await;
    assert_eq!(ids(&parse::<ClinicsResponse>(response.body()).clinics), vec![1, 2, 3, 4]);

    let response = warp::test::request()
        .method("PUT")
        .path("/clinics/1/vaccines")
        .json(&serde_json::json!({ "vaccine": "Gripe", "available": false }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = warp::test::request()
        .path("/clinics?vaccine=Gripe")
        .reply(&filter)
        .await;
    assert_eq!(ids(&parse::<ClinicsResponse>(response.body()).clinics), vec![2, 3, 4]);
}

#[tokio::test]
async fn bad_toggles_are_reported() {
    let filter = make_filter("bad_toggles", live_repository());

    let response = warp::test::request()
        .method("PUT")
        .path("/clinics/99/vaccines")
        .json(&serde_json::json!({ "vaccine": "Gripe", "available": true }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: ErrorResponse = parse(response.body());
    assert_eq!(body.context, "set_availability");
    assert_eq!(body.clinic_id, Some(99));
    assert_eq!(body.vaccine.as_deref(), Some("Gripe"));

    let response = warp::test::request()
        .method("PUT")
        .path("/clinics/1/vaccines")
        .json(&serde_json::json!({ "vaccine": "Raiva", "available": true }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = warp::test::request()
        .method("PUT")
        .path("/clinics/1/vaccines")
        .json(&serde_json::json!({ "vaccine": "Gripe", "available": true, "extra": 1 }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = warp::test::request()
        .method("PUT")
        .path("/clinics/1/vaccines")
        .header("content-type", "application/json")
        .body("available: yes")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = warp::test::request()
        .path("/clinics?vaccine=Gripe")
        .reply(&filter)
        .await;
    assert_eq!(
        ids(&parse::<ClinicsResponse>(response.body()).clinics),
        vec![1, 3, 4],
        "rejected toggles change nothing"
    );

    let filter = make_filter("bad_toggles_unreachable", Arc::new(Unreachable));

    let response = warp::test::request()
        .method("PUT")
        .path("/clinics/1/vaccines")
        .json(&serde_json::json!({ "vaccine": "Gripe", "available": true }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

fn live_repository() -> Arc<dyn Repository + Send + Sync> {
    Arc::new(MemoryRepository::with_fixture(Catalog::default()))
}

fn make_filter(
    test_name: &'static str,
    repository: Arc<dyn Repository + Send + Sync>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone + 'static {
    initialize_global_logger();

    let logger = Arc::new(slog_scope::logger().new(o!("test" => test_name)));
    let directory = Directory::new(logger.clone(), repository, Arc::new(Catalog::default()));
    let environment = Environment::new(logger, directory, Config::default());

    routes::make_api_routes(environment)
}

fn initialize_global_logger() {
    SLOG_SCOPE_GUARD.get_or_init(|| slog_envlogger::init().expect("initialize slog-envlogger"));
}

fn parse<'a, T: Deserialize<'a>>(body: &'a [u8]) -> T {
    serde_json::from_slice(body).unwrap_or_else(|e| {
        panic!(
            "parse {:?} as JSON: {}",
            String::from_utf8_lossy(body),
            e
        )
    })
}

fn ids(clinics: &[ClinicBody]) -> Vec<i32> {
    clinics.iter().map(|c| c.id).collect()
}
