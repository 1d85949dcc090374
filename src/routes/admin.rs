use std::convert::Infallible;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::{info, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, Reply};
use warp::Filter;

use super::response::SuccessResponse;
use crate::environment::Environment;

/// Reports the build and whether clinic data is currently coming from
/// the repository or from the fallback set. Always answers 200: a
/// fallback is degraded service, not an outage.
pub fn make_healthz_route(
    environment: Environment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    warp::path("healthz").and(warp::get()).and_then(move || {
        let environment = environment.clone();

        async move {
            let (_, source) = environment.directory.cities().await;

            Ok::<_, Infallible>(json(&SuccessResponse::Healthz {
                revision: info::REVISION,
                timestamp: info::BUILD_TIMESTAMP,
                version: info::VERSION,
                source,
                vaccines: environment.directory.catalog().len(),
            }))
        }
    })
}

pub type TerminationFuture = BoxFuture<'static, ()>;

pub type TerminationFunctionWrapper = Arc<dyn Fn() -> TerminationFuture + Send + Sync>;

pub fn make_termination_route(
    logger: Arc<Logger>,
    terminate: TerminationFunctionWrapper,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    warp::path("terminate").and(warp::post()).and_then(move || {
        let logger = logger.clone();
        let terminate = terminate.clone();

        async move {
            info!(logger, "Termination requested");
            terminate().await;

            Ok::<_, Infallible>(StatusCode::NO_CONTENT)
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use futures::future::FutureExt;

    use super::*;
    use crate::catalog::Catalog;
    use crate::directory::Directory;
    use crate::environment::Config;
    use crate::repository::MemoryRepository;

    fn environment() -> Environment {
        let logger = Arc::new(log::discard());
        let directory = Directory::new(
            logger.clone(),
            Arc::new(MemoryRepository::with_fixture(Catalog::default())),
            Arc::new(Catalog::default()),
        );

        Environment::new(logger, directory, Config::default())
    }

    #[tokio::test]
    async fn healthz_reports_version_and_data_source() {
        let response = warp::test::request()
            .path("/healthz")
            .reply(&make_healthz_route(environment()))
            .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value =
            serde_json::from_slice(response.body()).expect("parse healthz response");
        assert_eq!(body["version"], info::VERSION);
        assert_eq!(body["source"], "live");
        assert_eq!(body["vaccines"], 6);
    }

    #[tokio::test]
    async fn termination_calls_back() {
        let called = Arc::new(AtomicBool::new(false));

        let terminate: TerminationFunctionWrapper = {
            let called = called.clone();

            Arc::new(move || {
                let called = called.clone();

                async move {
                    called.store(true, Ordering::SeqCst);
                }
                .boxed()
            })
        };

        let response = warp::test::request()
            .method("POST")
            .path("/terminate")
            .reply(&make_termination_route(Arc::new(log::discard()), terminate))
            .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(called.load(Ordering::SeqCst));

        let response = warp::test::request()
            .path("/terminate")
            .reply(&make_termination_route(Arc::new(log::discard()), Arc::new(|| async {}.boxed())))
            .await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
