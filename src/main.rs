use std::error::Error;
use std::sync::Arc;

use futures::future::FutureExt;
use tokio::sync::mpsc;
use warp::Filter;

use log::{info, initialize_logger, warn};
use ubs_finder::config::{get_catalog, get_optional_variable, get_variable};
use ubs_finder::directory::Directory;
use ubs_finder::environment::{Config, Environment};
use ubs_finder::repository::{MemoryRepository, PgRepository, Repository};
use ubs_finder::routes;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    #[cfg(feature = "env_logging")]
    let _guard = log::initialize_env_logger();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("UBS_PORT").parse()?;
    let admin_port: u16 = get_variable("UBS_ADMIN_PORT").parse()?;

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    let catalog = Arc::new(get_catalog());
    info!(logger, "Loaded vaccine catalog"; "vaccines" => catalog.len());

    let repository: Arc<dyn Repository + Send + Sync> =
        match get_optional_variable("UBS_DB_CONNECTION_STRING") {
            Some(connection_string) => {
                info!(logger, "Creating database pool...");
                Arc::new(PgRepository::connect_lazy(&connection_string)?)
            }
            None => {
                warn!(logger, "UBS_DB_CONNECTION_STRING not set, serving demonstration data");
                Arc::new(MemoryRepository::with_fixture((*catalog).clone()))
            }
        };

    let directory = Directory::new(logger.clone(), repository, catalog);
    let environment = Environment::new(logger.clone(), directory, Config::from_env());

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate: routes::admin::TerminationFunctionWrapper = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // a closed channel means shutdown is already under way
            let _ = termination_sender.send(()).await;
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let (_, main_server) = warp::serve(routes::make_api_routes(environment.clone()))
            .bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();

        let routes = routes::admin::make_healthz_route(environment)
            .or(routes::admin::make_termination_route(logger.clone(), terminate));

        let (_, admin_server) = warp::serve(routes)
            .bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
