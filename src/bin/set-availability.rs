use std::error::Error;
use std::sync::Arc;

use dotenv::dotenv;
use log::{info, initialize_logger};
use structopt::StructOpt;

use ubs_finder::config::{get_catalog, get_variable};
use ubs_finder::directory::Directory;
use ubs_finder::repository::PgRepository;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "set-availability",
    about = "Mark vaccines as available or unavailable at a clinic"
)]
struct Opt {
    /// The clinic ID
    clinic_id: i32,

    /// Mark the vaccines as unavailable instead
    #[structopt(long)]
    unavailable: bool,

    /// The vaccine names, as listed in the catalog
    #[structopt(required = true)]
    vaccines: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let opt = Opt::from_args();

    let logger = Arc::new(initialize_logger());

    let connection_string = get_variable("UBS_DB_CONNECTION_STRING");
    let repository = PgRepository::connect_lazy(&connection_string)?;
    let directory = Directory::new(
        logger.clone(),
        Arc::new(repository),
        Arc::new(get_catalog()),
    );

    let available = !opt.unavailable;

    for vaccine in &opt.vaccines {
        info!(logger, "Updating {} at clinic {}...", vaccine, opt.clinic_id; "available" => available);

        directory
            .set_availability(opt.clinic_id, vaccine, available)
            .await?;
    }

    info!(logger, "Done.");

    Ok(())
}
