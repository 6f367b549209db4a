use crate::{
    configuration::Configuration, configuration_handler::ConfigurationHandler,
    database_interface::DatabaseInterface, http::create_app,
    local_reservations::LocalReservations, schedule::SharedClock,
};
use mockable::DefaultClock;
use std::{error::Error, sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod backend;
mod calendar;
mod catalog;
mod configuration;
mod configuration_handler;
mod database_interface;
mod error;
mod http;
mod local_reservations;
mod reservations;
mod schedule;
mod schema;
mod status;
#[cfg(test)]
mod testutils;
mod types;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let configuration = ConfigurationHandler::parse_arguments();
    let clock: SharedClock = Arc::new(DefaultClock);

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, timezone = %configuration.timezone(), "Booking service listening");

    let app = if let Some(database_url) = configuration.database_url() {
        let backend = loop {
            match DatabaseInterface::new(&database_url) {
                Ok(backend) => {
                    info!("Successfully connected to database");
                    break backend;
                }
                Err(err) => {
                    error!(?err, "Failed to establish database connection. Retry in 1 sec. Restart without DATABASE_URL for impersistent bookings.");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        create_app(backend, configuration, clock)?
    } else {
        warn!("No database configured, bookings are kept in memory only");
        create_app(LocalReservations::default(), configuration, clock)?
    };

    axum::serve(listener, app).await?;
    Ok(())
}
