use crate::configuration::Configuration;
use crate::schedule::DEFAULT_TIMEZONE;
use chrono::Weekday;
use clap::Parser;
use std::collections::HashSet;

#[derive(Debug, Clone, Parser)]
#[command(name = "detailing_booking", about = "Booking slots and availability")]
pub struct ConfigurationHandler {
    #[arg(long, env = "PORT", default_value = "3000")]
    port: String,

    /// Without a database, bookings only live as long as the process.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD")]
    admin_password: Option<String>,

    #[arg(long, env = "BOOKING_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// Comma separated weekdays without bookings, e.g. `sat,sun`.
    #[arg(
        long,
        env = "BOOKING_CLOSED_DAYS",
        value_delimiter = ',',
        value_parser = parse_weekday
    )]
    closed_days: Vec<Weekday>,
}

fn parse_weekday(raw: &str) -> Result<Weekday, String> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("`{raw}` is not a weekday"))
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            tracing::debug!(?err, "No .env file loaded");
        }
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> String {
        self.port.clone()
    }

    fn database_url(&self) -> Option<String> {
        self.database_url.clone().filter(|url| !url.trim().is_empty())
    }

    fn admin_password(&self) -> Option<String> {
        self.admin_password
            .clone()
            .filter(|password| !password.is_empty())
    }

    fn timezone(&self) -> String {
        self.timezone.clone()
    }

    fn closed_days(&self) -> HashSet<Weekday> {
        self.closed_days.iter().copied().collect()
    }
}
