use chrono::Weekday;
use std::collections::HashSet;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> String;
    fn database_url(&self) -> Option<String>;
    fn admin_password(&self) -> Option<String>;
    /// IANA name of the zone slot times are defined in.
    fn timezone(&self) -> String;
    fn closed_days(&self) -> HashSet<Weekday>;
}
