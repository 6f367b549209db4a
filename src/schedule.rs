use crate::catalog::{default_slots, CatalogError, SlotCatalog, SlotDefinition};
use crate::configuration::Configuration;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc,
    Weekday,
};
use chrono_tz::Tz;
use mockable::Clock;
use std::{collections::HashSet, sync::Arc};
use tracing::warn;

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

pub const DEFAULT_TIMEZONE: &str = "America/New_York";
/// Days a booking may lie in the future.
pub const MAX_HORIZON_DAYS: i64 = 90;
/// Days the calendar shows at most.
pub const DEFAULT_HORIZON_DAYS: i64 = 45;
pub const DEFAULT_QUERY_DAYS: i64 = 30;

/// Zone all slot times are defined in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingZone {
    Named(Tz),
    SystemLocal,
}

impl BookingZone {
    pub fn resolve(name: &str) -> Self {
        match name.trim().parse::<Tz>() {
            Ok(tz) => Self::Named(tz),
            Err(err) => {
                warn!(?err, "Unknown timezone `{name}`, falling back to system local time");
                Self::SystemLocal
            }
        }
    }

    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Self::Named(tz) => instant.with_timezone(tz).fixed_offset(),
            Self::SystemLocal => instant.with_timezone(&Local).fixed_offset(),
        }
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.localize(now).date_naive()
    }

    /// Absolute instant of a wall-clock time in this zone. Ambiguous times
    /// take the earlier offset, times skipped by a DST jump move forward an hour.
    pub fn at(&self, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Named(tz) => resolve_local(tz, local),
            Self::SystemLocal => resolve_local(&Local, local),
        }
    }
}

fn resolve_local<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    zone.from_local_datetime(&local)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|instant| instant.fixed_offset())
}

/// Read-only booking configuration shared by every request.
#[derive(Debug, Clone)]
pub struct BookingSchedule {
    pub catalog: SlotCatalog,
    pub zone: BookingZone,
    pub closed_days: HashSet<Weekday>,
}

impl BookingSchedule {
    pub fn new(catalog: SlotCatalog, zone: BookingZone, closed_days: HashSet<Weekday>) -> Self {
        Self {
            catalog,
            zone,
            closed_days,
        }
    }

    pub fn is_closed(&self, date: NaiveDate) -> bool {
        self.closed_days.contains(&date.weekday())
    }

    pub fn slot_start(&self, date: NaiveDate, slot: &SlotDefinition) -> Option<DateTime<FixedOffset>> {
        let time = slot.start_time()?;
        self.zone.at(date.and_time(time))
    }

    /// Local midnight starting the given date.
    pub fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
        self.zone.at(date.and_hms_opt(0, 0, 0)?)
    }

    pub fn from_configuration<C: Configuration>(configuration: &C) -> Result<Self, CatalogError> {
        Ok(Self::new(
            SlotCatalog::new(default_slots())?,
            BookingZone::resolve(&configuration.timezone()),
            configuration.closed_days(),
        ))
    }
}

/// "8:00 AM – 11:00 AM"
pub fn window_label(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> String {
    format!("{} – {}", start.format("%-I:%M %p"), end.format("%-I:%M %p"))
}
