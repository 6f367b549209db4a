use crate::backend::ReservationBackend;
use crate::error::BookingError;
use crate::schedule::{
    window_label, BookingSchedule, SharedClock, DEFAULT_HORIZON_DAYS, DEFAULT_QUERY_DAYS,
    MAX_HORIZON_DAYS,
};
use crate::types::{Availability, AvailabilityDay, AvailabilityRange, AvailabilitySlot, SlotMeta};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, SecondsFormat, Utc, Weekday};
use serde::Deserialize;
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, error};

/// Raw query parameters of the availability endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub month: Option<String>,
    pub start: Option<String>,
    pub days: Option<String>,
}

#[derive(Clone)]
pub struct CalendarProjector<B> {
    backend: B,
    schedule: Arc<BookingSchedule>,
    clock: SharedClock,
}

impl<B: ReservationBackend> CalendarProjector<B> {
    pub fn new(backend: B, schedule: Arc<BookingSchedule>, clock: SharedClock) -> Self {
        Self {
            backend,
            schedule,
            clock,
        }
    }

    /// Turns query parameters into a window start and a day count.
    /// Unparsable parameters are ignored.
    pub fn resolve_window(&self, query: &AvailabilityQuery) -> (NaiveDate, i64) {
        let mut start = self.schedule.zone.today(self.clock.utc());

        if let Some(month) = non_empty(&query.month) {
            if let Ok(first_of_month) = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
            {
                start = start.max(first_of_month);
            }
        }

        if let Some(requested) = non_empty(&query.start) {
            if let Ok(requested) = NaiveDate::parse_from_str(requested, "%Y-%m-%d") {
                start = start.max(requested);
            }
        }

        let days = non_empty(&query.days)
            .and_then(|days| days.parse::<i64>().ok())
            .filter(|days| *days > 0)
            .map(|days| days.min(MAX_HORIZON_DAYS))
            .unwrap_or(DEFAULT_QUERY_DAYS);

        (start, days)
    }

    pub fn availability(
        &self,
        window_start: NaiveDate,
        horizon_days: i64,
    ) -> Result<Availability, BookingError> {
        let now = self.schedule.zone.localize(self.clock.utc());
        let today = now.date_naive();
        let start = window_start.max(today);
        let days = horizon_days.clamp(1, MAX_HORIZON_DAYS).min(DEFAULT_HORIZON_DAYS);
        let end_exclusive = start + Duration::days(days);

        let range_start = self.day_boundary(start)?;
        let range_end = self.day_boundary(end_exclusive)?;
        let blocked: HashSet<DateTime<Utc>> = self
            .backend
            .blocked_starts(range_start, range_end)
            .map_err(|err| {
                error!(?err, "Failed to load blocked slots");
                BookingError::from(err)
            })?
            .into_iter()
            .collect();
        debug!(%start, days, blocked = blocked.len(), "Projecting availability");

        let days_out = start
            .iter_days()
            .take_while(|date| *date < end_exclusive)
            .map(|date| self.project_day(date, today, now, &blocked))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Availability {
            generated_at: now,
            range: AvailabilityRange {
                start: start.format("%Y-%m-%d").to_string(),
                end: (end_exclusive - Duration::days(1))
                    .format("%Y-%m-%d")
                    .to_string(),
                days,
            },
            days: days_out,
            slots: self.slot_meta(),
        })
    }

    fn project_day(
        &self,
        date: NaiveDate,
        today: NaiveDate,
        now: DateTime<FixedOffset>,
        blocked: &HashSet<DateTime<Utc>>,
    ) -> Result<AvailabilityDay, BookingError> {
        let is_closed = self.schedule.is_closed(date);
        let mut slots = Vec::with_capacity(self.schedule.catalog.definitions().len());

        if !is_closed {
            for slot in self.schedule.catalog.definitions() {
                let start = self
                    .schedule
                    .slot_start(date, slot)
                    .ok_or_else(|| unresolvable(date))?;
                let end = start + slot.duration;
                let available = start > now && !blocked.contains(&start.with_timezone(&Utc));

                slots.push(AvailabilitySlot {
                    id: slot.id.clone(),
                    label: slot.label.clone(),
                    window: window_label(start, end),
                    start_iso: start.to_rfc3339_opts(SecondsFormat::Secs, true),
                    end_iso: end.to_rfc3339_opts(SecondsFormat::Secs, true),
                    available,
                });
            }
        }

        Ok(AvailabilityDay {
            date: date.format("%Y-%m-%d").to_string(),
            label: date.format("%a, %b %-d").to_string(),
            is_today: date == today,
            is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            is_closed,
            has_availability: slots.iter().any(|slot| slot.available),
            slots,
        })
    }

    fn slot_meta(&self) -> Vec<SlotMeta> {
        self.schedule
            .catalog
            .definitions()
            .iter()
            .map(|slot| SlotMeta {
                id: slot.id.clone(),
                label: slot.label.clone(),
                description: slot.description.clone(),
                duration: slot.duration_label(),
            })
            .collect()
    }

    fn day_boundary(&self, date: NaiveDate) -> Result<DateTime<Utc>, BookingError> {
        self.schedule
            .start_of_day(date)
            .map(|midnight| midnight.with_timezone(&Utc))
            .ok_or_else(|| unresolvable(date))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn unresolvable(date: NaiveDate) -> BookingError {
    BookingError::Storage(format!("{date} has no representable local time"))
}
