use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc, Weekday};
use mockable::Clock;

use crate::{
    backend::ReservationBackend,
    catalog::{default_slots, SlotCatalog},
    configuration::Configuration,
    error::BackendError,
    schedule::{BookingSchedule, BookingZone, SharedClock},
    types::{NewReservation, Reservation, ReservationStatus, StatusUpdate, SOURCE_WEB},
};

/// Monday, 1 June 2026, 09:00 in New York.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 13, 0, 0).unwrap()
}

pub fn fixture_date(offset_days: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 1).unwrap() + Duration::days(offset_days)
}

pub struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub fn fixture_clock() -> SharedClock {
    Arc::new(FixtureClock {
        utc_now: fixture_now(),
    })
}

pub fn default_catalog() -> SlotCatalog {
    SlotCatalog::new(default_slots()).unwrap()
}

/// Default slots in New York, open every day.
pub fn default_schedule() -> BookingSchedule {
    BookingSchedule::new(
        default_catalog(),
        BookingZone::Named(chrono_tz::America::New_York),
        HashSet::new(),
    )
}

pub fn new_reservation(requested_start: DateTime<Utc>) -> NewReservation {
    NewReservation {
        customer_name: "Stefan".into(),
        email: "stefan@example.com".into(),
        phone: None,
        vehicle_details: None,
        service_interest: None,
        notes: None,
        requested_start,
        requested_end: requested_start + Duration::hours(3),
        status: ReservationStatus::Pending,
        source: SOURCE_WEB.into(),
        linked_user_id: None,
        created_at: fixture_now(),
    }
}

#[derive(Clone)]
pub struct TestConfiguration {
    pub timezone: String,
    pub closed_days: Vec<Weekday>,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".into(),
            closed_days: vec![],
        }
    }
}

impl Configuration for TestConfiguration {
    fn port(&self) -> String {
        "0".into()
    }

    fn database_url(&self) -> Option<String> {
        None
    }

    fn admin_password(&self) -> Option<String> {
        Some("123".into())
    }

    fn timezone(&self) -> String {
        self.timezone.clone()
    }

    fn closed_days(&self) -> HashSet<Weekday> {
        self.closed_days.iter().copied().collect()
    }
}

pub struct MockReservationBackendInner {
    pub success: AtomicBool,
    pub active_at_start: AtomicI64,
    pub calls_to_blocked_starts: AtomicU64,
    pub calls_to_count_active_at: AtomicU64,
    pub calls_to_insert_reservation: AtomicU64,
    pub calls_to_update_status: AtomicU64,
    pub calls_to_reservation: AtomicU64,
    pub calls_to_count_reservations: AtomicU64,
    pub blocked: Mutex<Vec<DateTime<Utc>>>,
}

#[derive(Clone)]
pub struct MockReservationBackend(pub Arc<MockReservationBackendInner>);

impl MockReservationBackendInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            active_at_start: AtomicI64::default(),
            calls_to_blocked_starts: AtomicU64::default(),
            calls_to_count_active_at: AtomicU64::default(),
            calls_to_insert_reservation: AtomicU64::default(),
            calls_to_update_status: AtomicU64::default(),
            calls_to_reservation: AtomicU64::default(),
            calls_to_count_reservations: AtomicU64::default(),
            blocked: Mutex::default(),
        }
    }
}

impl MockReservationBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockReservationBackendInner::new()))
    }

    pub fn fail(&self) {
        self.0.success.store(false, Ordering::SeqCst);
    }

    pub fn inserts(&self) -> u64 {
        self.0.calls_to_insert_reservation.load(Ordering::SeqCst)
    }

    fn result(&self) -> Result<(), BackendError> {
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(BackendError::Storage("Supposed to fail".into())),
        }
    }
}

impl ReservationBackend for MockReservationBackend {
    fn blocked_starts(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, BackendError> {
        self.0.calls_to_blocked_starts.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.blocked.lock().unwrap().clone())
    }

    fn count_active_at(&self, _start: DateTime<Utc>) -> Result<i64, BackendError> {
        self.0.calls_to_count_active_at.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(self.0.active_at_start.load(Ordering::SeqCst))
    }

    fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation, BackendError> {
        self.0
            .calls_to_insert_reservation
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(reservation.into_reservation(1))
    }

    fn update_status(&self, _id: i64, _update: StatusUpdate) -> Result<usize, BackendError> {
        self.0.calls_to_update_status.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(1)
    }

    fn reservation(&self, _id: i64) -> Result<Option<Reservation>, BackendError> {
        self.0.calls_to_reservation.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(None)
    }

    fn count_reservations(&self, _status: Option<ReservationStatus>) -> Result<i64, BackendError> {
        self.0
            .calls_to_count_reservations
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(0)
    }
}
