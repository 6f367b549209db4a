use crate::backend::ReservationBackend;
use crate::error::BackendError;
use crate::schema::bookings;
use crate::types::{NewReservation, Reservation, ReservationStatus, StatusUpdate};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{ConnectionError, PgConnection};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct BookingRow {
    id: i64,
    customer_name: String,
    email: String,
    phone: Option<String>,
    vehicle_details: Option<String>,
    service_interest: Option<String>,
    notes: Option<String>,
    requested_start: DateTime<Utc>,
    requested_end: DateTime<Utc>,
    status: String,
    source: String,
    internal_notes: Option<String>,
    linked_user_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Reservation {
    type Error = BackendError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = ReservationStatus::normalize(&row.status).map_err(|_| {
            BackendError::Storage(format!("booking {} has unknown status `{}`", row.id, row.status))
        })?;
        Ok(Reservation {
            id: row.id,
            customer_name: row.customer_name,
            email: row.email,
            phone: row.phone,
            vehicle_details: row.vehicle_details,
            service_interest: row.service_interest,
            notes: row.notes,
            requested_start: row.requested_start,
            requested_end: row.requested_end,
            status,
            source: row.source,
            internal_notes: row.internal_notes,
            linked_user_id: row.linked_user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = bookings)]
struct NewBookingRow<'a> {
    customer_name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    vehicle_details: Option<&'a str>,
    service_interest: Option<&'a str>,
    notes: Option<&'a str>,
    requested_start: DateTime<Utc>,
    requested_end: DateTime<Utc>,
    status: &'a str,
    source: &'a str,
    linked_user_id: Option<&'a str>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'a> From<&'a NewReservation> for NewBookingRow<'a> {
    fn from(reservation: &'a NewReservation) -> Self {
        Self {
            customer_name: &reservation.customer_name,
            email: &reservation.email,
            phone: reservation.phone.as_deref(),
            vehicle_details: reservation.vehicle_details.as_deref(),
            service_interest: reservation.service_interest.as_deref(),
            notes: reservation.notes.as_deref(),
            requested_start: reservation.requested_start,
            requested_end: reservation.requested_end,
            status: reservation.status.as_str(),
            source: &reservation.source,
            linked_user_id: reservation.linked_user_id.as_deref(),
            created_at: reservation.created_at,
            updated_at: reservation.created_at,
        }
    }
}

fn active_statuses() -> Vec<&'static str> {
    ReservationStatus::ACTIVE
        .iter()
        .map(ReservationStatus::as_str)
        .collect()
}

fn storage(err: DieselError) -> BackendError {
    BackendError::Storage(err.to_string())
}

/// PostgreSQL backend. Active start uniqueness is guarded by the
/// `idx_bookings_active_start` partial unique index.
#[derive(Clone)]
pub struct DatabaseInterface {
    connection: Arc<Mutex<PgConnection>>,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> Result<Self, ConnectionError> {
        let connection = Self::establish_connection(database_url)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn establish_connection(database_url: &str) -> Result<PgConnection, ConnectionError> {
        PgConnection::establish(database_url)
    }

    fn connection(&self) -> Result<MutexGuard<'_, PgConnection>, BackendError> {
        self.connection
            .lock()
            .map_err(|_| BackendError::Storage("database connection lock poisoned".into()))
    }
}

impl ReservationBackend for DatabaseInterface {
    fn blocked_starts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, BackendError> {
        let mut connection = self.connection()?;
        bookings::table
            .filter(bookings::requested_start.ge(start))
            .filter(bookings::requested_start.lt(end))
            .filter(bookings::status.eq_any(active_statuses()))
            .select(bookings::requested_start)
            .load::<DateTime<Utc>>(&mut *connection)
            .map_err(storage)
    }

    fn count_active_at(&self, start: DateTime<Utc>) -> Result<i64, BackendError> {
        let mut connection = self.connection()?;
        bookings::table
            .filter(bookings::requested_start.eq(start))
            .filter(bookings::status.eq_any(active_statuses()))
            .count()
            .get_result::<i64>(&mut *connection)
            .map_err(storage)
    }

    fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation, BackendError> {
        let mut connection = self.connection()?;
        let row = diesel::insert_into(bookings::table)
            .values(NewBookingRow::from(&reservation))
            .on_conflict_do_nothing()
            .returning(BookingRow::as_returning())
            .get_result(&mut *connection)
            .optional()
            .map_err(storage)?;

        match row {
            Some(row) => row.try_into(),
            None => Err(BackendError::Conflict(reservation.requested_start)),
        }
    }

    fn update_status(&self, id: i64, update: StatusUpdate) -> Result<usize, BackendError> {
        let mut connection = self.connection()?;
        let result = diesel::update(bookings::table.find(id))
            .set((
                bookings::status.eq(update.status.as_str()),
                bookings::internal_notes.eq(update.internal_notes.as_deref()),
                bookings::updated_at.eq(update.updated_at),
            ))
            .execute(&mut *connection);

        match result {
            Ok(updated) => Ok(updated),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                let start = bookings::table
                    .find(id)
                    .select(bookings::requested_start)
                    .first::<DateTime<Utc>>(&mut *connection)
                    .map_err(storage)?;
                Err(BackendError::Conflict(start))
            }
            Err(err) => Err(storage(err)),
        }
    }

    fn reservation(&self, id: i64) -> Result<Option<Reservation>, BackendError> {
        let mut connection = self.connection()?;
        bookings::table
            .find(id)
            .select(BookingRow::as_select())
            .first(&mut *connection)
            .optional()
            .map_err(storage)?
            .map(Reservation::try_from)
            .transpose()
    }

    fn count_reservations(&self, status: Option<ReservationStatus>) -> Result<i64, BackendError> {
        let mut connection = self.connection()?;
        let count = match status {
            Some(status) => bookings::table
                .filter(bookings::status.eq(status.as_str()))
                .count()
                .get_result::<i64>(&mut *connection),
            None => bookings::table.count().get_result::<i64>(&mut *connection),
        };
        count.map_err(storage)
    }
}
