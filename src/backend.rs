use crate::error::BackendError;
use crate::types::{NewReservation, Reservation, ReservationStatus, StatusUpdate};
use chrono::{DateTime, Utc};

/// Storage surface the booking core depends on. Only active reservations
/// (pending or confirmed) occupy a start instant.
pub trait ReservationBackend: Clone + Send + Sync + 'static {
    /// Start instants of active reservations within `[start, end)`.
    fn blocked_starts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, BackendError>;

    /// Number of active reservations starting exactly at `start`.
    fn count_active_at(&self, start: DateTime<Utc>) -> Result<i64, BackendError>;

    /// Inserts unless an active reservation already holds the same start,
    /// in which case `BackendError::Conflict` is returned and nothing is written.
    fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation, BackendError>;

    /// Returns the number of updated rows.
    fn update_status(&self, id: i64, update: StatusUpdate) -> Result<usize, BackendError>;

    fn reservation(&self, id: i64) -> Result<Option<Reservation>, BackendError>;

    /// Counts all reservations, or those with the given status.
    fn count_reservations(&self, status: Option<ReservationStatus>) -> Result<i64, BackendError>;
}
