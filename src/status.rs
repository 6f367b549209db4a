use crate::backend::ReservationBackend;
use crate::error::BookingError;
use crate::schedule::{window_label, BookingSchedule, SharedClock};
use crate::types::{
    AdminReservationView, Reservation, ReservationStats, ReservationStatus, StatusUpdate,
};
use chrono::SecondsFormat;
use std::sync::Arc;
use tracing::{error, info};

/// Administrative side of a reservation's life. Any of the four statuses may
/// follow any other.
#[derive(Clone)]
pub struct StatusLifecycle<B> {
    backend: B,
    schedule: Arc<BookingSchedule>,
    clock: SharedClock,
}

impl<B: ReservationBackend> StatusLifecycle<B> {
    pub fn new(backend: B, schedule: Arc<BookingSchedule>, clock: SharedClock) -> Self {
        Self {
            backend,
            schedule,
            clock,
        }
    }

    /// Blank notes clear the stored note. Returns the number of updated rows.
    pub fn set_status(
        &self,
        id: i64,
        status: &str,
        internal_notes: &str,
    ) -> Result<usize, BookingError> {
        let status = ReservationStatus::normalize(status)?;
        let internal_notes = internal_notes.trim();
        let update = StatusUpdate {
            status,
            internal_notes: (!internal_notes.is_empty()).then(|| internal_notes.to_string()),
            updated_at: self.clock.utc(),
        };

        let updated = self.backend.update_status(id, update).map_err(|err| {
            error!(?err, id, "Failed to update booking");
            BookingError::from(err)
        })?;
        if updated == 0 {
            return Err(BookingError::NotFound(id));
        }
        info!(id, %status, "Booking status updated");
        Ok(updated)
    }

    pub fn reservation(&self, id: i64) -> Result<AdminReservationView, BookingError> {
        let reservation = self
            .backend
            .reservation(id)?
            .ok_or(BookingError::NotFound(id))?;
        Ok(self.view(reservation))
    }

    pub fn stats(&self) -> Result<ReservationStats, BookingError> {
        let count = |status| self.backend.count_reservations(status);
        Ok(ReservationStats {
            total: count(None)?,
            pending: count(Some(ReservationStatus::Pending))?,
            confirmed: count(Some(ReservationStatus::Confirmed))?,
            declined: count(Some(ReservationStatus::Declined))?,
            cancelled: count(Some(ReservationStatus::Cancelled))?,
        })
    }

    fn view(&self, reservation: Reservation) -> AdminReservationView {
        let zone = self.schedule.zone;
        let start = zone.localize(reservation.requested_start);
        let end = zone.localize(reservation.requested_end);
        let (slot_label, slot_window) = match self.schedule.catalog.matching_start(&start) {
            Some(slot) => (slot.label.clone(), window_label(start, start + slot.duration)),
            None => ("Custom Session".to_string(), window_label(start, end)),
        };

        AdminReservationView {
            id: reservation.id,
            customer_name: reservation.customer_name,
            email: reservation.email,
            phone: reservation.phone.unwrap_or_default(),
            service: reservation.service_interest.unwrap_or_default(),
            vehicle: reservation.vehicle_details.unwrap_or_default(),
            notes: reservation.notes.unwrap_or_default(),
            status: reservation.status,
            slot_label,
            slot_window,
            date_label: start.format("%A, %b %-d").to_string(),
            submitted_at: zone
                .localize(reservation.created_at)
                .format("%b %-d, %Y %-I:%M %p")
                .to_string(),
            internal_notes: reservation.internal_notes.unwrap_or_default(),
            source: reservation.source,
            start_iso: start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end_iso: end.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ValidationError;
    use crate::local_reservations::LocalReservations;
    use crate::testutils::{
        default_schedule, fixture_clock, fixture_now, new_reservation, MockReservationBackend,
    };
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::atomic::Ordering;

    fn lifecycle<B: ReservationBackend>(backend: B) -> StatusLifecycle<B> {
        StatusLifecycle::new(backend, Arc::new(default_schedule()), fixture_clock())
    }

    fn seeded() -> LocalReservations {
        let backend = LocalReservations::default();
        // Tuesday 2026-06-02 12:30 in New York.
        backend
            .insert_reservation(new_reservation(
                Utc.with_ymd_and_hms(2026, 6, 2, 16, 30, 0).unwrap(),
            ))
            .unwrap();
        backend
    }

    #[test_case::test_case("CONFIRMED ", ReservationStatus::Confirmed)]
    #[test_case::test_case("declined", ReservationStatus::Declined)]
    #[test_case::test_case("", ReservationStatus::Pending)]
    fn test_set_status_normalizes(raw: &str, expected: ReservationStatus) {
        let backend = seeded();
        let updated = lifecycle(backend.clone())
            .set_status(1, raw, "  Called customer  ")
            .unwrap();

        assert_eq!(updated, 1);
        let stored = backend.reservation(1).unwrap().unwrap();
        assert_eq!(stored.status, expected);
        assert_eq!(stored.internal_notes.as_deref(), Some("Called customer"));
        assert_eq!(stored.updated_at, fixture_now());
    }

    #[test]
    fn test_unknown_status_leaves_row_unchanged() {
        let backend = seeded();
        let err = lifecycle(backend.clone())
            .set_status(1, "archived", "should not land")
            .unwrap_err();

        assert_eq!(err, BookingError::Validation(ValidationError::InvalidStatus));
        let stored = backend.reservation(1).unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Pending);
        assert_eq!(stored.internal_notes, None);
    }

    #[test]
    fn test_invalid_status_never_reaches_storage() {
        let backend = MockReservationBackend::new();
        lifecycle(backend.clone())
            .set_status(1, "archived", "")
            .unwrap_err();
        assert_eq!(backend.0.calls_to_update_status.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_set_status_is_idempotent_and_unrestricted() {
        let backend = seeded();
        let lifecycle = lifecycle(backend.clone());

        lifecycle.set_status(1, "cancelled", "note").unwrap();
        lifecycle.set_status(1, "cancelled", "note").unwrap();
        lifecycle.set_status(1, "confirmed", "").unwrap();
        lifecycle.set_status(1, "pending", "").unwrap();

        let stored = backend.reservation(1).unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Pending);
        assert_eq!(stored.internal_notes, None);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let err = lifecycle(seeded()).set_status(7, "confirmed", "").unwrap_err();
        assert_eq!(err, BookingError::NotFound(7));
    }

    #[test]
    fn test_reactivating_into_taken_slot_conflicts() {
        let backend = seeded();
        let lifecycle = lifecycle(backend.clone());
        lifecycle.set_status(1, "declined", "").unwrap();
        backend
            .insert_reservation(new_reservation(
                Utc.with_ymd_and_hms(2026, 6, 2, 16, 30, 0).unwrap(),
            ))
            .unwrap();

        let err = lifecycle.set_status(1, "confirmed", "").unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));
        assert_eq!(
            backend.reservation(1).unwrap().unwrap().status,
            ReservationStatus::Declined
        );
    }

    #[test]
    fn test_reservation_view_resolves_slot() {
        let view = lifecycle(seeded()).reservation(1).unwrap();

        assert_eq!(view.slot_label, "Midday Refresh");
        assert_eq!(view.slot_window, "12:30 PM – 3:30 PM");
        assert_eq!(view.date_label, "Tuesday, Jun 2");
        assert_eq!(view.submitted_at, "Jun 1, 2026 9:00 AM");
        assert_eq!(view.start_iso, "2026-06-02T12:30:00-04:00");
        assert_eq!(view.phone, "");
        assert_eq!(view.source, "web");
    }

    #[test]
    fn test_reservation_view_off_grid_is_custom_session() {
        let backend = LocalReservations::default();
        let mut reservation =
            new_reservation(Utc.with_ymd_and_hms(2026, 6, 2, 14, 0, 0).unwrap());
        reservation.requested_end = reservation.requested_start + Duration::minutes(90);
        backend.insert_reservation(reservation).unwrap();

        let view = lifecycle(backend).reservation(1).unwrap();
        assert_eq!(view.slot_label, "Custom Session");
        assert_eq!(view.slot_window, "10:00 AM – 11:30 AM");
    }

    #[test]
    fn test_missing_reservation_view() {
        let err = lifecycle(LocalReservations::default())
            .reservation(3)
            .unwrap_err();
        assert_eq!(err, BookingError::NotFound(3));
    }

    #[test]
    fn test_stats() {
        let backend = seeded();
        backend
            .insert_reservation(new_reservation(
                Utc.with_ymd_and_hms(2026, 6, 3, 12, 0, 0).unwrap(),
            ))
            .unwrap();
        let lifecycle = lifecycle(backend);
        lifecycle.set_status(2, "confirmed", "").unwrap();

        assert_eq!(
            lifecycle.stats().unwrap(),
            ReservationStats {
                total: 2,
                pending: 1,
                confirmed: 1,
                declined: 0,
                cancelled: 0,
            }
        );
    }
}
