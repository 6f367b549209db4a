use crate::backend::ReservationBackend;
use crate::error::{BackendError, BookingError, ValidationError};
use crate::schedule::{window_label, BookingSchedule, SharedClock, MAX_HORIZON_DAYS};
use crate::types::{
    BookingConfirmation, BookingRequest, NewReservation, ReservationStatus, SOURCE_WEB,
};
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ReservationService<B> {
    backend: B,
    schedule: Arc<BookingSchedule>,
    clock: SharedClock,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl<B: ReservationBackend> ReservationService<B> {
    pub fn new(backend: B, schedule: Arc<BookingSchedule>, clock: SharedClock) -> Self {
        Self {
            backend,
            schedule,
            clock,
        }
    }

    /// Validates the request, then reserves the slot if no active reservation
    /// holds its start instant. Nothing is written unless every check passes.
    pub fn create_reservation(
        &self,
        request: BookingRequest,
        linked_user_id: Option<String>,
    ) -> Result<BookingConfirmation, BookingError> {
        let name = request.name.trim();
        let email = request.email.trim().to_lowercase();
        let date = request.date.trim();
        let slot_id = request.slot_id.trim();
        if name.is_empty() || email.is_empty() || date.is_empty() || slot_id.is_empty() {
            return Err(ValidationError::MissingFields.into());
        }

        let slot = self
            .schedule
            .catalog
            .by_id(slot_id)
            .ok_or(ValidationError::InvalidSlot)?;

        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate)?;
        let start_local = self
            .schedule
            .slot_start(day, slot)
            .ok_or(ValidationError::InvalidDate)?;

        let now = self.schedule.zone.localize(self.clock.utc());
        if start_local <= now {
            return Err(ValidationError::SlotInPast.into());
        }
        if self.schedule.is_closed(day) {
            return Err(ValidationError::ClosedDay.into());
        }
        if start_local > now + Duration::days(MAX_HORIZON_DAYS) {
            return Err(ValidationError::OutOfWindow.into());
        }

        let start = start_local.with_timezone(&Utc);
        let end = start + slot.duration;

        let conflicts = self.backend.count_active_at(start).map_err(|err| {
            error!(?err, "Failed to check slot conflicts");
            BookingError::from(err)
        })?;
        if conflicts > 0 {
            warn!(%start, slot = %slot.id, "Slot already taken");
            return Err(BookingError::Conflict(start));
        }

        let reservation = NewReservation {
            customer_name: name.to_string(),
            email,
            phone: optional(&request.phone),
            vehicle_details: optional(&request.vehicle),
            service_interest: optional(&request.service),
            notes: optional(&request.notes),
            requested_start: start,
            requested_end: end,
            status: ReservationStatus::Pending,
            source: SOURCE_WEB.into(),
            linked_user_id: linked_user_id.as_deref().and_then(optional),
            created_at: self.clock.utc(),
        };

        let reservation = match self.backend.insert_reservation(reservation) {
            Ok(reservation) => reservation,
            Err(BackendError::Conflict(start)) => {
                warn!(%start, slot = %slot.id, "Slot taken by a concurrent booking");
                return Err(BookingError::Conflict(start));
            }
            Err(err) => {
                error!(?err, "Failed to save booking");
                return Err(err.into());
            }
        };
        info!(id = reservation.id, %start, slot = %slot.id, "Booking request received");

        Ok(BookingConfirmation {
            id: reservation.id,
            name: reservation.customer_name,
            email: reservation.email,
            status: reservation.status,
            slot_label: slot.label.clone(),
            slot_window: window_label(start_local, start_local + slot.duration),
            date: start_local.format("%A, %B %-d").to_string(),
        })
    }
}
