use crate::backend::ReservationBackend;
use crate::error::BackendError;
use crate::types::{NewReservation, Reservation, ReservationStatus, StatusUpdate};
use chrono::{DateTime, Utc};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

/// Impersistent backend used when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct LocalReservations {
    inner: Arc<Mutex<LocalStore>>,
}

#[derive(Debug, Default)]
struct LocalStore {
    last_id: i64,
    reservations: BTreeMap<i64, Reservation>,
}

impl LocalStore {
    fn active_at(&self, start: DateTime<Utc>, except: Option<i64>) -> usize {
        self.reservations
            .values()
            .filter(|reservation| Some(reservation.id) != except)
            .filter(|reservation| reservation.status.is_active())
            .filter(|reservation| reservation.requested_start == start)
            .count()
    }
}

impl LocalReservations {
    fn store(&self) -> Result<MutexGuard<'_, LocalStore>, BackendError> {
        self.inner
            .lock()
            .map_err(|_| BackendError::Storage("reservation store lock poisoned".into()))
    }
}

impl ReservationBackend for LocalReservations {
    fn blocked_starts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, BackendError> {
        let store = self.store()?;
        Ok(store
            .reservations
            .values()
            .filter(|reservation| reservation.status.is_active())
            .map(|reservation| reservation.requested_start)
            .filter(|requested_start| *requested_start >= start && *requested_start < end)
            .collect())
    }

    fn count_active_at(&self, start: DateTime<Utc>) -> Result<i64, BackendError> {
        let store = self.store()?;
        Ok(store.active_at(start, None) as i64)
    }

    fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation, BackendError> {
        let mut store = self.store()?;
        if reservation.status.is_active() && store.active_at(reservation.requested_start, None) > 0
        {
            return Err(BackendError::Conflict(reservation.requested_start));
        }

        store.last_id += 1;
        let reservation = reservation.into_reservation(store.last_id);
        store
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    fn update_status(&self, id: i64, update: StatusUpdate) -> Result<usize, BackendError> {
        let mut store = self.store()?;
        let Some(start) = store
            .reservations
            .get(&id)
            .map(|reservation| reservation.requested_start)
        else {
            return Ok(0);
        };

        if update.status.is_active() && store.active_at(start, Some(id)) > 0 {
            return Err(BackendError::Conflict(start));
        }

        if let Some(reservation) = store.reservations.get_mut(&id) {
            reservation.status = update.status;
            reservation.internal_notes = update.internal_notes;
            reservation.updated_at = update.updated_at;
        }
        Ok(1)
    }

    fn reservation(&self, id: i64) -> Result<Option<Reservation>, BackendError> {
        Ok(self.store()?.reservations.get(&id).cloned())
    }

    fn count_reservations(&self, status: Option<ReservationStatus>) -> Result<i64, BackendError> {
        let store = self.store()?;
        let count = store
            .reservations
            .values()
            .filter(|reservation| status.map_or(true, |status| reservation.status == status))
            .count();
        Ok(count as i64)
    }
}
