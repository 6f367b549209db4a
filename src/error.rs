use chrono::{DateTime, Utc};
use thiserror::Error;

/// User-correctable problems with a request. Messages are shown to the client.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name, email, date, and slot are required")]
    MissingFields,
    #[error("Invalid slot selection")]
    InvalidSlot,
    #[error("Invalid date format")]
    InvalidDate,
    #[error("Selected slot is no longer in the future")]
    SlotInPast,
    #[error("We are closed on the selected date")]
    ClosedDay,
    #[error("Selected slot is outside our booking window")]
    OutOfWindow,
    #[error("Invalid booking status")]
    InvalidStatus,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("an active reservation already starts at {0}")]
    Conflict(DateTime<Utc>),
    #[error("storage failure: {0}")]
    Storage(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("slot starting at {0} is already taken")]
    Conflict(DateTime<Utc>),
    #[error("booking {0} does not exist")]
    NotFound(i64),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<BackendError> for BookingError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Conflict(start) => Self::Conflict(start),
            BackendError::Storage(message) => Self::Storage(message),
        }
    }
}
