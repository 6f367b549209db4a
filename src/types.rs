use crate::error::ValidationError;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SOURCE_WEB: &str = "web";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 4] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::Declined,
        ReservationStatus::Cancelled,
    ];

    /// Statuses that hold on to their slot.
    pub const ACTIVE: [ReservationStatus; 2] =
        [ReservationStatus::Pending, ReservationStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Declined => "declined",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Case-insensitive, whitespace tolerant. Blank input means pending.
    pub fn normalize(raw: &str) -> Result<Self, ValidationError> {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            return Ok(Self::Pending);
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or(ValidationError::InvalidStatus)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub id: i64,
    pub customer_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub vehicle_details: Option<String>,
    pub service_interest: Option<String>,
    pub notes: Option<String>,
    pub requested_start: DateTime<Utc>,
    pub requested_end: DateTime<Utc>,
    pub status: ReservationStatus,
    pub source: String,
    pub internal_notes: Option<String>,
    pub linked_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reservation before storage has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub customer_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub vehicle_details: Option<String>,
    pub service_interest: Option<String>,
    pub notes: Option<String>,
    pub requested_start: DateTime<Utc>,
    pub requested_end: DateTime<Utc>,
    pub status: ReservationStatus,
    pub source: String,
    pub linked_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewReservation {
    pub fn into_reservation(self, id: i64) -> Reservation {
        Reservation {
            id,
            customer_name: self.customer_name,
            email: self.email,
            phone: self.phone,
            vehicle_details: self.vehicle_details,
            service_interest: self.service_interest,
            notes: self.notes,
            requested_start: self.requested_start,
            requested_end: self.requested_end,
            status: self.status,
            source: self.source,
            internal_notes: None,
            linked_user_id: self.linked_user_id,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: ReservationStatus,
    pub internal_notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/bookings`. Missing fields deserialize as empty strings
/// so that the required-field check reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub vehicle: String,
    pub service: String,
    pub notes: String,
    pub date: String,
    pub slot_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub status: ReservationStatus,
    pub slot_label: String,
    pub slot_window: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub generated_at: DateTime<FixedOffset>,
    pub range: AvailabilityRange,
    pub days: Vec<AvailabilityDay>,
    pub slots: Vec<SlotMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRange {
    pub start: String,
    pub end: String,
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityDay {
    pub date: String,
    pub label: String,
    pub is_today: bool,
    pub is_weekend: bool,
    pub is_closed: bool,
    pub has_availability: bool,
    pub slots: Vec<AvailabilitySlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: String,
    pub label: String,
    pub window: String,
    pub start_iso: String,
    pub end_iso: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMeta {
    pub id: String,
    pub label: String,
    pub description: String,
    pub duration: String,
}

/// Reservation as shown to an administrator, times rendered in the booking zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminReservationView {
    pub id: i64,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub vehicle: String,
    pub notes: String,
    pub status: ReservationStatus,
    pub slot_label: String,
    pub slot_window: String,
    pub date_label: String,
    pub submitted_at: String,
    pub internal_notes: String,
    pub source: String,
    pub start_iso: String,
    pub end_iso: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationStats {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub declined: i64,
    pub cancelled: i64,
}
