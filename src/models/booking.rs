use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::hhmm;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub tenant_id: String,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm")]
    pub from_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm")]
    pub to_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub status: BookingStatus,
    pub total_amount: Decimal,
    pub client_id: String,
    pub package_id: Option<String>,
    pub venue_id: Option<String>,
    pub client_name: Option<String>,
    pub package_name: Option<String>,
    pub venue_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Stored status flag. `completed` is never stored, see [`DerivedStatus`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Confirmed,
        }
    }
}

/// Lifecycle label computed from the stored flag and the event window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DerivedStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl DerivedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedStatus::Confirmed => "confirmed",
            DerivedStatus::Completed => "completed",
            DerivedStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(DerivedStatus::Confirmed),
            "completed" => Some(DerivedStatus::Completed),
            "cancelled" => Some(DerivedStatus::Cancelled),
            _ => None,
        }
    }

    /// Sort rank for the unfiltered booking list: upcoming work first.
    pub fn rank(&self) -> u8 {
        match self {
            DerivedStatus::Confirmed => 0,
            DerivedStatus::Completed => 1,
            DerivedStatus::Cancelled => 2,
        }
    }
}

/// Date/time window of an event, as entered on a booking form.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct EventWindow {
    pub event_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm")]
    pub from_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm")]
    pub to_time: Option<NaiveTime>,
}

impl Booking {
    pub fn window(&self) -> EventWindow {
        EventWindow {
            event_date: self.event_date,
            from_time: self.from_time,
            to_time: self.to_time,
        }
    }
}

/// Fields accepted when creating or editing a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingInput {
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm")]
    pub from_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm")]
    pub to_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub total_amount: Option<Decimal>,
    pub client_id: String,
    pub package_id: Option<String>,
    pub venue_id: Option<String>,
}

impl BookingInput {
    pub fn window(&self) -> EventWindow {
        EventWindow {
            event_date: self.event_date,
            from_time: self.from_time,
            to_time: self.to_time,
        }
    }
}
