use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Pagination;

pub const STATUS_CONFIRMED: &str = "Confirmed";

/// A reservation row. `reservation_time` is serialized as ISO-8601 UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    pub restaurant_id: String,
    pub reservation_time: DateTime<Utc>,
    pub status: String,
}

impl Reservation {
    /// Time left until the reservation, or `None` once it has passed.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        time_until(self.reservation_time, now)
    }
}

/// Strictly positive time from `now` until `time`
pub fn time_until(time: DateTime<Utc>, now: DateTime<Utc>) -> Option<std::time::Duration> {
    (time - now)
        .to_std()
        .ok()
        .filter(|remaining| !remaining.is_zero())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservationRequest {
    pub user_id: String,
    pub restaurant_id: String,
    pub reservation_time: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateReservationRequest {
    pub id: String,
    pub user_id: String,
    pub restaurant_id: String,
    pub reservation_time: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationFilters {
    pub restaurant_id: Option<String>,
    pub user_id: Option<String>,
    pub reservation_time: Option<DateTime<Utc>>,
    pub status: Option<String>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Result of the coarse "does any reservation reference this restaurant" probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReservationResponse {
    pub available: bool,
}
