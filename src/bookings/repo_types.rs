use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// A renter's request for a car. Both references are weak: neither the car
/// nor the renter has to exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub car_id: Uuid,
    pub booked_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub attributes: Map<String, Value>, // dates, notes, price quoted, ...
}

#[derive(Debug, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub car_id: Uuid,
    pub booked_by: String,
    pub attributes: Json<Map<String, Value>>,
    pub created_at: OffsetDateTime,
}

impl From<BookingRow> for Booking {
    fn from(r: BookingRow) -> Self {
        Self {
            id: r.id,
            car_id: r.car_id,
            booked_by: r.booked_by,
            created_at: r.created_at,
            attributes: r.attributes.0,
        }
    }
}
