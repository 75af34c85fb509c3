use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Booking body: `carId`, `bookedBy` (or `userEmail`) and any extra details.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub car_id: String,
    #[serde(default, alias = "userEmail")]
    pub booked_by: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct CreatedBookingResponse {
    pub message: &'static str,
    pub id: Uuid,
}
