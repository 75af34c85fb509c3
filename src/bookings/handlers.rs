use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    bookings::{
        dto::{CreateBookingRequest, CreatedBookingResponse},
        repo_types::Booking,
    },
    error::AppResult,
    state::AppState,
};

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/car-booking", post(create_booking))
        .route("/book-car", post(create_booking))
        .route("/my-bookings/:email", get(my_bookings))
}

#[instrument(skip(state, payload))]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<CreatedBookingResponse>)> {
    let id = state
        .bookings
        .create(&payload.car_id, &payload.booked_by, payload.details)
        .await?;

    info!(booking_id = %id, car_id = %payload.car_id, "booking recorded");
    Ok((
        StatusCode::CREATED,
        Json(CreatedBookingResponse {
            message: "Booking successful",
            id,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn my_bookings(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<Vec<Booking>>> {
    let bookings = state.queries.renter_bookings(&email).await?;
    Ok(Json(bookings))
}
