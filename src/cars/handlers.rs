use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::{
    cars::{
        dto::{
            CreatedCarResponse, FeaturedQuery, ListingsQuery, MessageResponse, StatusRequest,
            StatusResponse,
        },
        repo_types::Car,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/browse-cars", get(browse_cars))
        .route("/featuredCars", get(featured_cars))
        .route("/my-listings", get(my_listings))
        .route("/car/:id", get(get_car))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/add-car", post(add_car))
        .route("/update-car/:id", put(update_car))
        .route("/update-status/:id", patch(update_status))
        .route("/delete-car/:id", delete(delete_car))
}

#[instrument(skip(state))]
pub async fn browse_cars(State(state): State<AppState>) -> AppResult<Json<Vec<Car>>> {
    Ok(Json(state.queries.browse_cars().await?))
}

#[instrument(skip(state))]
pub async fn featured_cars(
    State(state): State<AppState>,
    q: Result<Query<FeaturedQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Car>>> {
    let Query(q) = q?;
    Ok(Json(state.queries.featured_cars(q.limit).await?))
}

#[instrument(skip(state))]
pub async fn my_listings(
    State(state): State<AppState>,
    q: Result<Query<ListingsQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Car>>> {
    let Query(q) = q?;
    let email = q.provider_email.unwrap_or_default();
    Ok(Json(state.queries.provider_listings(&email).await?))
}

#[instrument(skip(state))]
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Car>> {
    Ok(Json(state.queries.car(&id).await?))
}

/// POST /add-car: the whole body is the listing; `providerEmail` names the owner.
#[instrument(skip(state, body))]
pub async fn add_car(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<(StatusCode, Json<CreatedCarResponse>)> {
    let provider_email = match body.get("providerEmail") {
        Some(Value::String(s)) => s.clone(),
        _ => return Err(AppError::Validation("providerEmail is required".into())),
    };
    let id = state.cars.create(&provider_email, body).await?;

    info!(car_id = %id, "car listed");
    Ok((
        StatusCode::CREATED,
        Json(CreatedCarResponse {
            message: "Car added successfully",
            id,
        }),
    ))
}

#[instrument(skip(state, body))]
pub async fn update_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<Json<MessageResponse>> {
    state.cars.update(&id, body).await?;

    info!(car_id = %id, "car updated");
    Ok(Json(MessageResponse {
        message: "Car updated successfully",
    }))
}

#[instrument(skip(state, body))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> AppResult<Json<StatusResponse>> {
    let requested = body
        .status
        .ok_or_else(|| AppError::Validation("status is required".into()))?;
    let status = state.cars.transition_status(&id, &requested).await?;

    info!(car_id = %id, %status, "car status changed");
    Ok(Json(StatusResponse {
        message: "Status updated successfully",
        status,
    }))
}

#[instrument(skip(state))]
pub async fn delete_car(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.cars.delete(&id).await?;

    info!(car_id = %id, "car deleted");
    Ok(Json(MessageResponse {
        message: "Car deleted successfully",
    }))
}
