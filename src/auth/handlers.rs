use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    error::AppResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user_id = state
        .users
        .register(&payload.name, &payload.email, payload.password.as_deref())
        .await?;

    info!(user_id = %user_id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful",
            user_id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = state
        .users
        .authenticate(&payload.email, payload.password.as_deref())
        .await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful",
        user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let res = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn register_then_login() {
        let app = auth_routes().with_state(AppState::in_memory());

        let (status, body) = post_json(
            app.clone(),
            "/register",
            json!({"name": "A", "email": "a@x.com", "password": "secret"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let user_id = body["userId"].as_str().unwrap().to_string();

        let (status, body) = post_json(
            app.clone(),
            "/register",
            json!({"name": "A", "email": "a@x.com", "password": "secret"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");

        let (status, body) = post_json(
            app.clone(),
            "/login",
            json!({"email": "a@x.com", "password": "wrong"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_credentials");

        let (status, body) = post_json(
            app,
            "/login",
            json!({"email": "a@x.com", "password": "secret"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], user_id);
        assert_eq!(body["user"]["name"], "A");
        assert_eq!(body["user"]["email"], "a@x.com");
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn login_unknown_user_is_not_found() {
        let app = auth_routes().with_state(AppState::in_memory());
        let (status, body) =
            post_json(app, "/login", json!({"email": "nobody@x.com"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
}
