//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        State,
    },
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::app::AppState;
use crate::http::extract::AppPath;
use crate::http::records::record_routes;
use crate::pokemon::{FetchError, PokemonData};
use crate::records::{ProductRecord, StoreError, UserRecord, ValidationError};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    // CORS configuration - `*` or a comma-separated list in CLIENT_ORIGIN
    let cors = if state.config.client_origin.trim() == "*" {
        cors.allow_origin(Any)
    } else {
        let allowed_origins: Vec<header::HeaderValue> = state
            .config
            .client_origin
            .split(',')
            .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
            .collect();
        cors.allow_origin(allowed_origins)
    };

    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .route("/health", get(health_handler))
        .route("/pokemon/:name", get(pokemon_handler))
        .nest(
            "/users",
            record_routes::<UserRecord>().with_state(state.users.clone()),
        )
        .nest(
            "/products",
            record_routes::<ProductRecord>().with_state(state.products.clone()),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    users: usize,
    products: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        users: state.users.len(),
        products: state.products.len(),
    })
}

// ============================================================================
// Pokemon lookup
// ============================================================================

async fn pokemon_handler(
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
) -> Result<Json<PokemonData>, AppError> {
    match state.pokemon.fetch(&name).await {
        Ok(data) => Ok(Json(data)),
        Err(e) => {
            warn!(name = %name, error = %e, "Pokemon lookup failed");
            Err(e.into())
        }
    }
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Upstream error: {0}")]
    BadGateway(String),

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON of the wrong shape is a plain bad request
            JsonRejection::JsonDataError(_) => AppError::BadRequest(rejection.body_text()),
            _ => AppError::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
            },
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::NotFound(e.to_string())
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::InvalidName(_) => AppError::BadRequest(e.to_string()),
            FetchError::NotFound { .. } => AppError::NotFound(e.to_string()),
            FetchError::RateLimited => AppError::TooManyRequests(e.to_string()),
            FetchError::Network(_) | FetchError::Status { .. } | FetchError::Decode(_) => {
                AppError::BadGateway(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Rejected { status, message } => (*status, message.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    fn test_app() -> (AppState, Router) {
        let state = AppState::new(Config::default()).unwrap();
        (state.clone(), build_router(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn send_raw(app: &Router, method: &str, uri: &str, body: &'static [u8]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn usernames(list: &Value) -> Vec<&str> {
        list.as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn health_reports_store_sizes() {
        let (state, app) = test_app();
        state.products.add(crate::records::product::ProductFields::new("Lamp", 20));

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["users"], 0);
        assert_eq!(body["products"], 1);
    }

    #[tokio::test]
    async fn user_lifecycle_over_http() {
        let (_, app) = test_app();

        let (status, alice) = send(
            &app,
            "POST",
            "/users",
            Some(json!({"username": "alice", "pincode": "1234"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let alice_id = alice["id"].as_str().unwrap().to_string();

        let (_, bob) = send(
            &app,
            "POST",
            "/users",
            Some(json!({"username": "bob", "pincode": "5678"})),
        )
        .await;
        let bob_id = bob["id"].as_str().unwrap().to_string();

        let (_, list) = send(&app, "GET", "/users", None).await;
        assert_eq!(usernames(&list), vec!["alice", "bob"]);

        let (status, edited) = send(
            &app,
            "PUT",
            &format!("/users/{alice_id}"),
            Some(json!({"username": " alice2 ", "pincode": "0000"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["username"], "alice2");
        assert_eq!(edited["id"], alice_id.as_str());

        let (status, deleted) = send(&app, "DELETE", &format!("/users/{bob_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["removed"], 1);

        let (status, deleted) = send(&app, "DELETE", &format!("/users/{bob_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["removed"], 0);

        let (_, list) = send(&app, "GET", "/users", None).await;
        assert_eq!(usernames(&list), vec!["alice2"]);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let (state, app) = test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/users",
            Some(json!({"username": "alice", "pincode": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("pincode"));

        let (status, _) = send(&app, "POST", "/products", Some(json!({"name": "", "price": 3}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(state.users.len(), 0);
        assert_eq!(state.products.len(), 0);
    }

    #[tokio::test]
    async fn editing_unknown_record_is_not_found() {
        let (_, app) = test_app();
        let missing = uuid::Uuid::new_v4();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/products/{missing}"),
            Some(json!({"name": "Ghost", "price": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("product"));

        let (status, _) = send(&app, "GET", &format!("/products/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn images_attach_via_json_and_upload() {
        let (state, app) = test_app();

        let encoded = STANDARD.encode(b"png-bytes");
        let (_, created) = send(
            &app,
            "POST",
            "/products",
            Some(json!({"name": "Lamp", "price": 20, "image": encoded})),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let (_, product) = send(&app, "GET", &format!("/products/{id}"), None).await;
        assert_eq!(product["image"], encoded.as_str());

        // Empty upload is a cancelled pick and leaves the image alone
        let (status, product) = send_raw(&app, "PUT", &format!("/products/{id}/image"), b"").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(product["image"], encoded.as_str());

        let (status, product) = send_raw(&app, "PUT", &format!("/products/{id}/image"), b"jpeg").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(product["image"], STANDARD.encode(b"jpeg").as_str());
        assert_eq!(product["name"], "Lamp");

        let (status, product) = send(&app, "DELETE", &format!("/products/{id}/image"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(product["image"].is_null());
        assert!(state.products.list()[0].image.is_none());
    }

    #[tokio::test]
    async fn upload_to_unknown_record_is_not_found() {
        let (_, app) = test_app();
        let missing = uuid::Uuid::new_v4();

        let (status, _) = send_raw(&app, "PUT", &format!("/users/{missing}/image"), b"jpeg").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_pokemon_name_is_bad_request() {
        let (_, app) = test_app();

        let (status, body) = send(&app, "GET", "/pokemon/mr%20mime", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn absent_required_field_is_bad_request_json() {
        let (state, app) = test_app();

        let (status, body) = send(&app, "POST", "/users", Some(json!({"pincode": "1234"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("username"));

        let (status, body) = send(&app, "POST", "/products", Some(json!({"price": 4}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("name"));

        assert_eq!(state.users.len(), 0);
        assert_eq!(state.products.len(), 0);
    }

    #[tokio::test]
    async fn wrong_field_types_are_bad_request_json() {
        let (_, app) = test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/products",
            Some(json!({"name": "Lamp", "price": "cheap"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request_json() {
        let (_, app) = test_app();

        let (status, body) = send(&app, "GET", "/users/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(
            &app,
            "PUT",
            "/products/not-a-uuid",
            Some(json!({"name": "Lamp", "price": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn missing_content_type_keeps_its_status_as_json() {
        let (_, app) = test_app();

        let (status, body) = send_raw(&app, "POST", "/users", b"{\"username\":\"a\"}").await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["error"].is_string());
    }

    #[test]
    fn fetch_errors_map_to_statuses() {
        let cases = [
            (FetchError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                FetchError::NotFound {
                    name: "missingno".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (FetchError::Status { status: 500 }, StatusCode::BAD_GATEWAY),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }
}
