//! Generic CRUD routes for one record store

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Serialize;
use tracing::debug;

use crate::http::extract::{AppJson, AppPath};
use crate::http::routes::AppError;
use crate::images::{ImageSource, UploadedImage};
use crate::records::{Record, RecordFields, RecordId, RecordStore};
use crate::ws::feed_handler;

/// Upper bound on request bodies, which may carry an image
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Routes for one store, mounted under the store's prefix
pub fn record_routes<R: Record>() -> Router<Arc<RecordStore<R>>> {
    Router::new()
        .route("/", get(list_records::<R>).post(add_record::<R>))
        .route("/ws", get(feed_handler::<R>))
        .route(
            "/:id",
            get(get_record::<R>)
                .put(edit_record::<R>)
                .delete(delete_record::<R>),
        )
        .route(
            "/:id/image",
            put(upload_image::<R>).delete(clear_image::<R>),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[derive(Serialize)]
struct CreatedResponse {
    id: RecordId,
}

#[derive(Serialize)]
struct DeletedResponse {
    removed: usize,
}

async fn list_records<R: Record>(State(store): State<Arc<RecordStore<R>>>) -> Json<Vec<R>> {
    Json(store.list())
}

async fn add_record<R: Record>(
    State(store): State<Arc<RecordStore<R>>>,
    AppJson(fields): AppJson<R::Fields>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let fields = fields.normalize();
    fields.validate()?;

    let id = store.add(fields);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn get_record<R: Record>(
    State(store): State<Arc<RecordStore<R>>>,
    AppPath(id): AppPath<RecordId>,
) -> Result<Json<R>, AppError> {
    store
        .get(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", R::KIND, id)))
}

/// Replace every mutable field; an image left out of the body is cleared
async fn edit_record<R: Record>(
    State(store): State<Arc<RecordStore<R>>>,
    AppPath(id): AppPath<RecordId>,
    AppJson(fields): AppJson<R::Fields>,
) -> Result<Json<R>, AppError> {
    let fields = fields.normalize();
    fields.validate()?;

    let record = store.edit(id, fields)?;
    Ok(Json(record))
}

async fn delete_record<R: Record>(
    State(store): State<Arc<RecordStore<R>>>,
    AppPath(id): AppPath<RecordId>,
) -> Json<DeletedResponse> {
    let removed = store.delete(id);
    Json(DeletedResponse { removed })
}

/// Raw body becomes the record's image. An empty body is a cancelled pick.
async fn upload_image<R: Record>(
    State(store): State<Arc<RecordStore<R>>>,
    AppPath(id): AppPath<RecordId>,
    body: Bytes,
) -> Result<Json<R>, AppError> {
    match UploadedImage(body).request_image().await {
        Some(image) => {
            let record = store.edit_with(id, move |fields| *fields.image_mut() = Some(image))?;
            Ok(Json(record))
        }
        None => {
            debug!(kind = R::KIND, id = %id, "Image pick cancelled");
            get_record(State(store), AppPath(id)).await
        }
    }
}

async fn clear_image<R: Record>(
    State(store): State<Arc<RecordStore<R>>>,
    AppPath(id): AppPath<RecordId>,
) -> Result<Json<R>, AppError> {
    let record = store.edit_with(id, |fields| *fields.image_mut() = None)?;
    Ok(Json(record))
}
