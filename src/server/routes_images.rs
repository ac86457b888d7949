//! Image upload, listing, and deletion API routes.
//!
//! Translates pipeline and store results into HTTP status codes. Errors are
//! returned as JSON bodies with a generic message plus the underlying error
//! text where one exists.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::Error;
use crate::store::ImageRecord;

use super::AppContext;

/// Create image-related routes.
pub fn image_routes(max_upload_bytes: usize) -> Router<AppContext> {
    Router::new()
        .route(
            "/images/upload",
            post(upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/images", get(list_images))
        .route("/images/:id", get(get_image).delete(delete_image))
}

// ============================================================================
// Error mapping
// ============================================================================

/// Map a domain error onto its HTTP response.
fn error_response(err: &Error) -> Response {
    let status = match err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Processing(_) | Error::Persistence(_) | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({"error": err.to_string()}))).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// Upload and process an image.
///
/// Expects a multipart form with an `image` field holding the file. Runs the
/// pipeline, appends a metadata record, and returns 201 with the record.
async fn upload_image(State(ctx): State<AppContext>, mut multipart: Multipart) -> impl IntoResponse {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                return error_response(&Error::invalid_input(format!(
                    "Invalid multipart body: {}",
                    e
                )))
            }
        };

        if field.name() != Some("image") {
            continue;
        }

        // MIME sniffing only goes as far as the client-declared content type.
        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") {
                return error_response(&Error::invalid_input("Only image files are allowed"));
            }
        }

        let original_name = field
            .file_name()
            .unwrap_or("upload")
            .to_string();

        let data = match field.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => {
                return error_response(&Error::invalid_input(format!(
                    "Failed to read upload: {}",
                    e
                )))
            }
        };

        upload = Some((original_name, data));
        break;
    }

    let Some((original_name, data)) = upload else {
        return error_response(&Error::invalid_input("No image file provided"));
    };

    let id = Uuid::new_v4().to_string();

    let processed_url = match ctx.pipeline.process(&data, &id).await {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Error processing image: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Failed to process image",
                    "details": e.to_string()
                })),
            )
                .into_response();
        }
    };

    let record = ImageRecord::new(id, original_name, processed_url);

    if let Err(e) = ctx.store.append(record.clone()) {
        tracing::error!("Error saving image metadata: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "Failed to save image metadata",
                "details": e.to_string()
            })),
        )
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Image processed successfully",
            "image": record
        })),
    )
        .into_response()
}

/// List all image records in creation order.
async fn list_images(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.store.load_all())
}

/// Get a single image record by id.
async fn get_image(State(ctx): State<AppContext>, Path(id): Path<String>) -> impl IntoResponse {
    match ctx.store.find_by_id(&id) {
        Some(record) => Json(record).into_response(),
        None => error_response(&Error::not_found(id)),
    }
}

/// Delete an image record and its on-disk artifacts.
///
/// Artifact removal is best-effort; an unknown id yields 404 rather than an
/// error, so repeated deletes are idempotent in effect.
async fn delete_image(State(ctx): State<AppContext>, Path(id): Path<String>) -> impl IntoResponse {
    match ctx.store.remove(&id) {
        Ok(true) => {
            ctx.pipeline.delete_artifacts(&id);
            (
                StatusCode::OK,
                Json(serde_json::json!({"message": "Image deleted successfully"})),
            )
                .into_response()
        }
        Ok(false) => error_response(&Error::not_found(id)),
        Err(e) => {
            tracing::error!("Error deleting image: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Failed to delete image",
                    "details": e.to_string()
                })),
            )
                .into_response()
        }
    }
}
