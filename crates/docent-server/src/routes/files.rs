//! Document upload and retrieval routes.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docent_core::Error;
use docent_ingest::{extract_text, sanitize_filename, FileType};
use tracing::{info, warn};

use super::error_response;
use crate::state::AppState;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes(max_upload_size: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(
                max_upload_size.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/pdf/{filename}", get(get_file))
        .route("/pdf/content/{filename}", get(get_content))
}

/// POST /api/v1/upload — store one document and register its text.
async fn upload_file(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.file_name().is_some() => break field,
            Ok(Some(_)) => continue,
            Ok(None) => return error_response(StatusCode::BAD_REQUEST, "no file in upload"),
            Err(e) => return error_response(e.status(), e.body_text()),
        }
    };

    let filename = sanitize_filename(field.file_name().unwrap_or_default());
    if FileType::from_filename(&filename) == FileType::Unknown {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("unsupported file type: {}", filename),
        );
    }

    let bytes = match field.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return error_response(e.status(), e.body_text()),
    };
    if bytes.len() > state.config.max_upload_size {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "{} exceeds the {} byte upload limit",
                filename, state.config.max_upload_size
            ),
        );
    }

    let text = {
        let filename = filename.clone();
        let bytes = bytes.clone();
        match tokio::task::spawn_blocking(move || extract_text(&filename, &bytes)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return extraction_failure(e),
            Err(e) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    };

    let path = state.config.data_paths.uploads.join(&filename);
    if let Err(e) = tokio::fs::write(&path, &bytes).await {
        warn!("Failed to save {}: {}", path.display(), e);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("write failed: {}", e),
        );
    }

    let record = state
        .documents
        .insert(&filename, text, path.to_string_lossy().to_string());
    info!("Uploaded {} ({} bytes, {} chars)", filename, bytes.len(), record.text.len());

    Json(serde_json::json!({
        "text": record.text,
        "filename": filename,
    }))
    .into_response()
}

fn extraction_failure(e: Error) -> Response {
    let status = match e {
        Error::UnsupportedFile(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, e.to_string())
}

/// GET /api/v1/pdf/{filename} — raw bytes of an uploaded file.
async fn get_file(State(state): State<Arc<AppState>>, Path(filename): Path<String>) -> Response {
    let filename = sanitize_filename(&filename);
    let path = state.config.data_paths.uploads.join(&filename);

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = match FileType::from_filename(&filename) {
                FileType::Pdf => "application/pdf",
                _ => "text/plain; charset=utf-8",
            };
            ([(CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(_) => error_response(StatusCode::NOT_FOUND, format!("{} not found", filename)),
    }
}

/// GET /api/v1/pdf/content/{filename} — extracted text of an uploaded file.
async fn get_content(State(state): State<Arc<AppState>>, Path(filename): Path<String>) -> Response {
    match state.documents.get(&filename) {
        Some(record) => Json(record).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("no content for {}", filename),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_with_unbounded_upload_limit() {
        let _router = routes(usize::MAX);
    }
}
