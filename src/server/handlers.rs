use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use super::models::{ErrorResponse, ExtractRequest};
use super::state::ServerState;
use crate::ScanType;
use crate::barcode::ScanError;
use crate::medicine::MedicineInfo;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ScanError> for ServerError {
    fn from(err: ScanError) -> Self {
        let status = match err {
            ScanError::NoBarcodeDetected => StatusCode::UNPROCESSABLE_ENTITY,
            ScanError::ScanFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

pub async fn run_server(state: ServerState, addr: String) -> Result<()> {
    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| "failed to bind server address")?;
    info!("server: listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

async fn extract(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ExtractRequest>,
) -> Result<Json<MedicineInfo>, (StatusCode, Json<ErrorResponse>)> {
    let handle = tokio::runtime::Handle::current();
    let result = tokio::task::spawn_blocking(move || {
        handle.block_on(extract_request(state.as_ref(), payload))
    })
    .await
    .map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("server task failed: {}", err),
            }),
        )
    })?;

    match result {
        Ok(record) => Ok(Json(record)),
        Err(err) => Err((err.status, Json(ErrorResponse { error: err.message }))),
    }
}

pub(crate) async fn extract_request(
    state: &ServerState,
    request: ExtractRequest,
) -> Result<MedicineInfo, ServerError> {
    if request.scan_type == ScanType::Image {
        return Err(ServerError::bad_request(
            "image scans need a vision provider; use scan_type \"barcode\"",
        ));
    }
    let bytes = BASE64
        .decode(request.data_base64.trim())
        .map_err(|err| ServerError::bad_request(format!("invalid data_base64: {}", err)))?;
    if bytes.is_empty() {
        return Err(ServerError::bad_request("uploaded image is empty"));
    }

    // Per-request upload file, removed when `upload` drops.
    let mut upload = tempfile::Builder::new()
        .prefix("medscan-upload-")
        .suffix(".jpg")
        .tempfile_in(&state.upload_dir)
        .map_err(|err| ServerError::internal(format!("failed to create upload file: {}", err)))?;
    upload
        .write_all(&bytes)
        .and_then(|_| upload.flush())
        .map_err(|err| ServerError::internal(format!("failed to write upload file: {}", err)))?;

    let record = state.scanner.scan_barcode(upload.path()).await?;
    Ok(record)
}
