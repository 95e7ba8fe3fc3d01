use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use foliar::{FileAuditLog, FolioStamper, StampError, StampOptions};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::storage::TempStore;

/// Upload cap enforced before a request body is buffered: 2 GiB.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;

/// Server configuration, resolved once at startup and passed down as state.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub temp_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Temp files older than this are swept at startup.
    pub stale_after: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:3000".to_string(),
            temp_dir: PathBuf::from("temp_files"),
            log_dir: PathBuf::from("logs"),
            stale_after: Duration::from_secs(3600),
        }
    }
}

impl ServerConfig {
    /// Defaults with `FOLIAR_BIND` / `FOLIAR_TEMP_DIR` / `FOLIAR_LOG_DIR`
    /// environment overrides.
    pub fn from_env() -> Self {
        let mut config = ServerConfig::default();
        if let Ok(bind) = std::env::var("FOLIAR_BIND") {
            config.bind = bind;
        }
        if let Some(dir) = std::env::var_os("FOLIAR_TEMP_DIR") {
            config.temp_dir = PathBuf::from(dir);
        }
        if let Some(dir) = std::env::var_os("FOLIAR_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        config
    }
}

/// Standard error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message describing what went wrong
    pub error: String,
}

/// Application-specific error types for the API
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("only PDF uploads are accepted")]
    UnsupportedMediaType,

    #[error("preview rendering is not available on this server")]
    PreviewUnavailable,

    #[error(transparent)]
    Stamp(#[from] StampError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PreviewUnavailable => StatusCode::NOT_IMPLEMENTED,
            AppError::Stamp(StampError::EncryptedDocument)
            | AppError::Stamp(StampError::InvalidRange { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Stamp(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(error_response)).into_response()
    }
}

pub(crate) struct AppState {
    pub(crate) store: TempStore,
    pub(crate) stamper: FolioStamper<FileAuditLog>,
}

pub(crate) type SharedState = Arc<AppState>;

/// Build the application router with all routes configured
pub fn app(config: &ServerConfig) -> Router {
    let state: SharedState = Arc::new(AppState {
        store: TempStore::new(&config.temp_dir),
        stamper: FolioStamper::new(FileAuditLog::new(&config.log_dir)),
    });

    Router::new()
        .route("/api/stamp", post(stamp_pdf))
        .route("/api/preview", post(preview_pdf))
        .route("/api/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancing
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "foliar API",
        "version": env!("CARGO_PKG_VERSION"),
        "preview": cfg!(feature = "preview"),
    }))
}

/// One parsed upload: the document plus its stamping options.
pub(crate) struct StampUpload {
    pub(crate) filename: String,
    pub(crate) data: Bytes,
    pub(crate) options: StampOptions,
}

/// Stamp an uploaded PDF and return it as a download.
pub(crate) async fn stamp_pdf(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_form(&mut multipart).await?;
    let download_name = download_filename(&upload.filename);

    let stamped = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, AppError> {
        let files = state.store.allocate().map_err(StampError::from)?;
        std::fs::write(files.input(), &upload.data).map_err(StampError::from)?;
        state
            .stamper
            .stamp_file(files.input(), files.output(), &upload.options)?;
        let bytes = std::fs::read(files.output()).map_err(StampError::from)?;
        Ok(bytes)
        // `files` drops here: both temp paths are removed on every exit.
    })
    .await
    .map_err(|err| AppError::Internal(format!("stamping task failed: {err}")))??;

    Ok((
        StatusCode::OK,
        [
            ("Content-Type", "application/pdf".to_string()),
            (
                "Content-Disposition",
                format!("attachment; filename=\"{download_name}\""),
            ),
        ],
        stamped,
    )
        .into_response())
}

/// Stamp the requested page and return it rasterized as a PNG.
pub(crate) async fn preview_pdf(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload = read_form(&mut multipart).await?;
    upload.options.preview = true;
    // A preview renders exactly the requested page.
    upload.options.end_page = Some(upload.options.start_page.max(1) as u32);

    render_preview(state, upload).await
}

#[cfg(feature = "preview")]
async fn render_preview(state: SharedState, upload: StampUpload) -> Result<Response, AppError> {
    let png = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, AppError> {
        let files = state.store.allocate().map_err(StampError::from)?;
        std::fs::write(files.input(), &upload.data).map_err(StampError::from)?;
        state
            .stamper
            .stamp_file(files.input(), files.output(), &upload.options)?;
        crate::preview::render_first_page_png(files.output())
    })
    .await
    .map_err(|err| AppError::Internal(format!("preview task failed: {err}")))??;

    Ok((
        StatusCode::OK,
        [("Content-Type", "image/png".to_string())],
        png,
    )
        .into_response())
}

#[cfg(not(feature = "preview"))]
async fn render_preview(_state: SharedState, _upload: StampUpload) -> Result<Response, AppError> {
    Err(AppError::PreviewUnavailable)
}

/// Parse the multipart form: one `pdf_file` plus optional styling fields.
///
/// Missing or unparsable fields keep their defaults, mirroring the form's
/// tolerant handling of partially filled inputs.
async fn read_form(multipart: &mut Multipart) -> Result<StampUpload, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut options = StampOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("malformed multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf_file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|err| {
                    AppError::BadRequest(format!("failed to read uploaded file: {err}"))
                })?;
                file = Some((filename, data));
            }
            "start_number" => set_parsed(&mut options.start_number, &text(field).await?),
            "start_page" => set_parsed(&mut options.start_page, &text(field).await?),
            "end_page" => options.end_page = text(field).await?.trim().parse().ok(),
            "font_size" => set_parsed(&mut options.font_size, &text(field).await?),
            "offset" => set_parsed(&mut options.offset_cm, &text(field).await?),
            "corner" => set_parsed(&mut options.corner, &text(field).await?),
            "orientation" => set_parsed(&mut options.orientation, &text(field).await?),
            _ => {}
        }
    }

    let (filename, data) = file
        .ok_or_else(|| AppError::BadRequest("no file provided in upload".to_string()))?;
    if filename.is_empty() {
        return Err(AppError::BadRequest("no file provided in upload".to_string()));
    }
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(AppError::UnsupportedMediaType);
    }

    Ok(StampUpload {
        filename,
        data,
        options,
    })
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|err| AppError::BadRequest(format!("failed to read form field: {err}")))
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, raw: &str) {
    if let Ok(value) = raw.trim().parse() {
        *slot = value;
    }
}

/// Download name for a stamped document: `Foliado_<base>_<YYYYMMDD>.pdf`.
fn download_filename(original: &str) -> String {
    format!(
        "Foliado_{}_{}.pdf",
        sanitize_stem(original),
        Local::now().format("%Y%m%d")
    )
}

/// Reduce an uploaded name to a safe file stem.
fn sanitize_stem(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("document");
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_stem_strips_path_and_specials() {
        assert_eq!(sanitize_stem("contract.pdf"), "contract");
        assert_eq!(sanitize_stem("dir/evil name!.pdf"), "evil_name_");
        assert_eq!(sanitize_stem(""), "document");
    }

    #[test]
    fn test_download_filename_shape() {
        let name = download_filename("scan 2024.pdf");
        assert!(name.starts_with("Foliado_scan_2024_"));
        assert!(name.ends_with(".pdf"));
        // Foliado_ + stem + _ + YYYYMMDD + .pdf
        let date = name
            .trim_end_matches(".pdf")
            .rsplit('_')
            .next()
            .unwrap()
            .to_string();
        assert_eq!(date.len(), 8);
        assert!(date.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            error: "Test error message".to_string(),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["error"], "Test error message");
    }

    #[test]
    fn test_app_error_status_mapping() {
        assert_eq!(
            AppError::UnsupportedMediaType.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            AppError::PreviewUnavailable.status(),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            AppError::Stamp(StampError::EncryptedDocument).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Stamp(StampError::InvalidRange {
                start_page: 5,
                end_page: Some(3),
                total_pages: 10,
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_set_parsed_keeps_default_on_garbage() {
        let mut value: u32 = 7;
        set_parsed(&mut value, "not a number");
        assert_eq!(value, 7);
        set_parsed(&mut value, " 12 ");
        assert_eq!(value, 12);
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "0.0.0.0:3000");
        assert_eq!(config.temp_dir, PathBuf::from("temp_files"));
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.stale_after, Duration::from_secs(3600));
    }
}
