//! # foliar-api
//!
//! REST service around the foliar stamping core: multipart PDF upload,
//! folio stamping with download response, and an optional single-page PNG
//! preview behind the `preview` feature.

mod api;
#[cfg(feature = "preview")]
mod preview;
mod storage;

pub use api::{app, health_check, AppError, ErrorResponse, ServerConfig, MAX_UPLOAD_BYTES};
pub use storage::{RequestFiles, TempStore};
