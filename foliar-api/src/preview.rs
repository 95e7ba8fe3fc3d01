//! First-page rasterization via pdfium
//!
//! Pdfium holds thread-local state, so callers run this on a blocking
//! thread. The binding is attempted per call; a machine without the pdfium
//! library degrades to the same "preview unavailable" answer as a build
//! without the feature.

use std::io::Cursor;
use std::path::Path;

use image::ImageFormat;
use pdfium_render::prelude::*;

use crate::api::AppError;

/// Render the first page of `pdf_path` to PNG bytes at 72 dpi
/// (one pixel per point).
pub(crate) fn render_first_page_png(pdf_path: &Path) -> Result<Vec<u8>, AppError> {
    let bindings = Pdfium::bind_to_system_library().map_err(|_| AppError::PreviewUnavailable)?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|err| AppError::Internal(format!("preview document failed to load: {err:?}")))?;

    let pages = document.pages();
    let page = pages
        .get(0)
        .map_err(|_| AppError::Internal("preview output has no pages".to_string()))?;

    let target_width = (page.width().value.round() as i32).max(1);
    let render_config = PdfRenderConfig::new().set_target_width(target_width);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|err| AppError::Internal(format!("rasterization failed: {err:?}")))?;
    let rendered = bitmap.as_image();

    let mut png = Vec::new();
    rendered
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|err| AppError::Internal(format!("PNG encoding failed: {err}")))?;
    Ok(png)
}
