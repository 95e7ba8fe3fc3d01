use thiserror::Error;

/// Errors signaled by a stamping run.
///
/// `EncryptedDocument` and `InvalidRange` reject the request before any page
/// is touched; the remaining variants carry the underlying cause of a failure
/// partway through processing.
#[derive(Error, Debug)]
pub enum StampError {
    #[error("document is encrypted")]
    EncryptedDocument,

    #[error(
        "page range selects no pages (start_page {start_page}, end_page {end_page:?}, document has {total_pages} pages)"
    )]
    InvalidRange {
        start_page: i32,
        end_page: Option<u32>,
        total_pages: usize,
    },

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StampError>;
