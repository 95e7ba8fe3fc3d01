//! # foliar
//!
//! Stamp sequential page numbers ("folios") onto a page range of an existing
//! PDF document. Pages outside the range pass through untouched; each stamped
//! page gets a zero-padded numeral positioned against a chosen corner, in
//! either reading orientation, sized to that page's own dimensions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foliar::{stamp_pdf_file, Corner, StampOptions};
//! use std::path::Path;
//!
//! # fn main() -> foliar::Result<()> {
//! let options = StampOptions {
//!     start_page: 3,
//!     end_page: Some(5),
//!     corner: Corner::BottomRight,
//!     ..StampOptions::default()
//! };
//!
//! let summary = stamp_pdf_file(
//!     Path::new("input.pdf"),
//!     Path::new("stamped.pdf"),
//!     &options,
//! )?;
//! println!("stamped {} pages", summary.pages_stamped);
//! # Ok(())
//! # }
//! ```
//!
//! With an audit trail, construct a [`FolioStamper`] around a [`FileAuditLog`]:
//!
//! ```rust,no_run
//! use foliar::{FileAuditLog, FolioStamper, StampOptions};
//!
//! let stamper = FolioStamper::new(FileAuditLog::new("logs"));
//! let result = stamper.stamp_file(
//!     "input.pdf".as_ref(),
//!     "stamped.pdf".as_ref(),
//!     &StampOptions::default(),
//! );
//! ```

pub mod audit;
pub mod error;
pub mod overlay;
pub mod range;
pub mod stamp;

pub use audit::{AuditLog, FileAuditLog, NullAuditLog};
pub use error::{Result, StampError};
pub use overlay::{folio_text, Corner, Orientation, POINTS_PER_CM};
pub use range::StampRange;
pub use stamp::{
    inspect, stamp_pdf_file, DocumentInfo, FolioStamper, StampOptions, StampSummary,
};

// The PDF object model is part of the public API (`FolioStamper::stamp_document`).
pub use lopdf;
