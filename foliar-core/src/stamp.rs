//! Folio stamping over a resolved page range
//!
//! The orchestrator loads a document, resolves the requested range, merges
//! one overlay per page in ascending order, and serializes the result. Pages
//! outside the range ride along untouched; in preview mode everything except
//! the single stamped page is dropped from the output.

use std::fs;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::audit::{AuditLog, NullAuditLog};
use crate::error::{Result, StampError};
use crate::overlay::{self, Corner, Orientation};
use crate::range::StampRange;

/// Configuration for one stamping run.
#[derive(Debug, Clone)]
pub struct StampOptions {
    /// Folio value of the first stamped page.
    pub start_number: u32,
    /// First page to stamp, 1-based. Values of 0 or below clamp to 1.
    pub start_page: i32,
    /// Last page to stamp, 1-based inclusive. `None` or `Some(0)` means the
    /// last page of the document.
    pub end_page: Option<u32>,
    /// Folio type size in points.
    pub font_size: f64,
    /// Margin from the page edge, in centimetres.
    pub offset_cm: f64,
    pub corner: Corner,
    pub orientation: Orientation,
    /// Preview runs stamp the single requested page and drop every other
    /// page from the output; success is not recorded in the audit log.
    pub preview: bool,
}

impl Default for StampOptions {
    fn default() -> Self {
        StampOptions {
            start_number: 1,
            start_page: 1,
            end_page: None,
            font_size: 16.0,
            offset_cm: 1.0,
            corner: Corner::BottomRight,
            orientation: Orientation::Horizontal,
            preview: false,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampSummary {
    pub pages_stamped: usize,
    pub first_folio: u32,
    pub last_folio: u32,
}

/// Basic facts about a PDF file, for inspection commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub encrypted: bool,
}

/// Stamps folio numbers onto PDF documents.
///
/// The audit collaborator is supplied at construction; every failure is
/// reported to it before the error propagates, and full (non-preview) runs
/// report their summary on success.
pub struct FolioStamper<L> {
    audit: L,
}

impl<L: AuditLog> FolioStamper<L> {
    pub fn new(audit: L) -> Self {
        FolioStamper { audit }
    }

    /// Stamp an in-memory document, returning the serialized output.
    pub fn stamp_bytes(
        &self,
        input: &[u8],
        options: &StampOptions,
    ) -> Result<(Vec<u8>, StampSummary)> {
        match self.process(input, options) {
            Ok((output, summary)) => {
                self.report_success(&summary, options);
                Ok((output, summary))
            }
            Err(err) => {
                self.audit.error("folio stamping failed", Some(&err.to_string()));
                Err(err)
            }
        }
    }

    /// Stamp `input` into `output`.
    ///
    /// The result is buffered and written in one step, so a failed run never
    /// leaves a readable partial file at `output`.
    pub fn stamp_file(
        &self,
        input: &Path,
        output: &Path,
        options: &StampOptions,
    ) -> Result<StampSummary> {
        let outcome = (|| -> Result<StampSummary> {
            let bytes = fs::read(input)?;
            let (stamped, summary) = self.process(&bytes, options)?;
            fs::write(output, stamped)?;
            Ok(summary)
        })();

        match outcome {
            Ok(summary) => {
                self.report_success(&summary, options);
                Ok(summary)
            }
            Err(err) => {
                self.audit.error("folio stamping failed", Some(&err.to_string()));
                Err(err)
            }
        }
    }

    /// Stamp an already-loaded document in place.
    ///
    /// Useful when the caller owns a [`lopdf::Document`]; no audit records
    /// are written at this level.
    pub fn stamp_document(
        &self,
        doc: &mut Document,
        options: &StampOptions,
    ) -> Result<StampSummary> {
        if doc.is_encrypted() {
            return Err(StampError::EncryptedDocument);
        }

        let pages = doc.get_pages();
        let total_pages = pages.len();

        // Preview always reduces the request to the single requested page.
        let end_page = if options.preview {
            Some(options.start_page.max(1) as u32)
        } else {
            options.end_page
        };
        let range = StampRange::resolve(total_pages, options.start_page, end_page);

        if range.is_empty() && !options.preview {
            return Err(StampError::InvalidRange {
                start_page: options.start_page,
                end_page: options.end_page,
                total_pages,
            });
        }

        let font_id = overlay::register_folio_font(doc);

        // Pair each page with its folio up front; the counter lives and dies
        // inside this zip.
        let mut stamped_ids: Vec<ObjectId> = Vec::with_capacity(range.len());
        let to_stamp = pages
            .iter()
            .filter(|(number, _)| range.contains(**number as usize - 1));
        for ((_, &page_id), folio) in to_stamp.zip(options.start_number..) {
            let text = overlay::folio_text(folio);
            overlay::stamp_page(
                doc,
                page_id,
                font_id,
                &text,
                options.font_size,
                options.offset_cm,
                options.corner,
                options.orientation,
            )?;
            stamped_ids.push(page_id);
        }

        if options.preview {
            retain_pages(doc, &stamped_ids)?;
        }

        let pages_stamped = stamped_ids.len();
        debug!(
            pages_stamped,
            start_number = options.start_number,
            preview = options.preview,
            "folio stamping complete"
        );

        Ok(StampSummary {
            pages_stamped,
            first_folio: options.start_number,
            last_folio: options.start_number + pages_stamped.saturating_sub(1) as u32,
        })
    }

    fn process(&self, input: &[u8], options: &StampOptions) -> Result<(Vec<u8>, StampSummary)> {
        let mut doc = Document::load_mem(input)?;
        let summary = self.stamp_document(&mut doc, options)?;

        let mut output = Vec::new();
        doc.save_to(&mut output)?;
        Ok((output, summary))
    }

    fn report_success(&self, summary: &StampSummary, options: &StampOptions) {
        if !options.preview {
            self.audit
                .success(options.start_number, summary.pages_stamped, options.corner);
        }
    }
}

/// Stamp `input` into `output` without audit records.
pub fn stamp_pdf_file(input: &Path, output: &Path, options: &StampOptions) -> Result<StampSummary> {
    FolioStamper::new(NullAuditLog).stamp_file(input, output, options)
}

/// Page count and encryption state of a PDF file.
pub fn inspect(path: &Path) -> Result<DocumentInfo> {
    let doc = Document::load(path)?;
    Ok(DocumentInfo {
        page_count: doc.get_pages().len(),
        encrypted: doc.is_encrypted(),
    })
}

/// Rewrite the page tree to hold exactly `keep`, in order.
///
/// Orphaned page objects stay in the file but become unreachable from the
/// catalog, which is how single-page preview output is assembled.
fn retain_pages(doc: &mut Document, keep: &[ObjectId]) -> Result<()> {
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    let pages_id = doc.get_dictionary(catalog_id)?.get(b"Pages")?.as_reference()?;

    let kids: Vec<Object> = keep.iter().map(|&id| Object::Reference(id)).collect();
    let pages = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    pages.set("Kids", Object::Array(kids));
    pages.set("Count", Object::Integer(keep.len() as i64));

    for &page_id in keep {
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        page.set("Parent", Object::Reference(pages_id));
    }
    Ok(())
}
