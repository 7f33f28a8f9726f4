//! Error types for the evidence2docx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReportError`] — **Fatal**: the generation cannot produce a document at
//!   all (missing reference month, template rendering failed, the external
//!   converter failed). Returned as `Err(ReportError)` from
//!   [`crate::generate::generate`].
//!
//! * [`AttachmentError`] — **Non-fatal**: a single attachment failed to
//!   normalise (corrupt PDF, unreadable spreadsheet, no usable font for the
//!   grid). The item contributes zero images, the error is collected into
//!   [`crate::generate::GenerationOutput::attachment_errors`], and the rest of
//!   the report is generated normally.
//!
//! The separation lets callers decide their own tolerance: surface every item
//! failure to the operator, or only care whether a document came out at all.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the evidence2docx library.
///
/// Per-attachment failures use [`AttachmentError`] and are collected in
/// [`crate::generate::GenerationOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The reference-month field is empty or missing. Generation refuses to
    /// start: a report without its reference period is not a partial success.
    #[error("Reference month is required ('{field}' is empty).\nFill it in before generating.")]
    MissingReferenceMonth { field: String },

    /// An attachment with the same display name is already queued under the
    /// placeholder. Uniqueness-by-name is enforced before normalisation.
    #[error("Attachment '{name}' is already queued under placeholder '{key}'")]
    DuplicateAttachment { key: String, name: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The template-engine collaborator failed to render the document.
    #[error("Template rendering failed: {detail}")]
    TemplateRenderFailed { detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The external converter binary could not be spawned at all.
    #[error(
        "Could not run document converter '{binary}': {detail}\n\
         Install LibreOffice or point the converter at an existing soffice binary."
    )]
    ConverterNotFound { binary: PathBuf, detail: String },

    /// The external converter ran but exited unsuccessfully.
    #[error("Document conversion failed: {detail}")]
    ConversionFailed { detail: String },

    /// The converter reported success but the expected PDF never appeared.
    #[error("Converter exited successfully but produced no file at '{path}'")]
    ConvertedFileMissing { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single attachment.
///
/// Stored in [`crate::generate::GenerationOutput::attachment_errors`] when an
/// item fails to normalise. The overall generation continues; the failed item
/// simply contributes no images to its placeholder.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum AttachmentError {
    /// No pdfium library could be bound; PDF attachments cannot be rasterised.
    #[error("'{name}': pdfium library unavailable: {detail}")]
    PdfiumUnavailable { name: String, detail: String },

    /// The PDF could not be opened (corrupt, truncated, encrypted).
    #[error("'{name}': could not open PDF: {detail}")]
    UnreadablePdf { name: String, detail: String },

    /// A specific page failed to rasterise.
    #[error("'{name}': rasterisation failed on page {page}: {detail}")]
    PageRasterisation {
        name: String,
        page: usize,
        detail: String,
    },

    /// The spreadsheet could not be opened or read.
    #[error("'{name}': could not read spreadsheet: {detail}")]
    SpreadsheetRead { name: String, detail: String },

    /// The workbook has no sheet with the fixed transfer-table name.
    #[error("'{name}': sheet '{sheet}' not found in workbook")]
    SheetMissing { name: String, sheet: String },

    /// No usable bold font was found for drawing the transfer-table grid.
    #[error("'{name}': no usable font for table grid: {detail}")]
    FontUnavailable { name: String, detail: String },

    /// Drawing or rasterising the table grid failed.
    #[error("'{name}': table grid rendering failed: {detail}")]
    GridRender { name: String, detail: String },

    /// PNG-encoding a bitmap or rendered page failed.
    #[error("'{name}': image encoding failed: {detail}")]
    ImageEncode { name: String, detail: String },
}

impl AttachmentError {
    /// Display name of the attachment that failed.
    pub fn attachment_name(&self) -> &str {
        match self {
            AttachmentError::PdfiumUnavailable { name, .. }
            | AttachmentError::UnreadablePdf { name, .. }
            | AttachmentError::PageRasterisation { name, .. }
            | AttachmentError::SpreadsheetRead { name, .. }
            | AttachmentError::SheetMissing { name, .. }
            | AttachmentError::FontUnavailable { name, .. }
            | AttachmentError::GridRender { name, .. }
            | AttachmentError::ImageEncode { name, .. } => name,
        }
    }
}
