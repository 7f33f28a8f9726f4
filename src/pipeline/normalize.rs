//! The attachment normaliser: one record in, zero or more embeddable images out.
//!
//! Dispatch is an exhaustive match over [`AttachmentContent`] plus, for file
//! uploads, the display-name extension — first matching rule wins:
//!
//! 1. in-memory bitmap → PNG-encode, wrap as one image
//! 2. raw byte buffer → wrap as-is, one image (no decoding; the buffer is
//!    already encoded image content)
//! 3. spreadsheet upload under the transfer-table key → range extraction,
//!    one grid image
//! 4. `.pdf` upload → one image per page, page order preserved
//! 5. any other upload → wrap the bytes as-is, one image
//!
//! Every image is wrapped at the placeholder's configured target width.
//!
//! ## Failure handling
//!
//! [`normalize_record`] returns `Err` for anything that goes wrong with the
//! one item; [`normalize_session`] catches it there, logs it, reports it to
//! the progress callback, and moves on. A corrupt PDF between two good
//! screenshots costs exactly its own images, nothing else.

use crate::config::ReportConfig;
use crate::context::EmbeddableImage;
use crate::error::AttachmentError;
use crate::pipeline::rasterize::{png_bytes, rasterize_pdf};
use crate::pipeline::spreadsheet::render_spreadsheet;
use crate::session::{AttachmentContent, AttachmentRecord, SessionState};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result of normalising a whole session: ordered image lists per placeholder
/// plus every per-item failure encountered along the way.
#[derive(Debug, Default)]
pub struct NormalizedAttachments {
    /// Placeholder → ordered embeddable images. A placeholder whose every
    /// record failed still appears here with an empty list.
    pub images: BTreeMap<String, Vec<EmbeddableImage>>,
    /// Non-fatal per-item failures, in processing order.
    pub errors: Vec<AttachmentError>,
}

impl NormalizedAttachments {
    /// Total images produced across all placeholders.
    pub fn total_images(&self) -> usize {
        self.images.values().map(Vec::len).sum()
    }
}

/// Normalise one record into its ordered image expansion.
pub fn normalize_record(
    key: &str,
    record: &AttachmentRecord,
    config: &ReportConfig,
) -> Result<Vec<EmbeddableImage>, AttachmentError> {
    let width = config.width_for(key);

    match &record.content {
        // Already decoded in memory; encode once, wrap directly.
        AttachmentContent::Bitmap(img) => {
            let data = png_bytes(img).map_err(|e| AttachmentError::ImageEncode {
                name: record.name.clone(),
                detail: e.to_string(),
            })?;
            Ok(vec![EmbeddableImage::new(data, width)])
        }

        // Already-encoded image content; no decoding beyond wrapping.
        AttachmentContent::Bytes(bytes) => Ok(vec![EmbeddableImage::new(bytes.clone(), width)]),

        AttachmentContent::File { bytes } => {
            if key == config.transfer_table_key && has_extension(&record.name, &["xlsx", "xls"]) {
                let grid = render_spreadsheet(&record.name, bytes, config)?;
                Ok(vec![EmbeddableImage::new(grid, width)])
            } else if has_extension(&record.name, &["pdf"]) {
                let pages = rasterize_pdf(&record.name, bytes, config.pdf_scale)?;
                Ok(pages
                    .into_iter()
                    .map(|page| EmbeddableImage::new(page, width))
                    .collect())
            } else {
                // A plain image upload; the template engine handles scaling.
                Ok(vec![EmbeddableImage::new(bytes.clone(), width)])
            }
        }
    }
}

/// Normalise every queued record, preserving per-placeholder attachment order.
///
/// Item failures are collected, never propagated: the pipeline always
/// finishes, and a placeholder with only failed records resolves to an empty
/// image list rather than a missing key.
pub fn normalize_session(session: &SessionState, config: &ReportConfig) -> NormalizedAttachments {
    let mut out = NormalizedAttachments::default();
    let cb = config.progress_callback.as_deref();

    for (key, records) in session.iter() {
        let slot = out.images.entry(key.clone()).or_default();
        for record in records {
            if let Some(cb) = cb {
                cb.on_attachment_start(key, &record.name);
            }
            match normalize_record(key, record, config) {
                Ok(images) => {
                    debug!(key = %key, name = %record.name, count = images.len(), "attachment normalised");
                    if let Some(cb) = cb {
                        cb.on_attachment_done(key, &record.name, images.len());
                    }
                    slot.extend(images);
                }
                Err(err) => {
                    warn!(key = %key, name = %record.name, %err, "attachment failed; continuing");
                    if let Some(cb) = cb {
                        cb.on_attachment_error(key, &record.name, &err.to_string());
                    }
                    out.errors.push(err);
                }
            }
        }
    }

    out
}

/// Case-insensitive extension check against the display name.
fn has_extension(name: &str, extensions: &[&str]) -> bool {
    let lower = name.to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}
