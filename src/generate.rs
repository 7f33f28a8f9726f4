//! Top-level generation entry point.
//!
//! One `generate` call runs the full normalise → assemble → render → convert
//! pipeline synchronously to completion: there is no background work and no
//! partially generated report. Per-attachment failures are collected into the
//! output; only the failures that make the document itself impossible
//! (missing reference month, template rendering, conversion) are fatal.

use crate::config::ReportConfig;
use crate::context::RenderingContext;
use crate::engine::{DocumentConverter, TemplateEngine};
use crate::error::{AttachmentError, ReportError};
use crate::pipeline::{normalize, scalars};
use crate::session::SessionState;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// One generation request: manual field values plus output destinations.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Manual field values keyed by template field name.
    pub fields: BTreeMap<String, String>,
    /// Where the template engine writes the rendered document.
    pub output_path: PathBuf,
    /// When set, the rendered document is additionally converted to PDF in
    /// this directory.
    pub pdf_output_dir: Option<PathBuf>,
}

impl GenerationRequest {
    pub fn new(fields: BTreeMap<String, String>, output_path: PathBuf) -> Self {
        Self {
            fields,
            output_path,
            pdf_output_dir: None,
        }
    }

    pub fn with_pdf_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pdf_output_dir = Some(dir.into());
        self
    }
}

/// Timing and count summary of one generation, serialisable for logs or a
/// `--json` CLI report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationStats {
    pub total_attachments: usize,
    pub failed_attachments: usize,
    pub images_produced: usize,
    pub normalize_duration_ms: u64,
    pub render_duration_ms: u64,
    pub convert_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of a successful generation.
///
/// "Successful" means a document was rendered; individual attachments may
/// still have failed — check [`GenerationOutput::attachment_errors`].
#[derive(Debug)]
pub struct GenerationOutput {
    /// Path of the rendered document.
    pub document: PathBuf,
    /// Path of the converted PDF, when conversion was requested.
    pub pdf: Option<PathBuf>,
    pub stats: GenerationStats,
    /// Non-fatal per-attachment failures, in processing order.
    pub attachment_errors: Vec<AttachmentError>,
}

/// Run the full pipeline for one report.
///
/// # Errors
/// Returns `Err(ReportError)` only for fatal conditions:
/// - the reference-month field is empty (no partial output is produced)
/// - the template engine failed to render
/// - PDF conversion was requested and failed
pub fn generate(
    request: &GenerationRequest,
    session: &SessionState,
    engine: &mut dyn TemplateEngine,
    converter: Option<&dyn DocumentConverter>,
    config: &ReportConfig,
) -> Result<GenerationOutput, ReportError> {
    let total_start = Instant::now();

    // ── Step 1: Refuse to start without the reference month ──────────────
    let month = request
        .fields
        .get(&config.reference_month_field)
        .map(String::as_str)
        .unwrap_or("");
    if month.trim().is_empty() {
        return Err(ReportError::MissingReferenceMonth {
            field: config.reference_month_field.clone(),
        });
    }
    info!(month, "starting report generation");

    let total_attachments = session.total_records();
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(total_attachments);
    }

    // ── Step 2: Normalise attachments ────────────────────────────────────
    let normalize_start = Instant::now();
    let normalized = normalize::normalize_session(session, config);
    let normalize_duration_ms = normalize_start.elapsed().as_millis() as u64;
    if !normalized.errors.is_empty() {
        warn!(
            failed = normalized.errors.len(),
            "some attachments contributed no images"
        );
    }

    // ── Step 3: Assemble the rendering context ───────────────────────────
    let mut context = RenderingContext::new();
    scalars::assemble(&request.fields, &mut context);
    let images_produced = normalized.total_images();
    for (key, images) in normalized.images {
        context.insert_images(key, images);
    }
    // Configured placeholders with nothing attached resolve as empty slots.
    for key in config
        .placeholder_keys
        .iter()
        .chain(config.placeholder_widths_mm.keys())
    {
        context.ensure_images(key);
    }

    // ── Step 4: Render the document ──────────────────────────────────────
    let render_start = Instant::now();
    engine.render(&context, &request.output_path)?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(document = %request.output_path.display(), "document rendered");

    // ── Step 5: Optional PDF conversion ──────────────────────────────────
    let convert_start = Instant::now();
    let pdf = match (&request.pdf_output_dir, converter) {
        (Some(dir), Some(converter)) => {
            Some(converter.convert_to_pdf(&request.output_path, dir)?)
        }
        (Some(_), None) => {
            return Err(ReportError::ConversionFailed {
                detail: "PDF output requested but no converter was supplied".into(),
            })
        }
        _ => None,
    };
    let convert_duration_ms = convert_start.elapsed().as_millis() as u64;

    let stats = GenerationStats {
        total_attachments,
        failed_attachments: normalized.errors.len(),
        images_produced,
        normalize_duration_ms,
        render_duration_ms,
        convert_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(total_attachments, stats.failed_attachments);
    }
    info!(
        attachments = total_attachments,
        failed = stats.failed_attachments,
        images = stats.images_produced,
        ms = stats.total_duration_ms,
        "generation complete"
    );

    Ok(GenerationOutput {
        document: request.output_path.clone(),
        pdf,
        stats,
        attachment_errors: normalized.errors,
    })
}
