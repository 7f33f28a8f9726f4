//! # evidence2docx
//!
//! Normalise heterogeneous evidentiary attachments into fixed-width embeddable
//! images and merge them, together with scalar form fields, into the rendering
//! context of a word-processor report template.
//!
//! ## Why this crate?
//!
//! Monthly service reports are assembled from whatever operators have at hand:
//! pasted screenshots, photographed documents, multi-page PDF exports, and a
//! fixed range of a transfer spreadsheet. Template engines want none of that —
//! they want an ordered list of uniformly sized images per named placeholder.
//! This crate is the adapter: every attachment becomes zero or more
//! [`EmbeddableImage`]s at the placeholder's configured physical width, and a
//! single bad attachment never takes the rest of the report down with it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! attachments (session state)
//!  │
//!  ├─ 1. Normalise  dispatch on attachment kind (bitmap / bytes / xlsx / pdf / image)
//!  │                 ├─ pdf   rasterise every page at 2× via pdfium
//!  │                 └─ xlsx  extract TRANSFERENCIAS!D3:E16 → draw 14×2 grid
//!  ├─ 2. Scalars    derived fields (transfer rate, doctor total, destinations)
//!  ├─ 3. Assemble   placeholder → image list, field → scalar (fresh per run)
//!  ├─ 4. Render     hand the context to the template-engine collaborator
//!  └─ 5. Convert    optional headless office-suite docx → pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use evidence2docx::{
//!     generate, AttachmentContent, AttachmentRecord, ContextBundleEngine,
//!     GenerationRequest, ReportConfig, SessionState,
//! };
//! use std::collections::BTreeMap;
//! use std::path::PathBuf;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReportConfig::default();
//!
//!     let mut session = SessionState::new();
//!     session.attach(
//!         "IMAGEM_PRINT_ATENDIMENTO",
//!         AttachmentRecord::new(
//!             "atendimentos.png",
//!             AttachmentContent::Bytes(std::fs::read("atendimentos.png")?),
//!         ),
//!     )?;
//!
//!     let mut fields = BTreeMap::new();
//!     fields.insert("SISTEMA_MES_REFERENCIA".to_string(), "2026-08".to_string());
//!
//!     let request = GenerationRequest::new(fields, PathBuf::from("out/context.json"));
//!     let mut engine = ContextBundleEngine::new();
//!     let output = generate(&request, &session, &mut engine, None, &config)?;
//!     eprintln!("{} attachment(s) failed", output.stats.failed_attachments);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `evidence2docx` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! evidence2docx = { version = "0.3", default-features = false }
//! ```
//!
//! ## Failure model
//!
//! Two error types, two severities: [`ReportError`] is fatal (the run cannot
//! produce a document at all), [`AttachmentError`] is per-item (the attachment
//! contributes no images and the run continues). See [`error`] for the full
//! taxonomy.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{fields, ReportConfig, ReportConfigBuilder};
pub use context::{ContextValue, EmbeddableImage, RenderingContext};
pub use engine::{ContextBundleEngine, DocumentConverter, SofficeConverter, TemplateEngine};
pub use error::{AttachmentError, ReportError};
pub use generate::{generate, GenerationOutput, GenerationRequest, GenerationStats};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{AttachmentContent, AttachmentRecord, SessionState};
