//! End-to-end pipeline tests for evidence2docx.
//!
//! The template engine is faked with a capturing implementation so the
//! assembled rendering context can be inspected directly. Tests that need a
//! real PDF plus a pdfium library are gated on `test_cases/sample.pdf`
//! existing and skip cleanly otherwise.

use evidence2docx::{
    fields, generate, AttachmentContent, AttachmentRecord, ContextBundleEngine, ContextValue,
    DocumentConverter, GenerationRequest, ReportConfig, ReportError, RenderingContext,
    SessionState, TemplateEngine,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Template engine that records the context it was asked to render.
#[derive(Default)]
struct CapturingEngine {
    rendered: Option<RenderingContext>,
}

impl TemplateEngine for CapturingEngine {
    fn render(&mut self, context: &RenderingContext, output: &Path) -> Result<(), ReportError> {
        self.rendered = Some(context.clone());
        std::fs::write(output, b"rendered document").map_err(|source| {
            ReportError::OutputWriteFailed {
                path: output.to_path_buf(),
                source,
            }
        })
    }
}

/// Converter that deposits the contractual same-named PDF without an office
/// suite.
struct FakeConverter;

impl DocumentConverter for FakeConverter {
    fn convert_to_pdf(&self, document: &Path, out_dir: &Path) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(out_dir).unwrap();
        let pdf = out_dir.join(document.file_stem().unwrap()).with_extension("pdf");
        std::fs::write(&pdf, b"%PDF-fake").unwrap();
        Ok(pdf)
    }
}

fn month_fields() -> BTreeMap<String, String> {
    BTreeMap::from([(fields::REFERENCE_MONTH.to_string(), "2026-08".to_string())])
}

fn bytes_record(name: &str, bytes: &[u8]) -> AttachmentRecord {
    AttachmentRecord::new(name, AttachmentContent::Bytes(bytes.to_vec()))
}

/// Skip a test unless the given test-case file exists.
macro_rules! skip_unless_file {
    ($path:expr) => {{
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

// ── End-to-end properties ────────────────────────────────────────────────────

#[test]
fn raw_buffers_each_yield_one_image_at_configured_width() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionState::new();
    session
        .attach("IMAGEM_NEP", bytes_record("a.png", &[1]))
        .unwrap();
    session
        .attach("IMAGEM_NEP", bytes_record("b.png", &[2]))
        .unwrap();

    let config = ReportConfig::builder()
        .placeholder_width("IMAGEM_NEP", 120.0)
        .build()
        .unwrap();
    let request = GenerationRequest::new(month_fields(), dir.path().join("out.json"));
    let mut engine = CapturingEngine::default();

    let output = generate(&request, &session, &mut engine, None, &config).unwrap();
    assert_eq!(output.stats.images_produced, 2);

    let ctx = engine.rendered.unwrap();
    let images = ctx.images("IMAGEM_NEP").unwrap();
    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|i| i.width_mm == 120.0));
    // Attachment order preserved.
    assert_eq!(images[0].data, vec![1]);
    assert_eq!(images[1].data, vec![2]);
}

#[test]
fn corrupt_attachment_does_not_block_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionState::new();
    session
        .attach("TABELA_CCIH", bytes_record("ok-1.png", &[1]))
        .unwrap();
    session
        .attach(
            "TABELA_CCIH",
            AttachmentRecord::new(
                "corrupt.pdf",
                AttachmentContent::File { bytes: b"not a pdf".to_vec() },
            ),
        )
        .unwrap();
    session
        .attach("TABELA_CCIH", bytes_record("ok-2.png", &[2]))
        .unwrap();

    let request = GenerationRequest::new(month_fields(), dir.path().join("out.json"));
    let mut engine = CapturingEngine::default();

    let output = generate(
        &request,
        &session,
        &mut engine,
        None,
        &ReportConfig::default(),
    )
    .unwrap();

    assert_eq!(output.stats.total_attachments, 3);
    assert_eq!(output.stats.failed_attachments, 1);
    assert_eq!(output.stats.images_produced, 2);
    assert_eq!(output.attachment_errors.len(), 1);
    assert_eq!(output.attachment_errors[0].attachment_name(), "corrupt.pdf");

    let ctx = engine.rendered.unwrap();
    let images = ctx.images("TABELA_CCIH").unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].data, vec![1]);
    assert_eq!(images[1].data, vec![2]);
}

#[test]
fn empty_placeholder_renders_as_empty_slot() {
    let dir = tempfile::tempdir().unwrap();
    let request = GenerationRequest::new(month_fields(), dir.path().join("out.json"));
    let mut engine = CapturingEngine::default();

    generate(
        &request,
        &SessionState::new(),
        &mut engine,
        None,
        &ReportConfig::default(),
    )
    .unwrap();

    // Every known upload placeholder resolves even with nothing attached,
    // width override or not.
    let ctx = engine.rendered.unwrap();
    for key in fields::UPLOAD_PLACEHOLDERS {
        match ctx.get(key) {
            Some(ContextValue::Images(images)) => assert!(images.is_empty()),
            other => panic!("expected empty image slot for {key}, got {other:?}"),
        }
    }
}

#[test]
fn derived_scalars_reach_the_context() {
    let dir = tempfile::tempdir().unwrap();
    let mut fields_in = month_fields();
    fields_in.insert(fields::TOTAL_VISITS.to_string(), "200".to_string());
    fields_in.insert(fields::TRANSFER_COUNT.to_string(), "10".to_string());
    fields_in.insert(fields::CLINICAL_PHYSICIAN.to_string(), "4".to_string());
    fields_in.insert(fields::PEDIATRIC_PHYSICIAN.to_string(), "6".to_string());
    fields_in.insert(
        fields::TRANSFER_DESTINATIONS.to_string(),
        "Hospital A\nHospital B".to_string(),
    );

    let request = GenerationRequest::new(fields_in, dir.path().join("out.json"));
    let mut engine = CapturingEngine::default();
    generate(
        &request,
        &SessionState::new(),
        &mut engine,
        None,
        &ReportConfig::default(),
    )
    .unwrap();

    let ctx = engine.rendered.unwrap();
    assert_eq!(ctx.scalar(fields::TRANSFER_RATE), Some("5.00%"));
    assert_eq!(ctx.scalar(fields::DOCTOR_TOTAL), Some("10"));
    assert_eq!(
        ctx.scalar(fields::TRANSFER_DESTINATIONS),
        Some("Hospital A / Hospital B")
    );
    assert_eq!(ctx.scalar(fields::REFERENCE_MONTH), Some("2026-08"));
}

#[test]
fn zero_visits_produces_sentinel_not_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut fields_in = month_fields();
    fields_in.insert(fields::TOTAL_VISITS.to_string(), "0".to_string());
    fields_in.insert(fields::TRANSFER_COUNT.to_string(), "10".to_string());

    let request = GenerationRequest::new(fields_in, dir.path().join("out.json"));
    let mut engine = CapturingEngine::default();
    generate(
        &request,
        &SessionState::new(),
        &mut engine,
        None,
        &ReportConfig::default(),
    )
    .unwrap();

    assert_eq!(
        engine.rendered.unwrap().scalar(fields::TRANSFER_RATE),
        Some("Erro no cálculo")
    );
}

#[test]
fn conversion_step_reports_the_deposited_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let request = GenerationRequest::new(month_fields(), dir.path().join("relatorio.json"))
        .with_pdf_output(dir.path().join("pdf"));
    let mut engine = CapturingEngine::default();

    let output = generate(
        &request,
        &SessionState::new(),
        &mut engine,
        Some(&FakeConverter),
        &ReportConfig::default(),
    )
    .unwrap();
    let pdf = output.pdf.expect("pdf path");
    assert_eq!(pdf.file_name().unwrap(), "relatorio.pdf");
    assert!(pdf.exists());
}

#[test]
fn bundle_engine_full_run_writes_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionState::new();
    session
        .attach("IMAGEM_TREINAMENTO_INTERNO", bytes_record("t.png", &[7, 8]))
        .unwrap();

    let request = GenerationRequest::new(month_fields(), dir.path().join("context.json"));
    let mut engine = ContextBundleEngine::new();
    generate(
        &request,
        &session,
        &mut engine,
        None,
        &ReportConfig::default(),
    )
    .unwrap();

    let manifest: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("context.json")).unwrap()).unwrap();
    assert_eq!(manifest["fields"][fields::REFERENCE_MONTH], "2026-08");
    let entries = manifest["placeholders"]["IMAGEM_TREINAMENTO_INTERNO"]
        .as_array()
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["width_mm"], 160.0);
}

// ── PDF rasterisation (needs a real PDF and a pdfium library) ────────────────

#[test]
fn pdf_pages_expand_in_document_order() {
    let path = skip_unless_file!(test_cases_dir().join("sample.pdf"));
    let bytes = std::fs::read(&path).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionState::new();
    session
        .attach(
            "PDF_OUVIDORIA_INTERNA",
            AttachmentRecord::new("sample.pdf", AttachmentContent::File { bytes }),
        )
        .unwrap();

    let request = GenerationRequest::new(month_fields(), dir.path().join("out.json"));
    let mut engine = CapturingEngine::default();
    let output = generate(
        &request,
        &session,
        &mut engine,
        None,
        &ReportConfig::default(),
    )
    .unwrap();

    if !output.attachment_errors.is_empty() {
        // No pdfium library on this machine; the item degraded to empty.
        println!("SKIP — pdfium unavailable: {}", output.attachment_errors[0]);
        return;
    }

    let ctx = engine.rendered.unwrap();
    let images = ctx.images("PDF_OUVIDORIA_INTERNA").unwrap();
    assert!(!images.is_empty());
    // Every page comes out as PNG at the placeholder's width.
    for image in images {
        assert_eq!(&image.data[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(image.width_mm, 160.0);
    }
}
