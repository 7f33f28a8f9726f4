//! External collaborator interfaces: template rendering and PDF conversion.
//!
//! The word-processor templating engine and the office-suite converter are
//! collaborators, not parts of this crate. The traits here pin down the
//! contract the pipeline relies on; the shipped implementations are the
//! smallest useful ones:
//!
//! * [`ContextBundleEngine`] materialises the rendering context as a JSON
//!   manifest plus image files, the hand-off format an external templating
//!   tool (or a test) consumes.
//! * [`SofficeConverter`] drives a headless LibreOffice `--convert-to pdf`
//!   run: synchronous, blocking until the tool exits, no retry — a report
//!   generation is a single foreground batch job.

use crate::context::{ContextValue, RenderingContext};
use crate::error::ReportError;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Renders a [`RenderingContext`] into a document at `output`.
pub trait TemplateEngine {
    fn render(&mut self, context: &RenderingContext, output: &Path) -> Result<(), ReportError>;
}

/// Converts a rendered document to PDF in `out_dir`, returning the PDF path.
///
/// Contract: the converter deposits a same-named file with a `.pdf` extension
/// in `out_dir`; there is no partial-output mode — either the PDF exists on
/// success or the call fails.
pub trait DocumentConverter {
    fn convert_to_pdf(&self, document: &Path, out_dir: &Path) -> Result<PathBuf, ReportError>;
}

// ── Context bundle engine ────────────────────────────────────────────────

/// Writes the context as `output` (a JSON manifest) plus the image files in a
/// sibling `<stem>_images/` directory.
///
/// The manifest maps every scalar field to its string value and every
/// placeholder to an ordered list of `{file, width_mm}` entries, which is all
/// an external templating step needs to place the evidence.
#[derive(Debug, Default)]
pub struct ContextBundleEngine;

impl ContextBundleEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for ContextBundleEngine {
    fn render(&mut self, context: &RenderingContext, output: &Path) -> Result<(), ReportError> {
        let write_failed = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ReportError::OutputWriteFailed { path, source }
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_failed(output))?;
            }
        }

        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "context".to_string());
        let images_dir = output.with_file_name(format!("{stem}_images"));

        let mut fields = serde_json::Map::new();
        let mut placeholders = serde_json::Map::new();

        for (key, value) in context {
            match value {
                ContextValue::Scalar(s) => {
                    fields.insert(key.clone(), serde_json::Value::String(s.clone()));
                }
                ContextValue::Images(images) => {
                    if !images.is_empty() {
                        std::fs::create_dir_all(&images_dir).map_err(write_failed(&images_dir))?;
                    }
                    let mut entries = Vec::with_capacity(images.len());
                    for (idx, image) in images.iter().enumerate() {
                        let file = images_dir.join(format!(
                            "{key}-{:03}.{}",
                            idx + 1,
                            image_extension(&image.data)
                        ));
                        std::fs::write(&file, &image.data).map_err(write_failed(&file))?;
                        entries.push(serde_json::json!({
                            "file": file.to_string_lossy(),
                            "width_mm": image.width_mm,
                        }));
                    }
                    placeholders.insert(key.clone(), serde_json::Value::Array(entries));
                }
            }
        }

        let manifest = serde_json::json!({
            "fields": fields,
            "placeholders": placeholders,
        });
        let body = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| ReportError::Internal(format!("manifest serialisation: {e}")))?;
        std::fs::write(output, body).map_err(write_failed(output))?;

        debug!(output = %output.display(), "context bundle written");
        Ok(())
    }
}

/// File suffix for a bundled image, sniffed from its magic bytes.
///
/// Rasterised pages and grids are always PNG, but passthrough uploads keep
/// whatever encoding they arrived in; an unrecognised buffer gets a neutral
/// suffix rather than a misleading one.
fn image_extension(data: &[u8]) -> &'static str {
    image::guess_format(data)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("bin")
}

// ── Headless office-suite converter ──────────────────────────────────────

/// [`DocumentConverter`] backed by `soffice --headless --convert-to pdf`.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    binary: PathBuf,
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("soffice"),
        }
    }
}

impl SofficeConverter {
    /// Use a specific soffice binary instead of resolving via `PATH`.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl DocumentConverter for SofficeConverter {
    fn convert_to_pdf(&self, document: &Path, out_dir: &Path) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(out_dir).map_err(|source| ReportError::OutputWriteFailed {
            path: out_dir.to_path_buf(),
            source,
        })?;

        info!(document = %document.display(), "converting to PDF via soffice");
        let output = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(document)
            .output()
            .map_err(|e| ReportError::ConverterNotFound {
                binary: self.binary.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ReportError::ConversionFailed {
                detail: format!(
                    "{} exited with {}: {}",
                    self.binary.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        // soffice signals success through its exit code but writes the file
        // it feels like writing; verify the contract before reporting one.
        let stem = document
            .file_stem()
            .ok_or_else(|| ReportError::ConversionFailed {
                detail: format!("document path has no file name: {}", document.display()),
            })?;
        let pdf_path = out_dir.join(stem).with_extension("pdf");
        if !pdf_path.exists() {
            return Err(ReportError::ConvertedFileMissing { path: pdf_path });
        }

        info!(pdf = %pdf_path.display(), "conversion complete");
        Ok(pdf_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EmbeddableImage;

    #[test]
    fn bundle_engine_writes_manifest_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("context.json");

        let mut ctx = RenderingContext::new();
        ctx.insert_scalar("SISTEMA_MES_REFERENCIA", "2026-08");
        ctx.insert_images(
            "TABELA_OBITO",
            vec![
                EmbeddableImage::new(vec![1, 2], 160.0),
                EmbeddableImage::new(vec![3, 4], 160.0),
            ],
        );
        ctx.insert_images("SLOT_VAZIO", Vec::new());

        let mut engine = ContextBundleEngine::new();
        engine.render(&ctx, &output).unwrap();

        let manifest: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
        assert_eq!(
            manifest["fields"]["SISTEMA_MES_REFERENCIA"],
            serde_json::json!("2026-08")
        );
        assert_eq!(manifest["placeholders"]["TABELA_OBITO"].as_array().unwrap().len(), 2);
        // Empty slots appear as empty lists, not missing keys.
        assert_eq!(manifest["placeholders"]["SLOT_VAZIO"].as_array().unwrap().len(), 0);

        let first = dir.path().join("context_images/TABELA_OBITO-001.bin");
        assert_eq!(std::fs::read(first).unwrap(), vec![1, 2]);
    }

    #[test]
    fn bundle_suffix_follows_the_actual_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("context.json");

        let mut ctx = RenderingContext::new();
        ctx.insert_images(
            "IMAGEM_NEP",
            vec![
                EmbeddableImage::new(b"\x89PNG\r\n\x1a\n-rest".to_vec(), 160.0),
                EmbeddableImage::new(b"\xFF\xD8\xFF\xE0-rest".to_vec(), 160.0),
                EmbeddableImage::new(vec![0xDE, 0xAD], 160.0),
            ],
        );

        let mut engine = ContextBundleEngine::new();
        engine.render(&ctx, &output).unwrap();

        let images = dir.path().join("context_images");
        assert!(images.join("IMAGEM_NEP-001.png").exists());
        assert!(images.join("IMAGEM_NEP-002.jpg").exists());
        assert!(images.join("IMAGEM_NEP-003.bin").exists());
    }

    #[test]
    fn missing_soffice_binary_is_converter_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("report.docx");
        std::fs::write(&doc, b"fake docx").unwrap();

        let converter = SofficeConverter::with_binary("/nonexistent/soffice-xyz");
        let err = converter.convert_to_pdf(&doc, dir.path()).unwrap_err();
        assert!(matches!(err, ReportError::ConverterNotFound { .. }));
    }

    #[test]
    fn converter_checks_for_deposited_pdf() {
        // `true` exits successfully but deposits nothing, which must be
        // reported as a broken contract rather than success.
        if !Path::new("/bin/true").exists() {
            println!("SKIP — /bin/true not available");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("report.docx");
        std::fs::write(&doc, b"fake docx").unwrap();

        let converter = SofficeConverter::with_binary("/bin/true");
        let err = converter.convert_to_pdf(&doc, dir.path()).unwrap_err();
        assert!(matches!(err, ReportError::ConvertedFileMissing { .. }));
    }

    #[test]
    fn engine_is_object_safe() {
        let mut engine: Box<dyn TemplateEngine> = Box::new(ContextBundleEngine::new());
        let dir = tempfile::tempdir().unwrap();
        engine
            .render(&RenderingContext::new(), &dir.path().join("ctx.json"))
            .unwrap();
    }
}
