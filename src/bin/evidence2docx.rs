//! CLI binary for evidence2docx.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! [`GenerationRequest`] and prints results.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use evidence2docx::{
    generate, AttachmentContent, AttachmentRecord, ContextBundleEngine, DocumentConverter,
    GenerationProgressCallback, GenerationRequest, ReportConfig, SessionState, SofficeConverter,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the attachment queue plus a log
/// line per failed item.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos}/{len} attachments  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_prefix("Normalising");
        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, total_attachments: usize) {
        self.bar.set_length(total_attachments as u64);
    }

    fn on_attachment_start(&self, placeholder: &str, name: &str) {
        self.bar.set_message(format!("{placeholder} ← {name}"));
    }

    fn on_attachment_done(&self, _placeholder: &str, _name: &str, _images: usize) {
        self.bar.inc(1);
    }

    fn on_attachment_error(&self, placeholder: &str, name: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("{} {placeholder} ← {name}: {error}", red("✗")));
        self.bar.inc(1);
    }

    fn on_generation_complete(&self, _total: usize, failed: usize) {
        if failed == 0 {
            self.bar.finish_with_message(green("all attachments ok"));
        } else {
            self.bar
                .finish_with_message(red(&format!("{failed} attachment(s) failed")));
        }
    }
}

// ── Argument parsing ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "evidence2docx",
    version,
    about = "Normalise evidentiary attachments into a report rendering context",
    after_help = "EXAMPLES:\n  \
        evidence2docx normalize --fields fields.json \\\n      \
        -a TABELA_TRANSFERENCIA=transferencias.xlsx \\\n      \
        -a PDF_OUVIDORIA_INTERNA=ouvidoria.pdf \\\n      \
        -o out/context.json\n  \
        evidence2docx topdf relatorio.docx --outdir out/"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalise attachments and write the rendering-context bundle.
    Normalize {
        /// JSON file with manual field values ({"FIELD": "value", ...}).
        #[arg(long)]
        fields: Option<PathBuf>,

        /// Reference month; overrides the field file.
        #[arg(long)]
        month: Option<String>,

        /// Attachment as PLACEHOLDER=path; repeatable, order preserved.
        #[arg(short = 'a', long = "attach", value_name = "KEY=PATH")]
        attachments: Vec<String>,

        /// Output path for the context manifest.
        #[arg(short, long, default_value = "context.json")]
        output: PathBuf,

        /// Bold TTF/OTF font for the transfer-table grid.
        #[arg(long)]
        font: Option<PathBuf>,

        /// Grid rasterisation DPI (150–200).
        #[arg(long, default_value_t = 180)]
        grid_dpi: u32,

        /// Print the generation stats as JSON on stdout.
        #[arg(long)]
        json: bool,
    },

    /// Convert a rendered document to PDF via headless LibreOffice.
    Topdf {
        /// Rendered document (e.g. relatorio.docx).
        document: PathBuf,

        /// Directory receiving the same-named PDF.
        #[arg(long, default_value = ".")]
        outdir: PathBuf,

        /// soffice binary to use instead of PATH lookup.
        #[arg(long)]
        soffice: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Normalize {
            fields,
            month,
            attachments,
            output,
            font,
            grid_dpi,
            json,
        } => run_normalize(fields, month, attachments, output, font, grid_dpi, json),
        Commands::Topdf {
            document,
            outdir,
            soffice,
        } => run_topdf(document, outdir, soffice),
    }
}

fn run_normalize(
    fields_path: Option<PathBuf>,
    month: Option<String>,
    attachments: Vec<String>,
    output: PathBuf,
    font: Option<PathBuf>,
    grid_dpi: u32,
    json: bool,
) -> Result<()> {
    let mut fields: BTreeMap<String, String> = match &fields_path {
        Some(path) => {
            let body = std::fs::read(path)
                .with_context(|| format!("reading field file '{}'", path.display()))?;
            serde_json::from_slice(&body)
                .with_context(|| format!("parsing field file '{}'", path.display()))?
        }
        None => BTreeMap::new(),
    };
    if let Some(month) = month {
        fields.insert(evidence2docx::fields::REFERENCE_MONTH.to_string(), month);
    }

    let mut session = SessionState::new();
    for spec in &attachments {
        let (key, path) = parse_attachment_spec(spec)?;
        let bytes = std::fs::read(&path)
            .with_context(|| format!("reading attachment '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| spec.clone());
        session
            .attach(key, AttachmentRecord::new(name, AttachmentContent::File { bytes }))
            .context("queueing attachment")?;
    }

    let progress = CliProgressCallback::new();
    let mut builder = ReportConfig::builder()
        .grid_dpi(grid_dpi)
        .progress_callback(progress.clone());
    if let Some(font) = font {
        builder = builder.font_path(font);
    }
    let config = builder.build()?;

    let request = GenerationRequest::new(fields, output);
    let mut engine = ContextBundleEngine::new();
    let result = generate(&request, &session, &mut engine, None, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.stats)?);
    } else {
        eprintln!(
            "{} {}",
            green("✓"),
            bold(&format!(
                "context written to {} ({} image(s) from {} attachment(s))",
                result.document.display(),
                result.stats.images_produced,
                result.stats.total_attachments,
            ))
        );
        for err in &result.attachment_errors {
            eprintln!("  {} {err}", red("✗"));
        }
        if result.stats.failed_attachments > 0 {
            eprintln!(
                "{}",
                dim("failed attachments contributed no images; the report was still generated")
            );
        }
    }
    Ok(())
}

fn run_topdf(document: PathBuf, outdir: PathBuf, soffice: Option<PathBuf>) -> Result<()> {
    if !document.exists() {
        bail!("document not found: {}", document.display());
    }
    let converter = match soffice {
        Some(binary) => SofficeConverter::with_binary(binary),
        None => SofficeConverter::default(),
    };
    let pdf = converter.convert_to_pdf(&document, &outdir)?;
    eprintln!("{} {}", green("✓"), bold(&format!("PDF written to {}", pdf.display())));
    Ok(())
}

/// Split a `PLACEHOLDER=path` attachment specification.
fn parse_attachment_spec(spec: &str) -> Result<(String, PathBuf)> {
    match spec.split_once('=') {
        Some((key, path)) if !key.is_empty() && !path.is_empty() => {
            Ok((key.to_string(), PathBuf::from(path)))
        }
        _ => bail!("invalid attachment spec '{spec}' (expected PLACEHOLDER=path)"),
    }
}
