//! Configuration types for report generation.
//!
//! All generation behaviour is controlled through [`ReportConfig`], built via
//! its [`ReportConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across handlers and to diff two runs to
//! understand why their outputs differ.
//!
//! The placeholder width table is configuration, not semantics: per-field
//! target widths have drifted between report revisions (the transfer table
//! alone has shipped anywhere between 90 mm and 165 mm) while the pipeline
//! itself stayed identical.

use crate::error::ReportError;
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Well-known field and placeholder keys used by the report template.
///
/// Keys are kept verbatim from the production template (Portuguese), since
/// they must match the placeholder names inside the `.docx` byte-for-byte.
pub mod fields {
    /// Required reference month; generation refuses to start without it.
    pub const REFERENCE_MONTH: &str = "SISTEMA_MES_REFERENCIA";
    /// Total patient visits in the period (input to the transfer rate).
    pub const TOTAL_VISITS: &str = "ANALISTA_TOTAL_ATENDIMENTOS";
    /// Total transfers in the period (input to the transfer rate).
    pub const TRANSFER_COUNT: &str = "SISTEMA_TOTAL_DE_TRANSFERENCIA";
    /// Derived: `(transfers / visits) * 100`, e.g. `"5.00%"`.
    pub const TRANSFER_RATE: &str = "SISTEMA_TAXA_DE_TRANSFERENCIA";
    /// Clinical physician visit count (input to the doctor total).
    pub const CLINICAL_PHYSICIAN: &str = "ANALISTA_MEDICO_CLINICO";
    /// Pediatric physician visit count (input to the doctor total).
    pub const PEDIATRIC_PHYSICIAN: &str = "ANALISTA_MEDICO_PEDIATRA";
    /// Derived: clinical + pediatric physician counts.
    pub const DOCTOR_TOTAL: &str = "ANALISTA_TOTAL_MEDICOS";
    /// Newline-separated transfer destinations, joined with `" / "`.
    pub const TRANSFER_DESTINATIONS: &str = "MANUAL_DESTINO_TRANSFERENCIA";
    /// Placeholder that receives the rendered transfer-table grid.
    pub const TRANSFER_TABLE: &str = "TABELA_TRANSFERENCIA";

    /// Every upload placeholder the report template resolves. Each one must
    /// appear in the rendering context, as an empty list when nothing was
    /// attached, or the template fails to render.
    pub const UPLOAD_PLACEHOLDERS: &[&str] = &[
        "EXCEL_META_ATENDIMENTOS",
        "IMAGEM_PRINT_ATENDIMENTO",
        "IMAGEM_DOCUMENTO_RAIO_X",
        TRANSFER_TABLE,
        "GRAFICO_TRANSFERENCIA",
        "TABELA_OBITO",
        "TABELA_TOTAL_OBITO",
        "TABELA_CCIH",
        "IMAGEM_NEP",
        "IMAGEM_TREINAMENTO_INTERNO",
        "IMAGEM_MELHORIAS",
        "GRAFICO_OUVIDORIA",
        "PDF_OUVIDORIA_INTERNA",
        "TABELA_QUALITATIVA_IMG",
        "PRINT_CLASSIFICAÇÃO",
    ];
}

/// Width an image occupies in the document when no per-placeholder override
/// exists: A4 page width minus default margins.
pub const DEFAULT_WIDTH_MM: f64 = 160.0;

/// Static placeholder → target width table (millimetres).
///
/// Only keys that differ from [`DEFAULT_WIDTH_MM`] need an entry.
static PLACEHOLDER_WIDTHS_MM: Lazy<BTreeMap<&'static str, f64>> = Lazy::new(|| {
    BTreeMap::from([
        // The grid is narrower than a full-bleed screenshot so the table does
        // not dwarf the surrounding prose.
        (fields::TRANSFER_TABLE, 150.0),
    ])
});

/// Configuration for one report generation.
///
/// Built via [`ReportConfig::builder()`] or using [`ReportConfig::default()`].
///
/// # Example
/// ```rust
/// use evidence2docx::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .grid_dpi(150)
///     .placeholder_width("TABELA_TRANSFERENCIA", 120.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.width_for("TABELA_TRANSFERENCIA"), 120.0);
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// Per-placeholder target width overrides in millimetres.
    ///
    /// Any key absent from this table falls back to `default_width_mm`.
    pub placeholder_widths_mm: BTreeMap<String, f64>,

    /// Fallback target width in millimetres. Default: 160.
    pub default_width_mm: f64,

    /// Placeholder key that triggers spreadsheet-range extraction for
    /// `.xlsx`/`.xls` uploads. Default: `TABELA_TRANSFERENCIA`.
    ///
    /// A spreadsheet uploaded under any *other* key is wrapped as-is like any
    /// unknown file, matching the dispatch policy: the extraction only makes
    /// sense for the one slot whose template placeholder expects the grid.
    pub transfer_table_key: String,

    /// Placeholder keys the template resolves every run. Each gets an image
    /// list in the context — empty when nothing was attached — so the
    /// template never hits a missing key. Default:
    /// [`fields::UPLOAD_PLACEHOLDERS`].
    pub placeholder_keys: Vec<String>,

    /// Worksheet name holding the transfer table. Default: `TRANSFERENCIAS`.
    pub sheet_name: String,

    /// DPI at which the transfer-table grid is rasterised. Range: 150–200.
    /// Default: 180.
    ///
    /// Below 150 the bold cell text turns fuzzy in print; above 200 the PNG
    /// grows without any visible gain at the grid's physical size.
    pub grid_dpi: u32,

    /// Linear upscale factor for PDF page rasterisation. Range: 1.0–4.0.
    /// Default: 2.0.
    ///
    /// 2× linear (4× pixel area) keeps rasterised report pages legible in
    /// print. Higher factors balloon memory on A3 landscape exports.
    pub pdf_scale: f32,

    /// Path to a bold TTF/OTF font for the grid. If `None`, common system
    /// font locations are probed.
    pub font_path: Option<PathBuf>,

    /// Field whose emptiness blocks generation. Default:
    /// [`fields::REFERENCE_MONTH`].
    pub reference_month_field: String,

    /// Optional progress callback receiving per-attachment events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            placeholder_widths_mm: PLACEHOLDER_WIDTHS_MM
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            default_width_mm: DEFAULT_WIDTH_MM,
            transfer_table_key: fields::TRANSFER_TABLE.to_string(),
            placeholder_keys: fields::UPLOAD_PLACEHOLDERS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            sheet_name: "TRANSFERENCIAS".to_string(),
            grid_dpi: 180,
            pdf_scale: 2.0,
            font_path: None,
            reference_month_field: fields::REFERENCE_MONTH.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("placeholder_widths_mm", &self.placeholder_widths_mm)
            .field("default_width_mm", &self.default_width_mm)
            .field("transfer_table_key", &self.transfer_table_key)
            .field("placeholder_keys", &self.placeholder_keys)
            .field("sheet_name", &self.sheet_name)
            .field("grid_dpi", &self.grid_dpi)
            .field("pdf_scale", &self.pdf_scale)
            .field("font_path", &self.font_path)
            .field("reference_month_field", &self.reference_month_field)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Target display width for a placeholder, falling back to the default.
    pub fn width_for(&self, key: &str) -> f64 {
        self.placeholder_widths_mm
            .get(key)
            .copied()
            .unwrap_or(self.default_width_mm)
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn placeholder_width(mut self, key: impl Into<String>, mm: f64) -> Self {
        self.config.placeholder_widths_mm.insert(key.into(), mm);
        self
    }

    pub fn default_width_mm(mut self, mm: f64) -> Self {
        self.config.default_width_mm = mm;
        self
    }

    pub fn transfer_table_key(mut self, key: impl Into<String>) -> Self {
        self.config.transfer_table_key = key.into();
        self
    }

    /// Replace the list of placeholder keys the template resolves.
    pub fn placeholder_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.placeholder_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.config.sheet_name = name.into();
        self
    }

    pub fn grid_dpi(mut self, dpi: u32) -> Self {
        self.config.grid_dpi = dpi.clamp(150, 200);
        self
    }

    pub fn pdf_scale(mut self, scale: f32) -> Self {
        self.config.pdf_scale = scale.clamp(1.0, 4.0);
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    pub fn reference_month_field(mut self, field: impl Into<String>) -> Self {
        self.config.reference_month_field = field.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if !(c.default_width_mm > 0.0) {
            return Err(ReportError::InvalidConfig(format!(
                "Default width must be positive, got {} mm",
                c.default_width_mm
            )));
        }
        if let Some((key, mm)) = c
            .placeholder_widths_mm
            .iter()
            .find(|(_, mm)| !(**mm > 0.0))
        {
            return Err(ReportError::InvalidConfig(format!(
                "Width for '{key}' must be positive, got {mm} mm"
            )));
        }
        if c.sheet_name.is_empty() {
            return Err(ReportError::InvalidConfig(
                "Sheet name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_widths() {
        let config = ReportConfig::default();
        assert_eq!(config.width_for("IMAGEM_PRINT_ATENDIMENTO"), 160.0);
        assert_eq!(config.width_for(fields::TRANSFER_TABLE), 150.0);
    }

    #[test]
    fn default_placeholder_keys_cover_every_upload_slot() {
        let config = ReportConfig::default();
        assert_eq!(config.placeholder_keys.len(), 15);
        assert!(config
            .placeholder_keys
            .iter()
            .any(|k| k == fields::TRANSFER_TABLE));
        assert!(config.placeholder_keys.iter().any(|k| k == "IMAGEM_NEP"));
    }

    #[test]
    fn builder_replaces_placeholder_keys() {
        let config = ReportConfig::builder()
            .placeholder_keys(["FOTO_A", "FOTO_B"])
            .build()
            .unwrap();
        assert_eq!(config.placeholder_keys, ["FOTO_A", "FOTO_B"]);
    }

    #[test]
    fn builder_overrides_width() {
        let config = ReportConfig::builder()
            .placeholder_width("GRAFICO_OUVIDORIA", 90.0)
            .default_width_mm(120.0)
            .build()
            .unwrap();
        assert_eq!(config.width_for("GRAFICO_OUVIDORIA"), 90.0);
        assert_eq!(config.width_for("anything-else"), 120.0);
    }

    #[test]
    fn grid_dpi_clamped_to_legible_range() {
        let config = ReportConfig::builder().grid_dpi(600).build().unwrap();
        assert_eq!(config.grid_dpi, 200);
        let config = ReportConfig::builder().grid_dpi(72).build().unwrap();
        assert_eq!(config.grid_dpi, 150);
    }

    #[test]
    fn pdf_scale_clamped() {
        let config = ReportConfig::builder().pdf_scale(10.0).build().unwrap();
        assert_eq!(config.pdf_scale, 4.0);
    }

    #[test]
    fn negative_width_rejected() {
        let err = ReportConfig::builder()
            .placeholder_width("X", -5.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(_)));
    }

    #[test]
    fn nan_default_width_rejected() {
        let err = ReportConfig::builder()
            .default_width_mm(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(_)));
    }
}
