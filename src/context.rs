//! Rendering-context types: the normalised hand-off to the template engine.
//!
//! A [`RenderingContext`] is assembled fresh for every generation and never
//! persisted. It is a flat mapping from template key to either a scalar
//! string or an ordered list of [`EmbeddableImage`]s; the template-engine
//! collaborator consumes it wholesale.
//!
//! Images are plain data (`encoded bytes + target width`) rather than handles
//! bound to an engine instance. The engine receives everything it needs in
//! one `render` call, so the original "same engine instance" binding contract
//! is satisfied structurally instead of by convention.

use std::collections::btree_map;
use std::collections::BTreeMap;

/// The normalised output unit: encoded image content plus the physical width
/// it must occupy in the document.
///
/// Produced only by the normaliser ([`crate::pipeline::normalize`]); consumed
/// only by the [`crate::engine::TemplateEngine`] collaborator. Aspect ratio is
/// preserved by the engine when it scales to `width_mm`; height is never
/// separately constrained.
#[derive(Clone, PartialEq)]
pub struct EmbeddableImage {
    /// Encoded image bytes (PNG for rasterised pages and grids; uploaded
    /// image files pass through unmodified).
    pub data: Vec<u8>,
    /// Target display width in millimetres.
    pub width_mm: f64,
}

impl EmbeddableImage {
    pub fn new(data: Vec<u8>, width_mm: f64) -> Self {
        Self { data, width_mm }
    }
}

// Image byte buffers can be megabytes; Debug prints the length instead.
impl std::fmt::Debug for EmbeddableImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddableImage")
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .field("width_mm", &self.width_mm)
            .finish()
    }
}

/// One value bound to a template key.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// A scalar field (manual input or derived computation).
    Scalar(String),
    /// An ordered image list for a placeholder. May be empty: an empty slot
    /// is a valid rendering outcome, not a missing key.
    Images(Vec<EmbeddableImage>),
}

/// Flat mapping from template key to value, assembled per generation request.
#[derive(Debug, Clone, Default)]
pub struct RenderingContext {
    entries: BTreeMap<String, ContextValue>,
}

impl RenderingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a scalar field, replacing any previous value under the key.
    pub fn insert_scalar(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), ContextValue::Scalar(value.into()));
    }

    /// Bind an ordered image list, replacing any previous value under the key.
    pub fn insert_images(&mut self, key: impl Into<String>, images: Vec<EmbeddableImage>) {
        self.entries
            .insert(key.into(), ContextValue::Images(images));
    }

    /// Bind an empty image list only if the key is not already present.
    ///
    /// Used to guarantee every configured placeholder resolves in the
    /// template even when the operator attached nothing to it.
    pub fn ensure_images(&mut self, key: &str) {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| ContextValue::Images(Vec::new()));
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    /// Ordered image list under a key, if the key is bound to images.
    pub fn images(&self, key: &str) -> Option<&[EmbeddableImage]> {
        match self.entries.get(key) {
            Some(ContextValue::Images(imgs)) => Some(imgs),
            _ => None,
        }
    }

    /// Scalar value under a key, if the key is bound to a scalar.
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(ContextValue::Scalar(s)) => Some(s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ContextValue> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a RenderingContext {
    type Item = (&'a String, &'a ContextValue);
    type IntoIter = btree_map::Iter<'a, String, ContextValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
