//! Session-scoped attachment state.
//!
//! The per-placeholder attachment queues live in an explicitly-owned
//! [`SessionState`] value that the UI or CLI layer passes into each handler —
//! there is no process-wide mutable singleton. Records are append-only until
//! removed by index; nothing mutates a record in place.
//!
//! The paste counter exists so pasted captures get distinct display names
//! (`captura-1.png`, `captura-2.png`, …) without the operator naming them;
//! display-name uniqueness per placeholder is the contract the normaliser
//! relies on downstream.

use crate::error::ReportError;
use image::DynamicImage;
use std::collections::btree_map;
use std::collections::BTreeMap;
use tracing::debug;

/// Raw content of one attached item: a closed sum, one variant per kind.
///
/// The normaliser matches this exhaustively; adding a kind is a compile-time
/// event, not a runtime probe.
#[derive(Debug, Clone)]
pub enum AttachmentContent {
    /// A pasted capture, already decoded in memory.
    Bitmap(DynamicImage),
    /// An uploaded file; the record's display name carries the extension the
    /// dispatch policy inspects.
    File { bytes: Vec<u8> },
    /// A raw, already-encoded image byte buffer.
    Bytes(Vec<u8>),
}

/// One user-supplied item queued under a placeholder key.
#[derive(Debug, Clone)]
pub struct AttachmentRecord {
    /// Display name, unique within the placeholder's queue.
    pub name: String,
    pub content: AttachmentContent,
}

impl AttachmentRecord {
    pub fn new(name: impl Into<String>, content: AttachmentContent) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

/// Explicitly-owned session state: ordered attachment queues per placeholder
/// plus the paste-capture counter.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    queues: BTreeMap<String, Vec<AttachmentRecord>>,
    paste_counter: u32,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a record under a placeholder, preserving attachment order.
    ///
    /// Rejects a record whose display name is already queued under the same
    /// placeholder; the normaliser assumes uniqueness-by-name was enforced
    /// before an item reaches it.
    pub fn attach(
        &mut self,
        key: impl Into<String>,
        record: AttachmentRecord,
    ) -> Result<(), ReportError> {
        let key = key.into();
        let queue = self.queues.entry(key.clone()).or_default();
        if queue.iter().any(|r| r.name == record.name) {
            return Err(ReportError::DuplicateAttachment {
                key,
                name: record.name,
            });
        }
        debug!(key = %key, name = %record.name, "attachment queued");
        queue.push(record);
        Ok(())
    }

    /// Queue a pasted capture, naming it from the session paste counter.
    ///
    /// Returns the generated display name. A `None` capture (the clipboard
    /// held no image) is not an error but is logged, never silently dropped.
    pub fn paste(&mut self, key: impl Into<String>, capture: Option<DynamicImage>) -> Option<String> {
        let key = key.into();
        let Some(image) = capture else {
            debug!(key = %key, "paste produced no image; ignoring capture");
            return None;
        };
        self.paste_counter += 1;
        let name = format!("captura-{}.png", self.paste_counter);
        // Counter-generated names cannot collide within a session.
        self.queues
            .entry(key)
            .or_default()
            .push(AttachmentRecord::new(&name, AttachmentContent::Bitmap(image)));
        Some(name)
    }

    /// Remove the record at `index` from a placeholder's queue.
    ///
    /// Returns the removed record, or `None` when the key or index does not
    /// exist (removing from an already-cleared slot is not an error).
    pub fn remove(&mut self, key: &str, index: usize) -> Option<AttachmentRecord> {
        let queue = self.queues.get_mut(key)?;
        if index >= queue.len() {
            return None;
        }
        Some(queue.remove(index))
    }

    /// Ordered records queued under a placeholder (empty when none).
    pub fn records(&self, key: &str) -> &[AttachmentRecord] {
        self.queues.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Placeholder keys with at least one queue entry (possibly emptied).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.queues.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<AttachmentRecord>> {
        self.queues.iter()
    }

    /// Total records across all placeholders.
    pub fn total_records(&self) -> usize {
        self.queues.values().map(Vec::len).sum()
    }
}
