//! Pipeline stages for attachment normalisation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the PDF rendering backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! session ──▶ normalize ──▶ rasterize / spreadsheet ──▶ grid ──▶ images
//! (records)   (dispatch)    (pdfium)    (calamine)     (draw)   (per key)
//!
//! fields ───▶ scalars ─────────────────────────────────────────▶ context
//! ```
//!
//! 1. [`normalize`]   — per-record kind dispatch; catches every item failure
//!    so one bad attachment never aborts the rest of the run
//! 2. [`rasterize`]   — render each PDF page to a PNG at a fixed linear
//!    upscale via pdfium
//! 3. [`spreadsheet`] — extract the fixed transfer-table range into a 14×2
//!    string table and normalise the numeric column
//! 4. [`grid`]        — draw the table as a bordered, shaded, bold-text grid
//!    and rasterise it onto a transparent background
//! 5. [`scalars`]     — derived scalar fields (transfer rate, doctor total,
//!    destination list)

pub mod grid;
pub mod normalize;
pub mod rasterize;
pub mod scalars;
pub mod spreadsheet;
