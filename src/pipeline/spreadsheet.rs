//! Spreadsheet range extraction: `TRANSFERENCIAS!D3:E16` → a fixed 14×2 table.
//!
//! The transfer workbook is filled by hand every month but its shape is a
//! fixture: destination names in column D, counts in column E, rows 3–16.
//! Extraction therefore addresses cells absolutely instead of discovering
//! structure — months with fewer destinations produce blank rows, never a
//! shorter grid, so the rendered table always lines up with the template.
//!
//! The count column is normalised to whole-number form because spreadsheet
//! tooling stores hand-entered counts as floats: a cell showing `12` reads
//! back as `12.0`, and "12.0 transfers" in a signed report looks broken.

use crate::config::ReportConfig;
use crate::error::AttachmentError;
use crate::pipeline::grid;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::debug;

/// Fixed number of data rows in the transfer range (rows 3–16 inclusive).
pub const TRANSFER_ROWS: usize = 14;

/// First row of the range, 0-based (spreadsheet row 3).
const FIRST_ROW: u32 = 2;
/// Destination column, 0-based (spreadsheet column D).
const COL_DESTINATION: u32 = 3;
/// Count column, 0-based (spreadsheet column E).
const COL_COUNT: u32 = 4;

/// 2^63; whole floats at or beyond this magnitude do not fit an i64 and the
/// cast would saturate.
const I64_RANGE: f64 = 9_223_372_036_854_775_808.0;

/// Row-major 14×2 string table extracted from the fixed range.
///
/// The shape is invariant: absent or short input yields blank cells, never a
/// smaller table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTable {
    rows: [[String; 2]; TRANSFER_ROWS],
}

impl TransferTable {
    pub fn rows(&self) -> &[[String; 2]; TRANSFER_ROWS] {
        &self.rows
    }
}

/// Read the fixed transfer range out of an `.xlsx`/`.xls` byte buffer.
pub fn extract_table(
    name: &str,
    bytes: &[u8],
    sheet_name: &str,
) -> Result<TransferTable, AttachmentError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        AttachmentError::SpreadsheetRead {
            name: name.to_string(),
            detail: e.to_string(),
        }
    })?;

    if !workbook.sheet_names().iter().any(|s| s.as_str() == sheet_name) {
        return Err(AttachmentError::SheetMissing {
            name: name.to_string(),
            sheet: sheet_name.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| AttachmentError::SpreadsheetRead {
            name: name.to_string(),
            detail: e.to_string(),
        })?;

    let table = table_from_range(&range);
    debug!(name, sheet = sheet_name, "extracted transfer range");
    Ok(table)
}

/// Extract the transfer table and render it as one PNG grid image.
pub fn render_spreadsheet(
    name: &str,
    bytes: &[u8],
    config: &ReportConfig,
) -> Result<Vec<u8>, AttachmentError> {
    let table = extract_table(name, bytes, &config.sheet_name)?;
    grid::render_table(name, &table, config)
}

/// Build the fixed 14×2 table from a worksheet range.
///
/// Cells are addressed absolutely; anything outside the range's populated
/// area comes back as `None` and renders as an empty string.
pub fn table_from_range(range: &Range<Data>) -> TransferTable {
    let rows = std::array::from_fn(|i| {
        let row = FIRST_ROW + i as u32;
        [
            cell_text(range.get_value((row, COL_DESTINATION))),
            normalize_count(range.get_value((row, COL_COUNT))),
        ]
    });
    TransferTable { rows }
}

/// Raw display form of a destination cell.
fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) | Some(Data::Error(_)) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Whole-number normalisation for the count column.
///
/// Values convertible to a whole number render as an integer string
/// (`12.0` → `"12"`); anything else renders as its raw string form unchanged.
fn normalize_count(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) | Some(Data::Error(_)) => String::new(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Float(f)) if f.fract() == 0.0 && f.is_finite() && f.abs() < I64_RANGE => {
            (*f as i64).to_string()
        }
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.fract() == 0.0 && v.is_finite() && v.abs() < I64_RANGE => {
                (v as i64).to_string()
            }
            _ => s.clone(),
        },
        Some(other) => other.to_string(),
    }
}
