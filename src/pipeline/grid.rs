//! Table-grid rendering: draw a [`TransferTable`] as a bordered PNG.
//!
//! The grid is drawn directly with `imageproc` primitives instead of going
//! through a plotting layer: the shape is a fixture (14×2, fixed column
//! widths), so a handful of filled rectangles and text runs is the whole job.
//! Geometry is specified in millimetres and converted at the configured DPI,
//! which keeps the rendered grid at a constant physical size regardless of
//! raster density.
//!
//! The page background outside the cells is transparent so the grid sits on
//! whatever fill the document template uses; cell interiors are opaque so the
//! bold text stays readable.

use crate::config::ReportConfig;
use crate::error::AttachmentError;
use crate::pipeline::rasterize::png_bytes;
use crate::pipeline::spreadsheet::{TransferTable, TRANSFER_ROWS};
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::PathBuf;
use tracing::debug;

// Physical cell geometry, millimetres.
const COL_MM: [f64; 2] = [70.0, 30.0];
const ROW_MM: f64 = 8.0;
const PAD_MM: f64 = 2.0;
const BORDER_MM: f64 = 0.3;
/// Transparent margin left around the table so the grid floats on the
/// document's own page fill.
const MARGIN_MM: f64 = 2.0;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
const CELL_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const HEADER_SHADE: Rgba<u8> = Rgba([222, 222, 222, 255]);
const BORDER: Rgba<u8> = Rgba([60, 60, 60, 255]);
const TEXT: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Bold fonts probed when no explicit font path is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Render the 14×2 transfer table as a PNG at the configured DPI.
pub fn render_table(
    name: &str,
    table: &TransferTable,
    config: &ReportConfig,
) -> Result<Vec<u8>, AttachmentError> {
    let font = load_font(config).map_err(|detail| AttachmentError::FontUnavailable {
        name: name.to_string(),
        detail,
    })?;

    let image = draw_grid(table, &font, config.grid_dpi);
    debug!(
        name,
        dpi = config.grid_dpi,
        width = image.width(),
        height = image.height(),
        "rendered transfer grid"
    );

    png_bytes(&DynamicImage::ImageRgba8(image)).map_err(|e| AttachmentError::GridRender {
        name: name.to_string(),
        detail: e.to_string(),
    })
}

/// Pixel dimensions of the rendered grid at a given DPI, margins included.
pub(crate) fn grid_pixel_size(dpi: u32) -> (u32, u32) {
    let ppm = dpi as f64 / 25.4;
    let border = border_px(dpi);
    let margin = mm_px(MARGIN_MM, ppm);
    let width: u32 = COL_MM.iter().map(|mm| mm_px(*mm, ppm)).sum::<u32>() + border + 2 * margin;
    let height = TRANSFER_ROWS as u32 * mm_px(ROW_MM, ppm) + border + 2 * margin;
    (width, height)
}

fn mm_px(mm: f64, ppm: f64) -> u32 {
    (mm * ppm).round() as u32
}

fn border_px(dpi: u32) -> u32 {
    mm_px(BORDER_MM, dpi as f64 / 25.4).max(1)
}

fn draw_grid(table: &TransferTable, font: &FontVec, dpi: u32) -> RgbaImage {
    let ppm = dpi as f64 / 25.4;
    let border = border_px(dpi);
    let margin = mm_px(MARGIN_MM, ppm);
    let col_px = [mm_px(COL_MM[0], ppm), mm_px(COL_MM[1], ppm)];
    let row_px = mm_px(ROW_MM, ppm);
    let pad = mm_px(PAD_MM, ppm) as i32;
    let (width, height) = grid_pixel_size(dpi);

    let mut image = RgbaImage::from_pixel(width, height, TRANSPARENT);

    // Fixed row/column scale: text fills half the row height.
    let scale = PxScale::from(row_px as f32 * 0.5);

    for (row_idx, row) in table.rows().iter().enumerate() {
        let y = margin + row_idx as u32 * row_px;
        let fill = if row_idx == 0 { HEADER_SHADE } else { CELL_FILL };

        let mut x = margin;
        for (col_idx, cell) in row.iter().enumerate() {
            let w = col_px[col_idx];
            draw_filled_rect_mut(
                &mut image,
                Rect::at(x as i32, y as i32).of_size(w + border, row_px + border),
                BORDER,
            );
            draw_filled_rect_mut(
                &mut image,
                Rect::at((x + border) as i32, (y + border) as i32)
                    .of_size(w - border, row_px - border),
                fill,
            );

            if !cell.is_empty() {
                let text_y = y as i32 + (row_px as f32 * 0.25) as i32;
                draw_text_mut(&mut image, TEXT, x as i32 + pad, text_y, scale, font, cell);
            }
            x += w;
        }
    }

    image
}

/// Load the grid font from the configured path or the platform candidates.
fn load_font(config: &ReportConfig) -> Result<FontVec, String> {
    let candidates: Vec<PathBuf> = match &config.font_path {
        Some(path) => vec![path.clone()],
        None => FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };

    let mut last_err = String::from("no font candidates configured");
    for path in &candidates {
        match std::fs::read(path) {
            Ok(data) => match FontVec::try_from_vec(data) {
                Ok(font) => {
                    debug!(path = %path.display(), "grid font loaded");
                    return Ok(font);
                }
                Err(e) => last_err = format!("{}: {e}", path.display()),
            },
            Err(e) => last_err = format!("{}: {e}", path.display()),
        }
    }
    Err(last_err)
}
