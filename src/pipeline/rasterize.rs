//! PDF rasterisation: render every page of an uploaded PDF to PNG bytes.
//!
//! ## Why a fixed upscale factor?
//!
//! Attached PDFs are almost always system exports at their native point size;
//! rendered 1:1 they come out at screen resolution and print fuzzy. A 2×
//! linear factor (4× pixel area) matches what the report actually needs —
//! legible print at the placeholder's physical width — without ballooning
//! memory on large page formats the way a fixed high DPI would.
//!
//! ## Why bind lazily and fall back?
//!
//! pdfium is a shared library resolved at runtime. Binding is attempted next
//! to the executable first (bundled deployments), then on the system library
//! path. A failed binding is reported as a per-attachment error so a missing
//! pdfium degrades PDF slots to empty rather than crashing the whole
//! generation.

use crate::error::AttachmentError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Rasterise every page of `bytes` at `scale`× linear, in document order.
///
/// Returns one PNG buffer per page. Any failure — binding, parsing, a single
/// page — fails the whole attachment; the caller treats that as a non-fatal
/// empty result.
pub fn rasterize_pdf(name: &str, bytes: &[u8], scale: f32) -> Result<Vec<Vec<u8>>, AttachmentError> {
    let pdfium = bind_pdfium().map_err(|e| AttachmentError::PdfiumUnavailable {
        name: name.to_string(),
        detail: format!("{e:?}"),
    })?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| AttachmentError::UnreadablePdf {
            name: name.to_string(),
            detail: format!("{e:?}"),
        })?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

    let pages = document.pages();
    let mut out = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| AttachmentError::PageRasterisation {
                    name: name.to_string(),
                    page: idx + 1,
                    detail: format!("{e:?}"),
                })?;

        let image = bitmap.as_image();
        debug!(
            name,
            page = idx + 1,
            width = image.width(),
            height = image.height(),
            "rasterised PDF page"
        );

        out.push(
            png_bytes(&image).map_err(|e| AttachmentError::ImageEncode {
                name: name.to_string(),
                detail: e.to_string(),
            })?,
        );
    }

    Ok(out)
}

/// Bind to a pdfium library: alongside the executable first, then system-wide.
fn bind_pdfium() -> Result<Pdfium, PdfiumError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
}

/// PNG-encode an in-memory image.
///
/// PNG over JPEG: lossless compression preserves the crispness of rendered
/// text and table rules, which is what evidence pages mostly contain.
pub(crate) fn png_bytes(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn png_bytes_roundtrip() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 128, 255, 255])));
        let buf = png_bytes(&img).expect("encode should succeed");
        assert_eq!(&buf[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&buf).expect("valid png");
        assert_eq!(decoded.width(), 8);
    }

    #[test]
    fn garbage_bytes_are_an_item_error() {
        // Whether pdfium is present (parse failure) or absent (binding
        // failure), a garbage buffer must come back as Err, never panic.
        let result = rasterize_pdf("junk.pdf", b"not a pdf at all", 2.0);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.attachment_name(), "junk.pdf");
    }
}
