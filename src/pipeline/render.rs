//! PDF emission: place resolved card images into the grid and produce the
//! document bytes.
//!
//! ## Why spawn_blocking?
//!
//! Decoding a few dozen JPEGs and serialising a multi-page PDF is CPU-bound.
//! `tokio::task::spawn_blocking` keeps that work off the async worker
//! threads, same as any other CPU-heavy stage.
//!
//! ## Skipped images
//!
//! The cache is shared between concurrent jobs and nothing pins a file
//! between resolution and layout. A file that vanished in that window is
//! skipped with a warning and does not claim a grid slot — the cursor only
//! advances for images that actually land on the sheet, so the grid never
//! shows a hole.

use crate::error::ProxyError;
use crate::pipeline::layout::{GridCursor, LayoutSlot, PAGE_HEIGHT, PAGE_WIDTH};
use crate::pipeline::resolve::image_path;
use printpdf::*;
use std::path::Path;
use tracing::{debug, warn};

/// A generated proxy document, not yet written to disk.
#[derive(Debug)]
pub struct RenderedDocument {
    /// Serialized PDF.
    pub bytes: Vec<u8>,
    /// Images actually placed (may be less than requested if cache files
    /// vanished since resolution).
    pub placed: usize,
    /// Page count.
    pub pages: usize,
    /// Identifiers skipped because their cache file vanished or was
    /// unreadable at render time.
    pub skipped: Vec<String>,
}

/// Render the placement sequence into a PDF.
///
/// `ids` is the decklist order restricted to resolved identifiers,
/// duplicates included — every occurrence is a distinct proxy on the sheet.
pub async fn render_document(
    ids: &[String],
    image_dir: &Path,
) -> Result<RenderedDocument, ProxyError> {
    let ids = ids.to_vec();
    let image_dir = image_dir.to_path_buf();

    tokio::task::spawn_blocking(move || render_document_bytes(&ids, &image_dir))
        .await
        .map_err(|e| ProxyError::Internal(format!("Render task panicked: {e}")))?
}

/// Blocking implementation of document rendering.
fn render_document_bytes(ids: &[String], image_dir: &Path) -> Result<RenderedDocument, ProxyError> {
    let mut doc = PdfDocument::new("Proxy sheet");
    let mut cursor = GridCursor::new();
    let mut page_ops: Vec<Vec<Op>> = Vec::new();
    let mut skipped = Vec::new();

    for id in ids {
        let path = image_path(image_dir, id);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                warn!("Skipping card {id}: cached image vanished ({e})");
                skipped.push(id.clone());
                continue;
            }
        };

        let mut warnings = Vec::new();
        let img = match RawImage::decode_from_bytes(&bytes, &mut warnings) {
            Ok(img) => img,
            Err(e) => {
                warn!("Skipping card {id}: cached image is unreadable ({e})");
                skipped.push(id.clone());
                continue;
            }
        };

        let image_ref = doc.add_image(&img);
        let slot = cursor.advance();
        while page_ops.len() <= slot.page {
            page_ops.push(Vec::new());
        }
        page_ops[slot.page].push(place_op(image_ref, &img, slot));
        debug!(
            "Placed card {id} at page {} ({}, {})",
            slot.page, slot.x, slot.y
        );
    }

    let placed = cursor.placed();
    let pages = cursor.page_count();

    doc.pages = page_ops
        .into_iter()
        .map(|ops| PdfPage {
            media_box: page_rect(),
            trim_box: page_rect(),
            crop_box: page_rect(),
            ops,
        })
        .collect();

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);

    Ok(RenderedDocument {
        bytes,
        placed,
        pages,
        skipped,
    })
}

fn page_rect() -> Rect {
    Rect {
        x: Pt(0.0),
        y: Pt(0.0),
        width: Pt(PAGE_WIDTH),
        height: Pt(PAGE_HEIGHT),
    }
}

/// Fit the image into its cell, aspect-preserving, anchored to the cell's
/// top-left corner.
///
/// The layout engine speaks top-left-origin coordinates; PDF content
/// streams are bottom-left-origin, so the vertical translation flips
/// against the drawn height. `dpi: 72` makes one image pixel equal one
/// point before scaling, which keeps the fit arithmetic exact.
fn place_op(image_ref: XObjectId, img: &RawImage, slot: LayoutSlot) -> Op {
    let (w_px, h_px) = (img.width as f32, img.height as f32);
    let scale = (slot.width / w_px).min(slot.height / h_px);
    let drawn_height = h_px * scale;

    Op::UseXobject {
        id: image_ref,
        transform: XObjectTransform {
            translate_x: Some(Pt(slot.x)),
            translate_y: Some(Pt(PAGE_HEIGHT - slot.y - drawn_height)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(72.0),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Seed the cache with a decodable image under the given identifier.
    fn seed_image(dir: &Path, id: &str, w: u32, h: u32) {
        let img = ::image::RgbImage::from_pixel(w, h, ::image::Rgb([120, 60, 200]));
        let mut buf = Vec::new();
        ::image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ::image::ImageFormat::Png)
            .unwrap();
        std::fs::write(image_path(dir, id), buf).unwrap();
    }

    #[tokio::test]
    async fn renders_a_single_page_document() {
        let dir = tempfile::tempdir().unwrap();
        for id in ["111", "222", "333"] {
            seed_image(dir.path(), id, 42, 61);
        }
        let ids: Vec<String> = ["111", "222", "333"].map(String::from).to_vec();

        let doc = render_document(&ids, dir.path()).await.unwrap();
        assert_eq!(doc.placed, 3);
        assert_eq!(doc.pages, 1);
        assert!(doc.bytes.starts_with(b"%PDF"), "output must be a PDF");
    }

    #[tokio::test]
    async fn ten_images_flow_onto_a_second_page() {
        let dir = tempfile::tempdir().unwrap();
        seed_image(dir.path(), "777", 42, 61);
        let ids: Vec<String> = vec!["777".to_string(); 10];

        let doc = render_document(&ids, dir.path()).await.unwrap();
        assert_eq!(doc.placed, 10);
        assert_eq!(doc.pages, 2);
    }

    #[tokio::test]
    async fn missing_cache_file_is_skipped_without_a_hole() {
        let dir = tempfile::tempdir().unwrap();
        seed_image(dir.path(), "111", 42, 61);
        seed_image(dir.path(), "333", 42, 61);
        let ids: Vec<String> = ["111", "222", "333"].map(String::from).to_vec();

        let doc = render_document(&ids, dir.path()).await.unwrap();
        assert_eq!(doc.placed, 2, "the vanished 222 must not claim a slot");
        assert_eq!(doc.pages, 1);
        assert_eq!(doc.skipped, vec!["222".to_string()]);
    }

    #[tokio::test]
    async fn empty_placement_produces_no_pages() {
        let dir = tempfile::tempdir().unwrap();
        let doc = render_document(&[], dir.path()).await.unwrap();
        assert_eq!(doc.placed, 0);
        assert_eq!(doc.pages, 0);
    }

    #[test]
    fn fit_is_aspect_preserving_and_top_anchored() {
        // A tall 1:2 image in a 167×244 cell is height-bound.
        let rgb = ::image::RgbImage::from_pixel(100, 200, ::image::Rgb([0, 0, 0]));
        let mut buf = Vec::new();
        ::image::DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut buf), ::image::ImageFormat::Png)
            .unwrap();
        let img = RawImage::decode_from_bytes(&buf, &mut Vec::new()).unwrap();
        let mut doc = PdfDocument::new("fit test");
        let image_ref = doc.add_image(&img);

        let slot = LayoutSlot {
            page: 0,
            x: 40.0,
            y: 40.0,
            width: 167.0,
            height: 244.0,
        };
        let Op::UseXobject { transform, .. } = place_op(image_ref, &img, slot) else {
            panic!("expected UseXobject")
        };
        let scale = transform.scale_x.unwrap();
        assert!((scale - 1.22).abs() < 1e-6);
        assert_eq!(transform.scale_x, transform.scale_y);
        // Drawn height 244 → the image spans the full cell, top at y=40.
        let ty = transform.translate_y.unwrap().0;
        assert!((ty - (842.0 - 40.0 - 244.0)).abs() < 1e-4);
    }
}
