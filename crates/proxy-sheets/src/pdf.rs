//! PDF export of collage pages.
//!
//! Each collage becomes one page holding a single image XObject, scaled to
//! fit the page box and centered. An optional card list is appended as
//! plain Helvetica text pages.

use crate::constants::{MANIFEST_FONT_SIZE, MANIFEST_LEADING, MANIFEST_MARGIN};
use crate::normalize::load_image;
use crate::types::*;
use image::RgbImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::{Path, PathBuf};

/// Outcome of an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdfReport {
    pub image_pages: usize,
    pub skipped_pages: usize,
    pub text_pages: usize,
}

/// Export `pages` (in order) to a PDF at `output_path`
pub async fn export_pdf(
    pages: &[PathBuf],
    output_path: impl AsRef<Path>,
    page_size_pt: (f32, f32),
    manifest: Option<&str>,
) -> Result<PdfReport> {
    let pages = pages.to_vec();
    let manifest = manifest.map(str::to_owned);
    let output_path = output_path.as_ref().to_owned();

    // Decoding and compressing page images is CPU-bound
    let (bytes, report) = tokio::task::spawn_blocking(move || {
        let (mut doc, report) = build_pdf(&pages, page_size_pt, manifest.as_deref())?;
        let mut writer = Vec::new();
        doc.save_to(&mut writer)?;
        Ok::<_, SheetError>((writer, report))
    })
    .await??;

    tokio::fs::write(&output_path, bytes).await?;
    log::info!(
        "PDF created: {} ({} page(s))",
        output_path.display(),
        report.image_pages + report.text_pages
    );

    Ok(report)
}

/// Build the document in memory. Pages whose image cannot be read are
/// logged and left out.
pub fn build_pdf(pages: &[PathBuf], page_size_pt: (f32, f32), manifest: Option<&str>) -> Result<(Document, PdfReport)> {
    let (page_w, page_h) = page_size_pt;
    let mut doc = Document::with_version("1.5");
    let pages_tree_id = doc.new_object_id();
    let mut page_refs = Vec::new();
    let mut report = PdfReport::default();

    for path in pages {
        match add_image_page(&mut doc, pages_tree_id, path, page_w, page_h) {
            Ok(page_id) => {
                page_refs.push(Object::Reference(page_id));
                report.image_pages += 1;
            }
            Err(e) => {
                log::error!("Error processing image {}: {}", path.display(), e);
                report.skipped_pages += 1;
            }
        }
    }

    if let Some(text) = manifest {
        let font_id = doc.add_object(helvetica());
        for chunk in text.lines().collect::<Vec<_>>().chunks(lines_per_page(page_h)) {
            let page_id = add_text_page(&mut doc, pages_tree_id, font_id, chunk, page_w, page_h);
            page_refs.push(Object::Reference(page_id));
            report.text_pages += 1;
        }
    }

    if page_refs.is_empty() {
        return Err(SheetError::NoPages);
    }

    // Create pages tree
    let count = page_refs.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(page_refs)),
        ("Count", Object::Integer(count)),
    ]);
    doc.objects.insert(pages_tree_id, Object::Dictionary(pages_dict));

    // Create catalog
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_tree_id)),
    ]));
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    Ok((doc, report))
}

/// Scale that fits `image` inside `page` without distortion, and the
/// offset that centers it
pub fn fit_centered(image: (f32, f32), page: (f32, f32)) -> (f32, f32, f32) {
    let scale = (page.0 / image.0).min(page.1 / image.1);
    let x = (page.0 - image.0 * scale) / 2.0;
    let y = (page.1 - image.1 * scale) / 2.0;
    (scale, x, y)
}

fn page_dict(parent: ObjectId, page_w: f32, page_h: f32) -> Dictionary {
    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(parent));
    page.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page_w),
            Object::Real(page_h),
        ]),
    );
    page
}

fn add_image_page(doc: &mut Document, parent: ObjectId, path: &Path, page_w: f32, page_h: f32) -> Result<ObjectId> {
    let image = load_image(path)?.into_rgb8();
    let (img_w, img_h) = image.dimensions();
    if img_w == 0 || img_h == 0 {
        return Err(SheetError::Config(format!("Empty image: {}", path.display())));
    }

    let image_id = doc.add_object(image_xobject(image)?);

    let (scale, x, y) = fit_centered((img_w as f32, img_h as f32), (page_w, page_h));
    let content = format!(
        "q {} 0 0 {} {} {} cm /Im0 Do Q\n",
        img_w as f32 * scale,
        img_h as f32 * scale,
        x,
        y
    );
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let mut page = page_dict(parent, page_w, page_h);
    page.set("Contents", Object::Reference(content_id));
    page.set("Resources", Object::Dictionary(resources));

    Ok(doc.add_object(page))
}

/// Image XObject for `image`, deflated before it joins the document
fn image_xobject(image: RgbImage) -> Result<Stream> {
    let (img_w, img_h) = image.dimensions();
    let mut xobject = Dictionary::new();
    xobject.set("Type", Object::Name(b"XObject".to_vec()));
    xobject.set("Subtype", Object::Name(b"Image".to_vec()));
    xobject.set("Width", Object::Integer(i64::from(img_w)));
    xobject.set("Height", Object::Integer(i64::from(img_h)));
    xobject.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    xobject.set("BitsPerComponent", Object::Integer(8));

    let mut stream = Stream::new(xobject, image.into_raw());
    stream.compress()?;
    Ok(stream)
}

fn helvetica() -> Dictionary {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    font
}

fn lines_per_page(page_h: f32) -> usize {
    (((page_h - 2.0 * MANIFEST_MARGIN) / MANIFEST_LEADING).floor() as usize).max(1)
}

fn add_text_page(
    doc: &mut Document,
    parent: ObjectId,
    font_id: ObjectId,
    lines: &[&str],
    page_w: f32,
    page_h: f32,
) -> ObjectId {
    let mut content = format!(
        "BT /F1 {} Tf {} TL {} {} Td\n",
        MANIFEST_FONT_SIZE,
        MANIFEST_LEADING,
        MANIFEST_MARGIN,
        page_h - MANIFEST_MARGIN
    )
    .into_bytes();
    for line in lines {
        content.push(b'(');
        content.extend(encode_text(line));
        content.extend_from_slice(b") Tj T*\n");
    }
    content.extend_from_slice(b"ET\n");
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut page = page_dict(parent, page_w, page_h);
    page.set("Contents", Object::Reference(content_id));
    page.set("Resources", Object::Dictionary(resources));
    doc.add_object(page)
}

/// WinAnsi byte for `ch`, if the encoding has one
fn win_ansi_byte(ch: char) -> Option<u8> {
    match ch {
        '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => u8::try_from(u32::from(ch)).ok(),
        '€' => Some(0x80),
        '‚' => Some(0x82),
        '„' => Some(0x84),
        '…' => Some(0x85),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '™' => Some(0x99),
        _ => None,
    }
}

/// WinAnsi bytes for a PDF string literal. Characters the encoding lacks
/// become `?`; delimiters are escaped.
fn encode_text(line: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    for ch in line.chars() {
        let byte = win_ansi_byte(ch).unwrap_or(b'?');
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out
}
