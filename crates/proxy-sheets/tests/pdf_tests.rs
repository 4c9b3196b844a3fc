use image::{Rgb, RgbImage};
use lopdf::Document;
use proxy_sheets::*;
use std::path::{Path, PathBuf};

fn write_page(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(w, h, Rgb([30, 60, 90])).save(&path).unwrap();
    path
}

fn a4_points() -> (f32, f32) {
    SheetOptions::for_paper(PaperSize::A4).page_size_pt()
}

#[tokio::test]
async fn test_one_page_per_image() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![
        write_page(dir.path(), "Deck1.png", 62, 88),
        write_page(dir.path(), "Deck2.png", 62, 88),
    ];
    let output = dir.path().join("Deck_A4.pdf");

    let report = export_pdf(&pages, &output, a4_points(), None).await.unwrap();

    assert_eq!(
        report,
        PdfReport {
            image_pages: 2,
            skipped_pages: 0,
            text_pages: 0,
        }
    );
    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[tokio::test]
async fn test_corrupt_page_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let corrupt = dir.path().join("Deck2.png");
    std::fs::write(&corrupt, b"not a png").unwrap();
    let pages = vec![
        write_page(dir.path(), "Deck1.png", 40, 40),
        corrupt,
        dir.path().join("Deck3.png"),
        write_page(dir.path(), "Deck4.png", 40, 40),
    ];
    let output = dir.path().join("out.pdf");

    let report = export_pdf(&pages, &output, a4_points(), None).await.unwrap();

    assert_eq!(report.image_pages, 2);
    assert_eq!(report.skipped_pages, 2);
    assert_eq!(Document::load(&output).unwrap().get_pages().len(), 2);
}

#[tokio::test]
async fn test_manifest_pages_follow_images() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![write_page(dir.path(), "Deck1.png", 40, 60)];
    let output = dir.path().join("out.pdf");
    let manifest = "#DECK: Izzet\n4 Relâmpago [2xm] #Instant https://db.test/card/2xm/117/pt\n";

    let report = export_pdf(&pages, &output, a4_points(), Some(manifest)).await.unwrap();

    assert_eq!(report.image_pages, 1);
    assert_eq!(report.text_pages, 1);

    let doc = Document::load(&output).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 2);
    let text_page = pages[&2];
    let content = doc.get_page_content(text_page).unwrap();
    let content = String::from_utf8_lossy(&content);
    assert!(content.contains("#DECK: Izzet"), "{content}");
}

#[test]
fn test_image_is_fitted_and_centered() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![write_page(dir.path(), "wide.png", 200, 100)];

    let (doc, _) = build_pdf(&pages, (100.0, 100.0), None).unwrap();
    let page_id = doc.get_pages()[&1];
    let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();

    assert_eq!(content.trim(), "q 100 0 0 50 0 25 cm /Im0 Do Q");
}

#[tokio::test]
async fn test_no_readable_pages_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![dir.path().join("missing.png")];

    let result = export_pdf(&pages, dir.path().join("out.pdf"), a4_points(), None).await;

    assert!(matches!(result, Err(SheetError::NoPages)));
    assert!(!dir.path().join("out.pdf").exists());
}
