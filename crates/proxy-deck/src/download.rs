//! Artwork download

use crate::card::{Card, ImageSource};
use crate::fetch::Fetcher;
use crate::names::sanitize_filename;
use crate::types::{DeckError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome counts for a download pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub reused: usize,
    pub failed: usize,
    pub skipped_unresolved: usize,
}

/// Local file name for a card's artwork.
///
/// Built from the sanitized requested name so it stays the same however the
/// printed name changes between runs. Set, collector number and language
/// tell same-named prints apart.
pub fn image_file_name(card: &Card) -> Option<String> {
    let resolution = card.resolution()?;
    let version = resolution.version.as_deref().unwrap_or("");
    let key = match resolution.collector_number.as_deref() {
        Some(number) => format!("{}[{}][{}][{}]", card.sanitized_name, version, number, resolution.language),
        None => format!("{}[{}][{}]", card.sanitized_name, version, resolution.language),
    };
    Some(format!("{}.png", sanitize_filename(&key)))
}

/// Download artwork for every resolved card into `images_dir`.
///
/// Existing files are reused. A failed download leaves the card without an
/// image path and the pass carries on.
pub fn download_images<F: Fetcher>(fetcher: &F, cards: &mut [Card], images_dir: &Path) -> Result<DownloadReport> {
    fs::create_dir_all(images_dir)?;
    let mut report = DownloadReport::default();

    for card in cards.iter_mut() {
        let Some(resolution) = card.resolution() else {
            log::warn!("Skipping download for unresolved card {}", card.requested_name);
            report.skipped_unresolved += 1;
            continue;
        };

        let url = match &resolution.image {
            ImageSource::Local(path) => {
                card.image_path = Some(path.clone());
                report.reused += 1;
                continue;
            }
            ImageSource::Remote(url) => url.clone(),
        };

        let Some(file_name) = image_file_name(card) else {
            continue;
        };
        let target = images_dir.join(file_name);

        if target.exists() {
            log::info!("Image already exists: {}", card.name());
            card.image_path = Some(target);
            report.reused += 1;
            continue;
        }

        match download_file(fetcher, &url, &target) {
            Ok(()) => {
                log::info!("Downloaded: {} | {}", card.name(), target.display());
                card.image_path = Some(target);
                report.downloaded += 1;
            }
            Err(e) => {
                log::error!("Failed to download image for {}: {}", card.name(), e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Fetch `url` into `dest` through a `.part` file renamed on success
fn download_file<F: Fetcher>(fetcher: &F, url: &str, dest: &Path) -> Result<()> {
    let response = fetcher.get(url)?;
    if !response.is_success() {
        return Err(DeckError::Download {
            url: url.to_string(),
            status: response.status,
        });
    }

    let tmp: PathBuf = dest.with_extension("part");
    let result = fs::write(&tmp, &response.body).and_then(|()| fs::rename(&tmp, dest));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    Ok(result?)
}
