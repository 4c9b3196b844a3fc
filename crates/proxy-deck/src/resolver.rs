//! Card resolution against the card database.
//!
//! A card is resolved in three steps: a fuzzy lookup (or a direct URI for
//! tokens) finds the canonical print, the print is re-fetched in the
//! preferred language, and the English print is used instead whenever the
//! localized one is missing or has no usable image. Failures leave the card
//! unresolved; they never stop the run.

use crate::cache::{CacheEntry, ResponseStore};
use crate::card::{Card, CardState, DEFAULT_BORDER_COLOR, ImageSource, Resolution};
use crate::database::{CARD_BACK_URL, CardDatabase, CardRecord, DEFAULT_API_BASE, LinkedPart};
use crate::types::{DeckError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Language code given to custom local artwork
pub const CUSTOM_IMAGE_LANGUAGE: &str = "nd";
const CUSTOM_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const CARD_BACK_NAME: &str = "mtg back";
const TOKEN_TYPE: &str = "Token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Preferred print language, e.g. `pt`
    pub language: String,
    /// Directory holding `<sanitized name>.png` overrides
    pub custom_images_dir: Option<PathBuf>,
    pub api_base: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            language: "pt".to_string(),
            custom_images_dir: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Find custom artwork for a card in `dir`
pub fn find_custom_image(dir: &Path, sanitized_name: &str) -> Option<PathBuf> {
    CUSTOM_IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{sanitized_name}.{ext}")))
        .find(|path| path.is_file())
}

/// A pending lookup in the resolution worklist
struct WorkItem {
    card: Card,
    find_tokens: bool,
    uri: Option<String>,
}

pub struct CardResolver<S> {
    db: CardDatabase<S>,
    options: ResolverOptions,
}

impl<S: ResponseStore> CardResolver<S> {
    pub fn new(db: CardDatabase<S>, options: ResolverOptions) -> Self {
        Self { db, options }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn database(&self) -> &CardDatabase<S> {
        &self.db
    }

    pub fn database_mut(&mut self) -> &mut CardDatabase<S> {
        &mut self.db
    }

    pub fn into_database(self) -> CardDatabase<S> {
        self.db
    }

    /// Resolve every card, appending tokens discovered along the way.
    ///
    /// Cards come back in request order, followed by tokens in the order they
    /// were found. Tokens are looked up by their direct URI and never expand
    /// further.
    pub fn resolve_all(&mut self, cards: Vec<Card>, find_tokens: bool) -> Vec<Card> {
        let mut queue: VecDeque<WorkItem> = cards
            .into_iter()
            .map(|card| WorkItem {
                card,
                find_tokens,
                uri: None,
            })
            .collect();
        let mut resolved = Vec::with_capacity(queue.len());

        while let Some(mut item) = queue.pop_front() {
            let parts = self.resolve_with_uri(&mut item.card, item.find_tokens, item.uri.as_deref());

            if !parts.is_empty() {
                log::info!("Queueing {} token(s) for {}", parts.len(), item.card.requested_name);
            }
            for part in parts {
                queue.push_back(WorkItem {
                    card: Card::new(part.name, 1, None),
                    find_tokens: false,
                    uri: Some(part.uri),
                });
            }

            resolved.push(item.card);
        }

        resolved
    }

    /// Resolve one card in place. Returns the printable linked parts when
    /// `find_tokens` is set.
    pub fn resolve(&mut self, card: &mut Card, find_tokens: bool) -> Vec<LinkedPart> {
        self.resolve_with_uri(card, find_tokens, None)
    }

    /// Like [`resolve`](Self::resolve), but the canonical print is fetched
    /// from `uri` instead of a fuzzy name search.
    pub fn resolve_with_uri(&mut self, card: &mut Card, find_tokens: bool, uri: Option<&str>) -> Vec<LinkedPart> {
        log::info!("Fetching card {}", card.requested_name);

        match self.lookup(card, uri) {
            Ok((resolution, parts)) => {
                if let Some(resolution) = resolution {
                    log::info!(
                        "Resolved {} -> {} [{}] ({}, {})",
                        card.requested_name,
                        resolution.name,
                        resolution.version.as_deref().unwrap_or("-"),
                        resolution.language,
                        resolution.card_type
                    );
                    card.state = CardState::Resolved(resolution);
                }
                if find_tokens { parts } else { Vec::new() }
            }
            Err(e) => {
                log::error!("Could not resolve {}: {}", card.requested_name, e);
                Vec::new()
            }
        }
    }

    /// The card's resolution, if any, and the printable parts linked from
    /// its canonical record. Parts are returned even when no print resolves.
    fn lookup(&mut self, card: &Card, uri: Option<&str>) -> Result<(Option<Resolution>, Vec<LinkedPart>)> {
        if card.requested_name.eq_ignore_ascii_case(CARD_BACK_NAME) {
            return Ok((Some(card_back_resolution()), Vec::new()));
        }

        if let Some(dir) = &self.options.custom_images_dir {
            if let Some(path) = find_custom_image(dir, &card.sanitized_name) {
                log::info!("Using custom image for {}: {}", card.requested_name, path.display());
                return Ok((Some(custom_resolution(card, path)), Vec::new()));
            }
        }

        let canonical = match uri {
            Some(uri) => self.db.by_uri(uri)?,
            None => self
                .db
                .named_fuzzy(&card.requested_name, card.requested_version.as_deref())?,
        };
        if !canonical.is_success() {
            log::error!(
                "Failed to fetch card details for {}: HTTP {}",
                card.requested_name,
                canonical.status_code
            );
            return Ok((None, Vec::new()));
        }

        let canonical = CardRecord::from_entry(&canonical)?;
        let parts: Vec<LinkedPart> = canonical
            .all_parts
            .iter()
            .filter(|part| part.is_printable_token())
            .cloned()
            .collect();

        let (Some(set), Some(number)) = (canonical.set.as_deref(), canonical.collector_number.as_deref()) else {
            log::error!("Record for {} has no set or collector number", card.requested_name);
            return Ok((None, parts));
        };

        let resolution = match self.resolve_print(&card.requested_name, set, number) {
            Ok(resolution) => resolution,
            Err(e) => {
                log::error!("Could not resolve print {set}/{number} for {}: {}", card.requested_name, e);
                None
            }
        };

        Ok((resolution, parts))
    }

    /// Resolve the localized print, falling back to the base print when the
    /// localized one is missing, malformed or has no usable image.
    fn resolve_print(&mut self, name: &str, set: &str, number: &str) -> Result<Option<Resolution>> {
        let language = self.options.language.clone();
        let localized = self.db.print(set, number, Some(&language))?;

        if localized.is_success() {
            match usable_resolution(&localized) {
                Ok(Some(resolution)) => return Ok(Some(resolution)),
                Ok(None) => log::warn!("No valid {language} image for {name}, falling back to EN"),
                Err(e) => log::warn!("Unusable {language} record for {name} ({e}), falling back to EN"),
            }
        } else {
            log::warn!("No {language} print of {name}, falling back to EN");
        }

        let entry = self.db.print(set, number, None)?;
        if !entry.is_success() {
            log::error!("Failed to fetch print {set}/{number} for {name}: HTTP {}", entry.status_code);
            return Ok(None);
        }
        let record = CardRecord::from_entry(&entry)?;
        extract_resolution(&record, &entry).map(Some)
    }
}

/// The resolution for `entry`, or `None` when its image is a placeholder,
/// missing or low resolution
fn usable_resolution(entry: &CacheEntry) -> Result<Option<Resolution>> {
    let record = CardRecord::from_entry(entry)?;
    if record.has_unusable_image() {
        return Ok(None);
    }
    extract_resolution(&record, entry).map(Some)
}

/// Fill resolved fields from a print record.
///
/// Multi-faced records are walked in order and the last face with artwork
/// wins.
fn extract_resolution(record: &CardRecord, entry: &CacheEntry) -> Result<Resolution> {
    let mut picked: Option<(String, String, String, String)> = None;

    if let Some(url) = record.image_uris.as_ref().and_then(|uris| uris.best()) {
        picked = Some((
            record.printed_name.clone().unwrap_or_else(|| record.name.clone()),
            record.lang.clone().unwrap_or_else(|| "en".to_string()),
            first_word(record.type_line.as_deref()),
            url.to_string(),
        ));
    } else {
        for face in &record.card_faces {
            let Some(url) = face.image_uris.as_ref().and_then(|uris| uris.best()) else {
                continue;
            };
            picked = Some((
                face.printed_name.clone().unwrap_or_else(|| face.name.clone()),
                face.lang.clone().unwrap_or_else(|| "en".to_string()),
                first_word(face.type_line.as_deref()),
                url.to_string(),
            ));
        }
    }

    let Some((name, language, card_type, image_url)) = picked else {
        return Err(DeckError::Lookup(format!("no image in record from {}", entry.url)));
    };

    Ok(Resolution {
        name,
        language,
        card_type,
        image: ImageSource::Remote(image_url),
        version: record.set.clone(),
        collector_number: record.collector_number.clone(),
        image_status: record.image_status.clone(),
        border_color: DEFAULT_BORDER_COLOR,
        source_url: record.scryfall_uri.clone().or_else(|| Some(entry.url.clone())),
    })
}

fn first_word(type_line: Option<&str>) -> String {
    type_line
        .and_then(|line| line.split(' ').next())
        .unwrap_or_default()
        .to_string()
}

fn card_back_resolution() -> Resolution {
    Resolution {
        name: "MTG Back".to_string(),
        language: "en".to_string(),
        card_type: TOKEN_TYPE.to_string(),
        image: ImageSource::Remote(CARD_BACK_URL.to_string()),
        version: None,
        collector_number: None,
        image_status: None,
        border_color: DEFAULT_BORDER_COLOR,
        source_url: None,
    }
}

fn custom_resolution(card: &Card, path: PathBuf) -> Resolution {
    Resolution {
        name: card.requested_name.clone(),
        language: CUSTOM_IMAGE_LANGUAGE.to_string(),
        card_type: TOKEN_TYPE.to_string(),
        source_url: Some(path.to_string_lossy().into_owned()),
        image: ImageSource::Local(path),
        version: card.requested_version.clone(),
        collector_number: None,
        image_status: None,
        border_color: DEFAULT_BORDER_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_word() {
        assert_eq!(first_word(Some("Legendary Creature — Elf")), "Legendary");
        assert_eq!(first_word(Some("Instant")), "Instant");
        assert_eq!(first_word(None), "");
    }

    #[test]
    fn test_find_custom_image() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_custom_image(dir.path(), "My_Token").is_none());

        std::fs::write(dir.path().join("My_Token.jpg"), b"jpg").unwrap();
        assert_eq!(
            find_custom_image(dir.path(), "My_Token"),
            Some(dir.path().join("My_Token.jpg"))
        );
    }
}
