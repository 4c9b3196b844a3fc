//! Card database endpoints and record shapes.
//!
//! Every lookup except the random endpoint goes through the response store,
//! so repeated runs are served from the on-disk cache.

use crate::cache::{CacheEntry, ResponseStore};
use crate::types::{DeckError, Result};
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://api.scryfall.com";

/// Artwork used for the special `MTG Back` entry
pub const CARD_BACK_URL: &str = "https://static.wikia.nocookie.net/mtgsalvation_gamepedia/images/f/f8/Magic_card_back.jpg/revision/latest?cb=20140813141013";

/// Image statuses that do not give printable artwork
const UNUSABLE_IMAGE_STATUSES: &[&str] = &["placeholder", "missing", "lowres"];

/// Image links at the resolutions the database offers
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageUris {
    #[serde(default)]
    pub png: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
    #[serde(default)]
    pub normal: Option<String>,
}

impl ImageUris {
    /// Best available image: PNG, then large, then normal
    pub fn best(&self) -> Option<&str> {
        self.png
            .as_deref()
            .or(self.large.as_deref())
            .or(self.normal.as_deref())
    }
}

/// One face of a multi-faced card
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardFace {
    pub name: String,
    #[serde(default)]
    pub printed_name: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub type_line: Option<String>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

/// A related card (token, emblem, meld part, ...)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkedPart {
    pub component: String,
    pub name: String,
    #[serde(default)]
    pub type_line: String,
    pub uri: String,
}

impl LinkedPart {
    /// Tokens, and emblems listed as combo pieces, are printed alongside
    /// the card that creates them.
    pub fn is_printable_token(&self) -> bool {
        self.component == "token" || (self.component == "combo_piece" && self.type_line == "Emblem")
    }
}

/// The subset of a card record the pipeline reads
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardRecord {
    pub name: String,
    #[serde(default)]
    pub printed_name: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub type_line: Option<String>,
    #[serde(default)]
    pub set: Option<String>,
    #[serde(default)]
    pub collector_number: Option<String>,
    #[serde(default)]
    pub image_status: Option<String>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    #[serde(default)]
    pub card_faces: Vec<CardFace>,
    #[serde(default)]
    pub all_parts: Vec<LinkedPart>,
    #[serde(default)]
    pub scryfall_uri: Option<String>,
}

impl CardRecord {
    pub fn from_entry(entry: &CacheEntry) -> Result<Self> {
        serde_json::from_value(entry.content.clone())
            .map_err(|e| DeckError::Lookup(format!("unexpected record shape from {}: {e}", entry.url)))
    }

    /// Whether the localized image is unusable and the base print is needed
    pub fn has_unusable_image(&self) -> bool {
        self.image_status
            .as_deref()
            .is_some_and(|status| UNUSABLE_IMAGE_STATUSES.contains(&status))
    }
}

/// Typed access to the card database endpoints
pub struct CardDatabase<S> {
    store: S,
    base_url: String,
}

impl<S: ResponseStore> CardDatabase<S> {
    pub fn new(store: S, base_url: impl Into<String>) -> Self {
        Self {
            store,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fuzzy name lookup, optionally restricted to one set
    pub fn named_fuzzy(&mut self, name: &str, set: Option<&str>) -> Result<CacheEntry> {
        let url = format!("{}/cards/named", self.base_url);
        match set {
            Some(set) => self.store.get(&url, &[("fuzzy", name), ("set", set)]),
            None => self.store.get(&url, &[("fuzzy", name)]),
        }
    }

    /// A specific print by set code and collector number, optionally localized
    pub fn print(&mut self, set: &str, collector_number: &str, lang: Option<&str>) -> Result<CacheEntry> {
        let url = match lang {
            Some(lang) => format!("{}/cards/{}/{}/{}", self.base_url, set, collector_number, lang),
            None => format!("{}/cards/{}/{}", self.base_url, set, collector_number),
        };
        self.store.get(&url, &[])
    }

    /// Direct lookup through a URI taken from a record
    pub fn by_uri(&mut self, uri: &str) -> Result<CacheEntry> {
        self.store.get(uri, &[])
    }

    /// Name of a random card. Never cached.
    pub fn random_name(&mut self) -> Result<Option<String>> {
        let url = format!("{}/cards/random", self.base_url);
        let response = self.store.get_uncached(&url)?;
        if !response.is_success() {
            log::warn!("Random card lookup failed: HTTP {}", response.status);
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_slice(&response.body)?;
        Ok(value.get("name").and_then(|n| n.as_str()).map(str::to_string))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
