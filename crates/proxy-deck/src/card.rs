//! Card requests and the resolved card entity

use crate::names::sanitize_filename;
use std::path::PathBuf;

/// Border color used until the artwork has been sampled
pub const DEFAULT_BORDER_COLOR: [u8; 3] = [0, 0, 0];

/// One parsed deck-list entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRequest {
    pub raw_name: String,
    pub quantity: usize,
    /// Set code given in brackets, e.g. `[2XM]`
    pub requested_version: Option<String>,
}

impl CardRequest {
    pub fn new(raw_name: impl Into<String>, quantity: usize, version: Option<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            quantity,
            requested_version: version,
        }
    }
}

/// Where a card's artwork comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Image hosted by the card database (or another remote host)
    Remote(String),
    /// Image already on disk (custom artwork)
    Local(PathBuf),
}

impl ImageSource {
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        match self {
            ImageSource::Remote(url) => url.as_str().into(),
            ImageSource::Local(path) => path.to_string_lossy(),
        }
    }
}

/// Fields filled in once a card has been found in the database
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Printed name in the resolved language
    pub name: String,
    pub language: String,
    /// First word of the type line
    pub card_type: String,
    pub image: ImageSource,
    /// Set code of the resolved print
    pub version: Option<String>,
    pub collector_number: Option<String>,
    /// Image status reported by the database (`highres_scan`, `lowres`, ...)
    pub image_status: Option<String>,
    pub border_color: [u8; 3],
    /// Provenance link for the manifest
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardState {
    Unresolved,
    Resolved(Resolution),
}

/// One physical card to print, progressively filled by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Name as requested in the deck list
    pub requested_name: String,
    /// Derived once from `requested_name`; stable across re-resolution
    pub sanitized_name: String,
    pub quantity: usize,
    pub requested_version: Option<String>,
    pub state: CardState,
    /// Local artwork, set after download and repointed after normalization
    pub image_path: Option<PathBuf>,
}

impl Card {
    pub fn new(name: impl Into<String>, quantity: usize, version: Option<String>) -> Self {
        let requested_name = name.into();
        Self {
            sanitized_name: sanitize_filename(&requested_name),
            requested_name,
            quantity,
            requested_version: version,
            state: CardState::Unresolved,
            image_path: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, CardState::Resolved(_))
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        match &self.state {
            CardState::Resolved(resolution) => Some(resolution),
            CardState::Unresolved => None,
        }
    }

    pub fn resolution_mut(&mut self) -> Option<&mut Resolution> {
        match &mut self.state {
            CardState::Resolved(resolution) => Some(resolution),
            CardState::Unresolved => None,
        }
    }

    /// Display name: the printed name once resolved, the requested one before
    pub fn name(&self) -> &str {
        self.resolution()
            .map(|r| r.name.as_str())
            .unwrap_or(&self.requested_name)
    }

    /// Version shown in the manifest: resolved set code, else the requested one
    pub fn version(&self) -> Option<&str> {
        self.resolution()
            .and_then(|r| r.version.as_deref())
            .or(self.requested_version.as_deref())
    }

    /// Ready for layout: resolved and with artwork on disk
    pub fn is_printable(&self) -> bool {
        self.is_resolved() && self.image_path.is_some()
    }
}

impl From<CardRequest> for Card {
    fn from(request: CardRequest) -> Self {
        Card::new(request.raw_name, request.quantity, request.requested_version)
    }
}
