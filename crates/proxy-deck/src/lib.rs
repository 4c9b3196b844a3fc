//! Deck lists, card lookups and artwork download for print-and-play sheets.

mod cache;
mod card;
mod database;
mod download;
mod fetch;
mod filler;
mod manifest;
mod names;
mod parser;
mod resolver;
mod types;

pub use cache::{CACHE_FILE_NAME, CacheEntry, ResponseCache, ResponseStore, cache_key, request_url};
pub use card::{Card, CardRequest, CardState, DEFAULT_BORDER_COLOR, ImageSource, Resolution};
pub use database::{
    CARD_BACK_URL, CardDatabase, CardFace, CardRecord, DEFAULT_API_BASE, ImageUris, LinkedPart,
};
pub use download::{DownloadReport, download_images, image_file_name};
pub use fetch::{Fetcher, HttpResponse, ReqwestFetcher};
pub use filler::{cards_needed, fill_to_capacity};
pub use manifest::{MANIFEST_FILE_NAME, format_manifest, manifest_line, write_manifest};
pub use names::sanitize_filename;
pub use parser::{DeckList, ParseOptions, is_basic_land, parse_deck, parse_line};
pub use resolver::{CUSTOM_IMAGE_LANGUAGE, CardResolver, ResolverOptions, find_custom_image};
pub use types::*;
