//! The sequential print-and-play run.
//!
//! parse -> resolve (+ tokens, + filler) -> download -> normalize -> manifest
//! -> collages -> PDF. The card stages use blocking HTTP and run on the
//! blocking pool; layout and export use the async APIs of `proxy_sheets`.

use crate::config::PipelineConfig;
use anyhow::{Context, Result};
use proxy_deck::{
    Card, CardDatabase, CardResolver, DownloadReport, Fetcher, ParseOptions, ReqwestFetcher, ResponseCache,
    download_images, fill_to_capacity, format_manifest, parse_deck, sanitize_filename,
};
use proxy_sheets::{LayoutItem, Upscaler, expand_slots, export_pdf, normalize_image, render_collages, upscaler_for};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-run switches from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub deck_path: PathBuf,
    pub find_tokens: bool,
    /// Only resolve cards and write the manifest
    pub list_only: bool,
    pub include_basic_lands: bool,
    /// Top up the last page with random cards
    pub fill_page: bool,
    /// Append the manifest to the PDF as text pages
    pub append_card_list: bool,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub bundle_dir: PathBuf,
    pub requested: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub filler_added: usize,
    pub network_requests: usize,
    pub downloads: DownloadReport,
    pub normalize_failures: usize,
    pub slots: usize,
    pub skipped_slots: usize,
    pub pages: Vec<PathBuf>,
    pub pdf: Option<PathBuf>,
    pub pdf_pages_skipped: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run summary ({}):", self.bundle_dir.display())?;
        writeln!(f, "  Cards requested: {}", self.requested)?;
        writeln!(f, "  Resolved: {} (unresolved: {})", self.resolved, self.unresolved)?;
        if self.filler_added > 0 {
            writeln!(f, "  Random filler cards: {}", self.filler_added)?;
        }
        writeln!(f, "  Network requests: {}", self.network_requests)?;
        writeln!(
            f,
            "  Images downloaded: {} (reused: {}, failed: {})",
            self.downloads.downloaded, self.downloads.reused, self.downloads.failed
        )?;
        if self.normalize_failures > 0 {
            writeln!(f, "  Images that failed to normalize: {}", self.normalize_failures)?;
        }
        writeln!(f, "  Slots laid out: {} (skipped: {})", self.slots, self.skipped_slots)?;
        writeln!(f, "  Pages written: {}", self.pages.len())?;
        if let Some(pdf) = &self.pdf {
            writeln!(f, "  PDF: {} (pages skipped: {})", pdf.display(), self.pdf_pages_skipped)?;
        }
        Ok(())
    }
}

/// Bundle name: the deck's `#DECK:` name made file-safe, else a timestamp
pub fn bundle_name(deck_name: Option<&str>) -> String {
    match deck_name {
        Some(name) if !name.is_empty() => sanitize_filename(name),
        _ => chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
    }
}

/// Run the whole pipeline against the live card database
pub async fn run(config: &PipelineConfig, options: &RunOptions) -> Result<RunSummary> {
    let timeout = Duration::from_secs(config.http_timeout_secs);
    run_with_fetcher(config, options, move || ReqwestFetcher::new(timeout)).await
}

/// Run the pipeline with a caller-supplied HTTP fetcher.
///
/// The fetcher is built and dropped on the blocking pool.
pub async fn run_with_fetcher<F, M>(config: &PipelineConfig, options: &RunOptions, make_fetcher: M) -> Result<RunSummary>
where
    F: Fetcher,
    M: FnOnce() -> proxy_deck::Result<F> + Send + 'static,
{
    config.validate()?;
    let geometry = config.sheet.geometry()?;

    let text = tokio::fs::read_to_string(&options.deck_path)
        .await
        .with_context(|| format!("Failed to read deck list {}", options.deck_path.display()))?;
    let deck = parse_deck(
        &text,
        &ParseOptions {
            include_basic_lands: options.include_basic_lands,
        },
    );
    log::info!(
        "Parsed {} card line(s), {} card(s) in total",
        deck.requests.len(),
        deck.total_quantity()
    );

    let bundle = bundle_name(deck.name.as_deref());
    let deck_name = deck.name.clone().unwrap_or_else(|| bundle.clone());
    let bundle_dir = config.output_dir.join(&bundle);
    tokio::fs::create_dir_all(&bundle_dir).await?;

    let mut summary = RunSummary {
        bundle_dir: bundle_dir.clone(),
        requested: deck.requests.len(),
        ..Default::default()
    };

    let stage = CardStage {
        cards: deck.requests.into_iter().map(Card::from).collect(),
        config: config.clone(),
        find_tokens: options.find_tokens || options.list_only,
        fill_to: (options.fill_page && !options.list_only).then(|| geometry.cards_per_page()),
        prepare_images: !options.list_only,
    };
    let upscaler = upscaler_for(&config.normalizer);
    let outcome = tokio::task::spawn_blocking(move || -> Result<CardStageOutcome> {
        stage.run(make_fetcher()?, &*upscaler)
    })
    .await??;

    let cards = outcome.cards;
    summary.resolved = cards.iter().filter(|c| c.is_resolved()).count();
    summary.unresolved = cards.len() - summary.resolved;
    summary.filler_added = outcome.filler_added;
    summary.network_requests = outcome.network_requests;
    summary.downloads = outcome.downloads;
    summary.normalize_failures = outcome.normalize_failures;

    let manifest = format_manifest(&cards, &deck_name);
    let manifest_path = bundle_dir.join(proxy_deck::MANIFEST_FILE_NAME);
    tokio::fs::write(&manifest_path, &manifest).await?;
    log::info!("Card list saved to {}", manifest_path.display());

    if options.list_only {
        return Ok(summary);
    }

    let items: Vec<LayoutItem> = cards
        .iter()
        .filter(|card| card.is_printable())
        .filter_map(|card| {
            Some(LayoutItem {
                image: card.image_path.clone()?,
                quantity: card.quantity,
                label: card.name().to_string(),
            })
        })
        .collect();
    let slots = expand_slots(&items);
    if slots.is_empty() {
        log::warn!("No printable cards, skipping collages and PDF");
        return Ok(summary);
    }

    let collages = render_collages(&slots, &config.sheet, &bundle_dir, &bundle).await?;
    summary.slots = collages.slots;
    summary.skipped_slots = collages.skipped_slots;
    summary.pages = collages.pages;

    let pdf_path = bundle_dir.join(format!("{}_{}.pdf", bundle, config.sheet.paper_size.label()));
    let report = export_pdf(
        &summary.pages,
        &pdf_path,
        config.sheet.page_size_pt(),
        options.append_card_list.then_some(manifest.as_str()),
    )
    .await?;
    summary.pdf_pages_skipped = report.skipped_pages;
    summary.pdf = Some(pdf_path);

    Ok(summary)
}

/// Everything that needs blocking HTTP or heavy image work, in order
struct CardStage {
    cards: Vec<Card>,
    config: PipelineConfig,
    find_tokens: bool,
    /// Page capacity to fill up to, when filling
    fill_to: Option<usize>,
    prepare_images: bool,
}

struct CardStageOutcome {
    cards: Vec<Card>,
    filler_added: usize,
    network_requests: usize,
    downloads: DownloadReport,
    normalize_failures: usize,
}

impl CardStage {
    fn run<F: Fetcher>(self, fetcher: F, upscaler: &dyn Upscaler) -> Result<CardStageOutcome> {
        let cache = ResponseCache::open_in_dir(&self.config.cache_dir, fetcher)?;
        log::info!("Loaded {} cached response(s) from {}", cache.len(), cache.path().display());

        let database = CardDatabase::new(cache, &self.config.resolver.api_base);
        let mut resolver = CardResolver::new(database, self.config.resolver.clone());

        let mut cards = resolver.resolve_all(self.cards, self.find_tokens);
        let filler_added = match self.fill_to {
            Some(cards_per_page) => fill_to_capacity(&mut resolver, &mut cards, cards_per_page),
            None => 0,
        };

        let cache = resolver.into_database().into_store();
        let mut outcome = CardStageOutcome {
            cards,
            filler_added,
            network_requests: cache.network_requests(),
            downloads: DownloadReport::default(),
            normalize_failures: 0,
        };
        if !self.prepare_images {
            return Ok(outcome);
        }

        outcome.downloads = download_images(cache.fetcher(), &mut outcome.cards, &self.config.images_dir())?;
        outcome.normalize_failures = normalize_cards(
            &mut outcome.cards,
            &self.config.normalized_dir(),
            &self.config,
            upscaler,
        );
        Ok(outcome)
    }
}

/// Normalize every downloaded image, repointing each card at the result.
/// Returns the number of failures; failed cards lose their image.
fn normalize_cards(cards: &mut [Card], out_dir: &Path, config: &PipelineConfig, upscaler: &dyn Upscaler) -> usize {
    let mut failures = 0;

    for card in cards.iter_mut() {
        let Some(source) = card.image_path.clone() else {
            continue;
        };

        match normalize_image(&source, out_dir, &config.normalizer, upscaler) {
            Ok(normalized) => {
                if let (Some(color), Some(resolution)) = (normalized.border_color, card.resolution_mut()) {
                    resolution.border_color = color;
                }
                card.image_path = Some(normalized.path);
            }
            Err(e) => {
                log::error!("Failed to normalize image for {}: {}", card.name(), e);
                card.image_path = None;
                failures += 1;
            }
        }
    }

    failures
}
