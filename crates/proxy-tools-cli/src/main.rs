mod config;
mod logger;
mod pipeline;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use config::PipelineConfig;
use log::LevelFilter;
use logger::ConsoleLogger;
use pipeline::RunOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "proxyt", about = "Print-and-play proxy sheets from a deck list", version)]
struct Cli {
    /// Deck list file
    #[arg(default_value = "card_names.txt")]
    deck: PathBuf,

    /// Output paper size
    #[arg(long, value_enum)]
    paper: Option<PaperArg>,

    /// Output orientation (defaults to the paper's usual orientation)
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Also add tokens and emblems the cards create
    #[arg(long, visible_alias = "download-tokens")]
    tokens: bool,

    /// Only resolve cards and write the card list
    #[arg(long)]
    list_only: bool,

    /// Keep basic lands from the deck list
    #[arg(long)]
    include_basic_lands: bool,

    /// Fill the last page with random cards
    #[arg(long)]
    fill_page: bool,

    /// Append the card list to the PDF
    #[arg(long)]
    append_card_list: bool,

    /// Directory of custom card images (<name>.png|.jpg|.jpeg)
    #[arg(long)]
    custom_dir: Option<PathBuf>,

    /// Preferred print language
    #[arg(long)]
    language: Option<String>,

    /// Upscale factor for card artwork (1 disables upscaling)
    #[arg(long)]
    upscale_factor: Option<u32>,

    /// External super-resolution executable
    #[arg(long)]
    upscaler_cmd: Option<PathBuf>,

    /// Render sheets at this resolution
    #[arg(long)]
    dpi: Option<u32>,

    /// Don't draw cut lines
    #[arg(long)]
    no_cut_lines: bool,

    /// Root directory for output bundles
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Cache directory for responses and images
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Load settings from a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings to this JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<PaperArg> for proxy_sheets::PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::A3,
            PaperArg::A4 => Self::A4,
            PaperArg::A5 => Self::A5,
            PaperArg::Letter => Self::Letter,
            PaperArg::Legal => Self::Legal,
            PaperArg::Tabloid => Self::Tabloid,
        }
    }
}

impl From<OrientationArg> for proxy_sheets::Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }

    /// Command-line flags win over the loaded config
    fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(paper) = self.paper {
            let paper: proxy_sheets::PaperSize = paper.into();
            config.sheet.paper_size = paper;
            config.sheet.orientation = paper.default_orientation();
        }
        if let Some(orientation) = self.orientation {
            config.sheet.orientation = orientation.into();
        }
        if let Some(dpi) = self.dpi {
            config.sheet.dpi = dpi;
        }
        if self.no_cut_lines {
            config.sheet.cut_lines.enabled = false;
        }
        if let Some(factor) = self.upscale_factor {
            config.normalizer.upscale_factor = factor;
        }
        if let Some(cmd) = &self.upscaler_cmd {
            config.normalizer.upscaler_command = Some(cmd.clone());
        }
        if let Some(dir) = &self.custom_dir {
            config.resolver.custom_images_dir = Some(dir.clone());
        }
        if let Some(language) = &self.language {
            config.resolver.language = language.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            deck_path: self.deck.clone(),
            find_tokens: self.tokens,
            list_only: self.list_only,
            include_basic_lands: self.include_basic_lands,
            fill_page: self.fill_page,
            append_card_list: self.append_card_list,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    ConsoleLogger::new(cli.log_level()).init()?;

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path).await?,
        None => PipelineConfig::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    if let Some(path) = &cli.save_config {
        config.save(path).await?;
        log::info!("Settings saved to {}", path.display());
    }

    let summary = pipeline::run(&config, &cli.run_options()).await?;
    print!("{summary}");

    Ok(())
}
