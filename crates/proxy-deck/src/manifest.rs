use crate::card::Card;
use crate::types::Result;
use std::fmt::Write as _;
use std::path::Path;

/// Default manifest file name inside the output bundle
pub const MANIFEST_FILE_NAME: &str = "printed_card_list_with_tokens.txt";

const UNRESOLVED_TYPE: &str = "Unresolved";

/// One manifest line: `quantity name [version] #type source_url`
pub fn manifest_line(card: &Card) -> String {
    let mut line = format!("{} {}", card.quantity, card.name());
    if let Some(version) = card.version() {
        let _ = write!(line, " [{version}]");
    }

    match card.resolution() {
        Some(resolution) => {
            let _ = write!(line, " #{}", resolution.card_type);
            if let Some(url) = &resolution.source_url {
                let _ = write!(line, " {url}");
            }
        }
        None => {
            let _ = write!(line, " #{UNRESOLVED_TYPE}");
        }
    }

    line
}

/// Render the whole manifest, headed by the deck name
pub fn format_manifest(cards: &[Card], deck_name: &str) -> String {
    let mut out = format!("#DECK: {deck_name}\n");
    for card in cards {
        out.push_str(&manifest_line(card));
        out.push('\n');
    }
    out
}

pub fn write_manifest(cards: &[Card], deck_name: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, format_manifest(cards, deck_name))?;
    log::info!("Card list saved to {}", path.display());
    Ok(())
}
