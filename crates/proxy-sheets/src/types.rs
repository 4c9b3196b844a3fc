use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Upscaler failed on {path}: {reason}")]
    Upscale { path: PathBuf, reason: String },
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("No pages to export")]
    NoPages,
}

pub type Result<T> = std::result::Result<T, SheetError>;

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Portrait: height > width
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Get base dimensions (always portrait: width < height for standard sizes)
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Tabloid => (279.4, 431.8),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// Get dimensions with orientation applied
    pub fn dimensions_with_orientation(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// Orientation that packs the most cards on the sheet: A3 is printed
    /// landscape, everything else portrait.
    pub fn default_orientation(self) -> Orientation {
        match self {
            PaperSize::A3 => Orientation::Landscape,
            _ => Orientation::Portrait,
        }
    }

    /// Short name used in output file names, e.g. `A4`
    pub fn label(self) -> String {
        match self {
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => format!("{width_mm}x{height_mm}mm"),
            other => format!("{other:?}"),
        }
    }
}

impl std::str::FromStr for PaperSize {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "a3" => Ok(PaperSize::A3),
            "a4" => Ok(PaperSize::A4),
            "a5" => Ok(PaperSize::A5),
            "letter" => Ok(PaperSize::Letter),
            "legal" => Ok(PaperSize::Legal),
            "tabloid" => Ok(PaperSize::Tabloid),
            other => {
                let parsed = other.split_once('x').and_then(|(w, h)| {
                    let w = w.trim().parse::<f32>().ok()?;
                    let h = h.trim().trim_end_matches("mm").parse::<f32>().ok()?;
                    Some((w, h))
                });
                match parsed {
                    Some((width_mm, height_mm)) => Ok(PaperSize::Custom {
                        width_mm,
                        height_mm,
                    }),
                    None => Err(SheetError::Config(format!("Unknown paper size: {s}"))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a3_prints_landscape() {
        assert_eq!(PaperSize::A3.default_orientation(), Orientation::Landscape);
        assert_eq!(PaperSize::A4.default_orientation(), Orientation::Portrait);
        assert_eq!(
            PaperSize::A3.dimensions_with_orientation(Orientation::Landscape),
            (420.0, 297.0)
        );
    }

    #[test]
    fn test_parse_paper_size() {
        assert_eq!("a4".parse::<PaperSize>().unwrap(), PaperSize::A4);
        assert_eq!("Letter".parse::<PaperSize>().unwrap(), PaperSize::Letter);
        assert_eq!(
            "100x150mm".parse::<PaperSize>().unwrap(),
            PaperSize::Custom {
                width_mm: 100.0,
                height_mm: 150.0
            }
        );
        assert!("B5".parse::<PaperSize>().is_err());
    }

    #[test]
    fn test_label() {
        assert_eq!(PaperSize::A3.label(), "A3");
        assert_eq!(
            PaperSize::Custom {
                width_mm: 100.0,
                height_mm: 150.0
            }
            .label(),
            "100x150mm"
        );
    }
}
