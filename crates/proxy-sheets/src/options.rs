use crate::constants::*;
use crate::layout::GridGeometry;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cut-line overlay style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutLineStyle {
    pub enabled: bool,
    pub color: [u8; 3],
    pub width_px: u32,
    /// Distance the lines run past the card grid
    pub overhang_px: u32,
}

impl Default for CutLineStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            color: CUT_LINE_COLOR,
            width_px: CUT_LINE_WIDTH_PX,
            overhang_px: CUT_LINE_OVERHANG_PX,
        }
    }
}

/// Sheet geometry and page appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetOptions {
    pub paper_size: PaperSize,
    pub orientation: Orientation,
    pub dpi: u32,
    pub card_width_mm: f32,
    pub card_height_mm: f32,
    pub bleed_mm: f32,
    pub spacing_mm: f32,
    pub cut_lines: CutLineStyle,
    pub background: [u8; 3],
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            dpi: DEFAULT_DPI,
            card_width_mm: CARD_WIDTH_MM,
            card_height_mm: CARD_HEIGHT_MM,
            bleed_mm: DEFAULT_BLEED_MM,
            spacing_mm: DEFAULT_SPACING_MM,
            cut_lines: CutLineStyle::default(),
            background: BACKGROUND_COLOR,
        }
    }
}

impl SheetOptions {
    /// Defaults for `paper_size` in its preferred orientation
    pub fn for_paper(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            orientation: paper_size.default_orientation(),
            ..Self::default()
        }
    }

    /// Page size in pixels at the configured dpi
    pub fn page_size_px(&self) -> (u32, u32) {
        let (w, h) = self.paper_size.dimensions_with_orientation(self.orientation);
        (mm_to_px(w, self.dpi), mm_to_px(h, self.dpi))
    }

    /// Page size in PDF points
    pub fn page_size_pt(&self) -> (f32, f32) {
        let (w, h) = self.paper_size.dimensions_with_orientation(self.orientation);
        (mm_to_pt(w), mm_to_pt(h))
    }

    /// Card trim size in pixels, without bleed
    pub fn card_size_px(&self) -> (u32, u32) {
        (
            mm_to_px(self.card_width_mm, self.dpi),
            mm_to_px(self.card_height_mm, self.dpi),
        )
    }

    pub fn bleed_px(&self) -> u32 {
        mm_to_px(self.bleed_mm, self.dpi)
    }

    pub fn spacing_px(&self) -> u32 {
        mm_to_px(self.spacing_mm, self.dpi)
    }

    /// Grid geometry for these options
    pub fn geometry(&self) -> Result<GridGeometry> {
        self.validate()?;
        let (page_w, page_h) = self.page_size_px();
        let (card_w, card_h) = self.card_size_px();
        Ok(GridGeometry::new(
            page_w,
            page_h,
            card_w,
            card_h,
            self.bleed_px(),
            self.spacing_px(),
        ))
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(SheetError::Config("dpi must be greater than zero".to_string()));
        }

        let (page_w, page_h) = self.paper_size.dimensions_mm();
        if page_w <= 0.0 || page_h <= 0.0 {
            return Err(SheetError::Config(format!(
                "Paper size must be positive, got {page_w}x{page_h}mm"
            )));
        }

        if self.card_width_mm <= 0.0 || self.card_height_mm <= 0.0 {
            return Err(SheetError::Config("Card size must be positive".to_string()));
        }

        if self.bleed_mm < 0.0 || self.spacing_mm < 0.0 {
            return Err(SheetError::Config(
                "Bleed and spacing cannot be negative".to_string(),
            ));
        }

        let (page_w, page_h) = self.page_size_px();
        let (card_w, card_h) = self.card_size_px();
        let geometry = GridGeometry::new(
            page_w,
            page_h,
            card_w,
            card_h,
            self.bleed_px(),
            self.spacing_px(),
        );
        if geometry.cards_per_page() == 0 {
            return Err(SheetError::Config(format!(
                "No card fits on {} {:?} paper",
                self.paper_size.label(),
                self.orientation
            )));
        }

        Ok(())
    }
}

/// Artwork correction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerOptions {
    /// Width of the border outline repainted in the sampled colour
    pub border_width_px: u32,
    /// 1 disables upscaling
    pub upscale_factor: u32,
    /// External super-resolution executable; built-in resampling when unset
    pub upscaler_command: Option<PathBuf>,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            border_width_px: BORDER_WIDTH_PX,
            upscale_factor: DEFAULT_UPSCALE_FACTOR,
            upscaler_command: None,
        }
    }
}

impl NormalizerOptions {
    pub fn validate(&self) -> Result<()> {
        if self.upscale_factor == 0 {
            return Err(SheetError::Config(
                "Upscale factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
