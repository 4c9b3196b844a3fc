//! Shared constants for sheet rendering
//!
//! Pixel measurements assume the default print resolution; anything given in
//! millimetres is converted with [`mm_to_px`] at the configured dpi.

// =============================================================================
// Unit Conversion
// =============================================================================

pub const MM_PER_INCH: f32 = 25.4;

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / MM_PER_INCH;

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert millimeters to whole pixels at `dpi`, truncating
#[inline]
pub fn mm_to_px(mm: f32, dpi: u32) -> u32 {
    (mm / MM_PER_INCH * dpi as f32 + 1e-3).floor().max(0.0) as u32
}

// =============================================================================
// Card Geometry
// =============================================================================

/// Print resolution (300 dpi base, doubled for the upscaled artwork)
pub const DEFAULT_DPI: u32 = 600;

/// Card trim size: 2.5" x 3.5"
pub const CARD_WIDTH_MM: f32 = 63.5;
pub const CARD_HEIGHT_MM: f32 = 88.9;

/// Bleed added on every side of a card
pub const DEFAULT_BLEED_MM: f32 = 1.5;

/// Gap between neighbouring cards (20 px at 600 dpi)
pub const DEFAULT_SPACING_MM: f32 = 0.85;

// =============================================================================
// Cut Lines
// =============================================================================

pub const CUT_LINE_COLOR: [u8; 3] = [255, 0, 0];

/// Stroke width of cut lines (pixels)
pub const CUT_LINE_WIDTH_PX: u32 = 3;

/// How far cut lines run past the card grid (pixels)
pub const CUT_LINE_OVERHANG_PX: u32 = 100;

pub const BACKGROUND_COLOR: [u8; 3] = [255, 255, 255];

// =============================================================================
// Artwork Correction
// =============================================================================

/// Width of the border outline painted over scanned artwork (pixels)
pub const BORDER_WIDTH_PX: u32 = 20;

/// Region sampled for the border colour: columns 50..60 of the top 5 rows,
/// inside the printed border but away from the anti-aliased corner.
pub const BORDER_SAMPLE_X: std::ops::Range<u32> = 50..60;
pub const BORDER_SAMPLE_Y: std::ops::Range<u32> = 0..5;

pub const DEFAULT_UPSCALE_FACTOR: u32 = 2;

/// Suffix added to the file stem of normalized artwork
pub const NORMALIZED_SUFFIX: &str = "[upscaled]";

// =============================================================================
// Manifest Pages
// =============================================================================

pub const MANIFEST_FONT_SIZE: f32 = 10.0;
pub const MANIFEST_LEADING: f32 = 12.0;
pub const MANIFEST_MARGIN: f32 = 40.0;
