//! Collage layout: packing card images into page grids.
//!
//! Every cell holds one card plus its bleed. Cells are `spacing` pixels
//! apart and the whole grid is centered on the page. Cut lines run through
//! the middle of each gap (and the matching position outside the outer
//! cells), overhanging the grid by a fixed distance.

use crate::normalize::{add_bleed, load_image, sample_border_color};
use crate::options::{CutLineStyle, SheetOptions};
use crate::types::*;
use image::imageops::FilterType;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// =============================================================================
// Grid Geometry
// =============================================================================

/// Position within the grid (row, column)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    /// Row index (0 = top row)
    pub row: usize,
    /// Column index (0 = leftmost column)
    pub col: usize,
}

/// Direction of a cut line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutAxis {
    Horizontal,
    Vertical,
}

/// One cut line, in page pixels. `position` is the centre of the stroke
/// across the line; `start..end` is its extent along the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutLine {
    pub axis: CutAxis,
    pub position: i64,
    pub start: i64,
    pub end: i64,
}

/// Page grid computed from page, card, bleed and spacing sizes (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub page_width: u32,
    pub page_height: u32,
    pub card_width: u32,
    pub card_height: u32,
    pub bleed: u32,
    pub spacing: u32,
    pub cols: usize,
    pub rows: usize,
}

impl GridGeometry {
    pub fn new(page_width: u32, page_height: u32, card_width: u32, card_height: u32, bleed: u32, spacing: u32) -> Self {
        let pitch_x = card_width + 2 * bleed + spacing;
        let pitch_y = card_height + 2 * bleed + spacing;
        let cols = if pitch_x == 0 { 0 } else { (page_width / pitch_x) as usize };
        let rows = if pitch_y == 0 { 0 } else { (page_height / pitch_y) as usize };

        Self {
            page_width,
            page_height,
            card_width,
            card_height,
            bleed,
            spacing,
            cols,
            rows,
        }
    }

    pub fn cards_per_row(&self) -> usize {
        self.cols
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows
    }

    pub fn cards_per_page(&self) -> usize {
        self.cols * self.rows
    }

    /// Card plus bleed
    pub fn cell_size(&self) -> (u32, u32) {
        (
            self.card_width + 2 * self.bleed,
            self.card_height + 2 * self.bleed,
        )
    }

    /// Distance between the origins of neighbouring cells
    pub fn pitch(&self) -> (u32, u32) {
        let (cell_w, cell_h) = self.cell_size();
        (cell_w + self.spacing, cell_h + self.spacing)
    }

    pub fn grid_size(&self) -> (u32, u32) {
        let (cell_w, cell_h) = self.cell_size();
        let span = |n: usize, cell: u32| {
            let n = n as u32;
            if n == 0 { 0 } else { n * cell + (n - 1) * self.spacing }
        };
        (span(self.cols, cell_w), span(self.rows, cell_h))
    }

    /// Top-left corner of the grid block
    pub fn offset(&self) -> (u32, u32) {
        let (grid_w, grid_h) = self.grid_size();
        (
            self.page_width.saturating_sub(grid_w) / 2,
            self.page_height.saturating_sub(grid_h) / 2,
        )
    }

    /// Row-major grid position of slot `index` on its page
    pub fn position(&self, index: usize) -> GridPosition {
        let cols = self.cols.max(1);
        let index = index % self.cards_per_page().max(1);
        GridPosition {
            row: index / cols,
            col: index % cols,
        }
    }

    /// Top-left pixel of slot `index` on its page
    pub fn cell_origin(&self, index: usize) -> (u32, u32) {
        let GridPosition { row, col } = self.position(index);
        let (offset_x, offset_y) = self.offset();
        let (pitch_x, pitch_y) = self.pitch();
        (
            offset_x + col as u32 * pitch_x,
            offset_y + row as u32 * pitch_y,
        )
    }

    /// Number of pages needed for `slots` cards
    pub fn page_count(&self, slots: usize) -> usize {
        match self.cards_per_page() {
            0 => 0,
            per_page => slots.div_ceil(per_page),
        }
    }

    /// rows+1 horizontal and cols+1 vertical cut lines
    pub fn cut_lines(&self, overhang: u32) -> Vec<CutLine> {
        let (offset_x, offset_y) = self.offset();
        let (grid_w, grid_h) = self.grid_size();
        let (pitch_x, pitch_y) = self.pitch();
        let half_gap = i64::from(self.spacing) / 2;
        let overhang = i64::from(overhang);

        let (left, top) = (i64::from(offset_x), i64::from(offset_y));
        let (right, bottom) = (left + i64::from(grid_w), top + i64::from(grid_h));

        let horizontal = (0..=self.rows).map(|row| CutLine {
            axis: CutAxis::Horizontal,
            position: top + row as i64 * i64::from(pitch_y) - half_gap,
            start: left - overhang,
            end: right + overhang,
        });
        let vertical = (0..=self.cols).map(|col| CutLine {
            axis: CutAxis::Vertical,
            position: left + col as i64 * i64::from(pitch_x) - half_gap,
            start: top - overhang,
            end: bottom + overhang,
        });

        horizontal.chain(vertical).collect()
    }
}

// =============================================================================
// Slots
// =============================================================================

/// A card image with its print quantity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutItem {
    pub image: PathBuf,
    pub quantity: usize,
    /// Card name for log messages
    pub label: String,
}

/// One grid cell's worth of card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub image: PathBuf,
    pub label: String,
}

/// Expand items by quantity, keeping order: `[A x2, B x1]` becomes `[A, A, B]`
pub fn expand_slots(items: &[LayoutItem]) -> Vec<Slot> {
    items
        .iter()
        .flat_map(|item| {
            std::iter::repeat_n(
                Slot {
                    image: item.image.clone(),
                    label: item.label.clone(),
                },
                item.quantity,
            )
        })
        .collect()
}

// =============================================================================
// Rendering
// =============================================================================

/// A rendered page and the slots that could not be pasted
pub struct RenderedPage {
    pub image: RgbImage,
    pub skipped: usize,
}

/// Rasterize one page. `slots` holds at most one page of cards.
///
/// Each card is resized to the trim size, padded with bleed in its own
/// border colour and pasted over the cut lines. A slot whose image cannot be
/// read is left empty.
pub fn render_page(geometry: &GridGeometry, slots: &[Slot], options: &SheetOptions) -> RenderedPage {
    let mut page = RgbImage::from_pixel(geometry.page_width, geometry.page_height, Rgb(options.background));

    if options.cut_lines.enabled {
        draw_cut_lines(&mut page, geometry, &options.cut_lines);
    }

    let mut skipped = 0;
    for (index, slot) in slots.iter().take(geometry.cards_per_page()).enumerate() {
        match card_tile(&slot.image, geometry) {
            Ok(tile) => {
                let (x, y) = geometry.cell_origin(index);
                image::imageops::replace(&mut page, &tile, i64::from(x), i64::from(y));
            }
            Err(e) => {
                log::error!("Skipping slot {} ({}): {}", index, slot.label, e);
                skipped += 1;
            }
        }
    }

    RenderedPage { image: page, skipped }
}

fn card_tile(path: &Path, geometry: &GridGeometry) -> Result<RgbImage> {
    let image = load_image(path)?.into_rgb8();
    let resized = image::imageops::resize(&image, geometry.card_width, geometry.card_height, FilterType::Lanczos3);
    let color = sample_border_color(&resized);
    Ok(add_bleed(&resized, geometry.bleed, color))
}

fn draw_cut_lines(page: &mut RgbImage, geometry: &GridGeometry, style: &CutLineStyle) {
    let width = i64::from(style.width_px);
    let before = width / 2;

    for line in geometry.cut_lines(style.overhang_px) {
        let across = (line.position - before, line.position - before + width);
        let along = (line.start, line.end);
        match line.axis {
            CutAxis::Horizontal => fill_rect(page, along, across, style.color),
            CutAxis::Vertical => fill_rect(page, across, along, style.color),
        }
    }
}

/// Fill `x0..x1` by `y0..y1`, clipped to the image
fn fill_rect(image: &mut RgbImage, (x0, x1): (i64, i64), (y0, y1): (i64, i64), color: [u8; 3]) {
    let (w, h) = image.dimensions();
    let clip = |v: i64, max: u32| v.clamp(0, i64::from(max)) as u32;

    for y in clip(y0, h)..clip(y1, h) {
        for x in clip(x0, w)..clip(x1, w) {
            image.put_pixel(x, y, Rgb(color));
        }
    }
}

/// Summary of a collage run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollageReport {
    pub pages: Vec<PathBuf>,
    pub slots: usize,
    pub skipped_slots: usize,
}

fn page_path(out_dir: &Path, stem: &str, number: usize) -> PathBuf {
    out_dir.join(format!("{stem}{number}.png"))
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Render every page and save them as `<stem><n>.png` (n from 1) in `out_dir`
pub async fn render_collages(
    slots: &[Slot],
    options: &SheetOptions,
    out_dir: impl AsRef<Path>,
    stem: &str,
) -> Result<CollageReport> {
    let geometry = options.geometry()?;
    let out_dir = out_dir.as_ref().to_owned();
    tokio::fs::create_dir_all(&out_dir).await?;

    let mut report = CollageReport {
        slots: slots.len(),
        ..Default::default()
    };
    log::info!(
        "Laying out {} card(s), {} per page ({} x {})",
        slots.len(),
        geometry.cards_per_page(),
        geometry.cols,
        geometry.rows
    );

    for (page_idx, chunk) in slots.chunks(geometry.cards_per_page()).enumerate() {
        let chunk = chunk.to_vec();
        let page_options = options.clone();

        // Rasterizing and encoding are CPU-bound
        let (bytes, skipped) = tokio::task::spawn_blocking(move || {
            let page = render_page(&geometry, &chunk, &page_options);
            Ok::<_, SheetError>((encode_png(&page.image)?, page.skipped))
        })
        .await??;

        let path = page_path(&out_dir, stem, page_idx + 1);
        tokio::fs::write(&path, bytes).await?;
        log::info!("Collage saved as {}", path.display());

        report.skipped_slots += skipped;
        report.pages.push(path);
    }

    Ok(report)
}
