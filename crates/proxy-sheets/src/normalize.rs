//! Artwork correction before layout.
//!
//! Scans often carry a thin off-colour frame or a lighter corner. The fix
//! repaints the outer frame in the colour sampled just inside the printed
//! border; the same colour fills the bleed added at paste time.

use crate::constants::{BORDER_SAMPLE_X, BORDER_SAMPLE_Y, NORMALIZED_SUFFIX};
use crate::options::NormalizerOptions;
use crate::types::Result;
use crate::upscale::Upscaler;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// Result of normalizing one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub path: PathBuf,
    /// Sampled border colour; `None` when existing output was reused
    pub border_color: Option<[u8; 3]>,
    /// True when the output already existed and no work was done
    pub reused: bool,
}

/// Open an image regardless of its file extension
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Mean colour of the border sample region, clamped to the image bounds
pub fn sample_border_color(image: &RgbImage) -> [u8; 3] {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return [0, 0, 0];
    }

    let x0 = BORDER_SAMPLE_X.start.min(w - 1);
    let x1 = BORDER_SAMPLE_X.end.min(w).max(x0 + 1);
    let y0 = BORDER_SAMPLE_Y.start.min(h - 1);
    let y1 = BORDER_SAMPLE_Y.end.min(h).max(y0 + 1);

    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            let Rgb(px) = *image.get_pixel(x, y);
            for (acc, channel) in sum.iter_mut().zip(px) {
                *acc += u64::from(channel);
            }
            count += 1;
        }
    }

    sum.map(|channel| (channel / count) as u8)
}

/// Paint a `width`-pixel outline in `color` around the whole image
pub fn correct_border(image: &mut RgbImage, color: [u8; 3], width: u32) {
    let (w, h) = image.dimensions();
    let width = width.min(w.div_ceil(2)).min(h.div_ceil(2));
    let color = Rgb(color);

    for (x, y, px) in image.enumerate_pixels_mut() {
        if x < width || y < width || x >= w - width || y >= h - width {
            *px = color;
        }
    }
}

/// Pad the image by `bleed` pixels on every side, filled with `color`
pub fn add_bleed(image: &RgbImage, bleed: u32, color: [u8; 3]) -> RgbImage {
    let (w, h) = image.dimensions();
    let mut canvas = RgbImage::from_pixel(w + 2 * bleed, h + 2 * bleed, Rgb(color));
    image::imageops::replace(&mut canvas, image, i64::from(bleed), i64::from(bleed));
    canvas
}

/// Composite any alpha channel over white
pub fn flatten_alpha(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    let (w, h) = rgba.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * a + 255 * (255 - a)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Output path for a normalized copy of `source` inside `out_dir`
pub fn normalized_path(source: &Path, out_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    out_dir.join(format!("{stem}{NORMALIZED_SUFFIX}.png"))
}

/// Flatten, border-correct and upscale `source` into `out_dir`.
///
/// Skipped entirely when the output file already exists.
pub fn normalize_image(
    source: &Path,
    out_dir: &Path,
    options: &NormalizerOptions,
    upscaler: &dyn Upscaler,
) -> Result<NormalizedImage> {
    let target = normalized_path(source, out_dir);
    if target.exists() {
        log::debug!("Normalized image already exists: {}", target.display());
        return Ok(NormalizedImage {
            path: target,
            border_color: None,
            reused: true,
        });
    }

    log::info!("Fixing borders of {}", source.display());
    let mut image = flatten_alpha(load_image(source)?);
    let border_color = sample_border_color(&image);
    correct_border(&mut image, border_color, options.border_width_px);

    if options.upscale_factor > 1 {
        log::info!(
            "Upscaling {} x{} with {}",
            source.display(),
            options.upscale_factor,
            upscaler.name()
        );
        image = upscaler.upscale(image, options.upscale_factor)?;
    }

    std::fs::create_dir_all(out_dir)?;
    let tmp = target.with_extension("part");
    image.save_with_format(&tmp, ImageFormat::Png)?;
    std::fs::rename(&tmp, &target)?;
    log::info!("Saved normalized image: {}", target.display());

    Ok(NormalizedImage {
        path: target,
        border_color: Some(border_color),
        reused: false,
    })
}
