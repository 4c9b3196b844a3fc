//! Card artwork correction, collage layout and PDF export.

pub mod constants;
mod layout;
mod normalize;
mod options;
mod pdf;
mod types;
mod upscale;

pub use layout::{
    CollageReport, CutAxis, CutLine, GridGeometry, GridPosition, LayoutItem, RenderedPage, Slot, expand_slots,
    render_collages, render_page,
};
pub use normalize::{
    NormalizedImage, add_bleed, correct_border, flatten_alpha, load_image, normalize_image, normalized_path,
    sample_border_color,
};
pub use options::*;
pub use pdf::{PdfReport, build_pdf, export_pdf, fit_centered};
pub use types::*;
pub use upscale::{CommandUpscaler, ResampleUpscaler, Upscaler};

/// Upscaler selected by `options`: the external command when configured,
/// Lanczos resampling otherwise
pub fn upscaler_for(options: &NormalizerOptions) -> Box<dyn Upscaler + Send + Sync> {
    match &options.upscaler_command {
        Some(program) => Box::new(CommandUpscaler::new(program)),
        None => Box::new(ResampleUpscaler),
    }
}
