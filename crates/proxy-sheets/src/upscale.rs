//! Upscaling backends.
//!
//! The super-resolution model is an external collaborator; the pipeline only
//! needs `image -> image`. The built-in backend resamples with Lanczos, the
//! command backend shells out to a Real-ESRGAN style executable.

use crate::types::{Result, SheetError};
use image::imageops::FilterType;
use image::{ImageFormat, RgbImage};
use std::path::PathBuf;
use std::process::Command;

pub trait Upscaler {
    /// Short name for log messages
    fn name(&self) -> &str;

    /// Enlarge `image` by `factor` in both dimensions
    fn upscale(&self, image: RgbImage, factor: u32) -> Result<RgbImage>;
}

impl<U: Upscaler + ?Sized> Upscaler for &U {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn upscale(&self, image: RgbImage, factor: u32) -> Result<RgbImage> {
        (**self).upscale(image, factor)
    }
}

impl<U: Upscaler + ?Sized> Upscaler for Box<U> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn upscale(&self, image: RgbImage, factor: u32) -> Result<RgbImage> {
        (**self).upscale(image, factor)
    }
}

/// Lanczos resampling
#[derive(Debug, Clone, Copy, Default)]
pub struct ResampleUpscaler;

impl Upscaler for ResampleUpscaler {
    fn name(&self) -> &str {
        "lanczos"
    }

    fn upscale(&self, image: RgbImage, factor: u32) -> Result<RgbImage> {
        if factor <= 1 {
            return Ok(image);
        }
        let (w, h) = image.dimensions();
        Ok(image::imageops::resize(
            &image,
            w * factor,
            h * factor,
            FilterType::Lanczos3,
        ))
    }
}

/// Runs `<program> -i <input> -o <output> -s <factor>` on a scratch copy of
/// the image and reads the result back.
#[derive(Debug, Clone)]
pub struct CommandUpscaler {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandUpscaler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments appended after the standard ones, e.g. a model name
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Upscaler for CommandUpscaler {
    fn name(&self) -> &str {
        self.program
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("command")
    }

    fn upscale(&self, image: RgbImage, factor: u32) -> Result<RgbImage> {
        if factor <= 1 {
            return Ok(image);
        }

        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("input.png");
        let output = scratch.path().join("output.png");
        image.save_with_format(&input, ImageFormat::Png)?;

        log::debug!(
            "Running {} -i {} -o {} -s {}",
            self.program.display(),
            input.display(),
            output.display(),
            factor
        );
        let status = Command::new(&self.program)
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .arg("-s")
            .arg(factor.to_string())
            .args(&self.extra_args)
            .status()
            .map_err(|e| SheetError::Upscale {
                path: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(SheetError::Upscale {
                path: self.program.clone(),
                reason: format!("exited with {status}"),
            });
        }
        if !output.is_file() {
            return Err(SheetError::Upscale {
                path: self.program.clone(),
                reason: "no output image was written".to_string(),
            });
        }

        Ok(image::open(&output)?.to_rgb8())
    }
}
