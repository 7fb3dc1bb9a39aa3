//! Image clean-up ahead of recognition.
//!
//! Screenshots of bet slips are coloured, low-contrast and often
//! rescaled. Tesseract reads them better as a sharpened grayscale image
//! with the full 0..=255 range in use. Undecodable input is passed
//! through untouched.

use anyhow::{Context, Result};
use image::{imageops, DynamicImage, GrayImage, ImageFormat};
use std::io::Cursor;
use tracing::{debug, warn};

/// Gaussian sigma of the unsharp mask.
const SHARPEN_SIGMA: f32 = 1.0;

/// Minimum pixel difference the unsharp mask acts on.
const SHARPEN_THRESHOLD: i32 = 2;

/// Grayscale, contrast-stretch and sharpen `image`, re-encoded as PNG.
/// Falls back to the original bytes if the image cannot be processed.
pub fn prepare(image: &[u8]) -> Vec<u8> {
    match try_prepare(image) {
        Ok(processed) => {
            debug!(before = image.len(), after = processed.len(), "Image preprocessed");
            processed
        }
        Err(e) => {
            warn!(error = %e, "Image preprocessing failed, using original");
            image.to_vec()
        }
    }
}

fn try_prepare(bytes: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes).context("Failed to decode image")?;

    let mut gray = decoded.to_luma8();
    stretch_contrast(&mut gray);
    let sharpened = imageops::unsharpen(&gray, SHARPEN_SIGMA, SHARPEN_THRESHOLD);

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(sharpened)
        .write_to(&mut out, ImageFormat::Png)
        .context("Failed to encode preprocessed image")?;
    Ok(out.into_inner())
}

/// Linearly map the darkest pixel to 0 and the brightest to 255.
fn stretch_contrast(gray: &mut GrayImage) {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if max <= min {
        return;
    }

    let range = u32::from(max - min);
    for p in gray.pixels_mut() {
        let v = u32::from(p[0] - min) * 255 / range;
        p[0] = v as u8;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
