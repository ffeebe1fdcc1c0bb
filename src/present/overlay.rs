use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use image::imageops::{self, FilterType};
use image::{GrayAlphaImage, RgbImage};
use std::path::Path;

use crate::detect::DetectedObject;
use crate::image_source::ImageSource;

/// Decode a base64 mask (optionally wrapped in a `data:` URL) into a
/// grayscale image with alpha.
pub fn decode_mask(mask: &str) -> Result<GrayAlphaImage> {
    let payload = match mask.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => mask,
    };
    let payload = payload.trim();
    let bytes = STANDARD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .context("decode base64 mask")?;
    if bytes.is_empty() {
        return Err(anyhow!("mask is empty"));
    }
    let mask = image::load_from_memory(&bytes).context("decode mask image")?;
    Ok(mask.into_luma_alpha8())
}

/// Composite the inverted mask over `base` with a screen blend.
///
/// Per channel: `screen = 255 - (255 - base) * mask / 255`, mixed with the
/// base by the mask's alpha. Pixels under a white mask keep the photo;
/// pixels under a black mask wash out to white.
pub fn screen_inverted(base: &mut RgbImage, mask: &GrayAlphaImage) {
    let (width, height) = base.dimensions();
    let resized;
    let mask = if mask.dimensions() == (width, height) {
        mask
    } else {
        resized = imageops::resize(mask, width, height, FilterType::Nearest);
        &resized
    };

    for (pixel, mask_pixel) in base.pixels_mut().zip(mask.pixels()) {
        let level = mask_pixel.0[0] as u32;
        let alpha = mask_pixel.0[1] as u32;
        for channel in pixel.0.iter_mut() {
            let b = *channel as u32;
            let screened = 255 - (255 - b) * level / 255;
            *channel = ((b * (255 - alpha) + screened * alpha + 127) / 255) as u8;
        }
    }
}

/// Render the preview: the chosen image, with the selected mask on top.
pub fn compose_preview(
    image: &ImageSource,
    selection: Option<&DetectedObject>,
) -> Result<RgbImage> {
    let mut base = image::load_from_memory(image.bytes())
        .with_context(|| format!("decode image {} ({})", image.file_name(), image.digest()))?
        .into_rgb8();
    if let Some(selected) = selection {
        let mask = decode_mask(&selected.mask)
            .with_context(|| format!("mask for '{}'", selected.label))?;
        screen_inverted(&mut base, &mask);
    }
    Ok(base)
}

pub fn write_png(image: &RgbImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write preview {}", path.display()))
}
