//! Header images for posts

use anyhow::{Context, Result};
use image::{imageops, ImageFormat, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::Slug;
use crate::Site;

/// File name of a post's header inside its image directory
pub const HEADER_FILE: &str = "header.png";

/// How an image was cropped to reach 4:3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crop {
    /// Too wide: columns trimmed from both sides
    Horizontal,
    /// Too tall: rows trimmed from top and bottom
    Vertical,
    None,
}

/// Centered 4:3 crop box `(x, y, width, height)` for an image
pub fn crop_box(width: u32, height: u32) -> (Crop, u32, u32, u32, u32) {
    let (w, h) = (u64::from(width), u64::from(height));

    if w * 3 > h * 4 {
        let new_width = (h * 4 / 3) as u32;
        let left = (width - new_width) / 2;
        (Crop::Horizontal, left, 0, new_width, height)
    } else if w * 3 < h * 4 {
        let new_height = (w * 3 / 4) as u32;
        let top = (height - new_height) / 2;
        (Crop::Vertical, 0, top, width, new_height)
    } else {
        (Crop::None, 0, 0, width, height)
    }
}

/// Load an image, flatten any transparency onto white and center-crop it to 4:3
pub fn prepare_header(source: &Path) -> Result<(RgbImage, Crop)> {
    let img = image::open(source).with_context(|| format!("Failed to open image {:?}", source))?;
    let rgba = img.to_rgba8();

    let flattened = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    });

    let (crop, x, y, width, height) = crop_box(flattened.width(), flattened.height());
    tracing::debug!(
        "Cropping {}x{} to {}x{} ({:?})",
        flattened.width(),
        flattened.height(),
        width,
        height,
        crop
    );
    let cropped = imageops::crop_imm(&flattened, x, y, width, height).to_image();
    Ok((cropped, crop))
}

/// Write a prepared header as PNG, creating its directory
pub fn save_header(image: &RgbImage, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    image
        .save_with_format(output, ImageFormat::Png)
        .with_context(|| format!("Failed to write {:?}", output))?;
    Ok(())
}

/// Process `source` into the header image for an existing slug
pub fn run(site: &Site, slug: &str, source: &Path) -> Result<PathBuf> {
    let slug = Slug::parse(slug)?;
    let (image, crop) = prepare_header(source)?;

    let output = site.image_dir(slug.as_str()).join(HEADER_FILE);
    save_header(&image, &output)?;
    println!(
        "Saved header {}x{} ({:?} crop) to {:?}",
        image.width(),
        image.height(),
        crop,
        output
    );
    Ok(output)
}
