//! Turning a detected region into the classifier's input tensor.

use crate::models::{GLYPH_SIZE, GlyphRegion, GlyphTensor};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array3;

/// Per-channel mean and std: maps [0, 1] onto [-1, 1]
const MEAN: [f32; 3] = [0.5, 0.5, 0.5];
const STD: [f32; 3] = [0.5, 0.5, 0.5];

/// Bounding box of every pixel that is not pure white in all channels
pub fn ink_bounding_box(img: &RgbImage) -> Option<GlyphRegion> {
    let (width, height) = img.dimensions();
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut has_content = false;

    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel.0.iter().any(|c| *c != 255) {
            has_content = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    has_content.then(|| GlyphRegion::from_extents(min_x, min_y, max_x, max_y))
}

/// Crop a region out of the canvas, clamped to the image bounds
pub fn crop_region(img: &RgbImage, region: &GlyphRegion) -> Option<RgbImage> {
    let clamped = region.clamp_to(img.width(), img.height())?;
    Some(imageops::crop_imm(img, clamped.x, clamped.y, clamped.width, clamped.height).to_image())
}

/// Crop for a lone glyph: the image's own non-white extent rather than the
/// detected contour rectangle. Falls back to the detected region when the
/// canvas has no non-white pixel at all.
pub fn crop_single(img: &RgbImage, detected: &GlyphRegion) -> Option<RgbImage> {
    let region = ink_bounding_box(img).unwrap_or(*detected);
    crop_region(img, &region)
}

/// Resize a crop to 32x32 and normalize it into a CHW tensor
pub fn to_glyph_tensor(crop: &RgbImage) -> GlyphTensor {
    let size = GLYPH_SIZE as u32;
    let resized = imageops::resize(crop, size, size, FilterType::Triangle);

    let mut tensor = Array3::<f32>::zeros((3, GLYPH_SIZE, GLYPH_SIZE));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            tensor[[c, y as usize, x as usize]] = (value - MEAN[c]) / STD[c];
        }
    }

    GlyphTensor(tensor)
}
