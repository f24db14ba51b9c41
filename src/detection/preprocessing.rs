use image::{DynamicImage, GrayImage};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::filter::gaussian_blur_f32;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Binarize so that dark ink becomes foreground (255) and paper becomes 0
pub fn binarize_ink(img: &GrayImage, level: u8) -> GrayImage {
    threshold(img, level, ThresholdType::BinaryInverted)
}
