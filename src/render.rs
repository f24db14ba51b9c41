//! Writing per-request artifacts: glyph crops and the annotated composite.
//!
//! Every file carries a fresh v4 UUID so concurrent requests never collide.
//! Labels need a TrueType font; without one the boxes are still drawn.

use crate::error::RenderError;
use crate::models::GlyphRegion;
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use tracing::debug;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const LABEL_COLOR: Rgb<u8> = Rgb([255, 165, 0]);

const BOX_THICKNESS: i32 = 2;

const LABEL_SCALE: f32 = 20.0;

const SYSTEM_FONTS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// The original canvas with one box and label per glyph
#[derive(Debug, Clone)]
pub struct AnnotatedComposite {
    pub path: PathBuf,
    pub boxes: Vec<GlyphRegion>,
    pub labels: Vec<String>,
    /// Whether label text was actually drawn
    pub labels_drawn: bool,
}

pub struct CompositeRenderer {
    static_dir: PathBuf,
    font: Option<FontVec>,
}

impl CompositeRenderer {
    /// Renderer writing into `static_dir`, labelling with the given font if it
    /// loads, otherwise with the first system font found
    pub fn new(static_dir: impl Into<PathBuf>, font_path: Option<&Path>) -> Self {
        let font = font_path
            .and_then(load_font)
            .or_else(|| SYSTEM_FONTS.iter().find_map(|p| load_font(Path::new(p))));

        if font.is_none() {
            debug!("no font available, composite labels will be skipped");
        }

        Self {
            static_dir: static_dir.into(),
            font,
        }
    }

    /// Renderer that only draws boxes
    pub fn without_font(static_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
            font: None,
        }
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Save one cropped glyph, before it is resized for the network
    pub fn save_glyph(&self, crop: &RgbImage) -> Result<PathBuf, RenderError> {
        let path = self.unique_path("glyph")?;
        crop.save(&path)?;
        Ok(path)
    }

    /// Draw every region with its label and write the composite
    pub fn render(
        &self,
        image: &DynamicImage,
        regions: &[GlyphRegion],
        labels: &[&str],
    ) -> Result<AnnotatedComposite, RenderError> {
        if regions.len() != labels.len() {
            return Err(RenderError::Mismatch {
                regions: regions.len(),
                labels: labels.len(),
            });
        }

        let mut canvas = image.to_rgb8();
        for (region, label) in regions.iter().zip(labels) {
            draw_thick_rect(&mut canvas, region);
            if let Some(font) = &self.font {
                draw_label(&mut canvas, font, region, label);
            }
        }

        let path = self.unique_path("marked")?;
        canvas.save(&path)?;
        debug!(path = %path.display(), boxes = regions.len(), "wrote composite");

        Ok(AnnotatedComposite {
            path,
            boxes: regions.to_vec(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            labels_drawn: self.font.is_some(),
        })
    }

    fn unique_path(&self, prefix: &str) -> Result<PathBuf, RenderError> {
        std::fs::create_dir_all(&self.static_dir)?;
        Ok(self
            .static_dir
            .join(format!("{}__{}.png", prefix, uuid::Uuid::new_v4())))
    }
}

fn load_font(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    FontVec::try_from_vec(data).ok()
}

/// Concentric outlines growing outward; drawing clips at the canvas edge
fn draw_thick_rect(canvas: &mut RgbImage, region: &GlyphRegion) {
    for offset in 0..BOX_THICKNESS {
        let rect = Rect::at(region.x as i32 - offset, region.y as i32 - offset)
            .of_size(region.width + 2 * offset as u32, region.height + 2 * offset as u32);
        draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
    }
}

/// Label goes at the region's top-right corner, pulled back inside the canvas
fn draw_label(canvas: &mut RgbImage, font: &FontVec, region: &GlyphRegion, label: &str) {
    let scale = PxScale::from(LABEL_SCALE);
    let (text_w, text_h) = text_size(scale, font, label);
    let (width, height) = canvas.dimensions();

    let max_x = width.saturating_sub(text_w) as i32;
    let max_y = height.saturating_sub(text_h) as i32;
    let x = (region.right() as i32 + BOX_THICKNESS).min(max_x).max(0);
    let y = (region.y as i32 - text_h as i32).clamp(0, max_y.max(0));

    draw_text_mut(canvas, LABEL_COLOR, x, y, scale, font, label);
}
