use crate::models::GlyphRegion;
use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};

/// Find the bounding rectangle of every external contour in a binary mask.
///
/// Non-zero pixels are foreground. Only top-level outer borders count, so the
/// hole of a "0" or a blob nested inside another one yields nothing extra.
/// Every external contour becomes a region, however small; order follows the
/// raster scan that discovers each border.
pub fn find_glyph_regions(mask: &GrayImage) -> Vec<GlyphRegion> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let min_x = c.points.iter().map(|p| p.x).min()?;
            let min_y = c.points.iter().map(|p| p.y).min()?;
            let max_x = c.points.iter().map(|p| p.x).max()?;
            let max_y = c.points.iter().map(|p| p.y).max()?;
            Some(GlyphRegion::from_extents(min_x, min_y, max_x, max_y))
        })
        .collect()
}
