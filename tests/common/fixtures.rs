use digitdraw::archive::ObjectStore;
use digitdraw::error::ArchiveError;
use digitdraw::models::{BLANK_CLASS, NUM_CLASSES};
use digitdraw::render::CompositeRenderer;
use digitdraw::{ClassScores, DigitPredictor, GlyphClassifier, GlyphTensor, ModelError};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;

pub const INK: Rgb<u8> = Rgb([0, 0, 0]);
pub const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

/// A blank 200x200 canvas, like the drawing front-end produces
pub fn blank_canvas() -> RgbImage {
    RgbImage::from_pixel(200, 200, PAPER)
}

/// Thick pen stroke from one point to another
pub fn draw_stroke(img: &mut RgbImage, from: (i32, i32), to: (i32, i32), radius: i32) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).max(1);
    for s in 0..=steps {
        let x = from.0 + (to.0 - from.0) * s / steps;
        let y = from.1 + (to.1 - from.1) * s / steps;
        draw_filled_circle_mut(img, (x, y), radius, INK);
    }
}

/// A "1": vertical bar with a short flag, top at (x, y)
pub fn draw_one(img: &mut RgbImage, x: i32, y: i32) {
    draw_stroke(img, (x, y), (x, y + 100), 4);
    draw_stroke(img, (x - 15, y + 15), (x, y), 4);
}

/// A "2": top bar, right side, diagonal, bottom bar, top-left at (x, y)
pub fn draw_two(img: &mut RgbImage, x: i32, y: i32) {
    draw_stroke(img, (x, y), (x + 50, y), 4);
    draw_stroke(img, (x + 50, y), (x + 50, y + 45), 4);
    draw_stroke(img, (x + 50, y + 45), (x, y + 100), 4);
    draw_stroke(img, (x, y + 100), (x + 50, y + 100), 4);
}

/// Canvas with a "1" on the left and a "2" on the right. The "1" starts
/// higher, so it is the first glyph found by the raster scan.
pub fn one_two_canvas() -> RgbImage {
    let mut img = blank_canvas();
    draw_one(&mut img, 50, 30);
    draw_two(&mut img, 110, 50);
    img
}

pub fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("Failed to encode test canvas");
    buf
}

/// Scores where `class` wins, followed by the lowest remaining indices
pub fn scores_for(class: usize) -> ClassScores {
    let mut scores = [0.0f32; NUM_CLASSES];
    for (i, score) in scores.iter_mut().enumerate() {
        *score = -(i as f32) / 10.0;
    }
    scores[class] = 5.0;
    ClassScores(scores)
}

/// Returns the given classes in call order, then the blank class
pub struct ScriptedClassifier {
    classes: Mutex<VecDeque<usize>>,
}

impl ScriptedClassifier {
    pub fn new(classes: &[usize]) -> Self {
        Self {
            classes: Mutex::new(classes.iter().copied().collect()),
        }
    }
}

impl GlyphClassifier for ScriptedClassifier {
    fn classify(&self, _glyph: &GlyphTensor) -> Result<ClassScores, ModelError> {
        let class = self
            .classes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(BLANK_CLASS);
        Ok(scores_for(class))
    }
}

/// Always answers the same class
pub struct ConstantClassifier(pub usize);

impl GlyphClassifier for ConstantClassifier {
    fn classify(&self, _glyph: &GlyphTensor) -> Result<ClassScores, ModelError> {
        Ok(scores_for(self.0))
    }
}

/// Object store that is never reachable
pub struct OfflineStore;

impl ObjectStore for OfflineStore {
    fn put(&self, key: &str, _bytes: &[u8]) -> Result<String, ArchiveError> {
        Err(ArchiveError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            format!("store offline, cannot write {key}"),
        )))
    }
}

/// Predictor writing into a fresh temp directory.
/// Returns both the predictor and the temp directory (which must be kept alive).
pub fn make_predictor(classifier: impl GlyphClassifier + 'static) -> (DigitPredictor, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let renderer = CompositeRenderer::without_font(dir.path().join("static"));
    (DigitPredictor::new(Box::new(classifier), renderer), dir)
}
