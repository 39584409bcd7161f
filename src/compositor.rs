//! Region blur compositing.
//!
//! The blur kernel itself sits behind [`BlurFilter`]; the compositor only
//! decides which pixels of `original` feed it and which pixels of `working`
//! receive the result.

use image::{RgbaImage, imageops};

use crate::geometry::Rect;

/// A whole-image blur primitive.
pub trait BlurFilter {
    /// Returns a blurred copy of `src` with the same dimensions.
    fn blur(&self, src: &RgbaImage, radius: f32) -> RgbaImage;

    /// Pixels beyond the edge of a region that still influence it.
    fn reach(&self, radius: f32) -> u32 {
        (radius.max(0.0) * 3.0).ceil() as u32
    }
}

/// Gaussian blur with `radius` as the standard deviation.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaussianBlur;

impl BlurFilter for GaussianBlur {
    fn blur(&self, src: &RgbaImage, radius: f32) -> RgbaImage {
        imageops::blur(src, radius)
    }
}

/// Separable box blur over a `(2 * radius + 1)` window, clamped at the edges.
/// Deterministic and cheap, which makes it a handy stand-in.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoxBlur;

impl BlurFilter for BoxBlur {
    fn blur(&self, src: &RgbaImage, radius: f32) -> RgbaImage {
        let r = radius.max(0.0).round() as u32;
        let (w, h) = src.dimensions();
        if r == 0 || w == 0 || h == 0 {
            return src.clone();
        }

        let mut horizontal = RgbaImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let start = x.saturating_sub(r);
                let end = (x + r).min(w - 1);
                let mut accum = [0u32; 4];
                for ix in start..=end {
                    let p = src.get_pixel(ix, y).0;
                    for c in 0..4 {
                        accum[c] += p[c] as u32;
                    }
                }
                let count = end - start + 1;
                horizontal.put_pixel(x, y, image::Rgba(accum.map(|v| (v / count) as u8)));
            }
        }

        let mut out = RgbaImage::new(w, h);
        for x in 0..w {
            for y in 0..h {
                let start = y.saturating_sub(r);
                let end = (y + r).min(h - 1);
                let mut accum = [0u32; 4];
                for iy in start..=end {
                    let p = horizontal.get_pixel(x, iy).0;
                    for c in 0..4 {
                        accum[c] += p[c] as u32;
                    }
                }
                let count = end - start + 1;
                out.put_pixel(x, y, image::Rgba(accum.map(|v| (v / count) as u8)));
            }
        }
        out
    }

    fn reach(&self, radius: f32) -> u32 {
        radius.max(0.0).round() as u32
    }
}

/// Returns its input untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityBlur;

impl BlurFilter for IdentityBlur {
    fn blur(&self, src: &RgbaImage, _radius: f32) -> RgbaImage {
        src.clone()
    }

    fn reach(&self, _radius: f32) -> u32 {
        0
    }
}

/// Outcome of [`apply_blur`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurOutcome {
    /// Pixels `(x, y, width, height)` of `working` were replaced
    Applied { x: u32, y: u32, width: u32, height: u32 },
    /// Rectangle not larger than the minimum size; nothing changed
    TooSmall,
    /// Rectangle lies entirely outside the bitmap; nothing changed
    OutOfBounds,
}

/// Replaces `rect` in `working` with a blurred rendition of the same area of
/// `original`.
///
/// The source is always `original`, so blurring the same region twice gives
/// the same pixels as blurring it once, and overlapping regions never blur
/// the overlap twice. `working` and `original` must have equal dimensions.
pub fn apply_blur(
    working: &mut RgbaImage,
    original: &RgbaImage,
    rect: Rect,
    radius: f32,
    min_size: f32,
    filter: &dyn BlurFilter,
) -> BlurOutcome {
    debug_assert_eq!(working.dimensions(), original.dimensions());

    if !rect.exceeds(min_size) {
        return BlurOutcome::TooSmall;
    }
    let (width, height) = original.dimensions();
    let clipped = rect.clipped(width, height);
    if clipped.width <= 0.0 || clipped.height <= 0.0 {
        return BlurOutcome::OutOfBounds;
    }
    // The threshold applies to what actually lands on the bitmap.
    if !clipped.exceeds(min_size) {
        return BlurOutcome::TooSmall;
    }
    let Some((x, y, w, h)) = clipped.pixel_bounds(width, height) else {
        return BlurOutcome::OutOfBounds;
    };

    // Blur a padded window so pixels just outside the selection feed the
    // kernel, then keep only the selection itself.
    let reach = filter.reach(radius);
    let px = x.saturating_sub(reach);
    let py = y.saturating_sub(reach);
    let pw = (x + w).saturating_add(reach).min(width) - px;
    let ph = (y + h).saturating_add(reach).min(height) - py;

    let window = imageops::crop_imm(original, px, py, pw, ph).to_image();
    let blurred = filter.blur(&window, radius);
    let patch = imageops::crop_imm(&blurred, x - px, y - py, w, h).to_image();
    imageops::replace(working, &patch, x as i64, y as i64);

    BlurOutcome::Applied {
        x,
        y,
        width: w,
        height: h,
    }
}
