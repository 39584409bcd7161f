//! Points, rectangles, and the mapping from on-screen coordinates to bitmap
//! pixels.

/// A point in either device (screen) space or bitmap pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in bitmap pixel space.
///
/// `x`/`y` is always the top-left corner and `width`/`height` are never
/// negative, whichever direction the drag that produced it went.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Builds the normalized rectangle spanned by two corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when both sides are strictly longer than `min_size`.
    pub fn exceeds(&self, min_size: f32) -> bool {
        self.width > min_size && self.height > min_size
    }

    /// The part of this rectangle inside a `bitmap_width` x `bitmap_height`
    /// bitmap. Zero-sized when the two do not overlap.
    pub fn clipped(&self, bitmap_width: u32, bitmap_height: u32) -> Rect {
        let (w, h) = (bitmap_width as f32, bitmap_height as f32);
        let x0 = self.x.clamp(0.0, w);
        let y0 = self.y.clamp(0.0, h);
        let x1 = self.right().clamp(0.0, w);
        let y1 = self.bottom().clamp(0.0, h);
        Rect {
            x: x0,
            y: y0,
            width: (x1 - x0).max(0.0),
            height: (y1 - y0).max(0.0),
        }
    }

    /// Integer pixel bounds `(x, y, width, height)` covering this rectangle,
    /// clipped to a `bitmap_width` x `bitmap_height` bitmap. `None` when
    /// nothing of the rectangle lies inside the bitmap.
    pub fn pixel_bounds(&self, bitmap_width: u32, bitmap_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.floor().max(0.0);
        let y0 = self.y.floor().max(0.0);
        let x1 = self.right().ceil().min(bitmap_width as f32);
        let y1 = self.bottom().ceil().min(bitmap_height as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// Where the canvas currently sits on screen, in device coordinates.
///
/// The displayed size may differ from the bitmap size by any (possibly
/// non-uniform) factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Bitmap size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapSize {
    pub width: u32,
    pub height: u32,
}

fn scale(bitmap: u32, displayed: f32) -> f32 {
    // A collapsed canvas (zero or negative layout size) maps 1:1.
    if displayed > 0.0 {
        bitmap as f32 / displayed
    } else {
        1.0
    }
}

/// Pins a bitmap-space point to the bitmap's edges.
pub fn clamp_to_bitmap(point: Point, bitmap: BitmapSize) -> Point {
    Point::new(
        point.x.clamp(0.0, bitmap.width as f32),
        point.y.clamp(0.0, bitmap.height as f32),
    )
}

/// Largest size with the same aspect ratio whose sides fit in `max_side`.
/// Sizes that already fit are returned unchanged.
pub fn fit_within(size: BitmapSize, max_side: u32) -> BitmapSize {
    let longest = size.width.max(size.height);
    if longest <= max_side || max_side == 0 {
        return size;
    }
    let scale = max_side as f64 / longest as f64;
    BitmapSize {
        width: ((size.width as f64 * scale).floor() as u32).clamp(1, max_side),
        height: ((size.height as f64 * scale).floor() as u32).clamp(1, max_side),
    }
}

/// Maps a device-space point onto bitmap pixel coordinates.
pub fn map_to_bitmap(device: Point, display: DisplayRect, bitmap: BitmapSize) -> Point {
    let sx = scale(bitmap.width, display.width);
    let sy = scale(bitmap.height, display.height);
    Point::new((device.x - display.left) * sx, (device.y - display.top) * sy)
}

/// Inverse of [`map_to_bitmap`], used to place overlays over the canvas.
pub fn map_to_device(point: Point, display: DisplayRect, bitmap: BitmapSize) -> Point {
    let sx = scale(bitmap.width, display.width);
    let sy = scale(bitmap.height, display.height);
    Point::new(point.x / sx + display.left, point.y / sy + display.top)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BITMAP: BitmapSize = BitmapSize {
        width: 2000,
        height: 1000,
    };

    #[test]
    fn maps_scaled_canvas() {
        let display = DisplayRect {
            left: 100.0,
            top: 50.0,
            width: 500.0,
            height: 250.0,
        };
        let p = map_to_bitmap(Point::new(350.0, 175.0), display, BITMAP);
        assert_eq!(p, Point::new(1000.0, 500.0));
    }

    #[test]
    fn maps_non_uniform_scaling() {
        // Layout squashed the canvas horizontally only.
        let display = DisplayRect {
            left: 0.0,
            top: 0.0,
            width: 400.0,
            height: 1000.0,
        };
        let p = map_to_bitmap(Point::new(100.0, 100.0), display, BITMAP);
        assert_eq!(p, Point::new(500.0, 100.0));
    }

    #[test]
    fn inverse_recovers_device_point() {
        let display = DisplayRect {
            left: 13.5,
            top: 7.25,
            width: 733.0,
            height: 411.0,
        };
        for &(x, y) in &[(13.5, 7.25), (100.0, 200.0), (746.5, 418.25), (333.3, 99.9)] {
            let device = Point::new(x, y);
            let back = map_to_device(map_to_bitmap(device, display, BITMAP), display, BITMAP);
            assert!((back.x - device.x).abs() < 1e-3, "{back:?} vs {device:?}");
            assert!((back.y - device.y).abs() < 1e-3, "{back:?} vs {device:?}");
        }
    }

    #[test]
    fn collapsed_display_maps_one_to_one() {
        let display = DisplayRect {
            left: 10.0,
            top: 10.0,
            width: 0.0,
            height: 0.0,
        };
        let p = map_to_bitmap(Point::new(15.0, 20.0), display, BITMAP);
        assert_eq!(p, Point::new(5.0, 10.0));
    }

    #[test]
    fn rect_is_normalized_regardless_of_drag_direction() {
        let r = Rect::from_corners(Point::new(110.0, 60.0), Point::new(10.0, 10.0));
        assert_eq!(
            r,
            Rect {
                x: 10.0,
                y: 10.0,
                width: 100.0,
                height: 50.0
            }
        );
    }

    #[test]
    fn threshold_is_strict() {
        let r = Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 50.0,
        };
        assert!(!r.exceeds(10.0));
        assert!(Rect { width: 10.5, ..r }.exceeds(10.0));
    }

    #[test]
    fn clipped_keeps_only_the_inside() {
        let r = Rect {
            x: -100.0,
            y: 50.0,
            width: 102.0,
            height: 42.0,
        };
        assert_eq!(
            r.clipped(200, 100),
            Rect {
                x: 0.0,
                y: 50.0,
                width: 2.0,
                height: 42.0
            }
        );

        let disjoint = Rect {
            x: 300.0,
            y: 0.0,
            width: 50.0,
            height: 50.0,
        };
        let clipped = disjoint.clipped(200, 100);
        assert_eq!((clipped.width, clipped.height), (0.0, 50.0));
    }

    #[test]
    fn points_clamp_to_bitmap_edges() {
        let bitmap = BitmapSize {
            width: 200,
            height: 100,
        };
        assert_eq!(clamp_to_bitmap(Point::new(-100.0, 92.0), bitmap), Point::new(0.0, 92.0));
        assert_eq!(clamp_to_bitmap(Point::new(250.0, 140.0), bitmap), Point::new(200.0, 100.0));
        assert_eq!(clamp_to_bitmap(Point::new(12.5, 7.0), bitmap), Point::new(12.5, 7.0));
    }

    #[test]
    fn fit_within_scales_longest_side_down() {
        let big = BitmapSize {
            width: 10_000,
            height: 6_000,
        };
        assert_eq!(
            fit_within(big, 8192),
            BitmapSize {
                width: 8192,
                height: 4915
            }
        );
        let tall = BitmapSize {
            width: 3,
            height: 20_000,
        };
        assert_eq!(fit_within(tall, 8192), BitmapSize { width: 1, height: 8192 });
        assert_eq!(fit_within(BITMAP, 8192), BITMAP);
    }

    #[test]
    fn pixel_bounds_clip_to_bitmap() {
        let r = Rect {
            x: -5.0,
            y: 90.5,
            width: 30.0,
            height: 40.0,
        };
        assert_eq!(r.pixel_bounds(200, 100), Some((0, 90, 25, 10)));

        let outside = Rect {
            x: 250.0,
            y: 0.0,
            width: 20.0,
            height: 20.0,
        };
        assert_eq!(outside.pixel_bounds(200, 100), None);
    }
}
