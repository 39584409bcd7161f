//! The editor session: one owned object holding the bitmaps, the selection
//! state and the gesture queue, usable without any UI host.

use std::collections::VecDeque;
use std::path::Path;
use std::time::SystemTime;

use image::RgbaImage;

use crate::buffer::{ImageBufferManager, ImageHandle, ImageSource};
use crate::compositor::{BlurFilter, BlurOutcome, GaussianBlur, apply_blur};
use crate::config::EditorConfig;
use crate::error::{ArmError, ExportError, LoadResult};
use crate::export::{ExportedImage, export_file_name};
use crate::geometry::{BitmapSize, DisplayRect, Point, Rect, clamp_to_bitmap, map_to_bitmap};
use crate::input::{GesturePhase, InputNormalizer, RawPointerEvent};
use crate::selection::{SelectionMachine, SelectionMode, SelectionUpdate};

/// Something observable that happened while draining the gesture queue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionEvent {
    DragStarted,
    Preview(Rect),
    Blurred(BlurOutcome),
    /// Drag ended below the minimum size and was dropped
    SelectionDiscarded,
}

/// A queued gesture step, already in bitmap space.
#[derive(Clone, Copy, Debug)]
struct QueuedGesture {
    phase: GesturePhase,
    point: Point,
}

pub struct EditorSession {
    config: EditorConfig,
    buffers: ImageBufferManager,
    selection: SelectionMachine,
    normalizer: InputNormalizer,
    filter: Box<dyn BlurFilter>,
    queue: VecDeque<QueuedGesture>,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_filter(config, Box::new(GaussianBlur))
    }

    /// Session using a specific blur primitive.
    pub fn with_filter(config: EditorConfig, filter: Box<dyn BlurFilter>) -> Self {
        Self {
            buffers: ImageBufferManager::new(&config),
            selection: SelectionMachine::new(config.min_selection_size),
            normalizer: InputNormalizer::new(),
            filter,
            queue: VecDeque::new(),
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Loads a new image, replacing the current one and abandoning any
    /// selection in progress. A failed load changes nothing.
    pub fn load_image(&mut self, source: &ImageSource) -> LoadResult<ImageHandle> {
        let loaded = self.buffers.load(source);
        self.finish_load(source.name.as_deref().unwrap_or("image"), loaded)
    }

    /// Like [`load_image`](Self::load_image), reading the file itself.
    pub fn load_path(&mut self, path: &Path) -> LoadResult<ImageHandle> {
        let loaded = self.buffers.load_path(path);
        self.finish_load(&path.display().to_string(), loaded)
    }

    fn finish_load(&mut self, name: &str, loaded: LoadResult<ImageHandle>) -> LoadResult<ImageHandle> {
        match loaded {
            Ok(handle) => {
                self.clear_selection();
                Ok(handle)
            }
            Err(err) => {
                log::warn!("Rejected {}: {}", name, err);
                Err(err)
            }
        }
    }

    pub fn can_enter_blur_mode(&self) -> bool {
        self.selection.can_arm(self.buffers.is_loaded())
    }

    pub fn enter_blur_mode(&mut self) -> Result<(), ArmError> {
        self.selection.arm(self.buffers.is_loaded())
    }

    pub fn mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// Normalizes a raw pointer/touch event, maps it onto the bitmap and
    /// queues it. Returns whether the host should suppress its default
    /// handling of the event.
    pub fn handle_input(&mut self, raw: &RawPointerEvent, display: DisplayRect) -> bool {
        if !self.selection.is_armed() {
            return false;
        }
        let Some(bitmap) = self.bitmap_size() else {
            return false;
        };
        let Some(input) = self.normalizer.normalize(raw, true) else {
            return false;
        };
        self.queue.push_back(QueuedGesture {
            phase: input.gesture.phase,
            point: map_to_bitmap(input.gesture.client, display, bitmap),
        });
        input.prevent_default
    }

    /// Queues a gesture step that is already in bitmap coordinates.
    pub fn push_gesture(&mut self, phase: GesturePhase, point: Point) {
        self.queue.push_back(QueuedGesture { phase, point });
    }

    /// Drains the gesture queue through the selection state machine,
    /// committing a blur when a large enough drag ends.
    pub fn pump(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(gesture) = self.queue.pop_front() {
            // Drags may run past the canvas; only the part on the bitmap counts.
            let point = match self.bitmap_size() {
                Some(bitmap) => clamp_to_bitmap(gesture.point, bitmap),
                None => gesture.point,
            };
            match self.selection.handle(gesture.phase, point) {
                SelectionUpdate::Ignored => {}
                SelectionUpdate::Started => events.push(SessionEvent::DragStarted),
                SelectionUpdate::Preview(rect) => events.push(SessionEvent::Preview(rect)),
                SelectionUpdate::Commit(rect) => {
                    if let Some(outcome) = self.commit_blur(rect) {
                        events.push(SessionEvent::Blurred(outcome));
                    }
                }
                SelectionUpdate::Rejected(_) => events.push(SessionEvent::SelectionDiscarded),
            }
        }
        events
    }

    /// Blurs `rect` of `working` from `original`. `None` with no image loaded.
    pub fn commit_blur(&mut self, rect: Rect) -> Option<BlurOutcome> {
        let radius = self.config.blur_radius;
        let min_size = self.config.min_selection_size;
        let (working, original) = self.buffers.edit()?;
        let outcome = apply_blur(working, original, rect, radius, min_size, self.filter.as_ref());
        log::info!("Blur committed: {:?}", outcome);
        Some(outcome)
    }

    /// Rectangle to outline over the canvas while a drag is in progress.
    pub fn preview_rect(&self) -> Option<Rect> {
        self.selection.preview()
    }

    /// Encodes `working` as PNG under a timestamped file name.
    pub fn export(&self) -> Result<ExportedImage, ExportError> {
        let bytes = self.buffers.export_working()?;
        Ok(ExportedImage {
            file_name: export_file_name(&self.config.export_prefix, SystemTime::now()),
            bytes,
        })
    }

    /// Back to the pre-load state.
    pub fn reset(&mut self) {
        self.buffers.reset();
        self.clear_selection();
        log::info!("Session reset");
    }

    /// Ends the session.
    pub fn destroy(mut self) {
        self.reset();
    }

    pub fn handle(&self) -> Option<ImageHandle> {
        self.buffers.handle()
    }

    pub fn working(&self) -> Option<&RgbaImage> {
        self.buffers.working()
    }

    pub fn original(&self) -> Option<&RgbaImage> {
        self.buffers.original()
    }

    /// Changes whenever the displayed bitmap changes.
    pub fn revision(&self) -> u64 {
        self.buffers.revision()
    }

    fn bitmap_size(&self) -> Option<BitmapSize> {
        self.buffers.handle().map(|h| BitmapSize {
            width: h.width,
            height: h.height,
        })
    }

    fn clear_selection(&mut self) {
        self.selection.disarm();
        self.normalizer.clear();
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::BoxBlur;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder, Rgba};

    fn png(width: u32, height: u32) -> ImageSource {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            let v = if (x + y) % 2 == 0 { 20 } else { 230 };
            Rgba([v, v, v, 255])
        });
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
            .unwrap();
        ImageSource::new("test.png", bytes)
    }

    fn session() -> EditorSession {
        EditorSession::with_filter(EditorConfig::default(), Box::new(BoxBlur))
    }

    #[test]
    fn blur_mode_needs_an_image() {
        let mut s = session();
        assert!(!s.can_enter_blur_mode());
        assert_eq!(s.enter_blur_mode(), Err(ArmError::NoImage));
        s.load_image(&png(50, 50)).unwrap();
        assert!(s.can_enter_blur_mode());
        s.enter_blur_mode().unwrap();
        assert!(!s.can_enter_blur_mode());
    }

    #[test]
    fn input_is_mapped_through_display_scaling() {
        let mut s = session();
        s.load_image(&png(200, 100)).unwrap();
        s.enter_blur_mode().unwrap();
        // Canvas shown at half size, offset on screen.
        let display = DisplayRect {
            left: 40.0,
            top: 20.0,
            width: 100.0,
            height: 50.0,
        };
        assert!(s.handle_input(&RawPointerEvent::MouseDown(Point::new(45.0, 25.0)), display));
        s.handle_input(&RawPointerEvent::MouseMove(Point::new(95.0, 50.0)), display);
        let events = s.pump();
        assert_eq!(
            events,
            vec![
                SessionEvent::DragStarted,
                SessionEvent::Preview(Rect {
                    x: 10.0,
                    y: 10.0,
                    width: 100.0,
                    height: 50.0
                })
            ]
        );
    }

    #[test]
    fn preview_does_not_touch_working() {
        let mut s = session();
        s.load_image(&png(60, 60)).unwrap();
        s.enter_blur_mode().unwrap();
        let rev = s.revision();
        s.push_gesture(GesturePhase::Start, Point::new(0.0, 0.0));
        for i in 1..20 {
            s.push_gesture(GesturePhase::Move, Point::new(i as f32 * 2.0, i as f32 * 2.0));
        }
        s.pump();
        assert_eq!(s.revision(), rev);
        assert_eq!(s.working(), s.original());
        assert!(s.preview_rect().is_some());
    }

    #[test]
    fn input_without_image_is_dropped() {
        let mut s = session();
        let display = DisplayRect {
            left: 0.0,
            top: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(!s.handle_input(&RawPointerEvent::MouseDown(Point::new(1.0, 1.0)), display));
        assert!(s.pump().is_empty());
    }

    #[test]
    fn input_while_idle_is_not_queued() {
        let mut s = session();
        s.load_image(&png(60, 60)).unwrap();
        let display = DisplayRect {
            left: 0.0,
            top: 0.0,
            width: 60.0,
            height: 60.0,
        };
        assert!(!s.handle_input(&RawPointerEvent::MouseDown(Point::new(5.0, 5.0)), display));
        assert!(!s.handle_input(&RawPointerEvent::MouseMove(Point::new(40.0, 40.0)), display));
        assert!(s.queue.is_empty());

        // Arming afterwards starts from a clean slate.
        s.enter_blur_mode().unwrap();
        assert!(s.pump().is_empty());
        assert_eq!(s.mode(), SelectionMode::Armed);
    }

    #[test]
    fn drag_points_are_pinned_to_the_bitmap() {
        let mut s = session();
        s.load_image(&png(200, 100)).unwrap();
        s.enter_blur_mode().unwrap();
        s.push_gesture(GesturePhase::Start, Point::new(150.0, 20.0));
        s.push_gesture(GesturePhase::Move, Point::new(400.0, -30.0));
        let events = s.pump();
        assert_eq!(
            events.last(),
            Some(&SessionEvent::Preview(Rect {
                x: 150.0,
                y: 0.0,
                width: 50.0,
                height: 20.0
            }))
        );
    }

    #[test]
    fn loading_abandons_selection() {
        let mut s = session();
        s.load_image(&png(60, 60)).unwrap();
        s.enter_blur_mode().unwrap();
        s.push_gesture(GesturePhase::Start, Point::new(0.0, 0.0));
        s.pump();
        s.load_image(&png(30, 30)).unwrap();
        assert_eq!(s.mode(), SelectionMode::Idle);
        assert_eq!(s.handle().map(|h| h.width), Some(30));
    }

    #[test]
    fn export_names_file_with_prefix() {
        let mut s = session();
        assert!(matches!(s.export(), Err(ExportError::NoImage)));
        s.load_image(&png(8, 8)).unwrap();
        let exported = s.export().unwrap();
        assert!(exported.file_name.starts_with("blurred-image-"));
        assert!(exported.file_name.ends_with(".png"));
        assert_eq!(exported.bytes, s.buffers.export_working().unwrap());
    }
}
