use std::borrow::Cow;

use eframe::egui;
use image::imageops;

use regionblur::buffer::{ACCEPTED_EXTENSIONS, ImageSource};
use regionblur::geometry::{BitmapSize, DisplayRect, Point, fit_within, map_to_device};
use regionblur::input::{RawPointerEvent, TouchPoint};
use regionblur::selection::SelectionMode;
use regionblur::{EditorConfig, EditorSession, SessionEvent};

pub struct RegionBlur {
    session: EditorSession,
    texture: Option<egui::TextureHandle>,
    texture_revision: u64,
    status: Option<String>,
}

impl RegionBlur {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: EditorConfig) -> Self {
        let session = EditorSession::new(config);
        Self {
            texture_revision: session.revision(),
            session,
            texture: None,
            status: None,
        }
    }

    fn open(&mut self, source: ImageSource) {
        match self.session.load_image(&source) {
            Ok(_) => self.status = None,
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn open_path(&mut self, path: &std::path::Path) {
        match self.session.load_path(path) {
            Ok(_) => self.status = None,
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn export(&mut self) {
        let exported = match self.session.export() {
            Ok(exported) => exported,
            Err(err) => {
                self.status = Some(err.to_string());
                return;
            }
        };
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(&exported.file_name)
            .save_file()
        {
            if let Err(err) = exported.save(&path) {
                log::error!("Export failed: {}", err);
                self.status = Some(err.to_string());
            }
        }
    }

    /// Keeps the GPU texture in step with the working buffer.
    ///
    /// Bitmaps larger than the GPU allows are shown downscaled; the buffers
    /// themselves stay at full resolution.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        if self.session.revision() == self.texture_revision {
            return;
        }
        self.texture_revision = self.session.revision();
        let Some(working) = self.session.working() else {
            self.texture = None;
            return;
        };
        let full = BitmapSize {
            width: working.width(),
            height: working.height(),
        };
        let max_side = ctx.input(|i| i.max_texture_side) as u32;
        let shown = fit_within(full, max_side);
        let pixels = if shown == full {
            Cow::Borrowed(working)
        } else {
            log::debug!(
                "Displaying {}x{} bitmap as {}x{}",
                full.width,
                full.height,
                shown.width,
                shown.height
            );
            Cow::Owned(imageops::thumbnail(working, shown.width, shown.height))
        };
        let size = [shown.width as _, shown.height as _];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_raw());
        if let Some(texture) = self.texture.as_mut().filter(|t| t.size() == size) {
            texture.set(color_image, egui::TextureOptions::LINEAR);
        } else {
            self.texture =
                Some(ctx.load_texture("working", color_image, egui::TextureOptions::LINEAR));
        }
    }

    /// Forwards this frame's pointer and touch events to the session.
    fn feed_input(&mut self, ctx: &egui::Context, image_rect: egui::Rect) {
        let display = DisplayRect {
            left: image_rect.min.x,
            top: image_rect.min.y,
            width: image_rect.width(),
            height: image_rect.height(),
        };
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            if let Some(raw) = translate(&event, image_rect) {
                if self.session.handle_input(&raw, display) {
                    ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
                }
            }
        }
        for event in self.session.pump() {
            if let SessionEvent::Blurred(outcome) = event {
                log::debug!("Canvas updated: {:?}", outcome);
            }
        }
    }
}

/// Raw event for the session, or `None` for events it has no use for.
/// Presses only count when they land on the image.
fn translate(event: &egui::Event, image_rect: egui::Rect) -> Option<RawPointerEvent> {
    let point = |pos: egui::Pos2| Point::new(pos.x, pos.y);
    match event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            ..
        } => {
            if *pressed {
                image_rect
                    .contains(*pos)
                    .then(|| RawPointerEvent::MouseDown(point(*pos)))
            } else {
                Some(RawPointerEvent::MouseUp(point(*pos)))
            }
        }
        egui::Event::PointerMoved(pos) => Some(RawPointerEvent::MouseMove(point(*pos))),
        egui::Event::Touch { id, phase, pos, .. } => {
            let touch = vec![TouchPoint {
                id: id.0,
                pos: point(*pos),
            }];
            match phase {
                egui::TouchPhase::Start => image_rect
                    .contains(*pos)
                    .then(|| RawPointerEvent::TouchStart { touches: touch }),
                egui::TouchPhase::Move => Some(RawPointerEvent::TouchMove { touches: touch }),
                egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                    Some(RawPointerEvent::TouchEnd { changed: touch })
                }
            }
        }
        _ => None,
    }
}

impl eframe::App for RegionBlur {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle dropped files
        if !ctx.input(|i| i.raw.dropped_files.is_empty()) {
            let dropped_files = ctx.input(|i| i.raw.dropped_files.clone());
            if let Some(file) = dropped_files.first() {
                if let Some(path) = &file.path {
                    self.open_path(path);
                } else if let Some(bytes) = &file.bytes {
                    let mut source = ImageSource::new(file.name.clone(), bytes.to_vec());
                    if !file.mime.is_empty() {
                        source = source.with_mime(file.mime.clone());
                    }
                    self.open(source);
                }
            }
        }

        self.sync_texture(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Image", ACCEPTED_EXTENSIONS)
                        .pick_file()
                    {
                        self.open_path(&path);
                    }
                }

                let can_blur = self.session.can_enter_blur_mode();
                if ui.add_enabled(can_blur, egui::Button::new("Blur Region")).clicked() {
                    if let Err(err) = self.session.enter_blur_mode() {
                        self.status = Some(err.to_string());
                    }
                }

                let loaded = self.session.handle().is_some();
                if ui.add_enabled(loaded, egui::Button::new("Export PNG")).clicked() {
                    self.export();
                }
                if ui.add_enabled(loaded, egui::Button::new("Reset")).clicked() {
                    self.session.reset();
                    self.status = None;
                }

                if self.session.mode() != SelectionMode::Idle {
                    ui.label("Drag over the image to select a region");
                }
            });

            if let Some(status) = &self.status {
                ui.colored_label(egui::Color32::LIGHT_RED, status);
            }
            ui.separator();

            // Re-sync after button actions (load/reset) so this frame draws
            // the current buffer.
            self.sync_texture(ui.ctx());

            let Some(texture) = &self.texture else {
                ui.centered_and_justified(|ui| {
                    ui.label("Open or drop a PNG or JPEG image");
                });
                return;
            };

            const PADDING: f32 = 20.0;
            let available_size = ui.available_size();
            let max_size = available_size - egui::vec2(PADDING * 2.0, PADDING * 2.0);
            // Lay out by bitmap size; the texture may be a downscaled copy.
            let Some(handle) = self.session.handle() else {
                return;
            };
            let bitmap = BitmapSize {
                width: handle.width,
                height: handle.height,
            };
            let image_size = egui::vec2(bitmap.width as f32, bitmap.height as f32);

            // Calculate size to fit within available space while maintaining aspect ratio
            let scale = (max_size.x / image_size.x).min(max_size.y / image_size.y);
            let display_size = image_size * scale;

            let total_display_size = display_size + egui::vec2(PADDING * 2.0, PADDING * 2.0);

            // Manual centering
            let x_offset = (available_size.x - total_display_size.x) / 2.0;
            let y_offset = (available_size.y - total_display_size.y) / 2.0;
            let start_pos = ui.cursor().min + egui::vec2(x_offset.max(0.0), y_offset.max(0.0));

            let target_rect = egui::Rect::from_min_size(start_pos, total_display_size);

            let _ = ui.allocate_rect(target_rect, egui::Sense::drag());
            let painter = ui.painter_at(target_rect);

            let image_rect = egui::Rect::from_min_size(
                target_rect.min + egui::vec2(PADDING, PADDING),
                display_size,
            );

            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            self.feed_input(ui.ctx(), image_rect);

            // Selection preview, redrawn from scratch every frame.
            if let Some(rect) = self.session.preview_rect() {
                let display = DisplayRect {
                    left: image_rect.min.x,
                    top: image_rect.min.y,
                    width: image_rect.width(),
                    height: image_rect.height(),
                };
                let min = map_to_device(Point::new(rect.x, rect.y), display, bitmap);
                let max = map_to_device(Point::new(rect.right(), rect.bottom()), display, bitmap);
                let screen_rect = egui::Rect::from_min_max(
                    egui::pos2(min.x, min.y),
                    egui::pos2(max.x, max.y),
                );
                let outline = [
                    screen_rect.left_top(),
                    screen_rect.right_top(),
                    screen_rect.right_bottom(),
                    screen_rect.left_bottom(),
                    screen_rect.left_top(),
                ];
                painter.rect_stroke(
                    screen_rect,
                    0.0,
                    egui::Stroke::new(1.0, egui::Color32::BLACK),
                );
                painter.extend(egui::Shape::dashed_line(
                    &outline,
                    egui::Stroke::new(1.5, egui::Color32::WHITE),
                    6.0,
                    4.0,
                ));
            }
        });

        // A committed blur shows up on the next frame.
        if self.session.revision() != self.texture_revision {
            ctx.request_repaint();
        }
    }
}
