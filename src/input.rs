//! Pointer and touch input normalization.
//!
//! Mouse and touch streams from the host toolkit are folded into a single
//! start/move/end gesture stream carrying one client-space point.

use crate::geometry::Point;

/// A touch point as reported by the host toolkit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub pos: Point,
}

/// Raw input events in the shape host toolkits deliver them.
#[derive(Clone, Debug, PartialEq)]
pub enum RawPointerEvent {
    MouseDown(Point),
    MouseMove(Point),
    MouseUp(Point),
    /// `touches` holds every point currently on the surface
    TouchStart { touches: Vec<TouchPoint> },
    TouchMove { touches: Vec<TouchPoint> },
    /// `changed` holds the points that just lifted
    TouchEnd { changed: Vec<TouchPoint> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePhase {
    Start,
    Move,
    End,
}

/// One step of a drag gesture in client (device) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureEvent {
    pub phase: GesturePhase,
    pub client: Point,
}

/// Result of normalizing one raw event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedInput {
    pub gesture: GestureEvent,
    /// The host should suppress its default handling (scroll-on-drag and the
    /// like) for this event.
    pub prevent_default: bool,
}

/// Stateful normalizer. Only the first finger down is followed; further
/// simultaneous touches are ignored until it lifts.
#[derive(Debug, Default)]
pub struct InputNormalizer {
    primary_touch: Option<u64>,
}

impl InputNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates `raw` into a gesture event. `armed` tells whether selection
    /// is currently interested in drags, which controls `prevent_default`.
    pub fn normalize(&mut self, raw: &RawPointerEvent, armed: bool) -> Option<NormalizedInput> {
        let gesture = match raw {
            RawPointerEvent::MouseDown(p) => self.mouse(GesturePhase::Start, *p)?,
            RawPointerEvent::MouseMove(p) => self.mouse(GesturePhase::Move, *p)?,
            RawPointerEvent::MouseUp(p) => self.mouse(GesturePhase::End, *p)?,
            RawPointerEvent::TouchStart { touches } => {
                if self.primary_touch.is_some() {
                    return None;
                }
                let first = touches.first()?;
                self.primary_touch = Some(first.id);
                GestureEvent {
                    phase: GesturePhase::Start,
                    client: first.pos,
                }
            }
            RawPointerEvent::TouchMove { touches } => {
                let touch = self.find_primary(touches)?;
                GestureEvent {
                    phase: GesturePhase::Move,
                    client: touch.pos,
                }
            }
            RawPointerEvent::TouchEnd { changed } => {
                let touch = self.find_primary(changed)?;
                self.primary_touch = None;
                GestureEvent {
                    phase: GesturePhase::End,
                    client: touch.pos,
                }
            }
        };
        Some(NormalizedInput {
            gesture,
            prevent_default: armed,
        })
    }

    /// Forgets any tracked touch, e.g. when the surface is torn down.
    pub fn clear(&mut self) {
        self.primary_touch = None;
    }

    fn mouse(&self, phase: GesturePhase, client: Point) -> Option<GestureEvent> {
        // Hosts that emulate mouse events for touches would otherwise feed the
        // same finger in twice.
        if self.primary_touch.is_some() {
            return None;
        }
        Some(GestureEvent { phase, client })
    }

    fn find_primary<'a>(&self, touches: &'a [TouchPoint]) -> Option<&'a TouchPoint> {
        let id = self.primary_touch?;
        touches.iter().find(|t| t.id == id)
    }
}
