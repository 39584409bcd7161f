//! Blur-mode selection state machine.
//!
//! `Idle` until the user asks to blur, `Armed` while waiting for a drag,
//! `Dragging` while a drag is in progress. Every drag that ends returns the
//! machine to `Idle`, so each arming yields at most one committed region.

use crate::error::ArmError;
use crate::geometry::{Point, Rect};
use crate::input::GesturePhase;

/// Transient data for one pointer-down to pointer-up cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragGesture {
    pub anchor: Point,
    pub current: Point,
    pub active: bool,
}

impl DragGesture {
    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.anchor, self.current)
    }

    /// Outline to draw for this gesture; nothing once the pointer is up.
    pub fn preview(&self) -> Option<Rect> {
        self.active.then(|| self.rect())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SelectionMode {
    #[default]
    Idle,
    Armed,
    Dragging(DragGesture),
}

/// What a gesture event did to the selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionUpdate {
    /// Not in a state that cares about this event
    Ignored,
    Started,
    /// Live preview rectangle changed
    Preview(Rect),
    /// Drag finished with a large enough rectangle; blur it
    Commit(Rect),
    /// Drag finished too small; dropped without complaint
    Rejected(Rect),
}

#[derive(Debug)]
pub struct SelectionMachine {
    mode: SelectionMode,
    min_size: f32,
}

impl SelectionMachine {
    pub fn new(min_size: f32) -> Self {
        Self {
            mode: SelectionMode::Idle,
            min_size,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// True while drags are interpreted as selections.
    pub fn is_armed(&self) -> bool {
        !matches!(self.mode, SelectionMode::Idle)
    }

    /// Whether an arming request would currently be honored.
    pub fn can_arm(&self, image_loaded: bool) -> bool {
        image_loaded && self.mode == SelectionMode::Idle
    }

    /// Enters blur mode.
    pub fn arm(&mut self, image_loaded: bool) -> Result<(), ArmError> {
        if !image_loaded {
            return Err(ArmError::NoImage);
        }
        if self.is_armed() {
            return Err(ArmError::AlreadyArmed);
        }
        self.mode = SelectionMode::Armed;
        log::debug!("Blur mode armed");
        Ok(())
    }

    /// Leaves blur mode and drops any drag in progress.
    pub fn disarm(&mut self) {
        self.mode = SelectionMode::Idle;
    }

    /// Rectangle to outline while dragging.
    pub fn preview(&self) -> Option<Rect> {
        match self.mode {
            SelectionMode::Dragging(drag) => drag.preview(),
            _ => None,
        }
    }

    /// Feeds one gesture event, `point` being in bitmap space.
    pub fn handle(&mut self, phase: GesturePhase, point: Point) -> SelectionUpdate {
        match (self.mode, phase) {
            (SelectionMode::Armed, GesturePhase::Start) => {
                self.mode = SelectionMode::Dragging(DragGesture {
                    anchor: point,
                    current: point,
                    active: true,
                });
                log::trace!("Drag started at ({}, {})", point.x, point.y);
                SelectionUpdate::Started
            }
            (SelectionMode::Dragging(mut drag), GesturePhase::Move) => {
                drag.current = point;
                self.mode = SelectionMode::Dragging(drag);
                SelectionUpdate::Preview(drag.rect())
            }
            (SelectionMode::Dragging(mut drag), GesturePhase::End) => {
                drag.current = point;
                drag.active = false;
                self.mode = SelectionMode::Idle;
                let rect = drag.rect();
                if rect.exceeds(self.min_size) {
                    SelectionUpdate::Commit(rect)
                } else {
                    log::debug!("Selection {}x{} too small, ignored", rect.width, rect.height);
                    SelectionUpdate::Rejected(rect)
                }
            }
            _ => SelectionUpdate::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn arming_requires_an_image() {
        let mut m = SelectionMachine::new(10.0);
        assert_eq!(m.arm(false), Err(ArmError::NoImage));
        assert_eq!(m.mode(), SelectionMode::Idle);
        assert!(!m.can_arm(false));
    }

    #[test]
    fn only_one_arming_is_honored() {
        let mut m = SelectionMachine::new(10.0);
        m.arm(true).unwrap();
        assert_eq!(m.arm(true), Err(ArmError::AlreadyArmed));
        m.handle(GesturePhase::Start, p(0.0, 0.0));
        assert_eq!(m.arm(true), Err(ArmError::AlreadyArmed));
        assert!(!m.can_arm(true));
    }

    #[test]
    fn gestures_are_ignored_unless_armed() {
        let mut m = SelectionMachine::new(10.0);
        assert_eq!(m.handle(GesturePhase::Start, p(1.0, 1.0)), SelectionUpdate::Ignored);
        assert_eq!(m.handle(GesturePhase::End, p(50.0, 50.0)), SelectionUpdate::Ignored);
        m.arm(true).unwrap();
        assert_eq!(m.handle(GesturePhase::Move, p(5.0, 5.0)), SelectionUpdate::Ignored);
        assert_eq!(m.mode(), SelectionMode::Armed);
    }

    #[test]
    fn drag_produces_normalized_preview_then_commit() {
        let mut m = SelectionMachine::new(10.0);
        m.arm(true).unwrap();
        assert_eq!(m.handle(GesturePhase::Start, p(110.0, 60.0)), SelectionUpdate::Started);
        let expected = Rect {
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 50.0,
        };
        assert_eq!(m.handle(GesturePhase::Move, p(10.0, 10.0)), SelectionUpdate::Preview(expected));
        assert_eq!(m.preview(), Some(expected));
        assert_eq!(m.handle(GesturePhase::End, p(10.0, 10.0)), SelectionUpdate::Commit(expected));
        assert_eq!(m.mode(), SelectionMode::Idle);
        assert_eq!(m.preview(), None);
    }

    #[test]
    fn small_drag_is_rejected_and_exits() {
        let mut m = SelectionMachine::new(10.0);
        m.arm(true).unwrap();
        m.handle(GesturePhase::Start, p(0.0, 0.0));
        let update = m.handle(GesturePhase::End, p(10.0, 10.0));
        assert!(matches!(update, SelectionUpdate::Rejected(_)));
        assert_eq!(m.mode(), SelectionMode::Idle);
        assert!(m.can_arm(true));
    }

    #[test]
    fn one_thin_side_is_enough_to_reject() {
        let mut m = SelectionMachine::new(10.0);
        m.arm(true).unwrap();
        m.handle(GesturePhase::Start, p(0.0, 0.0));
        assert!(matches!(
            m.handle(GesturePhase::End, p(200.0, 8.0)),
            SelectionUpdate::Rejected(_)
        ));
    }

    #[test]
    fn finished_gesture_has_no_preview() {
        let mut drag = DragGesture {
            anchor: p(0.0, 0.0),
            current: p(30.0, 20.0),
            active: true,
        };
        assert_eq!(drag.preview(), Some(drag.rect()));
        drag.active = false;
        assert_eq!(drag.preview(), None);
    }

    #[test]
    fn disarm_drops_drag() {
        let mut m = SelectionMachine::new(10.0);
        m.arm(true).unwrap();
        m.handle(GesturePhase::Start, p(0.0, 0.0));
        m.disarm();
        assert_eq!(m.mode(), SelectionMode::Idle);
        assert_eq!(m.handle(GesturePhase::End, p(50.0, 50.0)), SelectionUpdate::Ignored);
    }
}
