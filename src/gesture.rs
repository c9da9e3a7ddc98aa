//! Pointer gesture tracking.
//!
//! A gesture is one pointer-down, any number of moves, and a pointer-up. The
//! drag mode is fixed at pointer-down from the hit test at that point and is
//! kept for the whole gesture, even once the pointer leaves the zone it
//! started in.

use crate::geometry::{CropRectangle, Point, Size};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Resizing,
    Moving,
    /// Pointer went down outside the rectangle; moves change nothing.
    Idle,
}

impl DragMode {
    /// Resize wins when the point is over both the handle and the body.
    pub fn hit_test(rect: &CropRectangle, point: Point) -> Self {
        if rect.is_over_resize_handle(point) {
            DragMode::Resizing
        } else if rect.is_over_body(point) {
            DragMode::Moving
        } else {
            DragMode::Idle
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub last_position: Point,
    pub mode: DragMode,
}

/// One pointer-move worth of work for the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragStep {
    pub mode: DragMode,
    pub dx: f32,
    pub dy: f32,
}

impl DragStep {
    /// Applies the step to `rect`; returns whether the geometry changed.
    pub fn apply_to(&self, rect: &mut CropRectangle, bounds: Size) -> bool {
        match self.mode {
            DragMode::Resizing => rect.try_resize(self.dx, self.dy, bounds),
            DragMode::Moving => rect.try_move(self.dx, self.dy, bounds),
            DragMode::Idle => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(DragSession),
}

#[derive(Debug, Default)]
pub struct GestureTracker {
    state: GestureState,
}

impl GestureTracker {
    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging(_))
    }

    /// Enters `Dragging`, deciding the mode from `point`.
    ///
    /// A second pointer-down without an intervening pointer-up restarts the
    /// gesture from the new point.
    pub fn begin(&mut self, rect: &CropRectangle, point: Point) -> DragMode {
        let mode = DragMode::hit_test(rect, point);
        log::debug!("gesture start at ({}, {}) in {mode:?} mode", point.x, point.y);
        self.state = GestureState::Dragging(DragSession {
            last_position: point,
            mode,
        });
        mode
    }

    /// Computes the delta since the last recorded position and records
    /// `point` as the new one. `None` when no gesture is active.
    pub fn advance(&mut self, point: Point) -> Option<DragStep> {
        let GestureState::Dragging(session) = &mut self.state else {
            return None;
        };
        let (dx, dy) = point.delta_from(session.last_position);
        session.last_position = point;
        Some(DragStep {
            mode: session.mode,
            dx,
            dy,
        })
    }

    /// Leaves `Dragging`; returns whether a gesture was active.
    pub fn end(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        if was_dragging {
            log::debug!("gesture end");
        }
        self.state = GestureState::Idle;
        was_dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> CropRectangle {
        CropRectangle::new(Size::new(100, 100), 10.0)
    }

    #[test]
    fn handle_takes_precedence_over_body() {
        let r = rect();
        // inside both the body and the handle zone
        let point = Point::new(98.0, 98.0);
        assert!(r.is_over_body(point));
        assert!(r.is_over_resize_handle(point));
        assert_eq!(DragMode::hit_test(&r, point), DragMode::Resizing);
        assert_eq!(DragMode::hit_test(&r, Point::new(50.0, 50.0)), DragMode::Moving);
        assert_eq!(DragMode::hit_test(&r, Point::new(150.0, 20.0)), DragMode::Idle);
    }

    #[test]
    fn moves_without_gesture_are_ignored() {
        let mut tracker = GestureTracker::default();
        assert_eq!(tracker.advance(Point::new(3.0, 4.0)), None);
        assert!(!tracker.end());
    }

    #[test]
    fn deltas_are_relative_to_previous_move() {
        let mut tracker = GestureTracker::default();
        tracker.begin(&rect(), Point::new(10.0, 10.0));
        let step = tracker.advance(Point::new(15.0, 12.0)).unwrap();
        assert_eq!((step.dx, step.dy), (5.0, 2.0));
        let step = tracker.advance(Point::new(14.0, 20.0)).unwrap();
        assert_eq!((step.dx, step.dy), (-1.0, 8.0));
        assert_eq!(step.mode, DragMode::Moving);
    }

    #[test]
    fn mode_is_held_after_leaving_the_handle() {
        let r = rect();
        let mut tracker = GestureTracker::default();
        assert_eq!(tracker.begin(&r, Point::new(100.0, 100.0)), DragMode::Resizing);
        let step = tracker.advance(Point::new(10.0, 10.0)).unwrap();
        assert_eq!(step.mode, DragMode::Resizing);
        assert!(tracker.end());
        assert_eq!(tracker.state(), GestureState::Idle);
    }

    #[test]
    fn idle_gesture_steps_change_nothing() {
        let mut r = rect();
        let before = r.clone();
        let step = DragStep {
            mode: DragMode::Idle,
            dx: 5.0,
            dy: 5.0,
        };
        assert!(!step.apply_to(&mut r, Size::new(400, 400)));
        assert_eq!(r, before);
    }
}
