//! Pointer input and click acceptance

use glam::Vec2;

/// Pointer snapshot polled by the host once per tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    /// Position in playfield coordinates
    pub position: Vec2,
    /// Primary button held
    pub pressed: bool,
}

impl PointerState {
    /// No pointer activity at all
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn pressed_at(position: Vec2) -> Self {
        Self {
            position,
            pressed: true,
        }
    }

    pub fn released_at(position: Vec2) -> Self {
        Self {
            position,
            pressed: false,
        }
    }
}

/// Turns held-button polling into discrete clicks
///
/// A click is accepted on the press edge (up last tick, down now) and only
/// if at least `dwell` seconds passed since the previous accepted click.
/// Holding the button never produces a second click.
#[derive(Debug, Clone)]
pub struct ClickGate {
    dwell: f64,
    was_pressed: bool,
    last_click: Option<f64>,
}

impl ClickGate {
    pub fn new(dwell: f64) -> Self {
        Self {
            dwell,
            was_pressed: false,
            last_click: None,
        }
    }

    /// Feed this tick's pointer; returns the click position if one was accepted
    pub fn poll(&mut self, pointer: &PointerState, now: f64) -> Option<Vec2> {
        let edge = pointer.pressed && !self.was_pressed;
        self.was_pressed = pointer.pressed;
        if !edge {
            return None;
        }

        let rested = self.last_click.is_none_or(|last| now - last >= self.dwell);
        if !rested {
            log::trace!("Click ignored inside dwell interval");
            return None;
        }
        self.last_click = Some(now);
        Some(pointer.position)
    }

    /// Forget click history for a new session
    ///
    /// The button counts as held until a release is seen, so a press that
    /// started before the reset never becomes a click.
    pub fn reset(&mut self) {
        self.was_pressed = true;
        self.last_click = None;
    }
}
