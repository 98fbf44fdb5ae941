//! Input abstraction layer.
//!
//! Normalizes host-toolkit mouse and keyboard events into a unified
//! `InputEvent` enum consumed by the canvas.

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Modifiers {
            shift: true,
            ..Self::NONE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// A normalized input event in canvas (screen) coordinates.
#[derive(Debug, Clone)]
pub enum InputEvent {
    PointerDown {
        x: f32,
        y: f32,
        button: PointerButton,
        modifiers: Modifiers,
    },

    PointerMove {
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    PointerUp {
        x: f32,
        y: f32,
        button: PointerButton,
        modifiers: Modifiers,
    },

    /// Scroll / pinch-zoom. `zoom` is a factor (1.0 = no change).
    Scroll { dx: f32, dy: f32, zoom: f32 },

    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }
}
