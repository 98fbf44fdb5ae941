//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map
//! lives here rather than in the host shell so every front-end resolves
//! the same bindings.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Cut,
    Copy,
    Paste,
    SelectAll,
    UnselectAll,

    // ── View ──
    FitAll,
    ZoomSelected,

    // ── Navigation ──
    OpenParent,
    OpenSelected,
    HistoryBack,
    HistoryForward,

    // ── Layout ──
    AlignLeft,
    AlignRight,
    AlignTop,
    AlignBottom,
}

/// Resolves key events into shortcut actions.
///
/// `ctrl` and `meta` are interchangeable so the bindings behave the same
/// on macOS and elsewhere.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the host's key name (e.g. `"z"`, `"Delete"`, `"Home"`).
    /// Returns `None` if the combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.ctrl || modifiers.meta;
        let shift = modifiers.shift;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "l" | "L" => Some(ShortcutAction::AlignLeft),
                "r" | "R" => Some(ShortcutAction::AlignRight),
                "t" | "T" => Some(ShortcutAction::AlignTop),
                "b" | "B" => Some(ShortcutAction::AlignBottom),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "d" | "D" => Some(ShortcutAction::UnselectAll),
                "x" | "X" => Some(ShortcutAction::Cut),
                "c" | "C" => Some(ShortcutAction::Copy),
                "v" | "V" => Some(ShortcutAction::Paste),
                _ => None,
            };
        }

        if shift {
            return match key {
                "f" | "F" => Some(ShortcutAction::ZoomSelected),
                _ => None,
            };
        }

        match key {
            "f" | "F" => Some(ShortcutAction::FitAll),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "ArrowUp" => Some(ShortcutAction::OpenParent),
            "ArrowDown" | "Enter" => Some(ShortcutAction::OpenSelected),
            "ArrowLeft" => Some(ShortcutAction::HistoryBack),
            "ArrowRight" => Some(ShortcutAction::HistoryForward),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        }
    }

    fn cmd_shift() -> Modifiers {
        Modifiers {
            ctrl: true,
            shift: true,
            ..Modifiers::NONE
        }
    }

    #[test]
    fn resolve_undo_redo() {
        assert_eq!(
            ShortcutMap::resolve("z", cmd()),
            Some(ShortcutAction::Undo)
        );
        assert_eq!(
            ShortcutMap::resolve("z", cmd_shift()),
            Some(ShortcutAction::Redo)
        );
        assert_eq!(
            ShortcutMap::resolve("y", cmd()),
            Some(ShortcutAction::Redo)
        );
        // Meta works like ctrl.
        assert_eq!(
            ShortcutMap::resolve(
                "z",
                Modifiers {
                    meta: true,
                    ..Modifiers::NONE
                }
            ),
            Some(ShortcutAction::Undo)
        );
    }

    #[test]
    fn resolve_framing() {
        assert_eq!(
            ShortcutMap::resolve("f", Modifiers::NONE),
            Some(ShortcutAction::FitAll)
        );
        assert_eq!(
            ShortcutMap::resolve("f", Modifiers::shift()),
            Some(ShortcutAction::ZoomSelected)
        );
    }

    #[test]
    fn resolve_navigation() {
        assert_eq!(
            ShortcutMap::resolve("ArrowUp", Modifiers::NONE),
            Some(ShortcutAction::OpenParent)
        );
        assert_eq!(
            ShortcutMap::resolve("ArrowLeft", Modifiers::NONE),
            Some(ShortcutAction::HistoryBack)
        );
    }

    #[test]
    fn resolve_alignment() {
        assert_eq!(
            ShortcutMap::resolve("l", cmd_shift()),
            Some(ShortcutAction::AlignLeft)
        );
        assert_eq!(
            ShortcutMap::resolve("b", cmd_shift()),
            Some(ShortcutAction::AlignBottom)
        );
    }

    #[test]
    fn resolve_clipboard_and_selection() {
        assert_eq!(ShortcutMap::resolve("x", cmd()), Some(ShortcutAction::Cut));
        assert_eq!(ShortcutMap::resolve("c", cmd()), Some(ShortcutAction::Copy));
        assert_eq!(
            ShortcutMap::resolve("v", cmd()),
            Some(ShortcutAction::Paste)
        );
        assert_eq!(
            ShortcutMap::resolve("a", cmd()),
            Some(ShortcutAction::SelectAll)
        );
        assert_eq!(
            ShortcutMap::resolve("d", cmd()),
            Some(ShortcutAction::UnselectAll)
        );
    }

    #[test]
    fn unknown_combo_resolves_to_none() {
        assert_eq!(ShortcutMap::resolve("q", Modifiers::NONE), None);
        assert_eq!(ShortcutMap::resolve("7", cmd()), None);
    }
}
