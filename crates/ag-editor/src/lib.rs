//! ag-editor — interaction engine of the animation graph editor.
//!
//! Everything here sits between a host UI shell and the `ag-core` model:
//!
//! - [`canvas`]: pointer-driven editing of one open level — selection,
//!   marquee, node moves, connection drags, deletes, alignment, framing,
//!   and drag-and-drop node creation.
//! - [`navigate`]: the hierarchy tree with filters, canvas-linked
//!   selection, level history, and the cut/copy/paste clipboard.
//! - [`groups`]: node-group management for the open level.
//! - [`menu`]: capability-driven context menus and the command groups
//!   behind each entry.
//! - [`visual`]: the per-level mirror the canvas paints and hit-tests.
//! - [`payload`], [`input`], [`shortcuts`], [`scheduler`]: drop parsing,
//!   normalized input, key bindings, and deferred refreshes.
//!
//! Every user gesture ends in exactly one `CommandGroup` submitted
//! through the injected `CommandExecutor`, so gestures map one-to-one to
//! undo steps.

pub mod canvas;
pub mod groups;
pub mod input;
pub mod menu;
pub mod navigate;
pub mod payload;
pub mod scheduler;
pub mod shortcuts;
pub mod visual;

pub use canvas::{Alignment, Camera, Canvas, ConnectFeedback};
pub use groups::{ClearOutcome, GroupsPanel};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use menu::{build_context_menu, MenuAction, MenuEntry};
pub use navigate::{Navigator, TreeFilter, TreeRow};
pub use payload::{parse_payload, DropEntry, DropPayload, PayloadError};
pub use scheduler::{DeferredSlot, DeferredTask};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use visual::{EdgeRef, PortSide, Rect, VisualGraph, VisualNode};
