//! ag-core — animation graph model and command engine.
//!
//! The crate holds everything the editor front-end mutates through:
//!
//! - [`model`]: the hierarchical [`AnimGraph`] (state machines and blend
//!   trees), typed ports, data connections, transitions, and node groups.
//! - [`command`]: the structured [`Command`] protocol and [`CommandGroup`]
//!   batching. A group is the unit of execution and undo.
//! - [`executor`]: the transactional [`CommandHistory`] with inverse-based
//!   undo/redo, behind the [`CommandExecutor`] trait the views depend on.
//! - [`id`]: interned node ids and stable connection/transition ids.

pub mod command;
pub mod error;
pub mod executor;
pub mod id;
pub mod model;

pub use command::{Command, CommandGroup, GroupAction};
pub use error::CommandError;
pub use executor::{CommandExecutor, CommandHistory};
pub use id::{ConnectionId, NodeId, TransitionId};
pub use model::{
    AnimGraph, AnimNode, Color, DataConnection, GraphEvent, NodeCapabilities, NodeGroup, NodeKind,
    Port, PortDataType, Transition,
};
