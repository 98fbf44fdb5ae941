//! Structured command protocol.
//!
//! Every model mutation is expressed as a [`Command`] and submitted inside
//! a [`CommandGroup`]. Groups are the unit of execution, undo, and redo:
//! a multi-node move, a connection replace, or a paste each travel as one
//! group and commit (or fail) atomically.
//!
//! Commands address nodes by display name, which the executor keeps unique
//! across the graph. [`Command::to_command_string`] renders the classic
//! text form used in logs and the command history panel.

use crate::id::{ConnectionId, TransitionId};
use crate::model::{Color, NodeKind};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Membership edit carried by [`Command::AdjustNodeGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupAction {
    /// Add the named nodes, removing each from its previous group first.
    Add(Vec<String>),
    Remove(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Create a node under `parent`. The executor rejects duplicate names,
    /// so callers pre-uniquify with `AnimGraph::generate_unique_name`.
    CreateNode {
        parent: String,
        kind: NodeKind,
        name: String,
        position: (i32, i32),
        attributes: Vec<(String, String)>,
    },

    /// Remove a single node. Attached connections, transitions, and group
    /// memberships must already be gone; cascade ordering is the caller's
    /// job (see the canvas delete path).
    RemoveNode { name: String },

    /// Adjust node properties; `None` fields are left untouched.
    AdjustNode {
        name: String,
        new_name: Option<String>,
        position: Option<(i32, i32)>,
        enabled: Option<bool>,
        visualize: Option<bool>,
        collapsed: Option<bool>,
    },

    /// Create a data connection or a transition, depending on the target's
    /// parent level. A `None` source makes a wildcard transition.
    ///
    /// `transition_id`/`connection_id` are normally `None` (fresh id); redo
    /// and inverse commands pin them so views keyed by id survive a round
    /// trip.
    CreateConnection {
        source: Option<String>,
        target: String,
        source_port: usize,
        target_port: usize,
        start_offset: (i32, i32),
        end_offset: (i32, i32),
        transition_id: Option<TransitionId>,
        connection_id: Option<ConnectionId>,
    },

    RemoveConnection { id: ConnectionId },

    RemoveTransition { id: TransitionId },

    /// Adjust transition properties; `None` fields are left untouched.
    AdjustTransition {
        id: TransitionId,
        disabled: Option<bool>,
        start_offset: Option<(i32, i32)>,
        end_offset: Option<(i32, i32)>,
    },

    /// Designate (or with `None` clear) the entry state of a state machine
    /// level. User paths always pass `Some`; the clear form exists for
    /// inverse commands.
    SetEntryState {
        state_machine: String,
        entry: Option<String>,
    },

    /// Override (or with `None` clear) the virtual final node of a blend
    /// tree level.
    SetVirtualFinal {
        blend_tree: String,
        node: Option<String>,
    },

    AddNodeGroup {
        level: String,
        name: String,
        color: Color,
    },

    /// Remove a group; its member nodes are untouched.
    RemoveNodeGroup { level: String, name: String },

    AdjustNodeGroup {
        level: String,
        name: String,
        new_name: Option<String>,
        color: Option<Color>,
        visible: Option<bool>,
        action: Option<GroupAction>,
    },
}

impl Command {
    /// Render the classic single-line text form of this command.
    pub fn to_command_string(&self) -> String {
        let mut s = String::new();
        match self {
            Command::CreateNode {
                parent,
                kind,
                name,
                position,
                attributes,
            } => {
                write!(
                    s,
                    "AnimGraphCreateNode -parentName \"{parent}\" -type \"{}\" -name \"{name}\" -xPos {} -yPos {}",
                    kind.type_name(),
                    position.0,
                    position.1
                )
                .ok();
                for (key, value) in attributes {
                    write!(s, " -{key} \"{value}\"").ok();
                }
            }
            Command::RemoveNode { name } => {
                write!(s, "AnimGraphRemoveNode -name \"{name}\"").ok();
            }
            Command::AdjustNode {
                name,
                new_name,
                position,
                enabled,
                visualize,
                collapsed,
            } => {
                write!(s, "AnimGraphAdjustNode -name \"{name}\"").ok();
                if let Some(new_name) = new_name {
                    write!(s, " -newName \"{new_name}\"").ok();
                }
                if let Some((x, y)) = position {
                    write!(s, " -xPos {x} -yPos {y}").ok();
                }
                if let Some(enabled) = enabled {
                    write!(s, " -enabled {}", *enabled as i32).ok();
                }
                if let Some(visualize) = visualize {
                    write!(s, " -visualize {}", *visualize as i32).ok();
                }
                if let Some(collapsed) = collapsed {
                    write!(s, " -collapsed {}", *collapsed as i32).ok();
                }
            }
            Command::CreateConnection {
                source,
                target,
                source_port,
                target_port,
                start_offset,
                end_offset,
                ..
            } => {
                write!(s, "AnimGraphCreateConnection").ok();
                if let Some(source) = source {
                    write!(s, " -sourceNode \"{source}\"").ok();
                }
                write!(
                    s,
                    " -targetNode \"{target}\" -sourcePort {source_port} -targetPort {target_port} \
                     -startOffsetX {} -startOffsetY {} -endOffsetX {} -endOffsetY {}",
                    start_offset.0, start_offset.1, end_offset.0, end_offset.1
                )
                .ok();
            }
            Command::RemoveConnection { id } => {
                write!(s, "AnimGraphRemoveConnection -connectionID {}", id.0).ok();
            }
            Command::RemoveTransition { id } => {
                write!(s, "AnimGraphRemoveTransition -transitionID {}", id.0).ok();
            }
            Command::AdjustTransition {
                id,
                disabled,
                start_offset,
                end_offset,
            } => {
                write!(s, "AnimGraphAdjustTransition -transitionID {}", id.0).ok();
                if let Some(disabled) = disabled {
                    write!(s, " -isDisabled {}", *disabled as i32).ok();
                }
                if let Some((x, y)) = start_offset {
                    write!(s, " -startOffsetX {x} -startOffsetY {y}").ok();
                }
                if let Some((x, y)) = end_offset {
                    write!(s, " -endOffsetX {x} -endOffsetY {y}").ok();
                }
            }
            Command::SetEntryState {
                state_machine,
                entry,
            } => {
                write!(s, "AnimGraphSetEntryState -stateMachine \"{state_machine}\"").ok();
                if let Some(entry) = entry {
                    write!(s, " -entryNodeName \"{entry}\"").ok();
                }
            }
            Command::SetVirtualFinal { blend_tree, node } => {
                write!(s, "AnimGraphSetVirtualFinalNode -blendTree \"{blend_tree}\"").ok();
                if let Some(node) = node {
                    write!(s, " -name \"{node}\"").ok();
                }
            }
            Command::AddNodeGroup { level, name, color } => {
                write!(
                    s,
                    "AnimGraphAddNodeGroup -level \"{level}\" -name \"{name}\" -color \"{}\"",
                    color.to_hex()
                )
                .ok();
            }
            Command::RemoveNodeGroup { level, name } => {
                write!(s, "AnimGraphRemoveNodeGroup -level \"{level}\" -name \"{name}\"").ok();
            }
            Command::AdjustNodeGroup {
                level,
                name,
                new_name,
                color,
                visible,
                action,
            } => {
                write!(s, "AnimGraphAdjustNodeGroup -level \"{level}\" -name \"{name}\"").ok();
                if let Some(new_name) = new_name {
                    write!(s, " -newName \"{new_name}\"").ok();
                }
                if let Some(color) = color {
                    write!(s, " -color \"{}\"", color.to_hex()).ok();
                }
                if let Some(visible) = visible {
                    write!(s, " -isVisible {}", *visible as i32).ok();
                }
                if let Some(action) = action {
                    let (verb, names) = match action {
                        GroupAction::Add(names) => ("add", names),
                        GroupAction::Remove(names) => ("remove", names),
                    };
                    write!(s, " -nodeAction \"{verb}\" -nodeNames \"{}\"", names.join(";")).ok();
                }
            }
        }
        s
    }
}

/// An ordered batch of commands executed and undone as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandGroup {
    pub description: String,
    pub commands: Vec<Command>,
}

impl CommandGroup {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            commands: Vec::new(),
        }
    }

    pub fn single(description: impl Into<String>, command: Command) -> Self {
        Self {
            description: description.into(),
            commands: vec![command],
        }
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_node_command_string() {
        let cmd = Command::CreateNode {
            parent: "Root".into(),
            kind: NodeKind::Motion,
            name: "Walk".into(),
            position: (100, -40),
            attributes: vec![("motionId".into(), "walk_loop".into())],
        };
        assert_eq!(
            cmd.to_command_string(),
            "AnimGraphCreateNode -parentName \"Root\" -type \"Motion\" -name \"Walk\" \
             -xPos 100 -yPos -40 -motionId \"walk_loop\""
        );
    }

    #[test]
    fn adjust_node_only_writes_set_fields() {
        let cmd = Command::AdjustNode {
            name: "Walk".into(),
            new_name: None,
            position: Some((10, 20)),
            enabled: None,
            visualize: None,
            collapsed: None,
        };
        assert_eq!(
            cmd.to_command_string(),
            "AnimGraphAdjustNode -name \"Walk\" -xPos 10 -yPos 20"
        );
    }

    #[test]
    fn wildcard_connection_omits_source() {
        let cmd = Command::CreateConnection {
            source: None,
            target: "Jump".into(),
            source_port: 0,
            target_port: 0,
            start_offset: (0, 0),
            end_offset: (0, 30),
            transition_id: None,
            connection_id: None,
        };
        let text = cmd.to_command_string();
        assert!(!text.contains("-sourceNode"));
        assert!(text.contains("-targetNode \"Jump\""));
        assert!(text.contains("-endOffsetY 30"));
    }

    #[test]
    fn group_membership_command_string() {
        let cmd = Command::AdjustNodeGroup {
            level: "Root".into(),
            name: "Locomotion".into(),
            new_name: None,
            color: None,
            visible: None,
            action: Some(GroupAction::Add(vec!["Walk".into(), "Run".into()])),
        };
        assert_eq!(
            cmd.to_command_string(),
            "AnimGraphAdjustNodeGroup -level \"Root\" -name \"Locomotion\" \
             -nodeAction \"add\" -nodeNames \"Walk;Run\""
        );
    }
}
