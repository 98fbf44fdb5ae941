use crate::id::{ConnectionId, TransitionId};
use thiserror::Error;

/// Reasons a command group can be rejected or rolled back.
///
/// A group is atomic: the first command that fails causes every already
/// applied command of the group to be inverted, and the error is returned
/// to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command group is empty")]
    EmptyGroup,

    #[error("unknown node \"{0}\"")]
    UnknownNode(String),

    #[error("a node named \"{0}\" already exists")]
    DuplicateName(String),

    #[error("node name cannot be empty")]
    EmptyName,

    #[error("node \"{0}\" cannot be connected to itself")]
    SelfConnection(String),

    #[error("port {port} of node \"{node}\" does not exist")]
    PortOutOfRange { node: String, port: usize },

    #[error(
        "cannot connect {source_type:?} output to {target_type:?} input \
         (\"{source_name}\" -> \"{target}\")"
    )]
    PortTypeMismatch {
        source_name: String,
        target: String,
        source_type: crate::model::PortDataType,
        target_type: crate::model::PortDataType,
    },

    #[error("node \"{0}\" is not a state machine")]
    NotAStateMachine(String),

    #[error("node \"{0}\" is not a blend tree")]
    NotABlendTree(String),

    #[error("node \"{0}\" cannot act as a state")]
    NotAState(String),

    #[error("transition endpoints \"{source_name}\" and \"{target}\" are not siblings")]
    CrossLevelTransition { source_name: String, target: String },

    #[error("node kind {0} is not allowed under this parent")]
    KindNotAllowedHere(&'static str),

    #[error("unknown node group \"{0}\"")]
    UnknownGroup(String),

    #[error("a node group named \"{0}\" already exists at this level")]
    DuplicateGroup(String),

    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("unknown transition {0}")]
    UnknownTransition(TransitionId),

    #[error("node \"{0}\" cannot be deleted")]
    NotDeletable(String),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("{0}")]
    Rejected(String),
}
