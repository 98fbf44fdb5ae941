//! Transactional command execution with undo/redo.
//!
//! [`CommandHistory`] is the single writer of the [`AnimGraph`]. Each
//! submitted [`CommandGroup`] either applies completely or not at all: the
//! first failing command rolls back the already applied prefix and discards
//! its buffered events, so views never observe a half-applied group.
//!
//! Undo is inverse-based rather than snapshot-based. Applying a command
//! yields the list of commands that exactly reverses it; undoing a group
//! replays those lists in reverse command order. Connection and transition
//! ids are pinned into the recorded commands so a full undo/redo round trip
//! restores the ids that views key their geometry on.

use crate::command::{Command, CommandGroup, GroupAction};
use crate::error::CommandError;
use crate::id::NodeId;
use crate::model::{AnimGraph, AnimNode, GraphEvent, NodeKind, Transition};
use std::collections::HashSet;

/// Abstraction the editor components submit their groups through. Tests
/// inject recording executors; the application wires in [`CommandHistory`].
pub trait CommandExecutor {
    /// Execute `group` atomically against `graph`. Returns the group's
    /// description on success.
    fn execute(&mut self, graph: &mut AnimGraph, group: CommandGroup)
        -> Result<String, CommandError>;
}

/// One committed group: the pinned forward commands and, per command, the
/// inverse command list that reverses it.
#[derive(Debug, Clone)]
struct HistoryEntry {
    description: String,
    commands: Vec<Command>,
    inverses: Vec<Vec<Command>>,
}

/// Undo/redo stacks over committed command groups.
#[derive(Debug)]
pub struct CommandHistory {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_depth: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl CommandHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Descriptions of undoable groups, most recent last. Feeds the
    /// command history panel.
    pub fn undo_descriptions(&self) -> Vec<&str> {
        self.undo_stack.iter().map(|e| e.description.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Undo the most recent group. Events for the reversal are published
    /// like any other change so views resynchronize.
    pub fn undo(&mut self, graph: &mut AnimGraph) -> Result<String, CommandError> {
        let entry = self.undo_stack.pop().ok_or(CommandError::NothingToUndo)?;
        for inverse_list in entry.inverses.iter().rev() {
            for cmd in inverse_list {
                // An inverse that fails means the history no longer matches
                // the graph; surface it instead of guessing.
                apply(graph, cmd, true)?;
            }
        }
        log::debug!("undo: {}", entry.description);
        let description = entry.description.clone();
        self.redo_stack.push(entry);
        Ok(description)
    }

    /// Re-apply the most recently undone group.
    pub fn redo(&mut self, graph: &mut AnimGraph) -> Result<String, CommandError> {
        let mut entry = self.redo_stack.pop().ok_or(CommandError::NothingToRedo)?;
        let mut inverses = Vec::with_capacity(entry.commands.len());
        for cmd in &entry.commands {
            let (_, inverse) = apply(graph, cmd, true)?;
            inverses.push(inverse);
        }
        entry.inverses = inverses;
        log::debug!("redo: {}", entry.description);
        let description = entry.description.clone();
        self.undo_stack.push(entry);
        Ok(description)
    }
}

impl CommandExecutor for CommandHistory {
    fn execute(
        &mut self,
        graph: &mut AnimGraph,
        group: CommandGroup,
    ) -> Result<String, CommandError> {
        if group.is_empty() {
            return Err(CommandError::EmptyGroup);
        }
        let event_mark = graph.events_mark();
        let mut pinned = Vec::with_capacity(group.len());
        let mut inverses: Vec<Vec<Command>> = Vec::with_capacity(group.len());

        for cmd in &group.commands {
            match apply(graph, cmd, false) {
                Ok((pinned_cmd, inverse)) => {
                    log::debug!("{}", pinned_cmd.to_command_string());
                    pinned.push(pinned_cmd);
                    inverses.push(inverse);
                }
                Err(err) => {
                    // Roll back the applied prefix and drop its events.
                    for inverse_list in inverses.iter().rev() {
                        for inv in inverse_list {
                            if let Err(rollback_err) = apply(graph, inv, true) {
                                log::error!(
                                    "rollback of \"{}\" failed: {rollback_err}",
                                    group.description
                                );
                            }
                        }
                    }
                    graph.truncate_events(event_mark);
                    log::error!("group \"{}\" rejected: {err}", group.description);
                    return Err(err);
                }
            }
        }

        self.undo_stack.push(HistoryEntry {
            description: group.description.clone(),
            commands: pinned,
            inverses,
        });
        if self.undo_stack.len() > self.max_depth {
            let excess = self.undo_stack.len() - self.max_depth;
            self.undo_stack.drain(0..excess);
        }
        self.redo_stack.clear();
        Ok(group.description)
    }
}

// ─── Lookup helpers ──────────────────────────────────────────────────────

fn require_node(graph: &AnimGraph, name: &str) -> Result<NodeId, CommandError> {
    graph
        .id_by_name(name)
        .ok_or_else(|| CommandError::UnknownNode(name.to_string()))
}

fn node_name(graph: &AnimGraph, id: NodeId) -> String {
    graph.node(id).map(|n| n.name.clone()).unwrap_or_default()
}

/// Validate that `kind` may be created under `parent_kind`.
fn check_child_kind(parent_kind: NodeKind, kind: NodeKind) -> Result<(), CommandError> {
    let parent_caps = parent_kind.capabilities();
    if !parent_caps.can_have_children {
        return Err(CommandError::KindNotAllowedHere(kind.type_name()));
    }
    if parent_kind == NodeKind::StateMachine && !kind.capabilities().can_act_as_state {
        return Err(CommandError::KindNotAllowedHere(kind.type_name()));
    }
    Ok(())
}

/// An `AdjustNode` restoring any non-default flags of `node`, or `None`
/// when all flags are at their defaults.
fn flags_adjust(node: &AnimNode) -> Option<Command> {
    if node.enabled && !node.visualize && !node.collapsed {
        return None;
    }
    Some(Command::AdjustNode {
        name: node.name.clone(),
        new_name: None,
        position: None,
        enabled: (!node.enabled).then_some(false),
        visualize: node.visualize.then_some(true),
        collapsed: node.collapsed.then_some(true),
    })
}

// ─── Command application ─────────────────────────────────────────────────

/// Apply one command. Returns the command with generated ids pinned in,
/// plus the inverse command list that reverses it (applied in order).
///
/// `internal` marks inverse/undo/redo replay: user-facing restrictions
/// such as the non-deletable final node are waived there.
fn apply(
    graph: &mut AnimGraph,
    cmd: &Command,
    internal: bool,
) -> Result<(Command, Vec<Command>), CommandError> {
    match cmd {
        Command::CreateNode {
            parent,
            kind,
            name,
            position,
            attributes,
        } => {
            if name.is_empty() {
                return Err(CommandError::EmptyName);
            }
            if !graph.is_name_free(name) {
                return Err(CommandError::DuplicateName(name.clone()));
            }
            let parent_id = require_node(graph, parent)?;
            let parent_kind = graph
                .node(parent_id)
                .map(|n| n.kind)
                .ok_or_else(|| CommandError::UnknownNode(parent.clone()))?;
            check_child_kind(parent_kind, *kind)?;

            let mut node = AnimNode::new(name.clone(), *kind);
            node.position = *position;
            node.attributes = attributes.clone();
            let id = graph.insert_node(parent_id, node);
            graph.push_event(GraphEvent::NodeCreated(id));

            Ok((cmd.clone(), vec![Command::RemoveNode { name: name.clone() }]))
        }

        Command::RemoveNode { name } => {
            let id = require_node(graph, name)?;
            if graph.is_root(id) {
                return Err(CommandError::NotDeletable(name.clone()));
            }
            if !internal {
                let deletable = graph
                    .node(id)
                    .map(|n| n.capabilities().deletable)
                    .unwrap_or(false);
                if !deletable {
                    return Err(CommandError::NotDeletable(name.clone()));
                }
            }

            let subtree = graph.subtree(id);
            let subtree_set: HashSet<NodeId> = subtree.iter().copied().collect();
            let mut inverse = Vec::new();

            // Recreate nodes, parents first, with their saved flags.
            for &nid in &subtree {
                if let Some(node) = graph.node(nid) {
                    let parent = graph
                        .parent_of(nid)
                        .map(|p| node_name(graph, p))
                        .unwrap_or_default();
                    inverse.push(Command::CreateNode {
                        parent,
                        kind: node.kind,
                        name: node.name.clone(),
                        position: node.position,
                        attributes: node.attributes.clone(),
                    });
                    if let Some(adjust) = flags_adjust(node) {
                        inverse.push(adjust);
                    }
                }
            }

            // Connections and transitions touching any removed node,
            // internal or crossing the subtree boundary.
            let removed_connections: Vec<_> = graph
                .connections
                .iter()
                .filter(|c| {
                    subtree_set.contains(&c.source_node) || subtree_set.contains(&c.target_node)
                })
                .cloned()
                .collect();
            for c in &removed_connections {
                inverse.push(Command::CreateConnection {
                    source: Some(node_name(graph, c.source_node)),
                    target: node_name(graph, c.target_node),
                    source_port: c.source_port,
                    target_port: c.target_port,
                    start_offset: (0, 0),
                    end_offset: (0, 0),
                    transition_id: None,
                    connection_id: Some(c.id),
                });
            }
            let removed_transitions: Vec<Transition> = graph
                .transitions
                .iter()
                .filter(|t| {
                    t.source.map(|s| subtree_set.contains(&s)).unwrap_or(false)
                        || subtree_set.contains(&t.target)
                })
                .cloned()
                .collect();
            for t in &removed_transitions {
                inverse.push(Command::CreateConnection {
                    source: t.source.map(|s| node_name(graph, s)),
                    target: node_name(graph, t.target),
                    source_port: 0,
                    target_port: 0,
                    start_offset: t.start_offset,
                    end_offset: t.end_offset,
                    transition_id: Some(t.id),
                    connection_id: None,
                });
                if t.disabled {
                    inverse.push(Command::AdjustTransition {
                        id: t.id,
                        disabled: Some(true),
                        start_offset: None,
                        end_offset: None,
                    });
                }
            }

            // Group restores: groups living at a removed level come back
            // whole; outside groups only get their members back.
            let mut dead_groups = Vec::new();
            let mut touched_levels = Vec::new();
            for g in &graph.groups {
                let overlapping: Vec<String> = g
                    .members
                    .iter()
                    .filter(|m| subtree_set.contains(m))
                    .map(|m| node_name(graph, *m))
                    .collect();
                if subtree_set.contains(&g.level) {
                    let level_name = node_name(graph, g.level);
                    inverse.push(Command::AddNodeGroup {
                        level: level_name.clone(),
                        name: g.name.clone(),
                        color: g.color,
                    });
                    if !g.visible || !g.members.is_empty() {
                        inverse.push(Command::AdjustNodeGroup {
                            level: level_name,
                            name: g.name.clone(),
                            new_name: None,
                            color: None,
                            visible: (!g.visible).then_some(false),
                            action: (!g.members.is_empty()).then(|| {
                                GroupAction::Add(
                                    g.members.iter().map(|m| node_name(graph, *m)).collect(),
                                )
                            }),
                        });
                    }
                    dead_groups.push((g.level, g.name.clone()));
                } else if !overlapping.is_empty() {
                    inverse.push(Command::AdjustNodeGroup {
                        level: node_name(graph, g.level),
                        name: g.name.clone(),
                        new_name: None,
                        color: None,
                        visible: None,
                        action: Some(GroupAction::Add(overlapping)),
                    });
                    touched_levels.push(g.level);
                }
            }

            // Entry states and virtual finals referencing the subtree.
            for (sm, entry) in graph.entry_state_entries() {
                if subtree_set.contains(&sm) || subtree_set.contains(&entry) {
                    inverse.push(Command::SetEntryState {
                        state_machine: node_name(graph, sm),
                        entry: Some(node_name(graph, entry)),
                    });
                }
            }
            for (tree, node) in graph.virtual_final_entries() {
                if subtree_set.contains(&tree) || subtree_set.contains(&node) {
                    inverse.push(Command::SetVirtualFinal {
                        blend_tree: node_name(graph, tree),
                        node: Some(node_name(graph, node)),
                    });
                }
            }

            // Now mutate: edges first, then groups, then nodes bottom-up.
            for c in &removed_connections {
                graph.connections.retain(|x| x.id != c.id);
                graph.push_event(GraphEvent::ConnectionRemoved(c.id));
            }
            for t in &removed_transitions {
                graph.transitions.retain(|x| x.id != t.id);
                graph.push_event(GraphEvent::TransitionRemoved(t.id));
            }
            for (level, gname) in &dead_groups {
                graph.groups.retain(|g| !(g.level == *level && g.name == *gname));
            }
            for g in graph.groups.iter_mut() {
                g.members.retain(|m| !subtree_set.contains(m));
            }
            for level in touched_levels {
                graph.push_event(GraphEvent::GroupsChanged(level));
            }
            for &nid in subtree.iter().rev() {
                graph.extract_node(nid);
                graph.push_event(GraphEvent::NodeRemoved(nid));
            }

            Ok((cmd.clone(), inverse))
        }

        Command::AdjustNode {
            name,
            new_name,
            position,
            enabled,
            visualize,
            collapsed,
        } => {
            let id = require_node(graph, name)?;
            if let Some(new_name) = new_name {
                if new_name.is_empty() {
                    return Err(CommandError::EmptyName);
                }
                if new_name != name && !graph.is_name_free(new_name) {
                    return Err(CommandError::DuplicateName(new_name.clone()));
                }
            }

            let (old_position, old_enabled, old_visualize, old_collapsed) = {
                let node = graph
                    .node(id)
                    .ok_or_else(|| CommandError::UnknownNode(name.clone()))?;
                (node.position, node.enabled, node.visualize, node.collapsed)
            };

            let inverse = Command::AdjustNode {
                name: new_name.clone().unwrap_or_else(|| name.clone()),
                new_name: new_name.is_some().then(|| name.clone()),
                position: position.is_some().then_some(old_position),
                enabled: enabled.is_some().then_some(old_enabled),
                visualize: visualize.is_some().then_some(old_visualize),
                collapsed: collapsed.is_some().then_some(old_collapsed),
            };

            if let Some(new_name) = new_name {
                if new_name != name {
                    graph.rename_node(id, new_name.clone());
                    graph.push_event(GraphEvent::NodeRenamed(id));
                }
            }
            if let Some(node) = graph.node_mut(id) {
                if let Some(pos) = position {
                    node.position = *pos;
                }
                if let Some(v) = enabled {
                    node.enabled = *v;
                }
                if let Some(v) = visualize {
                    node.visualize = *v;
                }
                if let Some(v) = collapsed {
                    node.collapsed = *v;
                }
            }
            if position.is_some() {
                graph.push_event(GraphEvent::NodeMoved(id));
            }
            if enabled.is_some() || visualize.is_some() || collapsed.is_some() {
                graph.push_event(GraphEvent::NodeFlagsChanged(id));
            }

            Ok((cmd.clone(), vec![inverse]))
        }

        Command::CreateConnection {
            source,
            target,
            source_port,
            target_port,
            start_offset,
            end_offset,
            transition_id,
            connection_id,
        } => {
            let target_id = require_node(graph, target)?;
            let level = graph
                .parent_of(target_id)
                .ok_or_else(|| CommandError::Rejected("cannot connect the root node".into()))?;
            let level_kind = graph
                .node(level)
                .map(|n| n.kind)
                .ok_or_else(|| CommandError::UnknownNode(target.clone()))?;

            let source_id = source.as_deref().map(|s| require_node(graph, s)).transpose()?;
            if source_id == Some(target_id) {
                return Err(CommandError::SelfConnection(target.clone()));
            }
            if let Some(sid) = source_id {
                if graph.parent_of(sid) != Some(level) {
                    return Err(CommandError::CrossLevelTransition {
                        source_name: source.clone().unwrap_or_default(),
                        target: target.clone(),
                    });
                }
            }

            match level_kind {
                NodeKind::StateMachine => {
                    // State transitions skip the port direction/type checks;
                    // only wildcards may omit the source.
                    let id = transition_id.unwrap_or_else(crate::id::TransitionId::fresh);
                    graph.transitions.push(Transition {
                        id,
                        source: source_id,
                        target: target_id,
                        start_offset: *start_offset,
                        end_offset: *end_offset,
                        disabled: false,
                    });
                    graph.push_event(GraphEvent::TransitionAdded(id));

                    let mut pinned = cmd.clone();
                    if let Command::CreateConnection { transition_id, .. } = &mut pinned {
                        *transition_id = Some(id);
                    }
                    Ok((pinned, vec![Command::RemoveTransition { id }]))
                }
                NodeKind::BlendTree => {
                    let source_name = source
                        .clone()
                        .ok_or_else(|| {
                            CommandError::Rejected(
                                "blend tree connections require a source node".into(),
                            )
                        })?;
                    let sid = source_id.ok_or_else(|| CommandError::UnknownNode(source_name))?;

                    let source_kind = graph
                        .node(sid)
                        .map(|n| n.kind)
                        .ok_or_else(|| CommandError::UnknownNode(target.clone()))?;
                    let target_kind = graph
                        .node(target_id)
                        .map(|n| n.kind)
                        .ok_or_else(|| CommandError::UnknownNode(target.clone()))?;

                    let outputs = source_kind.output_ports();
                    let inputs = target_kind.input_ports();
                    let out_port =
                        outputs
                            .get(*source_port)
                            .ok_or_else(|| CommandError::PortOutOfRange {
                                node: node_name(graph, sid),
                                port: *source_port,
                            })?;
                    let in_port =
                        inputs
                            .get(*target_port)
                            .ok_or_else(|| CommandError::PortOutOfRange {
                                node: target.clone(),
                                port: *target_port,
                            })?;
                    if !in_port.data_type.is_compatible_with(out_port.data_type) {
                        return Err(CommandError::PortTypeMismatch {
                            source_name: node_name(graph, sid),
                            target: target.clone(),
                            source_type: out_port.data_type,
                            target_type: in_port.data_type,
                        });
                    }
                    // One incoming connection per input port. Replacing goes
                    // through a remove+create group built by the caller.
                    if graph.input_connection(target_id, *target_port).is_some() {
                        return Err(CommandError::Rejected(format!(
                            "input port {target_port} of \"{target}\" is already connected"
                        )));
                    }

                    let id = connection_id.unwrap_or_else(crate::id::ConnectionId::fresh);
                    graph.connections.push(crate::model::DataConnection {
                        id,
                        source_node: sid,
                        source_port: *source_port,
                        target_node: target_id,
                        target_port: *target_port,
                    });
                    graph.push_event(GraphEvent::ConnectionAdded(id));

                    let mut pinned = cmd.clone();
                    if let Command::CreateConnection { connection_id, .. } = &mut pinned {
                        *connection_id = Some(id);
                    }
                    Ok((pinned, vec![Command::RemoveConnection { id }]))
                }
                _ => Err(CommandError::Rejected(format!(
                    "\"{}\" does not live in a connectable level",
                    target
                ))),
            }
        }

        Command::RemoveConnection { id } => {
            let c = graph
                .connection(*id)
                .cloned()
                .ok_or(CommandError::UnknownConnection(*id))?;
            let inverse = Command::CreateConnection {
                source: Some(node_name(graph, c.source_node)),
                target: node_name(graph, c.target_node),
                source_port: c.source_port,
                target_port: c.target_port,
                start_offset: (0, 0),
                end_offset: (0, 0),
                transition_id: None,
                connection_id: Some(c.id),
            };
            graph.connections.retain(|x| x.id != *id);
            graph.push_event(GraphEvent::ConnectionRemoved(*id));
            Ok((cmd.clone(), vec![inverse]))
        }

        Command::RemoveTransition { id } => {
            let t = graph
                .transition(*id)
                .cloned()
                .ok_or(CommandError::UnknownTransition(*id))?;
            let mut inverse = vec![Command::CreateConnection {
                source: t.source.map(|s| node_name(graph, s)),
                target: node_name(graph, t.target),
                source_port: 0,
                target_port: 0,
                start_offset: t.start_offset,
                end_offset: t.end_offset,
                transition_id: Some(t.id),
                connection_id: None,
            }];
            if t.disabled {
                inverse.push(Command::AdjustTransition {
                    id: t.id,
                    disabled: Some(true),
                    start_offset: None,
                    end_offset: None,
                });
            }
            graph.transitions.retain(|x| x.id != *id);
            graph.push_event(GraphEvent::TransitionRemoved(*id));
            Ok((cmd.clone(), inverse))
        }

        Command::AdjustTransition {
            id,
            disabled,
            start_offset,
            end_offset,
        } => {
            let old = graph
                .transition(*id)
                .cloned()
                .ok_or(CommandError::UnknownTransition(*id))?;
            let inverse = Command::AdjustTransition {
                id: *id,
                disabled: disabled.is_some().then_some(old.disabled),
                start_offset: start_offset.is_some().then_some(old.start_offset),
                end_offset: end_offset.is_some().then_some(old.end_offset),
            };
            if let Some(t) = graph.transition_mut(*id) {
                if let Some(v) = disabled {
                    t.disabled = *v;
                }
                if let Some(v) = start_offset {
                    t.start_offset = *v;
                }
                if let Some(v) = end_offset {
                    t.end_offset = *v;
                }
            }
            graph.push_event(GraphEvent::TransitionAdjusted(*id));
            Ok((cmd.clone(), vec![inverse]))
        }

        Command::SetEntryState {
            state_machine,
            entry,
        } => {
            let sm = require_node(graph, state_machine)?;
            let sm_kind = graph
                .node(sm)
                .map(|n| n.kind)
                .ok_or_else(|| CommandError::UnknownNode(state_machine.clone()))?;
            if sm_kind != NodeKind::StateMachine {
                return Err(CommandError::NotAStateMachine(state_machine.clone()));
            }
            let entry_id = match entry {
                Some(entry) => {
                    let id = require_node(graph, entry)?;
                    if graph.parent_of(id) != Some(sm) {
                        return Err(CommandError::Rejected(format!(
                            "\"{entry}\" is not a state of \"{state_machine}\""
                        )));
                    }
                    Some(id)
                }
                None => None,
            };

            let inverse = Command::SetEntryState {
                state_machine: state_machine.clone(),
                entry: graph.entry_state(sm).map(|e| node_name(graph, e)),
            };
            graph.set_entry_state(sm, entry_id);
            graph.push_event(GraphEvent::EntryStateChanged(sm));
            Ok((cmd.clone(), vec![inverse]))
        }

        Command::SetVirtualFinal { blend_tree, node } => {
            let tree = require_node(graph, blend_tree)?;
            let tree_kind = graph
                .node(tree)
                .map(|n| n.kind)
                .ok_or_else(|| CommandError::UnknownNode(blend_tree.clone()))?;
            if tree_kind != NodeKind::BlendTree {
                return Err(CommandError::NotABlendTree(blend_tree.clone()));
            }
            let node_id = match node {
                Some(name) => {
                    let id = require_node(graph, name)?;
                    if graph.parent_of(id) != Some(tree) {
                        return Err(CommandError::Rejected(format!(
                            "\"{name}\" is not a child of \"{blend_tree}\""
                        )));
                    }
                    let has_pose = graph
                        .node(id)
                        .map(|n| n.capabilities().has_output_pose)
                        .unwrap_or(false);
                    if !has_pose {
                        return Err(CommandError::Rejected(format!(
                            "\"{name}\" has no pose output"
                        )));
                    }
                    Some(id)
                }
                None => None,
            };

            let inverse = Command::SetVirtualFinal {
                blend_tree: blend_tree.clone(),
                node: graph.virtual_final(tree).map(|n| node_name(graph, n)),
            };
            graph.set_virtual_final(tree, node_id);
            graph.push_event(GraphEvent::VirtualFinalChanged(tree));
            Ok((cmd.clone(), vec![inverse]))
        }

        Command::AddNodeGroup { level, name, color } => {
            if name.is_empty() {
                return Err(CommandError::EmptyName);
            }
            let level_id = require_node(graph, level)?;
            if graph.group(level_id, name).is_some() {
                return Err(CommandError::DuplicateGroup(name.clone()));
            }
            graph.groups.push(crate::model::NodeGroup {
                name: name.clone(),
                level: level_id,
                color: *color,
                visible: true,
                members: Vec::new(),
            });
            graph.push_event(GraphEvent::GroupsChanged(level_id));
            Ok((
                cmd.clone(),
                vec![Command::RemoveNodeGroup {
                    level: level.clone(),
                    name: name.clone(),
                }],
            ))
        }

        Command::RemoveNodeGroup { level, name } => {
            let level_id = require_node(graph, level)?;
            let g = graph
                .group(level_id, name)
                .cloned()
                .ok_or_else(|| CommandError::UnknownGroup(name.clone()))?;

            let mut inverse = vec![Command::AddNodeGroup {
                level: level.clone(),
                name: g.name.clone(),
                color: g.color,
            }];
            if !g.visible || !g.members.is_empty() {
                inverse.push(Command::AdjustNodeGroup {
                    level: level.clone(),
                    name: g.name.clone(),
                    new_name: None,
                    color: None,
                    visible: (!g.visible).then_some(false),
                    action: (!g.members.is_empty()).then(|| {
                        GroupAction::Add(g.members.iter().map(|m| node_name(graph, *m)).collect())
                    }),
                });
            }
            graph
                .groups
                .retain(|x| !(x.level == level_id && x.name == *name));
            graph.push_event(GraphEvent::GroupsChanged(level_id));
            Ok((cmd.clone(), inverse))
        }

        Command::AdjustNodeGroup {
            level,
            name,
            new_name,
            color,
            visible,
            action,
        } => {
            let level_id = require_node(graph, level)?;
            let old = graph
                .group(level_id, name)
                .cloned()
                .ok_or_else(|| CommandError::UnknownGroup(name.clone()))?;

            if let Some(new_name) = new_name {
                if new_name.is_empty() {
                    return Err(CommandError::EmptyName);
                }
                if new_name != name && graph.group(level_id, new_name).is_some() {
                    return Err(CommandError::DuplicateGroup(new_name.clone()));
                }
            }

            let final_name = new_name.clone().unwrap_or_else(|| name.clone());
            let mut inverse = Vec::new();

            // Membership first, so the inverse can address by final_name.
            match action {
                Some(GroupAction::Add(names)) => {
                    let mut added = Vec::new();
                    let mut displaced: Vec<(String, String)> = Vec::new();
                    let mut ids = Vec::new();
                    for n in names {
                        let id = require_node(graph, n)?;
                        if graph.parent_of(id) != Some(level_id) {
                            return Err(CommandError::Rejected(format!(
                                "\"{n}\" does not live at level \"{level}\""
                            )));
                        }
                        ids.push((id, n.clone()));
                    }
                    for (id, n) in ids {
                        // A node belongs to at most one group per level.
                        if let Some(prev) = graph.group_of(level_id, id) {
                            if prev.name == *name {
                                continue;
                            }
                            displaced.push((prev.name.clone(), n.clone()));
                        }
                        for g in graph.groups.iter_mut() {
                            if g.level == level_id {
                                g.members.retain(|m| *m != id);
                            }
                        }
                        if let Some(g) = graph.group_mut(level_id, name) {
                            g.members.push(id);
                        }
                        added.push(n);
                    }
                    if !added.is_empty() {
                        inverse.push(Command::AdjustNodeGroup {
                            level: level.clone(),
                            name: final_name.clone(),
                            new_name: None,
                            color: None,
                            visible: None,
                            action: Some(GroupAction::Remove(added)),
                        });
                    }
                    for (prev_group, node) in displaced {
                        inverse.push(Command::AdjustNodeGroup {
                            level: level.clone(),
                            name: prev_group,
                            new_name: None,
                            color: None,
                            visible: None,
                            action: Some(GroupAction::Add(vec![node])),
                        });
                    }
                }
                Some(GroupAction::Remove(names)) => {
                    let mut removed = Vec::new();
                    for n in names {
                        let id = require_node(graph, n)?;
                        if let Some(g) = graph.group_mut(level_id, name) {
                            let before = g.members.len();
                            g.members.retain(|m| *m != id);
                            if g.members.len() != before {
                                removed.push(n.clone());
                            }
                        }
                    }
                    if !removed.is_empty() {
                        inverse.push(Command::AdjustNodeGroup {
                            level: level.clone(),
                            name: final_name.clone(),
                            new_name: None,
                            color: None,
                            visible: None,
                            action: Some(GroupAction::Add(removed)),
                        });
                    }
                }
                None => {}
            }

            if color.is_some() || visible.is_some() || new_name.is_some() {
                inverse.push(Command::AdjustNodeGroup {
                    level: level.clone(),
                    name: final_name.clone(),
                    new_name: new_name.is_some().then(|| name.clone()),
                    color: color.is_some().then_some(old.color),
                    visible: visible.is_some().then_some(old.visible),
                    action: None,
                });
            }

            if let Some(g) = graph.group_mut(level_id, name) {
                if let Some(c) = color {
                    g.color = *c;
                }
                if let Some(v) = visible {
                    g.visible = *v;
                }
                if let Some(new_name) = new_name {
                    g.name = new_name.clone();
                }
            }
            graph.push_event(GraphEvent::GroupsChanged(level_id));
            Ok((cmd.clone(), inverse))
        }
    }
}
