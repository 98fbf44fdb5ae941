//! In-memory model of a hierarchical animation graph.
//!
//! The containment hierarchy (state machines and blend trees holding child
//! nodes) lives in a `StableDiGraph` where edges run parent → child. Data
//! connections between blend-tree nodes and state transitions are stored
//! flat, with their level derived from the endpoints' parent. Node groups
//! are named, colored tags over a subset of one level's nodes and are
//! orthogonal to topology.
//!
//! The model is read-mostly from the views' perspective: every mutation
//! goes through the command executor (`crate::executor`), which is the only
//! writer and which keeps the undo history consistent.

use crate::id::{ConnectionId, NodeId, TransitionId};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Ports ───────────────────────────────────────────────────────────────

/// Declared data type of a node port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDataType {
    Pose,
    Float,
    Int,
    Bool,
    Vector,
}

impl PortDataType {
    /// Whether a value of `source` type may be plugged into a port of this
    /// type. Identical types always match; `Float` and `Int` promote into
    /// each other.
    pub fn is_compatible_with(self, source: PortDataType) -> bool {
        if self == source {
            return true;
        }
        matches!(
            (self, source),
            (PortDataType::Float, PortDataType::Int) | (PortDataType::Int, PortDataType::Float)
        )
    }
}

/// A single input or output port on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    pub name: &'static str,
    pub data_type: PortDataType,
}

const fn port(name: &'static str, data_type: PortDataType) -> Port {
    Port { name, data_type }
}

// ─── Node kinds & capabilities ───────────────────────────────────────────

/// What a node can do, independent of any widget class hierarchy.
/// Menu enablement and drop legality dispatch on these flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeCapabilities {
    /// May be placed as a state inside a state machine.
    pub can_act_as_state: bool,
    /// Owns a child graph that can be opened and edited.
    pub can_have_children: bool,
    /// Can be toggled enabled/disabled from the editor.
    pub supports_disable: bool,
    /// Supports per-node visualization options.
    pub supports_visualization: bool,
    /// Produces a pose on its output (relevant for virtual-final selection).
    pub has_output_pose: bool,
    /// May be deleted by the user.
    pub deletable: bool,
    /// Only legal inside a sub state machine; dropped from cross-kind paste.
    pub sub_state_machine_only: bool,
}

/// The node kinds known to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    StateMachine,
    BlendTree,
    Motion,
    Blend2,
    Parameter,
    Final,
}

impl NodeKind {
    /// Stable type identifier used in command text and drop payloads.
    pub fn type_name(self) -> &'static str {
        match self {
            NodeKind::StateMachine => "StateMachine",
            NodeKind::BlendTree => "BlendTree",
            NodeKind::Motion => "Motion",
            NodeKind::Blend2 => "Blend2",
            NodeKind::Parameter => "Parameter",
            NodeKind::Final => "Final",
        }
    }

    /// Human-facing name shown in palettes and tree rows.
    pub fn palette_name(self) -> &'static str {
        match self {
            NodeKind::StateMachine => "State Machine",
            NodeKind::BlendTree => "Blend Tree",
            NodeKind::Motion => "Motion",
            NodeKind::Blend2 => "Blend Two",
            NodeKind::Parameter => "Parameter",
            NodeKind::Final => "Final Output",
        }
    }

    pub fn from_type_name(s: &str) -> Option<Self> {
        match s {
            "StateMachine" => Some(NodeKind::StateMachine),
            "BlendTree" => Some(NodeKind::BlendTree),
            "Motion" => Some(NodeKind::Motion),
            "Blend2" => Some(NodeKind::Blend2),
            "Parameter" => Some(NodeKind::Parameter),
            "Final" => Some(NodeKind::Final),
            _ => None,
        }
    }

    pub fn capabilities(self) -> NodeCapabilities {
        match self {
            NodeKind::StateMachine => NodeCapabilities {
                can_act_as_state: true,
                can_have_children: true,
                supports_disable: true,
                supports_visualization: false,
                has_output_pose: true,
                deletable: true,
                sub_state_machine_only: false,
            },
            NodeKind::BlendTree => NodeCapabilities {
                can_act_as_state: true,
                can_have_children: true,
                supports_disable: true,
                supports_visualization: false,
                has_output_pose: true,
                deletable: true,
                sub_state_machine_only: false,
            },
            NodeKind::Motion => NodeCapabilities {
                can_act_as_state: true,
                can_have_children: false,
                supports_disable: true,
                supports_visualization: true,
                has_output_pose: true,
                deletable: true,
                sub_state_machine_only: false,
            },
            NodeKind::Blend2 => NodeCapabilities {
                can_act_as_state: false,
                can_have_children: false,
                supports_disable: true,
                supports_visualization: true,
                has_output_pose: true,
                deletable: true,
                sub_state_machine_only: false,
            },
            NodeKind::Parameter => NodeCapabilities {
                can_act_as_state: false,
                can_have_children: false,
                supports_disable: false,
                supports_visualization: true,
                has_output_pose: false,
                deletable: true,
                sub_state_machine_only: false,
            },
            // The final node is created with its blend tree and lives as
            // long as the tree does.
            NodeKind::Final => NodeCapabilities {
                can_act_as_state: false,
                can_have_children: false,
                supports_disable: false,
                supports_visualization: false,
                has_output_pose: true,
                deletable: false,
                sub_state_machine_only: false,
            },
        }
    }

    pub fn input_ports(self) -> SmallVec<[Port; 4]> {
        match self {
            NodeKind::StateMachine | NodeKind::BlendTree => SmallVec::new(),
            NodeKind::Motion => SmallVec::new(),
            NodeKind::Blend2 => SmallVec::from_slice(&[
                port("Pose 1", PortDataType::Pose),
                port("Pose 2", PortDataType::Pose),
                port("Weight", PortDataType::Float),
            ]),
            NodeKind::Parameter => SmallVec::new(),
            NodeKind::Final => SmallVec::from_slice(&[port("Input Pose", PortDataType::Pose)]),
        }
    }

    pub fn output_ports(self) -> SmallVec<[Port; 2]> {
        match self {
            NodeKind::StateMachine | NodeKind::BlendTree => {
                SmallVec::from_slice(&[port("Output Pose", PortDataType::Pose)])
            }
            NodeKind::Motion => SmallVec::from_slice(&[port("Output Pose", PortDataType::Pose)]),
            NodeKind::Blend2 => SmallVec::from_slice(&[port("Output Pose", PortDataType::Pose)]),
            NodeKind::Parameter => SmallVec::from_slice(&[port("Value", PortDataType::Float)]),
            NodeKind::Final => SmallVec::new(),
        }
    }
}

// ─── Color ───────────────────────────────────────────────────────────────

/// RGBA color for node groups. Stored as 4 × u8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`; the leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let parse = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self {
                r: parse(&hex[0..2])?,
                g: parse(&hex[2..4])?,
                b: parse(&hex[4..6])?,
                a: 255,
            }),
            8 => Some(Self {
                r: parse(&hex[0..2])?,
                g: parse(&hex[2..4])?,
                b: parse(&hex[4..6])?,
                a: parse(&hex[6..8])?,
            }),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::rgb(90, 120, 200)
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// One node of the animation graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimNode {
    /// Stable identity, never reused for another node while this one lives.
    pub id: NodeId,
    /// Display name; unique across the whole graph (and therefore within
    /// the parent level), so commands can address nodes by name.
    pub name: String,
    pub kind: NodeKind,
    /// Canvas position of the node's top-left corner, in graph space.
    pub position: (i32, i32),
    pub collapsed: bool,
    pub enabled: bool,
    pub visualize: bool,
    /// Kind-specific key/value attributes (e.g. the motion id of a motion
    /// node created by dropping a motion-set entry).
    pub attributes: Vec<(String, String)>,
}

impl AnimNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId::fresh(),
            name: name.into(),
            kind,
            position: (0, 0),
            collapsed: false,
            enabled: true,
            visualize: false,
            attributes: Vec::new(),
        }
    }

    pub fn capabilities(&self) -> NodeCapabilities {
        self.kind.capabilities()
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// ─── Connections & transitions ───────────────────────────────────────────

/// A typed data connection between two blend-tree nodes.
/// A target input port holds at most one incoming connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConnection {
    pub id: ConnectionId,
    pub source_node: NodeId,
    pub source_port: usize,
    pub target_node: NodeId,
    pub target_port: usize,
}

/// A state-machine transition. Not type-checked; a `None` source makes it
/// a wildcard transition reachable from any state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: TransitionId,
    pub source: Option<NodeId>,
    pub target: NodeId,
    /// Visual attachment offset at the source end, relative to the node.
    pub start_offset: (i32, i32),
    /// Visual attachment offset at the target end. Wildcard transitions
    /// arriving at the same node are staggered through this.
    pub end_offset: (i32, i32),
    pub disabled: bool,
}

impl Transition {
    pub fn is_wildcard(&self) -> bool {
        self.source.is_none()
    }
}

/// A named, colored, visibility-toggleable tag over a subset of one
/// level's nodes. A node belongs to at most one group per level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroup {
    pub name: String,
    /// The graph level (parent node) this group belongs to.
    pub level: NodeId,
    pub color: Color,
    pub visible: bool,
    pub members: Vec<NodeId>,
}

// ─── Change notifications ────────────────────────────────────────────────

/// Notification of a committed model change. Views drain these after each
/// executed command group and resynchronize; events of a failed group are
/// discarded before anyone can observe them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    NodeCreated(NodeId),
    NodeRemoved(NodeId),
    NodeRenamed(NodeId),
    NodeMoved(NodeId),
    NodeFlagsChanged(NodeId),
    ConnectionAdded(ConnectionId),
    ConnectionRemoved(ConnectionId),
    TransitionAdded(TransitionId),
    TransitionRemoved(TransitionId),
    TransitionAdjusted(TransitionId),
    EntryStateChanged(NodeId),
    VirtualFinalChanged(NodeId),
    GroupsChanged(NodeId),
}

// ─── The graph ───────────────────────────────────────────────────────────

/// The complete animation graph: hierarchy, connections, transitions,
/// groups, and per-level entry/virtual-final bookkeeping.
#[derive(Debug, Clone)]
pub struct AnimGraph {
    graph: StableDiGraph<AnimNode, ()>,
    root: NodeIndex,
    id_index: HashMap<NodeId, NodeIndex>,
    name_index: HashMap<String, NodeId>,
    pub connections: Vec<DataConnection>,
    pub transitions: Vec<Transition>,
    pub groups: Vec<NodeGroup>,
    /// State machine level → designated entry state.
    entry_states: HashMap<NodeId, NodeId>,
    /// Blend tree level → virtual final override.
    virtual_finals: HashMap<NodeId, NodeId>,
    events: Vec<GraphEvent>,
}

impl AnimGraph {
    /// Create a graph holding only the root state machine.
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_node = AnimNode::new("Root", NodeKind::StateMachine);
        let root_id = root_node.id;
        let root_name = root_node.name.clone();
        let root = graph.add_node(root_node);

        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);
        let mut name_index = HashMap::new();
        name_index.insert(root_name, root_id);

        Self {
            graph,
            root,
            id_index,
            name_index,
            connections: Vec::new(),
            transitions: Vec::new(),
            groups: Vec::new(),
            entry_states: HashMap::new(),
            virtual_finals: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.graph[self.root].id
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root_id()
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&AnimNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut AnimNode> {
        self.id_index.get(&id).copied().map(|idx| &mut self.graph[idx])
    }

    /// Find a node anywhere in the graph by display name.
    pub fn node_by_name(&self, name: &str) -> Option<&AnimNode> {
        self.name_index.get(name).and_then(|id| self.node(*id))
    }

    pub fn id_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied()
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        let idx = *self.id_index.get(&id)?;
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
            .map(|pidx| self.graph[pidx].id)
    }

    /// Children of a level in deterministic (insertion) order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.id_index.get(&id) else {
            return Vec::new();
        };
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children.into_iter().map(|c| self.graph[c].id).collect()
    }

    /// The node and all its descendants, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if self.node(n).is_some() {
                out.push(n);
                let mut kids = self.children(n);
                kids.reverse();
                stack.extend(kids);
            }
        }
        out
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    // ─── Name bookkeeping ────────────────────────────────────────────────

    /// Whether `name` is free across the whole graph. Global uniqueness
    /// implies per-level uniqueness and keeps name-addressed commands
    /// unambiguous.
    pub fn is_name_free(&self, name: &str) -> bool {
        !self.name_index.contains_key(name)
    }

    /// Derive a free name from a prefix: the prefix itself if unused,
    /// otherwise the first `{prefix}{n}` that is.
    pub fn generate_unique_name(&self, prefix: &str) -> String {
        if self.is_name_free(prefix) && !prefix.is_empty() {
            return prefix.to_string();
        }
        let prefix = if prefix.is_empty() { "Node" } else { prefix };
        let mut n = 1usize;
        loop {
            let candidate = format!("{prefix}{n}");
            if self.is_name_free(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    // ─── Structural mutation (command executor only) ─────────────────────

    /// Insert `node` as a child of `parent`. The caller has already
    /// validated kind legality and name uniqueness.
    pub fn insert_node(&mut self, parent: NodeId, node: AnimNode) -> NodeId {
        let parent_idx = self.id_index[&parent];
        let id = node.id;
        let name = node.name.clone();
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent_idx, idx, ());
        self.id_index.insert(id, idx);
        self.name_index.insert(name, id);
        id
    }

    /// Remove a single node (no cascade; the executor removes attached
    /// connections, transitions, and group memberships first).
    pub fn extract_node(&mut self, id: NodeId) -> Option<AnimNode> {
        let idx = self.id_index.remove(&id)?;
        let node = self.graph.remove_node(idx)?;
        self.name_index.remove(&node.name);
        self.entry_states.retain(|level, entry| *level != id && *entry != id);
        self.virtual_finals.retain(|level, n| *level != id && *n != id);
        Some(node)
    }

    pub fn rename_node(&mut self, id: NodeId, new_name: String) {
        if let Some(&idx) = self.id_index.get(&id) {
            let old = std::mem::replace(&mut self.graph[idx].name, new_name.clone());
            self.name_index.remove(&old);
            self.name_index.insert(new_name, id);
        }
    }

    // ─── Connections ─────────────────────────────────────────────────────

    pub fn connection(&self, id: ConnectionId) -> Option<&DataConnection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// The incoming connection occupying `target`'s input port, if any.
    pub fn input_connection(&self, target: NodeId, target_port: usize) -> Option<&DataConnection> {
        self.connections
            .iter()
            .find(|c| c.target_node == target && c.target_port == target_port)
    }

    /// All connections whose endpoints live directly under `level`.
    pub fn connections_at(&self, level: NodeId) -> Vec<&DataConnection> {
        self.connections
            .iter()
            .filter(|c| self.parent_of(c.target_node) == Some(level))
            .collect()
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    pub fn transition_mut(&mut self, id: TransitionId) -> Option<&mut Transition> {
        self.transitions.iter_mut().find(|t| t.id == id)
    }

    /// All transitions whose target lives directly under `level`.
    pub fn transitions_at(&self, level: NodeId) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|t| self.parent_of(t.target) == Some(level))
            .collect()
    }

    /// Number of wildcard transitions arriving at `target`; drives the
    /// stagger offset of the next one.
    pub fn wildcard_count(&self, target: NodeId) -> usize {
        self.transitions
            .iter()
            .filter(|t| t.is_wildcard() && t.target == target)
            .count()
    }

    /// Every connection or transition touching `id`, for cascade deletes.
    pub fn edges_touching(&self, id: NodeId) -> (Vec<ConnectionId>, Vec<TransitionId>) {
        let connections = self
            .connections
            .iter()
            .filter(|c| c.source_node == id || c.target_node == id)
            .map(|c| c.id)
            .collect();
        let transitions = self
            .transitions
            .iter()
            .filter(|t| t.source == Some(id) || t.target == id)
            .map(|t| t.id)
            .collect();
        (connections, transitions)
    }

    // ─── Groups ──────────────────────────────────────────────────────────

    pub fn group(&self, level: NodeId, name: &str) -> Option<&NodeGroup> {
        self.groups.iter().find(|g| g.level == level && g.name == name)
    }

    pub fn group_mut(&mut self, level: NodeId, name: &str) -> Option<&mut NodeGroup> {
        self.groups.iter_mut().find(|g| g.level == level && g.name == name)
    }

    pub fn groups_at(&self, level: NodeId) -> Vec<&NodeGroup> {
        self.groups.iter().filter(|g| g.level == level).collect()
    }

    /// The group `node` belongs to within `level`, if any.
    pub fn group_of(&self, level: NodeId, node: NodeId) -> Option<&NodeGroup> {
        self.groups
            .iter()
            .find(|g| g.level == level && g.members.contains(&node))
    }

    // ─── Entry state & virtual final ─────────────────────────────────────

    pub fn entry_state(&self, state_machine: NodeId) -> Option<NodeId> {
        self.entry_states.get(&state_machine).copied()
    }

    pub fn set_entry_state(&mut self, state_machine: NodeId, entry: Option<NodeId>) {
        match entry {
            Some(e) => {
                self.entry_states.insert(state_machine, e);
            }
            None => {
                self.entry_states.remove(&state_machine);
            }
        }
    }

    /// Snapshot of all (state machine, entry state) pairs.
    pub fn entry_state_entries(&self) -> Vec<(NodeId, NodeId)> {
        self.entry_states.iter().map(|(k, v)| (*k, *v)).collect()
    }

    pub fn virtual_final(&self, blend_tree: NodeId) -> Option<NodeId> {
        self.virtual_finals.get(&blend_tree).copied()
    }

    pub fn set_virtual_final(&mut self, blend_tree: NodeId, node: Option<NodeId>) {
        match node {
            Some(n) => {
                self.virtual_finals.insert(blend_tree, n);
            }
            None => {
                self.virtual_finals.remove(&blend_tree);
            }
        }
    }

    /// Snapshot of all (blend tree, virtual final) pairs.
    pub fn virtual_final_entries(&self) -> Vec<(NodeId, NodeId)> {
        self.virtual_finals.iter().map(|(k, v)| (*k, *v)).collect()
    }

    // ─── Events ──────────────────────────────────────────────────────────

    pub fn push_event(&mut self, event: GraphEvent) {
        self.events.push(event);
    }

    /// Drain all committed change notifications. Called by the view layer
    /// after a command group returns; never during execution.
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn events_mark(&self) -> usize {
        self.events.len()
    }

    /// Discard events recorded after `mark` (rolled-back group).
    pub(crate) fn truncate_events(&mut self, mark: usize) {
        self.events.truncate(mark);
    }
}

impl Default for AnimGraph {
    fn default() -> Self {
        Self::new()
    }
}
