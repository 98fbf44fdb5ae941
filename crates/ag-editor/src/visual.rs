//! Visual mirror of one graph level.
//!
//! The canvas never walks the model directly while painting or hit
//! testing; it works off this mirror, which is rebuilt from the model
//! after each committed command group. Geometry and selection are keyed
//! by the model's stable ids, so they survive renames and undo/redo.

use ag_core::{AnimGraph, ConnectionId, GraphEvent, NodeId, NodeKind, TransitionId};

const NODE_MIN_WIDTH: f32 = 100.0;
const NODE_MAX_WIDTH: f32 = 240.0;
const NODE_HEADER_HEIGHT: f32 = 22.0;
const PORT_SPACING: f32 = 14.0;
const PORT_HIT_RADIUS: f32 = 6.0;
const COLLAPSED_HEIGHT: f32 = 22.0;

/// Axis-aligned rectangle in graph coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.w).max(other.x + other.w);
        let bottom = (self.y + self.h).max(other.y + other.h);
        Rect::new(x, y, right - x, bottom - y)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Normalize a drag rectangle from two corner points.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Rect {
        Rect::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }
}

/// Which side of a node a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSide {
    Input,
    Output,
}

/// One node of the mirrored level.
#[derive(Debug, Clone)]
pub struct VisualNode {
    pub id: NodeId,
    pub rect: Rect,
    pub kind: NodeKind,
    pub collapsed: bool,
    pub input_count: usize,
    pub output_count: usize,
    pub selected: bool,
}

impl VisualNode {
    /// Center of the given port, in graph coordinates. Ports hang off the
    /// left (inputs) and right (outputs) edge below the header.
    pub fn port_position(&self, side: PortSide, index: usize) -> (f32, f32) {
        let y = self.rect.y + NODE_HEADER_HEIGHT + PORT_SPACING * (index as f32 + 0.5);
        match side {
            PortSide::Input => (self.rect.x, y),
            PortSide::Output => (self.rect.x + self.rect.w, y),
        }
    }
}

/// Reference to a model edge of either flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRef {
    Connection(ConnectionId),
    Transition(TransitionId),
}

#[derive(Debug, Clone)]
pub struct VisualEdge {
    pub edge: EdgeRef,
    /// `None` marks a wildcard transition.
    pub source: Option<NodeId>,
    pub target: NodeId,
    pub disabled: bool,
    pub selected: bool,
}

/// Mirror of the level currently shown on the canvas.
#[derive(Debug)]
pub struct VisualGraph {
    level: NodeId,
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

impl VisualGraph {
    pub fn new(graph: &AnimGraph, level: NodeId) -> Self {
        let mut v = Self {
            level,
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        v.rebuild(graph);
        v
    }

    pub fn level(&self) -> NodeId {
        self.level
    }

    /// Switch the mirror to another level, dropping selection.
    pub fn show_level(&mut self, graph: &AnimGraph, level: NodeId) {
        self.level = level;
        self.nodes.clear();
        self.edges.clear();
        self.rebuild(graph);
    }

    /// Full resync from the model, preserving selection where ids survive.
    pub fn rebuild(&mut self, graph: &AnimGraph) {
        let selected_nodes: Vec<NodeId> = self.selected_nodes();
        let selected_edges: Vec<EdgeRef> = self.selected_edges();

        self.nodes.clear();
        for child in graph.children(self.level) {
            if let Some(node) = graph.node(child) {
                let rect = node_rect(node);
                self.nodes.push(VisualNode {
                    id: node.id,
                    rect,
                    kind: node.kind,
                    collapsed: node.collapsed,
                    input_count: node.kind.input_ports().len(),
                    output_count: node.kind.output_ports().len(),
                    selected: selected_nodes.contains(&node.id),
                });
            }
        }

        self.edges.clear();
        for c in graph.connections_at(self.level) {
            self.edges.push(VisualEdge {
                edge: EdgeRef::Connection(c.id),
                source: Some(c.source_node),
                target: c.target_node,
                disabled: false,
                selected: selected_edges.contains(&EdgeRef::Connection(c.id)),
            });
        }
        for t in graph.transitions_at(self.level) {
            self.edges.push(VisualEdge {
                edge: EdgeRef::Transition(t.id),
                source: t.source,
                target: t.target,
                disabled: t.disabled,
                selected: selected_edges.contains(&EdgeRef::Transition(t.id)),
            });
        }
    }

    /// Incremental update from committed change events. Pure moves only
    /// touch the affected rect; anything structural triggers a rebuild.
    pub fn apply_events(&mut self, graph: &AnimGraph, events: &[GraphEvent]) {
        let mut needs_rebuild = false;
        for event in events {
            match event {
                GraphEvent::NodeMoved(id) => {
                    if let (Some(node), Some(visual)) =
                        (graph.node(*id), self.nodes.iter_mut().find(|n| n.id == *id))
                    {
                        let (x, y) = node.position;
                        visual.rect.x = x as f32;
                        visual.rect.y = y as f32;
                    }
                }
                GraphEvent::NodeRenamed(_) | GraphEvent::NodeFlagsChanged(_) => {
                    needs_rebuild = true;
                }
                _ => needs_rebuild = true,
            }
        }
        if needs_rebuild {
            self.rebuild(graph);
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| n.selected).map(|n| n.id).collect()
    }

    pub fn selected_edges(&self) -> Vec<EdgeRef> {
        self.edges.iter().filter(|e| e.selected).map(|e| e.edge).collect()
    }

    pub fn select_only(&mut self, id: NodeId) {
        for n in &mut self.nodes {
            n.selected = n.id == id;
        }
        for e in &mut self.edges {
            e.selected = false;
        }
    }

    pub fn toggle_node(&mut self, id: NodeId) {
        if let Some(n) = self.nodes.iter_mut().find(|n| n.id == id) {
            n.selected = !n.selected;
        }
    }

    pub fn select_edge_only(&mut self, edge: EdgeRef) {
        for n in &mut self.nodes {
            n.selected = false;
        }
        for e in &mut self.edges {
            e.selected = e.edge == edge;
        }
    }

    pub fn select_all(&mut self) {
        for n in &mut self.nodes {
            n.selected = true;
        }
        for e in &mut self.edges {
            e.selected = true;
        }
    }

    pub fn clear_selection(&mut self) {
        for n in &mut self.nodes {
            n.selected = false;
        }
        for e in &mut self.edges {
            e.selected = false;
        }
    }

    /// Replace the node selection with everything inside `rect`;
    /// with `additive` the contents are added instead.
    pub fn select_in_rect(&mut self, rect: Rect, additive: bool) {
        for n in &mut self.nodes {
            let inside = n.rect.intersects(&rect);
            n.selected = if additive { n.selected || inside } else { inside };
        }
        if !additive {
            for e in &mut self.edges {
                e.selected = false;
            }
        }
    }

    // ─── Hit testing ─────────────────────────────────────────────────────

    /// Topmost node under the point (later children draw on top).
    pub fn node_at(&self, x: f32, y: f32) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.rect.contains(x, y))
            .map(|n| n.id)
    }

    /// Port under the point, if any.
    pub fn port_at(&self, x: f32, y: f32) -> Option<(NodeId, PortSide, usize)> {
        for n in self.nodes.iter().rev() {
            if n.collapsed {
                continue;
            }
            for (side, count) in [
                (PortSide::Input, n.input_count),
                (PortSide::Output, n.output_count),
            ] {
                for index in 0..count {
                    let (px, py) = n.port_position(side, index);
                    if (px - x).hypot(py - y) <= PORT_HIT_RADIUS {
                        return Some((n.id, side, index));
                    }
                }
            }
        }
        None
    }

    // ─── Framing ─────────────────────────────────────────────────────────

    /// Bounding box of all nodes, or `None` for an empty level.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .map(|n| n.rect)
            .reduce(|acc, r| acc.union(&r))
    }

    /// Bounding box of the selected nodes only.
    pub fn selection_bounds(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.rect)
            .reduce(|acc, r| acc.union(&r))
    }
}

/// Compute a node's on-canvas rectangle from its model state.
fn node_rect(node: &ag_core::AnimNode) -> Rect {
    let width = (node.name.len() as f32 * 7.5 + 40.0).clamp(NODE_MIN_WIDTH, NODE_MAX_WIDTH);
    let height = if node.collapsed {
        COLLAPSED_HEIGHT
    } else {
        let port_rows = node
            .kind
            .input_ports()
            .len()
            .max(node.kind.output_ports().len())
            .max(1);
        NODE_HEADER_HEIGHT + PORT_SPACING * port_rows as f32 + 8.0
    };
    let (x, y) = node.position;
    Rect::new(x as f32, y as f32, width, height)
}
