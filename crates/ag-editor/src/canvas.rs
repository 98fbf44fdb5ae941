//! Canvas interaction for one open graph level.
//!
//! Pointer input drives an interaction state machine (pan, marquee,
//! node move, connection drag). All interactions end in exactly one
//! command group, so every gesture is one undo step:
//!
//! - a multi-node drag commits one `AdjustNode` per moved node;
//! - dropping a connection onto an occupied blend input commits a
//!   remove + create pair ("replace");
//! - delete resolves selected edges first, then the topmost selected
//!   nodes, letting the node cascade take care of the rest.
//!
//! During a gesture only the visual mirror changes; the model is
//! untouched until the group executes.

use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::payload::{parse_payload, DropEntry};
use crate::visual::{EdgeRef, PortSide, Rect, VisualGraph};
use ag_core::{
    AnimGraph, Command, CommandError, CommandExecutor, CommandGroup, ConnectionId, NodeId,
    NodeKind,
};
use std::collections::HashSet;

const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 4.0;
const FIT_MARGIN: f32 = 40.0;
/// Vertical stagger between nodes created from a multi-line drop.
const DROP_STAGGER_Y: i32 = 60;

/// Pan/zoom transform between screen and graph space.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub pan: (f32, f32),
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: (0.0, 0.0),
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn to_graph(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pan.0) / self.zoom, (y - self.pan.1) / self.zoom)
    }

    pub fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.zoom + self.pan.0, y * self.zoom + self.pan.1)
    }

    /// Center `rect` in a viewport of the given size, zoomed to fit.
    pub fn frame(&mut self, viewport: (f32, f32), rect: Rect) {
        let zoom_x = viewport.0 / (rect.w + FIT_MARGIN * 2.0);
        let zoom_y = viewport.1 / (rect.h + FIT_MARGIN * 2.0);
        self.zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);
        let (cx, cy) = rect.center();
        self.pan = (
            viewport.0 / 2.0 - cx * self.zoom,
            viewport.1 / 2.0 - cy * self.zoom,
        );
    }
}

/// Node alignment operations for the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Top,
    Bottom,
}

/// Why a pending connection drag cannot complete at the hovered spot.
/// Used for live feedback while the wire follows the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFeedback {
    Allowed,
    Replace,
    Invalid,
}

#[derive(Debug, Clone)]
enum Interaction {
    Idle,
    Pan {
        last: (f32, f32),
    },
    Marquee {
        start: (f32, f32),
        current: (f32, f32),
        additive: bool,
    },
    MoveNodes {
        /// Pointer position at drag start, in graph coordinates.
        origin: (f32, f32),
        /// Model positions at drag start, per selected node.
        start_positions: Vec<(NodeId, (i32, i32))>,
        total_delta: (f32, f32),
    },
    Connect {
        from: NodeId,
        from_side: PortSide,
        from_port: usize,
        /// Connection being relinked; removed when the drag completes
        /// elsewhere.
        relink: Option<ConnectionId>,
        start_screen: (f32, f32),
    },
}

/// Interactive canvas over one level of the animation graph.
pub struct Canvas {
    pub visual: VisualGraph,
    pub camera: Camera,
    pub viewport: (f32, f32),
    interaction: Interaction,
}

impl Canvas {
    pub fn new(graph: &AnimGraph, level: NodeId) -> Self {
        Self {
            visual: VisualGraph::new(graph, level),
            camera: Camera::default(),
            viewport: (1280.0, 720.0),
            interaction: Interaction::Idle,
        }
    }

    pub fn level(&self) -> NodeId {
        self.visual.level()
    }

    /// Open another level, dropping any gesture in flight.
    pub fn open_level(&mut self, graph: &AnimGraph, level: NodeId) {
        self.interaction = Interaction::Idle;
        self.visual.show_level(graph, level);
    }

    /// Whether the shown level is a state machine (transitions) rather
    /// than a blend tree (typed connections).
    fn level_kind(&self, graph: &AnimGraph) -> Option<NodeKind> {
        graph.node(self.level()).map(|n| n.kind)
    }

    /// Execute one group and resynchronize the mirror from the committed
    /// events. A rejected group leaves both model and mirror untouched.
    fn commit(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        group: CommandGroup,
    ) -> Result<(), CommandError> {
        exec.execute(graph, group)?;
        let events = graph.take_events();
        self.visual.apply_events(graph, &events);
        Ok(())
    }

    // ─── Pointer interaction ─────────────────────────────────────────────

    pub fn handle_event(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        event: &InputEvent,
    ) -> Result<(), CommandError> {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.pointer_down(graph, *x, *y, *button, *modifiers),
            InputEvent::PointerMove { x, y, .. } => {
                self.pointer_move(*x, *y);
                Ok(())
            }
            InputEvent::PointerUp { x, y, .. } => self.pointer_up(graph, exec, *x, *y),
            InputEvent::Scroll { dx, dy, zoom } => {
                self.scroll(*dx, *dy, *zoom);
                Ok(())
            }
            InputEvent::Key { .. } => Ok(()),
        }
    }

    fn pointer_down(
        &mut self,
        graph: &AnimGraph,
        x: f32,
        y: f32,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> Result<(), CommandError> {
        if matches!(button, PointerButton::Middle | PointerButton::Right) {
            self.interaction = Interaction::Pan { last: (x, y) };
            return Ok(());
        }
        let (gx, gy) = self.camera.to_graph(x, y);

        // Ports take precedence over node bodies.
        if let Some((node, side, port)) = self.visual.port_at(gx, gy) {
            let relink = if side == PortSide::Input {
                graph.input_connection(node, port).map(|c| c.id)
            } else {
                None
            };
            self.interaction = Interaction::Connect {
                from: node,
                from_side: side,
                from_port: port,
                relink,
                start_screen: (x, y),
            };
            return Ok(());
        }

        if let Some(hit) = self.visual.node_at(gx, gy) {
            if modifiers.shift {
                self.visual.toggle_node(hit);
            } else if !self.visual.selected_nodes().contains(&hit) {
                self.visual.select_only(hit);
            }
            // Clicking an already-selected node keeps the selection so a
            // drag moves the whole set.
            let start_positions = self
                .visual
                .selected_nodes()
                .iter()
                .filter_map(|id| graph.node(*id).map(|n| (*id, n.position)))
                .collect();
            self.interaction = Interaction::MoveNodes {
                origin: (gx, gy),
                start_positions,
                total_delta: (0.0, 0.0),
            };
            return Ok(());
        }

        // Empty space: rubber-band selection.
        if !modifiers.shift {
            self.visual.clear_selection();
        }
        self.interaction = Interaction::Marquee {
            start: (gx, gy),
            current: (gx, gy),
            additive: modifiers.shift,
        };
        Ok(())
    }

    fn pointer_move(&mut self, x: f32, y: f32) {
        let (gx, gy) = self.camera.to_graph(x, y);
        match &mut self.interaction {
            Interaction::Pan { last } => {
                self.camera.pan.0 += x - last.0;
                self.camera.pan.1 += y - last.1;
                *last = (x, y);
            }
            Interaction::Marquee { current, .. } => {
                *current = (gx, gy);
            }
            Interaction::MoveNodes {
                origin,
                start_positions,
                total_delta,
            } => {
                // Visual-only move; the model changes when the drag ends.
                *total_delta = (gx - origin.0, gy - origin.1);
                for (id, start) in start_positions.iter() {
                    if let Some(v) = self.visual.nodes.iter_mut().find(|n| n.id == *id) {
                        v.rect.x = start.0 as f32 + total_delta.0;
                        v.rect.y = start.1 as f32 + total_delta.1;
                    }
                }
            }
            _ => {}
        }
    }

    fn pointer_up(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        x: f32,
        y: f32,
    ) -> Result<(), CommandError> {
        let interaction = std::mem::replace(&mut self.interaction, Interaction::Idle);
        let (gx, gy) = self.camera.to_graph(x, y);
        match interaction {
            Interaction::Idle | Interaction::Pan { .. } => Ok(()),
            Interaction::Marquee {
                start,
                additive,
                ..
            } => {
                let rect = Rect::from_corners(start.0, start.1, gx, gy);
                self.visual.select_in_rect(rect, additive);
                Ok(())
            }
            Interaction::MoveNodes {
                start_positions,
                total_delta,
                ..
            } => self.finish_move(graph, exec, start_positions, total_delta),
            Interaction::Connect {
                from,
                from_side,
                from_port,
                relink,
                start_screen,
            } => self.finish_connect(
                graph,
                exec,
                from,
                from_side,
                from_port,
                relink,
                start_screen,
                (x, y),
            ),
        }
    }

    fn scroll(&mut self, dx: f32, dy: f32, zoom: f32) {
        self.camera.pan.0 += dx;
        self.camera.pan.1 += dy;
        if zoom != 1.0 {
            self.camera.zoom = (self.camera.zoom * zoom).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    // ─── Node move ───────────────────────────────────────────────────────

    /// Nudge the pending move by a graph-space delta. Exposed for hosts
    /// that deliver drag deltas instead of absolute positions.
    pub fn drag_selection_by(&mut self, dx: f32, dy: f32) {
        if let Interaction::MoveNodes {
            start_positions,
            total_delta,
            ..
        } = &mut self.interaction
        {
            total_delta.0 += dx;
            total_delta.1 += dy;
            for (id, start) in start_positions.iter() {
                if let Some(v) = self.visual.nodes.iter_mut().find(|n| n.id == *id) {
                    v.rect.x = start.0 as f32 + total_delta.0;
                    v.rect.y = start.1 as f32 + total_delta.1;
                }
            }
        }
    }

    fn finish_move(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        start_positions: Vec<(NodeId, (i32, i32))>,
        total_delta: (f32, f32),
    ) -> Result<(), CommandError> {
        let dx = total_delta.0.round() as i32;
        let dy = total_delta.1.round() as i32;
        if dx == 0 && dy == 0 {
            // A click, not a drag.
            self.visual.rebuild(graph);
            return Ok(());
        }
        let mut group = CommandGroup::new(format!("Move {} node(s)", start_positions.len()));
        for (id, start) in &start_positions {
            if let Some(node) = graph.node(*id) {
                group.push(Command::AdjustNode {
                    name: node.name.clone(),
                    new_name: None,
                    position: Some((start.0 + dx, start.1 + dy)),
                    enabled: None,
                    visualize: None,
                    collapsed: None,
                });
            }
        }
        self.commit(graph, exec, group)
    }

    // ─── Connection drags ────────────────────────────────────────────────

    /// Live feedback for the spot currently hovered during a connect drag.
    pub fn connect_feedback(&self, graph: &AnimGraph, x: f32, y: f32) -> ConnectFeedback {
        let Interaction::Connect {
            from,
            from_side,
            from_port,
            ..
        } = &self.interaction
        else {
            return ConnectFeedback::Invalid;
        };
        let (gx, gy) = self.camera.to_graph(x, y);
        match self.level_kind(graph) {
            Some(NodeKind::StateMachine) => match self.visual.node_at(gx, gy) {
                Some(target) if target != *from => ConnectFeedback::Allowed,
                _ => ConnectFeedback::Invalid,
            },
            Some(NodeKind::BlendTree) => {
                let Some((node, side, port)) = self.visual.port_at(gx, gy) else {
                    return ConnectFeedback::Invalid;
                };
                let (source, sport, target, tport) = match (*from_side, side) {
                    (PortSide::Output, PortSide::Input) => (*from, *from_port, node, port),
                    (PortSide::Input, PortSide::Output) => (node, port, *from, *from_port),
                    _ => return ConnectFeedback::Invalid,
                };
                if !blend_connection_valid(graph, source, sport, target, tport) {
                    return ConnectFeedback::Invalid;
                }
                if graph.input_connection(target, tport).is_some() {
                    ConnectFeedback::Replace
                } else {
                    ConnectFeedback::Allowed
                }
            }
            _ => ConnectFeedback::Invalid,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_connect(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        from: NodeId,
        from_side: PortSide,
        from_port: usize,
        relink: Option<ConnectionId>,
        start_screen: (f32, f32),
        end_screen: (f32, f32),
    ) -> Result<(), CommandError> {
        let (gx, gy) = self.camera.to_graph(end_screen.0, end_screen.1);
        match self.level_kind(graph) {
            Some(NodeKind::StateMachine) => {
                let Some(target) = self.visual.node_at(gx, gy) else {
                    return Ok(());
                };
                if target == from {
                    return Err(CommandError::SelfConnection(node_name(graph, target)));
                }
                let (sx, sy) = self.camera.to_graph(start_screen.0, start_screen.1);
                let start_offset = self.offset_within(from, sx, sy);
                let end_offset = self.offset_within(target, gx, gy);
                let group = CommandGroup::single(
                    "Create transition",
                    Command::CreateConnection {
                        source: Some(node_name(graph, from)),
                        target: node_name(graph, target),
                        source_port: 0,
                        target_port: 0,
                        start_offset,
                        end_offset,
                        transition_id: None,
                        connection_id: None,
                    },
                );
                self.commit(graph, exec, group)
            }
            Some(NodeKind::BlendTree) => {
                let Some((node, side, port)) = self.visual.port_at(gx, gy) else {
                    return Ok(());
                };
                let (source, sport, target, tport) = match (from_side, side) {
                    (PortSide::Output, PortSide::Input) => (from, from_port, node, port),
                    (PortSide::Input, PortSide::Output) => (node, port, from, from_port),
                    _ => return Ok(()),
                };
                self.connect_blend_ports(graph, exec, source, sport, target, tport, relink)
            }
            _ => Ok(()),
        }
    }

    /// Create a blend-tree connection, replacing whatever occupies the
    /// target port and removing a relinked original, all in one group.
    #[allow(clippy::too_many_arguments)]
    fn connect_blend_ports(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        source: NodeId,
        source_port: usize,
        target: NodeId,
        target_port: usize,
        relink: Option<ConnectionId>,
    ) -> Result<(), CommandError> {
        let existing = graph.input_connection(target, target_port).map(|c| c.id);
        if existing.is_some() && existing == relink {
            // Dropped back where it started.
            return Ok(());
        }
        let description = if existing.is_some() {
            "Replace blend tree connection"
        } else if relink.is_some() {
            "Relink blend tree connection"
        } else {
            "Create blend tree connection"
        };
        let mut group = CommandGroup::new(description);
        if let Some(id) = relink {
            group.push(Command::RemoveConnection { id });
        }
        if let Some(id) = existing {
            group.push(Command::RemoveConnection { id });
        }
        group.push(Command::CreateConnection {
            source: Some(node_name(graph, source)),
            target: node_name(graph, target),
            source_port,
            target_port,
            start_offset: (0, 0),
            end_offset: (0, 0),
            transition_id: None,
            connection_id: None,
        });
        self.commit(graph, exec, group)
    }

    /// Pointer offset relative to a node's top-left, for transition
    /// attachment points.
    fn offset_within(&self, node: NodeId, gx: f32, gy: f32) -> (i32, i32) {
        self.visual
            .nodes
            .iter()
            .find(|n| n.id == node)
            .map(|n| ((gx - n.rect.x) as i32, (gy - n.rect.y) as i32))
            .unwrap_or((0, 0))
    }

    // ─── Delete ──────────────────────────────────────────────────────────

    /// Delete the selected edges and nodes as one undo step.
    ///
    /// Selected edges touching a selected node are skipped; the node
    /// cascade removes them, and listing them twice would make the group
    /// fail halfway. Likewise only topmost selected nodes are issued,
    /// and non-deletable nodes are silently dropped from the selection.
    pub fn delete_selected(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
    ) -> Result<(), CommandError> {
        let selected_nodes: HashSet<NodeId> = self.visual.selected_nodes().into_iter().collect();
        let mut group = CommandGroup::new("Delete selected items");

        for edge in self.visual.selected_edges() {
            match edge {
                EdgeRef::Connection(id) => {
                    if let Some(c) = graph.connection(id) {
                        if selected_nodes.contains(&c.source_node)
                            || selected_nodes.contains(&c.target_node)
                        {
                            continue;
                        }
                        group.push(Command::RemoveConnection { id });
                    }
                }
                EdgeRef::Transition(id) => {
                    if let Some(t) = graph.transition(id) {
                        let touches = t.source.map(|s| selected_nodes.contains(&s)).unwrap_or(false)
                            || selected_nodes.contains(&t.target);
                        if touches {
                            continue;
                        }
                        group.push(Command::RemoveTransition { id });
                    }
                }
            }
        }

        for id in &selected_nodes {
            let Some(node) = graph.node(*id) else { continue };
            if !node.capabilities().deletable {
                continue;
            }
            // Descendants of another selected node go with their ancestor.
            let covered = selected_nodes
                .iter()
                .any(|other| *other != *id && is_ancestor(graph, *other, *id));
            if covered {
                continue;
            }
            group.push(Command::RemoveNode {
                name: node.name.clone(),
            });
        }

        if group.is_empty() {
            return Ok(());
        }
        self.commit(graph, exec, group)
    }

    // ─── Alignment ───────────────────────────────────────────────────────

    /// Align the selected nodes along one edge, as one undo step.
    pub fn align_selected(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        alignment: Alignment,
    ) -> Result<(), CommandError> {
        let selected: Vec<_> = self
            .visual
            .nodes
            .iter()
            .filter(|n| n.selected)
            .map(|n| (n.id, n.rect))
            .collect();
        if selected.len() < 2 {
            return Ok(());
        }
        let target = match alignment {
            Alignment::Left => selected
                .iter()
                .map(|(_, r)| r.x)
                .fold(f32::INFINITY, f32::min),
            Alignment::Top => selected
                .iter()
                .map(|(_, r)| r.y)
                .fold(f32::INFINITY, f32::min),
            Alignment::Right => selected
                .iter()
                .map(|(_, r)| r.x + r.w)
                .fold(f32::NEG_INFINITY, f32::max),
            Alignment::Bottom => selected
                .iter()
                .map(|(_, r)| r.y + r.h)
                .fold(f32::NEG_INFINITY, f32::max),
        };

        let mut group = CommandGroup::new("Align nodes");
        for (id, rect) in &selected {
            let Some(node) = graph.node(*id) else { continue };
            let (mut x, mut y) = node.position;
            match alignment {
                Alignment::Left => x = target as i32,
                Alignment::Top => y = target as i32,
                Alignment::Right => x = (target - rect.w) as i32,
                Alignment::Bottom => y = (target - rect.h) as i32,
            }
            if (x, y) != node.position {
                group.push(Command::AdjustNode {
                    name: node.name.clone(),
                    new_name: None,
                    position: Some((x, y)),
                    enabled: None,
                    visualize: None,
                    collapsed: None,
                });
            }
        }
        if group.is_empty() {
            return Ok(());
        }
        self.commit(graph, exec, group)
    }

    // ─── Framing ─────────────────────────────────────────────────────────

    pub fn fit_all(&mut self) {
        if let Some(bounds) = self.visual.content_bounds() {
            self.camera.frame(self.viewport, bounds);
        }
    }

    pub fn zoom_to_selection(&mut self) {
        if let Some(bounds) = self.visual.selection_bounds() {
            self.camera.frame(self.viewport, bounds);
        }
    }

    // ─── Transition enable/disable ───────────────────────────────────────

    /// Enable or disable the selected transitions as one undo step.
    pub fn set_selected_transitions_enabled(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        enabled: bool,
    ) -> Result<(), CommandError> {
        let mut group = CommandGroup::new(if enabled {
            "Enable transitions"
        } else {
            "Disable transitions"
        });
        for edge in self.visual.selected_edges() {
            if let EdgeRef::Transition(id) = edge {
                if graph.transition(id).map(|t| t.disabled) == Some(enabled) {
                    group.push(Command::AdjustTransition {
                        id,
                        disabled: Some(!enabled),
                        start_offset: None,
                        end_offset: None,
                    });
                }
            }
        }
        if group.is_empty() {
            return Ok(());
        }
        self.commit(graph, exec, group)
    }

    // ─── Drag & drop ─────────────────────────────────────────────────────

    /// Handle a text drop at the given screen position. Each payload line
    /// becomes one node, staggered vertically, all in one group.
    pub fn drop_payload(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        text: &str,
        at: (f32, f32),
    ) -> Result<(), CommandError> {
        let payload = parse_payload(text).map_err(|e| {
            log::warn!("drop payload rejected: {e}");
            CommandError::Rejected(e.to_string())
        })?;
        let (gx, gy) = self.camera.to_graph(at.0, at.1);
        let level_name = node_name(graph, self.level());
        let level_kind = self
            .level_kind(graph)
            .ok_or_else(|| CommandError::UnknownNode(level_name.clone()))?;

        let mut used_names: HashSet<String> = HashSet::new();
        let mut group = CommandGroup::new("Drop nodes");
        for (line, entry) in payload.entries.iter().enumerate() {
            let (kind, hint, attributes) = match entry {
                DropEntry::Palette {
                    type_name,
                    name_hint,
                    ..
                } => {
                    let kind = NodeKind::from_type_name(type_name).ok_or_else(|| {
                        CommandError::Rejected(format!("unknown node type \"{type_name}\""))
                    })?;
                    (kind, name_hint.clone(), Vec::new())
                }
                DropEntry::Window { source, properties } => match source.as_str() {
                    "MotionSet" => {
                        let motion_id = properties
                            .iter()
                            .find(|(k, _)| k == "motionId")
                            .map(|(_, v)| v.clone())
                            .ok_or_else(|| {
                                CommandError::Rejected("motion drop without motionId".into())
                            })?;
                        let hint = properties
                            .iter()
                            .find(|(k, _)| k == "name")
                            .map(|(_, v)| v.clone())
                            .unwrap_or_else(|| motion_id.clone());
                        (
                            NodeKind::Motion,
                            hint,
                            vec![("motionId".to_string(), motion_id)],
                        )
                    }
                    "ParameterWindow" => {
                        let hint = properties
                            .iter()
                            .find(|(k, _)| k == "name")
                            .map(|(_, v)| v.clone())
                            .unwrap_or_else(|| "Parameter".into());
                        (NodeKind::Parameter, hint, Vec::new())
                    }
                    other => {
                        return Err(CommandError::Rejected(format!(
                            "cannot drop items from \"{other}\" here"
                        )));
                    }
                },
            };
            if level_kind == NodeKind::StateMachine && !kind.capabilities().can_act_as_state {
                return Err(CommandError::KindNotAllowedHere(kind.type_name()));
            }
            let name = unique_name(graph, &mut used_names, &hint);
            group.push(Command::CreateNode {
                parent: level_name.clone(),
                kind,
                name,
                position: (gx as i32, gy as i32 + DROP_STAGGER_Y * line as i32),
                attributes,
            });
        }
        self.commit(graph, exec, group)
    }
}

/// A name unused by both the graph and this in-flight group.
fn unique_name(graph: &AnimGraph, used: &mut HashSet<String>, hint: &str) -> String {
    let base = if hint.is_empty() { "Node" } else { hint };
    if graph.is_name_free(base) && !used.contains(base) {
        used.insert(base.to_string());
        return base.to_string();
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{base}{n}");
        if graph.is_name_free(&candidate) && !used.contains(&candidate) {
            used.insert(candidate.clone());
            return candidate;
        }
        n += 1;
    }
}

fn node_name(graph: &AnimGraph, id: NodeId) -> String {
    graph.node(id).map(|n| n.name.clone()).unwrap_or_default()
}

fn is_ancestor(graph: &AnimGraph, ancestor: NodeId, node: NodeId) -> bool {
    let mut current = graph.parent_of(node);
    while let Some(p) = current {
        if p == ancestor {
            return true;
        }
        current = graph.parent_of(p);
    }
    false
}

/// Mirror of the executor's blend-connection rules, for hover feedback.
/// An occupied target port is fine here; completion issues a replace.
fn blend_connection_valid(
    graph: &AnimGraph,
    source: NodeId,
    source_port: usize,
    target: NodeId,
    target_port: usize,
) -> bool {
    if source == target {
        return false;
    }
    let (Some(s), Some(t)) = (graph.node(source), graph.node(target)) else {
        return false;
    };
    let (Some(out), Some(inp)) = (
        s.kind.output_ports().get(source_port).copied(),
        t.kind.input_ports().get(target_port).copied(),
    ) else {
        return false;
    };
    inp.data_type.is_compatible_with(out.data_type)
}
