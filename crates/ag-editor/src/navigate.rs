//! Hierarchy tree, filtering, and clipboard.
//!
//! The navigator mirrors the whole containment hierarchy as a flat row
//! list (depth-annotated, filter-applied) and keeps its selection in
//! lockstep with the canvas. Selection sync uses a reentry guard: while
//! one side is pushing its selection to the other, echoes coming back
//! are ignored, the same way a widget blocks its signals while being
//! programmatically updated.
//!
//! Copy captures whole subtrees plus the connections internal to the
//! copied set; paste rebuilds everything as a single command group after
//! checking that each top-level node is legal under the target level.

use crate::canvas::Canvas;
use ag_core::{
    AnimGraph, Command, CommandError, CommandExecutor, CommandGroup, NodeId, NodeKind,
};
use std::collections::{HashMap, HashSet};

/// One visible row of the hierarchy tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub node: NodeId,
    pub depth: usize,
    pub name: String,
    pub kind: NodeKind,
    /// Whether this row is a state (immediate child of a state machine).
    pub is_state: bool,
}

/// Row filter. All active criteria must match.
#[derive(Debug, Clone, Default)]
pub struct TreeFilter {
    /// Case-insensitive substring of the node name.
    pub text: String,
    /// Restrict to these kinds; empty means all kinds.
    pub kinds: Vec<NodeKind>,
    /// Show only states.
    pub states_only: bool,
}

impl TreeFilter {
    fn matches(&self, graph: &AnimGraph, node: NodeId) -> bool {
        let Some(n) = graph.node(node) else {
            return false;
        };
        if !self.text.is_empty()
            && !n.name.to_lowercase().contains(&self.text.to_lowercase())
        {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&n.kind) {
            return false;
        }
        if self.states_only && !is_state(graph, node) {
            return false;
        }
        true
    }
}

fn is_state(graph: &AnimGraph, node: NodeId) -> bool {
    let Some(n) = graph.node(node) else {
        return false;
    };
    n.capabilities().can_act_as_state
        && graph
            .parent_of(node)
            .and_then(|p| graph.node(p))
            .map(|p| p.kind == NodeKind::StateMachine)
            .unwrap_or(false)
}

/// Subtree snapshot held by the clipboard. Node references are indices
/// into `nodes`, so the snapshot stays valid after the originals change
/// or disappear.
#[derive(Debug, Clone)]
struct ClipNode {
    parent: Option<usize>,
    kind: NodeKind,
    name: String,
    position: (i32, i32),
    attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct Clipboard {
    nodes: Vec<ClipNode>,
    /// (source idx, source port, target idx, target port)
    connections: Vec<(usize, usize, usize, usize)>,
    /// (source idx or wildcard, target idx, start offset, end offset, disabled)
    transitions: Vec<(Option<usize>, usize, (i32, i32), (i32, i32), bool)>,
    /// Kind of the level the snapshot came from; edges only paste into a
    /// level of the same kind.
    source_level_kind: NodeKind,
}

/// Tree navigation and clipboard over the full hierarchy.
pub struct Navigator {
    pub filter: TreeFilter,
    pub rows: Vec<TreeRow>,
    selected: Vec<NodeId>,
    syncing: bool,
    /// Visited levels, oldest first. `history_pos` points at the current.
    history: Vec<NodeId>,
    history_pos: usize,
    clipboard: Option<Clipboard>,
}

impl Navigator {
    pub fn new(graph: &AnimGraph) -> Self {
        let mut nav = Self {
            filter: TreeFilter::default(),
            rows: Vec::new(),
            selected: Vec::new(),
            syncing: false,
            history: vec![graph.root_id()],
            history_pos: 0,
            clipboard: None,
        };
        nav.rebuild(graph);
        nav
    }

    // ─── Rows & filtering ────────────────────────────────────────────────

    /// Rebuild the visible rows. A filtered-out node stays visible while
    /// any of its descendants matches, so matches are never orphaned.
    pub fn rebuild(&mut self, graph: &AnimGraph) {
        self.rows.clear();
        let root = graph.root_id();
        self.push_rows(graph, root, 0);
        self.selected.retain(|id| graph.node(*id).is_some());
    }

    fn push_rows(&mut self, graph: &AnimGraph, node: NodeId, depth: usize) -> bool {
        let self_matches = self.filter.matches(graph, node);
        let index = self.rows.len();
        if let Some(n) = graph.node(node) {
            self.rows.push(TreeRow {
                node,
                depth,
                name: n.name.clone(),
                kind: n.kind,
                is_state: is_state(graph, node),
            });
        }
        let mut any_child = false;
        for child in graph.children(node) {
            any_child |= self.push_rows(graph, child, depth + 1);
        }
        if !self_matches && !any_child {
            self.rows.truncate(index);
            return false;
        }
        true
    }

    // ─── Selection sync ──────────────────────────────────────────────────

    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    /// Selection pushed from the canvas side. Ignored while this
    /// navigator is itself mid-push (reentry guard).
    pub fn apply_canvas_selection(&mut self, ids: &[NodeId]) {
        if self.syncing {
            return;
        }
        self.selected = ids.to_vec();
    }

    /// Select rows here and notify the canvas side. Any echo arriving
    /// through [`Navigator::apply_canvas_selection`] during the
    /// notification is dropped.
    pub fn select(&mut self, ids: Vec<NodeId>, mut notify: impl FnMut(&mut Self, &[NodeId])) {
        self.selected = ids.clone();
        self.syncing = true;
        notify(self, &ids);
        self.syncing = false;
    }

    // ─── Navigation ──────────────────────────────────────────────────────

    pub fn current_level(&self) -> NodeId {
        self.history[self.history_pos]
    }

    /// Open a level on the canvas and record it in the visit history,
    /// truncating any forward entries.
    pub fn open(&mut self, graph: &AnimGraph, canvas: &mut Canvas, level: NodeId) {
        let openable = graph
            .node(level)
            .map(|n| n.capabilities().can_have_children)
            .unwrap_or(false);
        if !openable || level == self.current_level() {
            return;
        }
        self.history.truncate(self.history_pos + 1);
        self.history.push(level);
        self.history_pos += 1;
        canvas.open_level(graph, level);
    }

    /// Open the first selected node if it is a container. A leaf instead
    /// becomes the canvas selection at its parent level, framed in view.
    pub fn open_selected(&mut self, graph: &AnimGraph, canvas: &mut Canvas) {
        let Some(id) = self.selected.first().copied() else {
            return;
        };
        let openable = graph
            .node(id)
            .map(|n| n.capabilities().can_have_children)
            .unwrap_or(false);
        if openable {
            self.open(graph, canvas, id);
        } else if let Some(parent) = graph.parent_of(id) {
            self.open(graph, canvas, parent);
            canvas.visual.select_only(id);
            canvas.zoom_to_selection();
        }
    }

    /// Open the parent of the current level.
    pub fn open_parent(&mut self, graph: &AnimGraph, canvas: &mut Canvas) {
        if let Some(parent) = graph.parent_of(self.current_level()) {
            self.open(graph, canvas, parent);
        }
    }

    pub fn history_back(&mut self, graph: &AnimGraph, canvas: &mut Canvas) {
        if self.history_pos > 0 {
            self.history_pos -= 1;
            canvas.open_level(graph, self.history[self.history_pos]);
        }
    }

    pub fn history_forward(&mut self, graph: &AnimGraph, canvas: &mut Canvas) {
        if self.history_pos + 1 < self.history.len() {
            self.history_pos += 1;
            canvas.open_level(graph, self.history[self.history_pos]);
        }
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }

    /// Snapshot the subtrees of the topmost selected nodes, plus every
    /// connection and transition whose endpoints are all inside the
    /// snapshot. Non-deletable nodes cannot head a copy.
    pub fn copy_selection(&mut self, graph: &AnimGraph) {
        let selection: HashSet<NodeId> = self.selected.iter().copied().collect();
        let tops: Vec<NodeId> = self
            .selected
            .iter()
            .copied()
            .filter(|id| {
                graph
                    .node(*id)
                    .map(|n| n.capabilities().deletable)
                    .unwrap_or(false)
            })
            .filter(|id| {
                !selection
                    .iter()
                    .any(|other| *other != *id && ancestor_of(graph, *other, *id))
            })
            .collect();
        if tops.is_empty() {
            return;
        }

        let level = match graph.parent_of(tops[0]).and_then(|p| graph.node(p)) {
            Some(level) => level.kind,
            None => return,
        };

        let mut nodes = Vec::new();
        let mut index_of: HashMap<NodeId, usize> = HashMap::new();
        for top in &tops {
            for id in graph.subtree(*top) {
                if let Some(n) = graph.node(id) {
                    let parent = graph.parent_of(id).and_then(|p| index_of.get(&p).copied());
                    index_of.insert(id, nodes.len());
                    nodes.push(ClipNode {
                        parent,
                        kind: n.kind,
                        name: n.name.clone(),
                        position: n.position,
                        attributes: n.attributes.clone(),
                    });
                }
            }
        }

        let connections = graph
            .connections
            .iter()
            .filter_map(|c| {
                Some((
                    *index_of.get(&c.source_node)?,
                    c.source_port,
                    *index_of.get(&c.target_node)?,
                    c.target_port,
                ))
            })
            .collect();
        let transitions = graph
            .transitions
            .iter()
            .filter_map(|t| {
                let target = *index_of.get(&t.target)?;
                let source = match t.source {
                    Some(s) => Some(*index_of.get(&s)?),
                    None => None,
                };
                Some((source, target, t.start_offset, t.end_offset, t.disabled))
            })
            .collect();

        self.clipboard = Some(Clipboard {
            nodes,
            connections,
            transitions,
            source_level_kind: level,
        });
    }

    /// Copy, then delete the originals as one undo step.
    pub fn cut_selection(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        canvas: &mut Canvas,
    ) -> Result<(), CommandError> {
        self.copy_selection(graph);
        let Some(clip) = &self.clipboard else {
            return Ok(());
        };
        let mut group = CommandGroup::new("Cut nodes");
        for node in clip.nodes.iter().filter(|n| n.parent.is_none()) {
            group.push(Command::RemoveNode {
                name: node.name.clone(),
            });
        }
        exec.execute(graph, group)?;
        let events = graph.take_events();
        canvas.visual.apply_events(graph, &events);
        self.rebuild(graph);
        Ok(())
    }

    /// Paste at a pointer position in screen coordinates. A pointer
    /// outside the canvas viewport pastes nothing.
    pub fn paste_at(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        canvas: &mut Canvas,
        level: NodeId,
        pointer: (f32, f32),
    ) -> Result<(), CommandError> {
        let (x, y) = pointer;
        if x < 0.0 || y < 0.0 || x > canvas.viewport.0 || y > canvas.viewport.1 {
            return Ok(());
        }
        let (gx, gy) = canvas.camera.to_graph(x, y);
        self.paste(
            graph,
            exec,
            canvas,
            level,
            Some((gx.round() as i32, gy.round() as i32)),
        )
    }

    /// Paste the clipboard into `level` as one command group.
    ///
    /// Every top-level clipboard node must be legal under the target
    /// level's kind; otherwise nothing is pasted. Connections and
    /// transitions come along only when the target level kind matches the
    /// level the snapshot was taken from. `at` places the pasted block's
    /// corner; `None` offsets it slightly from the originals.
    pub fn paste(
        &mut self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        canvas: &mut Canvas,
        level: NodeId,
        at: Option<(i32, i32)>,
    ) -> Result<(), CommandError> {
        let Some(clip) = self.clipboard.clone() else {
            return Ok(());
        };
        let level_name = graph
            .node(level)
            .map(|n| n.name.clone())
            .ok_or_else(|| CommandError::UnknownNode(String::new()))?;
        let level_kind = graph
            .node(level)
            .map(|n| n.kind)
            .ok_or_else(|| CommandError::UnknownNode(level_name.clone()))?;

        for node in clip.nodes.iter().filter(|n| n.parent.is_none()) {
            if level_kind == NodeKind::StateMachine
                && !node.kind.capabilities().can_act_as_state
            {
                return Err(CommandError::KindNotAllowedHere(node.kind.type_name()));
            }
        }

        // Place the block: shift all top-level nodes so the block's
        // top-left corner lands at `at`.
        let min = clip
            .nodes
            .iter()
            .filter(|n| n.parent.is_none())
            .map(|n| n.position)
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1)))
            .unwrap_or((0, 0));
        let delta = match at {
            Some((x, y)) => (x - min.0, y - min.1),
            None => (30, 30),
        };

        let mut used = HashSet::new();
        let mut pasted_names: Vec<String> = Vec::with_capacity(clip.nodes.len());
        let mut group = CommandGroup::new("Paste nodes");
        for node in &clip.nodes {
            let name = unique_clip_name(graph, &mut used, &node.name);
            let (parent_name, position) = match node.parent {
                Some(p) => (pasted_names[p].clone(), node.position),
                None => (
                    level_name.clone(),
                    (node.position.0 + delta.0, node.position.1 + delta.1),
                ),
            };
            group.push(Command::CreateNode {
                parent: parent_name,
                kind: node.kind,
                name: name.clone(),
                position,
                attributes: node.attributes.clone(),
            });
            pasted_names.push(name);
        }

        // Edges between top-level nodes only make sense when the target
        // level has the same kind as the snapshot's origin; edges inside
        // a copied container always come along.
        let kinds_match = level_kind == clip.source_level_kind;
        for (source, sport, target, tport) in &clip.connections {
            let top_edge =
                clip.nodes[*source].parent.is_none() && clip.nodes[*target].parent.is_none();
            if top_edge && !kinds_match {
                continue;
            }
            group.push(Command::CreateConnection {
                source: Some(pasted_names[*source].clone()),
                target: pasted_names[*target].clone(),
                source_port: *sport,
                target_port: *tport,
                start_offset: (0, 0),
                end_offset: (0, 0),
                transition_id: None,
                connection_id: None,
            });
        }
        for (source, target, start_offset, end_offset, _disabled) in &clip.transitions {
            let top_edge = clip.nodes[*target].parent.is_none()
                && source.map(|s| clip.nodes[s].parent.is_none()).unwrap_or(true);
            if top_edge && !kinds_match {
                continue;
            }
            group.push(Command::CreateConnection {
                source: source.map(|s| pasted_names[s].clone()),
                target: pasted_names[*target].clone(),
                source_port: 0,
                target_port: 0,
                start_offset: *start_offset,
                end_offset: *end_offset,
                transition_id: None,
                connection_id: None,
            });
        }

        exec.execute(graph, group)?;
        let events = graph.take_events();
        canvas.visual.apply_events(graph, &events);
        self.rebuild(graph);
        Ok(())
    }
}

fn ancestor_of(graph: &AnimGraph, ancestor: NodeId, node: NodeId) -> bool {
    let mut current = graph.parent_of(node);
    while let Some(p) = current {
        if p == ancestor {
            return true;
        }
        current = graph.parent_of(p);
    }
    false
}

fn unique_clip_name(graph: &AnimGraph, used: &mut HashSet<String>, hint: &str) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use ag_core::CommandHistory;
    use pretty_assertions::assert_eq;

    fn create(parent: &str, kind: NodeKind, name: &str) -> Command {
        Command::CreateNode {
            parent: parent.into(),
            kind,
            name: name.into(),
            position: (0, 0),
            attributes: Vec::new(),
        }
    }

    fn connect(source: &str, target: &str, sport: usize, tport: usize) -> Command {
        Command::CreateConnection {
            source: Some(source.into()),
            target: target.into(),
            source_port: sport,
            target_port: tport,
            start_offset: (0, 0),
            end_offset: (0, 0),
            transition_id: None,
            connection_id: None,
        }
    }

    fn sample() -> (AnimGraph, CommandHistory) {
        let mut graph = AnimGraph::new();
        let mut history = CommandHistory::default();
        history
            .execute(
                &mut graph,
                CommandGroup {
                    description: "setup".into(),
                    commands: vec![
                        create("Root", NodeKind::StateMachine, "Locomotion"),
                        create("Locomotion", NodeKind::Motion, "Walk"),
                        create("Locomotion", NodeKind::Motion, "Run"),
                        create("Root", NodeKind::BlendTree, "UpperBody"),
                        create("UpperBody", NodeKind::Final, "FinalNode"),
                        create("UpperBody", NodeKind::Motion, "Wave"),
                        create("UpperBody", NodeKind::Parameter, "Amount"),
                    ],
                },
            )
            .unwrap();
        graph.take_events();
        (graph, history)
    }

    #[test]
    fn rows_follow_hierarchy() {
        let (graph, _) = sample();
        let nav = Navigator::new(&graph);
        let names: Vec<(&str, usize)> = nav
            .rows
            .iter()
            .map(|r| (r.name.as_str(), r.depth))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Root", 0),
                ("Locomotion", 1),
                ("Walk", 2),
                ("Run", 2),
                ("UpperBody", 1),
                ("FinalNode", 2),
                ("Wave", 2),
                ("Amount", 2),
            ]
        );
    }

    #[test]
    fn text_filter_keeps_ancestors() {
        let (graph, _) = sample();
        let mut nav = Navigator::new(&graph);
        nav.filter.text = "wAlK".into();
        nav.rebuild(&graph);
        let names: Vec<&str> = nav.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "Locomotion", "Walk"]);
    }

    #[test]
    fn kind_and_state_filters() {
        let (graph, _) = sample();
        let mut nav = Navigator::new(&graph);
        nav.filter.kinds = vec![NodeKind::Parameter];
        nav.rebuild(&graph);
        let names: Vec<&str> = nav.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "UpperBody", "Amount"]);

        nav.filter = TreeFilter {
            states_only: true,
            ..TreeFilter::default()
        };
        nav.rebuild(&graph);
        // States are immediate children of a state machine; blend-tree
        // internals drop out.
        let names: Vec<&str> = nav.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "Locomotion", "Walk", "Run", "UpperBody"]);
    }

    #[test]
    fn selection_sync_reentry_guard() {
        let (graph, _) = sample();
        let mut nav = Navigator::new(&graph);
        let walk = graph.id_by_name("Walk").unwrap();
        let run = graph.id_by_name("Run").unwrap();

        // The notify callback plays the canvas echoing the selection
        // back; the guard must drop the echo instead of recursing.
        nav.select(vec![walk], |nav, ids| {
            nav.apply_canvas_selection(&[run]);
            assert_eq!(ids, &[walk]);
        });
        assert_eq!(nav.selected(), &[walk]);

        // Outside a push the canvas side wins normally.
        nav.apply_canvas_selection(&[run]);
        assert_eq!(nav.selected(), &[run]);
    }

    #[test]
    fn history_back_and_forward() {
        let (graph, _) = sample();
        let mut nav = Navigator::new(&graph);
        let mut canvas = Canvas::new(&graph, graph.root_id());
        let locomotion = graph.id_by_name("Locomotion").unwrap();
        let upper = graph.id_by_name("UpperBody").unwrap();

        nav.open(&graph, &mut canvas, locomotion);
        nav.open_parent(&graph, &mut canvas);
        nav.open(&graph, &mut canvas, upper);
        assert_eq!(canvas.level(), upper);

        nav.history_back(&graph, &mut canvas);
        assert_eq!(canvas.level(), graph.root_id());
        nav.history_back(&graph, &mut canvas);
        assert_eq!(canvas.level(), locomotion);
        nav.history_forward(&graph, &mut canvas);
        assert_eq!(canvas.level(), graph.root_id());

        // A fresh open truncates the forward entries.
        nav.open(&graph, &mut canvas, locomotion);
        nav.history_forward(&graph, &mut canvas);
        assert_eq!(canvas.level(), locomotion);
    }

    #[test]
    fn leaf_selects_and_frames_instead_of_opening() {
        let (graph, _) = sample();
        let mut nav = Navigator::new(&graph);
        let mut canvas = Canvas::new(&graph, graph.root_id());
        let walk = graph.id_by_name("Walk").unwrap();
        nav.select(vec![walk], |_, _| {});
        nav.open_selected(&graph, &mut canvas);

        // A leaf shows its parent level with itself selected.
        let locomotion = graph.id_by_name("Locomotion").unwrap();
        assert_eq!(canvas.level(), locomotion);
        assert_eq!(canvas.visual.selected_nodes(), vec![walk]);

        // And the camera is centered on it.
        let rect = canvas
            .visual
            .nodes
            .iter()
            .find(|n| n.id == walk)
            .map(|n| n.rect)
            .unwrap();
        let (cx, cy) = rect.center();
        let (sx, sy) = canvas.camera.to_screen(cx, cy);
        assert!((sx - canvas.viewport.0 / 2.0).abs() < 0.5);
        assert!((sy - canvas.viewport.1 / 2.0).abs() < 0.5);
    }

    /// Adds a third state and wires Walk → Run → Turn plus Walk → Turn,
    /// then selects all three for the clipboard.
    fn wire_three_states(
        graph: &mut AnimGraph,
        history: &mut CommandHistory,
        nav: &mut Navigator,
    ) {
        history
            .execute(
                graph,
                CommandGroup {
                    description: "wire".into(),
                    commands: vec![
                        create("Locomotion", NodeKind::Motion, "Turn"),
                        connect("Walk", "Run", 0, 0),
                        connect("Run", "Turn", 0, 0),
                        connect("Walk", "Turn", 0, 0),
                    ],
                },
            )
            .unwrap();
        graph.take_events();
        nav.rebuild(graph);
        let walk = graph.id_by_name("Walk").unwrap();
        let run = graph.id_by_name("Run").unwrap();
        let turn = graph.id_by_name("Turn").unwrap();
        nav.select(vec![walk, run, turn], |_, _| {});
        nav.copy_selection(graph);
    }

    #[test]
    fn copy_paste_into_same_level_kind_brings_edges() {
        let (mut graph, mut history) = sample();
        let mut nav = Navigator::new(&graph);
        let mut canvas = Canvas::new(&graph, graph.root_id());
        wire_three_states(&mut graph, &mut history, &mut nav);

        // Paste back into the same state machine.
        let locomotion = graph.id_by_name("Locomotion").unwrap();
        nav.paste(&mut graph, &mut history, &mut canvas, locomotion, Some((500, 0)))
            .unwrap();

        let walk1 = graph.node_by_name("Walk1").unwrap();
        assert_eq!(graph.parent_of(walk1.id), Some(locomotion));
        assert_eq!(walk1.position, (500, 0));
        assert!(graph.node_by_name("Run1").is_some());
        assert!(graph.node_by_name("Turn1").is_some());
        // All three internal transitions came along.
        assert_eq!(graph.transitions.len(), 6);

        // One undo removes the whole paste.
        history.undo(&mut graph).unwrap();
        assert!(graph.node_by_name("Walk1").is_none());
        assert_eq!(graph.transitions.len(), 3);
    }

    #[test]
    fn paste_into_other_level_kind_drops_edges() {
        let (mut graph, mut history) = sample();
        let mut nav = Navigator::new(&graph);
        let mut canvas = Canvas::new(&graph, graph.root_id());
        wire_three_states(&mut graph, &mut history, &mut nav);

        // Motions are legal in a blend tree, but the state transitions
        // between them are not carried across level kinds.
        let upper = graph.id_by_name("UpperBody").unwrap();
        nav.paste(&mut graph, &mut history, &mut canvas, upper, None)
            .unwrap();
        for name in ["Walk1", "Run1", "Turn1"] {
            assert_eq!(
                graph.parent_of(graph.id_by_name(name).unwrap()),
                Some(upper)
            );
        }
        assert_eq!(graph.transitions.len(), 3);
    }

    #[test]
    fn paste_outside_viewport_is_a_no_op() {
        let (mut graph, mut history) = sample();
        let mut nav = Navigator::new(&graph);
        let mut canvas = Canvas::new(&graph, graph.root_id());
        let wave = graph.id_by_name("Wave").unwrap();
        nav.select(vec![wave], |_, _| {});
        nav.copy_selection(&graph);

        let upper = graph.id_by_name("UpperBody").unwrap();
        let before = graph.node_count();
        let outside = (canvas.viewport.0 + 1.0, 10.0);
        nav.paste_at(&mut graph, &mut history, &mut canvas, upper, outside)
            .unwrap();
        nav.paste_at(&mut graph, &mut history, &mut canvas, upper, (10.0, -1.0))
            .unwrap();
        assert_eq!(graph.node_count(), before);
        assert!(graph.node_by_name("Wave1").is_none());

        // In bounds, the pointer position places the block.
        nav.paste_at(&mut graph, &mut history, &mut canvas, upper, (200.0, 100.0))
            .unwrap();
        let wave1 = graph.node_by_name("Wave1").unwrap();
        assert_eq!(wave1.position, (200, 100));
    }

    #[test]
    fn paste_rejects_illegal_top_kind() {
        let (mut graph, mut history) = sample();
        let mut nav = Navigator::new(&graph);
        let mut canvas = Canvas::new(&graph, graph.root_id());

        // A parameter node cannot act as a state.
        let amount = graph.id_by_name("Amount").unwrap();
        nav.select(vec![amount], |_, _| {});
        nav.copy_selection(&graph);
        let locomotion = graph.id_by_name("Locomotion").unwrap();
        let err = nav
            .paste(&mut graph, &mut history, &mut canvas, locomotion, None)
            .unwrap_err();
        assert_eq!(err, CommandError::KindNotAllowedHere("Parameter"));
        assert!(graph.node_by_name("Amount1").is_none());
    }

    #[test]
    fn copy_subtree_copies_descendants_once() {
        let (mut graph, mut history) = sample();
        let mut nav = Navigator::new(&graph);
        let mut canvas = Canvas::new(&graph, graph.root_id());

        // Selecting both the container and a node inside it must not
        // duplicate the inner node.
        let upper = graph.id_by_name("UpperBody").unwrap();
        let wave = graph.id_by_name("Wave").unwrap();
        nav.select(vec![upper, wave], |_, _| {});
        nav.copy_selection(&graph);
        let root = graph.root_id();
        nav.paste(&mut graph, &mut history, &mut canvas, root, None)
            .unwrap();

        assert!(graph.node_by_name("UpperBody1").is_some());
        assert!(graph.node_by_name("Wave1").is_some());
        assert!(graph.node_by_name("Wave2").is_none());
        let upper1 = graph.id_by_name("UpperBody1").unwrap();
        let wave1 = graph.id_by_name("Wave1").unwrap();
        assert_eq!(graph.parent_of(wave1), Some(upper1));
    }

    #[test]
    fn cut_removes_originals_and_paste_recreates() {
        let (mut graph, mut history) = sample();
        let mut nav = Navigator::new(&graph);
        let mut canvas = Canvas::new(&graph, graph.root_id());

        let wave = graph.id_by_name("Wave").unwrap();
        nav.select(vec![wave], |_, _| {});
        nav.cut_selection(&mut graph, &mut history, &mut canvas)
            .unwrap();
        assert!(graph.node_by_name("Wave").is_none());

        let upper = graph.id_by_name("UpperBody").unwrap();
        nav.paste(&mut graph, &mut history, &mut canvas, upper, None)
            .unwrap();
        // The original name is free again.
        assert!(graph.node_by_name("Wave").is_some());
    }
}
