//! Context-menu construction.
//!
//! The menu for a canvas right-click is derived from the current
//! selection and the capabilities of the nodes in it; nothing here
//! inspects concrete node types beyond `NodeCapabilities`. Choosing an
//! entry turns into exactly one command group.

use crate::canvas::Canvas;
use ag_core::{
    AnimGraph, Command, CommandError, CommandExecutor, CommandGroup, NodeId, NodeKind,
    TransitionId,
};

/// Horizontal/vertical spacing between stacked wildcard arrowheads.
const WILDCARD_STAGGER: i32 = 15;

/// Node kinds offered by the create submenu. The final node is excluded;
/// it exists exactly once per blend tree and is created with it.
const PALETTE: [NodeKind; 5] = [
    NodeKind::StateMachine,
    NodeKind::BlendTree,
    NodeKind::Motion,
    NodeKind::Blend2,
    NodeKind::Parameter,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    CreateNode(NodeKind),
    OpenSelected,
    RenameSelected,
    DeleteSelected,
    SetEnabled(bool),
    SetVisualize(bool),
    SetAsEntryState,
    AddWildcardTransition,
    SetAsVirtualFinal,
    RestoreVirtualFinal,
    AssignToGroup(String),
    RemoveFromGroup(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub action: MenuAction,
}

fn entry(label: impl Into<String>, action: MenuAction) -> MenuEntry {
    MenuEntry {
        label: label.into(),
        action,
    }
}

/// Build the context menu for the current canvas selection.
pub fn build_context_menu(graph: &AnimGraph, canvas: &Canvas) -> Vec<MenuEntry> {
    let level = canvas.level();
    let level_kind = match graph.node(level) {
        Some(n) => n.kind,
        None => return Vec::new(),
    };
    let selection = canvas.visual.selected_nodes();
    let mut menu = Vec::new();

    if selection.is_empty() {
        for kind in PALETTE {
            if level_kind == NodeKind::StateMachine && !kind.capabilities().can_act_as_state {
                continue;
            }
            menu.push(entry(
                format!("Create {}", kind.palette_name()),
                MenuAction::CreateNode(kind),
            ));
        }
        return menu;
    }

    if let [single] = selection[..] {
        let Some(node) = graph.node(single) else {
            return menu;
        };
        let caps = node.capabilities();
        if caps.can_have_children {
            menu.push(entry("Open", MenuAction::OpenSelected));
        }
        menu.push(entry("Rename", MenuAction::RenameSelected));
        if caps.supports_disable {
            if node.enabled {
                menu.push(entry("Disable", MenuAction::SetEnabled(false)));
            } else {
                menu.push(entry("Enable", MenuAction::SetEnabled(true)));
            }
        }
        if caps.supports_visualization {
            menu.push(entry(
                if node.visualize {
                    "Hide Visualization"
                } else {
                    "Visualize"
                },
                MenuAction::SetVisualize(!node.visualize),
            ));
        }
        if level_kind == NodeKind::StateMachine && caps.can_act_as_state {
            if graph.entry_state(level) != Some(single) {
                menu.push(entry("Set As Entry State", MenuAction::SetAsEntryState));
            }
            menu.push(entry(
                "Add Wildcard Transition",
                MenuAction::AddWildcardTransition,
            ));
        }
        if level_kind == NodeKind::BlendTree && caps.has_output_pose {
            if graph.virtual_final(level) == Some(single) {
                menu.push(entry(
                    "Restore Virtual Final Node",
                    MenuAction::RestoreVirtualFinal,
                ));
            } else {
                menu.push(entry(
                    "Set As Virtual Final Node",
                    MenuAction::SetAsVirtualFinal,
                ));
            }
        }
    }

    // Group assignment applies to any non-empty selection.
    for g in graph.groups_at(level) {
        menu.push(entry(
            format!("Assign To Group \"{}\"", g.name),
            MenuAction::AssignToGroup(g.name.clone()),
        ));
    }
    if let Some(g) = selection
        .first()
        .and_then(|id| graph.group_of(level, *id))
    {
        menu.push(entry(
            format!("Remove From Group \"{}\"", g.name),
            MenuAction::RemoveFromGroup(g.name.clone()),
        ));
    }

    if selection.iter().any(|id| {
        graph
            .node(*id)
            .map(|n| n.capabilities().deletable)
            .unwrap_or(false)
    }) {
        menu.push(entry("Delete Selected", MenuAction::DeleteSelected));
    }
    menu
}

// ─── Command construction for menu picks ─────────────────────────────────

/// Create a node of `kind` at the given graph position, named after its
/// palette name.
pub fn create_node(
    graph: &mut AnimGraph,
    exec: &mut dyn CommandExecutor,
    level: NodeId,
    kind: NodeKind,
    position: (i32, i32),
) -> Result<String, CommandError> {
    let parent = graph
        .node(level)
        .map(|n| n.name.clone())
        .ok_or_else(|| CommandError::UnknownNode(format!("{level}")))?;
    let hint: String = kind.palette_name().replace(' ', "");
    let name = graph.generate_unique_name(&hint);
    let mut group = CommandGroup::new(format!("Create {}", kind.palette_name()));
    group.push(Command::CreateNode {
        parent,
        kind,
        name: name.clone(),
        position,
        attributes: Vec::new(),
    });
    // A blend tree is born with its (sole, permanent) final node.
    if kind == NodeKind::BlendTree {
        group.push(Command::CreateNode {
            parent: name.clone(),
            kind: NodeKind::Final,
            name: graph.generate_unique_name("FinalNode"),
            position: (position.0 + 300, position.1),
            attributes: Vec::new(),
        });
    }
    exec.execute(graph, group)?;
    Ok(name)
}

pub fn set_enabled(
    graph: &mut AnimGraph,
    exec: &mut dyn CommandExecutor,
    nodes: &[NodeId],
    enabled: bool,
) -> Result<(), CommandError> {
    let mut group = CommandGroup::new(if enabled {
        "Enable nodes"
    } else {
        "Disable nodes"
    });
    for id in nodes {
        if let Some(node) = graph.node(*id) {
            if node.capabilities().supports_disable && node.enabled != enabled {
                group.push(Command::AdjustNode {
                    name: node.name.clone(),
                    new_name: None,
                    position: None,
                    enabled: Some(enabled),
                    visualize: None,
                    collapsed: None,
                });
            }
        }
    }
    if group.is_empty() {
        return Ok(());
    }
    exec.execute(graph, group)?;
    Ok(())
}

pub fn set_visualize(
    graph: &mut AnimGraph,
    exec: &mut dyn CommandExecutor,
    nodes: &[NodeId],
    visualize: bool,
) -> Result<(), CommandError> {
    let mut group = CommandGroup::new("Change visualization");
    for id in nodes {
        if let Some(node) = graph.node(*id) {
            if node.capabilities().supports_visualization && node.visualize != visualize {
                group.push(Command::AdjustNode {
                    name: node.name.clone(),
                    new_name: None,
                    position: None,
                    enabled: None,
                    visualize: Some(visualize),
                    collapsed: None,
                });
            }
        }
    }
    if group.is_empty() {
        return Ok(());
    }
    exec.execute(graph, group)?;
    Ok(())
}

pub fn set_as_entry_state(
    graph: &mut AnimGraph,
    exec: &mut dyn CommandExecutor,
    state: NodeId,
) -> Result<(), CommandError> {
    let state_name = graph
        .node(state)
        .map(|n| n.name.clone())
        .ok_or_else(|| CommandError::UnknownNode(format!("{state}")))?;
    let sm_name = graph
        .parent_of(state)
        .and_then(|p| graph.node(p))
        .map(|n| n.name.clone())
        .ok_or_else(|| CommandError::UnknownNode(state_name.clone()))?;
    exec.execute(
        graph,
        CommandGroup::single(
            "Set entry state",
            Command::SetEntryState {
                state_machine: sm_name,
                entry: Some(state_name),
            },
        ),
    )?;
    Ok(())
}

/// Add a wildcard transition ending at `target`. Repeated wildcards on
/// the same state stagger their arrowheads so they stay clickable:
/// the offset alternates between stepping down and stepping right.
pub fn add_wildcard_transition(
    graph: &mut AnimGraph,
    exec: &mut dyn CommandExecutor,
    target: NodeId,
) -> Result<TransitionId, CommandError> {
    let target_name = graph
        .node(target)
        .map(|n| n.name.clone())
        .ok_or_else(|| CommandError::UnknownNode(format!("{target}")))?;
    let n = graph.wildcard_count(target) as i32;
    let end_offset = if n % 2 == 0 {
        (0, (n / 2) * WILDCARD_STAGGER)
    } else {
        ((n / 2 + 1) * WILDCARD_STAGGER, 0)
    };
    exec.execute(
        graph,
        CommandGroup::single(
            "Add wildcard transition",
            Command::CreateConnection {
                source: None,
                target: target_name,
                source_port: 0,
                target_port: 0,
                start_offset: (0, 0),
                end_offset,
                transition_id: None,
                connection_id: None,
            },
        ),
    )?;
    graph
        .transitions
        .last()
        .map(|t| t.id)
        .ok_or(CommandError::EmptyGroup)
}

/// Route a blend tree's output through `node` instead of its final node,
/// or restore the real final node with `node = None`.
pub fn set_virtual_final(
    graph: &mut AnimGraph,
    exec: &mut dyn CommandExecutor,
    blend_tree: NodeId,
    node: Option<NodeId>,
) -> Result<(), CommandError> {
    let tree_name = graph
        .node(blend_tree)
        .map(|n| n.name.clone())
        .ok_or_else(|| CommandError::UnknownNode(format!("{blend_tree}")))?;
    let node_name = node.and_then(|n| graph.node(n)).map(|n| n.name.clone());
    exec.execute(
        graph,
        CommandGroup::single(
            if node_name.is_some() {
                "Set virtual final node"
            } else {
                "Restore virtual final node"
            },
            Command::SetVirtualFinal {
                blend_tree: tree_name,
                node: node_name,
            },
        ),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ag_core::CommandHistory;
    use pretty_assertions::assert_eq;

    fn sample() -> (AnimGraph, CommandHistory) {
        let mut graph = AnimGraph::new();
        let mut history = CommandHistory::default();
        history
            .execute(
                &mut graph,
                CommandGroup {
                    description: "setup".into(),
                    commands: vec![
                        Command::CreateNode {
                            parent: "Root".into(),
                            kind: NodeKind::Motion,
                            name: "Idle".into(),
                            position: (0, 0),
                            attributes: Vec::new(),
                        },
                        Command::CreateNode {
                            parent: "Root".into(),
                            kind: NodeKind::BlendTree,
                            name: "Tree".into(),
                            position: (300, 0),
                            attributes: Vec::new(),
                        },
                        Command::CreateNode {
                            parent: "Tree".into(),
                            kind: NodeKind::Final,
                            name: "FinalNode".into(),
                            position: (600, 0),
                            attributes: Vec::new(),
                        },
                        Command::CreateNode {
                            parent: "Tree".into(),
                            kind: NodeKind::Parameter,
                            name: "Speed".into(),
                            position: (0, 100),
                            attributes: Vec::new(),
                        },
                    ],
                },
            )
            .unwrap();
        graph.take_events();
        (graph, history)
    }

    #[test]
    fn empty_selection_offers_palette_without_final() {
        let (graph, _) = sample();
        let canvas = Canvas::new(&graph, graph.root_id());
        let menu = build_context_menu(&graph, &canvas);
        assert!(menu
            .iter()
            .all(|e| !matches!(e.action, MenuAction::CreateNode(NodeKind::Final))));
        // Root is a state machine: no raw blend nodes in the palette.
        assert!(menu
            .iter()
            .all(|e| !matches!(e.action, MenuAction::CreateNode(NodeKind::Blend2))));
        assert!(menu
            .iter()
            .any(|e| matches!(e.action, MenuAction::CreateNode(NodeKind::StateMachine))));
    }

    #[test]
    fn state_entries_only_for_states() {
        let (graph, _) = sample();
        let mut canvas = Canvas::new(&graph, graph.root_id());
        let idle = graph.id_by_name("Idle").unwrap();
        canvas.visual.select_only(idle);
        let menu = build_context_menu(&graph, &canvas);
        assert!(menu
            .iter()
            .any(|e| e.action == MenuAction::SetAsEntryState));
        assert!(menu
            .iter()
            .any(|e| e.action == MenuAction::AddWildcardTransition));

        // Inside the blend tree, a parameter gets neither state entries
        // nor enable/disable, and no virtual-final entry (no pose).
        let tree = graph.id_by_name("Tree").unwrap();
        let speed = graph.id_by_name("Speed").unwrap();
        let mut canvas = Canvas::new(&graph, tree);
        canvas.visual.select_only(speed);
        let menu = build_context_menu(&graph, &canvas);
        assert!(menu
            .iter()
            .all(|e| e.action != MenuAction::SetAsEntryState));
        assert!(menu
            .iter()
            .all(|e| !matches!(e.action, MenuAction::SetEnabled(_))));
        assert!(menu
            .iter()
            .all(|e| e.action != MenuAction::SetAsVirtualFinal));
    }

    #[test]
    fn final_node_has_no_delete_entry() {
        let (graph, _) = sample();
        let tree = graph.id_by_name("Tree").unwrap();
        let final_node = graph.id_by_name("FinalNode").unwrap();
        let mut canvas = Canvas::new(&graph, tree);
        canvas.visual.select_only(final_node);
        let menu = build_context_menu(&graph, &canvas);
        assert!(menu.iter().all(|e| e.action != MenuAction::DeleteSelected));
    }

    #[test]
    fn create_blend_tree_includes_final_in_one_group() {
        let (mut graph, mut history) = sample();
        let root = graph.root_id();
        let name = create_node(&mut graph, &mut history, root, NodeKind::BlendTree, (50, 50))
            .unwrap();
        let tree = graph.id_by_name(&name).unwrap();
        let children = graph.children(tree);
        assert_eq!(children.len(), 1);
        assert_eq!(graph.node(children[0]).unwrap().kind, NodeKind::Final);

        history.undo(&mut graph).unwrap();
        assert!(graph.id_by_name(&name).is_none());
    }

    #[test]
    fn wildcard_offsets_stagger() {
        let (mut graph, mut history) = sample();
        let idle = graph.id_by_name("Idle").unwrap();

        let mut offsets = Vec::new();
        for _ in 0..4 {
            add_wildcard_transition(&mut graph, &mut history, idle).unwrap();
            offsets.push(graph.transitions.last().unwrap().end_offset);
        }
        assert_eq!(offsets, vec![(0, 0), (15, 0), (0, 15), (30, 0)]);
        assert!(graph.transitions.iter().all(|t| t.source.is_none()));
    }

    #[test]
    fn entry_state_round_trip() {
        let (mut graph, mut history) = sample();
        let idle = graph.id_by_name("Idle").unwrap();
        set_as_entry_state(&mut graph, &mut history, idle).unwrap();
        assert_eq!(graph.entry_state(graph.root_id()), Some(idle));

        // The menu now offers no entry-state item for it.
        let mut canvas = Canvas::new(&graph, graph.root_id());
        canvas.visual.select_only(idle);
        let menu = build_context_menu(&graph, &canvas);
        assert!(menu.iter().all(|e| e.action != MenuAction::SetAsEntryState));
    }

    #[test]
    fn virtual_final_set_and_restore() {
        let (mut graph, mut history) = sample();
        let tree = graph.id_by_name("Tree").unwrap();

        // Give the tree a node with a pose output.
        history
            .execute(
                &mut graph,
                CommandGroup::single(
                    "m",
                    Command::CreateNode {
                        parent: "Tree".into(),
                        kind: NodeKind::Motion,
                        name: "Wave".into(),
                        position: (0, 0),
                        attributes: Vec::new(),
                    },
                ),
            )
            .unwrap();
        let wave = graph.id_by_name("Wave").unwrap();

        set_virtual_final(&mut graph, &mut history, tree, Some(wave)).unwrap();
        assert_eq!(graph.virtual_final(tree), Some(wave));

        let mut canvas = Canvas::new(&graph, tree);
        canvas.visual.select_only(wave);
        let menu = build_context_menu(&graph, &canvas);
        assert!(menu
            .iter()
            .any(|e| e.action == MenuAction::RestoreVirtualFinal));

        set_virtual_final(&mut graph, &mut history, tree, None).unwrap();
        assert_eq!(graph.virtual_final(tree), None);
    }

    #[test]
    fn disable_then_enable_via_menu_actions() {
        let (mut graph, mut history) = sample();
        let idle = graph.id_by_name("Idle").unwrap();
        set_enabled(&mut graph, &mut history, &[idle], false).unwrap();
        assert!(!graph.node(idle).unwrap().enabled);

        let mut canvas = Canvas::new(&graph, graph.root_id());
        canvas.visual.select_only(idle);
        let menu = build_context_menu(&graph, &canvas);
        assert!(menu
            .iter()
            .any(|e| e.action == MenuAction::SetEnabled(true)));

        history.undo(&mut graph).unwrap();
        assert!(graph.node(idle).unwrap().enabled);
    }
}
