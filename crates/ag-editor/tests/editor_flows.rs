//! End-to-end editing flows across canvas, navigator, menus, and groups,
//! all driven through the real command history.

use ag_core::{AnimGraph, CommandHistory, NodeKind};
use ag_editor::{
    build_context_menu, Canvas, GroupsPanel, InputEvent, MenuAction, Modifiers, Navigator,
    PointerButton, PortSide,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn press(canvas: &mut Canvas, graph: &mut AnimGraph, history: &mut CommandHistory, x: f32, y: f32) {
    canvas
        .handle_event(
            graph,
            history,
            &InputEvent::PointerDown {
                x,
                y,
                button: PointerButton::Left,
                modifiers: Modifiers::NONE,
            },
        )
        .unwrap();
}

fn release(canvas: &mut Canvas, graph: &mut AnimGraph, history: &mut CommandHistory, x: f32, y: f32) {
    canvas
        .handle_event(
            graph,
            history,
            &InputEvent::PointerUp {
                x,
                y,
                button: PointerButton::Left,
                modifiers: Modifiers::NONE,
            },
        )
        .unwrap();
}

fn port(canvas: &Canvas, graph: &AnimGraph, name: &str, side: PortSide, idx: usize) -> (f32, f32) {
    let id = graph.id_by_name(name).unwrap();
    canvas
        .visual
        .nodes
        .iter()
        .find(|n| n.id == id)
        .map(|n| n.port_position(side, idx))
        .unwrap()
}

/// Build a small graph through the same paths a user would take, then
/// unwind the entire session with undo.
#[test]
fn full_session_unwinds_with_undo() {
    init_logs();
    let mut graph = AnimGraph::new();
    let mut history = CommandHistory::default();
    let root = graph.root_id();
    let mut canvas = Canvas::new(&graph, root);

    // 1. Create a blend tree from the context menu (brings its final node).
    let tree_name = ag_editor::menu::create_node(
        &mut graph,
        &mut history,
        root,
        NodeKind::BlendTree,
        (100, 100),
    )
    .unwrap();
    let events = graph.take_events();
    canvas.visual.apply_events(&graph, &events);
    let tree = graph.id_by_name(&tree_name).unwrap();

    // 2. Dive into it and drop two motions from the motion-set window.
    let mut nav = Navigator::new(&graph);
    nav.open(&graph, &mut canvas, tree);
    canvas
        .drop_payload(
            &mut graph,
            &mut history,
            "window:MotionSet;motionId=walk_loop;name=Walk\n\
             window:MotionSet;motionId=run_loop;name=Run",
            (0.0, 0.0),
        )
        .unwrap();

    // 3. Wire Walk into the final node by dragging between ports.
    let (sx, sy) = port(&canvas, &graph, "Walk", PortSide::Output, 0);
    let (tx, ty) = port(&canvas, &graph, &final_name(&graph, tree), PortSide::Input, 0);
    press(&mut canvas, &mut graph, &mut history, sx, sy);
    release(&mut canvas, &mut graph, &mut history, tx, ty);
    assert_eq!(graph.connections.len(), 1);

    // 4. Replace it with Run by dropping on the same (occupied) port.
    let (sx, sy) = port(&canvas, &graph, "Run", PortSide::Output, 0);
    press(&mut canvas, &mut graph, &mut history, sx, sy);
    release(&mut canvas, &mut graph, &mut history, tx, ty);
    assert_eq!(graph.connections.len(), 1);
    let run = graph.id_by_name("Run").unwrap();
    assert_eq!(graph.connections[0].source_node, run);

    // 5. Group both motions.
    let panel = GroupsPanel::new(tree);
    let group = panel.create_group(&mut graph, &mut history).unwrap();
    let walk = graph.id_by_name("Walk").unwrap();
    panel
        .assign_nodes(&mut graph, &mut history, &group, &[walk, run])
        .unwrap();
    assert_eq!(graph.group(tree, &group).unwrap().members.len(), 2);

    // Unwind: every step above was exactly one undo.
    for _ in 0..6 {
        history.undo(&mut graph).unwrap();
    }
    assert!(!history.can_undo());
    assert_eq!(graph.node_count(), 1);
    assert!(graph.connections.is_empty());
    assert!(graph.groups.is_empty());

    // And replay it all forward again.
    while history.can_redo() {
        history.redo(&mut graph).unwrap();
    }
    assert!(graph.node_by_name("Walk").is_some());
    assert_eq!(graph.connections.len(), 1);
    assert_eq!(graph.groups.len(), 1);
}

fn final_name(graph: &AnimGraph, tree: ag_core::NodeId) -> String {
    graph
        .children(tree)
        .into_iter()
        .filter_map(|c| graph.node(c))
        .find(|n| n.kind == NodeKind::Final)
        .map(|n| n.name.clone())
        .unwrap()
}

/// A cross-level state-machine flow: states, transitions, entry state,
/// and a delete whose cascade and undo stay consistent.
#[test]
fn state_machine_flow() {
    init_logs();
    let mut graph = AnimGraph::new();
    let mut history = CommandHistory::default();
    let root = graph.root_id();
    let mut canvas = Canvas::new(&graph, root);

    canvas
        .drop_payload(
            &mut graph,
            &mut history,
            "AnimGraph;Motion;Idle\nAnimGraph;Motion;Jump",
            (0.0, 0.0),
        )
        .unwrap();
    let idle = graph.id_by_name("Idle").unwrap();
    let jump = graph.id_by_name("Jump").unwrap();

    // Transition Idle → Jump via port drag; Jump sits 60 below Idle.
    let (sx, sy) = port(&canvas, &graph, "Idle", PortSide::Output, 0);
    press(&mut canvas, &mut graph, &mut history, sx, sy);
    let jump_rect = canvas
        .visual
        .nodes
        .iter()
        .find(|n| n.id == jump)
        .map(|n| n.rect)
        .unwrap();
    release(
        &mut canvas,
        &mut graph,
        &mut history,
        jump_rect.x + 5.0,
        jump_rect.y + 5.0,
    );
    assert_eq!(graph.transitions.len(), 1);

    ag_editor::menu::set_as_entry_state(&mut graph, &mut history, idle).unwrap();
    ag_editor::menu::add_wildcard_transition(&mut graph, &mut history, jump).unwrap();
    assert_eq!(graph.transitions.len(), 2);

    // Delete Jump: its transitions cascade away.
    canvas.visual.rebuild(&graph);
    canvas.visual.select_only(jump);
    canvas.delete_selected(&mut graph, &mut history).unwrap();
    assert!(graph.node_by_name("Jump").is_none());
    assert!(graph.transitions.is_empty());
    assert_eq!(graph.entry_state(root), Some(idle));

    history.undo(&mut graph).unwrap();
    assert_eq!(graph.transitions.len(), 2);
    let jump = graph.id_by_name("Jump").unwrap();
    assert!(graph
        .transitions
        .iter()
        .any(|t| t.source.is_none() && t.target == jump));
}

/// The menu follows the model as commands execute.
#[test]
fn menu_tracks_model_state() {
    init_logs();
    let mut graph = AnimGraph::new();
    let mut history = CommandHistory::default();
    let root = graph.root_id();
    let mut canvas = Canvas::new(&graph, root);

    canvas
        .drop_payload(&mut graph, &mut history, "AnimGraph;Motion;Idle", (0.0, 0.0))
        .unwrap();
    let idle = graph.id_by_name("Idle").unwrap();
    canvas.visual.select_only(idle);

    let menu = build_context_menu(&graph, &canvas);
    assert!(menu.iter().any(|e| e.action == MenuAction::SetAsEntryState));

    ag_editor::menu::set_as_entry_state(&mut graph, &mut history, idle).unwrap();
    let menu = build_context_menu(&graph, &canvas);
    assert!(menu.iter().all(|e| e.action != MenuAction::SetAsEntryState));

    history.undo(&mut graph).unwrap();
    let menu = build_context_menu(&graph, &canvas);
    assert!(menu.iter().any(|e| e.action == MenuAction::SetAsEntryState));
}
