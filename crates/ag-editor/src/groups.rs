//! Node-group management for one graph level.
//!
//! Groups are visual tags: a name, a color, a visibility flag, and a set
//! of member nodes. Everything here funnels into single-command groups so
//! each panel action is one undo step. Destroying all groups at a level
//! asks for confirmation first.

use ag_core::{
    AnimGraph, Color, Command, CommandError, CommandExecutor, CommandGroup, GroupAction, NodeId,
};

/// Rotating default palette for freshly created groups.
const GROUP_COLORS: [Color; 6] = [
    Color::rgb(108, 92, 231),
    Color::rgb(0, 184, 148),
    Color::rgb(214, 48, 49),
    Color::rgb(253, 203, 110),
    Color::rgb(9, 132, 227),
    Color::rgb(232, 67, 147),
];

/// Outcome of a clear-all request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// No groups at this level; nothing happened.
    NothingToClear,
    /// The caller must confirm and call again with `confirmed = true`.
    ConfirmationRequired,
    /// Groups removed (count).
    Cleared(usize),
}

/// Group operations scoped to one level.
pub struct GroupsPanel {
    pub level: NodeId,
}

impl GroupsPanel {
    pub fn new(level: NodeId) -> Self {
        Self { level }
    }

    fn level_name(&self, graph: &AnimGraph) -> Result<String, CommandError> {
        graph
            .node(self.level)
            .map(|n| n.name.clone())
            .ok_or_else(|| CommandError::UnknownNode(format!("{}", self.level)))
    }

    /// Create a group with a generated unique name and the next palette
    /// color. Returns the new group's name.
    pub fn create_group(
        &self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
    ) -> Result<String, CommandError> {
        let level_name = self.level_name(graph)?;
        let existing = graph.groups_at(self.level);
        let mut n = existing.len();
        let name = loop {
            n += 1;
            let candidate = format!("UnnamedGroup{n}");
            if graph.group(self.level, &candidate).is_none() {
                break candidate;
            }
        };
        let color = GROUP_COLORS[existing.len() % GROUP_COLORS.len()];
        exec.execute(
            graph,
            CommandGroup::single(
                "Add node group",
                Command::AddNodeGroup {
                    level: level_name,
                    name: name.clone(),
                    color,
                },
            ),
        )?;
        Ok(name)
    }

    /// Rename a group. Empty and duplicate names are rejected and leave
    /// the group untouched; renaming to the current name does nothing.
    pub fn rename_group(
        &self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        name: &str,
        new_name: &str,
    ) -> Result<(), CommandError> {
        if new_name == name {
            return Ok(());
        }
        let level_name = self.level_name(graph)?;
        exec.execute(
            graph,
            CommandGroup::single(
                "Rename node group",
                Command::AdjustNodeGroup {
                    level: level_name,
                    name: name.to_string(),
                    new_name: Some(new_name.to_string()),
                    color: None,
                    visible: None,
                    action: None,
                },
            ),
        )?;
        Ok(())
    }

    pub fn remove_group(
        &self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        name: &str,
    ) -> Result<(), CommandError> {
        let level_name = self.level_name(graph)?;
        exec.execute(
            graph,
            CommandGroup::single(
                "Remove node group",
                Command::RemoveNodeGroup {
                    level: level_name,
                    name: name.to_string(),
                },
            ),
        )?;
        Ok(())
    }

    /// Remove every group at this level, as one undo step. Pass
    /// `confirmed = false` first; the caller shows a prompt and retries
    /// with `true`.
    pub fn clear_groups(
        &self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        confirmed: bool,
    ) -> Result<ClearOutcome, CommandError> {
        let level_name = self.level_name(graph)?;
        let names: Vec<String> = graph
            .groups_at(self.level)
            .iter()
            .map(|g| g.name.clone())
            .collect();
        if names.is_empty() {
            return Ok(ClearOutcome::NothingToClear);
        }
        if !confirmed {
            return Ok(ClearOutcome::ConfirmationRequired);
        }
        let mut group = CommandGroup::new("Remove all node groups");
        for name in &names {
            group.push(Command::RemoveNodeGroup {
                level: level_name.clone(),
                name: name.clone(),
            });
        }
        exec.execute(graph, group)?;
        Ok(ClearOutcome::Cleared(names.len()))
    }

    /// Recolor a group. Applied immediately, no dialog round trip.
    pub fn set_color(
        &self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        name: &str,
        color: Color,
    ) -> Result<(), CommandError> {
        let level_name = self.level_name(graph)?;
        exec.execute(
            graph,
            CommandGroup::single(
                "Change node group color",
                Command::AdjustNodeGroup {
                    level: level_name,
                    name: name.to_string(),
                    new_name: None,
                    color: Some(color),
                    visible: None,
                    action: None,
                },
            ),
        )?;
        Ok(())
    }

    pub fn set_visible(
        &self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        name: &str,
        visible: bool,
    ) -> Result<(), CommandError> {
        let level_name = self.level_name(graph)?;
        exec.execute(
            graph,
            CommandGroup::single(
                "Change node group visibility",
                Command::AdjustNodeGroup {
                    level: level_name,
                    name: name.to_string(),
                    new_name: None,
                    color: None,
                    visible: Some(visible),
                    action: None,
                },
            ),
        )?;
        Ok(())
    }

    /// Put the given nodes into `name`, displacing them from whatever
    /// group they were in before.
    pub fn assign_nodes(
        &self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        name: &str,
        nodes: &[NodeId],
    ) -> Result<(), CommandError> {
        let level_name = self.level_name(graph)?;
        let node_names: Vec<String> = nodes
            .iter()
            .filter_map(|id| graph.node(*id).map(|n| n.name.clone()))
            .collect();
        if node_names.is_empty() {
            return Ok(());
        }
        exec.execute(
            graph,
            CommandGroup::single(
                "Assign nodes to group",
                Command::AdjustNodeGroup {
                    level: level_name,
                    name: name.to_string(),
                    new_name: None,
                    color: None,
                    visible: None,
                    action: Some(GroupAction::Add(node_names)),
                },
            ),
        )?;
        Ok(())
    }

    /// Take the given nodes out of `name`.
    pub fn unassign_nodes(
        &self,
        graph: &mut AnimGraph,
        exec: &mut dyn CommandExecutor,
        name: &str,
        nodes: &[NodeId],
    ) -> Result<(), CommandError> {
        let level_name = self.level_name(graph)?;
        let node_names: Vec<String> = nodes
            .iter()
            .filter_map(|id| graph.node(*id).map(|n| n.name.clone()))
            .collect();
        if node_names.is_empty() {
            return Ok(());
        }
        exec.execute(
            graph,
            CommandGroup::single(
                "Remove nodes from group",
                Command::AdjustNodeGroup {
                    level: level_name,
                    name: name.to_string(),
                    new_name: None,
                    color: None,
                    visible: None,
                    action: Some(GroupAction::Remove(node_names)),
                },
            ),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ag_core::{CommandHistory, NodeKind};
    use pretty_assertions::assert_eq;

    fn sample() -> (AnimGraph, CommandHistory, GroupsPanel) {
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
                            name: "Walk".into(),
                            position: (0, 0),
                            attributes: Vec::new(),
                        },
                        Command::CreateNode {
                            parent: "Root".into(),
                            kind: NodeKind::Motion,
                            name: "Run".into(),
                            position: (0, 100),
                            attributes: Vec::new(),
                        },
                    ],
                },
            )
            .unwrap();
        let root = graph.root_id();
        (graph, history, GroupsPanel::new(root))
    }

    #[test]
    fn create_generates_unique_names_and_colors() {
        let (mut graph, mut history, panel) = sample();
        let a = panel.create_group(&mut graph, &mut history).unwrap();
        let b = panel.create_group(&mut graph, &mut history).unwrap();
        assert_eq!(a, "UnnamedGroup1");
        assert_eq!(b, "UnnamedGroup2");
        let root = graph.root_id();
        assert_ne!(
            graph.group(root, &a).unwrap().color,
            graph.group(root, &b).unwrap().color
        );
    }

    #[test]
    fn rename_rejects_duplicates_and_empty() {
        let (mut graph, mut history, panel) = sample();
        let a = panel.create_group(&mut graph, &mut history).unwrap();
        let b = panel.create_group(&mut graph, &mut history).unwrap();

        let err = panel
            .rename_group(&mut graph, &mut history, &b, &a)
            .unwrap_err();
        assert_eq!(err, CommandError::DuplicateGroup(a.clone()));
        let err = panel
            .rename_group(&mut graph, &mut history, &b, "")
            .unwrap_err();
        assert_eq!(err, CommandError::EmptyName);

        panel
            .rename_group(&mut graph, &mut history, &b, "Locomotion")
            .unwrap();
        let root = graph.root_id();
        assert!(graph.group(root, "Locomotion").is_some());
        assert!(graph.group(root, &b).is_none());
    }

    #[test]
    fn rename_to_same_name_submits_nothing() {
        let (mut graph, mut history, panel) = sample();
        let a = panel.create_group(&mut graph, &mut history).unwrap();
        let depth = history.undo_descriptions().len();
        graph.take_events();

        panel.rename_group(&mut graph, &mut history, &a, &a).unwrap();
        assert_eq!(history.undo_descriptions().len(), depth);
        assert!(graph.take_events().is_empty());
    }

    #[test]
    fn clear_requires_confirmation() {
        let (mut graph, mut history, panel) = sample();
        assert_eq!(
            panel.clear_groups(&mut graph, &mut history, false).unwrap(),
            ClearOutcome::NothingToClear
        );
        panel.create_group(&mut graph, &mut history).unwrap();
        panel.create_group(&mut graph, &mut history).unwrap();

        assert_eq!(
            panel.clear_groups(&mut graph, &mut history, false).unwrap(),
            ClearOutcome::ConfirmationRequired
        );
        assert_eq!(graph.groups_at(graph.root_id()).len(), 2);

        assert_eq!(
            panel.clear_groups(&mut graph, &mut history, true).unwrap(),
            ClearOutcome::Cleared(2)
        );
        assert!(graph.groups_at(graph.root_id()).is_empty());

        // One undo step brings all groups back.
        history.undo(&mut graph).unwrap();
        assert_eq!(graph.groups_at(graph.root_id()).len(), 2);
    }

    #[test]
    fn color_and_visibility_apply_immediately() {
        let (mut graph, mut history, panel) = sample();
        let name = panel.create_group(&mut graph, &mut history).unwrap();
        let red = Color::rgb(255, 0, 0);
        panel
            .set_color(&mut graph, &mut history, &name, red)
            .unwrap();
        panel
            .set_visible(&mut graph, &mut history, &name, false)
            .unwrap();
        let root = graph.root_id();
        let g = graph.group(root, &name).unwrap();
        assert_eq!(g.color, red);
        assert!(!g.visible);
    }

    #[test]
    fn assign_and_unassign_members() {
        let (mut graph, mut history, panel) = sample();
        let name = panel.create_group(&mut graph, &mut history).unwrap();
        let walk = graph.id_by_name("Walk").unwrap();
        let run = graph.id_by_name("Run").unwrap();

        panel
            .assign_nodes(&mut graph, &mut history, &name, &[walk, run])
            .unwrap();
        let root = graph.root_id();
        assert_eq!(graph.group(root, &name).unwrap().members.len(), 2);

        panel
            .unassign_nodes(&mut graph, &mut history, &name, &[walk])
            .unwrap();
        assert_eq!(graph.group(root, &name).unwrap().members, vec![run]);
    }
}
