//! Human-readable dumps of the tree shape.

use crate::{
    coordinates::{CoordinateSpace, New, Old},
    node::{Location, Node, NodeId, Position},
    Patch,
};
use serde_json::json;
use smallvec::SmallVec;
use std::fmt::Write;

fn describe<S: CoordinateSpace>(node: &Node, location: &Location) -> String {
    format!(
        "{} - {} ({})",
        S::start(location),
        S::end(location),
        S::extent(node)
    )
}

impl Patch {
    /// Every node with its absolute location, in pre-order.
    fn located_nodes(&self) -> Vec<(NodeId, Location)> {
        let mut nodes = Vec::with_capacity(self.change_count as usize);
        let mut stack: SmallVec<[(NodeId, Position); 32]> = SmallVec::new();
        if let Some(root) = self.root {
            stack.push((root, Position::default()));
        }
        while let Some((id, origin)) = stack.pop() {
            let node = &self.arena[id];
            let preceding = match node.left {
                Some(left) => origin.after_subtree(&self.arena[left]),
                None => origin,
            };
            let location = Location::after(preceding, node);
            nodes.push((id, location));
            if let Some(right) = node.right {
                stack.push((right, location.end()));
            }
            if let Some(left) = node.left {
                stack.push((left, origin));
            }
        }
        nodes
    }

    /// The tree in Graphviz dot syntax.
    pub fn get_dot_graph(&self) -> String {
        let mut graph = String::from("digraph patch {\n  node [shape=box];\n");
        for (id, location) in self.located_nodes() {
            let node = &self.arena[id];
            let _ = writeln!(
                graph,
                "  node_{} [label=\"old: {}\\nnew: {}\"];",
                id.index(),
                describe::<Old>(node, &location),
                describe::<New>(node, &location),
            );
            if let Some(left) = node.left {
                let _ = writeln!(graph, "  node_{} -> node_{} [label=\"L\"];", id.index(), left.index());
            }
            if let Some(right) = node.right {
                let _ = writeln!(graph, "  node_{} -> node_{} [label=\"R\"];", id.index(), right.index());
            }
        }
        graph.push_str("}\n");
        graph
    }

    /// The tree as pretty-printed JSON, one object per node in pre-order.
    pub fn get_json(&self) -> String {
        let nodes: Vec<_> = self
            .located_nodes()
            .into_iter()
            .map(|(id, location)| {
                let node = &self.arena[id];
                json!({
                    "id": id.index(),
                    "left": node.left.map(NodeId::index),
                    "right": node.right.map(NodeId::index),
                    "old_start": location.old_start,
                    "old_end": location.old_end,
                    "new_start": location.new_start,
                    "new_end": location.new_end,
                    "old_text": node.old_text.as_ref().map(ToString::to_string),
                    "new_text": node.new_text.as_ref().map(ToString::to_string),
                    "old_text_size": node.old_text_size,
                    "new_text_size": node.new_text_size,
                })
            })
            .collect();
        let document = json!({
            "merges_adjacent_changes": self.merges_adjacent_changes,
            "change_count": self.change_count,
            "root": self.root.map(NodeId::index),
            "nodes": nodes,
        });
        format!("{document:#}")
    }
}
