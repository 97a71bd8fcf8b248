//! Graphviz export of a populated graph
//!
//! Intended for debugging a frame's structure: run after
//! [`compile`](crate::render_graph::RenderGraph::compile) so culled nodes are
//! rendered greyed out.

use crate::render_graph::graph::RenderGraph;
use crate::render_graph::node::RenderGraphNode;
use std::io::{self, Write};

/// Write the graph in DOT format.
///
/// Passes render as boxes and resources as ellipses; edges are labelled with
/// the resource state the pass requires.
pub fn write_dot(graph: &RenderGraph, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "digraph render_graph {{")?;
    writeln!(out, "  rankdir=LR;")?;

    for id in graph.dep_graph.node_ids() {
        let label = escape(&graph.node_label(id));
        let culled =
            graph.culled_passes.contains(&id) || graph.culled_resources.contains(&id);
        let style = if culled { ", style=dashed, color=gray" } else { "" };
        match graph.dep_graph.node_at(id) {
            RenderGraphNode::Pass(pass) => writeln!(
                out,
                "  n{} [label=\"{}\\n({})\", shape=box{}];",
                id.index(),
                label,
                pass.kind_name(),
                style
            )?,
            RenderGraphNode::Resource(_) => writeln!(
                out,
                "  n{} [label=\"{}\", shape=ellipse{}];",
                id.index(),
                label,
                style
            )?,
        }
    }

    for id in graph.dep_graph.node_ids() {
        for (_, to, edge) in graph.dep_graph.outgoing_edges(id) {
            writeln!(
                out,
                "  n{} -> n{} [label=\"{:?}\"];",
                id.index(),
                to.index(),
                edge.state
            )?;
        }
    }

    writeln!(out, "}}")
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
