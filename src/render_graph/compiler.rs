//! Graph compilation: liveness culling, cycle detection, state resolution

use crate::backend::types::ResourceState;
use crate::graph::{DependencyGraph, NodeId};
use crate::render_graph::edge::RenderGraphEdge;
use crate::render_graph::graph::RenderGraphError;
use crate::render_graph::node::RenderGraphNode;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// One scheduled state a resource must be transitioned into before `pass` runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTouch {
    pub pass: NodeId,
    pub state: ResourceState,
}

/// Ordered transition sequence for one live resource
#[derive(Debug, Clone)]
pub struct ResourceTimeline {
    pub init_state: ResourceState,
    /// In schedule order, with adjacent duplicates merged
    pub touches: Vec<StateTouch>,
}

/// Live range of a resource in schedule positions, first touch to last touch
#[derive(Debug, Clone, Copy)]
pub struct ResourceLifetime {
    pub first_use: usize,
    pub last_use: usize,
}

/// Result of [`compile`]: the execution schedule plus per-resource metadata
pub struct CompiledGraph {
    /// Live passes in topological order, ties broken by ascending ordinal
    pub schedule: Vec<NodeId>,
    pub timelines: HashMap<NodeId, ResourceTimeline>,
    pub lifetimes: HashMap<NodeId, ResourceLifetime>,
}

type Graph = DependencyGraph<RenderGraphNode, RenderGraphEdge>;

fn label(graph: &Graph, id: NodeId) -> String {
    match graph.node_at(id).name() {
        Some(name) => name.to_string(),
        None => format!("#{}", id.index()),
    }
}

/// Cull unreachable nodes and resolve per-resource state transitions.
///
/// Culled handles are appended to `culled_passes`/`culled_resources`; live
/// passes are ordered with Kahn's algorithm and a cycle among them aborts
/// compilation.
pub fn compile(
    graph: &Graph,
    passes: &[NodeId],
    resources: &[NodeId],
    culled_passes: &mut Vec<NodeId>,
    culled_resources: &mut Vec<NodeId>,
) -> Result<CompiledGraph, RenderGraphError> {
    culled_passes.clear();
    culled_resources.clear();

    let live = cull(graph, passes, resources);

    for &pass in passes {
        if !live.contains(&pass) {
            log::trace!("culled pass `{}`", label(graph, pass));
            culled_passes.push(pass);
        }
    }
    for &resource in resources {
        if !live.contains(&resource) {
            log::trace!("culled resource `{}`", label(graph, resource));
            culled_resources.push(resource);
        }
    }

    let live_passes: Vec<NodeId> = passes.iter().copied().filter(|p| live.contains(p)).collect();
    let schedule = toposort(graph, &live_passes, &live)?;

    let position: HashMap<NodeId, usize> =
        schedule.iter().enumerate().map(|(i, &p)| (p, i)).collect();

    let mut timelines = HashMap::new();
    let mut lifetimes = HashMap::new();
    for &resource in resources {
        if !live.contains(&resource) {
            continue;
        }
        let node = graph
            .node_at(resource)
            .as_resource()
            .expect("resource list holds resource nodes");

        // Gather every touch by a live pass, in schedule order.
        let mut touches: Vec<(usize, StateTouch)> = Vec::new();
        for (_, writer, edge) in graph.incoming_edges(resource) {
            if let Some(&pos) = position.get(&writer) {
                touches.push((pos, StateTouch { pass: writer, state: edge.state }));
            }
        }
        for (_, reader, edge) in graph.outgoing_edges(resource) {
            if let Some(&pos) = position.get(&reader) {
                touches.push((pos, StateTouch { pass: reader, state: edge.state }));
            }
        }
        if touches.is_empty() {
            // Exported but untouched this frame, nothing to transition.
            continue;
        }
        touches.sort_by_key(|(pos, _)| *pos);

        lifetimes.insert(
            resource,
            ResourceLifetime {
                first_use: touches.first().map(|(pos, _)| *pos).unwrap_or(0),
                last_use: touches.last().map(|(pos, _)| *pos).unwrap_or(0),
            },
        );

        // Merge consecutive touches requiring the same state into one
        // transition; the minimal sequence never repeats a state back to back.
        let mut merged: Vec<StateTouch> = Vec::with_capacity(touches.len());
        for (_, touch) in touches {
            match merged.last() {
                Some(last) if last.state == touch.state => {}
                _ => merged.push(touch),
            }
        }
        timelines.insert(
            resource,
            ResourceTimeline {
                init_state: node.init_state,
                touches: merged,
            },
        );
    }

    Ok(CompiledGraph {
        schedule,
        timelines,
        lifetimes,
    })
}

/// A node is live if it is backward-reachable from the root set: present
/// passes and exported resources. Write targets of live passes are live too,
/// since executing the pass requires them to exist.
fn cull(graph: &Graph, passes: &[NodeId], resources: &[NodeId]) -> HashSet<NodeId> {
    let mut live: HashSet<NodeId> = HashSet::new();
    let mut stack: Vec<NodeId> = Vec::new();

    for &pass in passes {
        let node = graph.node_at(pass).as_pass().expect("pass list holds pass nodes");
        if node.is_present() {
            stack.push(pass);
        }
    }
    for &resource in resources {
        let node = graph
            .node_at(resource)
            .as_resource()
            .expect("resource list holds resource nodes");
        if node.exported {
            stack.push(resource);
        }
    }

    // Incoming edges always point at dependencies: resources a pass consumes,
    // or passes that write a resource.
    while let Some(id) = stack.pop() {
        if !live.insert(id) {
            continue;
        }
        for (_, dependency, _) in graph.incoming_edges(id) {
            if !live.contains(&dependency) {
                stack.push(dependency);
            }
        }
    }

    let written: Vec<NodeId> = live
        .iter()
        .filter(|id| matches!(graph.node_at(**id), RenderGraphNode::Pass(_)))
        .flat_map(|&pass| graph.outgoing_edges(pass).map(|(_, target, _)| target))
        .collect();
    live.extend(written);

    live
}

/// Kahn's algorithm over writer -> reader dependencies, ties broken by
/// ascending pass ordinal for reproducible schedules
fn toposort(graph: &Graph, live_passes: &[NodeId], live: &HashSet<NodeId>) -> Result<Vec<NodeId>, RenderGraphError> {
    let mut successors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut in_degree: HashMap<NodeId, usize> = live_passes.iter().map(|&p| (p, 0)).collect();

    for &pass in live_passes {
        // Writes of `pass` feed every live reader of the written resource.
        for (_, resource, _) in graph.outgoing_edges(pass) {
            if !live.contains(&resource) {
                continue;
            }
            for (_, reader, _) in graph.outgoing_edges(resource) {
                if reader == pass || !live.contains(&reader) {
                    continue;
                }
                successors.entry(pass).or_default().push(reader);
                *in_degree.get_mut(&reader).expect("reader is live") += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<(u32, NodeId)>> = live_passes
        .iter()
        .filter(|p| in_degree[p] == 0)
        .map(|&p| Reverse((pass_order(graph, p), p)))
        .collect();

    let mut schedule = Vec::with_capacity(live_passes.len());
    while let Some(Reverse((_, pass))) = ready.pop() {
        schedule.push(pass);
        if let Some(next) = successors.get(&pass) {
            for &reader in next {
                let degree = in_degree.get_mut(&reader).expect("reader is live");
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse((pass_order(graph, reader), reader)));
                }
            }
        }
    }

    if schedule.len() != live_passes.len() {
        let scheduled: HashSet<NodeId> = schedule.iter().copied().collect();
        let offenders: Vec<String> = live_passes
            .iter()
            .filter(|p| !scheduled.contains(p))
            .map(|&p| label(graph, p))
            .collect();
        return Err(RenderGraphError::CyclicDependency { passes: offenders });
    }
    Ok(schedule)
}

fn pass_order(graph: &Graph, pass: NodeId) -> u32 {
    graph.node_at(pass).as_pass().expect("pass node").order
}

/// State `resource` is guaranteed to be in immediately before `pending` runs,
/// given every transition scheduled for earlier passes
pub fn latest_state(
    compiled: &CompiledGraph,
    graph: &Graph,
    resource: NodeId,
    pending: NodeId,
) -> Result<ResourceState, RenderGraphError> {
    let unresolved = || RenderGraphError::UnresolvedDependency {
        pass: label(graph, pending),
        resource: label(graph, resource),
    };

    let timeline = compiled.timelines.get(&resource).ok_or_else(unresolved)?;
    let touches_pending = graph
        .incoming_edges(resource)
        .map(|(_, pass, _)| pass)
        .chain(graph.outgoing_edges(resource).map(|(_, pass, _)| pass))
        .any(|pass| pass == pending);
    if !touches_pending {
        return Err(unresolved());
    }

    let index = timeline
        .touches
        .iter()
        .position(|touch| touch.pass == pending);
    match index {
        // Merged into an earlier touch: the resource is already in that state.
        None => {
            let pos = compiled
                .schedule
                .iter()
                .position(|&p| p == pending)
                .ok_or_else(unresolved)?;
            let mut state = timeline.init_state;
            for touch in &timeline.touches {
                let touch_pos = compiled
                    .schedule
                    .iter()
                    .position(|&p| p == touch.pass)
                    .unwrap_or(usize::MAX);
                if touch_pos >= pos {
                    break;
                }
                state = touch.state;
            }
            Ok(state)
        }
        Some(0) => Ok(timeline.init_state),
        Some(i) => Ok(timeline.touches[i - 1].state),
    }
}
