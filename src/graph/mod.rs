//! Arena-backed directed dependency graph
//!
//! Nodes and edges live in flat arenas indexed by small integer handles; the
//! graph owns all storage and releases it en masse when a population cycle is
//! reset. Handles are only meaningful for the graph instance and population
//! cycle that issued them.

/// Opaque handle to a node in a [`DependencyGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Opaque handle to an edge in a [`DependencyGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

struct EdgeRecord<E> {
    from: NodeId,
    to: NodeId,
    data: E,
}

/// Generic directed graph of typed nodes and typed edges
pub struct DependencyGraph<N, E> {
    nodes: Vec<N>,
    edges: Vec<EdgeRecord<E>>,
    incoming: Vec<Vec<EdgeId>>,
    outgoing: Vec<Vec<EdgeId>>,
}

impl<N, E> DependencyGraph<N, E> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    /// Register a node and return its handle
    pub fn insert(&mut self, node: N) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.incoming.push(Vec::new());
        self.outgoing.push(Vec::new());
        id
    }

    /// Record a directed dependency `from -> to`, taking ownership of the edge.
    ///
    /// Panics if either handle does not belong to this graph instance.
    #[track_caller]
    pub fn link(&mut self, from: NodeId, to: NodeId, edge: E) -> EdgeId {
        self.check_handle(from);
        self.check_handle(to);
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(EdgeRecord {
            from,
            to,
            data: edge,
        });
        self.outgoing[from.index()].push(id);
        self.incoming[to.index()].push(id);
        id
    }

    /// Resolve a handle to its node in O(1).
    ///
    /// An unknown handle is a programming error and panics.
    #[track_caller]
    pub fn node_at(&self, id: NodeId) -> &N {
        self.check_handle(id);
        &self.nodes[id.index()]
    }

    #[track_caller]
    pub fn node_at_mut(&mut self, id: NodeId) -> &mut N {
        self.check_handle(id);
        &mut self.nodes[id.index()]
    }

    #[track_caller]
    pub fn edge_at(&self, id: EdgeId) -> &E {
        &self.edges[id.index()].data
    }

    #[track_caller]
    pub fn edge_endpoints(&self, id: EdgeId) -> (NodeId, NodeId) {
        let record = &self.edges[id.index()];
        (record.from, record.to)
    }

    /// Edges pointing into `id`, in insertion order
    pub fn incoming_edges(&self, id: NodeId) -> impl Iterator<Item = (EdgeId, NodeId, &E)> {
        self.check_handle(id);
        self.incoming[id.index()]
            .iter()
            .map(move |&eid| (eid, self.edges[eid.index()].from, &self.edges[eid.index()].data))
    }

    /// Edges pointing out of `id`, in insertion order
    pub fn outgoing_edges(&self, id: NodeId) -> impl Iterator<Item = (EdgeId, NodeId, &E)> {
        self.check_handle(id);
        self.outgoing[id.index()]
            .iter()
            .map(move |&eid| (eid, self.edges[eid.index()].to, &self.edges[eid.index()].data))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Drop every node and edge, invalidating all issued handles
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.incoming.clear();
        self.outgoing.clear();
    }

    #[track_caller]
    fn check_handle(&self, id: NodeId) {
        assert!(
            id.index() < self.nodes.len(),
            "invalid node handle {:?}: graph holds {} nodes",
            id,
            self.nodes.len()
        );
    }
}

impl<N, E> Default for DependencyGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_resolve() {
        let mut graph: DependencyGraph<&str, u32> = DependencyGraph::new();
        let a = graph.insert("a");
        let b = graph.insert("b");
        assert_eq!(*graph.node_at(a), "a");
        assert_eq!(*graph.node_at(b), "b");
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn link_records_both_directions() {
        let mut graph: DependencyGraph<&str, u32> = DependencyGraph::new();
        let a = graph.insert("a");
        let b = graph.insert("b");
        let e = graph.link(a, b, 7);
        assert_eq!(*graph.edge_at(e), 7);
        assert_eq!(graph.edge_endpoints(e), (a, b));

        let outs: Vec<_> = graph.outgoing_edges(a).map(|(_, to, &w)| (to, w)).collect();
        assert_eq!(outs, vec![(b, 7)]);
        let ins: Vec<_> = graph.incoming_edges(b).map(|(_, from, &w)| (from, w)).collect();
        assert_eq!(ins, vec![(a, 7)]);
    }

    #[test]
    fn edges_keep_insertion_order() {
        let mut graph: DependencyGraph<&str, u32> = DependencyGraph::new();
        let r = graph.insert("resource");
        let p1 = graph.insert("p1");
        let p2 = graph.insert("p2");
        graph.link(r, p1, 0);
        graph.link(r, p2, 1);
        let order: Vec<_> = graph.outgoing_edges(r).map(|(_, to, _)| to).collect();
        assert_eq!(order, vec![p1, p2]);
    }

    #[test]
    #[should_panic(expected = "invalid node handle")]
    fn unknown_handle_panics() {
        let graph: DependencyGraph<&str, u32> = DependencyGraph::new();
        graph.node_at(NodeId(3));
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut graph: DependencyGraph<&str, u32> = DependencyGraph::new();
        let a = graph.insert("a");
        graph.clear();
        assert_eq!(graph.node_count(), 0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            graph.node_at(a);
        }));
        assert!(result.is_err());
    }
}
