//! Graph - core topology and placement structure.
//!
//! The Graph stores the topology using petgraph's StableGraph, with vertex
//! positions kept in SoA (Structure of Arrays) buffers for cheap upload to
//! a renderer. Every edge carries a pose derived by the [`PoseSolver`] and
//! is re-posed whenever one of its endpoints moves.

use nalgebra::Point3;
use petgraph::stable_graph::{EdgeIndex, EdgeReference, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::edge::{Edge, EdgeId};
use super::vertex::{Vertex, VertexId};
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::geometry::PoseSolver;
use crate::spatial::SpatialIndex;

/// Number of `f32`s per edge in [`Graph::pose_buffer`].
pub const POSE_STRIDE: usize = 8;

/// The network graph.
///
/// This struct manages:
/// - Graph topology via petgraph (outgoing adjacency per vertex, plus the
///   incoming lists petgraph maintains for free)
/// - Position buffers in SoA layout
/// - Edge poses, kept consistent with endpoint positions
/// - Spatial index for picking
/// - ID mapping between stable IDs and internal indices
pub struct Graph<A = (), P = ()> {
    /// The underlying graph structure.
    /// Nodes store their stable VertexId, edges store the full Edge.
    graph: StableGraph<VertexId, Edge<A, P>, Directed>,

    /// Map from stable VertexId to petgraph NodeIndex
    vertex_id_to_index: HashMap<VertexId, NodeIndex>,

    /// Map from stable EdgeId to petgraph EdgeIndex
    edge_id_to_index: HashMap<EdgeId, EdgeIndex>,

    /// Next vertex ID to assign
    next_vertex_id: u32,

    /// Next edge ID to assign
    next_edge_id: u32,

    /// X positions (SoA layout, indexed by NodeIndex)
    pos_x: Vec<f64>,

    /// Y positions (SoA layout)
    pos_y: Vec<f64>,

    /// Z positions (SoA layout)
    pos_z: Vec<f64>,

    /// Derives edge poses
    solver: PoseSolver,

    /// Spatial index for picking, updated on insert and move
    spatial: SpatialIndex,
}

impl<A, P> Graph<A, P> {
    /// Create a new empty graph with the default configuration.
    pub fn new() -> Self {
        Self::with_solver(PoseSolver::default(), 0, 0)
    }

    /// Create an empty graph with a custom pose configuration.
    pub fn with_config(config: &GraphConfig) -> Result<Self> {
        Ok(Self::with_solver(PoseSolver::new(config)?, 0, 0))
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(vertex_capacity: usize, edge_capacity: usize) -> Self {
        Self::with_solver(PoseSolver::default(), vertex_capacity, edge_capacity)
    }

    fn with_solver(solver: PoseSolver, vertex_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(vertex_capacity, edge_capacity),
            vertex_id_to_index: HashMap::with_capacity(vertex_capacity),
            edge_id_to_index: HashMap::with_capacity(edge_capacity),
            next_vertex_id: 0,
            next_edge_id: 0,
            pos_x: Vec::with_capacity(vertex_capacity),
            pos_y: Vec::with_capacity(vertex_capacity),
            pos_z: Vec::with_capacity(vertex_capacity),
            solver,
            spatial: SpatialIndex::new(),
        }
    }

    /// The solver used to pose edges.
    pub fn solver(&self) -> &PoseSolver {
        &self.solver
    }

    // =========================================================================
    // Vertex Operations
    // =========================================================================

    /// Reserve a fresh vertex identity without inserting it.
    ///
    /// Ids count up from the highest one seen. Past `u32::MAX` they wrap
    /// around to the lowest id not in the graph.
    pub fn allocate_vertex(&mut self, position: Point3<f64>) -> Vertex {
        let mut candidate = self.next_vertex_id;
        while self.vertex_id_to_index.contains_key(&VertexId(candidate)) {
            candidate = candidate.wrapping_add(1);
        }
        if candidate < self.next_vertex_id {
            warn!(id = candidate, "vertex ids wrapped around");
        }
        self.next_vertex_id = candidate.wrapping_add(1);
        Vertex::new(VertexId(candidate), position)
    }

    /// Allocate a vertex and insert it.
    ///
    /// A non-finite position is stored as given but the vertex cannot be
    /// picked until it is moved somewhere finite.
    pub fn add_vertex_at(&mut self, position: Point3<f64>) -> Vertex {
        let vertex = self.allocate_vertex(position);
        self.insert_vertex(&vertex);
        vertex
    }

    /// Insert a vertex if its identity is new.
    ///
    /// Returns false, leaving the graph untouched, if the id is already
    /// present or the position is not finite.
    pub fn add_vertex(&mut self, vertex: &Vertex) -> bool {
        if self.vertex_id_to_index.contains_key(&vertex.id) {
            debug!(id = %vertex.id, "vertex already present");
            return false;
        }
        if !vertex.is_finite() {
            warn!(id = %vertex.id, position = ?vertex.position, "rejected non-finite vertex");
            return false;
        }
        self.insert_vertex(vertex);
        true
    }

    /// Overwrite the stored position of an existing vertex and re-pose its
    /// edges.
    ///
    /// Returns false if the vertex is not in the graph or the new position
    /// is not finite.
    pub fn update_vertex(&mut self, vertex: &Vertex) -> bool {
        self.transform_vertex(vertex.id, vertex.position).is_ok()
    }

    /// Move a vertex and re-pose every edge incident to it.
    ///
    /// Returns the number of edges re-posed. A self-loop counts once.
    /// A non-finite destination is rejected and nothing moves.
    pub fn transform_vertex(&mut self, id: VertexId, destination: Point3<f64>) -> Result<usize> {
        let index = self.index_of(id).ok_or(GraphError::UnknownVertex(id))?;
        if !Vertex::new(id, destination).is_finite() {
            warn!(%id, ?destination, "rejected non-finite move");
            return Err(GraphError::InvalidPosition(id));
        }

        let origin = self.position(index);
        self.set_position(index, &destination);
        self.spatial.relocate(id, &origin, &destination);

        let mut incident: Vec<EdgeIndex> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        incident.sort_unstable();
        incident.dedup();

        for &edge_index in &incident {
            let Some((source, target)) = self.graph.edge_endpoints(edge_index) else {
                continue;
            };
            let pose = self
                .solver
                .solve(&self.position(source), &self.position(target));
            if let Some(edge) = self.graph.edge_weight_mut(edge_index) {
                edge.set_pose(pose);
            }
        }

        debug!(%id, ?destination, edges = incident.len(), "moved vertex");
        Ok(incident.len())
    }

    /// Check whether a vertex is present.
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertex_id_to_index.contains_key(&id)
    }

    /// Get a snapshot of a vertex.
    pub fn vertex(&self, id: VertexId) -> Option<Vertex> {
        self.index_of(id).map(|index| self.vertex_at(index))
    }

    /// Get the number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.graph.node_count()
    }

    /// All vertices, in insertion order.
    pub fn vertices(&self) -> Vec<Vertex> {
        self.graph
            .node_indices()
            .map(|index| self.vertex_at(index))
            .collect()
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add a directed edge from `from` to `to`.
    ///
    /// Endpoints not yet in the graph are inserted first. For endpoints that
    /// are already present, the pose is derived from the stored position,
    /// not from the position carried by the argument.
    pub fn add_edge(&mut self, from: &Vertex, to: &Vertex, appearance: A, payload: P) -> EdgeId {
        let source = self.ensure_vertex(from);
        let target = self.ensure_vertex(to);
        self.push_edge(source, target, appearance, payload)
    }

    /// Add a directed edge between two vertices already in the graph.
    pub fn add_edge_between(
        &mut self,
        from: VertexId,
        to: VertexId,
        appearance: A,
        payload: P,
    ) -> Result<EdgeId> {
        let source = self.index_of(from).ok_or(GraphError::UnknownVertex(from))?;
        let target = self.index_of(to).ok_or(GraphError::UnknownVertex(to))?;
        Ok(self.push_edge(source, target, appearance, payload))
    }

    /// Get the number of edges.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// All edges: each vertex's outgoing list in turn, vertices in
    /// insertion order, edges in creation order within a vertex.
    pub fn edges(&self) -> Vec<&Edge<A, P>> {
        self.graph
            .node_indices()
            .flat_map(|index| self.sorted_edges(index, Direction::Outgoing))
            .map(|e| e.weight())
            .collect()
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge<A, P>> {
        self.edge_id_to_index
            .get(&id)
            .and_then(|&index| self.graph.edge_weight(index))
    }

    /// The payload attached to an edge.
    pub fn edge_payload(&self, id: EdgeId) -> Option<&P> {
        self.edge(id).map(Edge::payload)
    }

    // =========================================================================
    // Adjacency Queries
    //
    // `None` means the vertex is not in the graph; `Some(vec![])` means it
    // is present with no neighbors in that direction.
    // =========================================================================

    /// Targets of `id`'s outgoing edges, one entry per edge.
    pub fn out_neighbors(&self, id: VertexId) -> Option<Vec<Vertex>> {
        let index = self.index_of(id)?;
        Some(
            self.sorted_edges(index, Direction::Outgoing)
                .into_iter()
                .map(|e| self.vertex_at(e.target()))
                .collect(),
        )
    }

    /// `id`'s outgoing edges in creation order.
    pub fn out_neighbor_edges(&self, id: VertexId) -> Option<Vec<&Edge<A, P>>> {
        let index = self.index_of(id)?;
        Some(
            self.sorted_edges(index, Direction::Outgoing)
                .into_iter()
                .map(|e| e.weight())
                .collect(),
        )
    }

    /// Sources of edges ending at `id`, one entry per edge.
    pub fn in_neighbors(&self, id: VertexId) -> Option<Vec<Vertex>> {
        let index = self.index_of(id)?;
        Some(
            self.sorted_edges(index, Direction::Incoming)
                .into_iter()
                .map(|e| self.vertex_at(e.source()))
                .collect(),
        )
    }

    /// Edges ending at `id` in creation order.
    pub fn in_neighbor_edges(&self, id: VertexId) -> Option<Vec<&Edge<A, P>>> {
        let index = self.index_of(id)?;
        Some(
            self.sorted_edges(index, Direction::Incoming)
                .into_iter()
                .map(|e| e.weight())
                .collect(),
        )
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    /// Get X positions slice.
    pub fn positions_x(&self) -> &[f64] {
        &self.pos_x
    }

    /// Get Y positions slice.
    pub fn positions_y(&self) -> &[f64] {
        &self.pos_y
    }

    /// Get Z positions slice.
    pub fn positions_z(&self) -> &[f64] {
        &self.pos_z
    }

    /// Flat per-edge pose data for instanced rendering.
    ///
    /// [`POSE_STRIDE`] floats per edge, in [`Graph::edges`] order:
    /// `[mid_x, mid_y, mid_z, axis_x, axis_y, axis_z, angle_deg, length]`.
    pub fn pose_buffer(&self) -> Vec<f32> {
        let edges = self.edges();
        let mut buffer = Vec::with_capacity(edges.len() * POSE_STRIDE);
        for edge in edges {
            let pose = edge.pose();
            buffer.extend([
                pose.midpoint.x as f32,
                pose.midpoint.y as f32,
                pose.midpoint.z as f32,
                pose.rotation_axis.x as f32,
                pose.rotation_axis.y as f32,
                pose.rotation_axis.z as f32,
                pose.rotation_angle_degrees as f32,
                pose.length as f32,
            ]);
        }
        buffer
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// Find the vertex nearest to a point.
    pub fn find_nearest_vertex(&self, point: &Point3<f64>) -> Option<VertexId> {
        self.spatial.nearest(point)
    }

    /// Find the nearest vertex within a maximum distance.
    pub fn find_nearest_vertex_within(
        &self,
        point: &Point3<f64>,
        max_distance: f64,
    ) -> Option<VertexId> {
        self.spatial.nearest_within(point, max_distance)
    }

    /// Find all vertices within `radius` of a point.
    pub fn find_vertices_in_radius(&self, point: &Point3<f64>, radius: f64) -> Vec<VertexId> {
        self.spatial.in_radius(point, radius)
    }

    /// Find all vertices inside an axis-aligned box.
    pub fn find_vertices_in_box(&self, min: &Point3<f64>, max: &Point3<f64>) -> Vec<VertexId> {
        self.spatial.in_box(min, max)
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Get the bounding box of all vertices as `(min, max)`.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut indices = self.graph.node_indices();
        let first = self.position(indices.next()?);

        Some(indices.fold((first, first), |(min, max), index| {
            let p = self.position(index);
            (min.inf(&p), max.sup(&p))
        }))
    }

    /// Clear all vertices and edges, resetting the graph to its initial state.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.vertex_id_to_index.clear();
        self.edge_id_to_index.clear();
        self.next_vertex_id = 0;
        self.next_edge_id = 0;
        self.pos_x.clear();
        self.pos_y.clear();
        self.pos_z.clear();
        self.spatial.clear();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn index_of(&self, id: VertexId) -> Option<NodeIndex> {
        self.vertex_id_to_index.get(&id).copied()
    }

    fn position(&self, index: NodeIndex) -> Point3<f64> {
        let i = index.index();
        Point3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i])
    }

    fn set_position(&mut self, index: NodeIndex, position: &Point3<f64>) {
        let i = index.index();
        self.pos_x[i] = position.x;
        self.pos_y[i] = position.y;
        self.pos_z[i] = position.z;
    }

    fn vertex_at(&self, index: NodeIndex) -> Vertex {
        Vertex::new(self.graph[index], self.position(index))
    }

    /// Index of `vertex`, inserting it first if unknown.
    fn ensure_vertex(&mut self, vertex: &Vertex) -> NodeIndex {
        match self.index_of(vertex.id) {
            Some(index) => index,
            None => self.insert_vertex(vertex),
        }
    }

    fn insert_vertex(&mut self, vertex: &Vertex) -> NodeIndex {
        debug_assert!(!self.contains_vertex(vertex.id), "duplicate {}", vertex.id);
        let index = self.graph.add_node(vertex.id);
        self.vertex_id_to_index.insert(vertex.id, index);

        // Nodes are never removed, so NodeIndex values stay dense and line
        // up with the SoA slots.
        self.pos_x.push(vertex.position.x);
        self.pos_y.push(vertex.position.y);
        self.pos_z.push(vertex.position.z);
        self.spatial.insert(vertex.id, &vertex.position);

        // Keep the allocator ahead of caller-supplied ids. At u32::MAX it
        // stays put and allocate_vertex probes for a free id.
        self.next_vertex_id = self.next_vertex_id.max(vertex.id.0.saturating_add(1));

        debug!(id = %vertex.id, position = ?vertex.position, "added vertex");
        index
    }

    fn push_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        appearance: A,
        payload: P,
    ) -> EdgeId {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;

        let pose = self
            .solver
            .solve(&self.position(source), &self.position(target));
        let (from, to) = (self.graph[source], self.graph[target]);

        let index = self
            .graph
            .add_edge(source, target, Edge::new(id, from, to, pose, appearance, payload));
        self.edge_id_to_index.insert(id, index);

        debug!(%id, %from, %to, length = pose.length, "added edge");
        id
    }

    /// Edges of `index` in one direction, in creation order.
    ///
    /// petgraph walks its adjacency lists newest-first, so they are
    /// re-sorted by id.
    fn sorted_edges(
        &self,
        index: NodeIndex,
        direction: Direction,
    ) -> Vec<EdgeReference<'_, Edge<A, P>>> {
        let mut edges: Vec<_> = self.graph.edges_directed(index, direction).collect();
        edges.sort_by_key(|e| e.weight().id());
        edges
    }
}

impl<A, P> Default for Graph<A, P> {
    fn default() -> Self {
        Self::new()
    }
}
