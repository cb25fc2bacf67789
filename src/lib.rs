//! NetVis Graph - WASM Module
//!
//! This module provides the topology and placement engine for 3D network
//! visualization: vertices at positions in space, directed edges between
//! them, and for every edge the pose (midpoint, axis/angle rotation,
//! length) a renderer needs to stretch a unit primitive between its
//! endpoints. It is compiled to WebAssembly and exposes a JavaScript-friendly
//! API via wasm-bindgen; the Rust API is usable directly as well.
//!
//! # Architecture
//!
//! - `geometry`: vector primitives and the pose solver
//! - `graph`: vertices, edges, and the adjacency structure that keeps edge
//!   poses in sync with moving endpoints
//! - `spatial`: R-tree spatial indexing for O(log n) picking
//! - `shared`: lock-protected handle for multi-threaded hosts
//! - `config`: pose configuration (reference axis, tolerances)

use js_sys::{Float32Array, Float64Array};
use nalgebra::Point3;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod shared;
pub mod spatial;

pub use config::GraphConfig;
pub use error::{GraphError, Result};
pub use geometry::{Pose, PoseSolver};
pub use graph::{Edge, EdgeId, Graph, Vertex, VertexId, POSE_STRIDE};
pub use shared::SharedGraph;

/// Initialize the WASM module: panic messages and `tracing` output go to
/// the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

fn to_js(err: GraphError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Edge as handed to JavaScript: ids, material handle, and pose.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeView {
    id: u32,
    source: u32,
    target: u32,
    material: u32,
    pose: Pose,
}

impl EdgeView {
    fn new(edge: &Edge<u32, JsValue>) -> Self {
        Self {
            id: edge.id().raw(),
            source: edge.source().raw(),
            target: edge.target().raw(),
            material: *edge.appearance(),
            pose: *edge.pose(),
        }
    }
}

/// Main entry point for the network graph.
///
/// Wraps the internal [`Graph`] with a `u32` material handle as the edge
/// appearance and an arbitrary JS value as the payload.
#[wasm_bindgen]
pub struct NetworkGraph {
    graph: Graph<u32, JsValue>,
}

#[wasm_bindgen]
impl NetworkGraph {
    /// Create a new empty graph.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
        }
    }

    /// Create a graph with a custom pose configuration.
    ///
    /// Accepts `{ referenceAxis?, fallbackAxis?, epsilon? }`; throws if the
    /// configuration is invalid.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue) -> std::result::Result<NetworkGraph, JsValue> {
        let config: GraphConfig = from_value(config)?;
        let graph = Graph::with_config(&config).map_err(to_js)?;
        Ok(Self { graph })
    }

    /// Create a graph with pre-allocated capacity.
    ///
    /// # Arguments
    ///
    /// * `vertex_capacity` - Expected number of vertices
    /// * `edge_capacity` - Expected number of edges
    #[wasm_bindgen(js_name = withCapacity)]
    pub fn with_capacity(vertex_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: Graph::with_capacity(vertex_capacity, edge_capacity),
        }
    }

    // =========================================================================
    // Vertex Operations
    // =========================================================================

    /// Add a vertex at the specified position.
    ///
    /// Returns the stable vertex ID.
    #[wasm_bindgen(js_name = addVertex)]
    pub fn add_vertex(&mut self, x: f64, y: f64, z: f64) -> u32 {
        self.graph.add_vertex_at(Point3::new(x, y, z)).id.raw()
    }

    /// Insert a vertex with a caller-chosen ID.
    ///
    /// Returns false if the ID is already taken.
    #[wasm_bindgen(js_name = insertVertex)]
    pub fn insert_vertex(&mut self, id: u32, x: f64, y: f64, z: f64) -> bool {
        self.graph.add_vertex(&Vertex::at(id, x, y, z))
    }

    /// Move a vertex and re-pose its edges.
    ///
    /// Returns the number of edges updated; throws on an unknown vertex.
    #[wasm_bindgen(js_name = moveVertex)]
    pub fn move_vertex(
        &mut self,
        vertex_id: u32,
        x: f64,
        y: f64,
        z: f64,
    ) -> std::result::Result<u32, JsValue> {
        self.graph
            .transform_vertex(VertexId(vertex_id), Point3::new(x, y, z))
            .map(|count| count as u32)
            .map_err(to_js)
    }

    /// Get the number of vertices in the graph.
    #[wasm_bindgen(js_name = vertexCount)]
    pub fn vertex_count(&self) -> u32 {
        self.graph.num_vertices() as u32
    }

    /// Get a vertex position as [x, y, z].
    #[wasm_bindgen(js_name = getVertexPosition)]
    pub fn get_vertex_position(&self, vertex_id: u32) -> Option<Vec<f64>> {
        self.graph
            .vertex(VertexId(vertex_id))
            .map(|v| vec![v.position.x, v.position.y, v.position.z])
    }

    /// Get all vertices as `[{ id, position: [x, y, z] }, ...]`.
    pub fn vertices(&self) -> std::result::Result<JsValue, JsValue> {
        Ok(to_value(&self.graph.vertices())?)
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add a directed edge between two existing vertices.
    ///
    /// `material` is an opaque handle the renderer maps to its own material;
    /// `payload` is stored and returned unchanged. Throws if either vertex
    /// is unknown; use `addEdgeAt` to insert missing endpoints instead.
    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(
        &mut self,
        source: u32,
        target: u32,
        material: u32,
        payload: JsValue,
    ) -> std::result::Result<u32, JsValue> {
        self.graph
            .add_edge_between(VertexId(source), VertexId(target), material, payload)
            .map(EdgeId::raw)
            .map_err(to_js)
    }

    /// Add a directed edge, inserting either endpoint that is not yet in
    /// the graph at the given coordinates.
    ///
    /// Endpoints already present keep their stored position. Never throws.
    #[wasm_bindgen(js_name = addEdgeAt)]
    #[allow(clippy::too_many_arguments)]
    pub fn add_edge_at(
        &mut self,
        source: u32,
        sx: f64,
        sy: f64,
        sz: f64,
        target: u32,
        tx: f64,
        ty: f64,
        tz: f64,
        material: u32,
        payload: JsValue,
    ) -> u32 {
        let from = Vertex::at(source, sx, sy, sz);
        let to = Vertex::at(target, tx, ty, tz);
        self.graph.add_edge(&from, &to, material, payload).raw()
    }

    /// Get the number of edges in the graph.
    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.graph.num_edges() as u32
    }

    /// Get all edges as `[{ id, source, target, material, pose }, ...]`.
    pub fn edges(&self) -> std::result::Result<JsValue, JsValue> {
        let views: Vec<_> = self.graph.edges().into_iter().map(EdgeView::new).collect();
        Ok(to_value(&views)?)
    }

    /// Get one edge's pose, or undefined if the edge does not exist.
    #[wasm_bindgen(js_name = getEdgePose)]
    pub fn get_edge_pose(&self, edge_id: u32) -> std::result::Result<JsValue, JsValue> {
        match self.graph.edge(EdgeId(edge_id)) {
            Some(edge) => Ok(to_value(edge.pose())?),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Get the payload an edge was created with.
    #[wasm_bindgen(js_name = getEdgePayload)]
    pub fn get_edge_payload(&self, edge_id: u32) -> JsValue {
        self.graph
            .edge_payload(EdgeId(edge_id))
            .cloned()
            .unwrap_or(JsValue::UNDEFINED)
    }

    // =========================================================================
    // Adjacency Queries
    //
    // Each returns undefined for an unknown vertex and an empty array for a
    // vertex without neighbors.
    // =========================================================================

    /// Target vertex IDs of a vertex's outgoing edges.
    #[wasm_bindgen(js_name = outNeighbors)]
    pub fn out_neighbors(&self, vertex_id: u32) -> Option<Vec<u32>> {
        self.graph
            .out_neighbors(VertexId(vertex_id))
            .map(|vs| vs.iter().map(|v| v.id.raw()).collect())
    }

    /// Source vertex IDs of a vertex's incoming edges.
    #[wasm_bindgen(js_name = inNeighbors)]
    pub fn in_neighbors(&self, vertex_id: u32) -> Option<Vec<u32>> {
        self.graph
            .in_neighbors(VertexId(vertex_id))
            .map(|vs| vs.iter().map(|v| v.id.raw()).collect())
    }

    /// IDs of a vertex's outgoing edges.
    #[wasm_bindgen(js_name = outNeighborEdges)]
    pub fn out_neighbor_edges(&self, vertex_id: u32) -> Option<Vec<u32>> {
        self.graph
            .out_neighbor_edges(VertexId(vertex_id))
            .map(|es| es.iter().map(|e| e.id().raw()).collect())
    }

    /// IDs of a vertex's incoming edges.
    #[wasm_bindgen(js_name = inNeighborEdges)]
    pub fn in_neighbor_edges(&self, vertex_id: u32) -> Option<Vec<u32>> {
        self.graph
            .in_neighbor_edges(VertexId(vertex_id))
            .map(|es| es.iter().map(|e| e.id().raw()).collect())
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    /// Per-edge pose data for instanced rendering, 8 floats per edge:
    /// `[mid_x, mid_y, mid_z, axis_x, axis_y, axis_z, angle_deg, length]`.
    #[wasm_bindgen(js_name = poseBuffer)]
    pub fn pose_buffer(&self) -> Float32Array {
        Float32Array::from(&self.graph.pose_buffer()[..])
    }

    /// Get a zero-copy view of X positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for GPU upload, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float64Array {
        unsafe { Float64Array::view(self.graph.positions_x()) }
    }

    /// Get a zero-copy view of Y positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for GPU upload, do not store.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float64Array {
        unsafe { Float64Array::view(self.graph.positions_y()) }
    }

    /// Get a zero-copy view of Z positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for GPU upload, do not store.
    #[wasm_bindgen(js_name = getPositionsZView)]
    pub fn get_positions_z_view(&self) -> Float64Array {
        unsafe { Float64Array::view(self.graph.positions_z()) }
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// Find the nearest vertex to a point.
    ///
    /// Returns the vertex ID, or None if the graph is empty.
    #[wasm_bindgen(js_name = findNearestVertex)]
    pub fn find_nearest_vertex(&self, x: f64, y: f64, z: f64) -> Option<u32> {
        self.graph
            .find_nearest_vertex(&Point3::new(x, y, z))
            .map(VertexId::raw)
    }

    /// IDs of all vertices within `radius` of a point.
    #[wasm_bindgen(js_name = findVerticesInRadius)]
    pub fn find_vertices_in_radius(&self, x: f64, y: f64, z: f64, radius: f64) -> Vec<u32> {
        self.graph
            .find_vertices_in_radius(&Point3::new(x, y, z), radius)
            .into_iter()
            .map(VertexId::raw)
            .collect()
    }

    /// Find the nearest vertex within a maximum distance.
    #[wasm_bindgen(js_name = findNearestVertexWithin)]
    pub fn find_nearest_vertex_within(
        &self,
        x: f64,
        y: f64,
        z: f64,
        max_distance: f64,
    ) -> Option<u32> {
        self.graph
            .find_nearest_vertex_within(&Point3::new(x, y, z), max_distance)
            .map(VertexId::raw)
    }

    // =========================================================================
    // Graph Utilities
    // =========================================================================

    /// Get the bounding box of all vertices.
    ///
    /// Returns [min_x, min_y, min_z, max_x, max_y, max_z], or None if the
    /// graph is empty.
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f64>> {
        self.graph
            .bounds()
            .map(|(min, max)| vec![min.x, min.y, min.z, max.x, max.y, max.z])
    }

    /// Clear all vertices and edges.
    pub fn clear(&mut self) {
        self.graph.clear();
    }
}

impl Default for NetworkGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use nalgebra::Vector3;

    /// Build the six-edge demo network and jitter every vertex the way an
    /// animation tick would, without wasm_bindgen JS types.
    #[test]
    fn test_demo_network_follows_jitter() {
        let mut graph: Graph<&str, ()> = Graph::new();

        let origin = graph.allocate_vertex(Point3::new(0.0, 0.0, 0.0));
        let a = graph.allocate_vertex(Point3::new(100.0, 100.0, 50.0));
        let b = graph.allocate_vertex(Point3::new(70.0, 700.0, 100.0));
        let c = graph.allocate_vertex(Point3::new(-80.0, 100.0, -50.0));
        let top = graph.allocate_vertex(Point3::new(0.0, 0.0, 500.0));

        for (from, to) in [(origin, a), (origin, b), (origin, c), (a, top), (b, top), (c, top)] {
            graph.add_edge(&from, &to, "white", ());
        }

        assert_eq!(graph.num_vertices(), 5);
        assert_eq!(graph.num_edges(), 6);
        assert_eq!(graph.out_neighbors(origin.id).map(|v| v.len()), Some(3));
        assert_eq!(graph.in_neighbors(top.id).map(|v| v.len()), Some(3));

        let first = *graph.edges()[0].pose();
        assert!((first.length - 150.0).abs() < 1e-6);
        assert_eq!(first.midpoint, Point3::new(50.0, 50.0, 25.0));

        // Deterministic stand-in for the random per-tick jitter.
        for tick in 0..10 {
            for (i, vertex) in graph.vertices().into_iter().enumerate() {
                let offset = ((tick * 7 + i * 3) % 11) as f64 - 5.0;
                let destination = Point3::new(80.0 + offset, offset, -offset);
                graph.transform_vertex(vertex.id, destination).unwrap();
            }
        }

        let reference = graph.solver().reference_axis();
        for edge in graph.edges() {
            let start = graph.vertex(edge.source()).unwrap().position;
            let end = graph.vertex(edge.target()).unwrap().position;
            let expected = graph.solver().solve(&start, &end);
            assert_eq!(*edge.pose(), expected);

            if !edge.pose().is_degenerate() {
                let direction: Vector3<f64> = (end - start).normalize();
                assert!((edge.pose().rotate(&reference) - direction).norm() < 1e-9);
            }
        }
    }
}
