//! Thread-safe graph handle.
//!
//! [`Graph`] is single-threaded: mutation takes `&mut self`. When poses are
//! read from worker threads (or several drivers feed one graph),
//! [`SharedGraph`] puts the whole graph behind one `parking_lot::RwLock`:
//! at most one writer, any number of readers while no writer is active.
//!
//! Queries return owned copies. Nothing handed out by this type aliases
//! the locked adjacency lists.

use nalgebra::Point3;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::GraphConfig;
use crate::error::Result;
use crate::graph::{Edge, EdgeId, Graph, Vertex, VertexId};

/// Cloneable, lock-protected handle to a [`Graph`].
pub struct SharedGraph<A = (), P = ()> {
    inner: Arc<RwLock<Graph<A, P>>>,
}

impl<A, P> Clone for SharedGraph<A, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, P> SharedGraph<A, P> {
    pub fn new() -> Self {
        Self::from_graph(Graph::new())
    }

    pub fn with_config(config: &GraphConfig) -> Result<Self> {
        Ok(Self::from_graph(Graph::with_config(config)?))
    }

    pub fn from_graph(graph: Graph<A, P>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// Run `f` against a read-only view of the graph.
    ///
    /// Holds the read lock for the duration of `f`; writers wait.
    pub fn read<R>(&self, f: impl FnOnce(&Graph<A, P>) -> R) -> R {
        f(&*self.inner.read())
    }

    /// Run `f` with exclusive access, e.g. to apply a batch of moves as one
    /// step that readers never observe half-done.
    pub fn write<R>(&self, f: impl FnOnce(&mut Graph<A, P>) -> R) -> R {
        f(&mut *self.inner.write())
    }

    pub fn add_vertex(&self, vertex: &Vertex) -> bool {
        self.inner.write().add_vertex(vertex)
    }

    pub fn add_vertex_at(&self, position: Point3<f64>) -> Vertex {
        self.inner.write().add_vertex_at(position)
    }

    pub fn update_vertex(&self, vertex: &Vertex) -> bool {
        self.inner.write().update_vertex(vertex)
    }

    pub fn transform_vertex(&self, id: VertexId, destination: Point3<f64>) -> Result<usize> {
        self.inner.write().transform_vertex(id, destination)
    }

    pub fn add_edge(&self, from: &Vertex, to: &Vertex, appearance: A, payload: P) -> EdgeId {
        self.inner.write().add_edge(from, to, appearance, payload)
    }

    pub fn num_vertices(&self) -> usize {
        self.inner.read().num_vertices()
    }

    pub fn num_edges(&self) -> usize {
        self.inner.read().num_edges()
    }

    pub fn vertices(&self) -> Vec<Vertex> {
        self.inner.read().vertices()
    }

    pub fn vertex(&self, id: VertexId) -> Option<Vertex> {
        self.inner.read().vertex(id)
    }

    pub fn out_neighbors(&self, id: VertexId) -> Option<Vec<Vertex>> {
        self.inner.read().out_neighbors(id)
    }

    pub fn in_neighbors(&self, id: VertexId) -> Option<Vec<Vertex>> {
        self.inner.read().in_neighbors(id)
    }

    pub fn pose_buffer(&self) -> Vec<f32> {
        self.inner.read().pose_buffer()
    }
}

impl<A: Clone, P: Clone> SharedGraph<A, P> {
    pub fn edges(&self) -> Vec<Edge<A, P>> {
        self.inner.read().edges().into_iter().cloned().collect()
    }

    pub fn edge(&self, id: EdgeId) -> Option<Edge<A, P>> {
        self.inner.read().edge(id).cloned()
    }

    pub fn out_neighbor_edges(&self, id: VertexId) -> Option<Vec<Edge<A, P>>> {
        self.inner
            .read()
            .out_neighbor_edges(id)
            .map(|edges| edges.into_iter().cloned().collect())
    }

    pub fn in_neighbor_edges(&self, id: VertexId) -> Option<Vec<Edge<A, P>>> {
        self.inner
            .read()
            .in_neighbor_edges(id)
            .map(|edges| edges.into_iter().cloned().collect())
    }
}

impl<A, P> Default for SharedGraph<A, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    #[test]
    fn test_basic_operations() {
        let shared: SharedGraph<u32, String> = SharedGraph::new();
        let a = shared.add_vertex_at(p(0.0, 0.0, 0.0));
        let b = Vertex::at(10, 0.0, 3.0, 0.0);

        let id = shared.add_edge(&a, &b, 1, "road".to_string());
        assert_eq!(shared.num_vertices(), 2);
        assert_eq!(shared.num_edges(), 1);
        assert_eq!(shared.out_neighbors(a.id).unwrap()[0].id, b.id);
        assert_eq!(shared.in_neighbors(b.id).unwrap()[0].id, a.id);
        assert_eq!(shared.edge(id).unwrap().payload(), "road");

        assert_eq!(shared.transform_vertex(b.id, p(0.0, 6.0, 0.0)), Ok(1));
        assert_eq!(shared.edge(id).unwrap().length(), 6.0);
        assert!(shared.update_vertex(&Vertex::new(a.id, p(0.0, 2.0, 0.0))));
        assert_eq!(shared.edges()[0].length(), 4.0);
        assert!(!shared.add_vertex(&a));
    }

    #[test]
    fn test_returned_edges_are_copies() {
        let shared: SharedGraph<(), Vec<u8>> = SharedGraph::new();
        let a = shared.add_vertex_at(p(0.0, 0.0, 0.0));
        let b = shared.add_vertex_at(p(1.0, 0.0, 0.0));
        shared.add_edge(&a, &b, (), vec![1, 2, 3]);

        let mut copy = shared.out_neighbor_edges(a.id).unwrap();
        copy.clear();

        assert_eq!(shared.out_neighbor_edges(a.id).unwrap().len(), 1);
        assert!(shared.in_neighbor_edges(VertexId(99)).is_none());
    }

    #[test]
    fn test_concurrent_readers_see_consistent_counts() {
        let shared: SharedGraph = SharedGraph::new();
        let hub = shared.add_vertex_at(p(0.0, 0.0, 0.0));

        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..200u32 {
                    let leaf = Vertex::at(1000 + i, i as f64, 1.0, 0.0);
                    shared.add_edge(&hub, &leaf, (), ());
                    shared
                        .transform_vertex(hub.id, p(0.0, 0.0, i as f64))
                        .unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        shared.read(|graph| {
                            assert_eq!(graph.edges().len(), graph.num_edges());
                            assert_eq!(graph.num_vertices(), graph.num_edges() + 1);
                        });
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(shared.num_edges(), 200);
        let hub_z = shared.vertex(hub.id).unwrap().position.z;
        assert_eq!(hub_z, 199.0);
        // Every edge was re-posed against the hub's final position.
        shared.read(|graph| {
            for edge in graph.edges() {
                let target = graph.vertex(edge.target()).unwrap().position;
                let expected = graph.solver().solve(&p(0.0, 0.0, 199.0), &target);
                assert_eq!(*edge.pose(), expected);
            }
        });
    }

    #[test]
    fn test_batch_write() {
        let shared: SharedGraph = SharedGraph::new();
        let vertices: Vec<_> = (0..3)
            .map(|i| shared.add_vertex_at(p(i as f64, 0.0, 0.0)))
            .collect();
        shared.add_edge(&vertices[0], &vertices[1], (), ());
        shared.add_edge(&vertices[1], &vertices[2], (), ());

        let moved = shared.write(|graph| {
            vertices
                .iter()
                .map(|v| graph.transform_vertex(v.id, v.position * 2.0).unwrap())
                .sum::<usize>()
        });
        assert_eq!(moved, 4);
        assert_eq!(shared.edges()[1].length(), 2.0);
        assert_eq!(shared.pose_buffer().len(), 16);
    }
}
