//! A minimal directed weighted graph with an all-pairs shortest-path precomputation.
//!
//! This is the "commodity" dependency the router is built on: a bare vertex/edge
//! structure plus a Dijkstra-based router that answers `(weight, path)` queries. It carries
//! no transit-specific knowledge — [`crate::router`] attaches the stop/bus side tables.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub type VertexId = usize;
pub type EdgeId = usize;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
    pub weight: f64,
}

/// A directed graph over a fixed set of vertices, built by repeatedly adding edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    vertex_count: usize,
    edges: Vec<Edge>,
    incidence_lists: Vec<Vec<EdgeId>>,
}

impl Graph {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            edges: Vec::new(),
            incidence_lists: vec![Vec::new(); vertex_count],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn add_edge(&mut self, from: VertexId, to: VertexId, weight: f64) -> EdgeId {
        let id = self.edges.len();
        self.edges.push(Edge { from, to, weight });
        self.incidence_lists[from].push(id);
        id
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    pub fn edges_from(&self, vertex: VertexId) -> &[EdgeId] {
        &self.incidence_lists[vertex]
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn incidence_lists(&self) -> &[Vec<EdgeId>] {
        &self.incidence_lists
    }
}

/// The outcome of a shortest-path query: total weight plus the edges to walk, in order.
#[derive(Debug, Clone)]
pub struct RouteResult {
    pub weight: f64,
    pub edges: Vec<EdgeId>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct Entry {
    weight: f64,
    prev_edge: Option<EdgeId>,
}

#[derive(PartialEq)]
struct HeapItem {
    cost: f64,
    vertex: VertexId,
}

impl Eq for HeapItem {}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the smallest cost first.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// All-pairs shortest paths over a [`Graph`], computed once at construction by running
/// Dijkstra from every vertex. Ties among equal-weight paths are broken by edge insertion
/// order: a candidate only replaces the incumbent on a strictly smaller weight (§9(a)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Router {
    // tables[source][target] = Entry { weight, prev_edge } reached so far, or absent.
    tables: Vec<Vec<Option<Entry>>>,
}

impl Router {
    pub fn new(graph: &Graph) -> Self {
        let n = graph.vertex_count();
        let mut tables = Vec::with_capacity(n);
        for source in 0..n {
            tables.push(Self::dijkstra_from(graph, source));
        }
        Self { tables }
    }

    fn dijkstra_from(graph: &Graph, source: VertexId) -> Vec<Option<Entry>> {
        let n = graph.vertex_count();
        let mut best: Vec<Option<Entry>> = vec![None; n];
        let mut heap = BinaryHeap::new();

        best[source] = Some(Entry {
            weight: 0.0,
            prev_edge: None,
        });
        heap.push(HeapItem {
            cost: 0.0,
            vertex: source,
        });

        while let Some(HeapItem { cost, vertex }) = heap.pop() {
            let Some(current) = best[vertex] else {
                continue;
            };
            if cost > current.weight {
                continue;
            }
            for &edge_id in graph.edges_from(vertex) {
                let edge = graph.edge(edge_id);
                let candidate = cost + edge.weight;
                let better = match best[edge.to] {
                    Some(existing) => candidate < existing.weight,
                    None => true,
                };
                if better {
                    best[edge.to] = Some(Entry {
                        weight: candidate,
                        prev_edge: Some(edge_id),
                    });
                    heap.push(HeapItem {
                        cost: candidate,
                        vertex: edge.to,
                    });
                }
            }
        }

        best
    }

    /// Returns the precomputed shortest path from `from` to `to`, if one exists.
    pub fn route(&self, graph: &Graph, from: VertexId, to: VertexId) -> Option<RouteResult> {
        let entry = self.tables[from][to]?;
        let mut edges = Vec::new();
        let mut cursor = to;
        while let Some(prev_edge) = self.tables[from][cursor]?.prev_edge {
            edges.push(prev_edge);
            cursor = graph.edge(prev_edge).from;
        }
        edges.reverse();
        Some(RouteResult {
            weight: entry.weight,
            edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> Graph {
        // 0 -> 1 -> 2, weights 1.0 and 2.0
        let mut g = Graph::new(3);
        g.add_edge(0, 1, 1.0);
        g.add_edge(1, 2, 2.0);
        g
    }

    #[test]
    fn finds_shortest_multi_hop_path() {
        let g = line_graph();
        let router = Router::new(&g);
        let result = router.route(&g, 0, 2).unwrap();
        assert!((result.weight - 3.0).abs() < 1e-9);
        assert_eq!(result.edges, vec![0, 1]);
    }

    #[test]
    fn same_vertex_is_zero_weight_no_edges() {
        let g = line_graph();
        let router = Router::new(&g);
        let result = router.route(&g, 0, 0).unwrap();
        assert_eq!(result.weight, 0.0);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn unreachable_vertex_is_none() {
        let mut g = Graph::new(3);
        g.add_edge(0, 1, 1.0);
        // vertex 2 has no incoming edge
        let router = Router::new(&g);
        assert!(router.route(&g, 0, 2).is_none());
    }

    #[test]
    fn prefers_cheaper_parallel_edge() {
        let mut g = Graph::new(2);
        g.add_edge(0, 1, 5.0);
        g.add_edge(0, 1, 2.0);
        let router = Router::new(&g);
        let result = router.route(&g, 0, 1).unwrap();
        assert!((result.weight - 2.0).abs() < 1e-9);
        assert_eq!(result.edges, vec![1]);
    }
}
