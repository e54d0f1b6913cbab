//! Directed graphs over dense vertex indices.
//!
//! Used by the order resolvers: vertices are log entries, an edge `u -> v`
//! says entry `u` must come before entry `v`.
//!
//! Complexity:
//! - connect / has_edge: O(1) expected
//! - transitive reduction: O(V * E / 64) with bitsets
//! - transitive closure: the above plus O(V^2 / 64) to list the pairs
//! - topological sort: O((V + E) log V), the log from the tie-break heap

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::Error;
use crate::error::Result;

pub type Vertex = usize;

/// A directed graph with vertices `0..vertex_count()`.
///
/// Most vertices in a sequence log have at most two successors, so the
/// adjacency lists keep two inline.
#[derive(Clone, Debug, Default)]
pub struct Digraph {
    outgoing: Vec<SmallVec<[Vertex; 2]>>,
    edges: FxHashSet<(Vertex, Vertex)>,
}

impl Digraph {
    pub fn new() -> Digraph {
        return Digraph::default();
    }

    /// A graph with `count` vertices and no edges.
    pub fn with_vertices(count: usize) -> Digraph {
        return Digraph {
            outgoing: vec![SmallVec::new(); count],
            edges: FxHashSet::default(),
        };
    }

    /// Add a vertex and return its index.
    pub fn add_vertex(&mut self) -> Vertex {
        self.outgoing.push(SmallVec::new());
        return self.outgoing.len() - 1;
    }

    pub fn vertex_count(&self) -> usize {
        return self.outgoing.len();
    }

    pub fn edge_count(&self) -> usize {
        return self.edges.len();
    }

    /// Add the edge `from -> to`. Returns false if it already existed.
    pub fn connect(&mut self, from: Vertex, to: Vertex) -> bool {
        debug_assert!(from < self.vertex_count() && to < self.vertex_count());
        if !self.edges.insert((from, to)) {
            return false;
        }
        self.outgoing[from].push(to);
        return true;
    }

    pub fn has_edge(&self, from: Vertex, to: Vertex) -> bool {
        return self.edges.contains(&(from, to));
    }

    pub fn outgoing(&self, vertex: Vertex) -> &[Vertex] {
        return &self.outgoing[vertex];
    }

    /// All edges, sorted.
    pub fn edges(&self) -> Vec<(Vertex, Vertex)> {
        let mut edges: Vec<_> = self.edges.iter().copied().collect();
        edges.sort_unstable();
        return edges;
    }

    /// Number of edges entering each vertex.
    pub fn in_degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.vertex_count()];
        for targets in &self.outgoing {
            for &to in targets {
                degrees[to] += 1;
            }
        }
        return degrees;
    }

    /// The same graph with every edge reversed.
    pub fn transpose(&self) -> Digraph {
        let mut transposed = Digraph::with_vertices(self.vertex_count());
        for (from, to) in self.edges() {
            transposed.connect(to, from);
        }
        return transposed;
    }
}

/// A fixed-size bitset, one bit per vertex.
#[derive(Clone)]
struct Bits(Vec<u64>);

impl Bits {
    fn new(size: usize) -> Bits {
        return Bits(vec![0; size.div_ceil(64)]);
    }

    fn set(&mut self, bit: usize) {
        self.0[bit / 64] |= 1u64 << (bit % 64);
    }

    fn get(&self, bit: usize) -> bool {
        return self.0[bit / 64] & (1u64 << (bit % 64)) != 0;
    }

    fn union_with(&mut self, other: &Bits) {
        for (word, other) in self.0.iter_mut().zip(&other.0) {
            *word |= other;
        }
    }

    fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        return self.0.iter().enumerate().flat_map(|(i, &word)| {
            (0..64usize).filter(move |&b| word & (1u64 << b) != 0).map(move |b| i * 64 + b)
        });
    }
}

/// The transitive reduction and closure of a DAG.
#[derive(Clone, Debug)]
pub struct ReductionAndClosure {
    /// Fewest edges with the same reachability.
    pub reduction: Digraph,
    /// An edge for every reachable pair.
    pub closure: Digraph,
}

/// Any topological order, ignoring tie-breaks. Fails on a cycle.
fn topological_order(graph: &Digraph) -> Result<Vec<Vertex>> {
    let mut degrees = graph.in_degrees();
    let mut ready: Vec<Vertex> = (0..graph.vertex_count()).filter(|&v| degrees[v] == 0).collect();
    let mut order = Vec::with_capacity(graph.vertex_count());
    while let Some(vertex) = ready.pop() {
        order.push(vertex);
        for &to in graph.outgoing(vertex) {
            degrees[to] -= 1;
            if degrees[to] == 0 {
                ready.push(to);
            }
        }
    }
    if order.len() != graph.vertex_count() {
        return Err(Error::CyclicOrder);
    }
    return Ok(order);
}

/// Everything reachable from each vertex by a path of length >= 1.
/// Fails with `CyclicOrder` if the graph is not acyclic.
fn reachability(graph: &Digraph) -> Result<Vec<Bits>> {
    let count = graph.vertex_count();
    let order = topological_order(graph)?;
    let mut reach = vec![Bits::new(count); count];
    for &vertex in order.iter().rev() {
        let mut bits = Bits::new(count);
        for &to in graph.outgoing(vertex) {
            bits.set(to);
            bits.union_with(&reach[to]);
        }
        reach[vertex] = bits;
    }
    return Ok(reach);
}

/// Keep `u -> v` only when no other successor of `u` already reaches `v`.
fn reduce(graph: &Digraph, reach: &[Bits]) -> Digraph {
    let mut reduction = Digraph::with_vertices(graph.vertex_count());
    for vertex in 0..graph.vertex_count() {
        let successors = graph.outgoing(vertex);
        for &to in successors {
            let implied = successors.iter().any(|&other| other != to && reach[other].get(to));
            if !implied {
                reduction.connect(vertex, to);
            }
        }
    }
    return reduction;
}

/// Compute the transitive reduction of `graph`.
///
/// The reduction of a DAG is unique. Fails with `CyclicOrder` if the graph
/// is not acyclic.
pub fn transitive_reduction(graph: &Digraph) -> Result<Digraph> {
    let reach = reachability(graph)?;
    return Ok(reduce(graph, &reach));
}

/// Compute the transitive reduction and closure of `graph`.
///
/// Fails with `CyclicOrder` if the graph is not acyclic. The closure has an
/// edge per reachable pair, so prefer `transitive_reduction` when only the
/// reduction is needed.
pub fn transitive_reduction_and_closure(graph: &Digraph) -> Result<ReductionAndClosure> {
    let reach = reachability(graph)?;
    let reduction = reduce(graph, &reach);
    let mut closure = Digraph::with_vertices(graph.vertex_count());
    for (vertex, bits) in reach.iter().enumerate() {
        for to in bits.ones() {
            closure.connect(vertex, to);
        }
    }
    return Ok(ReductionAndClosure { reduction, closure });
}

/// Kahn's algorithm with a total tie-break.
///
/// Whenever several vertices are ready, the one with the smallest key goes
/// first, so the result depends only on the graph and the keys, never on
/// vertex numbering. Fails with `UnresolvedOrder` if edges remain because
/// of a cycle.
pub fn topological_sort_by_key<K, F>(graph: &Digraph, key: F) -> Result<Vec<Vertex>>
where
    K: Ord,
    F: Fn(Vertex) -> K,
{
    let mut degrees = graph.in_degrees();
    let mut ready = BinaryHeap::new();
    for vertex in 0..graph.vertex_count() {
        if degrees[vertex] == 0 {
            ready.push(Reverse((key(vertex), vertex)));
        }
    }
    let mut sorted = Vec::with_capacity(graph.vertex_count());
    while let Some(Reverse((_, vertex))) = ready.pop() {
        sorted.push(vertex);
        for &to in graph.outgoing(vertex) {
            degrees[to] -= 1;
            if degrees[to] == 0 {
                ready.push(Reverse((key(to), to)));
            }
        }
    }
    if sorted.len() != graph.vertex_count() {
        let remaining = degrees.iter().sum();
        return Err(Error::UnresolvedOrder { remaining });
    }
    return Ok(sorted);
}
