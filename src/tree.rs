/*!
# Tree

A [`Graph`] specialization holding the invariant `edge_count == vertex_count - 1`
with no cycles: a minimum spanning tree produced by [`crate::mst`]. All the
metric queries the protocol exposes (weight, shortest/longest path, diameter,
average distance) live here because they only make sense — or only have the
cheap unique-path shortcuts described in the spec — on a tree.

Distances use the `i32` sentinel `INFINITY` rather than `Option<i32>` so that
Floyd-Warshall's relaxation step is a plain `min`, matching the style of
`graphina::core::paths`'s numeric (rather than `Option`-wrapped) distance
tables.
*/

use crate::graph::{Edge, Graph};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Sentinel representing "unreachable" in distance tables.
pub const INFINITY: i32 = i32::MAX;

/// A minimum spanning tree: `vertex_count - 1` edges, read-only once built.
#[derive(Debug)]
pub struct Tree {
    graph: Graph,
    /// Lazily computed, cached all-pairs distance matrix (Floyd-Warshall).
    distance_cache: Option<Vec<Vec<i32>>>,
}

impl Tree {
    /// Builds a tree from an exact spanning-tree edge set.
    ///
    /// `edges` must contain exactly `v_count - 1` edges forming a spanning
    /// tree; this is the factory's responsibility to guarantee (see
    /// [`crate::mst`]), so this constructor does not re-validate acyclicity.
    pub fn from_edges(v_count: u32, edges: &[Edge]) -> Self {
        let mut graph = Graph::new(v_count);
        for e in edges {
            graph.add_edge(e.src, e.dest, e.weight);
        }
        Self {
            graph,
            distance_cache: None,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.graph.vertex_count()
    }

    pub fn edge_count(&self) -> u32 {
        self.graph.edge_count()
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.graph.edges()
    }

    pub fn total_weight(&self) -> u64 {
        self.graph.total_weight()
    }

    /// Always fails: a constructed `Tree` already holds exactly
    /// `vertex_count - 1` edges, so `edge_count >= vertex_count - 1` holds
    /// the moment it exists and adding another edge would create a cycle.
    /// Present so `Tree` carries the same `add_edge`/`remove_edge` surface
    /// as [`Graph`], just always refusing per this invariant.
    pub fn add_edge(&mut self, _u: u32, _v: u32, _w: u32) -> bool {
        false
    }

    /// Always fails: removing any edge would leave fewer than
    /// `vertex_count - 1` edges, disconnecting the tree. A `Tree` is
    /// read-only once built.
    pub fn remove_edge(&mut self, _u: u32, _v: u32) -> bool {
        false
    }

    fn in_range(&self, vertex: u32) -> bool {
        vertex >= 1 && vertex <= self.vertex_count()
    }

    /// Dijkstra's algorithm from `source`, returning `(dist, prev)` indexed
    /// 0-based (vertex `v` lives at index `v - 1`). Ties in the priority
    /// queue are broken by insertion order via the heap's natural FIFO
    /// behavior on equal keys coming from a stable sort of pushes.
    fn dijkstra(&self, source: u32) -> (Vec<i32>, Vec<Option<u32>>) {
        let n = self.vertex_count() as usize;
        let mut dist = vec![INFINITY; n];
        let mut prev = vec![None; n];
        dist[(source - 1) as usize] = 0;

        let mut heap = BinaryHeap::new();
        heap.push(Reverse((0i64, source)));

        while let Some(Reverse((d, u))) = heap.pop() {
            let ui = (u - 1) as usize;
            if d as i32 > dist[ui] {
                continue;
            }
            for edge in self.graph.adjacency(u) {
                let vi = (edge.dest - 1) as usize;
                let candidate = dist[ui].saturating_add(edge.weight as i32);
                if candidate < dist[vi] {
                    dist[vi] = candidate;
                    prev[vi] = Some(u);
                    heap.push(Reverse((candidate as i64, edge.dest)));
                }
            }
        }
        (dist, prev)
    }

    fn reconstruct_path(prev: &[Option<u32>], source: u32, dest: u32) -> Option<Vec<u32>> {
        if source == dest {
            return Some(vec![source]);
        }
        let mut path = vec![dest];
        let mut current = dest;
        loop {
            match prev[(current - 1) as usize] {
                Some(p) => {
                    path.push(p);
                    if p == source {
                        break;
                    }
                    current = p;
                }
                None => return None,
            }
        }
        path.reverse();
        Some(path)
    }

    fn format_path(path: &[u32]) -> String {
        path.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Shortest path from `u` to `v` via Dijkstra. Formats as `"a -> b -> c"`
    /// or `"No path"` when `v` is unreachable from `u`.
    pub fn shortest_path(&self, u: u32, v: u32) -> Option<(String, i32)> {
        if !self.in_range(u) || !self.in_range(v) {
            return None;
        }
        let (dist, prev) = self.dijkstra(u);
        let d = dist[(v - 1) as usize];
        if d == INFINITY {
            return None;
        }
        let path = Self::reconstruct_path(&prev, u, v)?;
        Some((Self::format_path(&path), d))
    }

    /// The unique `u -> v` path in the tree, found by a single DFS from `u`
    /// recording parent pointers (the tree guarantees exactly one simple
    /// path between any two vertices, so this always agrees with
    /// [`Tree::shortest_path`]).
    pub fn longest_path(&self, u: u32, v: u32) -> Option<(String, i32)> {
        if !self.in_range(u) || !self.in_range(v) {
            return None;
        }
        let n = self.vertex_count() as usize;
        let mut parent: Vec<Option<u32>> = vec![None; n];
        let mut dist = vec![INFINITY; n];
        let mut visited = vec![false; n];
        let mut stack = vec![u];
        visited[(u - 1) as usize] = true;
        dist[(u - 1) as usize] = 0;

        while let Some(current) = stack.pop() {
            for edge in self.graph.adjacency(current) {
                let vi = (edge.dest - 1) as usize;
                if !visited[vi] {
                    visited[vi] = true;
                    parent[vi] = Some(current);
                    dist[vi] = dist[(current - 1) as usize].saturating_add(edge.weight as i32);
                    stack.push(edge.dest);
                }
            }
        }

        if !visited[(v - 1) as usize] {
            return None;
        }
        let path = Self::reconstruct_path(&parent, u, v)?;
        Some((Self::format_path(&path), dist[(v - 1) as usize]))
    }

    /// Two-pass BFS/DFS diameter: farthest node `p` from an arbitrary start,
    /// then farthest node `q` from `p`; returns `dist(p, q)`.
    pub fn diameter(&self) -> i32 {
        if self.vertex_count() == 0 {
            return 0;
        }
        let (p, _) = self.farthest_from(1);
        let (_, dist_to_q) = self.farthest_from(p);
        dist_to_q
    }

    fn farthest_from(&self, start: u32) -> (u32, i32) {
        let (dist, _) = self.bfs_distances(start);
        let mut best_vertex = start;
        let mut best_dist = 0;
        for (idx, &d) in dist.iter().enumerate() {
            if d != INFINITY && d > best_dist {
                best_dist = d;
                best_vertex = (idx + 1) as u32;
            }
        }
        (best_vertex, best_dist)
    }

    fn bfs_distances(&self, start: u32) -> (Vec<i32>, Vec<Option<u32>>) {
        // The tree has unweighted-shape but weighted edges; diameter is
        // defined over path *weight*, so this BFS still relaxes by edge
        // weight (a weighted single-source traversal is exact here because
        // a tree has no alternate routes to widen).
        self.dijkstra(start)
    }

    fn ensure_distance_cache(&mut self) {
        if self.distance_cache.is_some() {
            return;
        }
        let n = self.vertex_count() as usize;
        let mut dist = vec![vec![INFINITY; n]; n];
        for i in 0..n {
            dist[i][i] = 0;
        }
        for edge in self.graph.edges() {
            let (ui, vi) = ((edge.src - 1) as usize, (edge.dest - 1) as usize);
            dist[ui][vi] = edge.weight as i32;
            dist[vi][ui] = edge.weight as i32;
        }
        for k in 0..n {
            for i in 0..n {
                if dist[i][k] == INFINITY {
                    continue;
                }
                for j in 0..n {
                    if dist[k][j] == INFINITY {
                        continue;
                    }
                    let via_k = dist[i][k] + dist[k][j];
                    if via_k < dist[i][j] {
                        dist[i][j] = via_k;
                    }
                }
            }
        }
        self.distance_cache = Some(dist);
    }

    /// Mean of `dist(i, j)` over all reachable pairs `i < j`, via a single
    /// cached Floyd-Warshall pass.
    pub fn average_distance(&mut self) -> Option<f64> {
        self.ensure_distance_cache();
        let dist = self.distance_cache.as_ref().unwrap();
        let n = dist.len();
        let mut total = 0.0;
        let mut count = 0u64;
        for i in 0..n {
            for j in (i + 1)..n {
                if dist[i][j] != INFINITY {
                    total += dist[i][j] as f64;
                    count += 1;
                }
            }
        }
        if count == 0 {
            None
        } else {
            Some(total / count as f64)
        }
    }

    /// "Shortest pair": the minimum finite off-diagonal entry of the
    /// all-pairs distance matrix, together with the path Dijkstra
    /// reconstructs between that pair.
    pub fn shortest_pair(&mut self) -> Option<(String, i32)> {
        self.ensure_distance_cache();
        let dist = self.distance_cache.as_ref().unwrap();
        let n = dist.len();
        let mut best: Option<(usize, usize, i32)> = None;
        for i in 0..n {
            for j in (i + 1)..n {
                if dist[i][j] == INFINITY {
                    continue;
                }
                if best.is_none_or(|(_, _, d)| dist[i][j] < d) {
                    best = Some((i, j, dist[i][j]));
                }
            }
        }
        let (i, j, _) = best?;
        self.shortest_path((i + 1) as u32, (j + 1) as u32)
    }
}
