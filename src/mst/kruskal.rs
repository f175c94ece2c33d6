//! Kruskal's algorithm: collect every undirected edge once, sort by
//! non-decreasing weight, and accept via union-find until `V - 1` edges are
//! chosen.

use crate::graph::{Edge, Graph};
use crate::mst::union_find::UnionFind;

/// Returns `None` if the input graph is disconnected (fewer than `V - 1`
/// edges could be accepted).
pub fn find_mst(graph: &Graph) -> Option<Vec<Edge>> {
    let n = graph.vertex_count() as usize;
    if n == 0 {
        return None;
    }

    let mut edges: Vec<Edge> = graph.edges().collect();
    edges.sort_by_key(|e| e.weight);

    let mut uf = UnionFind::new(n);
    let mut mst = Vec::with_capacity(n.saturating_sub(1));

    for edge in edges {
        if mst.len() == n - 1 {
            break;
        }
        if uf.union((edge.src - 1) as usize, (edge.dest - 1) as usize) {
            mst.push(edge);
        }
    }

    if mst.len() != n.saturating_sub(1) {
        return None;
    }
    Some(mst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> Graph {
        let mut g = Graph::new(4);
        g.add_edge(1, 2, 1);
        g.add_edge(1, 3, 4);
        g.add_edge(2, 3, 2);
        g.add_edge(2, 4, 5);
        g.add_edge(3, 4, 3);
        g
    }

    #[test]
    fn finds_expected_mst_weight() {
        let g = sample_graph();
        let mst = find_mst(&g).unwrap();
        assert_eq!(mst.len(), 3);
        let weight: u32 = mst.iter().map(|e| e.weight).sum();
        assert_eq!(weight, 6);
    }

    #[test]
    fn agrees_with_prim_on_weight() {
        let g = sample_graph();
        let prim_weight: u32 = super::super::prim::find_mst(&g)
            .unwrap()
            .iter()
            .map(|e| e.weight)
            .sum();
        let kruskal_weight: u32 = find_mst(&g).unwrap().iter().map(|e| e.weight).sum();
        assert_eq!(prim_weight, kruskal_weight);
    }

    #[test]
    fn disconnected_graph_yields_none() {
        let mut g = Graph::new(4);
        g.add_edge(1, 2, 1);
        assert!(find_mst(&g).is_none());
    }
}
