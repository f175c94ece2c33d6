use mstgraph::graph::Graph;
use mstgraph::mst::{MstFactory, Strategy};
use proptest::prelude::*;

/// Builds a connected graph on `n` vertices by first laying down a random
/// permutation path (guaranteeing connectivity) and then scattering a few
/// extra edges on top.
fn connected_graph(n: u32, extra: &[(u32, u32, u32)]) -> Graph {
    let mut g = Graph::new(n);
    for i in 1..n {
        g.add_edge(i, i + 1, ((i * 7 + 3) % 23) + 1);
    }
    for &(u, v, w) in extra {
        if u != v && u >= 1 && u <= n && v >= 1 && v <= n {
            g.add_edge(u, v, w % 30 + 1);
        }
    }
    g
}

proptest! {
    #[test]
    fn prim_and_kruskal_always_agree_on_total_weight(
        n in 2u32..12,
        extra in prop::collection::vec((1u32..12, 1u32..12, 1u32..30), 0..10),
    ) {
        let g = connected_graph(n, &extra);
        let prim = MstFactory::new(Strategy::Prim).create_mst(&g).unwrap();
        let kruskal = MstFactory::new(Strategy::Kruskal).create_mst(&g).unwrap();
        prop_assert_eq!(prim.total_weight(), kruskal.total_weight());
    }

    #[test]
    fn mst_always_has_exactly_v_minus_one_edges(
        n in 2u32..12,
        extra in prop::collection::vec((1u32..12, 1u32..12, 1u32..30), 0..10),
    ) {
        let g = connected_graph(n, &extra);
        let tree = MstFactory::new(Strategy::Kruskal).create_mst(&g).unwrap();
        prop_assert_eq!(tree.edge_count(), n - 1);
    }
}
