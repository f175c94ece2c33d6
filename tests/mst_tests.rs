use mstgraph::error::MstError;
use mstgraph::graph::Graph;
use mstgraph::mst::{MstFactory, Strategy};

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
fn prim_and_kruskal_agree_on_total_weight() {
    let g = sample_graph();
    let prim = MstFactory::new(Strategy::Prim).create_mst(&g).unwrap();
    let kruskal = MstFactory::new(Strategy::Kruskal).create_mst(&g).unwrap();
    assert_eq!(prim.total_weight(), 6);
    assert_eq!(kruskal.total_weight(), 6);
}

#[test]
fn mst_has_exactly_v_minus_one_edges() {
    let g = sample_graph();
    let tree = MstFactory::new(Strategy::Prim).create_mst(&g).unwrap();
    assert_eq!(tree.edge_count(), g.vertex_count() - 1);
}

#[test]
fn disconnected_graph_fails_with_a_precondition_error() {
    let mut g = Graph::new(4);
    g.add_edge(1, 2, 1);
    g.add_edge(3, 4, 1);
    let err = MstFactory::new(Strategy::Kruskal).create_mst(&g).unwrap_err();
    assert!(matches!(err, MstError::PreconditionUnmet(_)));
}

#[test]
fn empty_graph_fails_with_a_precondition_error() {
    let g = Graph::new(0);
    let err = MstFactory::new(Strategy::Prim).create_mst(&g).unwrap_err();
    assert!(matches!(err, MstError::PreconditionUnmet(_)));
}
