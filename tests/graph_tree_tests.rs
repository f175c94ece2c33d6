use mstgraph::graph::Graph;
use mstgraph::tree::Tree;

fn line_tree() -> Tree {
    let mut g = Graph::new(4);
    g.add_edge(1, 2, 1);
    g.add_edge(2, 3, 2);
    g.add_edge(3, 4, 3);
    Tree::from_edges(4, &g.edges().collect::<Vec<_>>())
}

#[test]
fn total_weight_of_a_line_tree() {
    assert_eq!(line_tree().total_weight(), 6);
}

#[test]
fn shortest_and_longest_path_are_identical_on_a_tree() {
    let tree = line_tree();
    let (shortest, shortest_weight) = tree.shortest_path(1, 4).unwrap();
    let (longest, longest_weight) = tree.longest_path(1, 4).unwrap();
    assert_eq!(shortest, longest);
    assert_eq!(shortest_weight, longest_weight);
    assert_eq!(shortest, "1 -> 2 -> 3 -> 4");
}

#[test]
fn diameter_of_a_line_tree_is_the_full_span() {
    assert_eq!(line_tree().diameter(), 6);
}

#[test]
fn graph_rejects_duplicate_and_out_of_range_edges() {
    let mut g = Graph::new(3);
    assert!(g.add_edge(1, 2, 10));
    assert!(!g.add_edge(2, 1, 99));
    assert!(!g.add_edge(1, 9, 1));
    assert_eq!(g.edge_count(), 1);
}

#[test]
fn unreachable_vertices_report_no_path() {
    let mut g = Graph::new(4);
    g.add_edge(1, 2, 1);
    // vertices 3 and 4 are isolated from 1 and 2.
    let tree = Tree::from_edges(4, &g.edges().collect::<Vec<_>>());
    assert!(tree.shortest_path(1, 3).is_none());
}
