/*!
# MST Strategies & Factory

Two interchangeable MST algorithms, selected by a tagged [`Strategy`] enum
rather than a trait-object strategy hierarchy: the factory only ever needs to
pick between exactly two algorithms, so a `match` replaces what the original
design expressed as an `MSTStrategy` base class with `Prim`/`Kruskal`
subclasses.
*/

mod kruskal;
mod prim;
mod union_find;

use crate::error::{MstError, Result};
use crate::graph::Graph;
use crate::tree::Tree;

/// Which MST algorithm the factory currently builds with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Prim,
    Kruskal,
}

/// Builds [`Tree`]s from a [`Graph`] using the currently selected
/// [`Strategy`]. Replacing the strategy (`set_strategy`) takes effect on the
/// next `create_mst` call; there is nothing to release in the Rust port
/// since `Strategy` is a plain enum rather than a boxed trait object, but
/// `destroy_strategy` is kept to mirror the source's explicit lifecycle.
pub struct MstFactory {
    strategy: Strategy,
}

impl MstFactory {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// No-op under the enum-based design; kept so callers that modeled the
    /// factory after the source's explicit strategy lifecycle still compile
    /// if a later strategy grows real teardown (e.g. thread-pool backed).
    pub fn destroy_strategy(&mut self) {}

    /// Builds a [`Tree`] from `graph` using the current strategy.
    ///
    /// Fails with [`MstError::PreconditionUnmet`] when the graph is empty or
    /// its component containing vertex 1 does not span every vertex.
    pub fn create_mst(&self, graph: &Graph) -> Result<Tree> {
        let edges = match self.strategy {
            Strategy::Prim => prim::find_mst(graph),
            Strategy::Kruskal => kruskal::find_mst(graph),
        }
        .ok_or_else(|| MstError::precondition("Graph is disconnected or empty"))?;
        Ok(Tree::from_edges(graph.vertex_count(), &edges))
    }
}
