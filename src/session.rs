/*!
# Shared State & Command Dispatch

`SharedState` and `dispatch_command` are the one piece of business logic both
front-ends call into — the LF server from a reactor handler, the Pipeline
server's graph-construction and standalone-query stages via `dispatch` — so
picking a concurrency core never means maintaining two copies of "what a
command does". `Completion` is the per-command record the Pipeline core uses
to let a session thread block until the respond stage has produced a reply;
the LF core answers synchronously and never needs one.

The `*_fragment` methods below exist only for the Pipeline's Prim/Kruskal
stages (`concurrency::pipeline`), which — per SPEC_FULL.md §4.4's "Prim and
Kruskal nest stages; each nested closure reacquires the lock on entry" — do
not compute the aggregate MST reply under one `dispatch` call the way the LF
core's `build_mst` does. Instead each fragment independently locks `core`,
reads or extends the tree, and hands its piece of the reply back so the next
nested stage can run.
*/

use crate::error::{MstError, Result};
use crate::graph::Graph;
use crate::mst::{MstFactory, Strategy};
use crate::protocol::Command;
use crate::tree::Tree;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

struct Core {
    graph: Option<Graph>,
    tree: Option<Tree>,
    factory: MstFactory,
}

/// The graph/tree state shared by every connected client, guarded by one
/// coarse lock as specified for both concurrency cores ("Shared-resource
/// policy" in `SPEC_FULL.md` §5).
pub struct SharedState {
    core: Mutex<Core>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            core: Mutex::new(Core {
                graph: None,
                tree: None,
                factory: MstFactory::new(Strategy::Prim),
            }),
        }
    }

    /// Runs `command` against the shared graph/tree and returns the reply
    /// line to send back to the client. Never panics or propagates an error
    /// across the session boundary: every [`MstError`] is turned into its
    /// client-facing message here.
    pub fn dispatch(&self, command: Command) -> String {
        let mut core = match self.lock() {
            Ok(guard) => guard,
            Err(err) => return err.client_message(),
        };
        match run(&mut core, command) {
            Ok(reply) => reply,
            Err(err) => err.client_message(),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Core>> {
        self.core
            .try_lock()
            .map_err(|_| MstError::contention("graph state"))
    }

    /// Builds the MST with `strategy` and stores it, returning the
    /// `"MST edges: …"` fragment. Used only by the pipeline's Prim/Kruskal
    /// stages (`concurrency::pipeline`'s `run_mst_stage`), which nest into
    /// the weight/shortest/longest/average stages afterward instead of
    /// computing the whole aggregate reply under one lock acquisition.
    pub fn build_mst_fragment(&self, strategy: Strategy) -> Result<String> {
        let mut core = self.lock()?;
        core.factory.set_strategy(strategy);
        let graph = core
            .graph
            .as_ref()
            .ok_or_else(|| MstError::precondition("Graph not initialized"))?;
        let tree = core.factory.create_mst(graph)?;
        let dump = tree
            .edges()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        core.tree = Some(tree);
        Ok(format!("MST edges: {dump}"))
    }

    /// The MST's total weight, re-locking independently of
    /// [`SharedState::build_mst_fragment`].
    pub fn weight_fragment(&self) -> Result<String> {
        let core = self.lock()?;
        let tree = require_tree(&core)?;
        Ok(format!("Total weight: {}", tree.total_weight()))
    }

    /// The MST's minimum-weight reachable pair, re-locking independently of
    /// [`SharedState::build_mst_fragment`].
    pub fn shortest_pair_fragment(&self) -> Result<String> {
        let mut core = self.lock()?;
        let tree = require_tree_mut(&mut core)?;
        Ok(match tree.shortest_pair() {
            Some((path, weight)) => format!("Shortest pair: {path} [{weight}]"),
            None => "Shortest pair: none".to_string(),
        })
    }

    /// The MST's diameter, re-locking independently of
    /// [`SharedState::build_mst_fragment`].
    pub fn diameter_fragment(&self) -> Result<String> {
        let core = self.lock()?;
        let tree = require_tree(&core)?;
        Ok(format!("Diameter: {}", tree.diameter()))
    }

    /// The MST's average pairwise distance, re-locking independently of
    /// [`SharedState::build_mst_fragment`].
    pub fn average_fragment(&self) -> Result<String> {
        let mut core = self.lock()?;
        let tree = require_tree_mut(&mut core)?;
        Ok(match tree.average_distance() {
            Some(avg) => format!("Average distance: {avg:.2}"),
            None => "Average distance: n/a".to_string(),
        })
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

fn run(core: &mut Core, command: Command) -> Result<String> {
    match command {
        Command::NewGraph { n, edges } => {
            let mut graph = Graph::new(n);
            for (u, v, w) in &edges {
                graph.add_edge(*u, *v, *w);
            }
            let reply = format!(
                "Graph created with {n} vertices and {m} edges.",
                m = edges.len()
            );
            core.graph = Some(graph);
            core.tree = None;
            Ok(reply)
        }
        Command::AddEdge { u, v, w } => {
            let graph = core
                .graph
                .as_mut()
                .ok_or_else(|| MstError::precondition("Graph not initialized"))?;
            if graph.add_edge(u, v, w) {
                Ok(format!("Edge added: {u}-{v} ({w})."))
            } else {
                Ok(format!("Invalid edge: {u}-{v}."))
            }
        }
        Command::RemoveEdge { u, v } => {
            let graph = core
                .graph
                .as_mut()
                .ok_or_else(|| MstError::precondition("Graph not initialized"))?;
            if graph.remove_edge(u, v) {
                Ok(format!("Edge removed: {u}-{v}."))
            } else {
                Ok(format!("Edge {u}-{v} does not exist."))
            }
        }
        Command::Prim => build_mst(core, Strategy::Prim),
        Command::Kruskal => build_mst(core, Strategy::Kruskal),
        Command::MstWeight => {
            let tree = require_tree(core)?;
            Ok(format!(
                "Total weight of the MST is: {}",
                tree.total_weight()
            ))
        }
        Command::ShortestPath(Some((u, v))) => {
            let tree = require_tree(core)?;
            match tree.shortest_path(u, v) {
                Some((path, weight)) => Ok(format!(
                    "Shortest path from {u} to {v} is: {path} [{weight}]"
                )),
                None => Ok(format!("No path exists between {u} and {v}.")),
            }
        }
        Command::ShortestPath(None) => {
            let tree = require_tree_mut(core)?;
            match tree.shortest_pair() {
                Some((path, weight)) => {
                    Ok(format!("Shortest path in the MST is: {path} [{weight}]"))
                }
                None => Ok("The MST has no edges.".to_string()),
            }
        }
        Command::LongestPath => {
            let tree = require_tree(core)?;
            Ok(format!(
                "The longest path (diameter) of the MST is: {}",
                tree.diameter()
            ))
        }
        Command::AverageDistance => {
            let tree = require_tree_mut(core)?;
            match tree.average_distance() {
                Some(avg) => Ok(format!("Average distance of the MST is: {avg:.2}")),
                None => Ok("The MST has no reachable pairs.".to_string()),
            }
        }
        Command::Exit => Ok("Goodbye".to_string()),
        Command::Invalid(line) => Ok(format!("Invalid command: {line}")),
    }
}

fn build_mst(core: &mut Core, strategy: Strategy) -> Result<String> {
    let graph = core
        .graph
        .as_ref()
        .ok_or_else(|| MstError::precondition("Graph not initialized"))?;
    core.factory.set_strategy(strategy);
    let mut tree = core.factory.create_mst(graph)?;

    let dump = tree
        .edges()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let weight = tree.total_weight();
    let diameter = tree.diameter();
    let average = tree.average_distance().unwrap_or(0.0);
    let shortest_pair = tree
        .shortest_pair()
        .map(|(path, w)| format!("{path} [{w}]"))
        .unwrap_or_else(|| "none".to_string());

    core.tree = Some(tree);

    Ok(format!(
        "MST edges: {dump}. Total weight: {weight}. Shortest pair: {shortest_pair}. \
         Diameter: {diameter}. Average distance: {average:.2}."
    ))
}

fn require_tree(core: &Core) -> Result<&Tree> {
    core.tree
        .as_ref()
        .ok_or_else(|| MstError::precondition("MST not created"))
}

fn require_tree_mut(core: &mut Core) -> Result<&mut Tree> {
    core.tree
        .as_mut()
        .ok_or_else(|| MstError::precondition("MST not created"))
}

/// A one-shot completion signal bundling a command's eventual reply, used by
/// the Pipeline core so a session thread can block on a command submitted to
/// a chain of `ActiveObject` stages without holding a reference into those
/// stages. Owned by the session, never shared beyond one command.
pub struct Completion {
    reply: Mutex<Option<String>>,
    done: AtomicBool,
    cv: Condvar,
}

impl Completion {
    pub fn new() -> Self {
        Self {
            reply: Mutex::new(None),
            done: AtomicBool::new(false),
            cv: Condvar::new(),
        }
    }

    /// Called once, by the pipeline's final (respond) stage.
    pub fn complete(&self, reply: String) {
        let mut guard = self.reply.lock().unwrap();
        *guard = Some(reply);
        self.done.store(true, Ordering::Release);
        self.cv.notify_all();
    }

    /// Blocks until [`Completion::complete`] has been called and returns the
    /// reply.
    pub fn wait(&self) -> String {
        let guard = self.reply.lock().unwrap();
        let mut guard = self
            .cv
            .wait_while(guard, |reply| reply.is_none())
            .unwrap();
        guard.take().expect("completion signaled without a reply")
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}
