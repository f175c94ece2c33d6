/*!
# Pipeline

A fixed chain of [`ActiveObject`]s: one `parse` stage, seven operation stages,
and one `respond` stage — the same shape as the source's
`Pipeline`/`PipelineStage` template, but with the generic `Input -> Output`
chain expanded into the concrete stages SPEC_FULL.md §4.4 names: "stage 0 for
graph-construction edits, stages 1..6 for Prim, Kruskal, weight, shortest,
longest, average-distance operations respectively". Each stage owns one
worker thread, so two commands of different types run concurrently on
different threads instead of contending for one shared `execute` queue.

The parse stage does real work before a command ever reaches a stage with
access to [`SharedState`]: a malformed line (`Command::Invalid`) is answered
directly without ever touching the shared lock, so it never occupies a
queue that exists for graph/tree work.

Prim and Kruskal nest the other stages (SPEC_FULL.md §4.4's "cross-stage
coordination… Prim and Kruskal nest stages; each nested closure reacquires
the lock on entry"): after building the tree, the Prim/Kruskal stage enqueues
onto the weight stage, which enqueues onto shortest, then longest, then
average, each independently re-locking `SharedState`'s core rather than the
whole aggregate being computed under one lock acquisition.
*/

use crate::concurrency::active_object::ActiveObject;
use crate::error::MstError;
use crate::mst::Strategy;
use crate::protocol::Command;
use crate::session::{Completion, SharedState};
use std::sync::Arc;

/// Handles to the stages a Prim/Kruskal reply nests through after the tree
/// itself has been built, plus the final `respond` stage.
#[derive(Clone)]
struct MstStages {
    weight: Arc<ActiveObject>,
    shortest: Arc<ActiveObject>,
    longest: Arc<ActiveObject>,
    average: Arc<ActiveObject>,
    respond: Arc<ActiveObject>,
}

/// The parse → {construct, prim, kruskal, weight, shortest, longest,
/// average} → respond pipeline used by the pipeline-based front-end.
///
/// The session thread owns reading bytes off the socket (including, for
/// `Newgraph`, the `m` follow-up edge lines — see [`crate::protocol`]), so
/// what reaches the parse stage is already a fully-formed [`Command`].
pub struct Pipeline {
    parse: ActiveObject,
    construct: Arc<ActiveObject>,
    prim: Arc<ActiveObject>,
    kruskal: Arc<ActiveObject>,
    weight: Arc<ActiveObject>,
    shortest: Arc<ActiveObject>,
    longest: Arc<ActiveObject>,
    average: Arc<ActiveObject>,
    respond: Arc<ActiveObject>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            parse: ActiveObject::new(),
            construct: Arc::new(ActiveObject::new()),
            prim: Arc::new(ActiveObject::new()),
            kruskal: Arc::new(ActiveObject::new()),
            weight: Arc::new(ActiveObject::new()),
            shortest: Arc::new(ActiveObject::new()),
            longest: Arc::new(ActiveObject::new()),
            average: Arc::new(ActiveObject::new()),
            respond: Arc::new(ActiveObject::new()),
        }
    }

    /// Submits one parsed command for processing against `state`.
    ///
    /// `completion` is signaled by the respond stage once the reply has been
    /// computed, so the caller can block on it without holding a reference
    /// into the pipeline's internals (it is moved by value through every
    /// closure, never captured by reference, to avoid dangling references if
    /// the session outlives an individual command).
    pub fn submit(&self, command: Command, state: Arc<SharedState>, completion: Arc<Completion>) {
        let construct = Arc::clone(&self.construct);
        let prim = Arc::clone(&self.prim);
        let kruskal = Arc::clone(&self.kruskal);
        let weight = Arc::clone(&self.weight);
        let shortest = Arc::clone(&self.shortest);
        let longest = Arc::clone(&self.longest);
        let average = Arc::clone(&self.average);
        let respond = Arc::clone(&self.respond);

        self.parse.enqueue(move || {
            // Malformed input needs no shared-state access at all; answer it
            // straight from the respond stage instead of occupying an
            // operation stage that exists for graph/tree work.
            if let Command::Invalid(line) = &command {
                let reply = format!("Invalid command: {line}");
                respond.enqueue(move || completion.complete(reply));
                return;
            }

            match command {
                Command::NewGraph { .. }
                | Command::AddEdge { .. }
                | Command::RemoveEdge { .. }
                | Command::Exit => {
                    construct.enqueue(move || {
                        let reply = state.dispatch(command);
                        respond.enqueue(move || completion.complete(reply));
                    });
                }
                Command::MstWeight => {
                    weight.enqueue(move || {
                        let reply = state.dispatch(command);
                        respond.enqueue(move || completion.complete(reply));
                    });
                }
                Command::ShortestPath(_) => {
                    shortest.enqueue(move || {
                        let reply = state.dispatch(command);
                        respond.enqueue(move || completion.complete(reply));
                    });
                }
                Command::LongestPath => {
                    longest.enqueue(move || {
                        let reply = state.dispatch(command);
                        respond.enqueue(move || completion.complete(reply));
                    });
                }
                Command::AverageDistance => {
                    average.enqueue(move || {
                        let reply = state.dispatch(command);
                        respond.enqueue(move || completion.complete(reply));
                    });
                }
                Command::Prim => {
                    let stages = MstStages { weight, shortest, longest, average, respond };
                    prim.enqueue(move || run_mst_stage(Strategy::Prim, state, stages, completion));
                }
                Command::Kruskal => {
                    let stages = MstStages { weight, shortest, longest, average, respond };
                    kruskal
                        .enqueue(move || run_mst_stage(Strategy::Kruskal, state, stages, completion));
                }
                Command::Invalid(_) => unreachable!("handled above"),
            }
        });
    }
}

/// Runs on the Prim/Kruskal stage thread: builds the tree, then nests into
/// weight → shortest → longest → average (stages 3..6 of SPEC_FULL.md
/// §4.4), each reacquiring the shared lock independently, to assemble the
/// aggregate reply.
fn run_mst_stage(
    strategy: Strategy,
    state: Arc<SharedState>,
    stages: MstStages,
    completion: Arc<Completion>,
) {
    match state.build_mst_fragment(strategy) {
        Ok(dump) => nest_weight(dump, state, stages, completion),
        Err(err) => fail(&stages, completion, err),
    }
}

fn nest_weight(acc: String, state: Arc<SharedState>, stages: MstStages, completion: Arc<Completion>) {
    let weight = Arc::clone(&stages.weight);
    weight.enqueue(move || match state.weight_fragment() {
        Ok(part) => nest_shortest(format!("{acc}. {part}"), state, stages, completion),
        Err(err) => fail(&stages, completion, err),
    });
}

fn nest_shortest(
    acc: String,
    state: Arc<SharedState>,
    stages: MstStages,
    completion: Arc<Completion>,
) {
    let shortest = Arc::clone(&stages.shortest);
    shortest.enqueue(move || match state.shortest_pair_fragment() {
        Ok(part) => nest_longest(format!("{acc}. {part}"), state, stages, completion),
        Err(err) => fail(&stages, completion, err),
    });
}

fn nest_longest(
    acc: String,
    state: Arc<SharedState>,
    stages: MstStages,
    completion: Arc<Completion>,
) {
    let longest = Arc::clone(&stages.longest);
    longest.enqueue(move || match state.diameter_fragment() {
        Ok(part) => nest_average(format!("{acc}. {part}"), state, stages, completion),
        Err(err) => fail(&stages, completion, err),
    });
}

fn nest_average(
    acc: String,
    state: Arc<SharedState>,
    stages: MstStages,
    completion: Arc<Completion>,
) {
    let average = Arc::clone(&stages.average);
    average.enqueue(move || match state.average_fragment() {
        Ok(part) => finish(&stages, completion, format!("{acc}. {part}.")),
        Err(err) => fail(&stages, completion, err),
    });
}

fn finish(stages: &MstStages, completion: Arc<Completion>, reply: String) {
    let respond = Arc::clone(&stages.respond);
    respond.enqueue(move || completion.complete(reply));
}

fn fail(stages: &MstStages, completion: Arc<Completion>, err: MstError) {
    finish(stages, completion, err.client_message());
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
