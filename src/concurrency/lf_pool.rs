/*!
# Leader-Follower Thread Pool

A fixed pool of worker threads sharing one [`Reactor`]. Exactly one worker is
ever "the leader" blocked inside `Reactor::wait`; every other worker is a
sleeping follower. When the leader's wait returns a ready set, it promotes a
follower to take its place *before* running any handler, then goes on to
process the event itself and re-enters the leader/follower contest once it is
done. This is the same promotion protocol as the source's `LFThreadPool`,
expressed here as a shared leader slot plus a [`ThreadContext`] per worker
instead of a `shared_ptr<Reactor>` handed to bare `std::thread`s.

Invariants maintained at every point workers can observe shared state:

- **I1** at most one worker holds the leader slot at a time.
- **I2** a worker only calls `Reactor::wait` while holding the leader slot.
- **I3** the leader promotes a follower distinct from itself before
  processing an event, so the reactor is never left unattended while a
  handler runs. A pool of fewer than two workers has no distinct follower to
  promote; `LfThreadPool::new` refuses that configuration outright rather
  than let promotion silently become a self-promotion or a no-op that
  deadlocks the pool once the lone worker blocks in `select`.
- **I4** an awake (non-sleeping) worker is always either the leader or about
  to become one; nothing wakes a worker without handing it the slot.

The reactor's mutex is held only across `Reactor::wait` — the blocking
`select` call — and released before promotion and dispatch run, so the newly
promoted leader can re-enter `wait` concurrently with the previous leader's
handler execution instead of the whole pool serializing on one event at a
time.

Shutdown sets a stop flag and writes to the reactor's self-pipe so a worker
parked inside `select` wakes up and observes the flag instead of being
cancelled outright.
*/

use crate::concurrency::reactor::Reactor;
use crate::concurrency::thread_context::ThreadContext;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Shared {
    reactor: Mutex<Reactor>,
    contexts: Vec<Arc<ThreadContext>>,
    leader: AtomicUsize,
    stop: AtomicBool,
    select_timeout: Duration,
}

const NO_LEADER: usize = usize::MAX;

/// A pool of `size` worker threads taking turns as the reactor's leader.
pub struct LfThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl LfThreadPool {
    /// # Panics
    ///
    /// Panics if `size < 2`. A one-worker pool has no distinct follower to
    /// promote (I3); the sole worker would have to promote itself, which
    /// both violates I3 and deadlocks the pool the moment it blocks in
    /// `select` with nothing left to wake it. `LfServerConfig::pool_size`
    /// already rejects this at the CLI layer; this assertion guards any
    /// other caller that constructs a pool directly.
    pub fn new(size: usize, reactor: Reactor, select_timeout: Duration) -> Self {
        assert!(
            size >= 2,
            "LfThreadPool requires at least 2 workers (I3: no-self-promotion)"
        );
        let contexts: Vec<Arc<ThreadContext>> =
            (0..size).map(|_| Arc::new(ThreadContext::new())).collect();
        let shared = Arc::new(Shared {
            reactor: Mutex::new(reactor),
            contexts,
            leader: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
            select_timeout,
        });
        shared.contexts[0].wake_up();

        let workers = (0..size)
            .map(|id| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || Self::worker_loop(shared, id))
            })
            .collect();

        Self { shared, workers }
    }

    fn worker_loop(shared: Arc<Shared>, id: usize) {
        let ctx = Arc::clone(&shared.contexts[id]);
        loop {
            ctx.wait_until_woken(&shared.stop);
            if shared.stop.load(Ordering::Acquire) {
                return;
            }

            shared.leader.store(id, Ordering::Release);
            let waited = {
                let mut reactor = shared.reactor.lock().unwrap();
                reactor.wait(shared.select_timeout)
            };

            // Promote before dispatching: the successor can start its own
            // `wait` the instant it wakes, overlapping with this thread
            // running the handlers below rather than waiting for them.
            Self::promote_next(&shared, id);

            match waited {
                Ok(ready) if !ready.is_empty() => {
                    Reactor::dispatch_ready(ready);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(worker = id, error = %err, "reactor event loop failed");
                }
            }

            ctx.sleep();
        }
    }

    /// Wakes a sleeping follower distinct from `current` in round-robin
    /// order so a leader is always available before the current leader
    /// starts processing its event. A no-op when the pool has fewer than
    /// two workers (I3: there is no distinct follower to promote).
    fn promote_next(shared: &Shared, current: usize) {
        if shared.stop.load(Ordering::Acquire) {
            return;
        }
        if shared.contexts.len() < 2 {
            return;
        }
        let next = (current + 1) % shared.contexts.len();
        shared.contexts[next].wake_up();
    }

    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.leader.store(NO_LEADER, Ordering::Release);
        for ctx in &self.shared.contexts {
            ctx.wake_up();
        }
        self.shared.reactor.lock().unwrap().wake();
    }
}

impl Drop for LfThreadPool {
    fn drop(&mut self) {
        self.stop();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
