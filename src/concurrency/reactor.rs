/*!
# Reactor

A single-threaded readiness multiplexer over `select(2)`, matching the
source's `Reactor` class: a map from file descriptor to handler closure, plus
`addHandle`/`removeHandle`/`handleEvents`. `deactivateHandle`/`reactivateHandle`
are folded into `wait`'s read-set membership rather than kept as separate
always-the-same-net-effect calls, since toggling membership in the interest
set is exactly what disjoint-set union/find expresses as "these two
operations are inverses" (see `SPEC_FULL.md`'s note on the identity law).

`addHandle` takes an [`EventKind`] alongside the handler, per SPEC_FULL.md
§4.5's `registerHandler(handler, event_kind)`. `Read`/`Accept`/`Disconnect`
fds are waited on for read-readiness, `Write`/`Connect` fds for
write-readiness; the two servers in this crate only ever register `Read`
(for client command sockets) and `Accept` (for the listening socket), but
the taxonomy is exposed in full rather than narrowed to the subset currently
exercised.

`wait` and `dispatch_ready` are two halves of what used to be one
`handle_events` call: `wait` does the blocking `select` and hands back the
ready fds' handlers (cloned out as `Arc<Mutex<Handler>>`) without running
any of them, so a caller holding `Reactor` behind a pool-wide lock (see
`concurrency::lf_pool`) can release that lock — and promote a new leader —
before running a single handler. `handle_events` is kept as a convenience
that chains the two for single-threaded callers and tests.

Unblocking a leader parked inside `select` for shutdown uses the self-pipe
technique: a dedicated pipe is registered like any other fd, and writing one
byte to it wakes `select` up without needing a thread-cancellation API.
*/

use crate::error::{MstError, Result};
use std::collections::{HashMap, VecDeque};
use std::os::unix::io::RawFd;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = Box<dyn FnMut() + Send>;

/// The readiness kind a handle is registered for, per SPEC_FULL.md §4.5.
/// `Accept` is listed separately from `Read` in the spec ("ACCEPT≈READ")
/// because it names a different *use* of read-readiness (a listening socket
/// becoming acceptable) even though it waits on the same fd set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Read,
    Write,
    Accept,
    Disconnect,
    Connect,
}

impl EventKind {
    fn waits_for_write(self) -> bool {
        matches!(self, EventKind::Write | EventKind::Connect)
    }
}

/// A registration change requested from inside a handler (which cannot
/// re-borrow the `Reactor` it is running under). Queued here and applied by
/// [`Reactor::wait`] once the current dispatch round is done.
enum PendingOp {
    Add(RawFd, EventKind, Handler),
    Remove(RawFd),
}

/// A handle handlers can clone and capture to register or drop file
/// descriptors without reentering the `Reactor` they are called from.
#[derive(Clone)]
pub struct Registry {
    pending: Arc<Mutex<VecDeque<PendingOp>>>,
}

impl Registry {
    pub fn add(&self, fd: RawFd, kind: EventKind, event: Handler) {
        self.pending
            .lock()
            .unwrap()
            .push_back(PendingOp::Add(fd, kind, event));
    }

    pub fn remove(&self, fd: RawFd) {
        self.pending.lock().unwrap().push_back(PendingOp::Remove(fd));
    }
}

/// Multiplexes readiness across a set of file descriptors with one
/// `select(2)` call per [`Reactor::wait`] invocation.
pub struct Reactor {
    handlers: HashMap<RawFd, (EventKind, Arc<Mutex<Handler>>)>,
    active: Vec<RawFd>,
    wakeup_read: RawFd,
    wakeup_write: RawFd,
    pending: Arc<Mutex<VecDeque<PendingOp>>>,
}

/// A ready fd paired with the handler to invoke for it, returned by
/// [`Reactor::wait`] and consumed by [`Reactor::dispatch_ready`].
pub type ReadySet = Vec<(RawFd, Arc<Mutex<Handler>>)>;

impl Reactor {
    /// Builds a reactor with its self-pipe already registered (read end is a
    /// plain drain-and-ignore handler; writing to the write end from any
    /// thread breaks a blocked `select` out of its wait).
    pub fn new() -> Result<Self> {
        let mut fds = [0 as RawFd; 2];
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        if rc != 0 {
            return Err(MstError::fatal_setup("failed to create self-pipe"));
        }
        let mut reactor = Self {
            handlers: HashMap::new(),
            active: Vec::new(),
            wakeup_read: fds[0],
            wakeup_write: fds[1],
            pending: Arc::new(Mutex::new(VecDeque::new())),
        };
        let drain_fd = reactor.wakeup_read;
        reactor.add_handle(
            drain_fd,
            EventKind::Read,
            Box::new(move || drain_fd_into_void(drain_fd)),
        );
        Ok(reactor)
    }

    /// A cloneable handle a handler can capture to register fds of its own
    /// (e.g. an accept handler registering a new client) without reentering
    /// this `Reactor`.
    pub fn registry(&self) -> Registry {
        Registry {
            pending: Arc::clone(&self.pending),
        }
    }

    pub fn add_handle(&mut self, fd: RawFd, kind: EventKind, event: Handler) {
        self.add_handle_inner(fd, kind, event);
    }

    pub fn remove_handle(&mut self, fd: RawFd) {
        self.remove_handle_inner(fd);
    }

    /// Removes `fd` from the interest set without dropping its handler,
    /// so a later [`Reactor::reactivate_handle`] restores it unchanged.
    pub fn deactivate_handle(&mut self, fd: RawFd) {
        self.active.retain(|&active_fd| active_fd != fd);
    }

    pub fn reactivate_handle(&mut self, fd: RawFd) {
        if self.handlers.contains_key(&fd) && !self.active.contains(&fd) {
            self.active.push(fd);
        }
    }

    /// Wakes a thread blocked in [`Reactor::wait`] by writing to the
    /// self-pipe. Safe to call from any thread.
    pub fn wake(&self) {
        let byte = [0u8; 1];
        unsafe {
            libc::write(self.wakeup_write, byte.as_ptr() as *const libc::c_void, 1);
        }
    }

    /// Waits up to `timeout` for readiness on any active fd and returns the
    /// ready fds together with (cloned) handles to their handlers, without
    /// invoking any of them. Splitting this out from dispatch is what lets
    /// `LfThreadPool` promote a successor between "an event is ready" and
    /// "the handler for it has run" (SPEC_FULL.md §4.7).
    pub fn wait(&mut self, timeout: Duration) -> Result<ReadySet> {
        self.apply_pending();

        if self.active.is_empty() {
            std::thread::sleep(timeout);
            return Ok(Vec::new());
        }

        let mut read_set: libc::fd_set = unsafe { std::mem::zeroed() };
        let mut write_set: libc::fd_set = unsafe { std::mem::zeroed() };
        unsafe {
            libc::FD_ZERO(&mut read_set);
            libc::FD_ZERO(&mut write_set);
        }
        let mut max_fd = 0;
        for &fd in &self.active {
            let wants_write = self
                .handlers
                .get(&fd)
                .is_some_and(|(kind, _)| kind.waits_for_write());
            if wants_write {
                unsafe { libc::FD_SET(fd, &mut write_set) };
            } else {
                unsafe { libc::FD_SET(fd, &mut read_set) };
            }
            max_fd = max_fd.max(fd);
        }

        let mut tv = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };

        let activity = unsafe {
            libc::select(
                max_fd + 1,
                &mut read_set,
                &mut write_set,
                std::ptr::null_mut(),
                &mut tv,
            )
        };

        if activity < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }
            return Err(MstError::fatal_runtime(format!("select failed: {err}")));
        }
        if activity == 0 {
            return Ok(Vec::new());
        }

        let mut ready = Vec::new();
        for &fd in &self.active {
            let Some((kind, handler)) = self.handlers.get(&fd) else {
                continue;
            };
            let is_ready = if kind.waits_for_write() {
                unsafe { libc::FD_ISSET(fd, &write_set) }
            } else {
                unsafe { libc::FD_ISSET(fd, &read_set) }
            };
            if is_ready {
                ready.push((fd, Arc::clone(handler)));
            }
        }

        self.apply_pending();
        Ok(ready)
    }

    /// Invokes every handler in `ready` exactly once, in order. Takes no
    /// `Reactor` access at all, so it can run after the pool-wide lock
    /// guarding the reactor's readiness state has already been released.
    pub fn dispatch_ready(ready: ReadySet) -> usize {
        let mut handled = 0;
        for (_, handler) in ready {
            let mut handler = handler.lock().unwrap();
            handler();
            handled += 1;
        }
        handled
    }

    /// Convenience composition of [`Reactor::wait`] and
    /// [`Reactor::dispatch_ready`] for single-threaded callers that have no
    /// use for the split (tests, the pipeline server's accept loop).
    pub fn handle_events(&mut self, timeout: Duration) -> Result<usize> {
        let ready = self.wait(timeout)?;
        Ok(Self::dispatch_ready(ready))
    }

    fn apply_pending(&mut self) {
        let ops: Vec<PendingOp> = self.pending.lock().unwrap().drain(..).collect();
        for op in ops {
            match op {
                PendingOp::Add(fd, kind, handler) => self.add_handle_inner(fd, kind, handler),
                PendingOp::Remove(fd) => self.remove_handle_inner(fd),
            }
        }
    }

    fn add_handle_inner(&mut self, fd: RawFd, kind: EventKind, event: Handler) {
        self.handlers.insert(fd, (kind, Arc::new(Mutex::new(event))));
        if !self.active.contains(&fd) {
            self.active.push(fd);
        }
    }

    fn remove_handle_inner(&mut self, fd: RawFd) {
        self.handlers.remove(&fd);
        self.active.retain(|&active_fd| active_fd != fd);
    }
}

fn drain_fd_into_void(fd: RawFd) {
    let mut buf = [0u8; 64];
    unsafe {
        libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len());
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.wakeup_read);
            libc::close(self.wakeup_write);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn wake_unblocks_a_pending_select() {
        let mut reactor = Reactor::new().unwrap();
        let fired = reactor
            .handle_events(Duration::from_millis(5))
            .unwrap_or(0);
        let _ = fired;

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        reactor.wake();
        let handled = reactor.handle_events(Duration::from_secs(1)).unwrap();
        assert!(handled >= 1);
        counter_clone.fetch_add(1, Ordering::SeqCst);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deactivated_handle_is_skipped_until_reactivated() {
        let mut reactor = Reactor::new().unwrap();
        let hit = Arc::new(AtomicUsize::new(0));
        let hit_clone = Arc::clone(&hit);
        let (read_fd, write_fd) = unsafe {
            let mut fds = [0 as RawFd; 2];
            libc::pipe(fds.as_mut_ptr());
            (fds[0], fds[1])
        };
        reactor.add_handle(
            read_fd,
            EventKind::Read,
            Box::new(move || {
                let mut buf = [0u8; 1];
                unsafe { libc::read(read_fd, buf.as_mut_ptr() as *mut libc::c_void, 1) };
                hit_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        reactor.deactivate_handle(read_fd);
        unsafe {
            libc::write(write_fd, [1u8].as_ptr() as *const libc::c_void, 1);
        }
        let handled = reactor.handle_events(Duration::from_millis(20)).unwrap();
        assert_eq!(handled, 0);
        assert_eq!(hit.load(Ordering::SeqCst), 0);

        reactor.reactivate_handle(read_fd);
        let handled = reactor.handle_events(Duration::from_secs(1)).unwrap();
        assert!(handled >= 1);
        assert_eq!(hit.load(Ordering::SeqCst), 1);

        unsafe {
            libc::close(write_fd);
        }
    }

    #[test]
    fn registry_registers_a_handle_from_inside_another_handler() {
        let mut reactor = Reactor::new().unwrap();
        let registry = reactor.registry();
        let (read_fd, write_fd) = unsafe {
            let mut fds = [0 as RawFd; 2];
            libc::pipe(fds.as_mut_ptr());
            (fds[0], fds[1])
        };
        let hit = Arc::new(AtomicUsize::new(0));
        let hit_clone = Arc::clone(&hit);

        registry.add(
            read_fd,
            EventKind::Read,
            Box::new(move || {
                let mut buf = [0u8; 1];
                unsafe { libc::read(read_fd, buf.as_mut_ptr() as *mut libc::c_void, 1) };
                hit_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let _ = reactor.handle_events(Duration::from_millis(10));

        unsafe {
            libc::write(write_fd, [1u8].as_ptr() as *const libc::c_void, 1);
        }
        let handled = reactor.handle_events(Duration::from_secs(1)).unwrap();
        assert!(handled >= 1);
        assert_eq!(hit.load(Ordering::SeqCst), 1);

        unsafe {
            libc::close(write_fd);
        }
    }

    #[test]
    fn wait_returns_ready_handlers_without_running_them() {
        let mut reactor = Reactor::new().unwrap();
        let hit = Arc::new(AtomicUsize::new(0));
        let hit_clone = Arc::clone(&hit);
        let (read_fd, write_fd) = unsafe {
            let mut fds = [0 as RawFd; 2];
            libc::pipe(fds.as_mut_ptr());
            (fds[0], fds[1])
        };
        reactor.add_handle(
            read_fd,
            EventKind::Read,
            Box::new(move || {
                hit_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        unsafe {
            libc::write(write_fd, [1u8].as_ptr() as *const libc::c_void, 1);
        }

        let ready = reactor.wait(Duration::from_secs(1)).unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(hit.load(Ordering::SeqCst), 0);

        let handled = Reactor::dispatch_ready(ready);
        assert_eq!(handled, 1);
        assert_eq!(hit.load(Ordering::SeqCst), 1);

        unsafe {
            libc::close(write_fd);
        }
    }
}
