/*!
# Thread Context

A cancellable worker with a private wake/sleep condition, used by the
leader-follower pool. The source used `pthread_cancel` to unblock a leader
stuck inside `select`; Rust has no portable thread-cancellation primitive, so
[`super::reactor::Reactor`] is unblocked with a self-pipe write instead (see
that module) and `ThreadContext::stop` only ever needs to flip an atomic flag
and notify the condition variable that guards a *follower's* sleep, not a
leader's blocking syscall.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

/// Per-worker wake/sleep coordination state for the leader-follower pool.
///
/// `awake` tracks whether this context is the current leader (or has been
/// promoted and is about to become one); followers call
/// [`ThreadContext::wait_until_woken`] to sleep until promoted or told to
/// stop.
pub struct ThreadContext {
    awake: AtomicBool,
    mutex: Mutex<()>,
    cv: Condvar,
}

impl ThreadContext {
    pub fn new() -> Self {
        Self {
            awake: AtomicBool::new(false),
            mutex: Mutex::new(()),
            cv: Condvar::new(),
        }
    }

    pub fn is_awake(&self) -> bool {
        self.awake.load(Ordering::Acquire)
    }

    /// Promotes this context to leader and wakes it if it was sleeping.
    pub fn wake_up(&self) {
        let _guard = self.mutex.lock().unwrap();
        self.awake.store(true, Ordering::Release);
        self.cv.notify_one();
    }

    pub fn sleep(&self) {
        let _guard = self.mutex.lock().unwrap();
        self.awake.store(false, Ordering::Release);
    }

    /// Blocks until woken (promoted) or `stop_flag` is set.
    pub fn wait_until_woken(&self, stop_flag: &AtomicBool) {
        let guard = self.mutex.lock().unwrap();
        let _guard = self
            .cv
            .wait_while(guard, |_| {
                !self.awake.load(Ordering::Acquire) && !stop_flag.load(Ordering::Acquire)
            })
            .unwrap();
    }
}

impl Default for ThreadContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn wake_up_releases_a_waiting_follower() {
        let ctx = Arc::new(ThreadContext::new());
        let stop = Arc::new(AtomicBool::new(false));
        let waiter_ctx = Arc::clone(&ctx);
        let waiter_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            waiter_ctx.wait_until_woken(&waiter_stop);
            waiter_ctx.is_awake()
        });
        thread::sleep(Duration::from_millis(20));
        ctx.wake_up();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn stop_flag_releases_a_waiting_follower() {
        let ctx = Arc::new(ThreadContext::new());
        let stop = Arc::new(AtomicBool::new(false));
        let waiter_ctx = Arc::clone(&ctx);
        let waiter_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            waiter_ctx.wait_until_woken(&waiter_stop);
        });
        thread::sleep(Duration::from_millis(20));
        stop.store(true, Ordering::Release);
        ctx.cv.notify_all();
        handle.join().unwrap();
    }
}
