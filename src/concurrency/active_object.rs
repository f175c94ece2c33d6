/*!
# Active Object

A single background worker thread draining an in-order task queue. The
[`Pipeline`](super::pipeline::Pipeline) uses one of these per stage: enqueuing
a closure returns immediately, and the closures run on the worker thread one
at a time in the order they were enqueued (first-in-first-out), exactly as
the source's `ActiveObject::enqueue`/`run` pair does with a `queue<function<void()>>`
behind a mutex and condition variable.

A task that panics is caught with [`catch_unwind`] and logged rather than
taking the worker thread down with it; the source left this case undefined
(an uncaught C++ exception in `run()` would terminate the process).
*/

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    tasks: Mutex<Vec<Task>>,
    cv: Condvar,
    done: Mutex<bool>,
}

/// A FIFO task queue serviced by one dedicated worker thread.
pub struct ActiveObject {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl ActiveObject {
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            tasks: Mutex::new(Vec::new()),
            cv: Condvar::new(),
            done: Mutex::new(false),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || Self::run(worker_shared));
        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Appends `task` to the queue and wakes the worker. Returns immediately;
    /// the task's effects are only visible after it runs on the worker thread.
    pub fn enqueue<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut tasks = self.shared.tasks.lock().unwrap();
        tasks.push(Box::new(task));
        drop(tasks);
        self.shared.cv.notify_one();
    }

    fn run(shared: Arc<Shared>) {
        loop {
            let task = {
                let mut tasks = shared.tasks.lock().unwrap();
                loop {
                    if !tasks.is_empty() {
                        break;
                    }
                    if *shared.done.lock().unwrap() {
                        return;
                    }
                    tasks = shared.cv.wait(tasks).unwrap();
                }
                tasks.remove(0)
            };
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                tracing::error!("active object task panicked");
            }
        }
    }
}

impl Default for ActiveObject {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ActiveObject {
    fn drop(&mut self) {
        *self.shared.done.lock().unwrap() = true;
        self.shared.cv.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn tasks_run_in_fifo_order() {
        let (tx, rx) = mpsc::channel();
        let ao = ActiveObject::new();
        for i in 0..5 {
            let tx = tx.clone();
            ao.enqueue(move || tx.send(i).unwrap());
        }
        drop(ao);
        let received: Vec<i32> = rx.try_iter().collect();
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn a_panicking_task_does_not_stop_the_worker() {
        let (tx, rx) = mpsc::channel();
        let ao = ActiveObject::new();
        ao.enqueue(|| panic!("boom"));
        ao.enqueue(move || tx.send(()).unwrap());
        drop(ao);
        assert!(rx.try_iter().next().is_some());
    }
}
