//! The two concurrency cores the server can run on: a fixed
//! parse/execute/respond [`pipeline::Pipeline`] of [`active_object::ActiveObject`]s,
//! or a [`lf_pool::LfThreadPool`] of workers taking turns as a
//! [`reactor::Reactor`] leader.

pub mod active_object;
pub mod lf_pool;
pub mod pipeline;
pub mod reactor;
pub mod thread_context;
