/*!
A TCP server that builds weighted graphs from a line protocol and serves
Minimum Spanning Tree queries over two interchangeable concurrency cores: a
parse/execute/respond Active-Object pipeline, and a Leader-Follower reactor
pool. Both cores share the same [`graph`]/[`tree`]/[`mst`] domain model and
the same [`session::SharedState`] dispatcher; only the concurrency wiring
around it differs.
*/

pub mod concurrency;
pub mod config;
pub mod error;
pub mod graph;
pub mod lf_server;
pub mod mst;
pub mod pipeline_server;
pub mod protocol;
pub mod session;
pub mod shutdown;
pub mod tree;
