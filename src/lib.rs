//! ringkv: a replicated key/value router built on consistent hashing.
//!
//! A router keeps a ring of storage nodes (each one placed at several virtual positions) and
//! replicates every write to the first distinct nodes found clockwise from the key's position.
pub mod backend;
pub mod client;
pub mod cluster;
pub mod cmd;
pub mod controller;
pub mod error;
pub mod server;
pub mod storage_engine;
pub mod telemetry;

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;
