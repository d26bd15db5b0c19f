//! Module that contains the node ring and everything needed to decide which nodes hold a key
pub mod error;
pub mod hashing;
pub mod membership;
pub mod partitioning;
pub mod state;
