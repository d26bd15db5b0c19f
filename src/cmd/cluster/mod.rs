//! Commands that manage the ring of a router. They are only served by routers.
pub mod add_node;
pub mod delete_node;
pub mod list_nodes;
pub mod node_count;
pub mod resolve_replicas;
