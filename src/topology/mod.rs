//! Cluster Topology Module
//!
//! Tracks the nodes that make up the cluster and whether they can currently be reached.
//! The write path only ever reads this view: it asks for a node's address when
//! redirecting or replicating, and for the set of reachable peers when looking for
//! container owners.
//!
//! ## Core Mechanisms
//! - **Static membership**: Peers come from configuration; every node has a stable identifier.
//! - **Health probing**: A background loop probes every peer over HTTP and counts consecutive failures.
//! - **Failure Detection**: Uses an "Alive" -> "Suspect" -> "Dead" progression driven by those counts;
//!   a single successful probe brings a peer back to "Alive".

pub mod service;
pub mod types;
