//! Clustered Object Storage Node Library
//!
//! Clients address objects by `(user, container, key)`. Each container is held by
//! one or more nodes; a node serves the containers it holds and redirects
//! clients to an owner for the rest. This crate holds the subsystems; the
//! binary (`main.rs`) wires them together and starts the HTTP listener.
//!
//! ## Architecture Modules
//! - **`errors`**: The fixed mapping from internal error codes to HTTP status and error id,
//!   and the JSON error envelope.
//! - **`auth`**: API-key authentication and the per-request permission context.
//! - **`config`**: Node configuration loaded from JSON.
//! - **`topology`**: Cluster members and background health probing.
//! - **`containers`**: Container model, locally held containers, and owner lookup across the cluster.
//! - **`objects`**: The object store contract, an in-memory implementation, and per-object locks.
//! - **`replication`**: Operation descriptors, fan-out to peer owners, and applying peer operations.
//! - **`redirect`**: Rebuilding a request URL against an owning node.
//! - **`pipeline`**: The write state machine with compensating rollback.
//! - **`server`**: HTTP handlers and routing.

pub mod auth;
pub mod config;
pub mod containers;
pub mod errors;
pub mod objects;
pub mod pipeline;
pub mod redirect;
pub mod replication;
pub mod server;
pub mod topology;
