//! Write Pipeline Module
//!
//! Orchestrates a client write against an existing object: locate the
//! container, authorize, check the object exists, mutate locally, replicate,
//! and undo the local mutation if replication does not fully succeed.
//!
//! ## Core Concepts
//! - **WritePipeline**: Runs one request through the state machine
//!   `Start -> Located -> Authorized -> LocallyMutated -> Replicated`, or
//!   `LocallyMutated -> ReplicationFailed -> RolledBack`, or straight to `Rejected`.
//! - **Compensation**: The rollback guard. It is armed with the inverse operation when the
//!   local mutation lands, disarmed when replication succeeds, and run when it fails.
//!   The inverse is applied locally and then broadcast once, best-effort.
//! - **Object locks**: The object's lock is held from the existence check until the
//!   response is chosen, so pre-image capture, mutation and rollback never interleave
//!   with another write to the same object on this node.

pub mod compensation;
pub mod types;
pub mod write;
