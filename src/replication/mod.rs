//! Replication Module
//!
//! After an operation succeeds on the local replica of a container it is
//! fanned out to every other owner of that container.
//!
//! ## Core Concepts
//! - **Operation**: A self-contained description of a mutation (`Create`, `Rename`,
//!   `WriteRange`, `DeleteObject`, `DeleteContainer`) that any owner can apply.
//! - **Replicator**: The coordinator seam. `HttpReplicator` posts the operation to each peer
//!   owner, one attempt per peer, and reports the peers that did not acknowledge.
//! - **Apply**: The receiving side. `ReplicaApplier` deduplicates by `op_id` and applies
//!   the operation under the same per-object locks local writes use, without fanning out again.
//!
//! Replication is best-effort fan-out. There is no quorum and no agreement
//! between peers; callers decide what to do with a partial failure.

pub mod apply;
pub mod coordinator;
pub mod protocol;
pub mod types;
