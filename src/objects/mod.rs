//! Object Store Module
//!
//! Local operations on existing objects of a container this node holds:
//! existence checks, bounded reads, byte-range writes and key renames, plus the
//! create/delete primitives used by object creation and replicated operations.
//!
//! ## Core Concepts
//! - **Contract**: [`store::ObjectStore`] is the seam the write path depends on; no call made
//!   through it ever leaves the node.
//! - **Range arithmetic**: Writes past the current end grow the object and zero-fill the gap,
//!   so an object never has undefined regions.
//! - **Per-object locking**: [`locks::ObjectLocks`] serializes read-mutate-restore sequences on the
//!   same `(container, key)`.

pub mod locks;
pub mod memory;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
