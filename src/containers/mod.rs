//! Containers Module
//!
//! A container is the unit of ownership and authorization: objects live inside
//! containers, and every container is held by one or more nodes.
//!
//! ## Core Concepts
//! - **Registry**: `ContainerRegistry` holds the containers this node serves, with their audit log
//!   and key-value pairs.
//! - **Directory**: `ContainerDirectory` is the lookup seam: local lookups plus asking peers who
//!   owns a container this node does not hold.
//! - **Locator**: `ContainerLocator` turns those answers into a single decision:
//!   serve locally, redirect to an owner, or report the container unknown.

pub mod directory;
pub mod locator;
pub mod protocol;
pub mod registry;
pub mod types;
