//! Server Module
//!
//! HTTP surface of a node: the client API for objects and containers plus the
//! internal endpoints peers call on each other.
//!
//! ## Routes
//! - `PUT  /{user}/{container}/{*key}?rename=|offset=`: Write Pipeline (rename or range write).
//! - `POST /{user}/{container}/{*key}`: object create.
//! - `DELETE /{user}/{container}?audit_log=true|keys=true`: container lifecycle.
//! - `GET  /{user}?stats=true`: containers held by this node for a user.
//! - `GET  /_cluster/health`, `GET /_cluster/containers/{user}/{container}`,
//!   `POST /_cluster/replicate`: internode.

pub mod handlers;
pub mod protocol;
pub mod response;
pub mod router;
pub mod state;
