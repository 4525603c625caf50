use axum::{
    Router,
    extract::Extension,
    routing::{delete, get, post, put},
};
use std::sync::Arc;

use super::handlers::{
    handle_container_lookup, handle_delete_container, handle_health, handle_list_containers,
    handle_post_object, handle_put_object, handle_replicate,
};
use super::state::AppState;
use crate::containers::protocol::ENDPOINT_CONTAINERS_INTERNAL;
use crate::replication::protocol::ENDPOINT_REPLICATE;
use crate::topology::service::ENDPOINT_HEALTH;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(
            &format!("{}/:user/:container", ENDPOINT_CONTAINERS_INTERNAL),
            get(handle_container_lookup),
        )
        .route(ENDPOINT_REPLICATE, post(handle_replicate))
        .route("/:user", get(handle_list_containers))
        .route("/:user/:container", delete(handle_delete_container))
        .route(
            "/:user/:container/*key",
            put(handle_put_object).post(handle_post_object),
        )
        .layer(Extension(state))
}
