use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, OriginalUri, Path, Query};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::protocol::{DeleteQuery, HealthResponse, ListQuery, WriteQuery};
use super::response::error;
use super::state::AppState;
use crate::auth::{API_KEY_HEADER, AuthContext};
use crate::containers::types::{ContainerId, ContainerSummary};
use crate::errors::{ErrorCode, ErrorResponse};
use crate::pipeline::types::WriteRequest;
use crate::redirect::RequestOrigin;
use crate::replication::protocol::ReplicateRequest;
use crate::replication::types::Operation;
use crate::topology::types::NodeState;

/// Room for the replication envelope around a payload of the maximum size.
const REPLICATION_OVERHEAD: usize = 64 * 1024;

fn authenticate(state: &AppState, headers: &HeaderMap) -> AuthContext {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    state.authenticator.authenticate(api_key)
}

fn origin(uri: &OriginalUri) -> RequestOrigin {
    let path_and_query = uri
        .0
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.0.path().to_string());
    RequestOrigin::new(path_and_query)
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// Buffers the body up to the transfer limit. `None` when it runs past the
/// limit; the pipeline decides whether that matters for this request.
async fn read_body(state: &AppState, body: Body) -> Option<Vec<u8>> {
    let limit = usize::try_from(state.max_transfer_size).unwrap_or(usize::MAX);
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => Some(bytes.to_vec()),
        Err(e) => {
            debug!("Request body not buffered: {}", e);
            None
        }
    }
}

fn attach_body(req: &mut WriteRequest, body: Option<Vec<u8>>) {
    match body {
        Some(data) => req.data = data,
        None => req.oversized = true,
    }
}

// ============================================================
// OBJECTS
// ============================================================

pub async fn handle_put_object(
    Extension(state): Extension<Arc<AppState>>,
    Path((user, container, key)): Path<(String, String, String)>,
    Query(query): Query<WriteQuery>,
    uri: OriginalUri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let offset = match query.offset.as_deref().map(str::parse::<u64>).transpose() {
        Ok(offset) => offset,
        Err(_) => {
            warn!("Invalid offset for {}/{}/{}", user, container, key);
            return error(ErrorCode::BadRequest, Some("Offset must be a non-negative integer."));
        }
    };
    let body = read_body(&state, body).await;

    let mut req = WriteRequest::new(
        ContainerId::new(&user, &container),
        &key,
        authenticate(&state, &headers),
    )
    .with_origin(origin(&uri));
    req.rename = query.rename;
    req.offset = offset;
    attach_body(&mut req, body);
    req.content_length = content_length(&headers);

    state.pipeline.clone().execute_detached(req).await.into_response()
}

pub async fn handle_post_object(
    Extension(state): Extension<Arc<AppState>>,
    Path((user, container, key)): Path<(String, String, String)>,
    uri: OriginalUri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let body = read_body(&state, body).await;

    let mut req = WriteRequest::new(
        ContainerId::new(&user, &container),
        &key,
        authenticate(&state, &headers),
    )
    .with_origin(origin(&uri));
    attach_body(&mut req, body);
    req.content_length = content_length(&headers);
    req.content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    state.pipeline.clone().create_detached(req).await.into_response()
}

// ============================================================
// CONTAINERS
// ============================================================

/// Clears the audit log, clears the key-value pairs, or deletes the container,
/// depending on the query. All three are gated by the same permission.
pub async fn handle_delete_container(
    Extension(state): Extension<Arc<AppState>>,
    Path((user, container)): Path<(String, String)>,
    Query(query): Query<DeleteQuery>,
    headers: HeaderMap,
) -> Response {
    let auth = authenticate(&state, &headers);
    if let Err(code) = auth.require_user(&user) {
        warn!("Unauthorized delete of container {}/{}", user, container);
        return error(code, Some("Unauthorized."));
    }
    if !auth.can_delete_containers() {
        warn!("Delete of container {}/{} without permission", user, container);
        return error(ErrorCode::Unauthorized, Some("Unauthorized."));
    }

    let id = ContainerId::new(&user, &container);
    let Some(current) = state.registry.get(&id) else {
        warn!("Unable to find container {}", id);
        return error(ErrorCode::NotFound, Some("Unknown user or container."));
    };

    if query.audit_log {
        state.registry.clear_audit_log(&id);
        info!("Cleared audit log of container {}", id);
        return StatusCode::NO_CONTENT.into_response();
    }
    if query.keys {
        state.registry.clear_key_values(&id);
        info!("Cleared key-value pairs of container {}", id);
        return StatusCode::NO_CONTENT.into_response();
    }

    if let Err(e) = state.store.drop_container(&id).await {
        warn!("Unable to delete objects of container {}: {}", id, e);
        return ErrorResponse::from_code(e.code(), Some("Unable to delete container.")).into_response();
    }
    state.registry.remove(&id);
    info!("Deleted container {}", id);

    if let Err(e) = state
        .replicator
        .replicate(&current, &Operation::DeleteContainer)
        .await
    {
        warn!("Delete of container {} not replicated everywhere: {}", id, e);
    }

    StatusCode::NO_CONTENT.into_response()
}

pub async fn handle_list_containers(
    Extension(state): Extension<Arc<AppState>>,
    Path(user): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Response {
    let auth = authenticate(&state, &headers);
    if let Err(code) = auth.require_user(&user) {
        warn!("Unauthorized container listing for {}", user);
        return error(code, Some("Unauthorized."));
    }

    let containers = state.registry.list_for_user(&user);

    if !query.stats {
        let names: Vec<String> = containers.into_iter().map(|c| c.id.name).collect();
        return (StatusCode::OK, Json(names)).into_response();
    }

    let mut summaries = Vec::with_capacity(containers.len());
    for container in containers {
        let stats = match state.store.stats(&container.id).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Unable to read statistics of {}: {}", container.id, e);
                return ErrorResponse::from_code(e.code(), None).into_response();
            }
        };
        summaries.push(ContainerSummary {
            user: container.id.user,
            name: container.id.name,
            public_write: container.public_write,
            owners: container.owners,
            settings: container.settings,
            object_count: stats.object_count,
            total_bytes: stats.total_bytes,
        });
    }

    (StatusCode::OK, Json(summaries)).into_response()
}

// ============================================================
// INTERNODE
// ============================================================

pub async fn handle_health(
    Extension(state): Extension<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            node_id: state.topology.local_id().clone(),
            state: NodeState::Alive,
        }),
    )
}

pub async fn handle_container_lookup(
    Extension(state): Extension<Arc<AppState>>,
    Path((user, container)): Path<(String, String)>,
) -> StatusCode {
    if state.registry.contains(&ContainerId::new(&user, &container)) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn handle_replicate(Extension(state): Extension<Arc<AppState>>, body: Body) -> StatusCode {
    let limit = usize::try_from(state.max_transfer_size)
        .unwrap_or(usize::MAX)
        .saturating_add(REPLICATION_OVERHEAD);
    let body = match axum::body::to_bytes(body, limit).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Replicated operation rejected: {}", e);
            return StatusCode::PAYLOAD_TOO_LARGE;
        }
    };

    let request = match ReplicateRequest::decode(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Failed to decode replicated operation: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    match state.applier.apply(&request).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!(
                "Unable to apply replicated {} on {}: {}",
                request.operation.name(),
                request.container_id(),
                e
            );
            e.code().status().0
        }
    }
}
