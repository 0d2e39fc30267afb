use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{authz, extractors::AuthUser},
    error::ApiError,
    permissions::{
        dto::{PermissionRequest, PermissionResponse},
        repo::Permission,
    },
    state::AppState,
};

pub fn permission_routes() -> Router<AppState> {
    Router::new()
        .route("/permissions", post(create_permission).get(list_permissions))
        .route(
            "/permissions/:id",
            get(get_permission)
                .put(update_permission)
                .delete(delete_permission),
        )
}

fn to_response(permission: Permission) -> PermissionResponse {
    PermissionResponse {
        id: permission.id,
        name: permission.name,
    }
}

#[instrument(skip(state, payload))]
pub async fn create_permission(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<PermissionRequest>,
) -> Result<Json<PermissionResponse>, ApiError> {
    authz::require(&state.db, actor, "PERMISSION_CREATE").await?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Permission name must not be blank".into(),
        ));
    }

    let permission = Permission::insert(&state.db, &payload.name).await?;
    info!(permission_id = %permission.id, name = %permission.name, "permission created");
    Ok(Json(to_response(permission)))
}

#[instrument(skip(state))]
pub async fn get_permission(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PermissionResponse>, ApiError> {
    authz::require(&state.db, actor, "PERMISSION_VIEW").await?;

    let permission = Permission::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Permission not found: {id}")))?;
    Ok(Json(to_response(permission)))
}

#[instrument(skip(state))]
pub async fn list_permissions(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<PermissionResponse>>, ApiError> {
    authz::require(&state.db, actor, "PERMISSION_VIEW").await?;

    let permissions = Permission::list(&state.db).await?;
    Ok(Json(permissions.into_iter().map(to_response).collect()))
}

#[instrument(skip(state, payload))]
pub async fn update_permission(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PermissionRequest>,
) -> Result<Json<PermissionResponse>, ApiError> {
    authz::require(&state.db, actor, "PERMISSION_UPDATE").await?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Permission name must not be blank".into(),
        ));
    }

    let permission = Permission::update(&state.db, id, &payload.name)
        .await?
        .ok_or_else(|| {
            warn!(permission_id = %id, "permission not found");
            ApiError::NotFound(format!("Permission not found: {id}"))
        })?;

    info!(permission_id = %permission.id, "permission updated");
    Ok(Json(to_response(permission)))
}

#[instrument(skip(state))]
pub async fn delete_permission(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authz::require(&state.db, actor, "PERMISSION_DELETE").await?;

    let deleted = Permission::delete(&state.db, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("Permission not found: {id}")));
    }

    info!(permission_id = %id, "permission deleted");
    Ok(Json(json!({
        "success": true,
        "message": "Permission deleted successfully",
        "id": id,
    })))
}
