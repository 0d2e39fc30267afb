use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{authz, extractors::AuthUser},
    error::ApiError,
    permissions::{dto::PermissionResponse, repo::Permission},
    roles::{
        dto::{RolePermissionLinkRequest, RoleRequest, RoleResponse},
        repo::Role,
    },
    state::AppState,
};

pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/roles", post(create_role).get(list_roles))
        .route(
            "/roles/:id",
            get(get_role).put(update_role).delete(delete_role),
        )
        .route("/roles/:id/permissions", post(link_permissions))
        .route(
            "/roles/:id/permissions/:permission_id",
            delete(unlink_permission),
        )
}

async fn to_response(db: &PgPool, role: Role) -> Result<RoleResponse, ApiError> {
    let permissions = Role::permissions_of(db, role.id)
        .await?
        .into_iter()
        .map(|(id, name)| PermissionResponse { id, name })
        .collect();
    Ok(RoleResponse {
        id: role.id,
        name: role.name,
        description: role.description,
        permissions,
    })
}

#[instrument(skip(state, payload))]
pub async fn create_role(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<RoleRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    authz::require(&state.db, actor, "ROLE_CREATE").await?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Role name must not be blank".into()));
    }

    // Every named permission must resolve or the whole call fails.
    let mut permission_ids = Vec::with_capacity(payload.permission_names.len());
    for name in &payload.permission_names {
        let permission = Permission::find_by_name(&state.db, name)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Permission not found: {name}")))?;
        permission_ids.push(permission.id);
    }

    let mut tx = state.db.begin().await?;
    let role = Role::insert(&mut tx, &payload.name, payload.description.as_deref()).await?;
    Role::add_permissions(&mut tx, role.id, &permission_ids).await?;
    tx.commit().await?;

    info!(role_id = %role.id, name = %role.name, "role created");
    Ok(Json(to_response(&state.db, role).await?))
}

#[instrument(skip(state))]
pub async fn get_role(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleResponse>, ApiError> {
    authz::require(&state.db, actor, "ROLE_VIEW").await?;

    let role = Role::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Role not found: {id}")))?;
    Ok(Json(to_response(&state.db, role).await?))
}

#[instrument(skip(state))]
pub async fn list_roles(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    authz::require(&state.db, actor, "ROLE_VIEW").await?;

    let roles = Role::list(&state.db).await?;
    let mut views = Vec::with_capacity(roles.len());
    for role in roles {
        views.push(to_response(&state.db, role).await?);
    }
    Ok(Json(views))
}

/// Renames a role; the attached permission set is left as-is.
#[instrument(skip(state, payload))]
pub async fn update_role(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RoleRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    authz::require(&state.db, actor, "ROLE_UPDATE").await?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Role name must not be blank".into()));
    }

    let role = Role::update(&state.db, id, &payload.name, payload.description.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Role not found: {id}")))?;

    info!(role_id = %role.id, "role updated");
    Ok(Json(to_response(&state.db, role).await?))
}

#[instrument(skip(state))]
pub async fn delete_role(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authz::require(&state.db, actor, "ROLE_DELETE").await?;

    let deleted = Role::delete(&state.db, id).await?;
    if deleted == 0 {
        warn!(role_id = %id, "role not found");
        return Err(ApiError::NotFound(format!("Role not found: {id}")));
    }

    info!(role_id = %id, "role deleted");
    Ok(Json(json!({
        "success": true,
        "message": "Role deleted successfully",
        "id": id,
    })))
}

/// Batch attach: all given permission ids must resolve, otherwise the whole
/// call fails and no links are written.
#[instrument(skip(state, payload))]
pub async fn link_permissions(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RolePermissionLinkRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    authz::require(&state.db, actor, "ROLE_UPDATE").await?;

    let role = Role::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Role not found: {id}")))?;

    let found = Permission::find_ids(&state.db, &payload.permission_ids).await?;
    let missing: Vec<Uuid> = payload
        .permission_ids
        .iter()
        .copied()
        .filter(|pid| !found.contains(pid))
        .collect();
    if !missing.is_empty() {
        warn!(role_id = %id, ?missing, "permissions not found");
        return Err(ApiError::NotFound(format!(
            "Some permissions not found: {missing:?}"
        )));
    }

    let mut tx = state.db.begin().await?;
    Role::add_permissions(&mut tx, role.id, &payload.permission_ids).await?;
    tx.commit().await?;

    info!(role_id = %role.id, count = payload.permission_ids.len(), "permissions linked");
    Ok(Json(to_response(&state.db, role).await?))
}

/// Single detach. Unlinked or unknown permission ids are tolerated as a
/// no-op, unlike the all-or-nothing attach path.
#[instrument(skip(state))]
pub async fn unlink_permission(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RoleResponse>, ApiError> {
    authz::require(&state.db, actor, "ROLE_UPDATE").await?;

    let role = Role::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Role not found: {id}")))?;

    let removed = Role::remove_permission(&state.db, role.id, permission_id).await?;
    if removed == 0 {
        info!(role_id = %role.id, permission_id = %permission_id, "permission was not linked");
    } else {
        info!(role_id = %role.id, permission_id = %permission_id, "permission unlinked");
    }

    Ok(Json(to_response(&state.db, role).await?))
}
