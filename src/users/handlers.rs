use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{authz, extractors::AuthUser, password::hash_password},
    error::ApiError,
    roles::repo::Role,
    state::AppState,
    users::{
        dto::{PermissionSummary, RoleSummary, UserRequest, UserResponse},
        repo::User,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/email/:email", get(get_user_by_email))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate(payload: &UserRequest) -> Result<(), ApiError> {
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if payload.full_name.trim().is_empty() {
        return Err(ApiError::Validation("Full name must not be blank".into()));
    }
    Ok(())
}

/// Every named role must resolve or the whole call fails.
async fn resolve_roles(db: &PgPool, names: &[String]) -> Result<Vec<Uuid>, ApiError> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let role = Role::find_by_name(db, name)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Role not found: {name}")))?;
        ids.push(role.id);
    }
    Ok(ids)
}

async fn to_response(db: &PgPool, user: User) -> Result<UserResponse, ApiError> {
    let roles = User::roles_of(db, user.id)
        .await?
        .into_iter()
        .map(|(id, name)| RoleSummary { id, name })
        .collect();
    let permissions = User::permissions_of(db, user.id)
        .await?
        .into_iter()
        .map(|(id, name)| PermissionSummary { id, name })
        .collect();

    Ok(UserResponse {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        enabled: user.enabled,
        roles,
        permissions,
        created_at: user.created_at,
    })
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(mut payload): Json<UserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    authz::require(&state.db, actor, "USER_CREATE").await?;

    payload.email = payload.email.trim().to_lowercase();
    validate(&payload)?;

    let role_ids = resolve_roles(&state.db, &payload.role_names).await?;
    let hash = hash_password(&payload.password)?;

    let mut tx = state.db.begin().await?;
    let user = User::insert(
        &mut tx,
        &payload.email,
        &hash,
        Some(payload.full_name.as_str()),
    )
    .await?;
    User::set_roles(&mut tx, user.id, &role_ids).await?;
    tx.commit().await?;

    info!(user_id = %user.id, email = %user.email, "user created");
    Ok(Json(to_response(&state.db, user).await?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    authz::require(&state.db, actor, "USER_VIEW").await?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User not found with id: {id}")))?;
    Ok(Json(to_response(&state.db, user).await?))
}

#[instrument(skip(state))]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    authz::require(&state.db, actor, "USER_VIEW").await?;

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User not found with email: {email}")))?;
    Ok(Json(to_response(&state.db, user).await?))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    authz::require(&state.db, actor, "USER_VIEW").await?;

    let users = User::list(&state.db).await?;
    let mut views = Vec::with_capacity(users.len());
    for user in users {
        views.push(to_response(&state.db, user).await?);
    }
    Ok(Json(views))
}

/// Full overwrite: email, password and full name are replaced, and the role
/// link set is rewritten to match `role_names` exactly.
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    authz::require(&state.db, actor, "USER_UPDATE").await?;

    payload.email = payload.email.trim().to_lowercase();
    validate(&payload)?;

    let role_ids = resolve_roles(&state.db, &payload.role_names).await?;
    let hash = hash_password(&payload.password)?;

    let mut tx = state.db.begin().await?;
    let user = User::update(
        &mut tx,
        id,
        &payload.email,
        &hash,
        Some(payload.full_name.as_str()),
    )
    .await?
        .ok_or_else(|| ApiError::NotFound(format!("User not found with id: {id}")))?;
    User::set_roles(&mut tx, user.id, &role_ids).await?;
    tx.commit().await?;

    info!(user_id = %user.id, "user updated");
    Ok(Json(to_response(&state.db, user).await?))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authz::require(&state.db, actor, "USER_DELETE").await?;

    let deleted = User::delete(&state.db, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("User not found with id: {id}")));
    }

    info!(user_id = %id, "user deleted");
    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
        "id": id,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str, full_name: &str) -> UserRequest {
        UserRequest {
            email: email.into(),
            password: password.into(),
            full_name: full_name.into(),
            role_names: vec![],
        }
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(validate(&request("ada@example.com", "longenough", "Ada Lovelace")).is_ok());
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["", "not-an-email", "a@b", "spaces in@mail.com"] {
            let err = validate(&request(email, "longenough", "Ada")).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "email {email:?}");
        }
    }

    #[test]
    fn rejects_short_password() {
        let err = validate(&request("ada@example.com", "short", "Ada")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn rejects_blank_full_name() {
        let err = validate(&request("ada@example.com", "longenough", "   ")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
