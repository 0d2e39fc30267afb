use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;

/// Flat permission-set membership check: the acting user's effective set is
/// the union of permissions across all of their roles. Exactly one required
/// permission name per protected operation, no hierarchy or wildcards.
pub async fn require(db: &PgPool, user_id: Uuid, permission: &str) -> Result<(), ApiError> {
    let row = sqlx::query_as::<_, (bool, bool)>(
        r#"
        SELECT u.enabled,
               EXISTS (
                   SELECT 1
                   FROM user_roles ur
                   JOIN role_permissions rp ON rp.role_id = ur.role_id
                   JOIN permissions p ON p.id = rp.permission_id
                   WHERE ur.user_id = u.id AND p.name = $2
               ) AS granted
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .bind(permission)
    .fetch_optional(db)
    .await?;

    match row {
        None => {
            warn!(user_id = %user_id, "token subject no longer exists");
            Err(ApiError::Unauthorized)
        }
        Some((false, _)) => {
            warn!(user_id = %user_id, "account disabled");
            Err(ApiError::Unauthorized)
        }
        Some((true, false)) => {
            // Client only sees the generic 403 body.
            warn!(user_id = %user_id, permission = %permission, "permission denied");
            Err(ApiError::Forbidden)
        }
        Some((true, true)) => Ok(()),
    }
}
