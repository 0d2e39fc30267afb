use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Role record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl Role {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Role>> {
        let role =
            sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE id = $1")
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(role)
    }

    pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<Role>> {
        let role =
            sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE name = $1")
                .bind(name)
                .fetch_optional(db)
                .await?;
        Ok(role)
    }

    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Role>> {
        let roles =
            sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles ORDER BY name")
                .fetch_all(db)
                .await?;
        Ok(roles)
    }

    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        description: Option<&str>,
    ) -> anyhow::Result<Role> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&mut **tx)
        .await?;
        Ok(role)
    }

    /// Updates name and description; the permission set is untouched.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> anyhow::Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = $2, description = $3
            WHERE id = $1
            RETURNING id, name, description
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(db)
        .await?;
        Ok(role)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn permissions_of(db: &PgPool, role_id: Uuid) -> anyhow::Result<Vec<(Uuid, String)>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT p.id, p.name
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Incremental attach; already-linked permissions are left in place.
    pub async fn add_permissions(
        tx: &mut Transaction<'_, Postgres>,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> anyhow::Result<()> {
        for permission_id in permission_ids {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Detach is tolerant: removing an unlinked permission is a no-op.
    pub async fn remove_permission(
        db: &PgPool,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> anyhow::Result<u64> {
        let result =
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
                .bind(role_id)
                .bind(permission_id)
                .execute(db)
                .await?;
        Ok(result.rows_affected())
    }

    /// Converges the link set to exactly `permission_ids`.
    pub async fn set_permissions(
        tx: &mut Transaction<'_, Postgres>,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id != ALL($2)")
            .bind(role_id)
            .bind(permission_ids)
            .execute(&mut **tx)
            .await?;
        Self::add_permissions(tx, role_id, permission_ids).await?;
        Ok(())
    }
}
