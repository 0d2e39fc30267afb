use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Permission record: a named capability checked for set membership.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
}

impl Permission {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Permission>> {
        let permission =
            sqlx::query_as::<_, Permission>("SELECT id, name FROM permissions WHERE id = $1")
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(permission)
    }

    pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<Permission>> {
        let permission =
            sqlx::query_as::<_, Permission>("SELECT id, name FROM permissions WHERE name = $1")
                .bind(name)
                .fetch_optional(db)
                .await?;
        Ok(permission)
    }

    /// Returns the subset of `ids` that exist.
    pub async fn find_ids(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Uuid>> {
        let rows =
            sqlx::query_as::<_, (Uuid,)>("SELECT id FROM permissions WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(db)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Permission>> {
        let permissions =
            sqlx::query_as::<_, Permission>("SELECT id, name FROM permissions ORDER BY name")
                .fetch_all(db)
                .await?;
        Ok(permissions)
    }

    pub async fn insert(db: &PgPool, name: &str) -> anyhow::Result<Permission> {
        let permission = sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(db)
        .await?;
        Ok(permission)
    }

    pub async fn update(db: &PgPool, id: Uuid, name: &str) -> anyhow::Result<Option<Permission>> {
        let permission = sqlx::query_as::<_, Permission>(
            "UPDATE permissions SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(db)
        .await?;
        Ok(permission)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
