use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Review record in the database. User and movie references are immutable
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: OffsetDateTime,
}

/// Review flattened with its movie title and author name for view mapping.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewDetailRow {
    pub id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub movie_id: Uuid,
    pub movie_title: String,
    pub user_id: Uuid,
    pub user_full_name: Option<String>,
    pub created_at: OffsetDateTime,
}

const DETAIL_SELECT: &str = r#"
    SELECT r.id, r.rating, r.comment,
           r.movie_id, m.title AS movie_title,
           r.user_id, u.full_name AS user_full_name,
           r.created_at
    FROM reviews r
    JOIN movies m ON m.id = r.movie_id
    JOIN users u ON u.id = r.user_id
"#;

impl Review {
    pub async fn insert(
        db: &PgPool,
        movie_id: Uuid,
        user_id: Uuid,
        rating: i32,
        comment: &str,
    ) -> anyhow::Result<Review> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (movie_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, movie_id, user_id, rating, comment, created_at
            "#,
        )
        .bind(movie_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(db)
        .await?;
        Ok(review)
    }

    pub async fn find_detail_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ReviewDetailRow>> {
        let row = sqlx::query_as::<_, ReviewDetailRow>(&format!("{DETAIL_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    pub async fn list_details(db: &PgPool) -> anyhow::Result<Vec<ReviewDetailRow>> {
        let rows =
            sqlx::query_as::<_, ReviewDetailRow>(&format!("{DETAIL_SELECT} ORDER BY r.created_at"))
                .fetch_all(db)
                .await?;
        Ok(rows)
    }

    pub async fn details_by_movie(
        db: &PgPool,
        movie_id: Uuid,
    ) -> anyhow::Result<Vec<ReviewDetailRow>> {
        let rows = sqlx::query_as::<_, ReviewDetailRow>(&format!(
            "{DETAIL_SELECT} WHERE r.movie_id = $1 ORDER BY r.created_at"
        ))
        .bind(movie_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn details_by_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<ReviewDetailRow>> {
        let rows = sqlx::query_as::<_, ReviewDetailRow>(&format!(
            "{DETAIL_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Overwrites rating and comment only.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        rating: i32,
        comment: &str,
    ) -> anyhow::Result<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET rating = $2, comment = $3
            WHERE id = $1
            RETURNING id, movie_id, user_id, rating, comment, created_at
            "#,
        )
        .bind(id)
        .bind(rating)
        .bind(comment)
        .fetch_optional(db)
        .await?;
        Ok(review)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
