use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

/// Movie record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub year: i32,
    pub created_at: OffsetDateTime,
}

/// Image owned by a movie; rows go away with their movie.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MovieImage {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub name: Option<String>,
    pub image_url: String,
    pub created_at: OffsetDateTime,
}

/// Image payload for composite movie writes.
#[derive(Debug, Clone)]
pub struct NewMovieImage {
    pub name: Option<String>,
    pub image_url: String,
}

/// Review row flattened with its author, for embedding in movie views.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewSummaryRow {
    pub id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub user_id: Uuid,
    pub user_full_name: Option<String>,
}

impl Movie {
    pub async fn insert(
        db: &PgPool,
        title: &str,
        description: Option<&str>,
        director: Option<&str>,
        genre: Option<&str>,
        year: i32,
    ) -> anyhow::Result<Movie> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"
            INSERT INTO movies (title, description, director, genre, year)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, director, genre, year, created_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(director)
        .bind(genre)
        .bind(year)
        .fetch_one(db)
        .await?;
        Ok(movie)
    }

    /// Writes a movie together with its image list; all-or-nothing within
    /// the caller's transaction.
    pub async fn insert_with_images(
        tx: &mut Transaction<'_, Postgres>,
        title: &str,
        description: Option<&str>,
        director: Option<&str>,
        genre: Option<&str>,
        year: i32,
        images: &[NewMovieImage],
    ) -> anyhow::Result<Movie> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"
            INSERT INTO movies (title, description, director, genre, year)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, director, genre, year, created_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(director)
        .bind(genre)
        .bind(year)
        .fetch_one(&mut **tx)
        .await?;

        for image in images {
            sqlx::query(
                r#"
                INSERT INTO movie_images (movie_id, name, image_url)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(movie.id)
            .bind(image.name.as_deref())
            .bind(&image.image_url)
            .execute(&mut **tx)
            .await?;
        }

        Ok(movie)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, description, director, genre, year, created_at
            FROM movies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(movie)
    }

    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, description, director, genre, year, created_at
            FROM movies
            ORDER BY created_at
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(movies)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies")
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: &str,
        description: Option<&str>,
        director: Option<&str>,
        genre: Option<&str>,
        year: i32,
    ) -> anyhow::Result<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"
            UPDATE movies
            SET title = $2, description = $3, director = $4, genre = $5, year = $6
            WHERE id = $1
            RETURNING id, title, description, director, genre, year, created_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(director)
        .bind(genre)
        .bind(year)
        .fetch_optional(db)
        .await?;
        Ok(movie)
    }

    /// Images and reviews go with it, enforced by the schema.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn images_of(db: &PgPool, movie_id: Uuid) -> anyhow::Result<Vec<MovieImage>> {
        let images = sqlx::query_as::<_, MovieImage>(
            r#"
            SELECT id, movie_id, name, image_url, created_at
            FROM movie_images
            WHERE movie_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(movie_id)
        .fetch_all(db)
        .await?;
        Ok(images)
    }

    pub async fn review_summaries_of(
        db: &PgPool,
        movie_id: Uuid,
    ) -> anyhow::Result<Vec<ReviewSummaryRow>> {
        let rows = sqlx::query_as::<_, ReviewSummaryRow>(
            r#"
            SELECT r.id, r.rating, r.comment, r.user_id, u.full_name AS user_full_name
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.movie_id = $1
            ORDER BY r.created_at
            "#,
        )
        .bind(movie_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
