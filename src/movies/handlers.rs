use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{authz, extractors::AuthUser},
    error::ApiError,
    movies::{
        dto::{MovieImageResponse, MovieRequest, MovieResponse, ReviewSummaryResponse},
        repo::Movie,
    },
    state::AppState,
};

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", post(create_movie).get(list_movies))
        .route(
            "/movies/:id",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
}

fn validate(payload: &MovieRequest) -> Result<(), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::Validation("Title must not be blank".into()));
    }
    Ok(())
}

async fn to_response(db: &PgPool, movie: Movie) -> Result<MovieResponse, ApiError> {
    let images = Movie::images_of(db, movie.id)
        .await?
        .into_iter()
        .map(|img| MovieImageResponse {
            id: img.id,
            name: img.name,
            image_url: img.image_url,
        })
        .collect();

    let reviews = Movie::review_summaries_of(db, movie.id)
        .await?
        .into_iter()
        .map(|r| ReviewSummaryResponse {
            id: r.id,
            rating: r.rating,
            comment: r.comment,
            user_id: r.user_id,
            user_full_name: r.user_full_name,
        })
        .collect();

    Ok(MovieResponse {
        id: movie.id,
        title: movie.title,
        description: movie.description,
        director: movie.director,
        genre: movie.genre,
        year: movie.year,
        images,
        reviews,
        created_at: movie.created_at,
    })
}

#[instrument(skip(state, payload))]
pub async fn create_movie(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<MovieRequest>,
) -> Result<Json<MovieResponse>, ApiError> {
    authz::require(&state.db, actor, "MOVIE_CREATE").await?;
    validate(&payload)?;

    let movie = Movie::insert(
        &state.db,
        &payload.title,
        payload.description.as_deref(),
        payload.director.as_deref(),
        payload.genre.as_deref(),
        payload.year,
    )
    .await?;

    info!(movie_id = %movie.id, title = %movie.title, "movie created");
    Ok(Json(to_response(&state.db, movie).await?))
}

#[instrument(skip(state))]
pub async fn get_movie(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MovieResponse>, ApiError> {
    authz::require(&state.db, actor, "MOVIE_VIEW").await?;

    let movie = Movie::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Movie not found: {id}")))?;
    Ok(Json(to_response(&state.db, movie).await?))
}

#[instrument(skip(state))]
pub async fn list_movies(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<MovieResponse>>, ApiError> {
    authz::require(&state.db, actor, "MOVIE_VIEW").await?;

    let movies = Movie::list(&state.db).await?;
    let mut views = Vec::with_capacity(movies.len());
    for movie in movies {
        views.push(to_response(&state.db, movie).await?);
    }
    Ok(Json(views))
}

#[instrument(skip(state, payload))]
pub async fn update_movie(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MovieRequest>,
) -> Result<Json<MovieResponse>, ApiError> {
    authz::require(&state.db, actor, "MOVIE_UPDATE").await?;
    validate(&payload)?;

    let movie = Movie::update(
        &state.db,
        id,
        &payload.title,
        payload.description.as_deref(),
        payload.director.as_deref(),
        payload.genre.as_deref(),
        payload.year,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Movie not found: {id}")))?;

    info!(movie_id = %movie.id, "movie updated");
    Ok(Json(to_response(&state.db, movie).await?))
}

#[instrument(skip(state))]
pub async fn delete_movie(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authz::require(&state.db, actor, "MOVIE_DELETE").await?;

    let deleted = Movie::delete(&state.db, id).await?;
    if deleted == 0 {
        warn!(movie_id = %id, "movie not found");
        return Err(ApiError::NotFound(format!("Movie not found: {id}")));
    }

    info!(movie_id = %id, "movie deleted");
    Ok(Json(json!({
        "success": true,
        "message": "Movie deleted successfully",
        "id": id,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_title() {
        let payload = MovieRequest {
            title: "   ".into(),
            description: None,
            director: None,
            genre: None,
            year: 2010,
        };
        let err = validate(&payload).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn accepts_minimal_movie() {
        let payload = MovieRequest {
            title: "Inception".into(),
            description: None,
            director: None,
            genre: None,
            year: 2010,
        };
        assert!(validate(&payload).is_ok());
    }
}
