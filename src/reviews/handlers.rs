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
    movies::repo::Movie,
    reviews::{
        dto::{ReviewRequest, ReviewResponse},
        repo::{Review, ReviewDetailRow},
    },
    state::AppState,
    users::repo::User,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(create_review).get(list_reviews))
        .route(
            "/reviews/:id",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route("/reviews/movie/:movie_id", get(get_reviews_by_movie))
        .route("/reviews/user/:user_id", get(get_reviews_by_user))
}

fn validate(payload: &ReviewRequest) -> Result<(), ApiError> {
    if !(1..=10).contains(&payload.rating) {
        return Err(ApiError::Validation(
            "Rating must be between 1 and 10".into(),
        ));
    }
    if payload.comment.trim().is_empty() {
        return Err(ApiError::Validation("Comment must not be blank".into()));
    }
    Ok(())
}

fn to_response(row: ReviewDetailRow) -> ReviewResponse {
    ReviewResponse {
        id: row.id,
        rating: row.rating,
        comment: row.comment,
        movie_id: row.movie_id,
        movie_title: row.movie_title,
        user_id: row.user_id,
        user_full_name: row.user_full_name,
        created_at: row.created_at,
    }
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    authz::require(&state.db, actor, "REVIEW_CREATE").await?;
    validate(&payload)?;

    let user = User::find_by_id(&state.db, payload.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", payload.user_id)))?;
    let movie = Movie::find_by_id(&state.db, payload.movie_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Movie not found: {}", payload.movie_id)))?;

    let review = Review::insert(
        &state.db,
        movie.id,
        user.id,
        payload.rating,
        &payload.comment,
    )
    .await?;

    info!(review_id = %review.id, movie_id = %movie.id, user_id = %user.id, "review created");
    Ok(Json(to_response(ReviewDetailRow {
        id: review.id,
        rating: review.rating,
        comment: review.comment,
        movie_id: movie.id,
        movie_title: movie.title,
        user_id: user.id,
        user_full_name: user.full_name,
        created_at: review.created_at,
    })))
}

#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let row = Review::find_detail_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Review not found: {id}")))?;
    Ok(Json(to_response(row)))
}

#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let rows = Review::list_details(&state.db).await?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

#[instrument(skip(state))]
pub async fn get_reviews_by_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<Uuid>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let rows = Review::details_by_movie(&state.db, movie_id).await?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

#[instrument(skip(state))]
pub async fn get_reviews_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let rows = Review::details_by_user(&state.db, user_id).await?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

#[instrument(skip(state, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    authz::require(&state.db, actor, "REVIEW_UPDATE").await?;
    validate(&payload)?;

    let review = Review::update(&state.db, id, payload.rating, &payload.comment)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Review not found: {id}")))?;

    let row = Review::find_detail_by_id(&state.db, review.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Review not found: {id}")))?;

    info!(review_id = %id, "review updated");
    Ok(Json(to_response(row)))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authz::require(&state.db, actor, "REVIEW_DELETE").await?;

    let deleted = Review::delete(&state.db, id).await?;
    if deleted == 0 {
        warn!(review_id = %id, "review not found");
        return Err(ApiError::NotFound(format!("Review not found: {id}")));
    }

    info!(review_id = %id, "review deleted");
    Ok(Json(json!({
        "success": true,
        "message": "Review deleted successfully",
        "id": id,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rating: i32, comment: &str) -> ReviewRequest {
        ReviewRequest {
            movie_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rating,
            comment: comment.into(),
        }
    }

    #[test]
    fn accepts_ratings_at_bounds() {
        assert!(validate(&request(1, "fine")).is_ok());
        assert!(validate(&request(10, "great")).is_ok());
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        for rating in [0, 11, -3] {
            let err = validate(&request(rating, "x")).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "rating {rating}");
        }
    }

    #[test]
    fn rejects_blank_comment() {
        let err = validate(&request(5, "  ")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
