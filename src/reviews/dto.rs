use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Request body for creating or updating a review. On update only rating
/// and comment are applied; the movie and user references never change.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub movie_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub movie_id: Uuid,
    pub movie_title: String,
    pub user_id: Uuid,
    pub user_full_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
