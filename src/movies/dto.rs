use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Request body for creating or fully overwriting a movie.
#[derive(Debug, Deserialize)]
pub struct MovieRequest {
    pub title: String,
    pub description: Option<String>,
    pub director: Option<String>,
    /// Free text, comma-joined genres.
    pub genre: Option<String>,
    pub year: i32,
}

#[derive(Debug, Serialize)]
pub struct MovieImageResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub image_url: String,
}

/// Review summary embedded in a movie view; no movie back-reference.
#[derive(Debug, Serialize)]
pub struct ReviewSummaryResponse {
    pub id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub user_id: Uuid,
    pub user_full_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub year: i32,
    pub images: Vec<MovieImageResponse>,
    pub reviews: Vec<ReviewSummaryResponse>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
