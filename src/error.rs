use thiserror::Error;

use crate::db::StoreError;
use crate::leaderboard::ValidationError;
use crate::models::ScoreScale;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("Score {score} is outside the {scale} scale")]
    InvalidScore { score: f64, scale: ScoreScale },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Could not rank votes: {0}")]
    Validation(#[from] ValidationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
