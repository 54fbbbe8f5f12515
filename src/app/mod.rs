use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::catalog::{self, GameFilter};
use crate::config::Config;
use crate::db::Database;
use crate::error::AppError;
use crate::leaderboard;
use crate::models::{Comment, Game, NewGame, RankedGame, ScoreRecord, ScoreScale, User};
use crate::sessions::{Session, Sessions};
use crate::sources::VoteSource;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

const LOGIN_DOMAIN: &str = "example.com";

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

pub struct App {
    db: Database,
    sessions: Sessions,
    scale: ScoreScale,
}

impl App {
    pub fn new(db: Database, sessions: Sessions, scale: ScoreScale) -> Self {
        Self { db, sessions, scale }
    }

    /// Connect to the configured database and seed the demo catalog if asked.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let db = Database::connect(config).await?;
        if config.seed_demo_games && db.count_games().await? == 0 {
            db.seed_games(&catalog::demo_games()).await?;
        }
        Ok(Self::new(db, Sessions::new(), config.score_scale))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    // Sessions

    pub async fn login(&self, username: &str) -> Result<LoginResponse, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::BadRequest("Username is required".to_string()));
        }

        let email = format!("{}@{}", username.to_lowercase(), LOGIN_DOMAIN);
        if !EMAIL.is_match(&email) {
            return Err(AppError::BadRequest(format!("Invalid username: {}", username)));
        }

        let user = self.db.find_or_create_user(&email).await?;
        let token = self.sessions.create(&user).await;
        info!("{} logged in", user.email);

        Ok(LoginResponse { token, user })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        if self.sessions.remove(token).await {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }

    pub async fn verify(&self, token: &str) -> Result<User, AppError> {
        let session = self.session(token).await?;
        Ok(self.db.get_user(&session.user_id).await?)
    }

    async fn session(&self, token: &str) -> Result<Session, AppError> {
        self.sessions.get(token).await.ok_or(AppError::Unauthorized)
    }

    // Games

    pub async fn games(&self, filter: &GameFilter) -> Result<Vec<Game>, AppError> {
        Ok(filter.apply(self.db.list_games().await?))
    }

    pub async fn packs(&self) -> Result<Vec<String>, AppError> {
        Ok(catalog::packs(&self.db.list_games().await?))
    }

    pub async fn add_game(&self, token: &str, game: NewGame) -> Result<Game, AppError> {
        self.session(token).await?;
        if game.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        Ok(self.db.create_game(&game).await?)
    }

    // Scores

    /// The caller's scores keyed by game id; a missing score reads as 0.
    pub async fn my_scores(&self, token: &str) -> Result<HashMap<String, f64>, AppError> {
        let session = self.session(token).await?;
        let scores = self
            .db
            .list_scores(Some(session.user_id.as_str()), None)
            .await?
            .into_iter()
            .map(|s| (s.game, s.score.unwrap_or(0.0)))
            .collect();
        Ok(scores)
    }

    pub async fn save_score(
        &self,
        token: &str,
        game_id: &str,
        score: f64,
    ) -> Result<ScoreRecord, AppError> {
        let session = self.session(token).await?;
        if game_id.trim().is_empty() {
            return Err(AppError::BadRequest("Game is required".to_string()));
        }
        if !self.scale.accepts(score) {
            warn!("Rejected score {} from {}", score, session.email);
            return Err(AppError::InvalidScore {
                score,
                scale: self.scale,
            });
        }

        let record = self.db.save_score(&session.user_id, game_id, score).await?;
        info!("{} scored {} as {}", session.email, game_id, score);
        Ok(record)
    }

    // Comments

    pub async fn comments(&self, game_id: Option<&str>) -> Result<Vec<Comment>, AppError> {
        Ok(self.db.list_comments(game_id).await?)
    }

    pub async fn add_comment(
        &self,
        token: &str,
        game_id: &str,
        text: &str,
    ) -> Result<Comment, AppError> {
        let session = self.session(token).await?;
        let text = text.trim();
        if game_id.trim().is_empty() || text.is_empty() {
            return Err(AppError::BadRequest(
                "Game and comment are required".to_string(),
            ));
        }
        Ok(self.db.create_comment(&session.user_id, game_id, text).await?)
    }

    pub async fn delete_comment(&self, token: &str, comment_id: &str) -> Result<(), AppError> {
        let session = self.session(token).await?;
        self.db.delete_comment(comment_id, &session.user_id).await?;
        info!("{} deleted comment {}", session.email, comment_id);
        Ok(())
    }

    // Leaderboard

    pub async fn leaderboard(&self) -> Result<Vec<RankedGame>, AppError> {
        ranked_from(&self.db).await
    }
}

/// Rank whatever votes `source` currently holds.
pub async fn ranked_from<S: VoteSource + ?Sized>(source: &S) -> Result<Vec<RankedGame>, AppError> {
    let votes = source.votes().await?;
    Ok(leaderboard::rank(&votes)?)
}
