use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::Config;
use crate::models::{new_record_id, Comment, Game, NewGame, ScoreRecord, User, Vote};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("not allowed to modify this record")]
    Forbidden,
    #[error("failed to parse timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        name TEXT,
        created TEXT NOT NULL,
        updated TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS games (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        pack TEXT,
        img TEXT,
        created TEXT NOT NULL,
        updated TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS scores (
        id TEXT PRIMARY KEY,
        user TEXT NOT NULL,
        game TEXT NOT NULL,
        score REAL,
        created TEXT NOT NULL,
        updated TEXT NOT NULL,
        FOREIGN KEY (user) REFERENCES users(id),
        FOREIGN KEY (game) REFERENCES games(id),
        UNIQUE(user, game)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id TEXT PRIMARY KEY,
        comment TEXT NOT NULL,
        user TEXT NOT NULL,
        game TEXT NOT NULL,
        created TEXT NOT NULL,
        updated TEXT NOT NULL,
        FOREIGN KEY (user) REFERENCES users(id),
        FOREIGN KEY (game) REFERENCES games(id)
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_scores_user ON scores(user);",
    "CREATE INDEX IF NOT EXISTS idx_scores_game ON scores(game);",
    "CREATE INDEX IF NOT EXISTS idx_comments_game ON comments(game);",
    "CREATE INDEX IF NOT EXISTS idx_comments_user ON comments(user);",
];

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        ensure_parent_dir(&config.database_url)?;

        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::init_schema(&pool).await?;
        info!("Connected to {}", config.database_url);

        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        debug!("Schema ready ({} statements)", SCHEMA.len());
        Ok(())
    }

    pub async fn journal_mode(&self) -> Result<String, StoreError> {
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&self.pool)
            .await?;
        Ok(mode.to_lowercase())
    }

    /// Busy timeout of a pooled connection, in milliseconds.
    pub async fn busy_timeout(&self) -> Result<i64, StoreError> {
        let timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&self.pool)
            .await?;
        Ok(timeout)
    }

    // Users

    /// Look a user up by email, creating it on first login.
    pub async fn find_or_create_user(&self, email: &str) -> Result<User, StoreError> {
        let now = timestamp(Utc::now());
        let name = email.split('@').next().unwrap_or(email);

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, created, updated)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(email) DO NOTHING
            "#,
        )
        .bind(new_record_id())
        .bind(email)
        .bind(name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            info!("Created user for {}", email);
        }

        let row = sqlx::query("SELECT id, email, name FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(user_from_row(&row))
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, StoreError> {
        sqlx::query("SELECT id, email, name FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| user_from_row(&row))
            .ok_or_else(|| StoreError::NotFound("User".to_string()))
    }

    // Games

    pub async fn list_games(&self) -> Result<Vec<Game>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, name, pack, img, created, updated
            FROM games
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(game_from_row)
        .collect()
    }

    pub async fn count_games(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn create_game(&self, game: &NewGame) -> Result<Game, StoreError> {
        let id = new_record_id();
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO games (id, name, pack, img, created, updated)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&game.name)
        .bind(&game.pack)
        .bind(&game.img)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_game(&id).await
    }

    pub async fn get_game(&self, game_id: &str) -> Result<Game, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, pack, img, created, updated
            FROM games
            WHERE id = ?
            "#,
        )
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("Game".to_string()))?;
        game_from_row(&row)
    }

    /// Insert a batch of games in one transaction.
    pub async fn seed_games(&self, games: &[NewGame]) -> Result<usize, StoreError> {
        let now = timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;

        for game in games {
            sqlx::query(
                r#"
                INSERT INTO games (id, name, pack, img, created, updated)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(new_record_id())
            .bind(&game.name)
            .bind(&game.pack)
            .bind(&game.img)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Seeded {} games", games.len());
        Ok(games.len())
    }

    // Scores

    pub async fn list_scores(
        &self,
        user_id: Option<&str>,
        game_id: Option<&str>,
    ) -> Result<Vec<ScoreRecord>, StoreError> {
        sqlx::query(
            r#"
            SELECT id, user, game, score, created, updated
            FROM scores
            WHERE (?1 IS NULL OR user = ?1) AND (?2 IS NULL OR game = ?2)
            ORDER BY rowid
            "#,
        )
        .bind(user_id)
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(score_from_row)
        .collect()
    }

    /// Save a score, replacing the user's existing score for the game.
    pub async fn save_score(
        &self,
        user_id: &str,
        game_id: &str,
        score: f64,
    ) -> Result<ScoreRecord, StoreError> {
        self.get_game(game_id).await?;
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO scores (id, user, game, score, created, updated)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user, game)
            DO UPDATE SET score = excluded.score, updated = excluded.updated
            "#,
        )
        .bind(new_record_id())
        .bind(user_id)
        .bind(game_id)
        .bind(score)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            r#"
            SELECT id, user, game, score, created, updated
            FROM scores
            WHERE user = ? AND game = ?
            "#,
        )
        .bind(user_id)
        .bind(game_id)
        .fetch_one(&self.pool)
        .await?;
        score_from_row(&row)
    }

    /// Every score joined with its game name, in insertion order.
    pub async fn all_votes(&self) -> Result<Vec<Vote>, StoreError> {
        let votes = sqlx::query(
            r#"
            SELECT s.user AS user, g.name AS game_name, s.score AS score
            FROM scores s
            JOIN games g ON g.id = s.game
            ORDER BY s.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| Vote {
            user: row.get::<String, _>("user").chars().take(8).collect(),
            game_name: row.get("game_name"),
            score: row.get::<Option<f64>, _>("score").unwrap_or(0.0),
        })
        .collect();

        Ok(votes)
    }

    // Comments

    pub async fn list_comments(&self, game_id: Option<&str>) -> Result<Vec<Comment>, StoreError> {
        sqlx::query(
            r#"
            SELECT c.id, c.comment, c.user, c.game, c.created, c.updated,
                   u.name AS user_name, u.email AS user_email
            FROM comments c
            JOIN users u ON c.user = u.id
            WHERE (?1 IS NULL OR c.game = ?1)
            ORDER BY c.created DESC, c.rowid DESC
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(comment_from_row)
        .collect()
    }

    pub async fn create_comment(
        &self,
        user_id: &str,
        game_id: &str,
        text: &str,
    ) -> Result<Comment, StoreError> {
        self.get_game(game_id).await?;
        let id = new_record_id();
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO comments (id, comment, user, game, created, updated)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(text)
        .bind(user_id)
        .bind(game_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            r#"
            SELECT c.id, c.comment, c.user, c.game, c.created, c.updated,
                   u.name AS user_name, u.email AS user_email
            FROM comments c
            JOIN users u ON c.user = u.id
            WHERE c.id = ?
            "#,
        )
        .bind(&id)
        .fetch_one(&self.pool)
        .await?;
        comment_from_row(&row)
    }

    /// Delete a comment owned by `user_id`.
    pub async fn delete_comment(&self, comment_id: &str, user_id: &str) -> Result<(), StoreError> {
        let owner: Option<String> = sqlx::query_scalar("SELECT user FROM comments WHERE id = ?")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;

        match owner {
            None => Err(StoreError::NotFound("Comment".to_string())),
            Some(owner) if owner != user_id => Err(StoreError::Forbidden),
            Some(_) => {
                sqlx::query("DELETE FROM comments WHERE id = ?")
                    .bind(comment_id)
                    .execute(&self.pool)
                    .await?;
                Ok(())
            }
        }
    }
}

// Fixed-width timestamps so TEXT ordering matches time ordering.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidTimestamp(format!("{}: {}", raw, e)))
}

fn ensure_parent_dir(database_url: &str) -> Result<(), StoreError> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
    }
}

fn game_from_row(row: &SqliteRow) -> Result<Game, StoreError> {
    Ok(Game {
        id: row.get("id"),
        name: row.get("name"),
        pack: row.get("pack"),
        img: row.get("img"),
        created: parse_timestamp(&row.get::<String, _>("created"))?,
        updated: parse_timestamp(&row.get::<String, _>("updated"))?,
    })
}

fn score_from_row(row: &SqliteRow) -> Result<ScoreRecord, StoreError> {
    Ok(ScoreRecord {
        id: row.get("id"),
        user: row.get("user"),
        game: row.get("game"),
        score: row.get("score"),
        created: parse_timestamp(&row.get::<String, _>("created"))?,
        updated: parse_timestamp(&row.get::<String, _>("updated"))?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment, StoreError> {
    let user: String = row.get("user");
    Ok(Comment {
        id: row.get("id"),
        comment: row.get("comment"),
        game: row.get("game"),
        created: parse_timestamp(&row.get::<String, _>("created"))?,
        updated: parse_timestamp(&row.get::<String, _>("updated"))?,
        author: User {
            id: user.clone(),
            email: row.get("user_email"),
            name: row.get("user_name"),
        },
        user,
    })
}
