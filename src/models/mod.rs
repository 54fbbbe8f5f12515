use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub pack: Option<String>,
    pub img: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

// Catalog entry before it has an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGame {
    pub name: String,
    pub pack: Option<String>,
    pub img: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: String,
    pub user: String,
    pub game: String,
    pub score: Option<f64>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub comment: String,
    pub user: String,
    pub game: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub author: User,
}

impl Comment {
    /// Name shown next to a comment: the email's local part, or "Anonymous".
    pub fn display_author(&self) -> &str {
        match self.author.email.split_once('@') {
            Some((local, _)) if !local.is_empty() => local,
            _ => "Anonymous",
        }
    }
}

/// One user's rating of one game, as consumed by the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user: String,
    pub game_name: String,
    pub score: f64,
}

impl Vote {
    pub fn new(user: impl Into<String>, game_name: impl Into<String>, score: f64) -> Self {
        Self {
            user: user.into(),
            game_name: game_name.into(),
            score,
        }
    }
}

/// Aggregated leaderboard entry for one game name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGame {
    pub name: String,
    pub average: f64,
    pub count: usize,
    pub voters: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreScale {
    /// 1-5 stars, 0 meaning unscored
    Stars,
    /// 0-10 in any increment
    Decimal,
}

impl ScoreScale {
    pub fn max(self) -> f64 {
        match self {
            ScoreScale::Stars => 5.0,
            ScoreScale::Decimal => 10.0,
        }
    }

    pub fn accepts(self, score: f64) -> bool {
        if !score.is_finite() || score < 0.0 || score > self.max() {
            return false;
        }
        match self {
            ScoreScale::Stars => score.fract() == 0.0,
            ScoreScale::Decimal => true,
        }
    }
}

impl fmt::Display for ScoreScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreScale::Stars => f.write_str("stars"),
            ScoreScale::Decimal => f.write_str("decimal"),
        }
    }
}

impl FromStr for ScoreScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stars" | "star" => Ok(ScoreScale::Stars),
            "decimal" => Ok(ScoreScale::Decimal),
            other => Err(format!("Unknown score scale: {}", other)),
        }
    }
}

/// Record ids are 15 lowercase hex characters.
pub fn new_record_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(15);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_are_short_hex() {
        let id = new_record_id();
        assert_eq!(id.len(), 15);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(id, new_record_id());
    }

    #[test]
    fn star_scale_rejects_fractions_and_overflow() {
        assert!(ScoreScale::Stars.accepts(0.0));
        assert!(ScoreScale::Stars.accepts(5.0));
        assert!(!ScoreScale::Stars.accepts(3.5));
        assert!(!ScoreScale::Stars.accepts(6.0));
        assert!(!ScoreScale::Stars.accepts(-1.0));
    }

    #[test]
    fn decimal_scale_allows_increments() {
        assert!(ScoreScale::Decimal.accepts(7.5));
        assert!(ScoreScale::Decimal.accepts(10.0));
        assert!(!ScoreScale::Decimal.accepts(10.5));
        assert!(!ScoreScale::Decimal.accepts(f64::NAN));
    }

    #[test]
    fn scale_parses_from_config_strings() {
        assert_eq!("stars".parse::<ScoreScale>(), Ok(ScoreScale::Stars));
        assert_eq!(" Decimal ".parse::<ScoreScale>(), Ok(ScoreScale::Decimal));
        assert!("hundred".parse::<ScoreScale>().is_err());
    }

    #[test]
    fn vote_uses_camel_case_on_the_wire() {
        let vote: Vote =
            serde_json::from_str(r#"{"user":"a","gameName":"Quiplash","score":8}"#).unwrap();
        assert_eq!(vote, Vote::new("a", "Quiplash", 8.0));
    }

    #[test]
    fn comment_author_falls_back_to_anonymous() {
        let now = Utc::now();
        let mut comment = Comment {
            id: "c".into(),
            comment: "fun".into(),
            user: "u".into(),
            game: "g".into(),
            created: now,
            updated: now,
            author: User {
                id: "u".into(),
                email: "alice@example.com".into(),
                name: Some("alice".into()),
            },
        };
        assert_eq!(comment.display_author(), "alice");
        comment.author.email = String::new();
        assert_eq!(comment.display_author(), "Anonymous");
    }
}
