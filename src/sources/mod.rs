//! Where leaderboard votes come from.
//!
//! The online variant reads the scores table; the offline variant reads a
//! snapshot of per-user score maps kept on the client. Both hand the same
//! `Vote` list to the aggregator.

use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::db::Database;
use crate::error::AppError;
use crate::models::{Game, Vote};

#[async_trait]
pub trait VoteSource: Send + Sync {
    async fn votes(&self) -> Result<Vec<Vote>, AppError>;
}

#[async_trait]
impl VoteSource for Database {
    async fn votes(&self) -> Result<Vec<Vote>, AppError> {
        Ok(self.all_votes().await?)
    }
}

/// Scores saved locally, keyed by user then game id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct LocalScores(pub BTreeMap<String, BTreeMap<String, f64>>);

pub struct LocalVotes {
    scores: LocalScores,
    game_names: HashMap<String, String>,
}

impl LocalVotes {
    pub fn new(scores: LocalScores, games: &[Game]) -> Self {
        let game_names = games
            .iter()
            .map(|g| (g.id.clone(), g.name.clone()))
            .collect();
        Self { scores, game_names }
    }

    pub fn from_json(json: &str, games: &[Game]) -> Result<Self, AppError> {
        let scores: LocalScores = serde_json::from_str(json)?;
        Ok(Self::new(scores, games))
    }
}

#[async_trait]
impl VoteSource for LocalVotes {
    async fn votes(&self) -> Result<Vec<Vote>, AppError> {
        let mut votes = Vec::new();
        for (user, scores) in &self.scores.0 {
            for (game_id, score) in scores {
                match self.game_names.get(game_id) {
                    Some(name) => votes.push(Vote::new(user.as_str(), name.as_str(), *score)),
                    None => warn!("Skipping local score for unknown game {}", game_id),
                }
            }
        }
        Ok(votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::rank;
    use chrono::Utc;

    fn game(id: &str, name: &str) -> Game {
        Game {
            id: id.to_string(),
            name: name.to_string(),
            pack: None,
            img: None,
            created: Utc::now(),
            updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn local_snapshot_becomes_votes() {
        let games = vec![game("g1", "Quiplash"), game("g2", "Drawful")];
        let source = LocalVotes::from_json(
            r#"{"bob": {"g1": 4, "g2": 0}, "alice": {"g1": 5, "gone": 3}}"#,
            &games,
        )
        .unwrap();

        let votes = source.votes().await.unwrap();
        assert_eq!(
            votes,
            vec![
                Vote::new("alice", "Quiplash", 5.0),
                Vote::new("bob", "Quiplash", 4.0),
                Vote::new("bob", "Drawful", 0.0),
            ]
        );

        let board = rank(&votes).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].average, 4.5);
    }

    #[test]
    fn non_numeric_scores_do_not_decode() {
        let err = LocalVotes::from_json(r#"{"bob": {"g1": "five"}}"#, &[]);
        assert!(matches!(err, Err(AppError::Json(_))));
    }
}
