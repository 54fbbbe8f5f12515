//! Leaderboard aggregation.
//!
//! Votes are grouped by game name in the order each name is first seen.
//! Scores of `0` mean "not rated" and never contribute. Averages are rounded
//! to one decimal, half away from zero, and the board is sorted by that
//! rounded average with a stable sort so ties keep first-seen order.

pub mod render;

use crate::models::{RankedGame, Vote};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("vote {index} has an invalid score: {score}")]
    InvalidScore { index: usize, score: f64 },
    #[error("vote {index} has no user")]
    MissingUser { index: usize },
    #[error("vote {index} has no game name")]
    MissingGameName { index: usize },
}

impl ValidationError {
    pub fn index(&self) -> usize {
        match self {
            ValidationError::InvalidScore { index, .. }
            | ValidationError::MissingUser { index }
            | ValidationError::MissingGameName { index } => *index,
        }
    }
}

struct GameTally<'a> {
    name: &'a str,
    total: f64,
    mean: f64,
    count: usize,
    voters: Vec<String>,
}

pub fn rank(votes: &[Vote]) -> Result<Vec<RankedGame>, ValidationError> {
    for (index, vote) in votes.iter().enumerate() {
        validate(index, vote)?;
    }

    let mut tallies: Vec<GameTally> = Vec::new();
    let mut by_name: HashMap<&str, usize> = HashMap::new();

    for vote in votes {
        if vote.score == 0.0 {
            continue;
        }
        let slot = *by_name.entry(vote.game_name.as_str()).or_insert_with(|| {
            tallies.push(GameTally {
                name: &vote.game_name,
                total: 0.0,
                mean: 0.0,
                count: 0,
                voters: Vec::new(),
            });
            tallies.len() - 1
        });
        let tally = &mut tallies[slot];
        tally.total += vote.score;
        tally.count += 1;
        tally.mean += (vote.score - tally.mean) / tally.count as f64;
        tally.voters.push(format!("{} ({})", vote.user, vote.score));
    }

    let mut ranked: Vec<RankedGame> = tallies
        .into_iter()
        .map(|tally| RankedGame {
            name: tally.name.to_string(),
            average: round_one_decimal(&tally),
            count: tally.count,
            voters: tally.voters,
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.average.total_cmp(&a.average));

    Ok(ranked)
}

fn validate(index: usize, vote: &Vote) -> Result<(), ValidationError> {
    if !vote.score.is_finite() || vote.score < 0.0 {
        return Err(ValidationError::InvalidScore {
            index,
            score: vote.score,
        });
    }
    if vote.user.trim().is_empty() {
        return Err(ValidationError::MissingUser { index });
    }
    if vote.game_name.trim().is_empty() {
        return Err(ValidationError::MissingGameName { index });
    }
    Ok(())
}

// Scale before dividing so integer totals land on exact halves. Totals too
// large for that use the running mean, which cannot overflow.
fn round_one_decimal(tally: &GameTally) -> f64 {
    let scaled = tally.total * 10.0 / tally.count as f64;
    if scaled.is_finite() {
        scaled.round() / 10.0
    } else {
        tally.mean
    }
}
