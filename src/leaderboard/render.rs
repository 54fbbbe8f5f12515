use crate::models::RankedGame;
use serde::Serialize;
use std::fmt;

pub const BOARD_HEADER: &str = "Game Rankings";
pub const EMPTY_BOARD: &str = "No scored games yet. Start rating games!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Gold,
    Silver,
    Bronze,
}

impl Tier {
    pub fn for_rank(rank: usize) -> Option<Tier> {
        match rank {
            1 => Some(Tier::Gold),
            2 => Some(Tier::Silver),
            3 => Some(Tier::Bronze),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Gold => f.write_str("gold"),
            Tier::Silver => f.write_str("silver"),
            Tier::Bronze => f.write_str("bronze"),
        }
    }
}

/// A ranked game with its display position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing<'a> {
    pub rank: usize,
    pub tier: Option<Tier>,
    #[serde(flatten)]
    pub game: &'a RankedGame,
}

pub fn standings(board: &[RankedGame]) -> Vec<Standing<'_>> {
    board
        .iter()
        .enumerate()
        .map(|(i, game)| Standing {
            rank: i + 1,
            tier: Tier::for_rank(i + 1),
            game,
        })
        .collect()
}

pub fn render_text(board: &[RankedGame]) -> String {
    let mut out = String::new();
    out.push_str(BOARD_HEADER);
    out.push('\n');

    if board.is_empty() {
        out.push_str(EMPTY_BOARD);
        out.push('\n');
        return out;
    }

    for standing in standings(board) {
        let votes = if standing.game.count == 1 { "vote" } else { "votes" };
        let line = match standing.tier {
            Some(tier) => format!(
                "{:>3}. {:<40} {:>4.1}  ({} {}) [{}]",
                standing.rank, standing.game.name, standing.game.average, standing.game.count, votes, tier
            ),
            None => format!(
                "{:>3}. {:<40} {:>4.1}  ({} {})",
                standing.rank, standing.game.name, standing.game.average, standing.game.count, votes
            ),
        };
        out.push_str(&line);
        out.push('\n');
    }

    out
}
