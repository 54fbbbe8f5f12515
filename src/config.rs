use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::{info, warn};

use crate::models::ScoreScale;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
    pub score_scale: ScoreScale,
    pub seed_demo_games: bool,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: try_load("DATABASE_URL", "sqlite:data/party_rank.db"),
            max_connections: try_load("DB_MAX_CONNECTIONS", "5"),
            busy_timeout: Duration::from_millis(try_load("DB_BUSY_TIMEOUT_MS", "5000")),
            score_scale: try_load("SCORE_SCALE", "stars"),
            seed_demo_games: try_load("SEED_DEMO_GAMES", "true"),
        }
    }

    /// Settings for a database file at `database_url`, everything else default.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
            busy_timeout: Duration::from_millis(5000),
            score_scale: ScoreScale::Stars,
            seed_demo_games: false,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse_or_default(key, &raw, default)
}

fn parse_or_default<T: FromStr>(key: &str, raw: &str, default: &str) -> T
where
    T::Err: Display,
{
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            match default.parse() {
                Ok(value) => value,
                Err(e) => panic!("default for {key} does not parse: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_values_fall_back_to_default() {
        let pool: u32 = parse_or_default("DB_MAX_CONNECTIONS", "lots", "5");
        assert_eq!(pool, 5);
        let scale: ScoreScale = parse_or_default("SCORE_SCALE", "percent", "stars");
        assert_eq!(scale, ScoreScale::Stars);
    }

    #[test]
    fn good_values_are_kept() {
        let seed: bool = parse_or_default("SEED_DEMO_GAMES", "false", "true");
        assert!(!seed);
        let scale: ScoreScale = parse_or_default("SCORE_SCALE", "decimal", "stars");
        assert_eq!(scale, ScoreScale::Decimal);
    }
}
