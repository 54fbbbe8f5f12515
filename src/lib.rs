pub mod app;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod leaderboard;
pub mod models;
pub mod sessions;
pub mod sources;

pub use app::App;
pub use config::Config;
pub use error::AppError;
pub use leaderboard::{rank, ValidationError};
pub use models::{RankedGame, Vote};
