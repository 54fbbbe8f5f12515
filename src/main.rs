use log::{error, info};
use party_rank::catalog::GameFilter;
use party_rank::leaderboard::render;
use party_rank::{App, AppError, Config};
use std::env;
use std::process::ExitCode;

const USAGE: &str = "usage: party-rank [leaderboard|json|games|check-db]";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let command = env::args().nth(1).unwrap_or_else(|| "leaderboard".to_string());
    let config = Config::load();

    let app = match App::from_config(&config).await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match command.as_str() {
        "leaderboard" => print_leaderboard(&app).await,
        "json" => print_json(&app).await,
        "games" => print_games(&app).await,
        "check-db" => return check_db(&app, &config).await,
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let what = if command == "games" { "games" } else { "leaderboard" };
            error!("{} failed: {}", command, e);
            eprintln!("Could not load {}: {}", what, e);
            ExitCode::FAILURE
        }
    }
}

async fn print_leaderboard(app: &App) -> Result<(), AppError> {
    let board = app.leaderboard().await?;
    print!("{}", render::render_text(&board));
    Ok(())
}

async fn print_json(app: &App) -> Result<(), AppError> {
    let board = app.leaderboard().await?;
    println!("{}", serde_json::to_string_pretty(&render::standings(&board))?);
    Ok(())
}

async fn print_games(app: &App) -> Result<(), AppError> {
    for game in app.games(&GameFilter::default()).await? {
        match game.pack {
            Some(pack) => println!("{}  {} ({})", game.id, game.name, pack),
            None => println!("{}  {}", game.id, game.name),
        }
    }
    Ok(())
}

async fn check_db(app: &App, config: &Config) -> ExitCode {
    let expected_timeout = config.busy_timeout.as_millis() as i64;
    let (mode, timeout) = match (app.db().journal_mode().await, app.db().busy_timeout().await) {
        (Ok(mode), Ok(timeout)) => (mode, timeout),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to read database settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Journal mode: {} (expected: wal)", mode);
    println!("Busy timeout: {}ms (expected: {}ms)", timeout, expected_timeout);

    if mode == "wal" && timeout == expected_timeout {
        info!("Database settings verified");
        ExitCode::SUCCESS
    } else {
        error!("Database settings are not configured for concurrent writers");
        ExitCode::FAILURE
    }
}
