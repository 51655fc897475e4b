//! Scheduled entry point: fetch readings, score, append to the odds log.
//!
//! Intended to run from cron at an interval longer than a run takes. Exits
//! non-zero, without touching the log, if any reading cannot be fetched or
//! the log cannot be written.

use std::process::ExitCode;

use catfish_odds::config::Config;
use catfish_odds::ingest;
use catfish_odds::logging::{self, DataSource, LogLevel};
use catfish_odds::pipeline::Pipeline;

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| LogLevel::parse(&v))
        .unwrap_or(LogLevel::Info);
    let log_file = std::env::var("RUN_LOG_FILE").ok();
    logging::init_logger(level, log_file.as_deref(), log_file.is_some());

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            logging::error(DataSource::System, None, &format!("Configuration error: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let client = match ingest::build_client(&config) {
        Ok(c) => c,
        Err(e) => {
            logging::error(DataSource::System, None, &format!("HTTP client setup failed: {}", e));
            return ExitCode::FAILURE;
        }
    };

    // fetch_readings already logged the failing source.
    let Ok(readings) = ingest::fetch_readings(&client, &config) else {
        return ExitCode::FAILURE;
    };

    match Pipeline::from_config(&config).run(&readings) {
        Ok(outcome) => {
            logging::log_write_summary(outcome.record.retained, outcome.record.pruned, outcome.record.replaced);
            println!("{}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::error(
                DataSource::OddsLog,
                None,
                &format!("Failed to write {}: {}", config.log_file_path.display(), e),
            );
            ExitCode::FAILURE
        }
    }
}
