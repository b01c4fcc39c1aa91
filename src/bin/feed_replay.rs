//! Feed replay: ingest a detection-feed JSON file and print the dashboard
//! snapshot.
//!
//! Operator/debug tool for inspecting what a recorded feed renders as,
//! without a dashboard attached.
//!
//! Usage: `feed_replay <feed.json> [day|week|month]`

use std::process::ExitCode;

use chrono::Utc;

use emberwatch::services::dashboard;
use emberwatch::state::{load_config, MonitorState};
use emberwatch::{feed, types::TimeWindow};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(feed_path) = args.get(1) else {
        eprintln!("usage: feed_replay <feed.json> [day|week|month]");
        return ExitCode::FAILURE;
    };

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("config unavailable ({}), using defaults", e);
            Default::default()
        }
    };
    let default_window = config.default_window;

    let window = match args.get(2) {
        Some(raw) => match TimeWindow::try_from(raw.as_str()) {
            Ok(window) => window,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => default_window,
    };

    let content = match std::fs::read_to_string(feed_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("failed to read {}: {}", feed_path, e);
            return ExitCode::FAILURE;
        }
    };
    let records = match feed::parse_feed(&content) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = MonitorState::new(config);
    let mut ingested = 0usize;
    for record in &records {
        match state.ingest_detection(record) {
            Ok(_) => ingested += 1,
            // A bad record never drops the rest of the replay.
            Err(e) => log::warn!("skipping record at '{}': {}", record.location, e),
        }
    }
    log::info!("ingested {}/{} feed records", ingested, records.len());

    state.set_window(window, Utc::now());

    let snapshot = dashboard::build_snapshot(&state);
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to serialize snapshot: {}", e);
            ExitCode::FAILURE
        }
    }
}
