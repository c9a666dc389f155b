//! Logging setup.
//! Writes to logs/civiresolve.log so the terminal stays free for the chat;
//! falls back to stderr when the file cannot be opened.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use log::LevelFilter;

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "logs/civiresolve.log";

pub fn init() {
    let mut builder = env_logger::Builder::new();

    if let Ok(log_level) = std::env::var("RUST_LOG") {
        builder.parse_filters(&log_level);
    } else {
        builder.filter_level(LevelFilter::Info);
        // HTTP stack is too chatty at INFO
        builder.filter_module("reqwest", LevelFilter::Warn);
        builder.filter_module("hyper", LevelFilter::Warn);
        builder.filter_module("hyper_util", LevelFilter::Warn);
    }

    // [HH:MM:SS LEVEL] target - message
    builder.format(|buf, record| {
        let now = chrono::Local::now().format("%H:%M:%S");
        writeln!(
            buf,
            "[{} {}] {} - {}",
            now,
            record.level(),
            record.target(),
            record.args()
        )
    });

    if !Path::new(LOG_DIR).exists() {
        let _ = fs::create_dir_all(LOG_DIR);
    }

    match OpenOptions::new().create(true).append(true).open(LOG_FILE) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("Could not open {LOG_FILE} ({e}), logging to stderr");
            builder.target(env_logger::Target::Stderr);
        }
    }

    if builder.try_init().is_err() {
        return;
    }

    log::info!("Logging initialized ✓");
}
