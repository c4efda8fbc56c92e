use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::Local;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_LEVEL_ENV: &str = "TASKDECK_LOG_LEVEL";
const LOG_FILE_PREFIX: &str = "taskdeck-";
const KEEP_LOG_FILES: usize = 10;

/// Routes tracing output to a fresh timestamped file. Keep the returned guard
/// alive for the life of the process so buffered lines are flushed.
pub fn init_logging() -> anyhow::Result<(PathBuf, WorkerGuard)> {
    let log_dir = get_log_directory()?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory '{}'", log_dir.display()))?;
    let pruned = prune_old_logs(&log_dir, KEEP_LOG_FILES.saturating_sub(1));

    let log_file_path = get_log_file_path(&log_dir);
    let file = fs::File::create(&log_file_path)
        .with_context(|| format!("failed to create log file '{}'", log_file_path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let directive = filter_directive(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    tracing_subscriber::registry()
        .with(EnvFilter::new(directive))
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::info!(path = %log_file_path.display(), pruned, "logging initialized");
    Ok((log_file_path, guard))
}

/// Our own crate logs at the requested level; dependencies stay at warn.
fn filter_directive(raw_level: Option<&str>) -> String {
    let level = raw_level.and_then(parse_level).unwrap_or(Level::WARN);
    format!("warn,taskdeck={}", level.as_str().to_ascii_lowercase())
}

fn parse_level(raw: &str) -> Option<Level> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("warning") {
        return Some(Level::WARN);
    }
    trimmed.parse().ok()
}

pub fn get_log_directory() -> anyhow::Result<PathBuf> {
    let data_dir =
        dirs::data_local_dir().ok_or_else(|| anyhow!("failed to determine local data directory"))?;
    Ok(data_dir.join("taskdeck").join("logs"))
}

pub fn get_log_file_path(log_dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    log_dir.join(format!("{LOG_FILE_PREFIX}{stamp}.log"))
}

/// Deletes all but the newest `keep` log files. Timestamped names sort
/// chronologically, so name order is age order. Returns how many went.
fn prune_old_logs(log_dir: &Path, keep: usize) -> usize {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return 0;
    };
    let mut logs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log"))
        })
        .collect();
    if logs.len() <= keep {
        return 0;
    }
    logs.sort();
    let excess = logs.len() - keep;
    logs.iter()
        .take(excess)
        .filter(|path| fs::remove_file(path).is_ok())
        .count()
}

pub fn print_log_location(log_path: &Path) {
    eprintln!("log file: {}", log_path.display());
}
