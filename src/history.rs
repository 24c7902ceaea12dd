use chrono::Local;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use crate::game::{LoseReport, LossReason};

/// One finished game as written to the results log
#[derive(Debug, Serialize)]
struct ResultRecord {
    date: String,
    mode: String,
    wpm: u32,
    accuracy: u32,
    correct: u32,
    attempts: u32,
    missed: u32,
    spawn_interval_secs: f64,
    elapsed_secs: f64,
    reason: &'static str,
}

impl From<&LoseReport> for ResultRecord {
    fn from(report: &LoseReport) -> Self {
        Self {
            date: Local::now().format("%c").to_string(),
            mode: report.mode.to_string().to_lowercase(),
            wpm: report.wpm,
            accuracy: report.accuracy,
            correct: report.correct,
            attempts: report.attempts,
            missed: report.missed,
            spawn_interval_secs: report.spawn_interval.as_secs_f64(),
            elapsed_secs: (report.elapsed.as_secs_f64() * 100.0).round() / 100.0,
            reason: match report.reason {
                LossReason::OutOfLives => "lives",
                LossReason::LowAccuracy { .. } => "accuracy",
                LossReason::TooManyMisses { .. } => "missed",
            },
        }
    }
}

/// Append-only CSV log of finished games.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, report: &LoseReport) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // the header goes in only when the file is new
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer
            .serialize(ResultRecord::from(report))
            .map_err(io::Error::other)?;
        writer.flush()
    }
}
