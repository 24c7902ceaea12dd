use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::spawner::SpawnSettings;
use crate::words::{FeedSettings, DEFAULT_API_URL};

/// Rule set for a game
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Lose on poor accuracy or too many missed words
    Classic,
    /// Classic rules plus a lives pool and words that speed up as you score
    Lives,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub lives: u32,
    /// Misses that cost one life
    pub miss_divisor: u32,
    /// Consecutive correct words that earn a life back
    pub streak_for_life: u32,
    pub spawn_interval_secs: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    /// Extra speed per correct word, lives mode only
    pub speed_increment: f64,
    /// Whether the avatar destroys words it touches
    pub collisions: bool,
    pub avatar_fall_speed: f64,
    /// Lose when accuracy drops below this percentage...
    pub accuracy_floor: u32,
    /// ...once more than this many attempts were made
    pub accuracy_min_attempts: u32,
    /// Count a committed word that matches nothing as a failed attempt
    pub count_wrong_commits: bool,
    pub api_url: String,
    pub offline: bool,
    pub batch_size: usize,
    pub refill_below: usize,
    pub fetch_timeout_secs: f64,
    pub fetch_retry_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Classic,
            lives: 3,
            miss_divisor: 3,
            streak_for_life: 2,
            spawn_interval_secs: 2.0,
            speed_min: 6.0,
            speed_max: 12.0,
            speed_increment: 0.25,
            collisions: true,
            avatar_fall_speed: 12.0,
            accuracy_floor: 30,
            accuracy_min_attempts: 10,
            count_wrong_commits: false,
            api_url: DEFAULT_API_URL.to_string(),
            offline: false,
            batch_size: 100,
            refill_below: 10,
            fetch_timeout_secs: 5.0,
            fetch_retry_secs: 1.0,
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::ZERO)
}

impl Config {
    pub fn spawn_interval(&self) -> Duration {
        secs(self.spawn_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        secs(self.fetch_timeout_secs)
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            batch_size: self.batch_size.max(1),
            refill_below: self.refill_below,
            retry_after: secs(self.fetch_retry_secs),
        }
    }

    pub fn spawn_settings(&self) -> SpawnSettings {
        SpawnSettings {
            speed_min: self.speed_min,
            speed_max: self.speed_max,
            speed_increment: match self.mode {
                Mode::Classic => 0.0,
                Mode::Lives => self.speed_increment,
            },
            ..SpawnSettings::default()
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "wordfall") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("wordfall_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("ignoring unreadable config {}: {e}", self.path.display());
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "mode": "lives", "lives": 5 }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.mode, Mode::Lives);
        assert_eq!(cfg.lives, 5);
        assert_eq!(cfg.miss_divisor, 3);
        assert!(!cfg.count_wrong_commits);
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn classic_mode_ignores_speed_increment() {
        let cfg = Config::default();
        assert_eq!(cfg.spawn_settings().speed_increment, 0.0);
        let cfg = Config {
            mode: Mode::Lives,
            ..Config::default()
        };
        assert_eq!(cfg.spawn_settings().speed_increment, 0.25);
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        let cfg = Config {
            fetch_retry_secs: -3.0,
            ..Config::default()
        };
        assert_eq!(cfg.feed_settings().retry_after, Duration::ZERO);
        assert_eq!(cfg.spawn_interval(), Duration::from_secs(2));
    }
}
