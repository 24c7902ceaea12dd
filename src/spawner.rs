use rand::Rng;
use std::time::Duration;

use crate::entity::{Arena, EntityId, Registry, WordEntity};
use crate::words::WordFeed;

/// Where and how fast new words appear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSettings {
    /// Cells per second, sampled uniformly from `speed_min..speed_max`
    pub speed_min: f64,
    pub speed_max: f64,
    /// Added to the sampled speed for every word typed correctly so far
    pub speed_increment: f64,
    /// Rows kept clear above the playable band
    pub top_margin: f64,
    /// Rows kept clear below it, so words never sit on the avatar's ground
    pub bottom_margin: f64,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            speed_min: 6.0,
            speed_max: 12.0,
            speed_increment: 0.0,
            top_margin: 1.0,
            bottom_margin: 2.0,
        }
    }
}

/// Timer-driven word spawner.
///
/// Every elapsed interval arms one pending spawn. A pending spawn waits,
/// without holding up the rest of the tick, until a word is buffered and the
/// screen has room for it.
#[derive(Debug, Clone)]
pub struct Spawner {
    settings: SpawnSettings,
    timer: Duration,
    pending: bool,
}

impl Spawner {
    pub fn new(settings: SpawnSettings) -> Self {
        Self {
            settings,
            timer: Duration::ZERO,
            pending: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn reset(&mut self) {
        self.timer = Duration::ZERO;
        self.pending = false;
    }

    /// Runs the timer with the current interval, which may shrink between
    /// calls as difficulty rises.
    pub fn advance(&mut self, dt: Duration, interval: Duration) {
        self.timer += dt;
        if interval.is_zero() {
            self.pending = true;
            self.timer = Duration::ZERO;
            return;
        }
        if self.timer >= interval {
            self.pending = true;
            // a long frame fires once, not once per missed interval
            let nanos = self.timer.as_nanos() % interval.as_nanos();
            self.timer = Duration::from_nanos(nanos as u64);
        }
    }

    /// Turns a pending spawn into a word entity when a word is available and
    /// fewer than `max_on_screen` words are live.
    pub fn try_spawn<R: Rng>(
        &mut self,
        feed: &mut WordFeed,
        registry: &mut Registry,
        arena: &Arena,
        rng: &mut R,
        correct_attempts: u32,
        max_on_screen: usize,
    ) -> Option<EntityId> {
        if !self.pending || registry.len() >= max_on_screen {
            return None;
        }
        let Some(text) = feed.pop() else {
            feed.request_refill();
            return None;
        };
        self.pending = false;
        let word = self.build(text, arena, rng, correct_attempts);
        Some(registry.insert(word))
    }

    fn build<R: Rng>(&self, text: String, arena: &Arena, rng: &mut R, correct_attempts: u32) -> WordEntity {
        let s = &self.settings;
        let top = s.top_margin;
        let bottom = (arena.height - s.bottom_margin).max(top + 1.0);
        let y = rng.gen_range(top..bottom).floor();

        let base = if s.speed_min < s.speed_max {
            rng.gen_range(s.speed_min..s.speed_max)
        } else {
            s.speed_min
        };
        let speed = base + correct_attempts as f64 * s.speed_increment;

        WordEntity {
            text,
            x: arena.width,
            y,
            speed,
        }
    }
}
