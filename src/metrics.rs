use std::time::Duration;

/// Running counters for one game scene.
///
/// Counters only ever grow; a fresh scene gets a fresh `Metrics`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub missed: u32,
    /// Scene clock, the sum of all tick deltas since the scene started
    pub elapsed: Duration,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
    }

    pub fn record_correct(&mut self) {
        self.correct_attempts += 1;
        self.total_attempts += 1;
    }

    pub fn record_wrong(&mut self) {
        self.total_attempts += 1;
    }

    pub fn record_miss(&mut self) {
        self.missed += 1;
    }

    /// Fraction of attempts that hit a word, 0.0 before the first attempt.
    pub fn accuracy_ratio(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.correct_attempts as f64 / self.total_attempts as f64
    }

    /// Net words per minute: attempts per minute scaled by accuracy.
    pub fn wpm(&self) -> u32 {
        let minutes = self.elapsed.as_secs_f64() / 60.0;
        if self.total_attempts == 0 || minutes <= 0.0 {
            return 0;
        }
        (self.total_attempts as f64 / minutes * self.accuracy_ratio()).round() as u32
    }

    /// Accuracy as a whole percentage.
    pub fn accuracy(&self) -> u32 {
        (self.accuracy_ratio() * 100.0).round() as u32
    }
}
