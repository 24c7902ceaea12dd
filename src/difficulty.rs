use std::time::Duration;

/// One step of the difficulty ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rung {
    /// WPM needed to climb onto this rung
    pub wpm_threshold: u32,
    /// Most words allowed on screen at once
    pub word_count_target: usize,
    pub spawn_interval: Duration,
}

const fn rung(wpm_threshold: u32, word_count_target: usize, millis: u64) -> Rung {
    Rung {
        wpm_threshold,
        word_count_target,
        spawn_interval: Duration::from_millis(millis),
    }
}

/// Starting rung plus the escalation table, ordered by WPM.
pub const LADDER: [Rung; 6] = [
    rung(0, 10, 2000),
    rung(5, 11, 1500),
    rung(10, 12, 1250),
    rung(15, 13, 1000),
    rung(20, 14, 750),
    rung(25, 15, 500),
];

/// Difficulty ratchet. Climbs at most one rung per evaluation and never
/// steps back down.
#[derive(Debug, Clone)]
pub struct Difficulty {
    rungs: Vec<Rung>,
    level: usize,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::new(LADDER.to_vec())
    }
}

impl Difficulty {
    /// `rungs` must be strictly increasing in word count and strictly
    /// decreasing in spawn interval; the first rung is the starting level.
    pub fn new(rungs: Vec<Rung>) -> Self {
        debug_assert!(!rungs.is_empty());
        debug_assert!(rungs.windows(2).all(|w| {
            w[0].word_count_target < w[1].word_count_target
                && w[0].spawn_interval > w[1].spawn_interval
        }));
        Self { rungs, level: 0 }
    }

    /// Starting rung with a custom interval; the rest of the ladder is kept
    /// if it is still strictly faster.
    pub fn starting_at(interval: Duration) -> Self {
        let mut rungs = LADDER.to_vec();
        rungs[0].spawn_interval = interval;
        let base = rungs[0];
        let rest = rungs
            .into_iter()
            .skip(1)
            .filter(|r| r.spawn_interval < base.spawn_interval);
        Self::new(std::iter::once(base).chain(rest).collect())
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn current(&self) -> Rung {
        self.rungs[self.level]
    }

    pub fn spawn_interval(&self) -> Duration {
        self.current().spawn_interval
    }

    pub fn word_count_target(&self) -> usize {
        self.current().word_count_target
    }

    /// Feed a WPM sample. Returns the new rung when the ratchet advanced.
    pub fn evaluate(&mut self, wpm: u32) -> Option<Rung> {
        // one rung at a time, even if the sample clears several thresholds
        let level = self.level + 1;
        let next = self.rungs.get(level)?;
        if wpm < next.wpm_threshold || next.word_count_target <= self.word_count_target() {
            return None;
        }
        self.level = level;
        log::info!(
            "difficulty raised to level {} ({} words, {:?})",
            level,
            self.rungs[level].word_count_target,
            self.rungs[level].spawn_interval
        );
        Some(self.rungs[level])
    }
}

/// How many missed words are tolerated at a given spawn interval.
pub fn missed_words_threshold(spawn_interval: Duration) -> u32 {
    let secs = spawn_interval.as_secs_f64();
    if secs <= 0.5 {
        30
    } else if secs <= 0.75 {
        25
    } else if secs <= 1.0 {
        20
    } else if secs <= 1.25 {
        15
    } else if secs <= 1.5 {
        10
    } else {
        20
    }
}

/// What a miss or a correct word did to the lives pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivesChange {
    Lost(u32),
    Gained(u32),
}

/// Lives bounded to `[0, max]`. Every `miss_divisor` misses costs a life,
/// every `streak_for_life` consecutive correct words earns one back.
#[derive(Debug, Clone, PartialEq)]
pub struct LivesPool {
    lives: u32,
    max: u32,
    miss_divisor: u32,
    streak_for_life: u32,
    streak: u32,
}

impl LivesPool {
    pub fn new(max: u32, miss_divisor: u32, streak_for_life: u32) -> Self {
        Self {
            lives: max,
            max,
            miss_divisor: miss_divisor.max(1),
            streak_for_life: streak_for_life.max(1),
            streak: 0,
        }
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn is_exhausted(&self) -> bool {
        self.lives == 0
    }

    /// `missed_total` is the scene's running miss count including this one.
    pub fn on_miss(&mut self, missed_total: u32) -> Option<LivesChange> {
        self.streak = 0;
        if missed_total == 0 || missed_total % self.miss_divisor != 0 || self.lives == 0 {
            return None;
        }
        self.lives -= 1;
        Some(LivesChange::Lost(self.lives))
    }

    pub fn on_correct(&mut self) -> Option<LivesChange> {
        self.streak += 1;
        if self.streak < self.streak_for_life {
            return None;
        }
        self.streak = 0;
        if self.lives >= self.max {
            return None;
        }
        self.lives += 1;
        Some(LivesChange::Gained(self.lives))
    }

    pub fn break_streak(&mut self) {
        self.streak = 0;
    }
}
