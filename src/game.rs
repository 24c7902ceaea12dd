//! One playable scene: the session context that owns every piece of game
//! state and runs the per-tick systems in a fixed order.

use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, Mode};
use crate::difficulty::{missed_words_threshold, Difficulty, LivesChange, LivesPool, Rung};
use crate::effects::Effect;
use crate::entity::{self, Arena, Avatar, EntityId, Registry};
use crate::metrics::Metrics;
use crate::spawner::Spawner;
use crate::typing::{Keystroke, TypingOutcome, TypingState};
use crate::words::{WordFeed, WordSource};

/// Share of the distance to the target the avatar covers per keypress
const NUDGE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    OutOfLives,
    LowAccuracy { accuracy: u32 },
    TooManyMisses { threshold: u32 },
}

/// Final numbers handed to the game-over screen.
#[derive(Debug, Clone, PartialEq)]
pub struct LoseReport {
    pub mode: Mode,
    pub reason: LossReason,
    pub wpm: u32,
    pub accuracy: u32,
    pub missed: u32,
    pub correct: u32,
    pub attempts: u32,
    pub spawn_interval: Duration,
    pub elapsed: Duration,
}

impl LoseReport {
    pub fn missed_threshold(&self) -> u32 {
        missed_words_threshold(self.spawn_interval)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPath {
    Typed,
    Collision,
}

/// Things that happened during a tick or keystroke, for the frontend.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Spawned(EntityId),
    Matched {
        id: EntityId,
        text: String,
        via: MatchPath,
    },
    Missed {
        id: EntityId,
        text: String,
    },
    Lives(LivesChange),
    DifficultyRaised {
        level: usize,
        rung: Rung,
    },
    Effect(Effect),
    GameOver(LoseReport),
}

#[derive(Debug, Clone, Copy)]
struct Rules {
    accuracy_floor: u32,
    accuracy_min_attempts: u32,
    count_wrong_commits: bool,
    collisions: bool,
    avatar_fall_speed: f64,
    initial_interval: Duration,
    lives: u32,
    miss_divisor: u32,
    streak_for_life: u32,
}

#[derive(Debug)]
pub struct GameSession {
    mode: Mode,
    rules: Rules,
    feed: WordFeed,
    spawner: Spawner,
    registry: Registry,
    typing: TypingState,
    metrics: Metrics,
    difficulty: Difficulty,
    lives: Option<LivesPool>,
    arena: Arena,
    avatar: Avatar,
    rng: StdRng,
    events: Vec<SceneEvent>,
    report: Option<LoseReport>,
}

impl GameSession {
    /// Builds a scene and immediately starts fetching its first words.
    pub fn new(config: &Config, source: Arc<dyn WordSource>, seed: Option<u64>) -> Self {
        let rules = Rules {
            accuracy_floor: config.accuracy_floor,
            accuracy_min_attempts: config.accuracy_min_attempts,
            count_wrong_commits: config.count_wrong_commits,
            collisions: config.collisions,
            avatar_fall_speed: config.avatar_fall_speed,
            initial_interval: config.spawn_interval(),
            lives: config.lives,
            miss_divisor: config.miss_divisor,
            streak_for_life: config.streak_for_life,
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let arena = Arena::default();
        let mut session = Self {
            mode: config.mode,
            rules,
            feed: WordFeed::new(source, config.feed_settings()),
            spawner: Spawner::new(config.spawn_settings()),
            registry: Registry::new(),
            typing: TypingState::new(),
            metrics: Metrics::new(),
            difficulty: Difficulty::starting_at(rules.initial_interval),
            lives: Self::fresh_lives(config.mode, &rules),
            arena,
            avatar: Self::home(&arena),
            rng,
            events: Vec::new(),
            report: None,
        };
        session.feed.request_refill();
        log::info!("{} game started", session.mode);
        session
    }

    fn fresh_lives(mode: Mode, rules: &Rules) -> Option<LivesPool> {
        match mode {
            Mode::Classic => None,
            Mode::Lives => Some(LivesPool::new(
                rules.lives,
                rules.miss_divisor,
                rules.streak_for_life,
            )),
        }
    }

    fn home(arena: &Arena) -> Avatar {
        Avatar {
            x: (arena.width / 2.0).floor(),
            y: arena.ground(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn typing(&self) -> &TypingState {
        &self.typing
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    pub fn lives(&self) -> Option<&LivesPool> {
        self.lives.as_ref()
    }

    pub fn avatar(&self) -> Avatar {
        self.avatar
    }

    pub fn arena(&self) -> Arena {
        self.arena
    }

    pub fn feed(&self) -> &WordFeed {
        &self.feed
    }

    pub fn wpm(&self) -> u32 {
        self.metrics.wpm()
    }

    pub fn accuracy(&self) -> u32 {
        self.metrics.accuracy()
    }

    pub fn missed_threshold(&self) -> u32 {
        missed_words_threshold(self.difficulty.spawn_interval())
    }

    pub fn report(&self) -> Option<&LoseReport> {
        self.report.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.report.is_some()
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Blocks until an outstanding word fetch lands. Meant for headless
    /// drivers that want the first words before ticking.
    pub fn wait_for_words(&mut self, timeout: Duration) -> usize {
        self.feed.wait(timeout)
    }

    /// Sets the play area size in cells; the avatar is kept inside it.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.arena = Arena::new(width.max(1.0), height.max(1.0));
        self.avatar.x = self.avatar.x.clamp(0.0, self.arena.width - 1.0);
        self.avatar.y = self.avatar.y.min(self.arena.ground());
    }

    /// Advances the scene by `dt`: fetch completions, spawning, motion,
    /// collisions, misses, loss checks and difficulty, in that order.
    pub fn tick(&mut self, dt: Duration) {
        if self.is_over() {
            return;
        }
        self.metrics.advance(dt);
        self.feed.advance(dt);
        self.feed.poll();

        self.spawner.advance(dt, self.difficulty.spawn_interval());
        if let Some(id) = self.spawner.try_spawn(
            &mut self.feed,
            &mut self.registry,
            &self.arena,
            &mut self.rng,
            self.metrics.correct_attempts,
            self.difficulty.word_count_target(),
        ) {
            self.events.push(SceneEvent::Spawned(id));
        }

        entity::motion(
            &mut self.registry,
            &mut self.avatar,
            &self.arena,
            self.rules.avatar_fall_speed,
            dt,
        );

        if self.rules.collisions {
            for id in entity::collisions(&self.registry, &self.avatar) {
                self.credit(id, MatchPath::Collision);
            }
        }

        for (id, word) in entity::misses(&mut self.registry) {
            self.metrics.record_miss();
            self.typing.release(id);
            log::debug!("missed {:?} ({} total)", word.text, self.metrics.missed);
            self.events.push(SceneEvent::Missed { id, text: word.text });
            let missed = self.metrics.missed;
            if let Some(change) = self.lives.as_mut().and_then(|l| l.on_miss(missed)) {
                self.events.push(SceneEvent::Lives(change));
            }
        }

        if let Some(reason) = self.check_loss() {
            self.finish(reason);
            return;
        }

        if let Some(rung) = self.difficulty.evaluate(self.metrics.wpm()) {
            self.events.push(SceneEvent::DifficultyRaised {
                level: self.difficulty.level(),
                rung,
            });
        }
    }

    /// Handles one keystroke. Ignored once the game is over.
    pub fn on_key(&mut self, key: Keystroke) {
        if self.is_over() {
            return;
        }
        match self.typing.apply(key, &self.registry) {
            TypingOutcome::Matched(id) => {
                self.credit(id, MatchPath::Typed);
            }
            TypingOutcome::NoMatch(typed) => {
                log::debug!("no word matches {typed:?}");
                if self.rules.count_wrong_commits {
                    self.metrics.record_wrong();
                    if let Some(lives) = self.lives.as_mut() {
                        lives.break_streak();
                    }
                }
            }
            TypingOutcome::Edited | TypingOutcome::Empty => {}
        }

        let target_x = self
            .typing
            .target()
            .and_then(|id| self.registry.get(id))
            .map(|w| w.x);
        if let Some(target_x) = target_x {
            self.avatar.x += (target_x - self.avatar.x) * NUDGE;
            self.avatar.x = self.avatar.x.clamp(0.0, (self.arena.width - 1.0).max(0.0));
        }
    }

    /// Reports a physical hit between the avatar and a word. Credited the
    /// same as a typed match.
    pub fn on_collision(&mut self, id: EntityId) -> bool {
        if self.is_over() {
            return false;
        }
        self.credit(id, MatchPath::Collision)
    }

    fn credit(&mut self, id: EntityId, via: MatchPath) -> bool {
        let Some(word) = self.registry.remove(id) else {
            return false;
        };
        self.metrics.record_correct();
        self.typing.release(id);

        if via == MatchPath::Typed {
            self.events.push(SceneEvent::Effect(Effect::Kaboom { x: word.x, y: word.y }));
            // jump onto the destroyed word, gravity brings the avatar back
            self.avatar = Avatar {
                x: word.x.clamp(0.0, (self.arena.width - 1.0).max(0.0)),
                y: word.y,
            };
        }
        self.events.push(SceneEvent::Effect(Effect::Confetti { x: word.x, y: word.y }));

        if let Some(change) = self.lives.as_mut().and_then(|l| l.on_correct()) {
            self.events.push(SceneEvent::Lives(change));
        }
        log::debug!("{via:?} match on {:?}", word.text);
        self.events.push(SceneEvent::Matched {
            id,
            text: word.text,
            via,
        });
        true
    }

    /// Loss conditions in priority order; the first that holds wins.
    fn check_loss(&self) -> Option<LossReason> {
        if self.lives.as_ref().is_some_and(|l| l.is_exhausted()) {
            return Some(LossReason::OutOfLives);
        }
        let accuracy = self.metrics.accuracy();
        if self.metrics.total_attempts > self.rules.accuracy_min_attempts
            && accuracy < self.rules.accuracy_floor
        {
            return Some(LossReason::LowAccuracy { accuracy });
        }
        let threshold = self.missed_threshold();
        if self.metrics.missed > threshold {
            return Some(LossReason::TooManyMisses { threshold });
        }
        None
    }

    /// One-way transition to game over. Later calls are no-ops.
    fn finish(&mut self, reason: LossReason) {
        if self.report.is_some() {
            return;
        }
        let report = LoseReport {
            mode: self.mode,
            reason,
            wpm: self.metrics.wpm(),
            accuracy: self.metrics.accuracy(),
            missed: self.metrics.missed,
            correct: self.metrics.correct_attempts,
            attempts: self.metrics.total_attempts,
            spawn_interval: self.difficulty.spawn_interval(),
            elapsed: self.metrics.elapsed,
        };
        log::info!(
            "game over ({reason:?}): {} wpm, {}% accuracy, {} missed",
            report.wpm,
            report.accuracy,
            report.missed
        );
        self.spawner.reset();
        self.feed.reset();
        self.typing.clear();
        self.events.push(SceneEvent::GameOver(report.clone()));
        self.report = Some(report);
    }

    /// Starts a fresh scene with the same rules and word source.
    pub fn restart(&mut self) {
        self.feed.reset();
        self.spawner.reset();
        self.registry.clear();
        self.typing.clear();
        self.metrics = Metrics::new();
        self.difficulty = Difficulty::starting_at(self.rules.initial_interval);
        self.lives = Self::fresh_lives(self.mode, &self.rules);
        self.avatar = Self::home(&self.arena);
        self.events.clear();
        self.report = None;
        self.feed.request_refill();
        log::info!("{} game restarted", self.mode);
    }
}
