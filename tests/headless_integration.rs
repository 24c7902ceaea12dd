use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use wordfall::config::{Config, Mode};
use wordfall::game::{GameSession, LossReason, SceneEvent};
use wordfall::runtime::{keystroke, AppEvent, FixedTicker, Runner, TestEventSource};
use wordfall::words::{FetchError, WordSource};

/// Always hands back the same short list
struct FixedSource(Vec<&'static str>);

impl WordSource for FixedSource {
    fn fetch(&self, _count: usize) -> Result<Vec<String>, FetchError> {
        Ok(self.0.iter().map(|w| w.to_string()).collect())
    }
}

/// Fails a set number of times before serving words
struct FlakySource {
    failures_left: Mutex<u32>,
}

impl WordSource for FlakySource {
    fn fetch(&self, _count: usize) -> Result<Vec<String>, FetchError> {
        let mut left = self.failures_left.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(FetchError::Timeout);
        }
        Ok(vec!["steady".to_string()])
    }
}

fn config(mode: Mode) -> Config {
    Config {
        mode,
        collisions: false,
        // one word a second, all at the same speed, so misses never coincide
        spawn_interval_secs: 1.0,
        speed_min: 8.0,
        speed_max: 8.0,
        fetch_retry_secs: 0.05,
        ..Config::default()
    }
}

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless run of the game loop through Runner/TestEventSource without a TTY:
// wait for a word to appear, then type it.
#[test]
fn headless_type_spawned_word() {
    let mut session = GameSession::new(
        &config(Mode::Classic),
        Arc::new(FixedSource(vec!["rust"])),
        Some(1),
    );
    session.wait_for_words(Duration::from_secs(5));

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let mut runner = Runner::new(es, ticker);

    // tick until the first word is on screen
    for _ in 0..200u32 {
        if let AppEvent::Tick = runner.step() {
            session.tick(Duration::from_millis(50));
        }
        if !session.registry().is_empty() {
            break;
        }
    }
    assert_eq!(session.registry().len(), 1);

    for c in "rust ".chars() {
        tx.send(key(c)).unwrap();
    }

    let mut matched = false;
    for _ in 0..50u32 {
        match runner.step() {
            AppEvent::Key(k) => {
                if let Some(stroke) = keystroke(&k) {
                    session.on_key(stroke);
                }
            }
            AppEvent::Tick | AppEvent::Resize => {}
        }
        if session
            .drain_events()
            .iter()
            .any(|e| matches!(e, SceneEvent::Matched { text, .. } if text == "rust"))
        {
            matched = true;
            break;
        }
    }

    assert!(matched, "typed word should have been matched");
    assert_eq!(session.metrics().correct_attempts, 1);
    assert_eq!(session.accuracy(), 100);
}

#[test]
fn headless_idle_player_loses_by_misses() {
    let mut session = GameSession::new(
        &config(Mode::Classic),
        Arc::new(FixedSource(vec!["idle", "words", "pass", "by"])),
        Some(2),
    );
    session.resize(10.0, 8.0);
    session.wait_for_words(Duration::from_secs(5));

    let mut game_overs = 0;
    // plenty of simulated time for 21 words to cross a 10-cell arena
    for _ in 0..4000u32 {
        session.tick(Duration::from_millis(50));
        session.wait_for_words(Duration::from_millis(1));
        game_overs += session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SceneEvent::GameOver(_)))
            .count();
        if session.is_over() {
            break;
        }
    }

    assert_eq!(game_overs, 1);
    let report = session.report().expect("game should be over");
    assert_eq!(report.reason, LossReason::TooManyMisses { threshold: 20 });
    assert_eq!(report.missed, 21);
    assert_eq!(report.wpm, 0);
}

#[test]
fn headless_lives_mode_runs_out_of_lives() {
    let mut session = GameSession::new(
        &config(Mode::Lives),
        Arc::new(FixedSource(vec!["gone"])),
        Some(3),
    );
    session.resize(10.0, 8.0);
    session.wait_for_words(Duration::from_secs(5));

    for _ in 0..4000u32 {
        session.tick(Duration::from_millis(50));
        session.wait_for_words(Duration::from_millis(1));
        if session.is_over() {
            break;
        }
    }

    let report = session.report().expect("game should be over");
    assert_eq!(report.reason, LossReason::OutOfLives);
    assert_eq!(report.missed, 9);
    assert_eq!(session.lives().map(|l| l.lives()), Some(0));
}

#[test]
fn headless_flaky_provider_recovers() {
    let mut session = GameSession::new(
        &config(Mode::Classic),
        Arc::new(FlakySource {
            failures_left: Mutex::new(3),
        }),
        Some(4),
    );

    for _ in 0..400u32 {
        session.tick(Duration::from_millis(50));
        session.wait_for_words(Duration::from_millis(5));
        if !session.registry().is_empty() {
            break;
        }
    }

    assert!(!session.is_over());
    assert!(session
        .registry()
        .iter()
        .all(|(_, w)| w.text == "steady"));
    assert_eq!(session.registry().len(), 1);
}

#[test]
fn headless_restart_starts_clean() {
    let mut session = GameSession::new(
        &config(Mode::Lives),
        Arc::new(FixedSource(vec!["again"])),
        Some(5),
    );
    session.resize(10.0, 8.0);
    session.wait_for_words(Duration::from_secs(5));
    for _ in 0..4000u32 {
        session.tick(Duration::from_millis(50));
        session.wait_for_words(Duration::from_millis(1));
        if session.is_over() {
            break;
        }
    }
    assert!(session.is_over());

    session.restart();
    assert!(!session.is_over());
    assert_eq!(session.metrics().missed, 0);
    assert!(session.registry().is_empty());
    session.wait_for_words(Duration::from_secs(5));
    assert!(!session.feed().is_empty());
}
