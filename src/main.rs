mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::Arc,
    time::{Duration, Instant},
};
use wordfall::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, Mode},
    effects::{ConfettiStyle, EffectLayer},
    game::{GameSession, LoseReport, SceneEvent},
    history::ResultsLog,
    runtime::{keystroke, AppEvent, CrosstermEventSource, FixedTicker, Runner},
    words::{EmbeddedWordSource, HttpWordSource, WordSource},
};

const TICK_RATE_MS: u64 = 50;
/// Longest step fed to the game after a stall (suspend, slow terminal)
const MAX_STEP: Duration = Duration::from_millis(250);

/// terminal typing game: type the falling words before they escape
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Words scroll across the screen; type one and press space to blast it. Keep your accuracy up and don't let too many slip past."
)]
pub struct Cli {
    /// rule set to play
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// number of lives in lives mode
    #[clap(short = 'l', long)]
    lives: Option<u32>,

    /// seconds between new words at the start
    #[clap(short = 'i', long)]
    interval: Option<f64>,

    /// use the bundled word list instead of the online word provider
    #[clap(long)]
    offline: bool,

    /// word provider URL; must answer `?number=N` with a JSON array of words
    #[clap(long)]
    api_url: Option<String>,

    /// seed for word placement and speeds
    #[clap(long)]
    seed: Option<u64>,

    /// words passing through the avatar are not destroyed
    #[clap(long)]
    no_collisions: bool,

    /// store these settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Overlay command line flags on the stored configuration
    fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(lives) = self.lives {
            config.lives = lives.max(1);
        }
        if let Some(interval) = self.interval {
            config.spawn_interval_secs = interval;
        }
        if let Some(ref url) = self.api_url {
            config.api_url = url.clone();
        }
        if self.offline {
            config.offline = true;
        }
        if self.no_collisions {
            config.collisions = false;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Playing,
    GameOver(LoseReport),
}

pub struct App {
    pub config: Config,
    pub session: GameSession,
    pub effects: EffectLayer,
    pub state: AppState,
    results: Option<ResultsLog>,
    rng: StdRng,
}

fn word_source(config: &Config, seed: Option<u64>) -> Result<Arc<dyn WordSource>, Box<dyn Error>> {
    if config.offline {
        Ok(Arc::new(EmbeddedWordSource::english(seed)?))
    } else {
        Ok(Arc::new(HttpWordSource::new(
            config.api_url.clone(),
            config.fetch_timeout(),
        )))
    }
}

impl App {
    pub fn new(config: Config, seed: Option<u64>) -> Result<Self, Box<dyn Error>> {
        let source = word_source(&config, seed)?;
        let results = AppDirs::results_path().map(ResultsLog::new);
        Ok(Self::with_source(config, source, seed, results))
    }

    pub fn with_source(
        config: Config,
        source: Arc<dyn WordSource>,
        seed: Option<u64>,
        results: Option<ResultsLog>,
    ) -> Self {
        let session = GameSession::new(&config, source, seed);
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            session,
            effects: EffectLayer::new(ConfettiStyle::default()),
            state: AppState::Playing,
            results,
            rng,
        }
    }

    /// Sizes the game arena to the play field of a `frame`-sized terminal
    pub fn resize(&mut self, frame: Rect) {
        let field = ui::play_area(frame);
        self.session
            .resize(field.width.max(1) as f64, field.height.max(1) as f64);
    }

    pub fn on_tick(&mut self, dt: Duration) {
        let dt = dt.min(MAX_STEP);
        if self.state == AppState::Playing {
            self.session.tick(dt);
            self.process_events();
        }
        let arena = self.session.arena();
        self.effects.update(dt, arena.width, arena.height);
    }

    /// Returns false when the player asked to quit
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return false;
        }

        match self.state {
            AppState::Playing => {
                if let Some(stroke) = keystroke(&key) {
                    self.session.on_key(stroke);
                    self.process_events();
                }
            }
            AppState::GameOver(_) => {
                if key.code == KeyCode::Char(' ') {
                    self.session.restart();
                    self.effects.clear();
                    self.state = AppState::Playing;
                }
            }
        }
        true
    }

    fn process_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SceneEvent::Effect(effect) => self.effects.play(effect, &mut self.rng),
                SceneEvent::GameOver(report) => {
                    if let Some(ref results) = self.results {
                        if let Err(e) = results.append(&report) {
                            log::warn!("could not save results to {}: {e}", results.path().display());
                        }
                    }
                    self.effects.clear();
                    self.state = AppState::GameOver(report);
                }
                _ => {}
            }
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    // stderr belongs to the TUI, so log lines go to the file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);
    if cli.save_config {
        store.save(&config)?;
        log::info!("saved settings to {}", store.path().display());
    }

    let mut app = App::new(config, cli.seed)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    let size = terminal.size()?;
    app.resize(Rect::new(0, 0, size.width, size.height));
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            AppEvent::Tick => {
                let now = Instant::now();
                app.on_tick(now - last_tick);
                last_tick = now;
            }
            AppEvent::Resize => {
                let size = terminal.size()?;
                app.resize(Rect::new(0, 0, size.width, size.height));
            }
            AppEvent::Key(key) => {
                if !app.on_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use std::time::Duration;
    use tempfile::tempdir;
    use wordfall::game::LossReason;

    fn offline_app(mode: Mode) -> App {
        let config = Config {
            mode,
            offline: true,
            ..Config::default()
        };
        let source = Arc::new(EmbeddedWordSource::english(Some(3)).unwrap());
        let mut app = App::with_source(config, source, Some(3), None);
        app.session.wait_for_words(Duration::from_secs(5));
        app
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn report() -> LoseReport {
        LoseReport {
            mode: Mode::Classic,
            reason: LossReason::TooManyMisses { threshold: 20 },
            wpm: 17,
            accuracy: 91,
            missed: 21,
            correct: 30,
            attempts: 33,
            spawn_interval: Duration::from_secs(1),
            elapsed: Duration::from_secs(120),
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["wordfall"]);
        assert_eq!(cli.mode, None);
        assert_eq!(cli.lives, None);
        assert!(!cli.offline);
        assert!(!cli.save_config);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "wordfall",
            "--mode",
            "lives",
            "-l",
            "5",
            "-i",
            "1.5",
            "--offline",
            "--no-collisions",
            "--api-url",
            "http://localhost:9000/words",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.mode, Mode::Lives);
        assert_eq!(config.lives, 5);
        assert_eq!(config.spawn_interval_secs, 1.5);
        assert!(config.offline);
        assert!(!config.collisions);
        assert_eq!(config.api_url, "http://localhost:9000/words");
    }

    #[test]
    fn test_cli_leaves_unset_fields_alone() {
        let cli = Cli::parse_from(["wordfall"]);
        let mut config = Config {
            lives: 7,
            ..Config::default()
        };
        cli.apply(&mut config);
        assert_eq!(config.lives, 7);
        assert!(config.collisions);
    }

    #[test]
    fn test_escape_quits() {
        let mut app = offline_app(Mode::Classic);
        assert!(!app.on_key(key(KeyCode::Esc)));
        assert!(!app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(app.on_key(key(KeyCode::Char('a'))));
    }

    #[test]
    fn test_typing_reaches_session() {
        let mut app = offline_app(Mode::Classic);
        app.on_key(key(KeyCode::Char('h')));
        app.on_key(key(KeyCode::Char('i')));
        assert_eq!(app.session.typing().input(), "hi");
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.session.typing().input(), "");
    }

    #[test]
    fn test_words_appear_after_first_interval() {
        let mut app = offline_app(Mode::Classic);
        app.resize(Rect::new(0, 0, 80, 24));
        for _ in 0..41 {
            app.on_tick(Duration::from_millis(50));
        }
        assert_eq!(app.session.registry().len(), 1);
    }

    #[test]
    fn test_space_restarts_after_game_over() {
        let mut app = offline_app(Mode::Lives);
        app.state = AppState::GameOver(report());
        assert!(app.on_key(key(KeyCode::Char('x'))));
        assert_matches::assert_matches!(app.state, AppState::GameOver(_));
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.state, AppState::Playing);
        assert!(!app.session.is_over());
    }

    #[test]
    fn test_game_over_is_logged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let config = Config {
            offline: true,
            count_wrong_commits: true,
            ..Config::default()
        };
        let source = Arc::new(EmbeddedWordSource::english(Some(3)).unwrap());
        let mut app = App::with_source(config, source, Some(3), Some(ResultsLog::new(&path)));
        app.resize(Rect::new(0, 0, 40, 12));

        // type garbage until accuracy sinks
        for _ in 0..11 {
            app.on_key(key(KeyCode::Char('q')));
            app.on_key(key(KeyCode::Char('q')));
            app.on_key(key(KeyCode::Char('q')));
            app.on_key(key(KeyCode::Enter));
        }
        app.on_tick(Duration::from_millis(50));

        assert_matches::assert_matches!(
            app.state,
            AppState::GameOver(LoseReport {
                reason: LossReason::LowAccuracy { .. },
                ..
            })
        );
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains(",accuracy"));
    }

    #[test]
    fn test_ui_renders_game_screen() {
        let mut app = offline_app(Mode::Lives);
        app.resize(Rect::new(0, 0, 60, 20));
        for c in "wor".chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| f.render_widget(&app, f.area())).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("WPM: 0"));
        assert!(text.contains("Missed: 0/20"));
        assert!(text.contains("♥"));
        assert!(text.contains("wor_"));
        assert!(text.contains("@"));
    }

    #[test]
    fn test_ui_renders_game_over_screen() {
        let mut app = offline_app(Mode::Classic);
        app.state = AppState::GameOver(report());
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| f.render_widget(&app, f.area())).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Game Over!"));
        assert!(text.contains("WPM: 17"));
        assert!(text.contains("Accuracy: 91%"));
        assert!(text.contains("Missed Words: 21"));
        assert!(text.contains("missing more than 20 words"));
        assert!(text.contains("Press Space to Restart"));
    }

    #[test]
    fn test_play_area_inside_borders() {
        let field = ui::play_area(Rect::new(0, 0, 80, 24));
        assert_eq!(field, Rect::new(1, 2, 78, 18));
    }
}
