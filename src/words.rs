use include_dir::{include_dir, Dir};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Deserialize;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

static WORDLIST_DIR: Dir = include_dir!("src/wordlists");

pub const DEFAULT_API_URL: &str = "https://random-word-api.herokuapp.com/word";

/// Why a batch of words could not be obtained
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    Transport(String),
    Timeout,
    Malformed(String),
    /// The provider answered with no usable words
    Empty,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "word provider unreachable: {msg}"),
            FetchError::Timeout => write!(f, "word provider timed out"),
            FetchError::Malformed(msg) => write!(f, "word provider sent malformed data: {msg}"),
            FetchError::Empty => write!(f, "word provider returned no words"),
        }
    }
}

impl Error for FetchError {}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => FetchError::Transport(format!("HTTP status {code}")),
            ureq::Error::Transport(transport) => {
                let timed_out = transport
                    .source()
                    .and_then(|src| src.downcast_ref::<io::Error>())
                    .map(|e| matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
                    .unwrap_or(false);
                if timed_out {
                    FetchError::Timeout
                } else {
                    FetchError::Transport(transport.to_string())
                }
            }
        }
    }
}

/// Anything that can hand out a batch of words. Fetches run on a worker
/// thread, so implementations must be shareable.
pub trait WordSource: Send + Sync + 'static {
    fn fetch(&self, count: usize) -> Result<Vec<String>, FetchError>;
}

/// Word provider reached over HTTP; the response is a JSON array of strings.
#[derive(Debug, Clone)]
pub struct HttpWordSource {
    url: String,
    timeout: Duration,
}

impl HttpWordSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl WordSource for HttpWordSource {
    fn fetch(&self, count: usize) -> Result<Vec<String>, FetchError> {
        log::debug!("fetching {count} words from {}", self.url);
        ureq::get(&self.url)
            .set("User-Agent", "wordfall")
            .query("number", &count.to_string())
            .timeout(self.timeout)
            .call()?
            .into_json::<Vec<String>>()
            .map_err(|e| match e.kind() {
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FetchError::Timeout,
                _ => FetchError::Malformed(e.to_string()),
            })
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordList {
    /// Loads one of the word lists bundled into the binary.
    pub fn embedded(name: &str) -> Result<Self, FetchError> {
        let file = WORDLIST_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| FetchError::Malformed(format!("no bundled word list named {name}")))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| FetchError::Malformed(format!("{name} is not valid UTF-8")))?;
        serde_json::from_str(contents).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

/// Offline source that samples from a bundled word list.
#[derive(Debug)]
pub struct EmbeddedWordSource {
    words: Vec<String>,
    rng: Mutex<StdRng>,
}

impl EmbeddedWordSource {
    pub fn new(list: WordList, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            words: list.words,
            rng: Mutex::new(rng),
        }
    }

    pub fn english(seed: Option<u64>) -> Result<Self, FetchError> {
        Ok(Self::new(WordList::embedded("english")?, seed))
    }
}

impl WordSource for EmbeddedWordSource {
    fn fetch(&self, count: usize) -> Result<Vec<String>, FetchError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| FetchError::Transport("word list sampler poisoned".into()))?;
        let words: Vec<String> = (0..count)
            .filter_map(|_| self.words.choose(&mut *rng).cloned())
            .collect();
        Ok(words)
    }
}

/// Tuning for the word buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedSettings {
    /// Words requested per fetch
    pub batch_size: usize,
    /// Request a refill once this many words or fewer remain
    pub refill_below: usize,
    /// Pause after a failed fetch before trying again
    pub retry_after: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            refill_below: 10,
            retry_after: Duration::from_secs(1),
        }
    }
}

/// A completed fetch, tagged with the generation that asked for it.
#[derive(Debug)]
struct Refill {
    generation: u64,
    result: Result<Vec<String>, FetchError>,
}

/// FIFO buffer of pending words kept topped up from a [`WordSource`].
///
/// Fetches run on a worker thread and come back over a channel that the game
/// loop drains with [`WordFeed::poll`]. At most one fetch is outstanding at a
/// time, and completions from before the last [`WordFeed::reset`] are dropped.
pub struct WordFeed {
    source: Arc<dyn WordSource>,
    settings: FeedSettings,
    buffer: VecDeque<String>,
    fetched: usize,
    in_flight: bool,
    generation: u64,
    cooldown: Duration,
    tx: Sender<Refill>,
    rx: Receiver<Refill>,
}

impl fmt::Debug for WordFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordFeed")
            .field("buffered", &self.buffer.len())
            .field("fetched", &self.fetched)
            .field("in_flight", &self.in_flight)
            .field("generation", &self.generation)
            .finish()
    }
}

impl WordFeed {
    pub fn new(source: Arc<dyn WordSource>, settings: FeedSettings) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            settings,
            buffer: VecDeque::new(),
            fetched: 0,
            in_flight: false,
            generation: 0,
            cooldown: Duration::ZERO,
            tx,
            rx,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_refilling(&self) -> bool {
        self.in_flight
    }

    /// Total words accepted into the buffer since the last reset
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Takes the oldest buffered word, asking for more once no more than
    /// `refill_below` remain. Returns `None` when nothing is buffered yet.
    pub fn pop(&mut self) -> Option<String> {
        let word = self.buffer.pop_front();
        if self.buffer.len() <= self.settings.refill_below {
            self.request_refill();
        }
        word
    }

    /// Starts a background fetch unless one is already running or a failed
    /// fetch is still cooling down. Returns whether a fetch was started.
    pub fn request_refill(&mut self) -> bool {
        if self.in_flight || !self.cooldown.is_zero() {
            return false;
        }

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let generation = self.generation;
        let count = self.settings.batch_size;
        let spawned = thread::Builder::new()
            .name("word-fetch".into())
            .spawn(move || {
                let result = source.fetch(count);
                // receiver gone means the scene was torn down
                let _ = tx.send(Refill { generation, result });
            });

        match spawned {
            Ok(_) => {
                self.in_flight = true;
                true
            }
            Err(e) => {
                log::error!("could not start word fetch: {e}");
                self.cooldown = self.settings.retry_after;
                false
            }
        }
    }

    /// Counts down the retry pause after a failed fetch.
    pub fn advance(&mut self, dt: Duration) {
        self.cooldown = self.cooldown.saturating_sub(dt);
    }

    /// Applies any completed fetches without blocking. Returns how many words
    /// were added.
    pub fn poll(&mut self) -> usize {
        let mut added = 0;
        loop {
            match self.rx.try_recv() {
                Ok(refill) => added += self.accept(refill),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        added
    }

    /// Blocks up to `timeout` for the outstanding fetch to land.
    pub fn wait(&mut self, timeout: Duration) -> usize {
        if !self.in_flight {
            return self.poll();
        }
        match self.rx.recv_timeout(timeout) {
            Ok(refill) => self.accept(refill) + self.poll(),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Drops buffered words and disowns any fetch still in flight.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.buffer.clear();
        self.fetched = 0;
        self.in_flight = false;
        self.cooldown = Duration::ZERO;
    }

    fn accept(&mut self, refill: Refill) -> usize {
        if refill.generation != self.generation {
            log::debug!("ignoring stale word batch from generation {}", refill.generation);
            return 0;
        }
        self.in_flight = false;

        let words = refill.result.and_then(|words| {
            let offered = words.len();
            let words: Vec<String> = words
                .into_iter()
                .map(|w| w.trim().to_string())
                .filter(|w| is_typeable(w))
                .collect();
            if words.len() < offered {
                log::debug!("dropped {} untypeable words", offered - words.len());
            }
            if words.is_empty() {
                Err(FetchError::Empty)
            } else {
                Ok(words)
            }
        });

        match words {
            Ok(words) => {
                let added = words.len();
                self.fetched += added;
                self.buffer.extend(words);
                log::debug!("buffered {added} words ({} pending)", self.buffer.len());
                added
            }
            Err(e) => {
                log::warn!("word fetch failed, retrying in {:?}: {e}", self.settings.retry_after);
                self.cooldown = self.settings.retry_after;
                0
            }
        }
    }
}

/// Only ASCII letters can be typed, so anything else would always be missed.
fn is_typeable(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic())
}
