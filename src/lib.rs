// Library surface for the binary, headless drivers and integration tests.
// Nothing in here touches the terminal except runtime's crossterm source.
pub mod app_dirs;
pub mod config;
pub mod difficulty;
pub mod effects;
pub mod entity;
pub mod game;
pub mod history;
pub mod metrics;
pub mod runtime;
pub mod spawner;
pub mod typing;
pub mod words;
