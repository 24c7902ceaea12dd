use crate::entity::{EntityId, Registry};

/// A key the game cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Letter(char),
    Backspace,
    /// Space or Enter
    Commit,
}

/// What a keystroke did to the typing state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypingOutcome {
    Edited,
    /// Commit matched a live word
    Matched(EntityId),
    /// Commit of non-empty input that matched nothing
    NoMatch(String),
    /// Commit with nothing typed
    Empty,
}

/// Text typed so far plus the word it is aimed at.
///
/// `target` is a non-owning handle: it is looked up in the registry when
/// needed and simply resolves to nothing once the word is gone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypingState {
    input: String,
    target: Option<EntityId>,
}

impl TypingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.target = None;
    }

    /// Forget the target if it points at `id`.
    pub fn release(&mut self, id: EntityId) {
        if self.target == Some(id) {
            self.target = None;
        }
    }

    /// Applies one keystroke. Letters are stored lowercased; non-letters
    /// passed as `Letter` are ignored.
    pub fn apply(&mut self, key: Keystroke, registry: &Registry) -> TypingOutcome {
        let outcome = match key {
            Keystroke::Letter(c) => {
                if c.is_ascii_alphabetic() {
                    self.input.push(c.to_ascii_lowercase());
                }
                TypingOutcome::Edited
            }
            Keystroke::Backspace => {
                self.input.pop();
                TypingOutcome::Edited
            }
            Keystroke::Commit => {
                let typed = std::mem::take(&mut self.input);
                self.target = None;
                if typed.is_empty() {
                    return TypingOutcome::Empty;
                }
                return match registry.find_exact(&typed) {
                    Some(id) => TypingOutcome::Matched(id),
                    None => TypingOutcome::NoMatch(typed),
                };
            }
        };

        // The target is chosen from the first letter only and then kept for
        // longer input, even if the prefix stops matching.
        if self.input.chars().count() == 1 {
            if let Some(id) = registry.find_prefix(&self.input) {
                self.target = Some(id);
            }
        }
        outcome
    }
}
