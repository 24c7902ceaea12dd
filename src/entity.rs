//! Word entities, the registry that owns them and the per-tick systems that
//! move them around.

use std::collections::BTreeMap;
use std::time::Duration;

use unicode_width::UnicodeWidthStr;

/// Handle for a live word. Ids grow monotonically, so ordering by id is
/// spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct WordEntity {
    pub text: String,
    /// Left edge of the word, in cells
    pub x: f64,
    pub y: f64,
    /// Leftward speed in cells per second
    pub speed: f64,
}

impl WordEntity {
    pub fn width(&self) -> f64 {
        self.text.width() as f64
    }

    /// Whether the cell at (`x`, `y`) falls inside this word's text box.
    pub fn covers(&self, x: f64, y: f64) -> bool {
        y.floor() == self.y.floor() && x >= self.x.floor() && x < self.x.floor() + self.width()
    }
}

/// The player's marker in the play area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avatar {
    pub x: f64,
    pub y: f64,
}

/// Size of the play area in cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Arena {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Row the avatar rests on when it is not jumping.
    pub fn ground(&self) -> f64 {
        (self.height - 1.0).max(0.0)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(80.0, 20.0)
    }
}

/// Live words keyed by id.
#[derive(Debug, Default)]
pub struct Registry {
    words: BTreeMap<EntityId, WordEntity>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: WordEntity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.words.insert(id, word);
        id
    }

    pub fn remove(&mut self, id: EntityId) -> Option<WordEntity> {
        self.words.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&WordEntity> {
        self.words.get(&id)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Live words in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &WordEntity)> {
        self.words.iter().map(|(id, w)| (*id, w))
    }

    /// First word, in spawn order, whose text equals `input` ignoring case.
    pub fn find_exact(&self, input: &str) -> Option<EntityId> {
        let input = input.to_lowercase();
        self.iter()
            .find(|(_, w)| w.text.to_lowercase() == input)
            .map(|(id, _)| id)
    }

    /// First word, in spawn order, starting with `prefix` ignoring case.
    pub fn find_prefix(&self, prefix: &str) -> Option<EntityId> {
        let prefix = prefix.to_lowercase();
        self.iter()
            .find(|(_, w)| w.text.to_lowercase().starts_with(&prefix))
            .map(|(id, _)| id)
    }
}

/// Moves every word left by its speed and lets the avatar fall back toward
/// the ground row.
pub fn motion(registry: &mut Registry, avatar: &mut Avatar, arena: &Arena, fall_speed: f64, dt: Duration) {
    let secs = dt.as_secs_f64();
    for word in registry.words.values_mut() {
        word.x -= word.speed * secs;
    }
    let ground = arena.ground();
    if avatar.y < ground {
        avatar.y = (avatar.y + fall_speed * secs).min(ground);
    }
}

/// Ids of words currently overlapping the avatar, in spawn order.
pub fn collisions(registry: &Registry, avatar: &Avatar) -> Vec<EntityId> {
    registry
        .iter()
        .filter(|(_, w)| w.covers(avatar.x.floor(), avatar.y))
        .map(|(id, _)| id)
        .collect()
}

/// Removes and returns words that have crossed the left edge.
pub fn misses(registry: &mut Registry) -> Vec<(EntityId, WordEntity)> {
    let gone: Vec<EntityId> = registry
        .iter()
        .filter(|(_, w)| w.x < 0.0)
        .map(|(id, _)| id)
        .collect();
    gone.into_iter()
        .filter_map(|id| registry.remove(id).map(|w| (id, w)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f64, y: f64, speed: f64) -> WordEntity {
        WordEntity {
            text: text.to_string(),
            x,
            y,
            speed,
        }
    }

    #[test]
    fn ids_follow_spawn_order() {
        let mut reg = Registry::new();
        let a = reg.insert(word("car", 10.0, 1.0, 1.0));
        let b = reg.insert(word("cat", 10.0, 2.0, 1.0));
        assert!(a < b);
        let order: Vec<_> = reg.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn exact_match_ignores_case() {
        let mut reg = Registry::new();
        reg.insert(word("car", 10.0, 1.0, 1.0));
        let cat = reg.insert(word("Cat", 10.0, 2.0, 1.0));
        assert_eq!(reg.find_exact("cAT"), Some(cat));
        assert_eq!(reg.find_exact("ca"), None);
    }

    #[test]
    fn prefix_match_takes_first_spawned() {
        let mut reg = Registry::new();
        let car = reg.insert(word("car", 10.0, 1.0, 1.0));
        reg.insert(word("cat", 10.0, 2.0, 1.0));
        assert_eq!(reg.find_prefix("C"), Some(car));
        assert_eq!(reg.find_prefix("z"), None);
    }

    #[test]
    fn motion_moves_left_by_speed() {
        let mut reg = Registry::new();
        let id = reg.insert(word("dog", 50.0, 3.0, 10.0));
        let arena = Arena::new(80.0, 20.0);
        let mut avatar = Avatar { x: 40.0, y: 19.0 };
        motion(&mut reg, &mut avatar, &arena, 30.0, Duration::from_millis(500));
        assert_eq!(reg.get(id).map(|w| w.x), Some(45.0));
    }

    #[test]
    fn avatar_settles_on_ground() {
        let mut reg = Registry::new();
        let arena = Arena::new(80.0, 20.0);
        let mut avatar = Avatar { x: 40.0, y: 5.0 };
        motion(&mut reg, &mut avatar, &arena, 10.0, Duration::from_secs(1));
        assert_eq!(avatar.y, 15.0);
        motion(&mut reg, &mut avatar, &arena, 10.0, Duration::from_secs(1));
        assert_eq!(avatar.y, 19.0);
    }

    #[test]
    fn misses_remove_words_past_left_edge() {
        let mut reg = Registry::new();
        let gone = reg.insert(word("gone", -0.5, 1.0, 1.0));
        let kept = reg.insert(word("kept", 0.0, 1.0, 1.0));
        let missed = misses(&mut reg);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].0, gone);
        assert!(reg.get(kept).is_some());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn collision_uses_text_box() {
        let mut reg = Registry::new();
        let hit = reg.insert(word("apple", 10.0, 4.0, 1.0));
        reg.insert(word("pear", 10.0, 6.0, 1.0));
        let avatar = Avatar { x: 12.3, y: 4.6 };
        assert_eq!(collisions(&reg, &avatar), vec![hit]);
        let avatar = Avatar { x: 15.0, y: 4.0 };
        assert!(collisions(&reg, &avatar).is_empty());
    }
}
