use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

/// Visual flourish requested by the game. Fire-and-forget: nothing in the
/// game reads them back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Confetti { x: f64, y: f64 },
    Kaboom { x: f64, y: f64 },
}

/// Knobs for a confetti burst, in cell units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfettiStyle {
    pub count: usize,
    pub gravity: f64,
    /// Velocity multiplier applied each update
    pub air_drag: f64,
    pub velocity: (f64, f64),
    /// Degrees; 0 points straight up
    pub heading: f64,
    pub spread: f64,
    /// Opacity lost per second
    pub fade: f64,
    pub lifespan: f64,
}

impl Default for ConfettiStyle {
    fn default() -> Self {
        Self {
            count: 24,
            gravity: 40.0,
            air_drag: 0.9,
            velocity: (30.0, 80.0),
            heading: 0.0,
            spread: 60.0,
            fade: 0.3,
            lifespan: 4.0,
        }
    }
}

const CONFETTI_SYMBOLS: [char; 6] = ['*', '+', '.', 'o', '~', '#'];
const KABOOM_SECS: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub opacity: f64,
    pub age: f64,
    pub max_age: f64,
}

impl Particle {
    fn update(&mut self, dt: f64, style: &ConfettiStyle) -> bool {
        self.vel_y += style.gravity * dt;
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.opacity -= style.fade * dt;
        self.vel_x *= style.air_drag;
        self.vel_y *= style.air_drag;
        self.age += dt;
        self.age < self.max_age && self.opacity > 0.0
    }
}

/// Short-lived explosion marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flash {
    pub x: f64,
    pub y: f64,
    pub age: f64,
}

/// Live particles and flashes, advanced by the frontend's tick.
#[derive(Debug, Default)]
pub struct EffectLayer {
    pub particles: Vec<Particle>,
    pub flashes: Vec<Flash>,
    style: ConfettiStyle,
}

impl EffectLayer {
    pub fn new(style: ConfettiStyle) -> Self {
        Self {
            particles: Vec::new(),
            flashes: Vec::new(),
            style,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.particles.is_empty() || !self.flashes.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.flashes.clear();
    }

    pub fn play<R: Rng>(&mut self, effect: Effect, rng: &mut R) {
        match effect {
            Effect::Confetti { x, y } => self.burst(x, y, rng),
            Effect::Kaboom { x, y } => self.flashes.push(Flash { x, y, age: 0.0 }),
        }
    }

    fn burst<R: Rng>(&mut self, x: f64, y: f64, rng: &mut R) {
        let style = self.style;
        for _ in 0..style.count {
            // screen y grows downward, so "up" is -90 degrees
            let heading = style.heading - 90.0 + rng.gen_range(-style.spread / 2.0..=style.spread / 2.0);
            let speed = rng.gen_range(style.velocity.0..=style.velocity.1);
            let rad = heading.to_radians();
            self.particles.push(Particle {
                x,
                y,
                // cells are about twice as tall as wide
                vel_x: rad.cos() * speed,
                vel_y: rad.sin() * speed / 2.0,
                symbol: *CONFETTI_SYMBOLS.choose(rng).unwrap_or(&'*'),
                color_index: rng.gen_range(0..7),
                opacity: 1.0,
                age: 0.0,
                max_age: style.lifespan,
            });
        }
    }

    /// Advances everything by `dt`, dropping particles that have faded or
    /// left the `width` x `height` area.
    pub fn update(&mut self, dt: Duration, width: f64, height: f64) {
        let secs = dt.as_secs_f64();
        let style = self.style;
        let buffer = 5.0;
        self.particles.retain_mut(|p| {
            let alive = p.update(secs, &style);
            let off_screen = p.y > height + buffer || p.x < -buffer || p.x > width + buffer;
            alive && !off_screen
        });
        self.flashes.retain_mut(|f| {
            f.age += secs;
            f.age < KABOOM_SECS
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn confetti_bursts_upward_then_falls() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut layer = EffectLayer::new(ConfettiStyle::default());
        layer.play(Effect::Confetti { x: 40.0, y: 10.0 }, &mut rng);
        assert_eq!(layer.particles.len(), 24);
        assert!(layer.particles.iter().all(|p| p.vel_y < 0.0));

        layer.update(Duration::from_millis(50), 80.0, 24.0);
        assert!(layer.particles.iter().any(|p| p.y < 10.0));

        for _ in 0..40 {
            layer.update(Duration::from_millis(50), 80.0, 24.0);
        }
        assert!(layer.particles.iter().all(|p| p.vel_y > 0.0));
    }

    #[test]
    fn particles_expire() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut layer = EffectLayer::new(ConfettiStyle::default());
        layer.play(Effect::Confetti { x: 40.0, y: 10.0 }, &mut rng);
        for _ in 0..100 {
            layer.update(Duration::from_millis(50), 80.0, 24.0);
        }
        assert!(layer.particles.is_empty());
    }

    #[test]
    fn kaboom_flash_is_brief() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut layer = EffectLayer::default();
        layer.play(Effect::Kaboom { x: 1.0, y: 1.0 }, &mut rng);
        assert!(layer.is_active());
        layer.update(Duration::from_millis(300), 80.0, 24.0);
        assert_eq!(layer.flashes.len(), 1);
        layer.update(Duration::from_millis(400), 80.0, 24.0);
        assert!(!layer.is_active());
    }
}
