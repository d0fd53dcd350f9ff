//! Demo mode player
//!
//! Produces pointer input the same way a person would: press on the most
//! urgent scoring jar, release, and wait out the click dwell before the
//! next press. Hazards are left to fall.

use glam::Vec2;

use super::input::PointerState;
use super::jar::Jar;
use crate::consts::FRAME_RATE;

#[derive(Debug, Clone)]
pub struct Autoplay {
    /// Frames to wait after a release before pressing again
    cooldown: u32,
    wait: u32,
    held: bool,
    last: Vec2,
}

impl Autoplay {
    pub fn new(click_dwell: f64) -> Self {
        let frames = (click_dwell.max(0.0) * f64::from(FRAME_RATE)).ceil() as u32;
        Self {
            cooldown: frames + 1,
            wait: 0,
            held: false,
            last: Vec2::ZERO,
        }
    }

    /// Pointer state for the next tick, given the jars as they stand now
    pub fn pointer(&mut self, jars: &[Jar]) -> PointerState {
        if self.held {
            self.held = false;
            return PointerState::released_at(self.last);
        }
        if self.wait > 0 {
            self.wait -= 1;
            return PointerState::released_at(self.last);
        }

        // Lowest falling scoring jar is the next one to be missed
        let target = jars
            .iter()
            .filter(|jar| jar.is_falling() && !jar.kind.is_hazard())
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

        match target {
            Some(jar) => {
                self.last = jar.bounds().center();
                self.held = true;
                self.wait = self.cooldown;
                log::trace!("Autoplay clicking jar {} at {:?}", jar.id, self.last);
                PointerState::pressed_at(self.last)
            }
            None => PointerState::released_at(self.last),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::jar::JarKind;

    fn jar(id: u32, kind: JarKind, y: f32) -> Jar {
        let mut jar = Jar::new(id, kind, 0, 100.0 * id as f32);
        jar.pos.y = y;
        jar
    }

    #[test]
    fn test_targets_lowest_scoring_jar() {
        let jars = vec![
            jar(1, JarKind::ScoreA, 100.0),
            jar(2, JarKind::Hazard, 300.0),
            jar(3, JarKind::ScoreC, 200.0),
        ];
        let mut bot = Autoplay::new(0.2);
        let p = bot.pointer(&jars);
        assert!(p.pressed);
        assert_eq!(p.position, jars[2].bounds().center());
    }

    #[test]
    fn test_releases_and_waits_out_dwell() {
        let jars = vec![jar(1, JarKind::ScoreB, 0.0)];
        let mut bot = Autoplay::new(0.2);
        assert!(bot.pointer(&jars).pressed);

        let mut released = 0;
        while !bot.pointer(&jars).pressed {
            released += 1;
            assert!(released < 100);
        }
        // Next press lands strictly after the dwell interval
        assert!(released as f64 / f64::from(FRAME_RATE) > 0.2);
    }

    #[test]
    fn test_idle_without_targets() {
        let jars = vec![jar(1, JarKind::Hazard, 50.0)];
        let mut bot = Autoplay::new(0.2);
        for _ in 0..10 {
            assert!(!bot.pointer(&jars).pressed);
        }
    }
}
