//! Pointer and floor hit tests for jars

use glam::Vec2;

use super::jar::Jar;

/// Whether the pointer lies on a jar that can still be smashed
pub fn pointer_hits_jar(point: Vec2, jar: &Jar) -> bool {
    jar.is_falling() && jar.bounds().contains(point)
}

/// Whether a falling jar's top edge has passed the floor line
pub fn jar_past_floor(jar: &Jar, floor_y: f32) -> bool {
    jar.is_falling() && jar.pos.y > floor_y
}

/// Index of the jar a click at `point` smashes
///
/// Overlapping jars resolve to the lowest one on screen (closest to being
/// missed); ties go to the oldest.
pub fn click_target(jars: &[Jar], point: Vec2) -> Option<usize> {
    jars.iter()
        .enumerate()
        .filter(|(_, jar)| pointer_hits_jar(point, jar))
        .fold(None, |best: Option<(usize, f32)>, (i, jar)| match best {
            Some((_, y)) if y >= jar.pos.y => best,
            _ => Some((i, jar.pos.y)),
        })
        .map(|(i, _)| i)
}
