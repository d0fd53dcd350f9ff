//! Draw surface abstraction
//!
//! Rendering technique is up to the host. The game describes each frame as
//! a list of sprite and text draws in playfield coordinates.

use crate::Rect;
use crate::sim::JarKind;

/// Everything the game knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Background,
    Belt,
    Heart,
    PauseButton,
    Jar(JarKind),
    /// Break animation frame `step` (0-based) of a jar
    BrokenJar(JarKind, u8),
    /// Any other named image (menu buttons)
    Image(&'static str),
}

impl Sprite {
    /// Asset file name for hosts that load images from disk
    pub fn file_name(&self) -> String {
        match self {
            Sprite::Background => "bg.png".to_string(),
            Sprite::Belt => "belt.png".to_string(),
            Sprite::Heart => "redHeart.png".to_string(),
            Sprite::PauseButton => "pauseButton.png".to_string(),
            Sprite::Jar(kind) => format!("{}Jar.png", kind.sprite_stem()),
            Sprite::BrokenJar(kind, step) => format!("{}JarBreak{}.png", kind.sprite_stem(), step),
            Sprite::Image(name) => (*name).to_string(),
        }
    }
}

/// Render target supplied by the host
pub trait Surface {
    fn draw_sprite(&mut self, sprite: Sprite, rect: Rect);
    fn draw_text(&mut self, text: &str, rect: Rect);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Sprite(Sprite, Rect),
    Text(String, Rect),
}

/// Surface that records draw calls instead of rasterising them
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn sprites(&self) -> impl Iterator<Item = (Sprite, Rect)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Sprite(s, r) => Some((*s, *r)),
            DrawCommand::Text(..) => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text(t, _) => Some(t.as_str()),
            DrawCommand::Sprite(..) => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn draw_sprite(&mut self, sprite: Sprite, rect: Rect) {
        self.commands.push(DrawCommand::Sprite(sprite, rect));
    }

    fn draw_text(&mut self, text: &str, rect: Rect) {
        self.commands.push(DrawCommand::Text(text.to_string(), rect));
    }
}
