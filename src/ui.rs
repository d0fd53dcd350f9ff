//! Menu scenes
//!
//! Every on-screen widget is a [`UiElement`]: a rect with an optional label
//! and sprite, an optional click action and an optional binding that
//! refreshes its label each frame. Actions and bindings are plain data; the
//! [`Game`](crate::Game) interprets them.

use glam::Vec2;

use crate::Rect;
use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::render::{Sprite, Surface};
use crate::settings::Channel;
use crate::sim::JarKind;

/// Screens the game can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneId {
    Menu,
    LevelSelect,
    Settings,
    /// Gameplay of level `n`; drawn by its engine, not a menu scene
    Level(usize),
    GameOver,
}

/// What clicking an element does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Open(SceneId),
    IncreaseVolume(Channel),
    DecreaseVolume(Channel),
    ToggleVolume(Channel),
    Exit,
}

/// Label refreshed from game state every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiBinding {
    VolumeLabel(Channel),
    FinalMessage,
    FinalScore,
    /// Best recorded score of level `n`
    BestScore(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiElement {
    pub name: &'static str,
    pub rect: Rect,
    pub label: Option<String>,
    pub sprite: Option<Sprite>,
    pub on_click: Option<UiAction>,
    pub on_update: Option<UiBinding>,
}

impl UiElement {
    fn new(name: &'static str, rect: Rect) -> Self {
        Self {
            name,
            rect,
            label: None,
            sprite: None,
            on_click: None,
            on_update: None,
        }
    }

    pub fn text_button(name: &'static str, label: &str, rect: Rect, action: UiAction) -> Self {
        Self {
            label: Some(label.to_string()),
            sprite: Some(Sprite::Image("button.png")),
            on_click: Some(action),
            ..Self::new(name, rect)
        }
    }

    pub fn image_button(name: &'static str, sprite: Sprite, rect: Rect, action: UiAction) -> Self {
        Self {
            sprite: Some(sprite),
            on_click: Some(action),
            ..Self::new(name, rect)
        }
    }

    /// Label driven entirely by a binding
    pub fn text(name: &'static str, rect: Rect, binding: UiBinding) -> Self {
        Self {
            label: Some(String::new()),
            on_update: Some(binding),
            ..Self::new(name, rect)
        }
    }

    pub fn with_update(mut self, binding: UiBinding) -> Self {
        self.on_update = Some(binding);
        self
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        if let Some(sprite) = self.sprite {
            surface.draw_sprite(sprite, self.rect);
        }
        if let Some(label) = &self.label {
            surface.draw_text(label, self.rect);
        }
    }
}

/// A menu screen
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub caption: &'static str,
    pub background: Sprite,
    pub elements: Vec<UiElement>,
}

const BUTTON_W: f32 = 200.0;
const BUTTON_H: f32 = 50.0;
const ARROW: f32 = 50.0;

/// Centred column button at height `y`
fn column(y: f32) -> Rect {
    Rect::new(PLAYFIELD_WIDTH / 2.0 - BUTTON_W / 2.0, y, BUTTON_W, BUTTON_H)
}

impl Scene {
    pub fn element(&self, name: &str) -> Option<&UiElement> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Action of the topmost clickable element under `point`
    pub fn click(&self, point: Vec2) -> Option<UiAction> {
        self.elements
            .iter()
            .rev()
            .filter(|e| e.rect.contains(point))
            .find_map(|e| e.on_click)
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        surface.draw_sprite(
            self.background,
            Rect::new(0.0, 0.0, PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT),
        );
        for element in &self.elements {
            element.render(surface);
        }
    }

    pub fn menu() -> Self {
        Self {
            caption: "JellySmash Menu",
            background: Sprite::Image("JellyJam.png"),
            elements: vec![
                UiElement::text_button("open", "Start", column(200.0), UiAction::Open(SceneId::LevelSelect)),
                UiElement::text_button("settings", "Settings", column(300.0), UiAction::Open(SceneId::Settings)),
                UiElement::text_button("exit", "Exit", column(400.0), UiAction::Exit),
            ],
        }
    }

    /// One jar button per level, left to right
    pub fn level_select(level_names: &[&str]) -> Self {
        const ICONS: [JarKind; 3] = [JarKind::ScoreC, JarKind::ScoreB, JarKind::ScoreA];
        let slots = level_names.len() as f32 + 1.0;
        let mut elements: Vec<UiElement> = level_names
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let x = (i as f32 + 1.0) * PLAYFIELD_WIDTH / slots;
                UiElement::image_button(
                    "level",
                    Sprite::Jar(ICONS[i % ICONS.len()]),
                    Rect::new(x - 40.0, 300.0, 80.0, 100.0),
                    UiAction::Open(SceneId::Level(i)),
                )
                .with_update(UiBinding::BestScore(i))
            })
            .collect();
        for (element, name) in elements.iter_mut().zip(level_names) {
            element.label = Some((*name).to_string());
        }
        elements.push(UiElement::text_button(
            "back",
            "Back",
            column(500.0),
            UiAction::Open(SceneId::Menu),
        ));
        Self {
            caption: "Level selector",
            background: Sprite::Image("JellyJam.png"),
            elements,
        }
    }

    pub fn settings() -> Self {
        let mut elements = Vec::new();
        for (channel, y) in [(Channel::Music, 200.0), (Channel::Effects, 300.0)] {
            let center = column(y);
            elements.push(UiElement::text_button(
                "decrease",
                "<-",
                Rect::new(center.origin.x - 75.0, y, ARROW, ARROW),
                UiAction::DecreaseVolume(channel),
            ));
            elements.push(
                UiElement::text_button(channel.as_str(), "", center, UiAction::ToggleVolume(channel))
                    .with_update(UiBinding::VolumeLabel(channel)),
            );
            elements.push(UiElement::text_button(
                "increase",
                "->",
                Rect::new(center.origin.x + BUTTON_W + 25.0, y, ARROW, ARROW),
                UiAction::IncreaseVolume(channel),
            ));
        }
        elements.push(UiElement::text_button(
            "back",
            "Back",
            column(400.0),
            UiAction::Open(SceneId::Menu),
        ));
        Self {
            caption: "JellySmash Settings",
            background: Sprite::Image("JellyJam.png"),
            elements,
        }
    }

    pub fn game_over() -> Self {
        Self {
            caption: "Game Over",
            background: Sprite::Background,
            elements: vec![
                UiElement::text("message", column(150.0), UiBinding::FinalMessage),
                UiElement::text("score", column(220.0), UiBinding::FinalScore),
                UiElement::text_button("levels", "Levels", column(320.0), UiAction::Open(SceneId::LevelSelect)),
                UiElement::text_button("menu", "Menu", column(400.0), UiAction::Open(SceneId::Menu)),
            ],
        }
    }
}
