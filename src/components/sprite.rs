//! Sprite components for world entities and UI elements.
//!
//! The core does not draw anything; sprites carry the animation asset
//! name, frame clock, flips, tint, and render layer that the external
//! renderer consumes after the Y-sort pass.

use serde::{Deserialize, Serialize};

/// RGBA tint, 0-255 per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

fn default_tint() -> Rgba {
    Rgba::WHITE
}

/// World-space sprite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprite {
    /// Name of the animation asset in the asset registry.
    pub animation: String,
    /// Seconds accumulated on the current frame.
    #[serde(default)]
    pub frame_clock: f32,
    /// Current frame index within the animation.
    #[serde(default)]
    pub frame_index: usize,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
    #[serde(default = "default_tint")]
    pub tint: Rgba,
    /// Render layer; higher draws later. Reassigned by the Y-sort pass
    /// for Y-sorted entities.
    #[serde(default)]
    pub layer: i32,
}

impl Sprite {
    pub fn new(animation: impl Into<String>) -> Self {
        Self {
            animation: animation.into(),
            frame_clock: 0.0,
            frame_index: 0,
            flip_x: false,
            flip_y: false,
            tint: Rgba::WHITE,
            layer: 0,
        }
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Switch animation, resetting the frame clock and index. Setting the
    /// same animation again is a no-op so loops are not restarted.
    pub fn set_animation(&mut self, animation: &str) {
        if self.animation != animation {
            self.animation = animation.to_string();
            self.frame_clock = 0.0;
            self.frame_index = 0;
        }
    }
}

/// Screen-space sprite for UI; never Y-sorted, never collides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSprite {
    pub animation: String,
    #[serde(default)]
    pub frame_clock: f32,
    #[serde(default)]
    pub frame_index: usize,
    #[serde(default = "default_tint")]
    pub tint: Rgba,
    /// Render layer within the UI pass.
    #[serde(default)]
    pub layer: i32,
}

impl UiSprite {
    pub fn new(animation: impl Into<String>) -> Self {
        Self {
            animation: animation.into(),
            frame_clock: 0.0,
            frame_index: 0,
            tint: Rgba::WHITE,
            layer: 0,
        }
    }
}
