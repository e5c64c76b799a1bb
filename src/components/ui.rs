//! UI components: buttons and text labels.
//!
//! The in-editor GUI and the renderer live outside the core; these
//! components only carry layout data and the script hook the outer layers
//! dispatch on when a button is activated.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Action hook fired when a button is activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonHook {
    StartGame,
    ExitGame,
    ResumeGame,
    LoadScene,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Button {
    /// Screen-space size of the clickable area.
    pub size: Vec2,
    pub hook: ButtonHook,
    #[serde(default)]
    pub enabled: bool,
}

impl Button {
    pub fn new(size: Vec2, hook: ButtonHook) -> Self {
        Self {
            size,
            hook,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    /// Font asset name in the asset registry.
    pub font: String,
    pub font_size: f32,
}

impl Label {
    pub fn new(text: impl Into<String>, font: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font: font.into(),
            font_size,
        }
    }
}
