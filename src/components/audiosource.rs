//! Per-entity audio bindings.
//!
//! Holds the sound ids an entity may play and the channel handle of the
//! sound currently playing, if any. Actual mixing happens on the audio
//! worker; see [`resources::audio`](crate::resources::audio).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioSource {
    /// Registered sound ids bound to this entity.
    pub sounds: Vec<String>,
    /// Channel handle of the currently playing sound, if the mixer
    /// reported one back.
    #[serde(skip)]
    pub playing_channel: Option<u32>,
}

impl AudioSource {
    pub fn new(sounds: Vec<String>) -> Self {
        Self {
            sounds,
            playing_channel: None,
        }
    }

    pub fn has_sound(&self, id: &str) -> bool {
        self.sounds.iter().any(|s| s == id)
    }
}
