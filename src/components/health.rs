//! Hit points with a damage cooldown and a death latch.

use serde::{Deserialize, Serialize};

/// Action taken when hp reaches zero, beyond the despawn itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeathAction {
    #[default]
    None,
    /// Arm the entity's Explosion component instead of despawning quietly.
    Explode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub hp: f32,
    pub max_hp: f32,
    /// Seconds until the entity can take damage again.
    #[serde(default)]
    pub damage_cooldown: f32,
    /// Cooldown applied after each accepted hit.
    #[serde(default)]
    pub cooldown_duration: f32,
    #[serde(default)]
    pub death_action: DeathAction,
    /// Set once when the death despawn is queued so it never re-fires.
    #[serde(default)]
    pub despawn_latched: bool,
}

impl Health {
    pub fn new(max_hp: f32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            damage_cooldown: 0.0,
            cooldown_duration: 0.0,
            death_action: DeathAction::None,
            despawn_latched: false,
        }
    }

    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown_duration = seconds;
        self
    }

    pub fn with_death_action(mut self, action: DeathAction) -> Self {
        self.death_action = action;
        self
    }

    pub fn fraction(&self) -> f32 {
        if self.max_hp > 0.0 {
            self.hp / self.max_hp
        } else {
            0.0
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Apply damage unless the cooldown is active. Returns true when the
    /// hit landed. Starts the cooldown on a landed hit.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.damage_cooldown > 0.0 || self.despawn_latched {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        self.damage_cooldown = self.cooldown_duration;
        true
    }

    pub fn tick_cooldown(&mut self, dt: f32) {
        if self.damage_cooldown > 0.0 {
            self.damage_cooldown = (self.damage_cooldown - dt).max(0.0);
        }
    }
}
