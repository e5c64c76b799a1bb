//! AI state machine component.
//!
//! Each AI entity carries named states with data-driven behaviors and a
//! list of guarded transitions evaluated in insertion order, one step per
//! frame, by [`aistate`](crate::systems::aistate). The projectile flag
//! marks an entity that was thrown: while set, the state update is
//! skipped and the entity damages on contact instead of chasing.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Built-in state names.
pub const STATE_IDLE: &str = "Idle";
pub const STATE_CHASE: &str = "Chase";
pub const STATE_FLEE: &str = "Flee";

/// Heavy chase sub-machine tuning.
pub const HEAVY_CHARGE_TIME: f32 = 1.2;
pub const HEAVY_LEAP_TIME: f32 = 0.4;
pub const HEAVY_COOLDOWN_TIME: f32 = 0.8;
pub const HEAVY_LEAP_SPEED_MULT: f32 = 3.5;
/// Distance at which a Heavy stops approaching and starts charging.
pub const HEAVY_CHARGE_RANGE: f32 = 220.0;

/// Bomb chase tuning: speed boost inside the proximity radius.
pub const BOMB_BOOST_RADIUS: f32 = 160.0;
pub const BOMB_BOOST_MULT: f32 = 2.5;

/// Enemy kinds understood by the scheduler, missions, and spawners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Light,
    Heavy,
    Bomb,
}

impl EnemyKind {
    /// Wire code used by the event persistence file.
    pub fn to_i32(self) -> i32 {
        match self {
            EnemyKind::Light => 0,
            EnemyKind::Heavy => 1,
            EnemyKind::Bomb => 2,
        }
    }

    pub fn from_i32(code: i32) -> Option<EnemyKind> {
        match code {
            0 => Some(EnemyKind::Light),
            1 => Some(EnemyKind::Heavy),
            2 => Some(EnemyKind::Bomb),
            _ => None,
        }
    }

    /// Registered tag carried by entities of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            EnemyKind::Light => "LightEnemy",
            EnemyKind::Heavy => "HeavyEnemy",
            EnemyKind::Bomb => "BombEnemy",
        }
    }

    pub fn from_tag(tag: &str) -> Option<EnemyKind> {
        match tag {
            "LightEnemy" => Some(EnemyKind::Light),
            "HeavyEnemy" => Some(EnemyKind::Heavy),
            "BombEnemy" => Some(EnemyKind::Bomb),
            _ => None,
        }
    }
}

/// Chase movement variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChaseStyle {
    /// Straight pursuit at move speed.
    Plain,
    /// Charge-up / leap / cooldown sub-machine with blink feedback.
    Heavy,
    /// Speed boost inside a proximity radius.
    Bomb,
}

/// What a state does while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    Idle,
    Chase(ChaseStyle),
    Flee,
}

/// A registered state: a name bound to a behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDef {
    pub name: String,
    pub behavior: Behavior,
}

/// Transition predicate, evaluated against the machine's entity each
/// frame. Data-driven so state machines serialize with the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Guard {
    /// Chase target exists and is within `radius` of the entity.
    TargetWithin { radius: f32 },
    /// Chase target is missing or farther than `radius`.
    TargetBeyond { radius: f32 },
    /// Health fraction (hp / max) strictly below `fraction`.
    HealthBelow { fraction: f32 },
    /// Health fraction at or above `fraction`.
    HealthAtLeast { fraction: f32 },
    /// The flee timer has accumulated at least `seconds`.
    FleeTimerElapsed { seconds: f32 },
}

/// A guarded transition to a named state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub to: String,
    pub guard: Guard,
}

/// Phase of the Heavy chase sub-machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HeavyPhase {
    Approach,
    ChargeUp { remaining: f32 },
    Leap { remaining: f32 },
    Cooldown { remaining: f32 },
}

impl Default for HeavyPhase {
    fn default() -> Self {
        HeavyPhase::Approach
    }
}

/// AI state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiStateMachine {
    /// Name of the current state.
    pub current: String,
    /// Registered states. Built-ins are Idle, Chase, Flee; more may be
    /// pushed by gameplay code.
    pub states: Vec<StateDef>,
    /// Guarded transitions in insertion order; first true guard wins.
    #[serde(default)]
    pub transitions: Vec<Transition>,
    /// Chase target; weak, validated against the arena every use.
    #[serde(skip)]
    pub target: Option<EntityId>,
    /// Base move speed in world units per second.
    pub move_speed: f32,
    /// True while the entity is a thrown projectile.
    #[serde(default)]
    pub is_projectile: bool,
    /// Configured projectile lifetime in seconds.
    #[serde(default)]
    pub projectile_lifetime: f32,
    /// Seconds left on the current projectile flight.
    #[serde(default)]
    pub projectile_remaining: f32,
    /// Seconds accumulated in the Flee state.
    #[serde(default)]
    pub flee_timer: f32,
    /// Heavy chase sub-machine phase.
    #[serde(default)]
    pub heavy_phase: HeavyPhase,
    /// Seconds until the next blink toggle while charging.
    #[serde(default)]
    pub blink_timer: f32,
    /// Blink visibility latch toggled by the charge feedback.
    #[serde(default)]
    pub blink_on: bool,
}

impl AiStateMachine {
    /// Machine with the built-in states and a plain chase.
    pub fn new(move_speed: f32) -> Self {
        Self::with_chase_style(move_speed, ChaseStyle::Plain)
    }

    /// Machine whose Chase state uses the variant for `kind`.
    pub fn for_kind(kind: EnemyKind, move_speed: f32) -> Self {
        let style = match kind {
            EnemyKind::Light => ChaseStyle::Plain,
            EnemyKind::Heavy => ChaseStyle::Heavy,
            EnemyKind::Bomb => ChaseStyle::Bomb,
        };
        Self::with_chase_style(move_speed, style)
    }

    fn with_chase_style(move_speed: f32, style: ChaseStyle) -> Self {
        Self {
            current: STATE_IDLE.to_string(),
            states: vec![
                StateDef {
                    name: STATE_IDLE.to_string(),
                    behavior: Behavior::Idle,
                },
                StateDef {
                    name: STATE_CHASE.to_string(),
                    behavior: Behavior::Chase(style),
                },
                StateDef {
                    name: STATE_FLEE.to_string(),
                    behavior: Behavior::Flee,
                },
            ],
            transitions: Vec::new(),
            target: None,
            move_speed,
            is_projectile: false,
            projectile_lifetime: 0.0,
            projectile_remaining: 0.0,
            flee_timer: 0.0,
            heavy_phase: HeavyPhase::Approach,
            blink_timer: 0.0,
            blink_on: false,
        }
    }

    pub fn with_transition(mut self, to: impl Into<String>, guard: Guard) -> Self {
        self.transitions.push(Transition {
            to: to.into(),
            guard,
        });
        self
    }

    /// Register or replace a named state.
    pub fn register_state(&mut self, name: impl Into<String>, behavior: Behavior) {
        let name = name.into();
        if let Some(def) = self.states.iter_mut().find(|s| s.name == name) {
            def.behavior = behavior;
        } else {
            self.states.push(StateDef { name, behavior });
        }
    }

    /// Behavior of the current state; unknown state names act as Idle.
    pub fn current_behavior(&self) -> Behavior {
        self.states
            .iter()
            .find(|s| s.name == self.current)
            .map(|s| s.behavior)
            .unwrap_or(Behavior::Idle)
    }

    /// Transition to `name`. Same-state transitions are a no-op; otherwise
    /// exit bookkeeping runs for the old state and enter bookkeeping for
    /// the new one.
    pub fn set_state(&mut self, name: &str) {
        if self.current == name {
            return;
        }
        // Exit: drop per-state scratch state.
        match self.current_behavior() {
            Behavior::Chase(ChaseStyle::Heavy) => {
                self.heavy_phase = HeavyPhase::Approach;
                self.blink_timer = 0.0;
                self.blink_on = false;
            }
            Behavior::Flee => self.flee_timer = 0.0,
            _ => {}
        }
        self.current = name.to_string();
        // Enter: fresh scratch state for the new behavior.
        match self.current_behavior() {
            Behavior::Chase(ChaseStyle::Heavy) => self.heavy_phase = HeavyPhase::Approach,
            Behavior::Flee => self.flee_timer = 0.0,
            _ => {}
        }
    }

    /// Mark the entity as a launched projectile for `lifetime` seconds.
    pub fn launch_projectile(&mut self, lifetime: f32) {
        self.is_projectile = true;
        self.projectile_lifetime = lifetime;
        self.projectile_remaining = lifetime;
    }

    /// Clear the projectile flag and its timer.
    pub fn clear_projectile(&mut self) {
        self.is_projectile = false;
        self.projectile_remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_states_registered() {
        let sm = AiStateMachine::new(100.0);
        assert_eq!(sm.current, STATE_IDLE);
        assert_eq!(sm.states.len(), 3);
        assert_eq!(sm.current_behavior(), Behavior::Idle);
    }

    #[test]
    fn set_state_same_is_noop() {
        let mut sm = AiStateMachine::new(100.0);
        sm.flee_timer = 3.0;
        sm.set_state(STATE_IDLE);
        assert_eq!(sm.flee_timer, 3.0);
    }

    #[test]
    fn set_state_resets_scratch_on_enter() {
        let mut sm = AiStateMachine::for_kind(EnemyKind::Heavy, 80.0);
        sm.set_state(STATE_CHASE);
        sm.heavy_phase = HeavyPhase::Leap { remaining: 0.2 };
        sm.set_state(STATE_FLEE);
        assert_eq!(sm.heavy_phase, HeavyPhase::Approach);
        sm.flee_timer = 1.0;
        sm.set_state(STATE_CHASE);
        assert_eq!(sm.current_behavior(), Behavior::Chase(ChaseStyle::Heavy));
        assert_eq!(sm.heavy_phase, HeavyPhase::Approach);
    }

    #[test]
    fn register_state_replaces_existing() {
        let mut sm = AiStateMachine::new(100.0);
        sm.register_state(STATE_CHASE, Behavior::Chase(ChaseStyle::Bomb));
        assert_eq!(sm.states.len(), 3);
        sm.set_state(STATE_CHASE);
        assert_eq!(sm.current_behavior(), Behavior::Chase(ChaseStyle::Bomb));
    }

    #[test]
    fn enemy_kind_codes_round_trip() {
        for kind in [EnemyKind::Light, EnemyKind::Heavy, EnemyKind::Bomb] {
            assert_eq!(EnemyKind::from_i32(kind.to_i32()), Some(kind));
            assert_eq!(EnemyKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(EnemyKind::from_i32(99), None);
    }

    #[test]
    fn projectile_launch_and_clear() {
        let mut sm = AiStateMachine::new(100.0);
        sm.launch_projectile(4.0);
        assert!(sm.is_projectile);
        assert_eq!(sm.projectile_remaining, 4.0);
        sm.clear_projectile();
        assert!(!sm.is_projectile);
    }
}
