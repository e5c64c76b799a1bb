//! Per-frame simulation passes.
//!
//! Systems are free functions over the entity factory and the resources
//! they need; the engine calls them in a fixed order each frame (intent,
//! integration, collision, Y-sort, despawn). None of them despawn
//! entities directly; everything funnels through the despawn queue.
//!
//! Submodules overview:
//! - [`playercontrol`] – player intent, grab/suction/hold/throw
//! - [`aistate`] – AI state stepping, projectile timers, bounds check
//! - [`spawnpoints`] – Spawner component ticking
//! - [`movement`] – rigid-body integration over fixed sub-steps
//! - [`collision`] – broad phase, narrow phase, role-based resolution
//! - [`animator`] – animation clock and parameter rules
//! - [`ysort`] – sprite layer reassignment by world y
//! - [`despawn`] – delayed-destroy bookkeeping

pub mod aistate;
pub mod animator;
pub mod collision;
pub mod despawn;
pub mod movement;
pub mod playercontrol;
pub mod spawnpoints;
pub mod ysort;
