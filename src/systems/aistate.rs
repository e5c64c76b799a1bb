//! AI state stepping.
//!
//! One step per frame for every entity carrying a state machine: validate
//! the chase target, evaluate guarded transitions in order (first true
//! guard wins), then run the current behavior by writing the body's
//! velocity. Entities held or dragged by the player skip their update, as
//! do thrown projectiles, whose flight timer and recovery live here too.
//!
//! The playfield bounds come from the entities tagged `Border`; anything
//! with a state machine that drifts past the expanded bounds is queued for
//! despawn.

use crate::components::ai::{
    AiStateMachine, Behavior, ChaseStyle, Guard, HeavyPhase, BOMB_BOOST_MULT, BOMB_BOOST_RADIUS,
    HEAVY_CHARGE_RANGE, HEAVY_CHARGE_TIME, HEAVY_COOLDOWN_TIME, HEAVY_LEAP_SPEED_MULT,
    HEAVY_LEAP_TIME,
};
use crate::entity::factory::EntityFactory;
use crate::entity::EntityId;
use crate::math::{Aabb, Vec2};
use crate::resources::layers::LayerRegistry;
use crate::resources::worldtime::WorldTime;

/// Speed below which a projectile in flight counts as stopped.
pub const PROJECTILE_STOP_SPEED: f32 = 5.0;
/// Spin applied to a projectile in flight, degrees per second.
pub const PROJECTILE_SPIN_DPS: f32 = 720.0;
/// Extra slack past the border bounds before out-of-bounds despawn.
pub const OOB_DESPAWN_MARGIN: f32 = 64.0;

/// Shortest blink interval at the end of a Heavy charge-up.
const BLINK_MIN_INTERVAL: f32 = 0.05;
const BLINK_SCALE: f32 = 0.25;

/// Tag carried by the playfield border entities.
pub const BORDER_TAG: &str = "Border";

pub fn update_ai(factory: &mut EntityFactory, layers: &LayerRegistry, time: &WorldTime) {
    let dt = time.step_dt();
    if dt <= 0.0 {
        return;
    }

    let player = factory.get_player();
    let player_pos = player.map(|id| factory.world_transform(id).position);
    let (held, dragging) = match player.and_then(|id| factory.get(id)).and_then(|e| e.player()) {
        Some(pc) => (pc.held, pc.dragging),
        None => (None, None),
    };
    let bounds = border_bounds(factory);

    for id in factory.order_snapshot() {
        let Some(entity) = factory.get(id) else {
            continue;
        };
        if entity.pending_despawn || !layers.is_active(&entity.layer) {
            continue;
        }
        if entity.ai().is_none() {
            continue;
        }
        if held == Some(id) || dragging == Some(id) {
            continue;
        }

        let my_pos = factory.world_transform(id).position;
        if let Some(bounds) = bounds {
            if !bounds.contains_point(my_pos) {
                factory.queue_despawn(id);
                continue;
            }
        }

        let is_projectile = factory
            .get(id)
            .and_then(|e| e.ai())
            .map(|ai| ai.is_projectile)
            .unwrap_or(false);
        if is_projectile {
            step_projectile(factory, id, dt);
            continue;
        }

        // Target falls back to the player when missing or destroyed.
        let target = factory
            .get(id)
            .and_then(|e| e.ai())
            .and_then(|ai| ai.target)
            .filter(|t| factory.is_alive(*t))
            .or(player);
        let target_pos = match target {
            Some(t) => Some(factory.world_transform(t).position),
            None => player_pos,
        };
        let distance = target_pos.map(|p| my_pos.distance_to(p));
        let health_fraction = factory
            .get(id)
            .and_then(|e| e.health())
            .map(|h| h.fraction());

        let Some(entity) = factory.get_mut(id) else {
            continue;
        };
        let in_knockback = entity
            .rigidbody()
            .map(|rb| rb.in_knockback)
            .unwrap_or(false);

        let mut leap_kick: Option<Vec2> = None;
        let mut blink: Option<bool> = None;
        {
            let Some(ai) = entity.ai_mut() else {
                continue;
            };
            ai.target = target;

            if let Some(next) = first_passing_transition(ai, distance, health_fraction) {
                ai.set_state(&next);
            }

            match ai.current_behavior() {
                Behavior::Idle => {}
                Behavior::Flee => ai.flee_timer += dt,
                Behavior::Chase(ChaseStyle::Heavy) => {
                    step_heavy_phase(ai, distance, my_pos, target_pos, dt, &mut leap_kick,
                        &mut blink);
                }
                Behavior::Chase(_) => {}
            }
        }

        let behavior = entity.ai().map(|ai| ai.current_behavior());
        let speed = entity.ai().map(|ai| ai.move_speed).unwrap_or(0.0);
        let heavy_phase = entity.ai().map(|ai| ai.heavy_phase);

        if !in_knockback {
            let velocity = match (behavior, target_pos) {
                (Some(Behavior::Chase(ChaseStyle::Plain)), Some(tp)) => {
                    (tp - my_pos).normalized() * speed
                }
                (Some(Behavior::Chase(ChaseStyle::Bomb)), Some(tp)) => {
                    let dir = (tp - my_pos).normalized();
                    let boost = if my_pos.distance_to(tp) <= BOMB_BOOST_RADIUS {
                        BOMB_BOOST_MULT
                    } else {
                        1.0
                    };
                    dir * speed * boost
                }
                (Some(Behavior::Chase(ChaseStyle::Heavy)), Some(tp)) => {
                    match heavy_phase {
                        Some(HeavyPhase::Approach) => (tp - my_pos).normalized() * speed,
                        Some(HeavyPhase::Leap { .. }) => {
                            // Direction locked at leap start; keep coasting.
                            match leap_kick {
                                Some(kick) => kick,
                                None => entity
                                    .rigidbody()
                                    .map(|rb| rb.velocity)
                                    .unwrap_or(Vec2::ZERO),
                            }
                        }
                        _ => Vec2::ZERO,
                    }
                }
                (Some(Behavior::Flee), Some(tp)) => (my_pos - tp).normalized() * speed,
                _ => Vec2::ZERO,
            };
            if let Some(rb) = entity.rigidbody_mut() {
                rb.velocity = velocity;
            }
        }

        if let Some(on) = blink {
            if let Some(animator) = entity.animator_mut() {
                animator.set_flag("blink", on);
            }
        }
    }
}

/// Union of all border collider AABBs, expanded by the despawn margin.
/// None when the scene has no borders, in which case nothing despawns for
/// being out of bounds.
fn border_bounds(factory: &EntityFactory) -> Option<Aabb> {
    let mut bounds: Option<Aabb> = None;
    for id in factory.find_by_tag(BORDER_TAG) {
        let Some(entity) = factory.get(id) else {
            continue;
        };
        let Some(collider) = entity.collider() else {
            continue;
        };
        let aabb = collider.world_aabb(&factory.world_transform(id));
        bounds = Some(match bounds {
            Some(b) => b.union(&aabb),
            None => aabb,
        });
    }
    bounds.map(|b| b.expanded(OOB_DESPAWN_MARGIN))
}

fn first_passing_transition(
    ai: &AiStateMachine,
    distance: Option<f32>,
    health_fraction: Option<f32>,
) -> Option<String> {
    for transition in &ai.transitions {
        if transition.to == ai.current {
            continue;
        }
        let passes = match transition.guard {
            Guard::TargetWithin { radius } => distance.map(|d| d <= radius).unwrap_or(false),
            Guard::TargetBeyond { radius } => distance.map(|d| d > radius).unwrap_or(true),
            Guard::HealthBelow { fraction } => {
                health_fraction.map(|f| f < fraction).unwrap_or(false)
            }
            Guard::HealthAtLeast { fraction } => {
                health_fraction.map(|f| f >= fraction).unwrap_or(true)
            }
            Guard::FleeTimerElapsed { seconds } => ai.flee_timer >= seconds,
        };
        if passes {
            return Some(transition.to.clone());
        }
    }
    None
}

/// Heavy chase sub-machine: approach until in range, stand and charge with
/// accelerating blink feedback, leap at a locked direction, then cool down.
fn step_heavy_phase(
    ai: &mut AiStateMachine,
    distance: Option<f32>,
    my_pos: Vec2,
    target_pos: Option<Vec2>,
    dt: f32,
    leap_kick: &mut Option<Vec2>,
    blink: &mut Option<bool>,
) {
    match ai.heavy_phase {
        HeavyPhase::Approach => {
            if distance.map(|d| d <= HEAVY_CHARGE_RANGE).unwrap_or(false) {
                ai.heavy_phase = HeavyPhase::ChargeUp {
                    remaining: HEAVY_CHARGE_TIME,
                };
                ai.blink_timer = 0.0;
                ai.blink_on = false;
            }
        }
        HeavyPhase::ChargeUp { remaining } => {
            let remaining = remaining - dt;
            ai.blink_timer -= dt;
            if ai.blink_timer <= 0.0 {
                ai.blink_on = !ai.blink_on;
                // Blink quickens as the charge completes.
                let fraction = (remaining / HEAVY_CHARGE_TIME).max(0.0);
                ai.blink_timer = BLINK_MIN_INTERVAL + BLINK_SCALE * fraction;
                *blink = Some(ai.blink_on);
            }
            if remaining <= 0.0 {
                ai.heavy_phase = HeavyPhase::Leap {
                    remaining: HEAVY_LEAP_TIME,
                };
                ai.blink_on = false;
                *blink = Some(false);
                if let Some(tp) = target_pos {
                    *leap_kick =
                        Some((tp - my_pos).normalized() * ai.move_speed * HEAVY_LEAP_SPEED_MULT);
                }
            } else {
                ai.heavy_phase = HeavyPhase::ChargeUp { remaining };
            }
        }
        HeavyPhase::Leap { remaining } => {
            let remaining = remaining - dt;
            ai.heavy_phase = if remaining <= 0.0 {
                HeavyPhase::Cooldown {
                    remaining: HEAVY_COOLDOWN_TIME,
                }
            } else {
                HeavyPhase::Leap { remaining }
            };
        }
        HeavyPhase::Cooldown { remaining } => {
            let remaining = remaining - dt;
            ai.heavy_phase = if remaining <= 0.0 {
                HeavyPhase::Approach
            } else {
                HeavyPhase::Cooldown { remaining }
            };
        }
    }
}

/// Tick a projectile's flight. The flag clears on timer expiry or when the
/// body has slowed to a stop; recovery restores the collider shape, the
/// upright rotation, and the animator parameters.
fn step_projectile(factory: &mut EntityFactory, id: EntityId, dt: f32) {
    let Some(entity) = factory.get_mut(id) else {
        return;
    };
    let speed = entity
        .rigidbody()
        .map(|rb| rb.velocity.length())
        .unwrap_or(0.0);
    let expired = {
        let Some(ai) = entity.ai_mut() else {
            return;
        };
        ai.projectile_remaining -= dt;
        ai.projectile_remaining <= 0.0 || speed < PROJECTILE_STOP_SPEED
    };
    if expired {
        if let Some(ai) = entity.ai_mut() {
            ai.clear_projectile();
        }
        if let Some(collider) = entity.collider_mut() {
            collider.restore_original();
        }
        if let Some(t) = entity.transform_mut() {
            t.rotation = 0.0;
        }
        if let Some(animator) = entity.animator_mut() {
            animator.reset_params();
        }
    } else if let Some(t) = entity.transform_mut() {
        t.rotation += PROJECTILE_SPIN_DPS * dt;
    }
}
