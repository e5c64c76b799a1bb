//! Collision detection and resolution.
//!
//! Broad phase: a uniform grid over the playfield; every collider is
//! bucketed into each cell its AABB overlaps, and candidate pairs come
//! from the same cell plus the E, S, SE, and SW neighbors, deduplicated by
//! ordered id pair. A brute-force mode pairs every collider on active
//! layers and produces the same observable contract.
//!
//! Narrow phase: per-axis overlap of world-space AABBs; the penetration
//! vector carries the overlap on both axes, signed by relative center
//! position, and zero overlap on either axis means no collision (touching
//! edges do not collide).
//!
//! Resolution: collisions sort by descending L1 penetration and each
//! unordered pair resolves at most once per frame, dispatched on the role
//! pair (player / AI / projectile / static). Triggers skip resolution but
//! still report overlaps.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::components::rectcollider::ColliderBox;
use crate::entity::factory::EntityFactory;
use crate::entity::EntityId;
use crate::events::collision::{CollisionEvent, OverlapEvent};
use crate::math::{Aabb, Vec2};
use crate::resources::layers::LayerRegistry;

/// Broad-phase grid cell size in world units. Must stay at or above the
/// largest collider AABB for the containment guarantee to hold.
pub const GRID_CELL_SIZE: f32 = 128.0;

/// Divisor in both contact damage formulas.
pub const DAMAGE_MASS_DIVISOR: f32 = 10.0;
/// Base damage of a projectile hit, scaled by `mass / DAMAGE_MASS_DIVISOR`.
pub const PROJECTILE_BASE_DAMAGE: f32 = 10.0;

/// Tags whose entities keep the projectile flag on impact (and knock the
/// target back instead). Inferred from the original content set; only the
/// heavy enemy behaves this way today.
pub const KEEP_PROJECTILE_TAGS: &[&str] = &["HeavyEnemy"];

/// Impulse applied on player/AI contact.
pub const KNOCKBACK_SPEED: f32 = 260.0;
/// Refractory period started by a knockback impulse.
pub const KNOCKBACK_DURATION: f32 = 0.25;
/// Velocity pulse applied on AI/AI contact.
pub const AI_COUNTER_PULSE: f32 = 60.0;

/// Hit sound ids; one is chosen at random per player hit.
pub const HIT_SFX: &[&str] = &["hit_01", "hit_02", "hit_03"];

/// Broad-phase selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadPhaseMode {
    Grid,
    Brute,
}

/// Role of a collider in the resolution table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRole {
    Player,
    Ai,
    Projectile,
    Static,
}

/// Everything the collision pass wants the engine to do afterwards.
#[derive(Debug, Default)]
pub struct CollisionOutput {
    pub contacts: Vec<CollisionEvent>,
    pub overlaps: Vec<OverlapEvent>,
    /// Sound ids to dispatch through the audio bridge.
    pub sfx: Vec<String>,
    /// World positions where hit VFX should spawn.
    pub vfx: Vec<Vec2>,
}

struct Proxy {
    id: EntityId,
    aabb: Aabb,
    role: BodyRole,
    trigger: bool,
    mass: f32,
    tag: String,
}

/// Detect and resolve all collisions for this frame.
pub fn run_collisions(
    factory: &mut EntityFactory,
    layers: &LayerRegistry,
    mode: BroadPhaseMode,
    rng: &mut fastrand::Rng,
) -> CollisionOutput {
    let proxies = collect_proxies(factory, layers);
    let pairs = match mode {
        BroadPhaseMode::Grid => grid_pairs(&proxies),
        BroadPhaseMode::Brute => brute_pairs(&proxies),
    };

    // Narrow phase over the candidates.
    let mut collisions: Vec<(usize, usize, Vec2)> = Vec::new();
    for (i, j) in pairs {
        if let Some(pen) = proxies[i].aabb.penetration(&proxies[j].aabb) {
            collisions.push((i, j, pen));
        }
    }

    // Deepest first; L1 norm of the penetration vector.
    collisions.sort_by(|a, b| {
        let la = a.2.x.abs() + a.2.y.abs();
        let lb = b.2.x.abs() + b.2.y.abs();
        lb.total_cmp(&la)
    });

    let mut output = CollisionOutput::default();
    for (i, j, pen) in collisions {
        resolve_pair(factory, &proxies, i, j, pen, rng, &mut output);
    }
    output
}

fn collect_proxies(factory: &EntityFactory, layers: &LayerRegistry) -> Vec<Proxy> {
    let mut proxies = Vec::new();
    for id in factory.iter_order() {
        let Some(entity) = factory.get(id) else {
            continue;
        };
        if entity.pending_despawn || !layers.is_active(&entity.layer) {
            continue;
        }
        let Some(collider) = entity.collider() else {
            continue;
        };
        let world = factory.world_transform(id);
        let role = if entity.player().is_some() {
            BodyRole::Player
        } else if let Some(ai) = entity.ai() {
            if ai.is_projectile {
                BodyRole::Projectile
            } else {
                BodyRole::Ai
            }
        } else {
            BodyRole::Static
        };
        proxies.push(Proxy {
            id,
            aabb: collider.world_aabb(&world),
            role,
            trigger: collider.trigger,
            mass: entity.rigidbody().map(|rb| rb.mass()).unwrap_or(1.0),
            tag: entity.tag.clone(),
        });
    }
    proxies
}

fn brute_pairs(proxies: &[Proxy]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..proxies.len() {
        for j in (i + 1)..proxies.len() {
            pairs.push((i, j));
        }
    }
    pairs
}

fn cell_of(x: f32, y: f32) -> (i32, i32) {
    (
        (x / GRID_CELL_SIZE).floor() as i32,
        (y / GRID_CELL_SIZE).floor() as i32,
    )
}

fn grid_pairs(proxies: &[Proxy]) -> Vec<(usize, usize)> {
    let mut buckets: FxHashMap<(i32, i32), Vec<usize>> = FxHashMap::default();
    for (index, proxy) in proxies.iter().enumerate() {
        let (cx0, cy0) = cell_of(proxy.aabb.min.x, proxy.aabb.min.y);
        let (cx1, cy1) = cell_of(proxy.aabb.max.x, proxy.aabb.max.y);
        for cx in cx0..=cx1 {
            for cy in cy0..=cy1 {
                buckets.entry((cx, cy)).or_default().push(index);
            }
        }
    }

    // Current cell plus E, S, SE, SW covers every neighbor pairing once.
    const NEIGHBORS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];
    let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
    let mut pairs = Vec::new();
    for (&(cx, cy), members) in &buckets {
        for (a, &i) in members.iter().enumerate() {
            for &j in &members[(a + 1)..] {
                push_pair(&mut seen, &mut pairs, i, j);
            }
        }
        for (dx, dy) in NEIGHBORS {
            let Some(other) = buckets.get(&(cx + dx, cy + dy)) else {
                continue;
            };
            for &i in members {
                for &j in other {
                    if i != j {
                        push_pair(&mut seen, &mut pairs, i, j);
                    }
                }
            }
        }
    }
    debug!("broad phase: {} candidate pairs", pairs.len());
    pairs
}

fn push_pair(
    seen: &mut FxHashSet<(usize, usize)>,
    pairs: &mut Vec<(usize, usize)>,
    i: usize,
    j: usize,
) {
    let key = if i < j { (i, j) } else { (j, i) };
    if seen.insert(key) {
        pairs.push(key);
    }
}

/// Penetration reduced to its dominant axis. Ties resolve along X.
fn dominant_axis(pen: Vec2) -> Vec2 {
    if pen.x.abs() >= pen.y.abs() {
        Vec2::new(pen.x, 0.0)
    } else {
        Vec2::new(0.0, pen.y)
    }
}

fn resolve_pair(
    factory: &mut EntityFactory,
    proxies: &[Proxy],
    i: usize,
    j: usize,
    pen: Vec2,
    rng: &mut fastrand::Rng,
    output: &mut CollisionOutput,
) {
    let (a, b) = (&proxies[i], &proxies[j]);

    // Triggers never reach the penetration resolver but still report.
    if a.trigger || b.trigger {
        output.overlaps.push(OverlapEvent { a: a.id, b: b.id });
        return;
    }

    output.contacts.push(CollisionEvent {
        a: a.id,
        b: b.id,
        penetration: pen,
    });

    match (a.role, b.role) {
        (BodyRole::Player, BodyRole::Ai) => {
            resolve_player_ai(factory, a, b, pen, rng, output);
        }
        (BodyRole::Ai, BodyRole::Player) => {
            resolve_player_ai(factory, b, a, -pen, rng, output);
        }
        (BodyRole::Player, BodyRole::Static)
        | (BodyRole::Ai, BodyRole::Static)
        | (BodyRole::Projectile, BodyRole::Static) => {
            resolve_moving_static(factory, a, pen);
        }
        (BodyRole::Static, BodyRole::Player)
        | (BodyRole::Static, BodyRole::Ai)
        | (BodyRole::Static, BodyRole::Projectile) => {
            resolve_moving_static(factory, b, -pen);
        }
        (BodyRole::Ai, BodyRole::Ai) => {
            resolve_ai_ai(factory, a, b, pen);
        }
        (BodyRole::Projectile, BodyRole::Ai) => {
            resolve_projectile_ai(factory, a, b, output);
        }
        (BodyRole::Ai, BodyRole::Projectile) => {
            resolve_projectile_ai(factory, b, a, output);
        }
        // Static/static never moves; projectile pairs with the player or
        // another projectile pass through by design of the role table.
        _ => {}
    }
}

/// Player ↔ AI: separate 50/50 on the dominant axis, damage the player by
/// `ai_mass / DAMAGE_MASS_DIVISOR`, symmetric knockback, random hit SFX.
fn resolve_player_ai(
    factory: &mut EntityFactory,
    player: &Proxy,
    ai: &Proxy,
    pen: Vec2,
    rng: &mut fastrand::Rng,
    output: &mut CollisionOutput,
) {
    let axis = dominant_axis(pen);
    let half = axis * 0.5;

    if let Some(entity) = factory.get_mut(player.id) {
        if let Some(t) = entity.transform_mut() {
            t.position += half;
        }
        let dir = half.normalized();
        if let Some(rb) = entity.rigidbody_mut() {
            rb.apply_knockback(dir * KNOCKBACK_SPEED, KNOCKBACK_DURATION);
        }
        let damage = ai.mass / DAMAGE_MASS_DIVISOR;
        if let Some(health) = entity.health_mut() {
            if health.take_damage(damage) {
                let sfx = HIT_SFX[rng.usize(..HIT_SFX.len())];
                output.sfx.push(sfx.to_string());
            }
        }
    }
    if let Some(entity) = factory.get_mut(ai.id) {
        if let Some(t) = entity.transform_mut() {
            t.position -= half;
        }
        let dir = half.normalized();
        if let Some(rb) = entity.rigidbody_mut() {
            rb.apply_knockback(-dir * KNOCKBACK_SPEED, KNOCKBACK_DURATION);
        }
    }
}

/// Moving body ↔ static: move the moving side by the full penetration on
/// the dominant axis and zero its velocity.
fn resolve_moving_static(factory: &mut EntityFactory, moving: &Proxy, pen: Vec2) {
    let axis = dominant_axis(pen);
    if let Some(entity) = factory.get_mut(moving.id) {
        if let Some(t) = entity.transform_mut() {
            t.position += axis;
        }
        if let Some(rb) = entity.rigidbody_mut() {
            rb.velocity = Vec2::ZERO;
        }
    }
}

/// AI ↔ AI: small counter pulses on the dominant axis, no damage.
fn resolve_ai_ai(factory: &mut EntityFactory, a: &Proxy, b: &Proxy, pen: Vec2) {
    let dir = dominant_axis(pen).normalized();
    if let Some(rb) = factory.get_mut(a.id).and_then(|e| e.rigidbody_mut()) {
        rb.velocity += dir * AI_COUNTER_PULSE;
    }
    if let Some(rb) = factory.get_mut(b.id).and_then(|e| e.rigidbody_mut()) {
        rb.velocity -= dir * AI_COUNTER_PULSE;
    }
}

/// Projectile ↔ AI: damage scales with projectile mass; hit VFX at the
/// contact; the projectile flag clears (and the collider shape restores)
/// unless the projectile's tag is in [`KEEP_PROJECTILE_TAGS`], in which
/// case the target is knocked back instead.
fn resolve_projectile_ai(
    factory: &mut EntityFactory,
    projectile: &Proxy,
    target: &Proxy,
    output: &mut CollisionOutput,
) {
    let damage = PROJECTILE_BASE_DAMAGE * (projectile.mass / DAMAGE_MASS_DIVISOR);
    let contact = (projectile.aabb.center() + target.aabb.center()) * 0.5;
    let push = (target.aabb.center() - projectile.aabb.center()).normalized();

    if let Some(entity) = factory.get_mut(target.id) {
        if let Some(health) = entity.health_mut() {
            health.take_damage(damage);
        }
    }
    output.vfx.push(contact);

    let keep = KEEP_PROJECTILE_TAGS.contains(&projectile.tag.as_str());
    if keep {
        if let Some(rb) = factory.get_mut(target.id).and_then(|e| e.rigidbody_mut()) {
            rb.apply_knockback(push * KNOCKBACK_SPEED, KNOCKBACK_DURATION);
        }
        return;
    }
    if let Some(entity) = factory.get_mut(projectile.id) {
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
    }
}

/// Standard projectile collider shape while in flight.
pub fn projectile_boxes() -> Vec<ColliderBox> {
    vec![ColliderBox::new(Vec2::new(8.0, 8.0), Vec2::ZERO)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Component;
    use crate::components::ai::AiStateMachine;
    use crate::components::health::Health;
    use crate::components::playercontroller::PlayerController;
    use crate::components::rectcollider::RectCollider;
    use crate::components::rigidbody::RigidBody;
    use crate::components::transform::Transform;

    fn setup() -> (EntityFactory, LayerRegistry, fastrand::Rng) {
        (
            EntityFactory::default(),
            LayerRegistry::default(),
            fastrand::Rng::with_seed(7),
        )
    }

    fn spawn_box(
        factory: &mut EntityFactory,
        layers: &mut LayerRegistry,
        name: &str,
        pos: Vec2,
        size: f32,
    ) -> EntityId {
        let id = factory.create_default(layers, name).unwrap();
        let e = factory.get_mut(id).unwrap();
        e.attach(Component::Transform(Transform::new(pos.x, pos.y)));
        e.attach(Component::RectCollider(RectCollider::new(size, size)));
        id
    }

    #[test]
    fn brute_and_grid_agree_on_contacts() {
        let (mut factory, mut layers, mut rng) = setup();
        for i in 0..6 {
            spawn_box(
                &mut factory,
                &mut layers,
                "box",
                Vec2::new(i as f32 * 20.0, 0.0),
                32.0,
            );
        }
        let grid = run_collisions(&mut factory, &layers, BroadPhaseMode::Grid, &mut rng);
        let brute = run_collisions(&mut factory, &layers, BroadPhaseMode::Brute, &mut rng);

        let mut grid_pairs: Vec<_> = grid
            .contacts
            .iter()
            .map(|c| (c.a.min(c.b), c.a.max(c.b)))
            .collect();
        let mut brute_pairs: Vec<_> = brute
            .contacts
            .iter()
            .map(|c| (c.a.min(c.b), c.a.max(c.b)))
            .collect();
        grid_pairs.sort();
        brute_pairs.sort();
        assert_eq!(grid_pairs, brute_pairs);
        assert!(!grid_pairs.is_empty());
    }

    #[test]
    fn touching_boxes_do_not_collide() {
        let (mut factory, mut layers, mut rng) = setup();
        spawn_box(&mut factory, &mut layers, "a", Vec2::new(0.0, 0.0), 32.0);
        spawn_box(&mut factory, &mut layers, "b", Vec2::new(32.0, 0.0), 32.0);
        let out = run_collisions(&mut factory, &layers, BroadPhaseMode::Brute, &mut rng);
        assert!(out.contacts.is_empty());
    }

    #[test]
    fn moving_body_is_pushed_out_of_static_and_stopped() {
        let (mut factory, mut layers, mut rng) = setup();
        // Wall to the left, player overlapping it by 4 on X.
        let wall = spawn_box(&mut factory, &mut layers, "wall", Vec2::new(0.0, 0.0), 64.0);
        let player = spawn_box(
            &mut factory,
            &mut layers,
            "player",
            Vec2::new(60.0, 1.0),
            64.0,
        );
        let _ = wall;
        {
            let e = factory.get_mut(player).unwrap();
            e.attach(Component::PlayerController(PlayerController::new(200.0)));
            let mut rb = RigidBody::new(10.0);
            rb.velocity = Vec2::new(-50.0, 0.0);
            e.attach(Component::RigidBody(rb));
            e.attach(Component::Health(Health::new(100.0)));
        }
        let out = run_collisions(&mut factory, &layers, BroadPhaseMode::Brute, &mut rng);
        assert_eq!(out.contacts.len(), 1);

        let e = factory.get(player).unwrap();
        // Overlap was 4 on X; player pushed to 64, velocity zeroed, no damage.
        assert!((e.transform().unwrap().position.x - 64.0).abs() < 1e-3);
        assert_eq!(e.rigidbody().unwrap().velocity, Vec2::ZERO);
        assert_eq!(e.health().unwrap().hp, 100.0);
    }

    #[test]
    fn player_ai_contact_damages_by_mass_over_divisor() {
        let (mut factory, mut layers, mut rng) = setup();
        let player = spawn_box(
            &mut factory,
            &mut layers,
            "player",
            Vec2::new(0.0, 0.0),
            32.0,
        );
        let enemy = spawn_box(&mut factory, &mut layers, "enemy", Vec2::new(20.0, 0.0), 32.0);
        {
            let e = factory.get_mut(player).unwrap();
            e.attach(Component::PlayerController(PlayerController::new(200.0)));
            e.attach(Component::RigidBody(RigidBody::new(10.0)));
            e.attach(Component::Health(Health::new(100.0)));
        }
        {
            let e = factory.get_mut(enemy).unwrap();
            e.attach(Component::RigidBody(RigidBody::new(30.0)));
            e.attach(Component::AiStateMachine(AiStateMachine::new(80.0)));
        }
        let out = run_collisions(&mut factory, &layers, BroadPhaseMode::Brute, &mut rng);

        let p = factory.get(player).unwrap();
        assert_eq!(p.health().unwrap().hp, 97.0); // 30 / 10
        assert!(p.rigidbody().unwrap().in_knockback);
        let a = factory.get(enemy).unwrap();
        assert!(a.rigidbody().unwrap().in_knockback);
        assert_eq!(out.sfx.len(), 1);
        assert!(HIT_SFX.contains(&out.sfx[0].as_str()));
    }

    #[test]
    fn projectile_hit_damages_and_clears_flag() {
        let (mut factory, mut layers, mut rng) = setup();
        let target = spawn_box(&mut factory, &mut layers, "light", Vec2::new(0.0, 0.0), 32.0);
        let proj = spawn_box(&mut factory, &mut layers, "bomb", Vec2::new(10.0, 0.0), 32.0);
        {
            let e = factory.get_mut(target).unwrap();
            e.tag = "LightEnemy".into();
            e.attach(Component::Health(Health::new(20.0)));
            e.attach(Component::AiStateMachine(AiStateMachine::new(80.0)));
        }
        {
            let e = factory.get_mut(proj).unwrap();
            e.tag = "BombEnemy".into();
            e.attach(Component::RigidBody(RigidBody::new(30.0)));
            let mut sm = AiStateMachine::new(80.0);
            sm.launch_projectile(4.0);
            e.attach(Component::AiStateMachine(sm));
            e.collider_mut().unwrap().set_transient_boxes(projectile_boxes());
        }
        let out = run_collisions(&mut factory, &layers, BroadPhaseMode::Brute, &mut rng);

        // 10 base * (30 / 10) = 30 damage kills the 20 hp target.
        assert_eq!(factory.get(target).unwrap().health().unwrap().hp, 0.0);
        let p = factory.get(proj).unwrap();
        assert!(!p.ai().unwrap().is_projectile);
        assert!(p.collider().unwrap().original_boxes.is_none());
        assert_eq!(out.vfx.len(), 1);
    }

    #[test]
    fn heavy_projectile_keeps_flag_and_knocks_back() {
        let (mut factory, mut layers, mut rng) = setup();
        let target = spawn_box(&mut factory, &mut layers, "light", Vec2::new(0.0, 0.0), 32.0);
        let proj = spawn_box(&mut factory, &mut layers, "heavy", Vec2::new(10.0, 0.0), 32.0);
        {
            let e = factory.get_mut(target).unwrap();
            e.tag = "LightEnemy".into();
            e.attach(Component::Health(Health::new(100.0)));
            e.attach(Component::RigidBody(RigidBody::new(10.0)));
            e.attach(Component::AiStateMachine(AiStateMachine::new(80.0)));
        }
        {
            let e = factory.get_mut(proj).unwrap();
            e.tag = "HeavyEnemy".into();
            e.attach(Component::RigidBody(RigidBody::new(50.0)));
            let mut sm = AiStateMachine::new(60.0);
            sm.launch_projectile(4.0);
            e.attach(Component::AiStateMachine(sm));
        }
        run_collisions(&mut factory, &layers, BroadPhaseMode::Brute, &mut rng);

        assert!(factory.get(proj).unwrap().ai().unwrap().is_projectile);
        assert!(factory.get(target).unwrap().rigidbody().unwrap().in_knockback);
    }

    #[test]
    fn trigger_reports_overlap_without_resolution() {
        let (mut factory, mut layers, mut rng) = setup();
        let zone = spawn_box(&mut factory, &mut layers, "zone", Vec2::new(0.0, 0.0), 64.0);
        factory.get_mut(zone).unwrap().collider_mut().unwrap().trigger = true;
        let body = spawn_box(&mut factory, &mut layers, "body", Vec2::new(10.0, 0.0), 32.0);
        {
            let e = factory.get_mut(body).unwrap();
            e.attach(Component::RigidBody(RigidBody::new(1.0)));
        }
        let before = factory.get(body).unwrap().transform().unwrap().position;
        let out = run_collisions(&mut factory, &layers, BroadPhaseMode::Brute, &mut rng);

        assert!(out.contacts.is_empty());
        assert_eq!(out.overlaps.len(), 1);
        assert_eq!(
            factory.get(body).unwrap().transform().unwrap().position,
            before
        );
    }

    #[test]
    fn ai_ai_contact_applies_counter_pulses() {
        let (mut factory, mut layers, mut rng) = setup();
        let a = spawn_box(&mut factory, &mut layers, "a", Vec2::new(0.0, 0.0), 32.0);
        let b = spawn_box(&mut factory, &mut layers, "b", Vec2::new(16.0, 0.0), 32.0);
        for id in [a, b] {
            let e = factory.get_mut(id).unwrap();
            e.attach(Component::RigidBody(RigidBody::new(10.0)));
            e.attach(Component::AiStateMachine(AiStateMachine::new(80.0)));
        }
        run_collisions(&mut factory, &layers, BroadPhaseMode::Brute, &mut rng);

        let va = factory.get(a).unwrap().rigidbody().unwrap().velocity;
        let vb = factory.get(b).unwrap().rigidbody().unwrap().velocity;
        // a sits left of b, so a is pushed left and b right.
        assert!(va.x < 0.0);
        assert!(vb.x > 0.0);
        assert_eq!(va.y, 0.0);
    }
}
