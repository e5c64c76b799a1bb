//! Collision behavior observed through the full frame pipeline, plus the
//! broad-phase containment check.

use molten2d::components::ai::AiStateMachine;
use molten2d::components::health::Health;
use molten2d::components::playercontroller::PlayerController;
use molten2d::components::rectcollider::RectCollider;
use molten2d::components::rigidbody::RigidBody;
use molten2d::components::transform::Transform;
use molten2d::components::Component;
use molten2d::engine::Engine;
use molten2d::entity::factory::EntityFactory;
use molten2d::entity::EntityId;
use molten2d::input::InputSnapshot;
use molten2d::math::Vec2;
use molten2d::resources::gameconfig::GameConfig;
use molten2d::resources::layers::LayerRegistry;
use molten2d::systems::collision::{run_collisions, BroadPhaseMode};

const FRAME: f32 = 1.0 / 60.0;

fn test_engine() -> Engine {
    Engine::with_seed(GameConfig::new(), 99)
}

#[test]
fn grid_broad_phase_finds_every_brute_force_contact() {
    let mut factory = EntityFactory::default();
    let mut layers = LayerRegistry::default();
    let mut rng = fastrand::Rng::with_seed(7);

    // A scattered field with plenty of overlaps and cell crossings.
    for _ in 0..40 {
        let id = factory.create_default(&mut layers, "box").unwrap();
        let e = factory.get_mut(id).unwrap();
        let x = rng.f32() * 600.0 - 300.0;
        let y = rng.f32() * 600.0 - 300.0;
        e.attach(Component::Transform(Transform::new(x, y)));
        e.attach(Component::RectCollider(RectCollider::new(
            40.0 + rng.f32() * 60.0,
            40.0 + rng.f32() * 60.0,
        )));
    }

    let mut pair_set = |mode| {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut pairs: Vec<(EntityId, EntityId)> =
            run_collisions(&mut factory, &layers, mode, &mut rng)
                .contacts
                .iter()
                .map(|c| (c.a.min(c.b), c.a.max(c.b)))
                .collect();
        pairs.sort();
        pairs
    };
    let brute = pair_set(BroadPhaseMode::Brute);
    let grid = pair_set(BroadPhaseMode::Grid);
    assert!(!brute.is_empty());
    assert_eq!(grid, brute);
}

#[test]
fn player_is_pushed_out_of_a_wall_and_stopped() {
    let mut engine = test_engine();
    let wall = engine
        .factory
        .create_default(&mut engine.layers, "wall")
        .unwrap();
    {
        let e = engine.factory.get_mut(wall).unwrap();
        e.attach(Component::Transform(Transform::new(0.0, 0.0)));
        e.attach(Component::RectCollider(RectCollider::new(64.0, 64.0)));
    }
    let player = engine
        .factory
        .create(&mut engine.layers, "player", "Player", "Default")
        .unwrap();
    {
        let e = engine.factory.get_mut(player).unwrap();
        // Overlapping the wall's right edge; X is the shallow axis.
        e.attach(Component::Transform(Transform::new(60.0, 31.0)));
        e.attach(Component::RigidBody(RigidBody::new(10.0)));
        e.attach(Component::RectCollider(RectCollider::new(64.0, 64.0)));
        e.attach(Component::Health(Health::new(100.0)));
        e.attach(Component::PlayerController(PlayerController::new(220.0)));
    }

    engine.frame(&InputSnapshot::default(), FRAME);

    let e = engine.factory.get(player).unwrap();
    assert!((e.transform().unwrap().position.x - 64.0).abs() < 1e-2);
    assert_eq!(e.rigidbody().unwrap().velocity, Vec2::ZERO);
    // Walls never damage.
    assert_eq!(e.health().unwrap().hp, 100.0);
    engine.shutdown();
}

#[test]
fn thrown_bomb_kills_a_light_enemy_on_impact() {
    let mut engine = test_engine();
    let light = engine
        .spawn_enemy(molten2d::components::ai::EnemyKind::Light, Vec2::ZERO)
        .unwrap();

    let bomb = engine
        .factory
        .create(&mut engine.layers, "bomb", "BombEnemy", "Default")
        .unwrap();
    {
        let e = engine.factory.get_mut(bomb).unwrap();
        e.attach(Component::Transform(Transform::new(-10.0, 0.0)));
        let mut rb = RigidBody::new(30.0);
        rb.velocity = Vec2::new(400.0, 0.0);
        e.attach(Component::RigidBody(rb));
        e.attach(Component::RectCollider(RectCollider::new(32.0, 32.0)));
        let mut sm = AiStateMachine::new(90.0);
        sm.launch_projectile(4.0);
        e.attach(Component::AiStateMachine(sm));
    }

    let report = engine.frame(&InputSnapshot::default(), FRAME);

    // 10 base damage * (30 mass / 10) = 30 against 20 hp.
    assert!(!engine.factory.is_alive(light));
    assert!(report.deaths.iter().any(|d| d.tag == "LightEnemy"));
    // The bomb reverted from projectile flight on impact.
    let bomb_ai = engine.factory.get(bomb).unwrap().ai().unwrap();
    assert!(!bomb_ai.is_projectile);
    engine.shutdown();
}

#[test]
fn player_contact_damage_scales_with_enemy_mass() {
    let mut engine = test_engine();
    let player = engine
        .factory
        .create(&mut engine.layers, "player", "Player", "Default")
        .unwrap();
    {
        let e = engine.factory.get_mut(player).unwrap();
        e.attach(Component::Transform(Transform::new(0.0, 0.0)));
        e.attach(Component::RigidBody(RigidBody::new(10.0)));
        e.attach(Component::RectCollider(RectCollider::new(32.0, 32.0)));
        e.attach(Component::Health(Health::new(100.0)));
        e.attach(Component::PlayerController(PlayerController::new(220.0)));
    }
    // Heavy enemy, mass 50, overlapping the player.
    engine
        .spawn_enemy(
            molten2d::components::ai::EnemyKind::Heavy,
            Vec2::new(20.0, 0.0),
        )
        .unwrap();

    engine.frame(&InputSnapshot::default(), FRAME);

    let hp = engine
        .factory
        .get(player)
        .unwrap()
        .health()
        .unwrap()
        .hp;
    assert_eq!(hp, 95.0); // 50 / 10
    assert!(
        engine
            .factory
            .get(player)
            .unwrap()
            .rigidbody()
            .unwrap()
            .in_knockback
    );
    engine.shutdown();
}
