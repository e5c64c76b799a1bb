//! The engine context and the per-frame pipeline.
//!
//! [`Engine`] owns every resource: the entity arena, registries, clock,
//! audio bridge, event scheduler, and despawn bookkeeping. One call to
//! [`Engine::frame`] runs the whole frame in a fixed order: drain
//! scheduled spawns, count down delayed despawns, gameplay intent
//! (player, AI, spawners, explosions, health cooldowns), integration,
//! collision, the death sweep, the Y-sort, and finally the despawn queue.
//! Destruction only ever happens in that last stage, so no update pass
//! observes a half-dead entity.
//!
//! Pausing freezes the clock without consuming the accumulator and parks
//! every AI body's velocity; resuming restores the exact velocities, so a
//! pause round trip is invisible to the simulation.

use std::path::Path;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::components::ai::{AiStateMachine, EnemyKind, STATE_CHASE};
use crate::components::animator::Animator;
use crate::components::health::{DeathAction, Health};
use crate::components::rectcollider::RectCollider;
use crate::components::rigidbody::RigidBody;
use crate::components::sprite::Sprite;
use crate::components::transform::Transform;
use crate::components::explosion::Explosion;
use crate::components::Component;
use crate::entity::factory::{EntityFactory, PoolError};
use crate::entity::EntityId;
use crate::events::audio::AudioCmd;
use crate::events::missions::DeathEvent;
use crate::events::scheduler::EventScheduler;
use crate::input::InputSnapshot;
use crate::math::{Aabb, Vec2};
use crate::resources::assets::AssetRegistry;
use crate::resources::audio::AudioBridge;
use crate::resources::gameconfig::GameConfig;
use crate::resources::layers::LayerRegistry;
use crate::resources::tags::TagRegistry;
use crate::resources::worldtime::WorldTime;
use crate::scene::{self, SceneError};
use crate::systems::aistate::{self, BORDER_TAG};
use crate::systems::animator;
use crate::systems::collision::{self, BroadPhaseMode, HIT_SFX};
use crate::systems::despawn::DespawnManager;
use crate::systems::movement;
use crate::systems::playercontrol;
use crate::systems::spawnpoints;
use crate::systems::ysort;

/// How far inside the border a scheduled enemy spawns.
pub const SPAWN_INSET: f32 = 32.0;
/// Vertical spacing between enemies of one spawn command.
pub const SPAWN_STACK_OFFSET: f32 = 48.0;
/// Playfield used when the scene defines no borders.
const FALLBACK_BOUNDS: Aabb = Aabb {
    min: Vec2::new(-880.0, -520.0),
    max: Vec2::new(880.0, 520.0),
};

/// Lifetime of a spawned hit/blast effect entity.
pub const VFX_LIFETIME: f32 = 0.5;
const HIT_VFX_ANIM: &str = "hit_spark";
const BLAST_VFX_ANIM: &str = "explosion";

/// Per-kind enemy tuning used by the built-in constructor.
struct EnemyStats {
    hp: f32,
    mass: f32,
    speed: f32,
    collider: f32,
    anim: &'static str,
}

fn stats_for(kind: EnemyKind) -> EnemyStats {
    match kind {
        EnemyKind::Light => EnemyStats {
            hp: 20.0,
            mass: 10.0,
            speed: 120.0,
            collider: 32.0,
            anim: "light_walk",
        },
        EnemyKind::Heavy => EnemyStats {
            hp: 60.0,
            mass: 50.0,
            speed: 70.0,
            collider: 48.0,
            anim: "heavy_walk",
        },
        EnemyKind::Bomb => EnemyStats {
            hp: 30.0,
            mass: 30.0,
            speed: 90.0,
            collider: 32.0,
            anim: "bomb_walk",
        },
    }
}

/// Bomb enemies arm this blast when they die.
const BOMB_FUSE: f32 = 2.0;
const BOMB_BLAST_RADIUS: f32 = 96.0;
const BOMB_BLAST_DAMAGE: f32 = 40.0;

/// What one frame produced, for callers that react to it.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub deaths: Vec<DeathEvent>,
    /// True exactly on the frame the last mission completed.
    pub win_latched: bool,
}

pub struct Engine {
    pub config: GameConfig,
    pub time: WorldTime,
    pub factory: EntityFactory,
    pub tags: TagRegistry,
    pub layers: LayerRegistry,
    pub assets: AssetRegistry,
    pub audio: AudioBridge,
    pub scheduler: EventScheduler,
    pub despawner: DespawnManager,
    pub rng: fastrand::Rng,
    broad_phase: BroadPhaseMode,
    paused: bool,
    /// AI velocities parked while paused, restored on resume.
    parked_velocities: FxHashMap<EntityId, Vec2>,
    exit_requested: bool,
}

impl Engine {
    pub fn new(config: GameConfig) -> Self {
        Self::with_seed(config, fastrand::u64(..))
    }

    /// Deterministic construction for tests and replay.
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        let time = WorldTime::new(config.fixed_dt());
        let mut tags = TagRegistry::default();
        for tag in [
            "Player",
            BORDER_TAG,
            EnemyKind::Light.tag(),
            EnemyKind::Heavy.tag(),
            EnemyKind::Bomb.tag(),
        ] {
            tags.register(tag);
        }
        let audio = AudioBridge::setup();
        for sfx in HIT_SFX {
            audio.send(AudioCmd::LoadSound {
                id: (*sfx).to_string(),
            });
        }
        Self {
            config,
            time,
            factory: EntityFactory::default(),
            tags,
            layers: LayerRegistry::default(),
            assets: AssetRegistry::default(),
            audio,
            scheduler: EventScheduler::spawn(),
            despawner: DespawnManager::default(),
            rng: fastrand::Rng::with_seed(seed),
            broad_phase: BroadPhaseMode::Grid,
            paused: false,
            parked_velocities: FxHashMap::default(),
            exit_requested: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn should_exit(&self) -> bool {
        self.exit_requested
    }

    pub fn set_broad_phase(&mut self, mode: BroadPhaseMode) {
        self.broad_phase = mode;
    }

    /// Run one frame of the pipeline.
    pub fn frame(&mut self, input: &InputSnapshot, frame_dt: f32) -> FrameReport {
        if input.exit {
            self.exit_requested = true;
        }
        if input.pause {
            self.toggle_pause();
        }

        if self.paused {
            self.time.freeze_frame();
        } else {
            self.time.advance(frame_dt);
        }
        self.scheduler.sync_clock(self.time.elapsed, !self.paused);

        // Spawns decided by the worker join the world between frames.
        for cmd in self.scheduler.drain_spawns() {
            for index in 0..cmd.count {
                if let Err(err) = self.spawn_enemy_opposite(cmd.kind, index) {
                    warn!("scheduled spawn dropped: {err}");
                }
            }
        }

        let mut report = FrameReport::default();
        if self.time.current_steps == 0 {
            self.flush_audio();
            return report;
        }

        self.despawner.tick(&mut self.factory, &self.time);

        playercontrol::update_player(&mut self.factory, &self.layers, &self.time, input);
        aistate::update_ai(&mut self.factory, &self.layers, &self.time);
        for request in spawnpoints::tick_spawners(&mut self.factory, &self.layers, &self.time) {
            if let Err(err) = self.spawn_enemy(request.kind, request.position) {
                warn!("spawner output dropped: {err}");
            }
        }
        self.tick_explosions();
        self.tick_health_cooldowns();

        movement::integrate(&mut self.factory, &self.layers, &self.time);

        let output = collision::run_collisions(
            &mut self.factory,
            &self.layers,
            self.broad_phase,
            &mut self.rng,
        );
        for sfx in output.sfx {
            self.audio.send(AudioCmd::PlaySound { id: sfx });
        }
        for position in output.vfx {
            self.spawn_vfx(HIT_VFX_ANIM, position);
        }

        let (deaths, win_latched) = self.death_sweep();
        report.deaths = deaths;
        report.win_latched = win_latched;

        animator::update_animators(&mut self.factory, &self.layers, &self.time);
        ysort::sort_sprites(&mut self.factory, &self.layers);

        let destroyed = self.factory.process_despawn_queue(&mut self.layers);
        if !destroyed.is_empty() {
            debug!("destroyed {} entities", destroyed.len());
        }

        self.flush_audio();
        report
    }

    fn toggle_pause(&mut self) {
        if self.paused {
            for (id, velocity) in self.parked_velocities.drain() {
                if let Some(rb) = self.factory.get_mut(id).and_then(|e| e.rigidbody_mut()) {
                    rb.velocity = velocity;
                }
            }
            self.paused = false;
            info!("resumed");
        } else {
            for id in self.factory.order_snapshot() {
                let Some(entity) = self.factory.get(id) else {
                    continue;
                };
                if entity.ai().is_none() {
                    continue;
                }
                if let Some(rb) = self.factory.get_mut(id).and_then(|e| e.rigidbody_mut()) {
                    self.parked_velocities.insert(id, rb.velocity);
                    rb.velocity = Vec2::ZERO;
                }
            }
            self.paused = true;
            info!("paused");
        }
    }

    /// Union of the border colliders, or the fallback playfield.
    fn playfield_bounds(&self) -> Aabb {
        let mut bounds: Option<Aabb> = None;
        for id in self.factory.find_by_tag(BORDER_TAG) {
            let Some(entity) = self.factory.get(id) else {
                continue;
            };
            let Some(collider) = entity.collider() else {
                continue;
            };
            let aabb = collider.world_aabb(&self.factory.world_transform(id));
            bounds = Some(match bounds {
                Some(b) => b.union(&aabb),
                None => aabb,
            });
        }
        bounds.unwrap_or(FALLBACK_BOUNDS)
    }

    /// Spawn a scheduled enemy on the border side opposite the player,
    /// just inside the playfield.
    fn spawn_enemy_opposite(
        &mut self,
        kind: EnemyKind,
        index: i32,
    ) -> Result<EntityId, PoolError> {
        let bounds = self.playfield_bounds();
        let player_pos = self
            .factory
            .get_player()
            .map(|id| self.factory.world_transform(id).position)
            .unwrap_or(Vec2::ZERO);
        let x = if player_pos.x >= bounds.center().x {
            bounds.min.x + SPAWN_INSET
        } else {
            bounds.max.x - SPAWN_INSET
        };
        let y = (player_pos.y + index as f32 * SPAWN_STACK_OFFSET)
            .clamp(bounds.min.y + SPAWN_INSET, bounds.max.y - SPAWN_INSET);
        self.spawn_enemy(kind, Vec2::new(x, y))
    }

    /// Built-in enemy constructor.
    pub fn spawn_enemy(&mut self, kind: EnemyKind, position: Vec2) -> Result<EntityId, PoolError> {
        let stats = stats_for(kind);
        let id = self.factory.create(
            &mut self.layers,
            format!("{:?}", kind).to_lowercase(),
            kind.tag(),
            crate::entity::DEFAULT_LAYER,
        )?;
        let capacity = self.factory.capacity();
        let entity = self
            .factory
            .get_mut(id)
            .ok_or(PoolError::Exhausted(capacity))?;
        entity.attach(Component::Transform(Transform::new(position.x, position.y)));
        entity.attach(Component::RigidBody(RigidBody::new(stats.mass)));
        entity.attach(Component::RectCollider(RectCollider::new(
            stats.collider,
            stats.collider,
        )));
        entity.attach(Component::Sprite(Sprite::new(stats.anim)));
        entity.attach(Component::Animator(Animator::new(stats.anim)));
        let mut health = Health::new(stats.hp);
        if kind == EnemyKind::Bomb {
            health = health.with_death_action(DeathAction::Explode);
            entity.attach(Component::Explosion(Explosion::new(
                BOMB_FUSE,
                BOMB_BLAST_RADIUS,
                BOMB_BLAST_DAMAGE,
            )));
        }
        entity.attach(Component::Health(health));
        let mut machine = AiStateMachine::for_kind(kind, stats.speed);
        machine.set_state(STATE_CHASE);
        entity.attach(Component::AiStateMachine(machine));
        debug!("spawned {:?} at ({:.1}, {:.1})", kind, position.x, position.y);
        Ok(id)
    }

    /// Short-lived effect entity; it despawns itself through the manager.
    fn spawn_vfx(&mut self, anim: &str, position: Vec2) {
        let Ok(id) = self.factory.create_default(&mut self.layers, anim) else {
            return;
        };
        if let Some(entity) = self.factory.get_mut(id) {
            entity.attach(Component::Transform(Transform::new(position.x, position.y)));
            entity.attach(Component::Sprite(Sprite::new(anim)));
        }
        self.despawner.schedule(id, VFX_LIFETIME);
    }

    /// Advance every explosion fuse; projectile flight freezes the fuse.
    fn tick_explosions(&mut self) {
        for id in self.factory.order_snapshot() {
            let Some(entity) = self.factory.get(id) else {
                continue;
            };
            if entity.pending_despawn || !self.layers.is_active(&entity.layer) {
                continue;
            }
            if entity.explosion().is_none() {
                continue;
            }
            let in_flight = entity.ai().map(|ai| ai.is_projectile).unwrap_or(false);
            let dt = self.time.step_dt();
            let fired = {
                let Some(explosion) = self.factory.get_mut(id).and_then(|e| e.explosion_mut())
                else {
                    continue;
                };
                explosion.shot_out = in_flight;
                explosion.tick(dt)
            };
            if fired {
                self.detonate(id);
                self.factory.queue_despawn(id);
            }
        }
    }

    /// Apply an armed blast around `id` and spawn the blast effect.
    fn detonate(&mut self, id: EntityId) {
        let Some((radius, damage)) = self
            .factory
            .get(id)
            .and_then(|e| e.explosion())
            .map(|x| (x.blast_radius, x.damage))
        else {
            return;
        };
        let center = self.factory.world_transform(id).position;
        for other in self.factory.order_snapshot() {
            if other == id {
                continue;
            }
            let position = self.factory.world_transform(other).position;
            if center.distance_to(position) > radius {
                continue;
            }
            if let Some(health) = self.factory.get_mut(other).and_then(|e| e.health_mut()) {
                health.take_damage(damage);
            }
        }
        if let Some(explosion) = self.factory.get_mut(id).and_then(|e| e.explosion_mut()) {
            explosion.has_exploded = true;
        }
        self.spawn_vfx(BLAST_VFX_ANIM, center);
    }

    fn tick_health_cooldowns(&mut self) {
        let dt = self.time.step_dt();
        for id in self.factory.order_snapshot() {
            if let Some(health) = self.factory.get_mut(id).and_then(|e| e.health_mut()) {
                health.tick_cooldown(dt);
            }
        }
    }

    /// Latch every fresh death, fire its death action, report the kill to
    /// the mission board, and queue the despawn.
    fn death_sweep(&mut self) -> (Vec<DeathEvent>, bool) {
        let mut deaths = Vec::new();
        let mut win_latched = false;
        for id in self.factory.order_snapshot() {
            let (tag, action) = {
                let Some(entity) = self.factory.get_mut(id) else {
                    continue;
                };
                let tag = entity.tag.clone();
                let Some(health) = entity.health_mut() else {
                    continue;
                };
                if !health.is_dead() || health.despawn_latched {
                    continue;
                }
                health.despawn_latched = true;
                (tag, health.death_action)
            };
            if action == DeathAction::Explode {
                let already = self
                    .factory
                    .get(id)
                    .and_then(|e| e.explosion())
                    .map(|x| x.has_exploded)
                    .unwrap_or(true);
                if !already {
                    self.detonate(id);
                }
            }
            self.factory.queue_despawn(id);
            if let Some(kind) = EnemyKind::from_tag(&tag) {
                if self.scheduler.record_kill(kind) {
                    win_latched = true;
                    info!("all missions complete");
                }
            }
            deaths.push(DeathEvent { entity: id, tag });
        }
        (deaths, win_latched)
    }

    fn flush_audio(&mut self) {
        for message in self.audio.poll() {
            debug!("audio: {message:?}");
        }
    }

    /// Load a scene, replacing the current one. Carry state, timers, and
    /// in-flight audio never cross a scene change.
    pub fn load_scene(&mut self, path: &Path) -> Result<(), SceneError> {
        self.audio.send(AudioCmd::FadeOutAll { seconds: 0.25 });
        self.despawner.clear();
        self.parked_velocities.clear();
        scene::load_scene(&mut self.factory, &self.tags, &mut self.layers, path)?;
        if let Some(player) = self.factory.get_player() {
            if let Some(pc) = self.factory.get_mut(player).and_then(|e| e.player_mut()) {
                pc.release();
            }
        }
        Ok(())
    }

    pub fn save_scene(&self, path: &Path) -> Result<(), SceneError> {
        scene::save_scene(&self.factory, path)
    }

    /// Write the run snapshot (clock, missions, win flag) as JSON.
    pub fn save_state(&self, path: &Path) -> Result<(), SceneError> {
        #[derive(serde::Serialize)]
        struct Snapshot {
            elapsed: f32,
            frame_count: u64,
            win: bool,
            missions: Vec<crate::events::missions::Mission>,
        }
        let snapshot = Snapshot {
            elapsed: self.time.elapsed,
            frame_count: self.time.frame_count,
            win: self.scheduler.is_win(),
            missions: self.scheduler.missions(),
        };
        let text = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Join the worker threads. Also runs on drop.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
        self.audio.shutdown();
    }
}
