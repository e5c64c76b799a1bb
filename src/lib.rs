//! molten2d: a deterministic 2D action-game simulation core.
//!
//! The crate owns everything between input and output: a fixed-capacity
//! entity arena with typed components, a fixed-timestep clock, AABB
//! collision with a grid broad phase, data-driven AI state machines, a
//! background event scheduler, and JSON scene persistence. Rendering,
//! audio mixing, and window input live outside; the core consumes an
//! [`input::InputSnapshot`] per frame and exposes the entity state for a
//! front end to draw.
//!
//! The entry point is [`engine::Engine`]; one [`engine::Engine::frame`]
//! call runs the whole per-frame pipeline.

pub mod components;
pub mod engine;
pub mod entity;
pub mod events;
pub mod input;
pub mod math;
pub mod resources;
pub mod scene;
pub mod systems;
