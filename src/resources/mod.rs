//! Process-wide services owned by the engine context.
//!
//! Nothing here is a hidden global: every resource is a field of
//! [`Engine`](crate::engine::Engine) and is passed explicitly to the
//! systems that need it.
//!
//! Submodules overview:
//! - [`gameconfig`] – INI configuration with safe defaults
//! - [`worldtime`] – fixed-timestep accumulator and step counter
//! - [`tags`] – registered tag set with file persistence
//! - [`layers`] – layer activity flags and the layer → entities index
//! - [`assets`] – name → handle registry with a missing-asset sentinel
//! - [`audio`] – bridge to the background mixer worker

pub mod assets;
pub mod audio;
pub mod gameconfig;
pub mod layers;
pub mod tags;
pub mod worldtime;
