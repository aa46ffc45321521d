//! Upland Hunt - Simulation Core
//!
//! A deterministic, fixed-timestep ECS simulation of a third-person
//! pheasant hunt: terrain, a player with a shotgun, a working dog, and a
//! flock of birds hiding in corn cover. Uses `bevy_ecs` for the
//! entity-component-system architecture; rendering, audio, and input
//! capture live in the host, which talks to this crate through
//! [`api::SimWorld`], JSON snapshots, and a flat render buffer.

pub mod api;
pub mod components;
pub mod config;
pub mod profiler;
pub mod render_bridge;
pub mod systems;
pub mod terrain;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::{
    DeltaTime, DogParams, FlockParams, GameClock, PlayerParams, Score, SimConfig, SimTick,
};
pub use systems::*;
pub use terrain::{CornField, HeightField, Terrain};
pub use world::{AudioCue, Snapshot};
