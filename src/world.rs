//! Shared simulation resources and snapshot types.
//!
//! The `Snapshot` struct provides a serializable view of the simulation
//! state that the browser shell reads to drive rendering, audio, and HUD.

use crate::components::*;
use crate::config::{GameClock, Score};
use bevy_ecs::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Deterministic RNG stream for the whole simulation. All randomness
/// (spawns, flush directions, search waypoints, shot scatter) draws from
/// this one stream so a seed fully determines a run.
#[derive(Resource)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

/// Audio cues emitted by gameplay systems, drained into each snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    Flush,
    Gunshot,
}

/// Transient per-frame events. Systems append; `Snapshot::from_world`
/// drains, so each cue is delivered to the host exactly once.
#[derive(Resource, Debug, Clone, Default)]
pub struct FrameEvents {
    pub audio: Vec<AudioCue>,
}

/// Player state for the snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HunterSnapshot {
    pub position: [f32; 3],
    pub yaw: f32,
    pub velocity: [f32; 3],
    pub ammo: u32,
    pub max_ammo: u32,
    pub reloading: bool,
    pub reload_remaining: f32,
    pub stamina: f32,
    pub running: bool,
    pub crouching: bool,
    pub moving: bool,
}

/// Dog state for the snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DogSnapshot {
    pub position: [f32; 3],
    pub yaw: f32,
    pub state: String,
    pub carrying: bool,
    pub speed: f32,
}

/// One bird's state for the snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BirdSnapshot {
    pub id: u32,
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub flushed: bool,
    pub flying: bool,
    pub shot: bool,
    pub speed: f32,
}

/// Complete simulation state snapshot for the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    /// Seconds left on the session clock.
    pub time_remaining: f32,
    pub game_over: bool,
    pub score: u32,
    pub player: HunterSnapshot,
    pub dog: DogSnapshot,
    pub birds: Vec<BirdSnapshot>,
    /// Audio cues since the previous snapshot.
    pub audio: Vec<AudioCue>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world. Drains pending audio cues.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let mut player = HunterSnapshot::default();
        let mut hunter_query = world.query_filtered::<(
            &Position,
            &Velocity,
            &Heading,
            &Ammo,
            &ReloadState,
            &Stamina,
            &MoveFlags,
        ), With<Hunter>>();
        if let Ok((pos, vel, heading, ammo, reload, stamina, flags)) =
            hunter_query.get_single(world)
        {
            player = HunterSnapshot {
                position: [pos.x, pos.y, pos.z],
                yaw: heading.yaw,
                velocity: [vel.x, vel.y, vel.z],
                ammo: ammo.current,
                max_ammo: ammo.max,
                reloading: reload.active,
                reload_remaining: reload.remaining,
                stamina: stamina.value,
                running: flags.running,
                crouching: flags.crouching,
                moving: flags.moving,
            };
        }

        let mut dog = DogSnapshot::default();
        let mut dog_query =
            world.query_filtered::<(&Position, &Heading, &DogAi), With<Dog>>();
        if let Ok((pos, heading, ai)) = dog_query.get_single(world) {
            dog = DogSnapshot {
                position: [pos.x, pos.y, pos.z],
                yaw: heading.yaw,
                state: ai.state.as_str().to_string(),
                carrying: ai.carrying,
                speed: ai.current_speed,
            };
        }

        let mut birds = Vec::new();
        let mut bird_query = world.query_filtered::<(
            &BirdId,
            &Position,
            &Velocity,
            &Heading,
            &BirdStatus,
        ), With<Pheasant>>();
        for (id, pos, vel, heading, status) in bird_query.iter(world) {
            birds.push(BirdSnapshot {
                id: id.0,
                position: [pos.x, pos.y, pos.z],
                yaw: heading.yaw,
                pitch: heading.pitch,
                flushed: status.flushed,
                flying: status.flying,
                shot: status.shot,
                speed: vel.magnitude(),
            });
        }
        // Stable ordering for the host and for diffing snapshots.
        birds.sort_by_key(|b| b.id);

        let audio = world
            .get_resource_mut::<FrameEvents>()
            .map(|mut e| std::mem::take(&mut e.audio))
            .unwrap_or_default();

        let (time_remaining, game_over) = world
            .get_resource::<GameClock>()
            .map(|c| (c.remaining, c.over))
            .unwrap_or((0.0, false));
        let score = world.get_resource::<Score>().map(|s| s.0).unwrap_or(0);

        Self {
            tick,
            time,
            time_remaining,
            game_over,
            score,
            player,
            dog,
            birds,
            audio,
        }
    }

    /// Serialize to a compact JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON (for debugging).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
