//! Public API for the simulation.
//!
//! This module provides the main interface for the browser shell (or any
//! other host) to drive the hunt: feed input, step time, read snapshots.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 60 Hz). When
//! `step(dt)` is called, the simulation accumulates time and runs fixed
//! updates as needed. This ensures deterministic behavior regardless of
//! frame rate: the same seed and input sequence always produce the same
//! run.

use crate::components::*;
use crate::config::{DeltaTime, GameClock, Score, SimConfig, SimTick};
use crate::systems::*;
use crate::terrain::{HeightField, Terrain};
use crate::world::{FrameEvents, SimRng, Snapshot};
use bevy_ecs::prelude::*;
use rand::Rng;

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Initializing the hunt
/// - Feeding player input
/// - Stepping the simulation forward
/// - Extracting state snapshots
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
}

impl SimWorld {
    /// Create a new empty simulation world (terrain and resources only,
    /// no actors).
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a new simulation world with custom configuration.
    pub fn with_config(config: SimConfig) -> Self {
        let mut world = World::new();

        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(SimTick(0));
        world.insert_resource(Score(0));
        world.insert_resource(GameClock::new(config.game_duration));
        world.insert_resource(SimRng::from_seed(config.seed));
        world.insert_resource(Terrain(HeightField::new(config.seed)));
        world.insert_resource(InputState::default());
        world.insert_resource(FrameEvents::default());
        world.insert_resource(FlockState::default());
        world.insert_resource(config);

        // Strictly sequential schedule: later systems see earlier
        // systems' writes within the same tick.
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                player_movement_system,
                player_combat_system,
                dog_ai_system,
                flock_update_system,
                flock_purge_system,
                flock_respawn_system,
                input_reset_system,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            tick: 0,
            time: 0.0,
            time_accumulator: 0.0,
        }
    }

    /// Create a ready-to-play hunt: player and dog at the origin, flock
    /// at capacity.
    pub fn new_default_hunt() -> Self {
        let mut sim = Self::new();
        sim.spawn_hunter_and_dog();
        sim.spawn_initial_flock();
        sim
    }

    /// Spawn the player at the origin with the dog alongside.
    pub fn spawn_hunter_and_dog(&mut self) {
        let (player_y, dog_y, max_ammo) = {
            let terrain = self.world.resource::<Terrain>();
            let config = self.world.resource::<SimConfig>();
            (
                terrain.height_at(0.0, 0.0),
                terrain.height_at(2.0, 2.0),
                config.player.max_ammo,
            )
        };
        self.world
            .spawn(HunterBundle::new(0.0, player_y, 0.0, max_ammo));
        self.world.spawn(DogBundle::new(2.0, dog_y, 2.0));
    }

    /// Fill the flock to capacity around the current player position.
    pub fn spawn_initial_flock(&mut self) {
        let config = self.world.resource::<SimConfig>().clone();
        let player_pos = {
            let mut q = self.world.query_filtered::<&Position, With<Hunter>>();
            q.get_single(&self.world).copied().unwrap_or_default()
        };
        for _ in 0..config.flock.max_pheasants {
            let existing: Vec<Position> = {
                let mut q = self.world.query_filtered::<&Position, With<Pheasant>>();
                q.iter(&self.world).copied().collect()
            };
            let spawned = {
                let terrain = self.world.resource::<Terrain>().clone();
                let mut rng = self.world.resource_mut::<SimRng>();
                choose_spawn_point(&mut rng.0, &terrain.0, &config.flock, &player_pos, &existing)
                    .map(|point| {
                        let extra = rng.0.gen::<f32>() * config.flock.max_flight_time_extra;
                        (point, config.flock.min_flight_time + extra)
                    })
            };
            if let Some(((x, y, z), max_flight)) = spawned {
                let id = self.world.resource_mut::<FlockState>().take_id();
                self.world
                    .spawn(PheasantBundle::new(id, x, y, z, max_flight));
            }
        }
    }

    /// Spawn a single hidden bird at (x, z) on the terrain. Returns its
    /// entity for direct inspection.
    pub fn spawn_bird_at(&mut self, x: f32, z: f32) -> Entity {
        let (y, max_flight) = {
            let terrain = self.world.resource::<Terrain>();
            let config = self.world.resource::<SimConfig>();
            (
                terrain.height_at(x, z) + config.flock.perch_height,
                config.flock.min_flight_time,
            )
        };
        let id = self.world.resource_mut::<FlockState>().take_id();
        self.world
            .spawn(PheasantBundle::new(id, x, y, z, max_flight))
            .id()
    }

    /// Step the simulation forward by `dt` seconds.
    ///
    /// Uses fixed timestep internally - accumulates time and runs fixed
    /// updates as needed, so rendering frame rate never changes gameplay.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self
            .world
            .get_resource::<SimConfig>()
            .map(|c| c.fixed_timestep)
            .unwrap_or(1.0 / 60.0);

        self.time_accumulator += dt;
        while self.time_accumulator >= fixed_dt {
            self.fixed_update(fixed_dt);
            self.time_accumulator -= fixed_dt;
        }
    }

    /// Run a single fixed timestep update.
    fn fixed_update(&mut self, dt: f32) {
        if let Some(mut dt_res) = self.world.get_resource_mut::<DeltaTime>() {
            dt_res.0 = dt;
        }
        if let Some(mut tick_res) = self.world.get_resource_mut::<SimTick>() {
            tick_res.0 += 1;
        }

        let over = {
            let mut clock = self.world.resource_mut::<GameClock>();
            clock.tick(dt);
            clock.over
        };
        // The world freezes when the session clock runs out; time and
        // ticks keep advancing so the host can keep rendering.
        if !over {
            self.schedule.run(&mut self.world);
        }

        self.tick += 1;
        self.time += dt;
    }

    // ------------------------------------------------------------------
    // Input feeding
    // ------------------------------------------------------------------

    /// Set the held movement intent in player-local space (-1..=1 each).
    pub fn set_movement(&mut self, x: f32, z: f32) {
        let mut input = self.world.resource_mut::<InputState>();
        input.move_x = x;
        input.move_z = z;
    }

    pub fn set_run(&mut self, run: bool) {
        self.world.resource_mut::<InputState>().run = run;
    }

    pub fn set_crouch(&mut self, crouch: bool) {
        self.world.resource_mut::<InputState>().crouch = crouch;
    }

    /// Accumulate a horizontal look delta (consumed on the next tick).
    pub fn add_look_delta(&mut self, dx: f32) {
        self.world.resource_mut::<InputState>().look_dx += dx;
    }

    /// Set the aim ray from the host camera.
    pub fn set_aim_ray(&mut self, origin: [f32; 3], dir: [f32; 3]) {
        self.world.resource_mut::<InputState>().aim = AimRay { origin, dir };
    }

    /// Request a shot on the next tick.
    pub fn request_shoot(&mut self) {
        self.world.resource_mut::<InputState>().shoot = true;
    }

    /// Request a reload on the next tick.
    pub fn request_reload(&mut self) {
        self.world.resource_mut::<InputState>().reload = true;
    }

    /// Issue a dog command, applied on the next tick.
    pub fn command_dog(&mut self, command: DogCommand) {
        self.world.resource_mut::<InputState>().dog_command = Some(command);
    }

    /// Force the dog's state directly, bypassing the command path.
    pub fn force_dog_state(&mut self, state: DogState) {
        let mut q = self.world.query_filtered::<&mut DogAi, With<Dog>>();
        if let Ok(mut ai) = q.get_single_mut(&mut self.world) {
            ai.force_state(state);
        }
    }

    // ------------------------------------------------------------------
    // State accessors
    // ------------------------------------------------------------------

    pub fn score(&self) -> u32 {
        self.world.get_resource::<Score>().map(|s| s.0).unwrap_or(0)
    }

    pub fn ammo(&mut self) -> u32 {
        let mut q = self.world.query_filtered::<&Ammo, With<Hunter>>();
        q.get_single(&self.world).map(|a| a.current).unwrap_or(0)
    }

    pub fn is_reloading(&mut self) -> bool {
        let mut q = self.world.query_filtered::<&ReloadState, With<Hunter>>();
        q.get_single(&self.world).map(|r| r.active).unwrap_or(false)
    }

    pub fn dog_state(&mut self) -> DogState {
        let mut q = self.world.query_filtered::<&DogAi, With<Dog>>();
        q.get_single(&self.world)
            .map(|ai| ai.state)
            .unwrap_or_default()
    }

    pub fn bird_count(&mut self) -> usize {
        let mut q = self.world.query_filtered::<(), With<Pheasant>>();
        q.iter(&self.world).count()
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    pub fn time_remaining(&self) -> f32 {
        self.world
            .get_resource::<GameClock>()
            .map(|c| c.remaining)
            .unwrap_or(0.0)
    }

    pub fn is_game_over(&self) -> bool {
        self.world
            .get_resource::<GameClock>()
            .map(|c| c.over)
            .unwrap_or(false)
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot()
            .to_json()
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
