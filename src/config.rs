//! Simulation configuration and global tick resources.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Global simulation configuration, loaded once at world creation.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Fixed timestep in seconds (60 Hz).
    pub fixed_timestep: f32,
    /// Seed for the deterministic RNG stream.
    pub seed: u64,
    /// Session length in seconds, counted down to zero.
    pub game_duration: f32,
    /// Half-extent of the playable square; actors are kept inside it.
    pub world_bounds: f32,
    pub player: PlayerParams,
    pub dog: DogParams,
    pub flock: FlockParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            seed: 0x5EED,
            game_duration: 300.0,
            world_bounds: 100.0,
            player: PlayerParams::default(),
            dog: DogParams::default(),
            flock: FlockParams::default(),
        }
    }
}

/// Player movement and combat tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerParams {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub crouch_speed: f32,
    /// Vertical acceleration while airborne.
    pub gravity: f32,
    /// Per-tick horizontal velocity damping.
    pub friction: f32,
    /// Grounded vertical easing factor toward terrain height.
    pub terrain_smoothing: f32,
    pub mouse_sensitivity: f32,
    pub max_ammo: u32,
    pub reload_time: f32,
    /// Max perpendicular distance from the aim ray for a hit.
    pub hit_radius: f32,
    pub gun_range: f32,
    pub stamina_drain: f32,
    pub stamina_regen: f32,
}

impl Default for PlayerParams {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            run_speed: 8.0,
            crouch_speed: 2.0,
            gravity: -25.0,
            friction: 0.8,
            terrain_smoothing: 0.08,
            mouse_sensitivity: 0.005,
            max_ammo: 5,
            reload_time: 2.0,
            hit_radius: 2.0,
            gun_range: 50.0,
            stamina_drain: 30.0,
            stamina_regen: 20.0,
        }
    }
}

/// Dog AI tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DogParams {
    pub base_speed: f32,
    pub max_speed: f32,
    /// Heel offset in player-local space (left, up, behind).
    pub heel_offset: (f32, f32, f32),
    /// Search excursion radius around the player.
    pub search_radius: f32,
    /// Chance a search waypoint is drawn from a corn field.
    pub search_corn_bias: f32,
    /// Seconds before an unsuccessful search gives up.
    pub max_search_time: f32,
    pub search_speed_factor: f32,
    /// Distance at which a search waypoint counts as reached.
    pub search_arrive_distance: f32,
    pub pickup_distance: f32,
    pub deliver_distance: f32,
    /// Stop-band: no movement within this distance of the goal.
    pub arrive_deadband: f32,
    /// Points awarded for delivering a bird to the player.
    pub delivery_points: u32,
}

impl Default for DogParams {
    fn default() -> Self {
        Self {
            base_speed: 4.0,
            max_speed: 8.0,
            heel_offset: (-1.5, 0.0, 0.5),
            search_radius: 10.0,
            search_corn_bias: 0.7,
            max_search_time: 10.0,
            search_speed_factor: 0.7,
            search_arrive_distance: 1.0,
            pickup_distance: 1.0,
            deliver_distance: 2.0,
            arrive_deadband: 0.3,
            delivery_points: 15,
        }
    }
}

/// Pheasant flock tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlockParams {
    pub max_pheasants: u32,
    /// Outer radius of the annulus fallback spawn zone.
    pub spawn_radius: f32,
    /// Minimum spawn distance from the player.
    pub min_spawn_distance: f32,
    /// Minimum spacing between birds at spawn.
    pub min_bird_spacing: f32,
    /// Chance a spawn point is drawn from a corn field.
    pub spawn_corn_bias: f32,
    pub spawn_retries: u32,
    /// Seconds between respawn attempts when below capacity.
    pub respawn_time: f32,
    /// Flush when the dog searches within this range.
    pub flush_distance: f32,
    /// Player proximity flush multiplier on `flush_distance`.
    pub player_flush_factor: f32,
    pub flight_speed: f32,
    pub launch_climb_speed: f32,
    /// Vertical deceleration per second while airborne.
    pub flight_gravity: f32,
    /// Airborne seconds before descent kicks in.
    pub climb_duration: f32,
    /// Terminal sink rate during descent.
    pub max_sink_speed: f32,
    /// Per-tick horizontal decay during descent.
    pub descent_decay: f32,
    pub min_flight_time: f32,
    pub max_flight_time_extra: f32,
    /// Landing altitude threshold.
    pub land_height: f32,
    /// Horizontal distance beyond which a bird is discarded.
    pub dispose_distance: f32,
    /// Resting height above terrain for grounded birds.
    pub perch_height: f32,
}

impl Default for FlockParams {
    fn default() -> Self {
        Self {
            max_pheasants: 8,
            spawn_radius: 50.0,
            min_spawn_distance: 10.0,
            min_bird_spacing: 5.0,
            spawn_corn_bias: 0.8,
            spawn_retries: 10,
            respawn_time: 30.0,
            flush_distance: 4.0,
            player_flush_factor: 1.5,
            flight_speed: 15.0,
            launch_climb_speed: 12.0,
            flight_gravity: -2.0,
            climb_duration: 2.0,
            max_sink_speed: 2.0,
            descent_decay: 0.98,
            min_flight_time: 8.0,
            max_flight_time_extra: 4.0,
            land_height: 1.0,
            dispose_distance: 200.0,
            perch_height: 0.3,
        }
    }
}

/// Current simulation tick counter.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTick(pub u64);

/// Seconds elapsed in the current fixed update.
#[derive(Resource, Debug, Clone, Copy)]
pub struct DeltaTime(pub f32);

impl Default for DeltaTime {
    fn default() -> Self {
        Self(1.0 / 60.0)
    }
}

/// Accumulated hunt score.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct Score(pub u32);

/// Session countdown clock. When `over`, systems stop running.
#[derive(Resource, Debug, Clone, Copy)]
pub struct GameClock {
    pub remaining: f32,
    pub over: bool,
}

impl GameClock {
    pub fn new(duration: f32) -> Self {
        Self {
            remaining: duration,
            over: false,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if self.over {
            return;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.over = true;
        }
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(300.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = SimConfig::default();
        assert!((config.fixed_timestep - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(config.player.max_ammo, 5);
        assert_eq!(config.flock.max_pheasants, 8);
        assert!((config.dog.heel_offset.0 + 1.5).abs() < 1e-6);
        assert!((config.dog.search_arrive_distance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_game_clock_expires_once() {
        let mut clock = GameClock::new(1.0);
        clock.tick(0.6);
        assert!(!clock.over);
        clock.tick(0.6);
        assert!(clock.over);
        assert_eq!(clock.remaining, 0.0);
        clock.tick(0.6);
        assert_eq!(clock.remaining, 0.0);
    }
}
