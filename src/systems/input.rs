//! Input intent resource and end-of-tick edge clearing.
//!
//! The host (browser shell, test, demo) writes intents into [`InputState`]
//! between frames; systems only read it. One-shot intents are cleared by
//! [`input_reset_system`] at the end of the schedule so that a frame which
//! runs several fixed updates fires each of them exactly once.

use bevy_ecs::prelude::*;

/// One-shot dog commands issued by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DogCommand {
    Search,
    Retrieve,
    Heel,
}

/// An aim ray in world space, supplied by the host camera.
#[derive(Debug, Clone, Copy)]
pub struct AimRay {
    pub origin: [f32; 3],
    pub dir: [f32; 3],
}

impl AimRay {
    /// Perpendicular distance from the ray to a point, with the closest
    /// approach clamped to the forward half of the ray.
    pub fn distance_to_point(&self, x: f32, y: f32, z: f32) -> f32 {
        let ox = x - self.origin[0];
        let oy = y - self.origin[1];
        let oz = z - self.origin[2];
        let t = (ox * self.dir[0] + oy * self.dir[1] + oz * self.dir[2]).max(0.0);
        let px = self.origin[0] + self.dir[0] * t;
        let py = self.origin[1] + self.dir[1] * t;
        let pz = self.origin[2] + self.dir[2] * t;
        let dx = x - px;
        let dy = y - py;
        let dz = z - pz;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance from the ray origin to a point.
    pub fn range_to_point(&self, x: f32, y: f32, z: f32) -> f32 {
        let dx = x - self.origin[0];
        let dy = y - self.origin[1];
        let dz = z - self.origin[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl Default for AimRay {
    fn default() -> Self {
        Self {
            origin: [0.0, 1.7, 0.0],
            dir: [0.0, 0.0, 1.0],
        }
    }
}

/// Abstract input intents for the current tick.
///
/// Held intents (`move_x`, `run`, ...) persist until the host changes them;
/// edge intents (`shoot`, `reload`, `dog_command`, `look_dx`) are consumed
/// once per tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct InputState {
    /// Strafe intent in player-local space, -1..=1.
    pub move_x: f32,
    /// Forward intent in player-local space, -1..=1 (positive = forward).
    pub move_z: f32,
    pub run: bool,
    pub crouch: bool,
    /// Accumulated horizontal look delta since the last tick.
    pub look_dx: f32,
    pub shoot: bool,
    pub reload: bool,
    pub dog_command: Option<DogCommand>,
    pub aim: AimRay,
}

/// Clears edge-triggered intents after all gameplay systems have run.
pub fn input_reset_system(mut input: ResMut<InputState>) {
    input.shoot = false;
    input.reload = false;
    input.dog_command = None;
    input.look_dx = 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_distance_perpendicular() {
        let ray = AimRay {
            origin: [0.0, 0.0, 0.0],
            dir: [0.0, 0.0, 1.0],
        };
        assert!((ray.distance_to_point(3.0, 0.0, 10.0) - 3.0).abs() < 1e-5);
        assert!(ray.distance_to_point(0.0, 0.0, 25.0) < 1e-5);
    }

    #[test]
    fn test_ray_distance_behind_origin_clamps() {
        let ray = AimRay {
            origin: [0.0, 0.0, 0.0],
            dir: [0.0, 0.0, 1.0],
        };
        // Point behind the muzzle measures to the origin, not the backward ray.
        assert!((ray.distance_to_point(0.0, 0.0, -5.0) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_input_reset_clears_edges_only() {
        let mut world = World::new();
        world.insert_resource(InputState {
            move_z: 1.0,
            run: true,
            shoot: true,
            reload: true,
            look_dx: 0.4,
            dog_command: Some(DogCommand::Search),
            ..Default::default()
        });
        let mut schedule = Schedule::default();
        schedule.add_systems(input_reset_system);
        schedule.run(&mut world);

        let input = world.resource::<InputState>();
        assert!(!input.shoot);
        assert!(!input.reload);
        assert!(input.dog_command.is_none());
        assert_eq!(input.look_dx, 0.0);
        // Held intents survive.
        assert_eq!(input.move_z, 1.0);
        assert!(input.run);
    }
}
