//! Player movement and combat systems.

use bevy_ecs::prelude::*;
use rand::Rng;

use crate::components::{
    rotate_y, Ammo, BirdStatus, Dog, DogAi, DogState, Heading, Hunter, MoveFlags, Pheasant,
    Position, ReloadState, Stamina, Velocity,
};
use crate::config::{DeltaTime, SimConfig};
use crate::systems::input::InputState;
use crate::terrain::Terrain;
use crate::world::{AudioCue, FrameEvents, SimRng};

/// Altitude gap above the terrain beyond which the player is airborne.
const AIRBORNE_THRESHOLD: f32 = 0.2;
/// Grounded easing stops inside this band and snaps to the terrain.
const GROUND_SNAP_BAND: f32 = 0.01;

/// Integrates player look, walk/run/crouch movement, terrain following,
/// stamina, and world-bounds clamping.
pub fn player_movement_system(
    mut hunters: Query<
        (
            &mut Position,
            &mut Velocity,
            &mut Heading,
            &mut Stamina,
            &mut MoveFlags,
        ),
        With<Hunter>,
    >,
    input: Res<InputState>,
    terrain: Res<Terrain>,
    config: Res<SimConfig>,
    dt: Res<DeltaTime>,
) {
    let dt = dt.0;
    let params = &config.player;
    let Ok((mut pos, mut vel, mut heading, mut stamina, mut flags)) = hunters.get_single_mut()
    else {
        return;
    };

    heading.yaw -= input.look_dx * params.mouse_sensitivity;

    let intent_mag = (input.move_x * input.move_x + input.move_z * input.move_z).sqrt();
    let wants_move = intent_mag > 0.01;

    flags.crouching = input.crouch;
    flags.running = input.run && wants_move && !input.crouch && !stamina.is_exhausted();

    let speed = if flags.crouching {
        params.crouch_speed
    } else if flags.running {
        params.run_speed
    } else {
        params.walk_speed
    };

    if wants_move {
        // Normalize the intent so diagonals are not faster, then rotate
        // into world space about the current yaw.
        let ix = input.move_x / intent_mag;
        let iz = input.move_z / intent_mag;
        let (wx, wz) = rotate_y(ix, iz, heading.yaw);
        vel.x = wx * speed;
        vel.z = wz * speed;
    } else {
        vel.x *= params.friction;
        vel.z *= params.friction;
    }

    pos.x += vel.x * dt;
    pos.z += vel.z * dt;

    // Vertical: free fall while airborne, ease onto the terrain otherwise.
    let ground = terrain.height_at(pos.x, pos.z);
    if pos.y > ground + AIRBORNE_THRESHOLD {
        vel.y += params.gravity * dt;
        pos.y += vel.y * dt;
        if pos.y <= ground {
            pos.y = ground;
            vel.y = 0.0;
        }
        flags.on_ground = pos.y <= ground + AIRBORNE_THRESHOLD;
    } else {
        let dy = ground - pos.y;
        if dy.abs() > GROUND_SNAP_BAND {
            pos.y += dy * params.terrain_smoothing;
        } else {
            pos.y = ground;
        }
        vel.y = 0.0;
        flags.on_ground = true;
    }

    let bound = config.world_bounds;
    pos.x = pos.x.clamp(-bound, bound);
    pos.z = pos.z.clamp(-bound, bound);

    if flags.running {
        stamina.drain(params.stamina_drain * dt);
    } else {
        stamina.recover(params.stamina_regen * dt);
    }

    flags.moving = vel.horizontal_magnitude() > 0.1;
}

/// Handles reload progress, reload requests, and shotgun fire.
///
/// Firing resolves against the host-supplied aim ray: among airborne,
/// unshot birds within gun range and inside the hit radius, the one
/// closest to the ray is hit. A hit drops the bird with a scatter
/// velocity and sends the dog to retrieve.
pub fn player_combat_system(
    mut hunters: Query<(&mut Ammo, &mut ReloadState), With<Hunter>>,
    mut birds: Query<(Entity, &Position, &mut BirdStatus, &mut Velocity), With<Pheasant>>,
    mut dogs: Query<&mut DogAi, With<Dog>>,
    input: Res<InputState>,
    config: Res<SimConfig>,
    dt: Res<DeltaTime>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<FrameEvents>,
) {
    let params = &config.player;
    let Ok((mut ammo, mut reload)) = hunters.get_single_mut() else {
        return;
    };

    if reload.active {
        reload.remaining -= dt.0;
        if reload.remaining <= 0.0 {
            reload.active = false;
            reload.remaining = 0.0;
            ammo.refill();
        }
    }

    if input.reload && !reload.active && !ammo.is_full() {
        reload.start(params.reload_time);
    }

    if !input.shoot || reload.active {
        return;
    }
    if !ammo.consume() {
        // Click on empty: no shot, no sound.
        return;
    }
    events.audio.push(AudioCue::Gunshot);

    // First pass: find the best target without holding any borrow.
    let mut best: Option<(Entity, f32)> = None;
    for (entity, pos, status, _) in birds.iter() {
        if !status.flying || status.shot || status.dead {
            continue;
        }
        if input.aim.range_to_point(pos.x, pos.y, pos.z) > params.gun_range {
            continue;
        }
        let miss = input.aim.distance_to_point(pos.x, pos.y, pos.z);
        if miss < params.hit_radius && best.map_or(true, |(_, d)| miss < d) {
            best = Some((entity, miss));
        }
    }

    let Some((entity, _)) = best else {
        return;
    };
    if let Ok((_, _, mut status, mut vel)) = birds.get_mut(entity) {
        if status.shoot() {
            // Tumble: small lateral scatter plus a hard downward kick.
            vel.x = (rng.0.gen::<f32>() - 0.5) * 5.0;
            vel.y = -2.0;
            vel.z = (rng.0.gen::<f32>() - 0.5) * 5.0;
            if let Ok(mut dog) = dogs.get_single_mut() {
                dog.force_state(DogState::Retrieve);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SimWorld;
    use crate::components::Flight;

    fn hunt_world() -> SimWorld {
        SimWorld::new_default_hunt()
    }

    #[test]
    fn test_walk_forward_moves_player() {
        let mut world = hunt_world();
        world.set_movement(0.0, 1.0);
        for _ in 0..60 {
            world.step(1.0 / 60.0);
        }
        let snap = world.snapshot();
        // Yaw starts at 0, so forward intent moves along +Z.
        assert!(snap.player.position[2] > 2.0);
        assert!(snap.player.position[0].abs() < 0.5);
    }

    #[test]
    fn test_running_drains_stamina_and_outpaces_walking() {
        let mut walk = hunt_world();
        walk.set_movement(0.0, 1.0);
        let mut run = hunt_world();
        run.set_movement(0.0, 1.0);
        run.set_run(true);
        for _ in 0..120 {
            walk.step(1.0 / 60.0);
            run.step(1.0 / 60.0);
        }
        let walked = walk.snapshot().player.position[2];
        let ran = run.snapshot().player.position[2];
        assert!(ran > walked);
        assert!(run.snapshot().player.stamina < 100.0);
    }

    #[test]
    fn test_player_clamped_to_world_bounds() {
        let mut world = hunt_world();
        world.set_movement(0.0, 1.0);
        world.set_run(true);
        // More than enough time to cross the whole map.
        for _ in 0..60 * 60 {
            world.step(1.0 / 60.0);
        }
        let pos = world.snapshot().player.position;
        assert!(pos[0].abs() <= 100.0 + 1e-3);
        assert!(pos[2].abs() <= 100.0 + 1e-3);
    }

    #[test]
    fn test_shoot_with_empty_magazine_is_noop() {
        let mut world = hunt_world();
        for _ in 0..5 {
            world.request_shoot();
            world.step(1.0 / 60.0);
        }
        assert_eq!(world.ammo(), 0);
        world.request_shoot();
        world.step(1.0 / 60.0);
        assert_eq!(world.ammo(), 0);
        assert!(!world.is_reloading());
    }

    #[test]
    fn test_reload_refills_after_duration() {
        let mut world = hunt_world();
        world.request_shoot();
        world.step(1.0 / 60.0);
        assert_eq!(world.ammo(), 4);
        world.request_reload();
        // 2.0 s reload at 50 ms steps: still going after 1.9 s.
        for _ in 0..38 {
            world.step(0.05);
        }
        assert!(world.is_reloading());
        assert_eq!(world.ammo(), 4);
        for _ in 0..3 {
            world.step(0.05);
        }
        assert!(!world.is_reloading());
        assert_eq!(world.ammo(), 5);
    }

    #[test]
    fn test_reload_when_full_is_noop() {
        let mut world = hunt_world();
        world.request_reload();
        world.step(1.0 / 60.0);
        assert!(!world.is_reloading());
    }

    #[test]
    fn test_aimed_shot_downs_flying_bird() {
        let mut world = hunt_world();
        let bird = world.spawn_bird_at(0.0, 20.0);
        {
            let w = world.world_mut();
            let mut status = w.get_mut::<BirdStatus>(bird).unwrap();
            status.flushed = true;
            status.flying = true;
            let mut pos = w.get_mut::<Position>(bird).unwrap();
            pos.y = 8.0;
            let mut flight = w.get_mut::<Flight>(bird).unwrap();
            flight.max_time = 1000.0;
        }
        world.set_aim_ray([0.0, 8.0, 0.0], [0.0, 0.0, 1.0]);
        world.request_shoot();
        world.step(1.0 / 60.0);

        assert_eq!(world.ammo(), 4);
        let status = world.world_mut().get::<BirdStatus>(bird).unwrap();
        assert!(status.shot);
        assert!(!status.flying);
        assert_eq!(world.dog_state(), DogState::Retrieve);
    }

    #[test]
    fn test_missed_shot_spends_ammo_only() {
        let mut world = hunt_world();
        let bird = world.spawn_bird_at(0.0, 20.0);
        {
            let w = world.world_mut();
            let mut status = w.get_mut::<BirdStatus>(bird).unwrap();
            status.flushed = true;
            status.flying = true;
        }
        // Aim well away from the bird.
        world.set_aim_ray([0.0, 1.7, 0.0], [0.0, 0.0, -1.0]);
        world.request_shoot();
        world.step(1.0 / 60.0);

        assert_eq!(world.ammo(), 4);
        let status = world.world_mut().get::<BirdStatus>(bird).unwrap();
        assert!(!status.shot);
    }
}
