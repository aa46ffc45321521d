//! Pheasant flock: flushing, flight physics, landing, purge, and respawn.

use bevy_ecs::prelude::*;
use rand::Rng;

use crate::components::{
    BirdStatus, Dog, DogAi, DogState, Flight, Heading, Hunter, Pheasant, PheasantBundle, Position,
    Velocity,
};
use crate::config::{DeltaTime, FlockParams, SimConfig};
use crate::terrain::{HeightField, Terrain};
use crate::world::{AudioCue, FrameEvents, SimRng};

/// Flock bookkeeping: the respawn countdown and the next bird id.
#[derive(Resource, Debug, Clone, Default)]
pub struct FlockState {
    pub respawn_timer: f32,
    pub next_bird_id: u32,
}

impl FlockState {
    pub fn take_id(&mut self) -> u32 {
        let id = self.next_bird_id;
        self.next_bird_id += 1;
        id
    }
}

/// Per-bird update: flush checks for hidden birds, flight integration for
/// airborne ones, and terrain clamping for everything on the ground.
pub fn flock_update_system(
    mut birds: Query<
        (
            &mut Position,
            &mut Velocity,
            &mut Heading,
            &mut BirdStatus,
            &mut Flight,
        ),
        With<Pheasant>,
    >,
    players: Query<&Position, (With<Hunter>, Without<Pheasant>)>,
    dogs: Query<(&Position, &DogAi), (With<Dog>, Without<Pheasant>)>,
    terrain: Res<Terrain>,
    config: Res<SimConfig>,
    dt: Res<DeltaTime>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<FrameEvents>,
) {
    let dt = dt.0;
    let params = &config.flock;
    let player_pos = players.get_single().ok();
    let dog = dogs.get_single().ok();

    for (mut pos, mut vel, mut heading, mut status, mut flight) in birds.iter_mut() {
        if status.dead {
            continue;
        }

        if status.hidden() {
            // A searching dog flushes at close range; the player flushes
            // from a little further out regardless of what the dog does.
            let dog_flush = dog.map_or(false, |(dog_pos, ai)| {
                ai.state == DogState::Search
                    && pos.horizontal_distance_to(dog_pos) < params.flush_distance
            });
            let player_flush = player_pos.map_or(false, |p| {
                pos.horizontal_distance_to(p) < params.flush_distance * params.player_flush_factor
            });
            if dog_flush || player_flush {
                flush(&mut pos, &mut vel, &mut heading, &mut status, params, &mut rng.0);
                events.audio.push(AudioCue::Flush);
            } else {
                pos.y = terrain.height_at(pos.x, pos.z) + params.perch_height;
            }
            continue;
        }

        if status.flying {
            flight.time += dt;

            if flight.time > params.climb_duration {
                // Descent: sink rate is capped and the horizontal speed
                // bleeds off so the bird glides in rather than diving.
                vel.y += params.flight_gravity * dt;
                vel.y = vel.y.max(-params.max_sink_speed);
                vel.x *= params.descent_decay;
                vel.z *= params.descent_decay;
            } else {
                vel.y += params.flight_gravity * dt;
            }

            pos.x += vel.x * dt;
            pos.y += vel.y * dt;
            pos.z += vel.z * dt;

            heading.yaw = vel.x.atan2(vel.z);
            heading.pitch = vel.y.atan2(vel.horizontal_magnitude());

            if pos.horizontal_length() > params.dispose_distance {
                // Flew off the map for good.
                status.dead = true;
                continue;
            }

            if flight.time > flight.max_time || pos.y < params.land_height {
                status.flying = false;
                flight.time = 0.0;
                vel.zero();
                heading.pitch = 0.0;
                let ground = terrain.height_at(pos.x, pos.z) + params.perch_height;
                pos.y = pos.y.max(params.land_height).max(ground);
            }
            continue;
        }

        // Grounded (landed or shot down): rest on the terrain.
        vel.zero();
        pos.y = terrain.height_at(pos.x, pos.z) + params.perch_height;
    }
}

/// Launch a hidden bird into flight, away from the threat with some
/// angular spread.
fn flush<R: Rng>(
    pos: &mut Position,
    vel: &mut Velocity,
    heading: &mut Heading,
    status: &mut BirdStatus,
    params: &FlockParams,
    rng: &mut R,
) {
    status.flushed = true;
    status.flying = true;

    let angle = rng.gen::<f32>() * std::f32::consts::TAU;
    let climb = 0.5 + rng.gen::<f32>() * 0.3;
    let dx = angle.sin();
    let dz = angle.cos();
    let norm = (dx * dx + climb * climb + dz * dz).sqrt();
    vel.x = dx / norm * params.flight_speed;
    vel.y = climb / norm * params.flight_speed;
    vel.z = dz / norm * params.flight_speed;
    // Launch kick: the initial climb is much steeper than cruise.
    vel.y = params.launch_climb_speed;

    heading.yaw = vel.x.atan2(vel.z);
    heading.pitch = vel.y.atan2(vel.horizontal_magnitude());
    pos.y += 0.5;
}

/// Removes birds marked dead (retrieved, or gone off-map).
pub fn flock_purge_system(
    mut commands: Commands,
    birds: Query<(Entity, &BirdStatus), With<Pheasant>>,
) {
    for (entity, status) in birds.iter() {
        if status.dead {
            commands.entity(entity).despawn();
        }
    }
}

/// Tops the flock back up to capacity, one bird per respawn interval.
pub fn flock_respawn_system(
    mut commands: Commands,
    birds: Query<&Position, With<Pheasant>>,
    players: Query<&Position, (With<Hunter>, Without<Pheasant>)>,
    terrain: Res<Terrain>,
    config: Res<SimConfig>,
    dt: Res<DeltaTime>,
    mut state: ResMut<FlockState>,
    mut rng: ResMut<SimRng>,
) {
    let params = &config.flock;
    state.respawn_timer += dt.0;
    if state.respawn_timer < params.respawn_time {
        return;
    }
    if birds.iter().count() as u32 >= params.max_pheasants {
        state.respawn_timer = 0.0;
        return;
    }
    let Ok(player_pos) = players.get_single() else {
        return;
    };
    state.respawn_timer = 0.0;

    let existing: Vec<Position> = birds.iter().copied().collect();
    if let Some((x, y, z)) =
        choose_spawn_point(&mut rng.0, &terrain.0, params, player_pos, &existing)
    {
        let max_flight = params.min_flight_time + rng.0.gen::<f32>() * params.max_flight_time_extra;
        commands.spawn(PheasantBundle::new(state.take_id(), x, y, z, max_flight));
    }
}

/// Pick a concealed spawn point: biased into corn cover, kept away from
/// the player and from other birds. Gives up (returns None) after a
/// bounded number of rejected candidates.
pub fn choose_spawn_point<R: Rng>(
    rng: &mut R,
    field: &HeightField,
    params: &FlockParams,
    player_pos: &Position,
    existing: &[Position],
) -> Option<(f32, f32, f32)> {
    for _ in 0..params.spawn_retries {
        let (x, z) = if rng.gen::<f32>() < params.spawn_corn_bias {
            match field.random_corn_field_point(rng, 0.0) {
                Some((x, _, z)) => (x, z),
                None => continue,
            }
        } else {
            // Annulus around the player between min distance and the
            // spawn radius.
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            let dist = params.min_spawn_distance
                + rng.gen::<f32>() * (params.spawn_radius - params.min_spawn_distance);
            (
                player_pos.x + angle.cos() * dist,
                player_pos.z + angle.sin() * dist,
            )
        };

        let dx = x - player_pos.x;
        let dz = z - player_pos.z;
        if (dx * dx + dz * dz).sqrt() < params.min_spawn_distance {
            continue;
        }
        let too_close = existing.iter().any(|p| {
            let ex = x - p.x;
            let ez = z - p.z;
            (ex * ex + ez * ez).sqrt() < params.min_bird_spacing
        });
        if too_close {
            continue;
        }
        return Some((x, field.height_at(x, z) + params.perch_height, z));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SimWorld;
    use crate::systems::input::DogCommand;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_initial_flock_at_capacity_with_spacing() {
        let mut world = SimWorld::new_default_hunt();
        assert_eq!(world.bird_count(), 8);
        let snap_positions: Vec<[f32; 3]> =
            world.snapshot().birds.iter().map(|b| b.position).collect();
        for (i, a) in snap_positions.iter().enumerate() {
            // Min spawn distance from the player at the origin.
            let from_player = (a[0] * a[0] + a[2] * a[2]).sqrt();
            assert!(from_player >= 10.0 - 1e-3, "bird too close to player");
            for b in snap_positions.iter().skip(i + 1) {
                let dx = a[0] - b[0];
                let dz = a[2] - b[2];
                assert!((dx * dx + dz * dz).sqrt() >= 5.0 - 1e-3, "birds too close together");
            }
        }
    }

    #[test]
    fn test_player_proximity_flushes_bird() {
        let mut world = SimWorld::new_default_hunt();
        let bird = world.spawn_bird_at(0.0, 5.0);
        world.step(1.0 / 60.0);
        let status = world.world_mut().get::<BirdStatus>(bird).unwrap();
        // 5 m is inside the player flush range (4.0 * 1.5).
        assert!(status.flushed);
        assert!(status.flying);
    }

    #[test]
    fn test_distant_bird_stays_hidden() {
        let mut world = SimWorld::new_default_hunt();
        let bird = world.spawn_bird_at(0.0, 30.0);
        world.step(1.0 / 60.0);
        let status = world.world_mut().get::<BirdStatus>(bird).unwrap();
        assert!(!status.flushed);
        assert!(!status.flying);
    }

    #[test]
    fn test_searching_dog_flushes_at_close_range() {
        let mut world = SimWorld::new_default_hunt();
        let bird = world.spawn_bird_at(3.0, 3.0);
        // Bird sits between player (origin) and dog (2, 2) but outside
        // nothing: pin the dog into Search so the dog-range check fires.
        world.command_dog(DogCommand::Search);
        world.step(1.0 / 60.0);
        let status = world.world_mut().get::<BirdStatus>(bird).unwrap();
        assert!(status.flushed);
    }

    #[test]
    fn test_flush_latch_survives_landing() {
        let mut world = SimWorld::new_default_hunt();
        let bird = world.spawn_bird_at(0.0, 5.0);
        // Flush, then wait out the longest possible flight (12 s).
        for _ in 0..60 * 15 {
            world.step(1.0 / 60.0);
        }
        if let Some(status) = world.world_mut().get::<BirdStatus>(bird) {
            assert!(status.flushed);
            assert!(!status.flying, "bird should have landed");
        }
        // A landed bird keeps the latch: walking near it again must not
        // matter, it is no longer hidden().
    }

    #[test]
    fn test_purge_removes_dead_birds() {
        let mut world = SimWorld::new_default_hunt();
        let bird = world.spawn_bird_at(0.0, 30.0);
        assert_eq!(world.bird_count(), 9);
        world
            .world_mut()
            .get_mut::<BirdStatus>(bird)
            .unwrap()
            .dead = true;
        world.step(1.0 / 60.0);
        assert_eq!(world.bird_count(), 8);
    }

    #[test]
    fn test_respawn_refills_after_interval() {
        let mut world = SimWorld::new_default_hunt();
        let snap = world.snapshot();
        let victim = snap.birds[0].id;
        // Kill one bird through the ECS.
        let entities: Vec<Entity> = {
            let w = world.world_mut();
            let mut q = w.query_filtered::<Entity, With<Pheasant>>();
            q.iter(w).collect()
        };
        for e in entities {
            let w = world.world_mut();
            if w.get::<crate::components::BirdId>(e).map(|b| b.0) == Some(victim) {
                w.get_mut::<BirdStatus>(e).unwrap().dead = true;
            }
        }
        world.step(1.0 / 60.0);
        assert_eq!(world.bird_count(), 7);
        // 30 s respawn interval.
        for _ in 0..60 * 31 {
            world.step(1.0 / 60.0);
        }
        assert_eq!(world.bird_count(), 8);
    }

    #[test]
    fn test_respawn_fills_empty_flock_one_per_interval() {
        use crate::config::SimConfig;
        // Short interval so the capped refill is quick to observe.
        let mut config = SimConfig::default();
        config.flock.respawn_time = 0.5;
        let mut world = SimWorld::with_config(config);
        world.spawn_hunter_and_dog();
        assert_eq!(world.bird_count(), 0);

        // One interval elapses: exactly one bird.
        for _ in 0..31 {
            world.step(1.0 / 60.0);
        }
        assert_eq!(world.bird_count(), 1);

        // Keep running well past eight intervals; the flock fills one
        // bird at a time and never exceeds capacity.
        let mut prev = 1;
        for _ in 0..60 * 10 {
            world.step(1.0 / 60.0);
            let count = world.bird_count();
            assert!(count >= prev && count - prev <= 1);
            assert!(count <= 8);
            prev = count;
        }
        assert_eq!(prev, 8);
    }

    #[test]
    fn test_spawn_point_respects_player_distance() {
        let field = HeightField::new(11);
        let params = FlockParams::default();
        let player = Position::new(0.0, 0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..40 {
            if let Some((x, _, z)) = choose_spawn_point(&mut rng, &field, &params, &player, &[]) {
                assert!((x * x + z * z).sqrt() >= params.min_spawn_distance - 1e-3);
            }
        }
    }
}
