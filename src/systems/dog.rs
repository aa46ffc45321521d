//! Dog companion AI: heel, stay, search, and retrieve behavior.

use bevy_ecs::prelude::*;
use rand::Rng;

use crate::components::{
    rotate_y, wrap_angle, BirdStatus, Dog, DogAi, DogState, Heading, Hunter, Pheasant, Position,
    Velocity,
};
use crate::config::{DeltaTime, Score, SimConfig};
use crate::systems::input::{DogCommand, InputState};
use crate::terrain::Terrain;
use crate::world::SimRng;

/// Facing turn rate while closing on a heel target, per second.
const TURN_RATE_HEEL: f32 = 15.0;
/// Facing turn rate while settled at heel, matching the player's yaw.
const TURN_RATE_HEEL_IDLE: f32 = 12.0;
/// Facing turn rate in every other state.
const TURN_RATE_DEFAULT: f32 = 6.0;

/// Drives the dog: applies player commands, runs the per-state logic,
/// moves the dog toward its current goal, and keeps it on the terrain
/// and inside the world bounds.
pub fn dog_ai_system(
    mut dogs: Query<
        (&mut Position, &mut Velocity, &mut Heading, &mut DogAi),
        (With<Dog>, Without<Hunter>, Without<Pheasant>),
    >,
    players: Query<(&Position, &Velocity, &Heading), (With<Hunter>, Without<Dog>)>,
    mut birds: Query<(Entity, &Position, &mut BirdStatus), (With<Pheasant>, Without<Dog>)>,
    input: Res<InputState>,
    terrain: Res<Terrain>,
    config: Res<SimConfig>,
    dt: Res<DeltaTime>,
    mut rng: ResMut<SimRng>,
    mut score: ResMut<Score>,
) {
    let dt = dt.0;
    let params = &config.dog;
    let Ok((mut pos, mut vel, mut heading, mut ai)) = dogs.get_single_mut() else {
        return;
    };
    let Ok((player_pos, player_vel, player_heading)) = players.get_single() else {
        return;
    };

    // Commands always take effect, interrupting the current state.
    match input.dog_command {
        Some(DogCommand::Search) => ai.force_state(DogState::Search),
        Some(DogCommand::Retrieve) => ai.force_state(DogState::Retrieve),
        Some(DogCommand::Heel) => ai.force_state(DogState::Heel),
        None => {}
    }

    // Goal selection per state.
    let mut goal: Option<(f32, f32)> = None;
    let mut speed = params.base_speed;
    let mut heel_facing = false;

    match ai.state {
        DogState::Heel => {
            let (ox, _, oz) = params.heel_offset;
            let (hx, hz) = rotate_y(ox, oz, player_heading.yaw);
            let tx = player_pos.x + hx;
            let tz = player_pos.z + hz;
            let dist = ((tx - pos.x).powi(2) + (tz - pos.z).powi(2)).sqrt();
            // Chase harder the further behind the dog has fallen.
            speed = if dist > 4.0 {
                params.max_speed
            } else if dist > 2.0 {
                params.base_speed * 1.2
            } else if dist > 0.5 {
                (player_vel.horizontal_magnitude() * 1.1).max(params.base_speed * 0.8)
            } else {
                params.base_speed * 0.6
            };
            goal = Some((tx, tz));
            heel_facing = true;
        }
        DogState::Stay => {
            // Hold position, keep facing wherever the dog last looked.
        }
        DogState::Search => {
            ai.search_timer += dt;
            if ai.search_timer > params.max_search_time {
                ai.force_state(DogState::Heel);
            } else {
                let reached = ai.search_target.map_or(true, |(tx, tz)| {
                    ((tx - pos.x).powi(2) + (tz - pos.z).powi(2)).sqrt() < params.search_arrive_distance
                });
                if reached {
                    ai.search_target = Some(pick_search_waypoint(
                        &mut rng.0,
                        &terrain,
                        player_pos,
                        params.search_radius,
                        params.search_corn_bias,
                    ));
                }
                speed = params.base_speed * params.search_speed_factor;
                goal = ai.search_target;
            }
        }
        DogState::Retrieve => {
            if ai.carrying {
                // Bring the bird back to the player.
                let dist = pos.horizontal_distance_to(player_pos);
                if dist < params.deliver_distance {
                    score.0 += params.delivery_points;
                    ai.carrying = false;
                    ai.retrieve_target = None;
                    ai.force_state(DogState::Heel);
                } else {
                    speed = params.max_speed;
                    goal = Some((player_pos.x, player_pos.z));
                }
            } else {
                // The handle may be stale: the bird can despawn or change
                // state out from under us, so re-validate every tick.
                let valid = ai
                    .retrieve_target
                    .and_then(|e| birds.get(e).ok())
                    .map_or(false, |(_, _, status)| status.available_for_retrieval());
                if !valid {
                    ai.retrieve_target = nearest_downed_bird(&birds, &pos);
                }
                match ai.retrieve_target {
                    None => ai.force_state(DogState::Heel),
                    Some(target) => {
                        if let Ok((_, bird_pos, mut status)) = birds.get_mut(target) {
                            let dist = pos.horizontal_distance_to(bird_pos);
                            if dist < params.pickup_distance {
                                if status.retrieve() {
                                    ai.carrying = true;
                                }
                                ai.retrieve_target = None;
                            } else {
                                speed = params.max_speed;
                                goal = Some((bird_pos.x, bird_pos.z));
                            }
                        }
                    }
                }
            }
        }
    }

    // Movement toward the goal, with a stop-band so the dog settles
    // instead of oscillating around the target.
    let mut moving = false;
    if let Some((tx, tz)) = goal {
        let dx = tx - pos.x;
        let dz = tz - pos.z;
        let dist = (dx * dx + dz * dz).sqrt();
        if dist > params.arrive_deadband {
            vel.x = dx / dist * speed;
            vel.z = dz / dist * speed;
            pos.x += vel.x * dt;
            pos.z += vel.z * dt;
            moving = true;
        } else {
            vel.zero();
        }
    } else {
        vel.zero();
    }
    ai.current_speed = if moving { speed } else { 0.0 };

    // Facing: at heel the dog matches the player's heading (even while
    // moving); in every other state it turns toward its travel direction.
    let (target_yaw, rate) = if heel_facing {
        let rate = if moving {
            TURN_RATE_HEEL
        } else {
            TURN_RATE_HEEL_IDLE
        };
        (player_heading.yaw, rate)
    } else if moving {
        (vel.x.atan2(vel.z), TURN_RATE_DEFAULT)
    } else {
        (heading.yaw, TURN_RATE_DEFAULT)
    };
    let blend = 1.0 - (-rate * dt).exp();
    heading.yaw += wrap_angle(target_yaw - heading.yaw) * blend;

    // Stick to the terrain and stay inside the playable area.
    pos.y = terrain.height_at(pos.x, pos.z);
    let bound = config.world_bounds;
    let radial = pos.horizontal_length();
    if radial > bound {
        let scale = bound / radial;
        pos.x *= scale;
        pos.z *= scale;
    }
}

/// Pick a search waypoint: usually inside a corn field, otherwise a
/// random point on a disc around the player.
fn pick_search_waypoint<R: Rng>(
    rng: &mut R,
    terrain: &Terrain,
    player_pos: &Position,
    radius: f32,
    corn_bias: f32,
) -> (f32, f32) {
    if rng.gen::<f32>() < corn_bias {
        if let Some((x, _, z)) = terrain.0.random_corn_field_point(rng, 0.0) {
            return (x, z);
        }
    }
    let angle = rng.gen::<f32>() * std::f32::consts::TAU;
    let dist = rng.gen::<f32>() * radius;
    (
        player_pos.x + angle.cos() * dist,
        player_pos.z + angle.sin() * dist,
    )
}

fn nearest_downed_bird(
    birds: &Query<(Entity, &Position, &mut BirdStatus), (With<Pheasant>, Without<Dog>)>,
    dog_pos: &Position,
) -> Option<Entity> {
    let mut best: Option<(Entity, f32)> = None;
    for (entity, pos, status) in birds.iter() {
        if !status.available_for_retrieval() {
            continue;
        }
        let dist = dog_pos.horizontal_distance_to(pos);
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((entity, dist));
        }
    }
    best.map(|(e, _)| e)
}
