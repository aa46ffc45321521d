//! Render Host Bridge
//!
//! This module provides the interface between the Rust ECS simulation and
//! the rendering host (the browser shell via wasm, or any native embedder).
//! It converts simulation state into a flat numeric format for efficient
//! cross-boundary transfer.
//!
//! # Stable Contract
//!
//! This module defines a **stable binary format** for transferring
//! simulation state to the host. The format is designed for:
//! - **Efficiency**: Contiguous f32 array, a single copy per frame
//! - **Simplicity**: Fixed strides, predictable layout
//! - **Stability**: Field order and count are versioned and documented
//!
//! # Buffer Layout (Version 1.0)
//!
//! The flat buffer is a `Vec<f32>` with the following structure:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ HEADER (4 elements)                                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ [0] bird_count (as f32)                                      │
//! │ [1] score (as f32)                                           │
//! │ [2] time_remaining (seconds)                                 │
//! │ [3] game_over (1.0 = over, 0.0 = running)                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │ PLAYER BLOCK (PLAYER_STRIDE elements at offset 4)            │
//! │   [+0..3]  x, y, z       - position (world units)            │
//! │   [+3]     yaw           - facing (radians)                  │
//! │   [+4]     ammo          - rounds in the magazine            │
//! │   [+5]     max_ammo      - magazine capacity                 │
//! │   [+6]     reloading     - 1.0 while reloading               │
//! │   [+7]     reload_left   - seconds until the reload finishes │
//! │   [+8]     stamina       - 0..100                            │
//! │   [+9]     running       - 1.0 while sprinting               │
//! │   [+10]    crouching     - 1.0 while crouched                │
//! │   [+11]    moving        - 1.0 while moving                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ DOG BLOCK (DOG_STRIDE elements after the player)             │
//! │   [+0..3]  x, y, z       - position                          │
//! │   [+3]     yaw           - facing (radians)                  │
//! │   [+4]     state_id      - see DOG_STATE_* constants         │
//! │   [+5]     carrying      - 1.0 while carrying a bird         │
//! │   [+6]     speed         - current speed (units/sec)         │
//! │   [+7]     moving        - 1.0 while moving                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ BIRD DATA (bird_count × BIRD_STRIDE elements)                │
//! │ For each bird i:                                             │
//! │   [+0]     id            - bird id (u32 as f32)              │
//! │   [+1..4]  x, y, z       - position                          │
//! │   [+4]     yaw           - facing (radians)                  │
//! │   [+5]     pitch         - climb/dive angle (radians)        │
//! │   [+6]     flying        - 1.0 while airborne                │
//! │   [+7]     shot          - 1.0 once hit                      │
//! │   [+8]     flushed       - 1.0 once flushed                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Dog State Mapping
//!
//! | State    | ID  |
//! |----------|-----|
//! | Heel     | 0.0 |
//! | Stay     | 1.0 |
//! | Search   | 2.0 |
//! | Retrieve | 3.0 |
//!
//! # Determinism
//!
//! The buffer is deterministic: given the same `Snapshot`, the output is
//! identical. Birds are serialized in ascending id order (the snapshot
//! already sorts them).

use crate::world::Snapshot;

// ============================================================================
// CONSTANTS - STABLE CONTRACT
// ============================================================================

/// Number of f32 values in the buffer header:
/// bird_count, score, time_remaining, game_over.
pub const HEADER_SIZE: usize = 4;

/// Number of f32 values in the player block.
///
/// **This is part of the stable contract. Do not change without versioning.**
///
/// Fields (in order):
/// 0. x, 1. y, 2. z, 3. yaw, 4. ammo, 5. max_ammo, 6. reloading,
/// 7. reload_left, 8. stamina, 9. running, 10. crouching, 11. moving
pub const PLAYER_STRIDE: usize = 12;

/// Number of f32 values in the dog block.
///
/// Fields (in order):
/// 0. x, 1. y, 2. z, 3. yaw, 4. state_id, 5. carrying, 6. speed, 7. moving
pub const DOG_STRIDE: usize = 8;

/// Number of f32 values per bird.
///
/// Fields (in order):
/// 0. id, 1. x, 2. y, 3. z, 4. yaw, 5. pitch, 6. flying, 7. shot, 8. flushed
pub const BIRD_STRIDE: usize = 9;

// Dog state constants for the host
/// Dog state: at heel beside the player
pub const DOG_STATE_HEEL: f32 = 0.0;
/// Dog state: holding position
pub const DOG_STATE_STAY: f32 = 1.0;
/// Dog state: quartering for birds
pub const DOG_STATE_SEARCH: f32 = 2.0;
/// Dog state: fetching a downed bird
pub const DOG_STATE_RETRIEVE: f32 = 3.0;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Convert a dog state string to its numeric ID for the host.
///
/// # Mapping
/// - "Heel" → 0.0
/// - "Stay" → 1.0
/// - "Search" → 2.0
/// - "Retrieve" → 3.0
/// - Unknown → 0.0 (defaults to Heel)
#[inline]
pub fn dog_state_to_id(state: &str) -> f32 {
    match state {
        "Heel" => DOG_STATE_HEEL,
        "Stay" => DOG_STATE_STAY,
        "Search" => DOG_STATE_SEARCH,
        "Retrieve" => DOG_STATE_RETRIEVE,
        _ => DOG_STATE_HEEL,
    }
}

#[inline]
fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

// ============================================================================
// MAIN SERIALIZATION FUNCTION
// ============================================================================

/// Convert a simulation snapshot to a flat buffer for transfer to the host.
///
/// # Layout Summary
///
/// - Header: bird_count, score, time_remaining, game_over
/// - Player block at `HEADER_SIZE`
/// - Dog block at `HEADER_SIZE + PLAYER_STRIDE`
/// - Bird `i` at `bird_offset(i)`
///
/// # Determinism
///
/// This function is deterministic: the same `Snapshot` always produces
/// the same output buffer.
pub fn snapshot_to_flatbuffer(snapshot: &Snapshot) -> Vec<f32> {
    let bird_count = snapshot.birds.len();
    let buffer_size = HEADER_SIZE + PLAYER_STRIDE + DOG_STRIDE + bird_count * BIRD_STRIDE;
    let mut buffer = Vec::with_capacity(buffer_size);

    // Header
    buffer.push(bird_count as f32);
    buffer.push(snapshot.score as f32);
    buffer.push(snapshot.time_remaining);
    buffer.push(flag(snapshot.game_over));

    // Player block
    let p = &snapshot.player;
    buffer.push(p.position[0]);
    buffer.push(p.position[1]);
    buffer.push(p.position[2]);
    buffer.push(p.yaw);
    buffer.push(p.ammo as f32);
    buffer.push(p.max_ammo as f32);
    buffer.push(flag(p.reloading));
    buffer.push(p.reload_remaining);
    buffer.push(p.stamina);
    buffer.push(flag(p.running));
    buffer.push(flag(p.crouching));
    buffer.push(flag(p.moving));

    // Dog block
    let d = &snapshot.dog;
    buffer.push(d.position[0]);
    buffer.push(d.position[1]);
    buffer.push(d.position[2]);
    buffer.push(d.yaw);
    buffer.push(dog_state_to_id(&d.state));
    buffer.push(flag(d.carrying));
    buffer.push(d.speed);
    buffer.push(flag(d.speed > 0.0));

    // Bird data: fixed stride per bird
    for bird in &snapshot.birds {
        buffer.push(bird.id as f32);
        buffer.push(bird.position[0]);
        buffer.push(bird.position[1]);
        buffer.push(bird.position[2]);
        buffer.push(bird.yaw);
        buffer.push(bird.pitch);
        buffer.push(flag(bird.flying));
        buffer.push(flag(bird.shot));
        buffer.push(flag(bird.flushed));
    }

    debug_assert_eq!(buffer.len(), buffer_size, "Buffer size mismatch");
    buffer
}

/// Calculate the required buffer size for a given bird count.
#[inline]
pub fn calculate_buffer_size(bird_count: usize) -> usize {
    HEADER_SIZE + PLAYER_STRIDE + DOG_STRIDE + bird_count * BIRD_STRIDE
}

/// Parse the bird count from a flat buffer.
///
/// Returns `None` if the buffer is empty.
#[inline]
pub fn parse_bird_count(buffer: &[f32]) -> Option<usize> {
    if buffer.is_empty() {
        return None;
    }
    Some(buffer[0] as usize)
}

/// Buffer offset of the player block.
#[inline]
pub const fn player_offset() -> usize {
    HEADER_SIZE
}

/// Buffer offset of the dog block.
#[inline]
pub const fn dog_offset() -> usize {
    HEADER_SIZE + PLAYER_STRIDE
}

/// Buffer offset of a specific bird index.
#[inline]
pub const fn bird_offset(bird_index: usize) -> usize {
    HEADER_SIZE + PLAYER_STRIDE + DOG_STRIDE + bird_index * BIRD_STRIDE
}

// ============================================================================
// FIELD OFFSET CONSTANTS (for host-side parsing)
// ============================================================================

/// Offset within the player block for: ammo
pub const PLAYER_FIELD_AMMO: usize = 4;
/// Offset within the player block for: reloading flag
pub const PLAYER_FIELD_RELOADING: usize = 6;
/// Offset within the player block for: stamina
pub const PLAYER_FIELD_STAMINA: usize = 8;

/// Offset within the dog block for: state id
pub const DOG_FIELD_STATE: usize = 4;
/// Offset within the dog block for: carrying flag
pub const DOG_FIELD_CARRYING: usize = 5;

/// Offset within bird data for: id
pub const BIRD_FIELD_ID: usize = 0;
/// Offset within bird data for: flying flag
pub const BIRD_FIELD_FLYING: usize = 6;
/// Offset within bird data for: shot flag
pub const BIRD_FIELD_SHOT: usize = 7;
/// Offset within bird data for: flushed flag
pub const BIRD_FIELD_FLUSHED: usize = 8;

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SimWorld;

    #[test]
    fn test_flatbuffer_layout() {
        let mut sim = SimWorld::new_default_hunt();
        sim.step(1.0 / 60.0);
        let snapshot = sim.snapshot();
        let buffer = snapshot_to_flatbuffer(&snapshot);

        let bird_count = buffer[0] as usize;
        assert_eq!(bird_count, 8);
        assert_eq!(buffer.len(), calculate_buffer_size(bird_count));

        // Header
        assert_eq!(buffer[1], 0.0, "score starts at zero");
        assert!(buffer[2] > 0.0, "clock still running");
        assert_eq!(buffer[3], 0.0, "not game over");

        // Player block
        let p = player_offset();
        assert_eq!(buffer[p + PLAYER_FIELD_AMMO], 5.0);
        assert_eq!(buffer[p + PLAYER_FIELD_RELOADING], 0.0);
        assert_eq!(buffer[p + PLAYER_FIELD_STAMINA], 100.0);

        // Dog block: heel at start
        let d = dog_offset();
        assert_eq!(buffer[d + DOG_FIELD_STATE], DOG_STATE_HEEL);
        assert_eq!(buffer[d + DOG_FIELD_CARRYING], 0.0);

        // Birds: hidden at start, ids ascending
        for i in 0..bird_count {
            let o = bird_offset(i);
            assert_eq!(buffer[o + BIRD_FIELD_FLYING], 0.0);
            assert_eq!(buffer[o + BIRD_FIELD_SHOT], 0.0);
            assert_eq!(buffer[o + BIRD_FIELD_FLUSHED], 0.0);
            if i > 0 {
                assert!(buffer[o + BIRD_FIELD_ID] > buffer[bird_offset(i - 1) + BIRD_FIELD_ID]);
            }
        }
    }

    #[test]
    fn test_flatbuffer_empty_world() {
        let mut sim = SimWorld::new();
        let snapshot = sim.snapshot();
        let buffer = snapshot_to_flatbuffer(&snapshot);
        // No birds: header plus the two actor blocks (zeroed defaults).
        assert_eq!(buffer.len(), HEADER_SIZE + PLAYER_STRIDE + DOG_STRIDE);
        assert_eq!(buffer[0], 0.0);
    }

    #[test]
    fn test_flatbuffer_determinism() {
        let mut sim1 = SimWorld::new_default_hunt();
        let mut sim2 = SimWorld::new_default_hunt();
        for _ in 0..30 {
            sim1.step(1.0 / 60.0);
            sim2.step(1.0 / 60.0);
        }
        let b1 = snapshot_to_flatbuffer(&sim1.snapshot());
        let b2 = snapshot_to_flatbuffer(&sim2.snapshot());
        assert_eq!(b1, b2, "identical runs must produce identical buffers");
    }

    #[test]
    fn test_dog_state_to_id() {
        assert_eq!(dog_state_to_id("Heel"), DOG_STATE_HEEL);
        assert_eq!(dog_state_to_id("Stay"), DOG_STATE_STAY);
        assert_eq!(dog_state_to_id("Search"), DOG_STATE_SEARCH);
        assert_eq!(dog_state_to_id("Retrieve"), DOG_STATE_RETRIEVE);
        assert_eq!(dog_state_to_id("Unknown"), DOG_STATE_HEEL);
    }

    #[test]
    fn test_parse_bird_count() {
        assert_eq!(parse_bird_count(&[]), None);
        assert_eq!(parse_bird_count(&[5.0]), Some(5));
        assert_eq!(parse_bird_count(&[0.0]), Some(0));
    }

    #[test]
    fn test_offsets_are_consistent() {
        assert_eq!(player_offset(), HEADER_SIZE);
        assert_eq!(dog_offset(), player_offset() + PLAYER_STRIDE);
        assert_eq!(bird_offset(0), dog_offset() + DOG_STRIDE);
        assert_eq!(bird_offset(3), bird_offset(0) + 3 * BIRD_STRIDE);
    }
}
