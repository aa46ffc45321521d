//! ECS Components for the upland-hunt simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// 3D world position. Y is up; the ground plane is spanned by X and Z.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance ignoring altitude. Ground-bound actors use this for
    /// targeting so terrain relief never inflates ranges.
    pub fn horizontal_distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Horizontal distance from the world origin.
    pub fn horizontal_length(&self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }
}

/// 3D velocity vector.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Velocity {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.z = 0.0;
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn horizontal_magnitude(&self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }
}

/// Facing angles in radians. Yaw is measured from +Z toward +X
/// (`atan2(x, z)` of the facing vector); pitch is only meaningful for
/// airborne birds.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Heading {
    pub yaw: f32,
    pub pitch: f32,
}

/// Rotate a ground-plane vector by `yaw` around the Y axis.
#[inline]
pub fn rotate_y(x: f32, z: f32, yaw: f32) -> (f32, f32) {
    let (s, c) = yaw.sin_cos();
    (x * c + z * s, -x * s + z * c)
}

/// Wrap an angle into (-PI, PI].
#[inline]
pub fn wrap_angle(mut a: f32) -> f32 {
    use std::f32::consts::PI;
    while a > PI {
        a -= 2.0 * PI;
    }
    while a <= -PI {
        a += 2.0 * PI;
    }
    a
}

// ============================================================================
// IDENTITY / MARKER COMPONENTS
// ============================================================================

/// Marker for the player character.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Hunter;

/// Marker for the dog companion.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dog;

/// Marker for game birds.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Pheasant;

/// Stable bird identifier, assigned at spawn and carried into snapshots.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BirdId(pub u32);

// ============================================================================
// PLAYER COMPONENTS
// ============================================================================

/// Shotgun magazine state.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ammo {
    pub current: u32,
    pub max: u32,
}

impl Ammo {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Consume one round. Returns false (no-op) when empty.
    pub fn consume(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    pub fn refill(&mut self) {
        self.current = self.max;
    }
}

impl Default for Ammo {
    fn default() -> Self {
        Self::full(5)
    }
}

/// Reload countdown. The gun cannot fire while `active`.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReloadState {
    pub active: bool,
    pub remaining: f32,
}

impl ReloadState {
    pub fn start(&mut self, duration: f32) {
        self.active = true;
        self.remaining = duration;
    }
}

/// Sprint stamina. Running drains it; anything else recovers it.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Stamina {
    pub value: f32,
    pub max: f32,
}

impl Stamina {
    pub fn new(max: f32) -> Self {
        Self { value: max, max }
    }

    pub fn drain(&mut self, amount: f32) {
        self.value = (self.value - amount).max(0.0);
    }

    pub fn recover(&mut self, amount: f32) {
        self.value = (self.value + amount).min(self.max);
    }

    pub fn is_exhausted(&self) -> bool {
        self.value <= 0.0
    }
}

impl Default for Stamina {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Per-tick movement status flags, exported to the renderer.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MoveFlags {
    pub running: bool,
    pub crouching: bool,
    pub on_ground: bool,
    pub moving: bool,
}

// ============================================================================
// DOG COMPONENTS
// ============================================================================

/// Dog behavior states. The dog cycles among these under player command;
/// there is no terminal state.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DogState {
    #[default]
    Heel,
    Stay,
    Search,
    Retrieve,
}

impl DogState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DogState::Heel => "Heel",
            DogState::Stay => "Stay",
            DogState::Search => "Search",
            DogState::Retrieve => "Retrieve",
        }
    }
}

/// Dog AI working state.
///
/// `retrieve_target` is a non-owning handle into the flock; the bird may be
/// despawned independently, so the AI re-validates it every tick.
#[derive(Component, Debug, Clone, Default)]
pub struct DogAi {
    pub state: DogState,
    pub search_timer: f32,
    pub search_target: Option<(f32, f32)>,
    pub retrieve_target: Option<Entity>,
    pub carrying: bool,
    pub current_speed: f32,
}

impl DogAi {
    /// Force a state transition, resetting state-local bookkeeping.
    /// Always takes effect immediately.
    pub fn force_state(&mut self, state: DogState) {
        self.state = state;
        if state == DogState::Search {
            self.search_timer = 0.0;
            self.search_target = None;
        }
    }
}

// ============================================================================
// PHEASANT COMPONENTS
// ============================================================================

/// Lifecycle flags for a bird.
///
/// `flushed` is a one-way latch: once a bird has been flushed it never
/// re-hides, even after landing. `dead` marks a retrieved or out-of-bounds
/// bird awaiting purge.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BirdStatus {
    pub flushed: bool,
    pub flying: bool,
    pub shot: bool,
    pub dead: bool,
}

impl BirdStatus {
    /// Still concealed in cover, eligible for a flush check.
    pub fn hidden(&self) -> bool {
        !self.flushed && !self.flying
    }

    /// Shot, grounded, and not yet picked up.
    pub fn available_for_retrieval(&self) -> bool {
        self.shot && !self.flying && !self.dead
    }

    /// Register a hit. Rejected (returns false) when already shot or dead.
    pub fn shoot(&mut self) -> bool {
        if self.shot || self.dead {
            return false;
        }
        self.shot = true;
        self.flying = false;
        true
    }

    /// Mark the bird picked up by the dog. A dead bird cannot be
    /// retrieved twice.
    pub fn retrieve(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        true
    }
}

/// Flight clock. `max_time` is randomized per bird at spawn (8-12 s).
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Flight {
    pub time: f32,
    pub max_time: f32,
}

impl Default for Flight {
    fn default() -> Self {
        Self {
            time: 0.0,
            max_time: 10.0,
        }
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning the player character.
#[derive(Bundle, Default)]
pub struct HunterBundle {
    pub marker: Hunter,
    pub position: Position,
    pub velocity: Velocity,
    pub heading: Heading,
    pub ammo: Ammo,
    pub reload: ReloadState,
    pub stamina: Stamina,
    pub flags: MoveFlags,
}

impl HunterBundle {
    pub fn new(x: f32, y: f32, z: f32, max_ammo: u32) -> Self {
        Self {
            position: Position::new(x, y, z),
            ammo: Ammo::full(max_ammo),
            ..Default::default()
        }
    }
}

/// Bundle for spawning the dog companion.
#[derive(Bundle, Default)]
pub struct DogBundle {
    pub marker: Dog,
    pub position: Position,
    pub velocity: Velocity,
    pub heading: Heading,
    pub ai: DogAi,
}

impl DogBundle {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Position::new(x, y, z),
            ..Default::default()
        }
    }
}

/// Bundle for spawning a pheasant, hidden at its spawn point.
#[derive(Bundle, Default)]
pub struct PheasantBundle {
    pub marker: Pheasant,
    pub id: BirdId,
    pub position: Position,
    pub velocity: Velocity,
    pub heading: Heading,
    pub status: BirdStatus,
    pub flight: Flight,
}

impl PheasantBundle {
    pub fn new(id: u32, x: f32, y: f32, z: f32, max_flight_time: f32) -> Self {
        Self {
            id: BirdId(id),
            position: Position::new(x, y, z),
            flight: Flight {
                time: 0.0,
                max_time: max_flight_time,
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_horizontal_distance_ignores_altitude() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 10.0, 4.0);
        assert!((a.horizontal_distance_to(&b) - 5.0).abs() < 1e-5);
        assert!(a.distance_to(&b) > 5.0);
    }

    #[test]
    fn test_rotate_y_quarter_turn() {
        // Facing vector (0, 1) rotated by +90 degrees lands on (1, 0).
        let (x, z) = rotate_y(0.0, 1.0, FRAC_PI_2);
        assert!((x - 1.0).abs() < 1e-5);
        assert!(z.abs() < 1e-5);
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(-3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(0.5) - 0.5).abs() < 1e-6);
        // The interval is half-open: -PI maps to the included +PI end.
        assert_eq!(wrap_angle(-PI), PI);
        assert_eq!(wrap_angle(PI), PI);
    }

    #[test]
    fn test_ammo_consume_and_refill() {
        let mut ammo = Ammo::full(2);
        assert!(ammo.consume());
        assert!(ammo.consume());
        assert!(!ammo.consume());
        assert_eq!(ammo.current, 0);
        ammo.refill();
        assert!(ammo.is_full());
    }

    #[test]
    fn test_bird_shoot_rejects_double_hit() {
        let mut status = BirdStatus {
            flushed: true,
            flying: true,
            ..Default::default()
        };
        assert!(status.shoot());
        assert!(status.shot);
        assert!(!status.flying);
        assert!(!status.shoot());
    }

    #[test]
    fn test_bird_retrieve_once() {
        let mut status = BirdStatus {
            flushed: true,
            shot: true,
            ..Default::default()
        };
        assert!(status.available_for_retrieval());
        assert!(status.retrieve());
        assert!(!status.available_for_retrieval());
        assert!(!status.retrieve());
    }

    #[test]
    fn test_dog_force_state_resets_search() {
        let mut ai = DogAi {
            search_timer: 5.0,
            search_target: Some((1.0, 2.0)),
            ..Default::default()
        };
        ai.force_state(DogState::Search);
        assert_eq!(ai.state, DogState::Search);
        assert_eq!(ai.search_timer, 0.0);
        assert!(ai.search_target.is_none());
    }
}
