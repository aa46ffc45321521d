//! ECS Systems for the upland-hunt simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## Tick order
//!
//! The schedule is strictly sequential; each tick runs:
//!
//! 1. `player_movement_system` - look, movement, terrain following, stamina
//! 2. `player_combat_system` - reload progress and shotgun fire
//! 3. `dog_ai_system` - commands, state logic, dog movement
//! 4. `flock_update_system` - flush checks and flight physics
//! 5. `flock_purge_system` - removes retrieved / off-map birds
//! 6. `flock_respawn_system` - refills the flock over time
//! 7. `input_reset_system` - clears one-shot input intents
//!
//! Later systems observe earlier systems' writes within the same tick;
//! the dog chases a bird shot this tick, and a bird purged this tick is
//! gone before respawn counting.

pub mod dog;
pub mod flock;
pub mod input;
pub mod player;

pub use dog::*;
pub use flock::*;
pub use input::*;
pub use player::*;
