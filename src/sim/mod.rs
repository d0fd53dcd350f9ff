//! Level simulation
//!
//! All gameplay logic lives here. It is deterministic for a given seed,
//! beat timeline and pointer sequence:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering backend or platform dependencies

pub mod autoplay;
pub mod collision;
pub mod input;
pub mod jar;
pub mod level;
pub mod scheduler;
pub mod state;

pub use autoplay::Autoplay;
pub use collision::{click_target, jar_past_floor, pointer_hits_jar};
pub use input::{ClickGate, PointerState};
pub use jar::{BreakCause, Jar, JarKind, JarPhase};
pub use level::{LevelEngine, LevelHost, PAUSE_BUTTON};
pub use scheduler::{JarPicker, SchedulerState, SpawnScheduler};
pub use state::{LevelEvent, LevelPhase, LevelResult, LevelState};
