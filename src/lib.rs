//! Janet Spawn
//!
//! Brings a remotely controlled actor into a live world once its networked
//! representation has been created.
//!
//! ## Architecture
//!
//! ```text
//! SpawnService  (service.rs)    ← request decoding, stats, completion events
//!   └── SpawnSequencer  (sequencer.rs) ← reposition → enable → resurrect
//!         ├── WorldHost / ObjectHandle  (world.rs)  ← host capability surface
//!         └── AppearanceApplier  (appearance.rs)
//! SimWorld  (sim.rs)            ← in-memory host used by the binary and tests
//! ```
//!
//! Each sequencer stage re-validates the target id before mutating it; a
//! target that disappears mid-sequence ends the spawn silently.

// Protocol and sequencing are always available (no server feature needed).
pub mod appearance;
pub mod error;
pub mod protocol;
pub mod sequencer;
pub mod types;
pub mod world;

// Runtime-backed modules require the `server` feature.
#[cfg(feature = "server")]
pub mod service;
#[cfg(feature = "server")]
pub mod sim;

pub use appearance::{Appearance, AppearanceApplier, Tint};
pub use error::{Result, SpawnError};
#[cfg(feature = "server")]
pub use sequencer::spawn_in_world;
pub use sequencer::{CompletionCallback, SpawnContext, SpawnSequencer, SpawnState};
#[cfg(feature = "server")]
pub use service::SpawnService;
#[cfg(feature = "server")]
pub use sim::{BaseTemplate, SimObject, SimWorld, TemplateKind, WorldCall};
pub use types::{FormId, MotionType, SpawnServiceConfig, SpawnStats, WorldPosition};
pub use world::{resolve_live, ActorHandle, NonActorSetup, ObjectHandle, SpawnTarget, WorldHost};
