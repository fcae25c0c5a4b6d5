//! Core spawn types shared across all modules.

use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable reference id of a world object.
///
/// Unlike a handle, the id outlives any in-memory representation of the
/// object. It is the only thing a spawn holds on to between stages.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(pub u32);

impl FormId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for FormId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for FormId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct WorldPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl From<[f32; 3]> for WorldPosition {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl std::fmt::Display for WorldPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Physics motion
// ---------------------------------------------------------------------------

/// Motion kinds understood by the host physics layer.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotionType {
    #[default]
    Dynamic,
    SphereInertia,
    BoxInertia,
    /// Position driven externally instead of by the simulation.
    Keyframed,
    Fixed,
    ThinBoxInertia,
    Character,
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpawnStats {
    pub requested: u64,
    pub completed: u64,
    pub aborted: u64,
}

impl SpawnStats {
    /// Spawns that have neither completed nor been abandoned yet.
    pub fn in_flight(&self) -> u64 {
        self.requested
            .saturating_sub(self.completed)
            .saturating_sub(self.aborted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpawnServiceConfig {
    /// Session name stamped on every outbound event.
    pub session: String,
    /// Simulated settle time of a single world mutation, in milliseconds.
    pub mutation_latency_ms: u64,
}

impl Default for SpawnServiceConfig {
    fn default() -> Self {
        Self {
            session: "default".into(),
            mutation_latency_ms: 50,
        }
    }
}

impl SpawnServiceConfig {
    /// Layer defaults, an optional config file and `SPAWN_*` env vars.
    pub fn load(path: Option<&Path>) -> crate::error::Result<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("session", defaults.session)?
            .set_default("mutation_latency_ms", defaults.mutation_latency_ms)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let cfg = builder
            .add_source(config::Environment::with_prefix("SPAWN"))
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }

    pub fn mutation_latency(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.mutation_latency_ms)
    }
}
