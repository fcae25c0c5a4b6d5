//! `spawn.*` wire protocol.
//!
//! Every message that crosses the boundary between the spawn service and
//! whatever decides *when* an actor should appear (session layer, replay
//! tool, scenario file).
//!
//! ## Design rules
//!
//! 1. Every struct is `Serialize + Deserialize` with snake_case JSON.
//! 2. Handles never cross the wire, only stable reference ids.
//! 3. Every outbound event includes `frame: u64` and `session: String`.
//! 4. Abandoned spawns produce no event.

use crate::appearance::Appearance;
use crate::types::{FormId, WorldPosition};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

/// Every outbound message is wrapped in this envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnEvent<T> {
    pub session: String,
    pub frame: u64,
    pub payload: T,
}

impl<T> SpawnEvent<T> {
    pub fn new(session: impl Into<String>, frame: u64, payload: T) -> Self {
        Self {
            session: session.into(),
            frame,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound  (subject: spawn.request)
// ---------------------------------------------------------------------------

/// Bring the already-created object `ref_id` into the world at `(x, y, z)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub ref_id: FormId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Absent means keep the default appearance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<Appearance>,
}

impl SpawnRequest {
    pub fn position(&self) -> WorldPosition {
        WorldPosition::new(self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Outbound  (subject: spawn.completed)
// ---------------------------------------------------------------------------

/// The target is positioned, enabled and active in the simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpawnCompleted {
    pub ref_id: FormId,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

#[cfg(feature = "server")]
pub fn encode<T: Serialize>(event: &SpawnEvent<T>) -> crate::error::Result<bytes::Bytes> {
    serde_json::to_vec(event)
        .map(bytes::Bytes::from)
        .map_err(crate::error::SpawnError::Encode)
}

// ---------------------------------------------------------------------------
// Subject helpers
// ---------------------------------------------------------------------------

pub mod subjects {
    pub const SPAWN_REQUEST: &str = "spawn.request";
    pub const SPAWN_COMPLETED: &str = "spawn.completed";
}
