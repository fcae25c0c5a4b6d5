//! SpawnSequencer – brings a networked actor into the live world.
//!
//! ## Stages
//!
//! ```text
//! Repositioning ──▶ EnablingAppearance ──▶ Resurrecting ──▶ Done
//!       │                   │                    │
//!       └───────────────────┴────────────────────┴──▶ Aborted
//! ```
//!
//! Each stage re-resolves the target id before touching the world, issues
//! exactly one suspending mutation, and only then moves on. A failed lookup
//! at any stage ends the spawn in [`SpawnState::Aborted`]: nothing further
//! is mutated and the completion callback is dropped uninvoked.
//!
//! At most one sequencer-issued mutation is in flight per target. Nothing
//! is locked; re-validation is the only guard against the world changing
//! underneath a suspended stage.

use crate::appearance::{Appearance, AppearanceApplier};
use crate::types::{FormId, MotionType, WorldPosition};
use crate::world::{
    resolve_live, ActorHandle, ActorOf, HandleOf, NonActorSetup, ObjectHandle, SpawnTarget,
    WorldHost,
};
use log::debug;
use std::rc::Rc;

/// Invoked once the whole sequence has completed. Never invoked on abort.
pub type CompletionCallback = Box<dyn FnOnce() + 'static>;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnState {
    Repositioning,
    EnablingAppearance,
    Resurrecting,
    /// Terminal: every stage ran and the callback fired.
    Done,
    /// Terminal: the target stopped resolving to itself.
    Aborted,
}

impl SpawnState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl std::fmt::Display for SpawnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Repositioning => "repositioning",
            Self::EnablingAppearance => "enabling_appearance",
            Self::Resurrecting => "resurrecting",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The world and the two external collaborators a spawn talks to.
pub struct SpawnContext<W: WorldHost> {
    pub host: Rc<W>,
    pub appearance_applier: Rc<dyn AppearanceApplier<ActorOf<W>>>,
    pub non_actor_setup: Rc<dyn NonActorSetup<HandleOf<W>>>,
}

impl<W: WorldHost> SpawnContext<W> {
    pub fn new(
        host: Rc<W>,
        appearance_applier: Rc<dyn AppearanceApplier<ActorOf<W>>>,
        non_actor_setup: Rc<dyn NonActorSetup<HandleOf<W>>>,
    ) -> Self {
        Self {
            host,
            appearance_applier,
            non_actor_setup,
        }
    }
}

impl<W: WorldHost> Clone for SpawnContext<W> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            appearance_applier: self.appearance_applier.clone(),
            non_actor_setup: self.non_actor_setup.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

pub struct SpawnSequencer<W: WorldHost> {
    ctx: SpawnContext<W>,
    appearance: Option<Appearance>,
    position: WorldPosition,
    ref_id: FormId,
    callback: Option<CompletionCallback>,
    state: SpawnState,
}

impl<W: WorldHost> SpawnSequencer<W> {
    pub fn new(
        ctx: SpawnContext<W>,
        appearance: Option<Appearance>,
        position: WorldPosition,
        ref_id: FormId,
        callback: CompletionCallback,
    ) -> Self {
        Self {
            ctx,
            appearance,
            position,
            ref_id,
            callback: Some(callback),
            state: SpawnState::Repositioning,
        }
    }

    pub fn state(&self) -> SpawnState {
        self.state
    }

    pub fn ref_id(&self) -> FormId {
        self.ref_id
    }

    /// Drive the current stage to completion.
    ///
    /// Returns the state entered afterwards. Terminal states are sticky.
    pub async fn step(&mut self) -> SpawnState {
        let next = match self.state {
            SpawnState::Repositioning => self.reposition().await,
            SpawnState::EnablingAppearance => self.enable().await,
            SpawnState::Resurrecting => self.resurrect().await,
            terminal => terminal,
        };
        self.state = next;
        next
    }

    /// Drive every remaining stage and return the terminal state.
    pub async fn run(mut self) -> SpawnState {
        while !self.state.is_terminal() {
            self.step().await;
        }
        self.state
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    async fn reposition(&mut self) -> SpawnState {
        let Some(handle) = resolve_live(&*self.ctx.host, self.ref_id) else {
            return self.abort();
        };

        debug!("Spawn {}: moving to {}", self.ref_id, self.position);
        handle.set_position(self.position).await;
        SpawnState::EnablingAppearance
    }

    async fn enable(&mut self) -> SpawnState {
        let Some(target) = self.target() else {
            return self.abort();
        };

        if let (SpawnTarget::Actor { actor, .. }, Some(appearance)) =
            (&target, self.appearance.as_ref())
        {
            debug!("Spawn {}: applying appearance", self.ref_id);
            self.ctx
                .appearance_applier
                .apply_appearance(actor, appearance);
        }

        debug!("Spawn {}: enabling", self.ref_id);
        target.handle().enable(false).await;
        SpawnState::Resurrecting
    }

    async fn resurrect(&mut self) -> SpawnState {
        let Some(target) = self.target() else {
            return self.abort();
        };

        match target {
            SpawnTarget::Actor { actor, .. } => {
                // Also required for actors that were never dead: the host only
                // fully activates an actor through resurrection.
                debug!("Spawn {}: resurrecting", self.ref_id);
                actor.resurrect().await;
            }
            SpawnTarget::Object(handle) => {
                debug!("Spawn {}: not an actor, keyframing", self.ref_id);
                let template = handle.base_template();
                self.ctx.non_actor_setup.prepare(&handle, &template);
                handle.set_motion_type(MotionType::Keyframed, true).await;
            }
        }

        if let Some(callback) = self.callback.take() {
            callback();
        }
        SpawnState::Done
    }

    fn target(&self) -> Option<SpawnTarget<HandleOf<W>>> {
        resolve_live(&*self.ctx.host, self.ref_id).map(SpawnTarget::classify)
    }

    fn abort(&mut self) -> SpawnState {
        debug!(
            "Spawn {}: target no longer resolves during {}, abandoning",
            self.ref_id, self.state
        );
        self.callback = None;
        SpawnState::Aborted
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Start a spawn on the current [`tokio::task::LocalSet`] and return at once.
///
/// The sequence drives itself; `callback` is the only completion signal.
#[cfg(feature = "server")]
pub fn spawn_in_world<W: WorldHost + 'static>(
    ctx: &SpawnContext<W>,
    appearance: Option<Appearance>,
    position: WorldPosition,
    ref_id: FormId,
    callback: CompletionCallback,
) {
    let sequencer = SpawnSequencer::new(ctx.clone(), appearance, position, ref_id, callback);
    tokio::task::spawn_local(sequencer.run());
}
