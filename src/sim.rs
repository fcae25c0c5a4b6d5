//! SimWorld – in-memory host world.
//!
//! Implements every capability the sequencer consumes so spawns can run
//! without a live game attached: the `janet-spawn-sim` binary drives it from
//! a scenario file and the integration tests drive it directly.
//!
//! Mutations suspend for the configured latency (or yield once when it is
//! zero), then apply and append a [`WorldCall`] to the journal. Objects may
//! be removed, recycled or expired while a mutation is suspended.

use crate::appearance::{Appearance, AppearanceApplier};
use crate::types::{FormId, MotionType, WorldPosition};
use crate::world::{ActorHandle, NonActorSetup, ObjectHandle, WorldHost};
use log::trace;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Npc,
    Door,
    Container,
    Furniture,
    Static,
    Misc,
}

/// The base form a placed object was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTemplate {
    pub id: FormId,
    pub kind: TemplateKind,
}

impl BaseTemplate {
    pub fn new(id: u32, kind: TemplateKind) -> Self {
        Self {
            id: FormId(id),
            kind,
        }
    }

    pub fn is_actor(&self) -> bool {
        self.kind == TemplateKind::Npc
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimObject {
    pub id: FormId,
    pub template: BaseTemplate,
    #[serde(default)]
    pub position: WorldPosition,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub motion: MotionType,
    #[serde(default)]
    pub appearance: Option<Appearance>,
    #[serde(default)]
    pub prepared: bool,
}

impl SimObject {
    /// A freshly placed, disabled object at the origin.
    pub fn new(id: u32, template: BaseTemplate) -> Self {
        Self {
            id: FormId(id),
            template,
            position: WorldPosition::zero(),
            enabled: false,
            dead: false,
            motion: MotionType::Dynamic,
            appearance: None,
            prepared: false,
        }
    }

    pub fn dead(mut self) -> Self {
        self.dead = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// A world call as observed by the host, in application order.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldCall {
    SetPosition {
        id: FormId,
        position: WorldPosition,
    },
    Enable {
        id: FormId,
        immediate: bool,
    },
    Resurrect {
        id: FormId,
    },
    SetMotionType {
        id: FormId,
        kind: MotionType,
        keep_offset: bool,
    },
    ApplyAppearance {
        id: FormId,
    },
    PrepareObject {
        id: FormId,
        template: BaseTemplate,
    },
}

impl WorldCall {
    pub fn id(&self) -> FormId {
        match self {
            Self::SetPosition { id, .. }
            | Self::Enable { id, .. }
            | Self::Resurrect { id }
            | Self::SetMotionType { id, .. }
            | Self::ApplyAppearance { id }
            | Self::PrepareObject { id, .. } => *id,
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SimState {
    objects: HashMap<FormId, SimObject>,
    // requested id -> id of the object now occupying that slot
    recycled: HashMap<FormId, FormId>,
    // remaining successful lookups before an id stops resolving
    lookup_budget: HashMap<FormId, u32>,
    journal: Vec<WorldCall>,
}

#[derive(Clone)]
pub struct SimWorld {
    state: Arc<Mutex<SimState>>,
    latency: Duration,
}

impl SimWorld {
    pub fn new(latency: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
            latency,
        }
    }

    pub fn insert(&self, object: SimObject) {
        self.state.lock().objects.insert(object.id, object);
    }

    /// Destroy an object. Handles already given out become stale.
    pub fn remove(&self, id: FormId) -> Option<SimObject> {
        self.state.lock().objects.remove(&id)
    }

    /// Make `id` resolve to the object registered as `occupant`.
    pub fn recycle(&self, id: FormId, occupant: FormId) {
        self.state.lock().recycled.insert(id, occupant);
    }

    /// Let `id` resolve `lookups` more times, then stop resolving it.
    pub fn expire_after_lookups(&self, id: FormId, lookups: u32) {
        self.state.lock().lookup_budget.insert(id, lookups);
    }

    pub fn object(&self, id: FormId) -> Option<SimObject> {
        self.state.lock().objects.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn journal(&self) -> Vec<WorldCall> {
        self.state.lock().journal.clone()
    }

    pub fn journal_for(&self, id: FormId) -> Vec<WorldCall> {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|call| call.id() == id)
            .cloned()
            .collect()
    }

    async fn settle(&self) {
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Record `call` and apply `f` to the object if it still exists.
    fn apply(&self, call: WorldCall, f: impl FnOnce(&mut SimObject)) {
        let mut state = self.state.lock();
        let id = call.id();
        trace!("SimWorld applying {:?}", call);
        state.journal.push(call);
        if let Some(object) = state.objects.get_mut(&id) {
            f(object);
        }
    }
}

impl WorldHost for SimWorld {
    type Handle = SimRef;

    fn resolve(&self, id: FormId) -> Option<SimRef> {
        let mut state = self.state.lock();

        if let Some(remaining) = state.lookup_budget.get_mut(&id) {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        let occupant = state.recycled.get(&id).copied().unwrap_or(id);
        state.objects.get(&occupant).map(|object| SimRef {
            world: self.clone(),
            id: object.id,
            template: object.template,
        })
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

pub struct SimRef {
    world: SimWorld,
    id: FormId,
    template: BaseTemplate,
}

impl ObjectHandle for SimRef {
    type Actor = SimActor;
    type Template = BaseTemplate;

    fn form_id(&self) -> FormId {
        self.id
    }

    fn as_actor(&self) -> Option<SimActor> {
        self.template.is_actor().then(|| SimActor {
            world: self.world.clone(),
            id: self.id,
        })
    }

    fn base_template(&self) -> BaseTemplate {
        self.template
    }

    async fn set_position(&self, position: WorldPosition) {
        self.world.settle().await;
        self.world
            .apply(WorldCall::SetPosition { id: self.id, position }, |o| {
                o.position = position
            });
    }

    async fn enable(&self, immediate: bool) {
        self.world.settle().await;
        self.world
            .apply(WorldCall::Enable { id: self.id, immediate }, |o| {
                o.enabled = true
            });
    }

    async fn set_motion_type(&self, kind: MotionType, keep_offset: bool) {
        self.world.settle().await;
        self.world.apply(
            WorldCall::SetMotionType {
                id: self.id,
                kind,
                keep_offset,
            },
            |o| o.motion = kind,
        );
    }
}

pub struct SimActor {
    world: SimWorld,
    id: FormId,
}

impl SimActor {
    pub fn form_id(&self) -> FormId {
        self.id
    }
}

impl ActorHandle for SimActor {
    async fn resurrect(&self) {
        self.world.settle().await;
        self.world
            .apply(WorldCall::Resurrect { id: self.id }, |o| o.dead = false);
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

impl AppearanceApplier<SimActor> for SimWorld {
    fn apply_appearance(&self, actor: &SimActor, appearance: &Appearance) {
        self.apply(WorldCall::ApplyAppearance { id: actor.id }, |o| {
            o.appearance = Some(appearance.clone())
        });
    }
}

impl NonActorSetup<SimRef> for SimWorld {
    fn prepare(&self, handle: &SimRef, template: &BaseTemplate) {
        self.apply(
            WorldCall::PrepareObject {
                id: handle.id,
                template: *template,
            },
            |o| o.prepared = true,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> SimWorld {
        let w = SimWorld::new(Duration::ZERO);
        w.insert(SimObject::new(1, BaseTemplate::new(0x7, TemplateKind::Npc)));
        w.insert(SimObject::new(2, BaseTemplate::new(0x8, TemplateKind::Door)));
        w
    }

    #[test]
    fn resolve_returns_registered_object() {
        let w = world();
        let handle = w.resolve(FormId(1)).unwrap();
        assert_eq!(handle.form_id(), FormId(1));
        assert!(handle.as_actor().is_some());
        assert!(w.resolve(FormId(2)).unwrap().as_actor().is_none());
        assert!(w.resolve(FormId(3)).is_none());
    }

    #[test]
    fn recycled_id_reports_occupant() {
        let w = world();
        w.recycle(FormId(1), FormId(2));
        assert_eq!(w.resolve(FormId(1)).unwrap().form_id(), FormId(2));
    }

    #[test]
    fn lookup_budget_expires() {
        let w = world();
        w.expire_after_lookups(FormId(1), 2);
        assert!(w.resolve(FormId(1)).is_some());
        assert!(w.resolve(FormId(1)).is_some());
        assert!(w.resolve(FormId(1)).is_none());
        assert!(w.resolve(FormId(2)).is_some());
    }

    #[test]
    fn removed_object_stops_resolving() {
        let w = world();
        assert!(w.remove(FormId(2)).is_some());
        assert!(w.resolve(FormId(2)).is_none());
        assert_eq!(w.len(), 1);
    }

    #[tokio::test]
    async fn mutations_are_journaled_and_applied() {
        let w = world();
        let handle = w.resolve(FormId(2)).unwrap();
        handle.set_position(WorldPosition::new(1.0, 2.0, 3.0)).await;
        handle.enable(false).await;

        let obj = w.object(FormId(2)).unwrap();
        assert_eq!(obj.position, WorldPosition::new(1.0, 2.0, 3.0));
        assert!(obj.enabled);
        assert_eq!(w.journal().len(), 2);
    }

    #[tokio::test]
    async fn stale_handle_mutation_is_journaled_but_not_applied() {
        let w = world();
        let handle = w.resolve(FormId(2)).unwrap();
        w.remove(FormId(2));
        handle.enable(false).await;
        assert_eq!(w.journal_for(FormId(2)).len(), 1);
        assert!(w.object(FormId(2)).is_none());
    }
}
