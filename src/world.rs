//! Host world capability surface consumed by the spawn sequencer.
//!
//! The host owns every world object. This crate only ever sees transient
//! handles obtained through [`WorldHost::resolve`], and never keeps one
//! across a suspension point without re-validating it first.

use crate::types::{FormId, MotionType, WorldPosition};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Resolves stable ids to handles against current world state.
pub trait WorldHost {
    type Handle: ObjectHandle;

    fn resolve(&self, id: FormId) -> Option<Self::Handle>;
}

/// A transient reference to a placed world object.
///
/// Every `async fn` suspends until the host has applied the mutation.
#[allow(async_fn_in_trait)]
pub trait ObjectHandle {
    type Actor: ActorHandle;
    type Template;

    /// The id the object itself reports right now.
    fn form_id(&self) -> FormId;

    /// Capability check: `Some` if the object supports life/death state.
    fn as_actor(&self) -> Option<Self::Actor>;

    fn base_template(&self) -> Self::Template;

    async fn set_position(&self, position: WorldPosition);

    async fn enable(&self, immediate: bool);

    async fn set_motion_type(&self, kind: MotionType, keep_offset: bool);
}

#[allow(async_fn_in_trait)]
pub trait ActorHandle {
    async fn resurrect(&self);
}

/// Object-kind specific preparation for targets that are not actors.
pub trait NonActorSetup<H: ObjectHandle> {
    fn prepare(&self, handle: &H, template: &H::Template);
}

pub type HandleOf<W> = <W as WorldHost>::Handle;
pub type ActorOf<W> = <HandleOf<W> as ObjectHandle>::Actor;

// ---------------------------------------------------------------------------
// Identity validation
// ---------------------------------------------------------------------------

/// Resolve `id` and return the handle only if it still reports `id`.
///
/// Must be called afresh before every mutating step: ids get recycled,
/// and a stale handle may point at an unrelated object.
pub fn resolve_live<W: WorldHost + ?Sized>(host: &W, id: FormId) -> Option<W::Handle> {
    host.resolve(id).filter(|handle| handle.form_id() == id)
}

// ---------------------------------------------------------------------------
// Capability classification
// ---------------------------------------------------------------------------

/// A validated target, classified by what it can do.
pub enum SpawnTarget<H: ObjectHandle> {
    Actor { handle: H, actor: H::Actor },
    Object(H),
}

impl<H: ObjectHandle> SpawnTarget<H> {
    pub fn classify(handle: H) -> Self {
        match handle.as_actor() {
            Some(actor) => Self::Actor { handle, actor },
            None => Self::Object(handle),
        }
    }

    pub fn handle(&self) -> &H {
        match self {
            Self::Actor { handle, .. } | Self::Object(handle) => handle,
        }
    }

    pub fn is_actor(&self) -> bool {
        matches!(self, Self::Actor { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixture {
        // requested id -> (reported id, is actor)
        entries: HashMap<FormId, (FormId, bool)>,
    }

    struct FakeHandle {
        reported: FormId,
        actor: bool,
    }

    struct FakeActor;

    impl ActorHandle for FakeActor {
        async fn resurrect(&self) {}
    }

    impl ObjectHandle for FakeHandle {
        type Actor = FakeActor;
        type Template = ();

        fn form_id(&self) -> FormId {
            self.reported
        }

        fn as_actor(&self) -> Option<FakeActor> {
            self.actor.then_some(FakeActor)
        }

        fn base_template(&self) -> Self::Template {}

        async fn set_position(&self, _position: WorldPosition) {}

        async fn enable(&self, _immediate: bool) {}

        async fn set_motion_type(&self, _kind: MotionType, _keep_offset: bool) {}
    }

    impl WorldHost for Fixture {
        type Handle = FakeHandle;

        fn resolve(&self, id: FormId) -> Option<FakeHandle> {
            self.entries
                .get(&id)
                .map(|&(reported, actor)| FakeHandle { reported, actor })
        }
    }

    fn fixture() -> Fixture {
        let mut entries = HashMap::new();
        entries.insert(FormId(1), (FormId(1), true));
        entries.insert(FormId(2), (FormId(2), false));
        // id 3 was recycled: the slot now holds object 9
        entries.insert(FormId(3), (FormId(9), true));
        Fixture { entries }
    }

    #[test]
    fn resolves_matching_handle() {
        let host = fixture();
        let handle = resolve_live(&host, FormId(1)).expect("live handle");
        assert_eq!(handle.form_id(), FormId(1));
    }

    #[test]
    fn unknown_id_is_absent() {
        assert!(resolve_live(&fixture(), FormId(42)).is_none());
    }

    #[test]
    fn mismatched_reported_id_is_absent() {
        assert!(resolve_live(&fixture(), FormId(3)).is_none());
    }

    #[test]
    fn classify_splits_actors_from_objects() {
        let host = fixture();
        let actor = SpawnTarget::classify(resolve_live(&host, FormId(1)).unwrap());
        let object = SpawnTarget::classify(resolve_live(&host, FormId(2)).unwrap());
        assert!(actor.is_actor());
        assert!(!object.is_actor());
        assert_eq!(object.handle().form_id(), FormId(2));
    }
}
