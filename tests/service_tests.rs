//! SpawnService unit tests

#[cfg(test)]
mod tests {
    use janet_spawn::{
        protocol::SpawnRequest,
        sequencer::{SpawnContext, SpawnState},
        service::{CompletionReceiver, SpawnService},
        sim::{BaseTemplate, SimObject, SimWorld, TemplateKind},
        types::{FormId, SpawnServiceConfig},
        SpawnError,
    };
    use std::rc::Rc;
    use std::time::Duration;
    use tokio::task::LocalSet;

    fn make_service(world: &SimWorld) -> (SpawnService<SimWorld>, CompletionReceiver) {
        let config = SpawnServiceConfig {
            session: "test-session".into(),
            mutation_latency_ms: 0,
        };
        let world = Rc::new(world.clone());
        let ctx: SpawnContext<SimWorld> = SpawnContext::new(world.clone(), world.clone(), world);
        SpawnService::new(config, ctx)
    }

    fn world_with_npcs(ids: &[u32]) -> SimWorld {
        let world = SimWorld::new(Duration::ZERO);
        for &id in ids {
            world.insert(SimObject::new(id, BaseTemplate::new(0x7, TemplateKind::Npc)).dead());
        }
        world
    }

    fn request(id: u32) -> SpawnRequest {
        SpawnRequest {
            ref_id: FormId(id),
            x: 1.0,
            y: 2.0,
            z: 3.0,
            appearance: None,
        }
    }

    // -----------------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn completed_spawn_emits_event_and_counts() {
        let world = world_with_npcs(&[500]);
        let (svc, mut rx) = make_service(&world);

        let local = LocalSet::new();
        let outcome = local
            .run_until(async { svc.handle_request(request(500)).await.unwrap() })
            .await;

        assert_eq!(outcome, SpawnState::Done);
        let event = rx.try_recv().expect("completion event");
        assert_eq!(event.session, "test-session");
        assert_eq!(event.frame, 1);
        assert_eq!(event.payload.ref_id, FormId(500));

        let stats = svc.stats();
        assert_eq!(stats.requested, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.aborted, 0);
        assert_eq!(stats.in_flight(), 0);
    }

    #[tokio::test]
    async fn frames_increase_with_each_completion() {
        let world = world_with_npcs(&[1, 2, 3]);
        let (svc, mut rx) = make_service(&world);

        let local = LocalSet::new();
        local
            .run_until(async {
                for id in [1, 2, 3] {
                    svc.handle_request(request(id)).await.unwrap();
                }
            })
            .await;

        let frames: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.frame)
            .collect();
        assert_eq!(frames, vec![1, 2, 3]);
    }

    // -----------------------------------------------------------------------
    // Abandonment
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn abandoned_spawn_is_counted_but_not_announced() {
        let world = world_with_npcs(&[]);
        let (svc, mut rx) = make_service(&world);

        let local = LocalSet::new();
        let outcome = local
            .run_until(async { svc.handle_request(request(404)).await.unwrap() })
            .await;

        assert_eq!(outcome, SpawnState::Aborted);
        assert!(rx.try_recv().is_err());
        let stats = svc.stats();
        assert_eq!(stats.requested, 1);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.aborted, 1);
    }

    #[tokio::test]
    async fn duplicate_requests_are_not_deduplicated() {
        let world = world_with_npcs(&[42]);
        let (svc, mut rx) = make_service(&world);

        let local = LocalSet::new();
        local
            .run_until(async {
                let a = svc.handle_request(request(42));
                let b = svc.handle_request(request(42));
                assert_eq!(a.await.unwrap(), SpawnState::Done);
                assert_eq!(b.await.unwrap(), SpawnState::Done);
            })
            .await;

        assert_eq!(svc.stats().completed, 2);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }

    // -----------------------------------------------------------------------
    // Payload decoding
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn payload_is_decoded_and_started() {
        let world = world_with_npcs(&[77]);
        let (svc, _rx) = make_service(&world);

        let local = LocalSet::new();
        let outcome = local
            .run_until(async {
                let handle = svc
                    .handle_payload(br#"{ "ref_id": 77, "x": 5.0, "y": 6.0, "z": 7.0 }"#)
                    .unwrap();
                handle.await.unwrap()
            })
            .await;

        assert_eq!(outcome, SpawnState::Done);
        let obj = world.object(FormId(77)).unwrap();
        assert_eq!((obj.position.x, obj.position.y, obj.position.z), (5.0, 6.0, 7.0));
    }

    #[test]
    fn malformed_payload_is_rejected_without_counting() {
        let world = world_with_npcs(&[]);
        let (svc, _rx) = make_service(&world);

        let err = svc.handle_payload(b"{ not json").unwrap_err();
        assert!(matches!(err, SpawnError::InvalidRequest(_)));
        assert_eq!(svc.stats().requested, 0);
    }
}
