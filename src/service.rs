//! SpawnService – turns spawn requests into running sequencers.
//!
//! Sequencers are started on the current [`tokio::task::LocalSet`]; the
//! service must therefore be driven from inside one. Completed spawns are
//! announced on an unbounded channel, abandoned ones are only counted.

use crate::error::{Result, SpawnError};
use crate::protocol::{SpawnCompleted, SpawnEvent, SpawnRequest};
use crate::sequencer::{CompletionCallback, SpawnContext, SpawnSequencer, SpawnState};
use crate::types::{FormId, SpawnServiceConfig, SpawnStats};
use crate::world::WorldHost;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

pub type CompletionReceiver = mpsc::UnboundedReceiver<SpawnEvent<SpawnCompleted>>;

pub struct SpawnService<W: WorldHost + 'static> {
    config: SpawnServiceConfig,
    ctx: SpawnContext<W>,
    stats: Arc<Mutex<SpawnStats>>,
    events: mpsc::UnboundedSender<SpawnEvent<SpawnCompleted>>,
}

impl<W: WorldHost + 'static> SpawnService<W> {
    pub fn new(config: SpawnServiceConfig, ctx: SpawnContext<W>) -> (Self, CompletionReceiver) {
        let (events, rx) = mpsc::unbounded_channel();
        let service = Self {
            config,
            ctx,
            stats: Arc::new(Mutex::new(SpawnStats::default())),
            events,
        };
        (service, rx)
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Start a sequencer for `request`.
    ///
    /// Requests are not deduplicated: two requests for the same id run two
    /// independent sequencers against the same object.
    pub fn handle_request(&self, request: SpawnRequest) -> JoinHandle<SpawnState> {
        let ref_id = request.ref_id;
        let position = request.position();
        self.stats.lock().requested += 1;
        info!("Spawn requested for {} at {}", ref_id, position);

        let callback = self.completion_callback(ref_id);
        let sequencer = SpawnSequencer::new(
            self.ctx.clone(),
            request.appearance,
            position,
            ref_id,
            callback,
        );

        let stats = self.stats.clone();
        let span = tracing::debug_span!("spawn", ref_id = %ref_id);
        tokio::task::spawn_local(
            async move {
                let outcome = sequencer.run().await;
                if outcome == SpawnState::Aborted {
                    stats.lock().aborted += 1;
                    debug!("Spawn {} abandoned", ref_id);
                }
                outcome
            }
            .instrument(span),
        )
    }

    /// Decode a JSON [`SpawnRequest`] and start it.
    pub fn handle_payload(&self, payload: &[u8]) -> Result<JoinHandle<SpawnState>> {
        let request: SpawnRequest =
            serde_json::from_slice(payload).map_err(SpawnError::InvalidRequest)?;
        Ok(self.handle_request(request))
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> SpawnStats {
        *self.stats.lock()
    }

    pub fn config(&self) -> &SpawnServiceConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------------

    fn completion_callback(&self, ref_id: FormId) -> CompletionCallback {
        let stats = self.stats.clone();
        let events = self.events.clone();
        let session = self.config.session.clone();

        Box::new(move || {
            // Completion count doubles as the frame counter.
            let frame = {
                let mut stats = stats.lock();
                stats.completed += 1;
                stats.completed
            };
            info!("Spawn {} completed", ref_id);

            let event = SpawnEvent::new(session, frame, SpawnCompleted { ref_id });
            if events.send(event).is_err() {
                warn!("Completion receiver dropped; spawn {} not announced", ref_id);
            }
        })
    }
}
