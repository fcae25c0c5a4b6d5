//! janet-spawn-sim binary
//!
//! Loads a set of world objects into an in-memory [`SimWorld`], feeds it a
//! stream of spawn requests and prints one `spawn.completed` event per line
//! on stdout.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! | Key                         | Default   | Description                          |
//! |-----------------------------|-----------|--------------------------------------|
//! | `SPAWN_SESSION`             | `default` | Session stamped on outbound events   |
//! | `SPAWN_MUTATION_LATENCY_MS` | `50`      | Simulated settle time per mutation   |

use anyhow::{Context, Result};
use clap::Parser;
use janet_spawn::{
    error::SpawnError, sequencer::SpawnContext, service::SpawnService, sim::SimObject,
    types::SpawnServiceConfig, SimWorld,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "janet-spawn-sim", about = "Janet Spawn simulator", version)]
struct Args {
    /// JSON array of world objects to place before spawning
    #[arg(long)]
    world: PathBuf,

    /// Spawn requests, one JSON object per line
    #[arg(long)]
    requests: PathBuf,

    /// Optional config file (TOML / JSON / YAML)
    #[arg(long, env = "SPAWN_CONFIG")]
    config: Option<PathBuf>,

    /// Override the session name
    #[arg(long)]
    session: Option<String>,

    /// Override the simulated mutation latency (ms)
    #[arg(long)]
    latency_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("janet_spawn=debug".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = SpawnServiceConfig::load(args.config.as_deref())
        .context("Failed to load spawn configuration")?;
    if let Some(session) = args.session {
        config.session = session;
    }
    if let Some(latency) = args.latency_ms {
        config.mutation_latency_ms = latency;
    }

    log::info!(
        "Starting janet-spawn-sim (session='{}', latency={}ms)",
        config.session,
        config.mutation_latency_ms,
    );

    // Build the in-memory world
    let world = SimWorld::new(config.mutation_latency());
    for object in load_objects(&args.world)? {
        world.insert(object);
    }
    log::info!("Placed {} objects", world.len());

    let requests = std::fs::read_to_string(&args.requests)
        .with_context(|| format!("Failed to read {}", args.requests.display()))?;

    let world = Rc::new(world);
    let ctx: SpawnContext<SimWorld> = SpawnContext::new(world.clone(), world.clone(), world);
    let (service, mut completions) = SpawnService::new(config, ctx);

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let mut running = Vec::new();
            for (line_no, line) in requests.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match service.handle_payload(line.as_bytes()) {
                    Ok(handle) => running.push(handle),
                    Err(e) => log::warn!("Skipping request on line {}: {}", line_no + 1, e),
                }
            }

            let all_settled = async {
                for handle in running {
                    if let Err(e) = handle.await {
                        log::error!("Spawn task failed: {}", e);
                    }
                }
            };

            tokio::select! {
                _ = all_settled => {}
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Interrupted; abandoning in-flight spawns");
                }
            }
        })
        .await;

    // Flush completion events
    let mut stdout = std::io::stdout().lock();
    while let Ok(event) = completions.try_recv() {
        let bytes = janet_spawn::protocol::encode(&event)?;
        stdout.write_all(&bytes)?;
        stdout.write_all(b"\n")?;
    }

    let stats = service.stats();
    log::info!(
        "Done: {} requested, {} completed, {} abandoned",
        stats.requested,
        stats.completed,
        stats.aborted,
    );
    Ok(())
}

fn load_objects(path: &Path) -> Result<Vec<SimObject>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let objects: Vec<SimObject> = serde_json::from_str(&raw)
        .map_err(|e| SpawnError::Scenario(e.to_string()))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(objects)
}
