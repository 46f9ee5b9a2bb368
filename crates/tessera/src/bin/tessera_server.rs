//! # TESSERA World Server
//!
//! Runs a seeded world simulation against a threaded in-memory store and
//! reports write-back throughput.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info tessera_server --config config/tessera_server.toml --ticks 600
//! ```

use std::process::ExitCode;

use tessera::{ServerConfig, ServerResult, Simulation, TickLoop};
use tessera_storage::{BackingStore, EntityRow, MemoryBackend, ThreadedStore};
use tessera_world::{ROOT_ID, ROOT_TYPE};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command line arguments (simple parsing, no external deps)
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut max_ticks: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--ticks" | "-n" => {
                if i + 1 < args.len() {
                    max_ticks = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: tessera_server [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <FILE>    TOML configuration (default: built-in)");
                println!("  -n, --ticks <NUM>      Stop after NUM ticks");
                println!("  -h, --help             Show this help");
                return ExitCode::SUCCESS;
            }
            other => tracing::warn!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => match ServerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };
    let config = ServerConfig {
        max_ticks: max_ticks.or(config.max_ticks),
        ..config
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ServerConfig) -> ServerResult<()> {
    tracing::info!(
        "Starting: {} Hz, storage {}, backpressure at {} pending",
        config.tick_rate,
        if config.storage.enabled { "on" } else { "off" },
        config.storage.max_pending_queries
    );

    let backend = MemoryBackend::seeded([EntityRow {
        id: ROOT_ID.to_owned(),
        container_id: None,
        type_name: ROOT_TYPE.to_owned(),
        seq: 0,
        location: r#"{"pos":[0.0,0.0,0.0]}"#.to_owned(),
    }]);
    let store = ThreadedStore::spawn(backend, config.store.clone());
    let mut sim = Simulation::new(config, store)?;
    let mut tick_loop = TickLoop::new(config.tick_rate);
    let stats_interval = u64::from(config.tick_rate.max(1)) * 5;

    while config.max_ticks.map_or(true, |max| tick_loop.tick_count() < max) {
        tick_loop.wait_for_next_tick();
        let start = tick_loop.begin_tick();
        let report = sim.step()?;
        tick_loop.end_tick(start);

        if report.throttled {
            tracing::debug!("Tick {} throttled, {} updates deferred", tick_loop.tick_count(), report.deferred);
        }
        if tick_loop.tick_count() % stats_interval == 0 {
            let storage = sim.storage().lock();
            let stats = tick_loop.stats();
            tracing::info!(
                "Tick {}: {} live, avg {}us, {} late | queues C:{} U:{} D:{} | store pending {}",
                tick_loop.tick_count(),
                sim.world().len(),
                stats.avg_tick_us,
                stats.late_ticks,
                storage.pending_creates(),
                storage.pending_updates(),
                storage.pending_deletes(),
                storage.store().pending_queries()
            );
        }
    }

    let gauges = sim.storage().lock().metrics().render();
    let live = sim.world().len();
    let Some(store) = sim.into_store() else {
        return Ok(());
    };
    store.flush()?;
    let stats = store.stats();
    let backend = store.shutdown()?;

    tracing::info!(
        "Stopped after {} ticks: {} live entities, {} rows stored, {} calls applied, {} failed",
        tick_loop.tick_count(),
        live,
        backend.entity_count(),
        stats.applied,
        stats.failed
    );
    print!("{gauges}");
    Ok(())
}
