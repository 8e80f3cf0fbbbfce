#![doc = include_str!("../README.md")]

mod sim;

use clap::Parser;
use shardgate::{GatedClient, StatsRegistry};
use sim::backend::MemoryBackend;
use sim::config::{CliArgs, SimConfig};
use sim::telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = SimConfig::try_from(args)?;

    init_telemetry()?;

    let registry = StatsRegistry::new();
    let backend = MemoryBackend::new(config.backend_latency, config.failure_rate);
    let client = GatedClient::new(backend, config.pool.clone())?.with_registry(&registry);

    log_startup_info(&config);
    let report = sim::load::run(&config, &client);
    tracing::info!(
        operations = report.total(),
        keys = client.backend().key_count(),
        "load finished"
    );

    let output = serde_json::json!({
        "load": report.to_json(),
        "pools": registry.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    registry.clear();
    Ok(())
}

fn log_startup_info(config: &SimConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting simulation with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting simulation of pool `{}` with {} workers for {:?}",
            config.pool.name,
            config.num_workers,
            config.duration
        );
    }
}
