//! Console logging for the simulator.
//!
//! Library diagnostics reach the console through `shardgate::TracingSink`,
//! which emits ordinary `tracing` events. Filtering follows `RUST_LOG` and
//! defaults to `info`; set `RUST_LOG=shardgate=debug` to see the per-operation
//! statement log.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        )
        .try_init()?;
    Ok(())
}
