use tracing::Level;

use crate::Diagnostic;

/// Receives the diagnostics a [`GatedClient`] raises.
///
/// Sinks decide where diagnostics end up and how they are formatted; the
/// client never writes anywhere itself. Implementations must be cheap and
/// must not block for long, since they run on the caller's thread.
///
/// [`GatedClient`]: crate::GatedClient
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, level: Level, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing` at the level they were raised with.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, level: Level, diagnostic: &Diagnostic) {
        let pool = diagnostic.pool();
        let kind = diagnostic.kind().as_str();
        match level {
            Level::ERROR => tracing::error!(pool, kind, "{diagnostic}"),
            Level::WARN => tracing::warn!(pool, kind, "{diagnostic}"),
            Level::INFO => tracing::info!(pool, kind, "{diagnostic}"),
            Level::DEBUG => tracing::debug!(pool, kind, "{diagnostic}"),
            _ => tracing::trace!(pool, kind, "{diagnostic}"),
        }
    }
}
