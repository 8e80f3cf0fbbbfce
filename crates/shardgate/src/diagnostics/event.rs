use core::fmt;
use core::time::Duration;

/// Discriminant of a [`Diagnostic`], handy for filtering in sinks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    AcquireTimeout,
    SlowAcquire,
    SlowOperation,
    OperationFailed,
    Statement,
}

impl DiagnosticKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AcquireTimeout => "acquire_timeout",
            Self::SlowAcquire => "slow_acquire",
            Self::SlowOperation => "slow_operation",
            Self::OperationFailed => "operation_failed",
            Self::Statement => "statement",
        }
    }
}

/// A diagnostic raised while gating an operation.
///
/// The [`Display`] impl renders the human-readable line; the fields are
/// available to sinks that want structured output.
///
/// [`Display`]: core::fmt::Display
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Diagnostic {
    /// No permit was obtained within the acquisition window.
    AcquireTimeout {
        pool: String,
        waited: Duration,
        in_use: usize,
        capacity: usize,
    },
    /// A permit was obtained, but only after the slow threshold.
    SlowAcquire {
        pool: String,
        waited: Duration,
        querying: i64,
        executing: i64,
    },
    /// The backend call itself exceeded the slow threshold.
    SlowOperation {
        pool: String,
        operation: String,
        /// Normalised action and target, e.g. `SELECT users`.
        target: Option<String>,
        elapsed: Duration,
        querying: i64,
        executing: i64,
    },
    /// The backend call failed with a non-benign error.
    OperationFailed {
        pool: String,
        operation: String,
        error: String,
    },
    /// Per-operation statement log line.
    Statement {
        pool: String,
        operation: String,
        target: Option<String>,
        elapsed: Duration,
    },
}

impl Diagnostic {
    pub const fn kind(&self) -> DiagnosticKind {
        match self {
            Self::AcquireTimeout { .. } => DiagnosticKind::AcquireTimeout,
            Self::SlowAcquire { .. } => DiagnosticKind::SlowAcquire,
            Self::SlowOperation { .. } => DiagnosticKind::SlowOperation,
            Self::OperationFailed { .. } => DiagnosticKind::OperationFailed,
            Self::Statement { .. } => DiagnosticKind::Statement,
        }
    }

    pub fn pool(&self) -> &str {
        match self {
            Self::AcquireTimeout { pool, .. }
            | Self::SlowAcquire { pool, .. }
            | Self::SlowOperation { pool, .. }
            | Self::OperationFailed { pool, .. }
            | Self::Statement { pool, .. } => pool,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcquireTimeout {
                pool,
                waited,
                in_use,
                capacity,
            } => write!(
                f,
                "[{pool}] acquire permit timed out after {waited:?}, in_use={in_use} capacity={capacity}"
            ),
            Self::SlowAcquire {
                pool,
                waited,
                querying,
                executing,
            } => write!(
                f,
                "[{pool}] acquiring a permit took {waited:?}, querying={querying} executing={executing}"
            ),
            Self::SlowOperation {
                pool,
                operation,
                target,
                elapsed,
                querying,
                executing,
            } => {
                write!(f, "[{pool}] {operation} took {elapsed:?}")?;
                if let Some(target) = target {
                    write!(f, ", op=[{target}]")?;
                }
                write!(f, " querying={querying} executing={executing}")
            }
            Self::OperationFailed {
                pool,
                operation,
                error,
            } => write!(f, "[{pool}] {operation} failed: {error}"),
            Self::Statement {
                pool,
                operation,
                target,
                elapsed,
            } => match target {
                Some(target) => write!(f, "[{pool}] {elapsed:?} - {target}"),
                None => write!(f, "[{pool}] {elapsed:?} - {operation}"),
            },
        }
    }
}
