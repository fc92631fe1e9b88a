//! Diagnostics context: a severity-filtered log sink plus a call-chain
//! trail, passed by reference instead of living in module statics.
//!
//! Verbosity, "worst error seen", and exit-code state all live on a
//! [`Diagnostics`] value that a caller owns and threads through, rather
//! than in process-wide globals. Call frames are pushed and popped for
//! the scope of a closure, so there is no heap allocation and no parent
//! pointer to dangle.

use std::cell::Cell;

/// How serious a diagnostic message is.
///
/// Ordered from least to most verbose; `Nothing` suppresses all logging,
/// `All` lets everything through. Lower-but-nonzero values are more
/// severe (an `Error` is worse than a `Warning`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Suppress all logging.
    Nothing = 0,
    /// An unrecoverable problem for the current operation.
    Error = 1,
    /// A recoverable problem worth surfacing.
    Warning = 2,
    /// Informational detail about progress.
    Info = 3,
    /// Verbose, high-frequency tracing detail.
    Message = 4,
    /// Let everything through.
    All = 99,
}

impl Severity {
    /// Whether logging at `self` should pass a filter set to `filter`.
    #[must_use]
    pub fn passes(self, filter: Self) -> bool {
        self <= filter
    }
}

/// Receives diagnostic events from a [`Diagnostics`] context.
pub trait Logger {
    /// Record one diagnostic event. `call_chain` lists the active
    /// function-name frames, outermost first.
    fn log(&self, severity: Severity, message: &str, call_chain: &[&str]);
}

/// Forwards diagnostics to the `tracing` crate, one event per severity
/// tier (`Error` → `tracing::error!`, and so on).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, severity: Severity, message: &str, call_chain: &[&str]) {
        let chain = call_chain.join(" > ");
        match severity {
            Severity::Nothing => {}
            Severity::Error => tracing::error!(chain = %chain, "{message}"),
            Severity::Warning => tracing::warn!(chain = %chain, "{message}"),
            Severity::Info => tracing::info!(chain = %chain, "{message}"),
            Severity::Message | Severity::All => tracing::debug!(chain = %chain, "{message}"),
        }
    }
}

/// Discards every diagnostic event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentLogger;

impl Logger for SilentLogger {
    fn log(&self, _severity: Severity, _message: &str, _call_chain: &[&str]) {}
}

/// A diagnostics context: severity filter, call-chain trail, worst
/// severity observed so far, and a sticky "should exit with this code"
/// value.
///
/// Callers that want process-wide behavior share one `Diagnostics` value;
/// callers packing fields concurrently on different threads give each
/// thread its own context instead.
pub struct Diagnostics<L: Logger = TracingLogger> {
    logger: L,
    severity_filter: Severity,
    error_level: Severity,
    worst_seen: Cell<Severity>,
    exit_code: Cell<i32>,
    call_chain: Vec<&'static str>,
}

impl Diagnostics<TracingLogger> {
    /// A context that forwards every event at or above `Warning` to
    /// `tracing`.
    #[must_use]
    pub fn with_tracing() -> Self {
        Self::new(TracingLogger, Severity::Info)
    }
}

impl Diagnostics<SilentLogger> {
    /// A context that discards every event.
    #[must_use]
    pub fn silent() -> Self {
        Self::new(SilentLogger, Severity::Nothing)
    }
}

impl<L: Logger> Diagnostics<L> {
    /// Build a context with a custom logger and severity filter.
    #[must_use]
    pub fn new(logger: L, severity_filter: Severity) -> Self {
        Self {
            logger,
            severity_filter,
            error_level: Severity::Error,
            worst_seen: Cell::new(Severity::All),
            exit_code: Cell::new(0),
            call_chain: Vec::new(),
        }
    }

    /// Run `f` with `name` pushed onto the call-chain trail for its
    /// duration.
    pub fn with_frame<R>(&mut self, name: &'static str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.call_chain.push(name);
        let result = f(self);
        self.call_chain.pop();
        result
    }

    /// Record a diagnostic event if it passes the severity filter, and
    /// track it as the worst severity seen so far.
    pub fn log(&self, severity: Severity, message: impl AsRef<str>) {
        if severity < self.worst_seen.get() {
            self.worst_seen.set(severity);
        }
        if severity.passes(self.severity_filter) {
            self.logger.log(severity, message.as_ref(), &self.call_chain);
        }
    }

    /// Set the sticky exit code, if one has not already been set. The
    /// first call wins; later calls are no-ops.
    pub fn set_exit_code(&self, code: i32) {
        if self.exit_code.get() == 0 {
            self.exit_code.set(code);
        }
    }

    /// The worst severity observed through this context so far.
    #[must_use]
    pub fn worst_seen(&self) -> Severity {
        self.worst_seen.get()
    }

    /// The current sticky exit code (`0` if nothing has set one).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.exit_code.get()
    }

    /// Whether the worst severity seen so far is serious enough that a
    /// process using this context should report failure on exit.
    ///
    /// The decision of whether and how to terminate belongs to the
    /// caller; this context never calls `exit` itself.
    #[must_use]
    pub fn should_exit_with_error(&self) -> bool {
        self.exit_code.get() != 0 || self.worst_seen.get() <= self.error_level
    }

    /// Reset the worst-severity tracker back to its initial state.
    pub fn reset_worst_seen(&self) {
        self.worst_seen.set(Severity::All);
    }

    /// The active call-chain trail, outermost frame first.
    #[must_use]
    pub fn call_chain(&self) -> &[&'static str] {
        &self.call_chain
    }
}

impl Default for Diagnostics<TracingLogger> {
    fn default() -> Self {
        Self::with_tracing()
    }
}
