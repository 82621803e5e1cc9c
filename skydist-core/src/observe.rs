//! Optional timing and progress hooks.

use std::time::Duration;

/// Receives progress events from the field computations.
///
/// Every method has an empty default, so implementors only override what
/// they care about. Passing `None` where an observer is accepted disables
/// instrumentation entirely.
pub trait FieldObserver: Sync {
    /// A named stage finished (e.g. `"point trig"`, `"rows"`).
    fn phase(&self, _name: &'static str, _elapsed: Duration) {}

    /// A wavefront pass is about to relax `frontier_len` pixels.
    fn wavefront_pass(&self, _pass: usize, _frontier_len: usize) {}
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl FieldObserver for TracingObserver {
    fn phase(&self, name: &'static str, elapsed: Duration) {
        tracing::debug!(phase = name, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "phase done");
    }

    fn wavefront_pass(&self, pass: usize, frontier_len: usize) {
        tracing::debug!(pass, frontier_len, "wavefront pass");
    }
}

/// Times a stage and reports it on [`Stopwatch::lap`], if anyone is listening.
pub(crate) struct Stopwatch<'o> {
    observer: Option<&'o dyn FieldObserver>,
    start: std::time::Instant,
}

impl<'o> Stopwatch<'o> {
    pub(crate) fn new(observer: Option<&'o dyn FieldObserver>) -> Self {
        Self {
            observer,
            start: std::time::Instant::now(),
        }
    }

    pub(crate) fn lap(&mut self, name: &'static str) {
        if let Some(obs) = self.observer {
            obs.phase(name, self.start.elapsed());
        }
        self.start = std::time::Instant::now();
    }
}
