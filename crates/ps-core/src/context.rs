//! Explicit per-run diagnostic context.
//!
//! Engine entry points take a `&mut RunContext` instead of reading any
//! process-wide logging state, so repeated or concurrent runs never share
//! counters or spans.

use std::time::Instant;

/// Counters collected while a run executes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Completed time steps (discrete) or recorded grid points (ODE).
    pub steps: usize,
    /// Right-hand-side evaluations requested by an ODE solver.
    pub rhs_evaluations: usize,
    /// Compartment values floored at zero by discrete stepping.
    pub clamped_values: usize,
    /// Intervention applications.
    pub interventions_applied: usize,
}

/// Diagnostics handle passed into every engine entry point.
#[derive(Debug)]
pub struct RunContext {
    label: String,
    progress_every: usize,
    stats: RunStats,
    span: tracing::Span,
    started: Instant,
}

impl RunContext {
    /// Create a context for one run.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let span = tracing::info_span!("run", label = %label);
        Self {
            label,
            progress_every: 0,
            stats: RunStats::default(),
            span,
            started: Instant::now(),
        }
    }

    /// Emit a debug progress line every `n` steps (0 disables).
    pub fn with_progress_every(mut self, n: usize) -> Self {
        self.progress_every = n;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Span that engine entry points enter for the duration of a run.
    pub fn span(&self) -> tracing::Span {
        self.span.clone()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Seconds since the context was created.
    pub fn elapsed_s(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn record_step(&mut self, t: f64) {
        self.stats.steps += 1;
        if self.progress_every > 0 && self.stats.steps % self.progress_every == 0 {
            tracing::debug!(step = self.stats.steps, t, "progress");
        }
    }

    pub fn record_rhs(&mut self) {
        self.stats.rhs_evaluations += 1;
    }

    pub fn record_clamps(&mut self, count: usize) {
        self.stats.clamped_values += count;
    }

    pub fn record_intervention(&mut self) {
        self.stats.interventions_applied += 1;
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new("run")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let ctx = RunContext::new("test");
        assert_eq!(ctx.label(), "test");
        assert_eq!(ctx.stats(), &RunStats::default());
    }

    #[test]
    fn counters_accumulate_per_context() {
        let mut a = RunContext::new("a").with_progress_every(2);
        let b = RunContext::new("b");
        a.record_step(1.0);
        a.record_step(2.0);
        a.record_rhs();
        a.record_clamps(3);
        a.record_intervention();
        assert_eq!(a.stats().steps, 2);
        assert_eq!(a.stats().rhs_evaluations, 1);
        assert_eq!(a.stats().clamped_values, 3);
        assert_eq!(a.stats().interventions_applied, 1);
        assert_eq!(b.stats().steps, 0);
    }
}
