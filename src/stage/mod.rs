//! Stage lifecycle and the row-flow contract.
//!
//! Every stage implements the three-phase lifecycle of [`Stage`]:
//! `init` validates configuration and acquires resources,
//! `process_one_unit` is invoked in a loop until it returns `false`, and
//! `dispose` releases resources on every exit path: normal completion,
//! per-row fatal error, or external cancellation.
//!
//! Stages run one per thread ([`spawn_stage`]) and communicate exclusively
//! through bounded [`queue`]s; no stage shares mutable state with another.
//! The only cross-stage shared state is the codec registry, which is
//! read-only after startup.

pub mod csv_input;
pub mod queue;

use crate::error::Result;
use crate::schema::{Row, RowSchema};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// Synchronous per-row callback, invoked on the producing thread in
/// registration order before the row is pushed downstream.
///
/// An observer error aborts that row's delivery and is fatal to the stage.
pub trait RowObserver: Send {
    fn on_row_produced(&self, schema: &RowSchema, row: &Row) -> Result<()>;
}

impl<F> RowObserver for F
where
    F: Fn(&RowSchema, &Row) -> Result<()> + Send,
{
    fn on_row_produced(&self, schema: &RowSchema, row: &Row) -> Result<()> {
        self(schema, row)
    }
}

/// Three-phase stage lifecycle.
///
/// The per-stage state machine is reentrant-safe across calls: no call
/// stack is retained between `process_one_unit` invocations, so the
/// orchestrator loop can be replaced by a task scheduler without touching
/// stage internals.
pub trait Stage: Send {
    /// Stage name for logging and progress reporting.
    fn name(&self) -> &str;

    /// Validate configuration and acquire resources.
    ///
    /// # Errors
    /// [`crate::Error::Configuration`] for invalid setup; the stage never
    /// proceeds to processing.
    fn init(&mut self) -> Result<()>;

    /// Read at most one logical unit from the input and, on success, push
    /// exactly one row to the output queue(s).
    ///
    /// Returning `false` means no more rows will ever be produced; it is
    /// terminal, and a repeat call must not re-enter row-producing logic.
    fn process_one_unit(&mut self) -> Result<bool>;

    /// Release resources. Called exactly once per run by the orchestrator,
    /// on every exit path; must be safe to call repeatedly.
    fn dispose(&mut self);

    /// Rows produced so far, for progress reporting.
    fn produced_row_count(&self) -> u64;
}

/// Cloneable external stop signal.
///
/// A blocked stage observes it within one I/O or queue-wait granularity;
/// see [`queue::RowProducer::bind_stop`].
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Drive one stage to completion: init, process until terminal, dispose.
///
/// `dispose` runs on every exit path, so resources acquired in `init` are
/// released after normal completion, a fatal per-row error, and external
/// cancellation alike. A fatal error is returned after dispose has closed
/// the stage's owned queues, so downstream stages observe closure rather
/// than hanging.
///
/// Returns the number of rows the stage produced.
pub fn run_stage(stage: &mut dyn Stage, stop: &StopSignal) -> Result<u64> {
    tracing::debug!(stage = stage.name(), "stage starting");
    let result = match stage.init() {
        Err(e) => Err(e),
        Ok(()) => loop {
            if stop.is_stopped() {
                tracing::debug!(stage = stage.name(), "stage stopped externally");
                break Ok(());
            }
            match stage.process_one_unit() {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(e) => break Err(e),
            }
        },
    };
    stage.dispose();
    match result {
        Ok(()) => {
            let produced = stage.produced_row_count();
            tracing::debug!(stage = stage.name(), produced, "stage finished");
            Ok(produced)
        }
        Err(e) => {
            tracing::warn!(stage = stage.name(), error = %e, "stage failed");
            Err(e)
        }
    }
}

/// Run a stage on its own thread, the pipeline's scheduling unit.
pub fn spawn_stage<S: Stage + 'static>(mut stage: S, stop: StopSignal) -> JoinHandle<Result<u64>> {
    thread::spawn(move || run_stage(&mut stage, &stop))
}
