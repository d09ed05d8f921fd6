//! Orchestrator execution logic

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};

use crate::channel::{report_channel, ChannelConfig};
use crate::config::{LineConfig, RunConfig};
use crate::error::{Error, Result};
use crate::factory::FactoryBuilder;
use crate::handshake::{completion_barrier, report_gate, Milestone, Timeline};
use crate::pool::WorkPool;
use crate::supervisor::SupervisorBuilder;
use crate::traits::StatusCheck;

use super::outcome::RunOutcome;
use super::resources::{RunResources, UnitOutput};

/// Orchestrator manages the lifecycle of one production run
///
/// Responsible for creating the shared primitives, spawning the supervisor
/// and the factory lines, driving its side of the end-of-run handshake, and
/// tearing everything down on every exit path.
pub struct Orchestrator {
    /// Run configuration
    pub(crate) config: RunConfig,

    /// Resolved parameters, one per factory line in id order
    pub(crate) lines: Vec<LineConfig>,

    /// Report channel sizing
    pub(crate) channel_config: ChannelConfig,

    /// Check run between the completion barrier and the report gate
    pub(crate) status_check: Arc<dyn StatusCheck>,

    /// Interrupt signal sender
    pub(crate) shutdown_tx: broadcast::Sender<()>,
}

/// How one orchestrator suspension point ended
enum Phase<T> {
    Done(T),
    Interrupted,
    UnitFailed(String),
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// Use `OrchestratorBuilder` for validated construction.
    pub fn new(
        config: RunConfig,
        lines: Vec<LineConfig>,
        channel_config: ChannelConfig,
        status_check: Arc<dyn StatusCheck>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            lines,
            channel_config,
            status_check,
            shutdown_tx,
        }
    }

    /// Get an interrupt signal receiver
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Interrupt a running run
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get the run configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Parameters of each factory line, in id order
    pub fn lines(&self) -> &[LineConfig] {
        &self.lines
    }

    /// Run the order to completion
    ///
    /// Spawns the supervisor and every factory line, waits on the completion
    /// barrier, runs the status check, opens the report gate and joins every
    /// unit. Shared resources are released exactly once whichever way the
    /// run ends.
    ///
    /// # Errors
    /// - [`Error::ResourceAcquisition`] if no runtime is available or the
    ///   report channel cannot be created
    /// - [`Error::Interrupted`] if [`Orchestrator::shutdown`] fires first
    /// - the first unit's own error if any unit fails or panics
    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_inner(self.shutdown_tx.subscribe()).await
    }

    /// Body of [`Orchestrator::run`], interruptible through `shutdown_rx`
    ///
    /// Callers that spawn a task sending on the shutdown channel subscribe
    /// before spawning it, so an early signal is never lost.
    async fn run_inner(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<RunOutcome> {
        tokio::runtime::Handle::try_current()
            .map_err(|e| Error::resource(format!("no async runtime: {e}")))?;

        let factory_count = self.config.factory_count;
        let order_size = self.config.order_size;
        tracing::info!(order_size, factory_count, "Will request an order");

        let pool = Arc::new(WorkPool::new(order_size, factory_count));
        let (report_tx, report_rx) = report_channel(&self.channel_config)?;
        let (barrier_release, barrier_wait) = completion_barrier();
        let (gate_release, gate_wait) = report_gate();
        let timeline = Timeline::new();
        let mut resources = RunResources::new(Arc::clone(&pool), barrier_wait, gate_release);

        // Build every unit before spawning any of them
        let supervisor = SupervisorBuilder::new(factory_count)
            .report_rx(report_rx)
            .pool(Arc::clone(&pool))
            .barrier(barrier_release)
            .gate(gate_wait)
            .timeline(timeline.clone())
            .build()?;

        let factories = self
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                FactoryBuilder::new(idx + 1)
                    .line(*line)
                    .pool(Arc::clone(&pool))
                    .report_tx(report_tx.clone())
                    .factory_count(factory_count)
                    .build()
            })
            .collect::<Result<Vec<_>>>()?;
        drop(report_tx);
        drop(pool);

        let (failure_tx, mut failures) = mpsc::unbounded_channel();

        spawn_unit(&mut resources, "supervisor".into(), &failure_tx, async move {
            supervisor.run().await.map(UnitOutput::Supervisor)
        });
        for factory in factories {
            let line = factory.line();
            tracing::info!(
                factory_id = factory.id(),
                capacity = line.capacity,
                duration_ms = line.duration.as_millis() as u64,
                "Factory created"
            );
            spawn_unit(
                &mut resources,
                format!("factory {}", factory.id()),
                &failure_tx,
                async move { factory.run().await.map(UnitOutput::Factory) },
            );
        }
        drop(failure_tx);

        // Completion barrier
        let barrier = resources.take_barrier()?;
        match phase(barrier.wait(), &mut shutdown_rx, &mut failures).await {
            Phase::Done(Ok(())) => {}
            Phase::Done(Err(e)) => {
                return Err(fail(&mut resources, &mut failures, None, e).await);
            }
            Phase::UnitFailed(unit) => {
                return Err(fail_unit(&mut resources, &mut failures, unit).await);
            }
            Phase::Interrupted => return Err(interrupt(&mut resources).await),
        }
        timeline.record(Milestone::BarrierObserved);
        tracing::info!("Supervisor reports every factory line has finished");

        // Status check
        tracing::info!(check = self.status_check.name(), "Running status check");
        match phase(self.status_check.check(), &mut shutdown_rx, &mut failures).await {
            Phase::Done(Ok(())) => {}
            Phase::Done(Err(e)) => {
                return Err(fail(&mut resources, &mut failures, None, e).await);
            }
            Phase::UnitFailed(unit) => {
                return Err(fail_unit(&mut resources, &mut failures, unit).await);
            }
            Phase::Interrupted => return Err(interrupt(&mut resources).await),
        }
        timeline.record(Milestone::StatusChecked);

        // Report gate
        let gate = resources.take_gate()?;
        timeline.record(Milestone::GateReleased);
        tracing::info!("Granting permission to print the final report");
        if let Err(e) = gate.release() {
            return Err(fail(&mut resources, &mut failures, None, e).await);
        }

        // Join
        let results = match phase(resources.join_all(), &mut shutdown_rx, &mut failures).await {
            Phase::Done(results) => results,
            Phase::UnitFailed(unit) => {
                return Err(fail_unit(&mut resources, &mut failures, unit).await);
            }
            Phase::Interrupted => return Err(interrupt(&mut resources).await),
        };

        let mut report = None;
        let mut factories = Vec::with_capacity(factory_count);
        let mut first_error = None;
        for (unit, result) in results {
            match result {
                Ok(UnitOutput::Supervisor(r)) => report = Some(r),
                Ok(UnitOutput::Factory(stats)) => {
                    tracing::debug!(
                        factory_id = stats.factory_id,
                        parts_made = stats.parts_made,
                        batches = stats.batches,
                        average_batch = stats.average_batch(),
                        "Factory joined"
                    );
                    factories.push(stats);
                }
                Err(e) => {
                    tracing::error!(unit = %unit, error = %e, "Unit returned error");
                    first_error.get_or_insert(e);
                }
            }
        }

        let pool = resources
            .pool_snapshot()
            .ok_or_else(|| Error::resource("work pool released before the run finished"))?;
        resources.teardown();

        if let Some(e) = first_error {
            return Err(e);
        }
        let report = report
            .ok_or_else(|| Error::Handshake("supervisor finished without a report".into()))?;
        factories.sort_by_key(|stats| stats.factory_id);

        tracing::info!(
            grand_total = report.grand_total,
            order_size,
            made = pool.made,
            "Run completed"
        );

        Ok(RunOutcome {
            report,
            factories,
            pool,
            timeline: timeline.milestones(),
        })
    }

    /// Run with SIGINT and SIGTERM handling
    ///
    /// Either signal interrupts the run at its current suspension point.
    pub async fn run_with_signal_handling(&self) -> Result<RunOutcome> {
        let shutdown_rx = self.shutdown_tx.subscribe();
        let shutdown_tx = self.shutdown_tx.clone();

        let signal_handle = tokio::spawn(async move {
            match wait_for_signal().await {
                Ok(signal) => {
                    tracing::info!(signal, "Received signal, terminating the run");
                    let _ = shutdown_tx.send(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for signals");
                }
            }
        });

        let result = self.run_inner(shutdown_rx).await;
        signal_handle.abort();

        result
    }

    /// Run with a deadline
    ///
    /// Reaching the deadline interrupts the run.
    pub async fn run_with_timeout(&self, timeout: Duration) -> Result<RunOutcome> {
        let shutdown_rx = self.shutdown_tx.subscribe();
        let shutdown_tx = self.shutdown_tx.clone();

        let timeout_handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::info!(
                timeout_ms = timeout.as_millis() as u64,
                "Deadline reached, terminating the run"
            );
            let _ = shutdown_tx.send(());
        });

        let result = self.run_inner(shutdown_rx).await;
        timeout_handle.abort();

        result
    }
}

/// Spawn a unit whose error or panic is announced on `failures`
fn spawn_unit<F>(
    resources: &mut RunResources,
    name: String,
    failures: &mpsc::UnboundedSender<String>,
    unit: F,
) where
    F: Future<Output = Result<UnitOutput>> + Send + 'static,
{
    let failures = failures.clone();
    let unit_name = name.clone();
    let handle = tokio::spawn(async move {
        let result = match AssertUnwindSafe(unit).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(Error::UnitPanicked {
                unit: unit_name.clone(),
                reason: panic_message(panic.as_ref()),
            }),
        };
        if let Err(e) = &result {
            tracing::error!(unit = %unit_name, error = %e, "Unit failed");
            let _ = failures.send(unit_name);
        }
        result
    });
    resources.push_unit(name, handle);
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Await `fut` unless an interrupt or a unit failure comes first
async fn phase<F: Future>(
    fut: F,
    shutdown_rx: &mut broadcast::Receiver<()>,
    failures: &mut mpsc::UnboundedReceiver<String>,
) -> Phase<F::Output> {
    tokio::select! {
        biased;
        _ = shutdown_rx.recv() => Phase::Interrupted,
        Some(unit) = failures.recv() => Phase::UnitFailed(unit),
        out = fut => Phase::Done(out),
    }
}

/// Abort every unit and tear down after an interrupt
async fn interrupt(resources: &mut RunResources) -> Error {
    tracing::warn!(units = resources.unit_count(), "Run interrupted");
    resources.abort_all();
    resources.join_all().await;
    resources.teardown();
    Error::Interrupted
}

async fn fail_unit(
    resources: &mut RunResources,
    failures: &mut mpsc::UnboundedReceiver<String>,
    unit: String,
) -> Error {
    let fallback = Error::UnitPanicked {
        unit: unit.clone(),
        reason: "result lost".into(),
    };
    fail(resources, failures, Some(unit), fallback).await
}

/// Abort the remaining units, tear down, and pick the error to surface
///
/// The first unit that failed on its own wins over `fallback`, which is
/// usually a handshake error caused by that failure.
async fn fail(
    resources: &mut RunResources,
    failures: &mut mpsc::UnboundedReceiver<String>,
    first_failed: Option<String>,
    fallback: Error,
) -> Error {
    resources.abort_all();
    let results = resources.join_all().await;

    let mut failed: Vec<String> = first_failed.into_iter().collect();
    while let Ok(unit) = failures.try_recv() {
        failed.push(unit);
    }
    resources.teardown();

    let Some(first) = failed.first() else {
        return fallback;
    };
    tracing::error!(
        unit = %first,
        failed = failed.len(),
        "Terminated the run after a unit failure"
    );
    results
        .into_iter()
        .find(|(unit, _)| unit == first)
        .and_then(|(_, result)| result.err())
        .unwrap_or(fallback)
}

async fn wait_for_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.map(|()| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|()| "Ctrl+C")
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("lines", &self.lines.len())
            .field("status_check", &self.status_check.name())
            .finish()
    }
}
