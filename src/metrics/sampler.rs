//! Generic background sampler: one task, one lock, one published snapshot.

use crate::error::{Result, SensorError};
use crate::metrics::traits::Probe;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Owns a probe's refresh loop and the snapshot it publishes.
///
/// The refresh task is the only writer. Any number of readers may call
/// [`Sampler::snapshot`] concurrently; a read is a clone under a shared
/// lock and never waits on I/O.
pub struct Sampler<T> {
    name: &'static str,
    snapshot: Arc<RwLock<T>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Sampler<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    /// Start a sampler driving `probe` every `interval`.
    ///
    /// The first tick runs immediately. Must be called from within a tokio
    /// runtime.
    pub fn spawn<P>(probe: P, interval: Duration) -> Result<Self>
    where
        P: Probe<Output = T>,
    {
        if interval.is_zero() {
            return Err(SensorError::config_error(format!(
                "{} sampler interval must be non-zero",
                probe.name()
            )));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SensorError::runtime_error(e.to_string()))?;

        let name = probe.name();
        let snapshot = Arc::new(RwLock::new(T::default()));
        let cancel = CancellationToken::new();

        let task = runtime.spawn(run(
            probe,
            interval,
            Arc::clone(&snapshot),
            cancel.clone(),
        ));
        debug!(sampler = name, ?interval, "sampler started");

        Ok(Self {
            name,
            snapshot,
            cancel,
            task: Mutex::new(Some(task)),
        })
    }

    /// A sampler whose hardware was not discovered. It never starts a task
    /// and always reports `T::default()`.
    pub fn disabled(name: &'static str) -> Self {
        Self {
            name,
            snapshot: Arc::new(RwLock::new(T::default())),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> T {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the refresh task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancel the refresh task and wait for it to exit. Safe to call more
    /// than once.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = task {
            if let Err(e) = task.await {
                debug!(sampler = self.name, error = %e, "sampler task ended abnormally");
            }
        }
    }
}

impl<T> Drop for Sampler<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<P: Probe>(
    mut probe: P,
    interval: Duration,
    snapshot: Arc<RwLock<P::Output>>,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match probe.sample().await {
            Ok(Some(value)) => {
                *snapshot.write().unwrap_or_else(PoisonError::into_inner) = value;
            }
            Ok(None) => trace!(sampler = probe.name(), "tick produced no new value"),
            Err(e) => debug!(sampler = probe.name(), error = %e, "tick skipped"),
        }
    }

    debug!(sampler = probe.name(), "sampler stopped");
}
