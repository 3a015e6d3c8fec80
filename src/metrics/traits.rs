//! Traits for per-tick hardware probes.

use crate::error::Result;

/// One metric family's per-tick reader.
///
/// A probe owns whatever "last observed" state its derived values need
/// (counter baselines) and performs all I/O for a tick. It never touches
/// the published snapshot; the [`Sampler`](crate::metrics::Sampler)
/// running it does that after `sample` returns.
pub trait Probe: Send + 'static {
    /// The snapshot type this probe produces.
    type Output: Clone + Default + Send + Sync + 'static;

    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Run one tick.
    ///
    /// Returns `Ok(Some(_))` to publish a new snapshot, `Ok(None)` when the
    /// tick produced nothing new (e.g. the first baseline read of a delta
    /// counter), or an error for a transient read/parse failure. Errors are
    /// swallowed by the sampler and the previous snapshot is kept.
    fn sample(&mut self) -> impl std::future::Future<Output = Result<Option<Self::Output>>> + Send;
}
