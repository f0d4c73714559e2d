//! Running many probes in parallel.
//!
//! Probes are independent: none may read another's result, so the batch is a
//! plain work queue drained by a fixed number of worker threads. Completion
//! order is unspecified; the returned results are sorted by probe name.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use super::executor::ProbeRunner;
use crate::cache::ProbeCache;
use crate::context::BuildContext;
use crate::error::{ConftestError, Result};
use crate::probe::ProbeDefinition;
use crate::result::ProbeResult;
use crate::store::ResultStore;
use crate::toolchain::CancelToken;

/// Options for [`run_all`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions<'a> {
    /// Worker threads. `0` means one per available CPU.
    pub jobs: usize,
    /// Cancels every in-flight and queued probe.
    pub cancel: Option<CancelToken>,
    /// Every result is recorded here as soon as it is known.
    pub store: Option<&'a ResultStore>,
    /// Consulted before running a probe and updated afterwards.
    pub cache: Option<&'a ProbeCache>,
}

impl RunOptions<'_> {
    fn worker_count(&self, probes: usize) -> usize {
        let jobs = if self.jobs == 0 {
            thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            self.jobs
        };
        jobs.min(probes).max(1)
    }
}

/// Run every probe in `defs` against `ctx`.
///
/// Fails only if two definitions share a name; individual probe problems are
/// reported in the results as `INDETERMINATE`.
pub fn run_all(
    defs: &[ProbeDefinition],
    ctx: &BuildContext,
    options: &RunOptions<'_>,
) -> Result<Vec<ProbeResult>> {
    ensure_unique(defs)?;

    let mut runner = ProbeRunner::new(ctx);
    if let Some(token) = &options.cancel {
        runner = runner.with_cancel(token.clone());
    }

    let next = AtomicUsize::new(0);
    let results = Mutex::new(Vec::with_capacity(defs.len()));
    let workers = options.worker_count(defs.len());
    tracing::debug!("running {} probes on {} workers", defs.len(), workers);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let Some(def) = defs.get(next.fetch_add(1, Ordering::SeqCst)) else {
                    break;
                };

                let result = run_one(&runner, def, options.cache);
                if let Some(store) = options.store {
                    if let Err(e) = store.record(result.clone()) {
                        tracing::warn!(probe = def.name(), "failed to record result: {}", e);
                    }
                }
                results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(result);
            });
        }
    });

    let mut results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
    results.sort_by(|a, b| a.probe_name().cmp(b.probe_name()));
    Ok(results)
}

fn run_one(runner: &ProbeRunner<'_>, def: &ProbeDefinition, cache: Option<&ProbeCache>) -> ProbeResult {
    let ctx = runner.context();

    if let Some(cached) = cache.and_then(|c| c.get(def, ctx)) {
        return cached;
    }

    let result = runner.run(def);

    if let Some(cache) = cache {
        if let Err(e) = cache.put(def, ctx, &result) {
            tracing::warn!(probe = def.name(), "failed to cache result: {:#}", e);
        }
    }
    result
}

fn ensure_unique(defs: &[ProbeDefinition]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for def in defs {
        if !seen.insert(def.name()) {
            return Err(ConftestError::DuplicateProbe {
                name: def.name().to_string(),
            });
        }
    }
    Ok(())
}
