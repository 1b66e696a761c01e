//! Execution strategies for a planned stream.
//!
//! A [`Runner`] evaluates the plan over the source either on the calling
//! thread, or split into contiguous batches handed to a fixed set of workers
//! that exists only for the duration of the call. Batches come back in batch
//! index order, so every strategy yields the same sequence.

use crate::error::FlowError;
use crate::op::{apply_chain, first_async, Op};
use crate::source::{Source, Value};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::ops::Range;
use std::panic;
use std::thread;

#[cfg(feature = "async")]
use crate::op::apply_chain_async;

/// Which kind of worker runs the batches of a parallel action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Backend {
    /// A rayon thread pool built for the call.
    #[default]
    Pool,
    /// Scoped OS threads with a static round-robin batch assignment.
    Threads,
}

impl Backend {
    /// `Threads` when `use_threads` is set, `Pool` otherwise.
    pub fn from_use_threads(use_threads: bool) -> Self {
        if use_threads { Backend::Threads } else { Backend::Pool }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    Sequential,
    /// `workers` is a positive count, or `-1` for all but one available core.
    Parallel { workers: isize, backend: Backend },
}

pub struct Runner {
    pub mode: ExecMode,
    /// Lower bound on the number of elements per batch.
    pub min_batch_size: usize,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            mode: ExecMode::Sequential,
            min_batch_size: 10,
        }
    }
}

impl Runner {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn parallel(workers: isize, backend: Backend) -> Self {
        Self {
            mode: ExecMode::Parallel { workers, backend },
            ..Self::default()
        }
    }

    /// Parallel when `workers` resolves to more than one worker, sequential otherwise.
    pub fn for_workers(workers: isize, use_threads: bool) -> Result<Self> {
        if resolve_workers(workers)? > 1 {
            Ok(Self::parallel(workers, Backend::from_use_threads(use_threads)))
        } else {
            Ok(Self::sequential())
        }
    }

    /// Evaluate `ops` over every element of `source`.
    pub(crate) fn run(&self, source: &dyn Source, ops: &[Op]) -> Result<Vec<Value>> {
        if let Some(name) = first_async(ops) {
            return Err(FlowError::AsyncOperation { name }.into());
        }

        match self.mode {
            ExecMode::Sequential => {
                tracing::debug!(elements = source.len(), ops = ops.len(), "sequential collect");
                Ok(run_batch(source, ops, 0..source.len())?)
            }
            ExecMode::Parallel { workers, backend } => {
                let workers = resolve_workers(workers)?;
                let ranges = batch_ranges(source.len(), workers, self.min_batch_size);
                tracing::debug!(
                    ?backend,
                    workers,
                    batches = ranges.len(),
                    elements = source.len(),
                    "parallel collect"
                );
                if ranges.is_empty() {
                    return Ok(Vec::new());
                }
                match backend {
                    Backend::Pool => run_pool(source, ops, &ranges, workers),
                    Backend::Threads => run_threads(source, ops, &ranges, workers),
                }
            }
        }
    }
}

/// Resolve a requested worker count: `-1` means available cores minus one
/// (at least one), positive counts are kept, anything else is rejected.
pub fn resolve_workers(workers: isize) -> Result<usize, FlowError> {
    match workers {
        -1 => Ok(num_cpus::get().saturating_sub(1).max(1)),
        n if n >= 1 => Ok(n as usize),
        n => Err(FlowError::InvalidWorkers(n)),
    }
}

/// Contiguous ranges of `max(min_batch, len / workers)` elements covering `0..len`.
pub(crate) fn batch_ranges(len: usize, workers: usize, min_batch: usize) -> Vec<Range<usize>> {
    let size = min_batch.max(len / workers.max(1)).max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

fn run_batch(
    source: &dyn Source,
    ops: &[Op],
    range: Range<usize>,
) -> Result<Vec<Value>, FlowError> {
    tracing::trace!(start = range.start, end = range.end, "batch");
    let mut out = Vec::with_capacity(range.len());
    for value in source.values(range) {
        if let Some(v) = apply_chain(value, ops)? {
            out.push(v);
        }
    }
    Ok(out)
}

fn run_pool(
    source: &dyn Source,
    ops: &[Op],
    ranges: &[Range<usize>],
    workers: usize,
) -> Result<Vec<Value>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("monadflow-pool-{i}"))
        .build()
        .context("failed to build worker pool")?;

    // Panics inside a batch are re-raised by rayon on this thread.
    let batches = pool.install(|| {
        ranges
            .par_iter()
            .map(|r| run_batch(source, ops, r.clone()))
            .collect::<Result<Vec<_>, FlowError>>()
    })?;
    Ok(batches.into_iter().flatten().collect())
}

fn run_threads(
    source: &dyn Source,
    ops: &[Op],
    ranges: &[Range<usize>],
    workers: usize,
) -> Result<Vec<Value>> {
    let n = workers.min(ranges.len()).max(1);
    let mut slots: Vec<Vec<Value>> = (0..ranges.len()).map(|_| Vec::new()).collect();

    thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(n);
        for w in 0..n {
            let handle = thread::Builder::new()
                .name(format!("monadflow-worker-{w}"))
                .spawn_scoped(scope, move || {
                    ranges
                        .iter()
                        .enumerate()
                        .skip(w)
                        .step_by(n)
                        .map(|(i, r)| run_batch(source, ops, r.clone()).map(|out| (i, out)))
                        .collect::<Result<Vec<_>, FlowError>>()
                })
                .context("failed to spawn worker thread")?;
            handles.push(handle);
        }

        for handle in handles {
            let done = match handle.join() {
                Ok(done) => done?,
                Err(payload) => panic::resume_unwind(payload),
            };
            for (i, out) in done {
                slots[i] = out;
            }
        }
        Ok(())
    })?;

    Ok(slots.into_iter().flatten().collect())
}

/// Evaluate every element concurrently on the current task, gathering results
/// positionally.
#[cfg(feature = "async")]
pub(crate) async fn run_async(source: &dyn Source, ops: &[Op]) -> Result<Vec<Value>> {
    let values = source.values(0..source.len());
    tracing::debug!(elements = values.len(), ops = ops.len(), "async collect");
    if ops.is_empty() {
        return Ok(values);
    }

    let pending = values.into_iter().map(|v| apply_chain_async(v, ops));
    let results = futures::future::join_all(pending).await;
    let mut out = Vec::with_capacity(results.len());
    for result in results {
        if let Some(v) = result? {
            out.push(v);
        }
    }
    Ok(out)
}
