//! Fetch strategies for a chunk plan.
//!
//! Implements the Strategy pattern for issuing the planned range requests
//! either one at a time or from a pool of worker threads. Both strategies
//! are all-or-nothing: the first failure is returned and no partial list of
//! responses ever reaches the merge step.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{DownloadError, DownloadResult};
use crate::fetch::fetch_range;
use crate::plan::ChunkPlan;
use crate::transport::HttpTransport;
use crate::types::ChunkResponse;

/// Strategy for fetching every range of a plan.
pub trait FetchStrategy: Send + Sync {
    /// Fetch all ranges of `plan` from `url`.
    ///
    /// # Returns
    ///
    /// One response per planned range, in no particular order, or the first
    /// error encountered.
    fn execute(
        &self,
        transport: &dyn HttpTransport,
        url: &str,
        plan: &ChunkPlan,
    ) -> DownloadResult<Vec<ChunkResponse>>;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Sequential fetch strategy.
///
/// Issues each range request and waits for it before sending the next one,
/// in plan order.
#[derive(Debug, Default)]
pub struct SequentialStrategy;

impl SequentialStrategy {
    /// Create a new sequential strategy.
    pub fn new() -> Self {
        Self
    }
}

impl FetchStrategy for SequentialStrategy {
    fn execute(
        &self,
        transport: &dyn HttpTransport,
        url: &str,
        plan: &ChunkPlan,
    ) -> DownloadResult<Vec<ChunkResponse>> {
        plan.ranges()
            .iter()
            .map(|&range| fetch_range(transport, url, range))
            .collect()
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

/// Parallel fetch strategy.
///
/// Runs up to `concurrency` scoped worker threads that pull ranges from a
/// shared index. Responses are collected in completion order. After the
/// first failure no worker starts another request; in-flight requests are
/// allowed to finish and their responses are dropped.
#[derive(Debug)]
pub struct ParallelStrategy {
    /// Maximum number of concurrent range requests.
    pub concurrency: usize,
}

impl ParallelStrategy {
    /// Create a new parallel strategy (minimum concurrency 1).
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }
}

impl Default for ParallelStrategy {
    fn default() -> Self {
        Self::new(4)
    }
}

impl FetchStrategy for ParallelStrategy {
    fn execute(
        &self,
        transport: &dyn HttpTransport,
        url: &str,
        plan: &ChunkPlan,
    ) -> DownloadResult<Vec<ChunkResponse>> {
        let ranges = plan.ranges();
        let workers = self.concurrency.min(ranges.len());

        let next = AtomicUsize::new(0);
        let aborted = AtomicBool::new(false);
        let completed = Mutex::new(Vec::with_capacity(ranges.len()));
        let first_error: Mutex<Option<DownloadError>> = Mutex::new(None);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if aborted.load(Ordering::Acquire) {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::AcqRel);
                    let Some(&range) = ranges.get(index) else {
                        break;
                    };

                    match fetch_range(transport, url, range) {
                        Ok(chunk) => completed.lock().push(chunk),
                        Err(e) => {
                            aborted.store(true, Ordering::Release);
                            first_error.lock().get_or_insert(e);
                            break;
                        }
                    }
                });
            }
        });

        if let Some(e) = first_error.into_inner() {
            debug!(error = %e, "Parallel fetch aborted");
            return Err(e);
        }

        Ok(completed.into_inner())
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}
