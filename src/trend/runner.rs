use super::{classify, TimeInterval, TrendLabel};
use crate::error::Result;
use crate::settings::TrendSettings;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// Upper bound on trend worker threads.
pub const MAX_WORKERS: usize = 8;

/// How the series of one metric are classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    /// One series after the other on the calling thread.
    Sequential,
    /// On a dedicated pool of `min(threads, series)` workers, at least one.
    /// `threads` defaults to [`MAX_WORKERS`].
    Parallel { threads: Option<usize> },
}

impl Default for ExecMode {
    fn default() -> Self {
        if cfg!(feature = "parallel-trend") {
            Self::Parallel { threads: None }
        } else {
            Self::Sequential
        }
    }
}

impl ExecMode {
    /// Classify every series, keyed like the input.
    pub(crate) fn classify_all(
        self,
        series: IndexMap<String, Vec<f64>>,
        interval: TimeInterval,
        settings: &TrendSettings,
    ) -> Result<HashMap<String, TrendLabel>> {
        match self {
            Self::Sequential => Ok(series
                .into_iter()
                .map(|(key, values)| {
                    let label = classify(&values, interval, settings);
                    (key, label)
                })
                .collect()),
            Self::Parallel { threads } => classify_parallel(series, interval, settings, threads),
        }
    }
}

#[cfg(feature = "parallel-trend")]
fn classify_parallel(
    series: IndexMap<String, Vec<f64>>,
    interval: TimeInterval,
    settings: &TrendSettings,
    threads: Option<usize>,
) -> Result<HashMap<String, TrendLabel>> {
    use rayon::prelude::*;

    let workers = threads
        .unwrap_or(MAX_WORKERS)
        .min(series.len())
        .max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("trend-worker-{i}"))
        .build()
        .map_err(|e| crate::Error::WorkerPool(e.to_string()))?;
    debug!(workers, series = series.len(), "trend worker pool started");

    let jobs: Vec<(String, Vec<f64>)> = series.into_iter().collect();
    Ok(pool.install(|| {
        jobs.into_par_iter()
            .map(|(key, values)| {
                let label = classify(&values, interval, settings);
                (key, label)
            })
            .collect()
    }))
}

/// Without the pool, parallel classification runs on the calling thread.
#[cfg(not(feature = "parallel-trend"))]
fn classify_parallel(
    series: IndexMap<String, Vec<f64>>,
    interval: TimeInterval,
    settings: &TrendSettings,
    _threads: Option<usize>,
) -> Result<HashMap<String, TrendLabel>> {
    debug!(series = series.len(), "parallel-trend disabled, classifying sequentially");
    ExecMode::Sequential.classify_all(series, interval, settings)
}
