//! Bounded parallel map used for glossary fan-out and per-hit resolution.

use crate::error::{ResolverError, Result};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::Arc;

/// Order-preserving parallel map over a dedicated pool. One worker runs
/// everything inline on the caller's thread.
#[derive(Clone)]
pub(crate) struct FanOut {
    pool: Option<Arc<ThreadPool>>,
}

impl FanOut {
    pub(crate) fn new(workers: usize) -> Result<Self> {
        if workers <= 1 {
            return Ok(Self::inline());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("metacontext-fanout-{i}"))
            .build()
            .map_err(|e| ResolverError::InvalidArgument(format!("fan-out pool: {e}")))?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    pub(crate) fn inline() -> Self {
        Self { pool: None }
    }

    /// Apply `f` to every item; results come back in input order.
    pub(crate) fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool) if items.len() > 1 => pool.install(|| items.par_iter().map(f).collect()),
            _ => items.iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_order_matches_input_order() {
        let fan = FanOut::new(4).unwrap();
        let items: Vec<u32> = (0..200).collect();
        let out = fan.map(&items, |n| n * 2);
        assert_eq!(out, items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn single_worker_runs_inline() {
        let fan = FanOut::new(1).unwrap();
        assert!(fan.pool.is_none());
        let caller = std::thread::current().id();
        let ids = fan.map(&[1, 2, 3], |_| std::thread::current().id());
        assert!(ids.iter().all(|id| *id == caller));
    }
}
