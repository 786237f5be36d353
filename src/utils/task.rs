//! Bounded async fan-out helpers.

use std::future::Future;

use futures_util::{StreamExt, stream::FuturesUnordered};
use tokio::sync::Semaphore;

/// Caps the number of file operations in flight at once.
#[derive(Debug)]
pub struct JobLimit {
    semaphore: Semaphore,
}

impl JobLimit {
    /// Create a limit of `jobs` concurrent operations (at least one).
    pub fn new(jobs: usize) -> Self {
        Self {
            semaphore: Semaphore::new(jobs.max(1)),
        }
    }

    /// Run `fut` once a slot is free.
    pub async fn run<F: Future>(&self, fut: F) -> F::Output {
        // The semaphore is never closed, so acquire only fails if it is.
        let _permit = self.semaphore.acquire().await.ok();
        fut.await
    }

    #[cfg(test)]
    fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Drive every future to completion and return all outputs, or the first
/// error observed.
///
/// Unlike `try_join_all`, a failure does not drop the futures still in
/// flight: they run to completion, and only the first error is reported.
/// Outputs are in completion order.
pub async fn join_all_first_error<I, F, T, E>(futures: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<F> = futures.into_iter().collect();
    let mut outputs = Vec::with_capacity(pending.len());
    let mut first_error = None;

    while let Some(result) = pending.next().await {
        match result {
            Ok(value) => outputs.push(value),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(_) => {}
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(outputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_join_all_collects_outputs() {
        let futures = (0..4).map(|i| async move { Ok::<_, String>(i * 2) });
        let mut out = join_all_first_error(futures).await.unwrap();
        out.sort_unstable();
        assert_eq!(out, vec![0, 2, 4, 6]);
    }

    #[tokio::test]
    async fn test_join_all_runs_everything_after_failure() {
        let counter = Cell::new(0);
        let finished = &counter;
        let futures = (0..5).map(move |i| async move {
            tokio::task::yield_now().await;
            finished.set(finished.get() + 1);
            if i == 1 || i == 3 {
                Err(format!("failed {i}"))
            } else {
                Ok(i)
            }
        });

        let err = join_all_first_error(futures).await.unwrap_err();
        assert!(err.starts_with("failed"));
        assert_eq!(counter.get(), 5);
    }

    #[tokio::test]
    async fn test_job_limit_bounds_concurrency() {
        let limit = JobLimit::new(2);
        let (active, peak) = (Cell::new(0usize), Cell::new(0usize));
        let (limit_ref, active, peak) = (&limit, &active, &peak);

        let futures = (0..6).map(move |_| {
            limit_ref.run(async move {
                active.set(active.get() + 1);
                peak.set(peak.get().max(active.get()));
                tokio::task::yield_now().await;
                active.set(active.get() - 1);
                Ok::<_, ()>(())
            })
        });
        join_all_first_error(futures).await.unwrap();

        assert_eq!(peak.get(), 2);
        assert_eq!(limit.available(), 2);
    }

    #[test]
    fn test_job_limit_minimum_one() {
        assert_eq!(JobLimit::new(0).available(), 1);
    }
}
