//! Bounded concurrency queue for outbound provider calls.
//!
//! Caps simultaneous in-flight tasks with a semaphore and paces task
//! starts over time windows using the governor crate, so burst load on a
//! provider stays bounded no matter how many sub-queries were generated.

use futures::future::join_all;
use governor::{Quota, RateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use tokio::sync::Semaphore;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Runs submitted async tasks with a maximum number in flight and a
/// maximum number of starts per second.
///
/// Failure of one task never cancels or blocks the others: `run_all`
/// collects each task's outcome independently (all-settled semantics).
pub struct BoundedQueue {
    semaphore: Semaphore,
    limiter: DirectRateLimiter,
}

impl BoundedQueue {
    /// Create a queue allowing `concurrency` tasks in flight and
    /// `starts_per_second` task starts per one-second window.
    pub fn new(concurrency: usize, starts_per_second: u32) -> Self {
        let quota =
            Quota::per_second(NonZeroU32::new(starts_per_second).unwrap_or(NonZeroU32::MIN));
        Self {
            semaphore: Semaphore::new(concurrency.max(1)),
            limiter: RateLimiter::direct(quota),
        }
    }

    /// Create with a custom governor quota.
    pub fn with_quota(concurrency: usize, quota: Quota) -> Self {
        Self {
            semaphore: Semaphore::new(concurrency.max(1)),
            limiter: RateLimiter::direct(quota),
        }
    }

    /// Run one task once capacity and pacing allow.
    pub async fn run<F, O>(&self, task: F) -> O
    where
        F: Future<Output = O>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("queue semaphore closed");
        self.limiter.until_ready().await;
        task.await
    }

    /// Run all tasks and collect every outcome in submission order.
    ///
    /// Returns one `Result` per task; failures occupy their slot instead
    /// of aborting the batch.
    pub async fn run_all<F, T, E>(&self, tasks: Vec<F>) -> Vec<std::result::Result<T, E>>
    where
        F: Future<Output = std::result::Result<T, E>>,
    {
        join_all(tasks.into_iter().map(|task| self.run(task))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_settled_preserves_order_and_failures() {
        let queue = BoundedQueue::new(3, 100);
        let tasks: Vec<_> = (0..5)
            .map(|i| async move {
                if i == 2 {
                    Err(format!("task {} failed", i))
                } else {
                    Ok(i)
                }
            })
            .collect();

        let outcomes = queue.run_all(tasks).await;
        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes[0], Ok(0));
        assert_eq!(outcomes[1], Ok(1));
        assert_eq!(outcomes[2], Err("task 2 failed".to_string()));
        assert_eq!(outcomes[3], Ok(3));
        assert_eq!(outcomes[4], Ok(4));
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_concurrency() {
        static IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);
        static MAX_SEEN: AtomicUsize = AtomicUsize::new(0);

        let queue = BoundedQueue::new(2, 1000);
        let tasks: Vec<_> = (0..6)
            .map(|i| async move {
                let now = IN_FLIGHT.fetch_add(1, Ordering::SeqCst) + 1;
                MAX_SEEN.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
                Ok::<usize, ()>(i)
            })
            .collect();

        let outcomes = queue.run_all(tasks).await;
        assert_eq!(outcomes.len(), 6);
        assert!(MAX_SEEN.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_pacing_delays_starts_beyond_window_cap() {
        let queue = BoundedQueue::new(10, 2);
        let start = std::time::Instant::now();
        let tasks: Vec<_> = (0..4).map(|i| async move { Ok::<usize, ()>(i) }).collect();
        let _ = queue.run_all(tasks).await;
        // 4 starts at 2/sec: the later starts must wait for replenishment.
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
