//! Bounded task pool draining a shared work queue

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

/// Runs `worker` over `items` with at most `concurrency` tasks in flight
///
/// Each task repeatedly pops the next item from a shared queue, so every
/// item is processed exactly once. Results come back in completion order.
/// A panicking task loses only its own results; the other tasks keep
/// draining the queue.
pub async fn run_bounded<T, R, F, Fut>(items: Vec<T>, concurrency: usize, worker: F) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    if items.is_empty() {
        return Vec::new();
    }

    let workers = concurrency.max(1).min(items.len());
    let queue = Arc::new(Mutex::new(VecDeque::from(items)));
    let worker = Arc::new(worker);
    let mut set = JoinSet::new();

    for _ in 0..workers {
        let queue = Arc::clone(&queue);
        let worker = Arc::clone(&worker);
        set.spawn(async move {
            let mut results = Vec::new();
            loop {
                let next = queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
                let Some(item) = next else {
                    break;
                };
                results.push(worker(item).await);
            }
            results
        });
    }

    let mut out = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(mut results) => out.append(&mut results),
            Err(e) => tracing::error!("Pipeline worker failed: {}", e),
        }
    }
    out
}
