//! Bounded-concurrency mapping over a sequence of async jobs.
//!
//! Failure policy is fail-fast: the first error (in completion order) is
//! returned and the jobs still in flight are detached rather than aborted.
//! They run to completion on the runtime and their results are dropped.
//! Callers that need per-item isolation wrap their transform in their own
//! error boundary so it never returns `Err`.

use std::future::Future;
use tokio::task::JoinSet;

/// Apply `transform` to every item with at most `limit` invocations in
/// flight. `results[i]` corresponds to `items[i]`. A `limit` of 0 is treated
/// as 1.
pub async fn map_with_concurrency<T, R, E, F, Fut>(
    items: Vec<T>,
    limit: usize,
    transform: F,
) -> Result<Vec<R>, E>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    let limit = limit.max(1);
    let total = items.len();
    let mut slots: Vec<Option<R>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);

    let mut pending = items.into_iter().enumerate();
    let mut in_flight = JoinSet::new();

    loop {
        while in_flight.len() < limit {
            let Some((index, item)) = pending.next() else {
                break;
            };
            let job = transform(item);
            in_flight.spawn(async move { (index, job.await) });
        }

        let Some(joined) = in_flight.join_next().await else {
            break;
        };
        let (index, outcome) = match joined {
            Ok(done) => done,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            // The JoinSet is never aborted, so every task either finishes or panics
            Err(err) => unreachable!("mapper task cancelled: {err}"),
        };
        match outcome {
            Ok(value) => slots[index] = Some(value),
            Err(err) => {
                in_flight.detach_all();
                return Err(err);
            }
        }
    }

    Ok(slots.into_iter().flatten().collect())
}
