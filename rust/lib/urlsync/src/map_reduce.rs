use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

/// A fetch result: status code plus body (success) or error payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<B> {
    pub status: u16,
    pub body: B,
}

/// One finished request, in the order requests completed.
#[derive(Debug, Clone, PartialEq)]
pub struct Completed<R, T, E> {
    pub request: R,
    pub status: u16,
    /// Mapped success body, or the raw error payload.
    pub outcome: Result<T, E>,
}

impl<R, T, E> Completed<R, T, E> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Issue every request concurrently and fold the results.
///
/// - `fetch` starts one request; `Err` carries a failed response.
/// - `map` transforms each successful body.
/// - `reduce(done, finished)` folds the completions gathered so far.
/// - `progress` receives `reduce(.., false)` once before any completion and
///   after every completion but the last.
///
/// Resolves with `reduce(all, true)`. An empty request list resolves
/// immediately without progress notifications.
pub async fn map_reduce<R, D, E, T, Out, F, Fut, M, Red, P>(
    requests: Vec<R>,
    fetch: F,
    map: M,
    reduce: Red,
    mut progress: P,
) -> Out
where
    F: Fn(&R) -> Fut,
    Fut: Future<Output = Result<Response<D>, Response<E>>>,
    M: Fn(D) -> T,
    Red: Fn(&[Completed<R, T, E>], bool) -> Out,
    P: FnMut(Out),
{
    let total = requests.len();
    if total == 0 {
        return reduce(&[], true);
    }
    progress(reduce(&[], false));

    let mut in_flight: FuturesUnordered<_> = requests
        .into_iter()
        .map(|request| {
            let pending = fetch(&request);
            async move { (request, pending.await) }
        })
        .collect();

    let mut done = Vec::with_capacity(total);
    while let Some((request, result)) = in_flight.next().await {
        let completed = match result {
            Ok(response) => Completed {
                request,
                status: response.status,
                outcome: Ok(map(response.body)),
            },
            Err(response) => Completed {
                request,
                status: response.status,
                outcome: Err(response.body),
            },
        };
        done.push(completed);
        debug!("map_reduce: {}/{} requests complete", done.len(), total);
        if done.len() < total {
            progress(reduce(&done, false));
        }
    }
    reduce(&done, true)
}
