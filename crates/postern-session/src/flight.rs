//! Single-flight coalescing for async operations
//!
//! Ensures at most one execution of a logical operation is in flight at a
//! time. The first caller becomes the leader and installs the operation's
//! future in a shared slot; callers arriving while it runs await the same
//! shared future and observe the same output. A call arriving after the
//! flight completes starts a fresh execution.
//!
//! The slot lock is held only for the check-then-set and the post-completion
//! sweep, never across the operation itself. Cancellation cannot wedge the
//! slot: the stored future is driven by whichever waiter polls it, and a
//! completed flight left behind by cancelled waiters is treated as absent.

use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tracing::debug;

struct InFlight<T> {
    generation: u64,
    shared: Shared<BoxFuture<'static, T>>,
}

struct SlotState<T> {
    next_generation: u64,
    current: Option<InFlight<T>>,
}

/// Coalesces concurrent executions of one async operation.
///
/// `T` is the operation's output, cloned to every waiter. Outputs are shared
/// only within a single flight; they are never cached across flights, so an
/// error result does not poison later calls.
pub struct Flight<T> {
    slot: Mutex<SlotState<T>>,
}

impl<T> Flight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(SlotState {
                next_generation: 0,
                current: None,
            }),
        }
    }

    /// Run `make`'s future, or join one already in flight.
    ///
    /// `make` is invoked only if this caller becomes the leader. All callers
    /// of the same flight resume with clones of the same output. Whichever
    /// waiter finishes first retires the flight; the generation tag keeps a
    /// newer flight from being cleared by a slow waiter of an older one.
    pub async fn run<F, Fut>(&self, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (generation, shared) = {
            let mut state = self.slot.lock().await;
            let live = state
                .current
                .as_ref()
                .filter(|inflight| inflight.shared.peek().is_none());
            match live {
                Some(inflight) => {
                    debug!(generation = inflight.generation, "joining in-flight operation");
                    (inflight.generation, inflight.shared.clone())
                }
                None => {
                    let generation = state.next_generation;
                    state.next_generation += 1;
                    let shared = make().boxed().shared();
                    state.current = Some(InFlight {
                        generation,
                        shared: shared.clone(),
                    });
                    debug!(generation, "starting new flight");
                    (generation, shared)
                }
            }
        };

        let value = shared.await;

        let mut state = self.slot.lock().await;
        if state
            .current
            .as_ref()
            .is_some_and(|inflight| inflight.generation == generation)
        {
            state.current = None;
        }

        value
    }
}

impl<T> Default for Flight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_calls_share_one_execution() {
        let flight = Arc::new(Flight::new());
        let executions = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..10 {
            let flight = flight.clone();
            let executions = executions.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .run(move || async move {
                        executions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        42u32
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap(), 42);
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sequential_calls_execute_each_time() {
        let flight: Flight<u32> = Flight::new();
        let executions = Arc::new(AtomicUsize::new(0));

        for expected in [1, 2] {
            let executions2 = executions.clone();
            let value = flight
                .run(move || async move {
                    executions2.fetch_add(1, Ordering::SeqCst);
                    7u32
                })
                .await;
            assert_eq!(value, 7);
            assert_eq!(executions.load(Ordering::SeqCst), expected);
        }
    }

    #[tokio::test]
    async fn error_results_are_shared_not_cached() {
        let flight: Arc<Flight<Result<u32, String>>> = Arc::new(Flight::new());
        let executions = Arc::new(AtomicUsize::new(0));

        // One failing flight, two waiters: both see the same error.
        let mut handles = vec![];
        for _ in 0..2 {
            let flight = flight.clone();
            let executions = executions.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .run(move || async move {
                        executions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Err::<u32, String>("boom".into())
                    })
                    .await
            }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap(), Err("boom".into()));
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1);

        // The error is not sticky: the next flight runs and may succeed.
        let executions2 = executions.clone();
        let value = flight
            .run(move || async move {
                executions2.fetch_add(1, Ordering::SeqCst);
                Ok(9)
            })
            .await;
        assert_eq!(value, Ok(9));
        assert_eq!(executions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn aborted_leader_leaves_flight_resumable() {
        let flight = Arc::new(Flight::new());
        let executions = Arc::new(AtomicUsize::new(0));

        let leader = tokio::spawn({
            let flight = flight.clone();
            let executions = executions.clone();
            async move {
                flight
                    .run(move || async move {
                        executions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        7u32
                    })
                    .await
            }
        });

        // Let the leader install the flight, then kill it mid-sleep.
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        // A later caller joins the installed flight and drives it home.
        let executions2 = executions.clone();
        let value = tokio::time::timeout(
            Duration::from_secs(2),
            flight.run(move || async move {
                executions2.fetch_add(1, Ordering::SeqCst);
                99u32
            }),
        )
        .await
        .unwrap();

        assert_eq!(value, 7, "joiner must observe the original flight's output");
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn waiters_resume_only_after_completion() {
        let flight = Arc::new(Flight::new());
        let completed = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..4 {
            let flight = flight.clone();
            let completed = completed.clone();
            handles.push(tokio::spawn(async move {
                let value = flight
                    .run(|| async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        "done"
                    })
                    .await;
                completed.fetch_add(1, Ordering::SeqCst);
                value
            }));
        }

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(
            completed.load(Ordering::SeqCst),
            0,
            "no waiter may resume before the flight resolves"
        );

        for h in handles {
            assert_eq!(h.await.unwrap(), "done");
        }
        assert_eq!(completed.load(Ordering::SeqCst), 4);
    }
}
