//! Per-user single-flight: collapses concurrent regeneration requests for
//! the same user into one in-flight computation, with late joiners awaiting
//! the same result rather than triggering duplicate work.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

type SharedResult<T> = Shared<BoxFuture<'static, Arc<T>>>;

#[derive(Clone)]
pub struct SingleFlight<T> {
    inflight: Arc<dashmap::DashMap<Uuid, SharedResult<T>>>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(dashmap::DashMap::new()),
            _marker: std::marker::PhantomData,
        }
    }

    /// Runs `make` for `key` unless a computation for it is already
    /// in flight, in which case all callers await the same result.
    pub async fn run<F>(&self, key: Uuid, make: F) -> Arc<T>
    where
        F: std::future::Future<Output = T> + Send + 'static,
    {
        if let Some(existing) = self.inflight.get(&key) {
            return existing.clone().await;
        }

        let shared: SharedResult<T> = async move { Arc::new(make.await) }.boxed().shared();
        self.inflight.insert(key, shared.clone());

        let result = shared.await;
        self.inflight.remove(&key);
        result
    }
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn concurrent_callers_for_same_key_share_one_execution() {
        let flight: SingleFlight<u32> = SingleFlight::new();
        let calls = Arc::new(AtomicU32::new(0));
        let key = Uuid::new_v4();

        let make_calls = calls.clone();
        let a = flight.run(key, async move {
            make_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            42
        });

        let make_calls = calls.clone();
        let b = flight.run(key, async move {
            make_calls.fetch_add(1, Ordering::SeqCst);
            99
        });

        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(*ra, *rb);
    }

    #[tokio::test]
    async fn different_keys_run_independently() {
        let flight: SingleFlight<u32> = SingleFlight::new();
        let a = flight.run(Uuid::new_v4(), async { 1 });
        let b = flight.run(Uuid::new_v4(), async { 2 });
        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(*ra, 1);
        assert_eq!(*rb, 2);
    }
}
