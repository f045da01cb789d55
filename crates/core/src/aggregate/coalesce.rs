//! Single-flight coalescing of identical concurrent requests.
//!
//! At most one execution runs per key. The first caller does the work and
//! broadcasts the result; late joiners await that broadcast instead of
//! repeating the work. The in-flight entry is removed unconditionally when
//! the owning call finishes or is dropped, so a failed leader never wedges
//! the key: waiters observe the closed channel and take over.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::metrics;

pub struct Coalescer<T: Clone + Send + 'static> {
    inflight: Arc<Mutex<HashMap<String, broadcast::Sender<T>>>>,
}

impl<T: Clone + Send + 'static> Default for Coalescer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Coalescer<T> {
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `work` under the key, or await the in-flight execution's result.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut work = Some(work);
        loop {
            let waiting = {
                let mut inflight = self.inflight.lock().unwrap();
                match inflight.get(key) {
                    Some(tx) => Some(tx.subscribe()),
                    None => {
                        let (tx, _) = broadcast::channel(1);
                        inflight.insert(key.to_string(), tx);
                        None
                    }
                }
            };

            match waiting {
                Some(mut rx) => {
                    metrics::COALESCED_JOINS.inc();
                    match rx.recv().await {
                        Ok(value) => return value,
                        // Leader vanished without publishing; try to lead.
                        Err(_) => continue,
                    }
                }
                None => {
                    let guard = ClearOnDrop {
                        inflight: Arc::clone(&self.inflight),
                        key: key.to_string(),
                    };
                    let value = work.take().expect("leader runs at most once")().await;
                    // Clear the flag before publishing: a caller arriving in
                    // between starts fresh rather than waiting forever.
                    if let Some(tx) = guard.clear() {
                        let _ = tx.send(value.clone());
                    }
                    return value;
                }
            }
        }
    }

    /// Whether the key currently has an in-flight execution.
    pub fn is_inflight(&self, key: &str) -> bool {
        self.inflight.lock().unwrap().contains_key(key)
    }
}

struct ClearOnDrop<T: Clone + Send + 'static> {
    inflight: Arc<Mutex<HashMap<String, broadcast::Sender<T>>>>,
    key: String,
}

impl<T: Clone + Send + 'static> ClearOnDrop<T> {
    fn clear(self) -> Option<broadcast::Sender<T>> {
        let tx = self.inflight.lock().unwrap().remove(&self.key);
        std::mem::forget(self);
        tx
    }
}

impl<T: Clone + Send + 'static> Drop for ClearOnDrop<T> {
    fn drop(&mut self) {
        self.inflight.lock().unwrap().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_single_caller_runs_work() {
        let coalescer: Coalescer<u32> = Coalescer::new();
        let value = coalescer.run("k", || async { 7 }).await;
        assert_eq!(value, 7);
        assert!(!coalescer.is_inflight("k"));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_execution() {
        let coalescer: Arc<Coalescer<u32>> = Arc::new(Coalescer::new());
        let executions = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coalescer = Arc::clone(&coalescer);
            let executions = Arc::clone(&executions);
            handles.push(tokio::spawn(async move {
                coalescer
                    .run("k", || async {
                        executions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        42u32
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1);
        assert!(!coalescer.is_inflight("k"));
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let coalescer: Arc<Coalescer<u32>> = Arc::new(Coalescer::new());
        let executions = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..4u32 {
            let coalescer = Arc::clone(&coalescer);
            let executions = Arc::clone(&executions);
            handles.push(tokio::spawn(async move {
                coalescer
                    .run(&format!("k{}", i), || async {
                        executions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        i
                    })
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(executions.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_flag_cleared_after_failure_result() {
        let coalescer: Coalescer<Result<u32, String>> = Coalescer::new();
        let value = coalescer.run("k", || async { Err("boom".to_string()) }).await;
        assert!(value.is_err());
        assert!(!coalescer.is_inflight("k"));

        // The key is usable again.
        let value = coalescer.run("k", || async { Ok(1) }).await;
        assert_eq!(value, Ok(1));
    }

    #[tokio::test]
    async fn test_cancelled_leader_does_not_wedge_waiters() {
        let coalescer: Arc<Coalescer<u32>> = Arc::new(Coalescer::new());

        let leader = {
            let coalescer = Arc::clone(&coalescer);
            tokio::spawn(async move {
                coalescer
                    .run("k", || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        1u32
                    })
                    .await
            })
        };

        // Let the leader claim the key, then join as a waiter.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(coalescer.is_inflight("k"));

        let waiter = {
            let coalescer = Arc::clone(&coalescer);
            tokio::spawn(async move { coalescer.run("k", || async { 2u32 }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        leader.abort();
        let _ = leader.await;

        // The waiter takes over and completes with its own work.
        let value = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter must not hang")
            .unwrap();
        assert_eq!(value, 2);
        assert!(!coalescer.is_inflight("k"));
    }
}
