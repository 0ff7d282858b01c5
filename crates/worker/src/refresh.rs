//! Tracking for background stale-while-revalidate refreshes.
//!
//! Refreshes are fire-and-forget from the request's point of view, but the
//! process still owns them: shutdown drains the set for a grace period and
//! reports whatever had to be abandoned.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;

#[derive(Debug, Default)]
pub struct Refreshes {
    tasks: Mutex<JoinSet<()>>,
}

impl Refreshes {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        while let Some(done) = tasks.try_join_next() {
            log_join(done);
        }
        tasks.spawn(task);
    }

    /// Refreshes spawned and not yet reaped.
    pub async fn pending(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Wait for every in-flight refresh. Returns how many were awaited.
    ///
    /// Refreshes spawned while this waits land in a fresh set and are left
    /// for the next settle.
    pub async fn settle(&self) -> usize {
        let mut tasks = self.take().await;
        drain(&mut tasks).await
    }

    /// Wait up to `grace`, then abort what is left.
    ///
    /// Returns the number of refreshes abandoned. Their entries stay as the
    /// previous stale copy and the next stale-while-revalidate hit tries again.
    pub async fn settle_within(&self, grace: Duration) -> usize {
        let mut tasks = self.take().await;
        if tokio::time::timeout(grace, drain(&mut tasks)).await.is_ok() {
            return 0;
        }

        let abandoned = tasks.len();
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
        tracing::warn!(abandoned, grace_ms = grace.as_millis() as u64, "background refreshes lost at shutdown");
        abandoned
    }

    async fn take(&self) -> JoinSet<()> {
        std::mem::take(&mut *self.tasks.lock().await)
    }
}

async fn drain(tasks: &mut JoinSet<()>) -> usize {
    let mut settled = 0;
    while let Some(done) = tasks.join_next().await {
        log_join(done);
        settled += 1;
    }
    settled
}

fn log_join(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result
        && e.is_panic()
    {
        tracing::error!(error = %e, "background refresh panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_settle_awaits_all() {
        let refreshes = Refreshes::new();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let done = Arc::clone(&done);
            refreshes
                .spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }

        assert_eq!(refreshes.settle().await, 3);
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(refreshes.pending().await, 0);
    }

    #[tokio::test]
    async fn test_settle_within_aborts_slow() {
        let refreshes = Refreshes::new();
        refreshes.spawn(tokio::time::sleep(Duration::from_secs(30))).await;
        refreshes.spawn(async {}).await;

        let abandoned = refreshes.settle_within(Duration::from_millis(50)).await;
        assert_eq!(abandoned, 1);
        assert_eq!(refreshes.pending().await, 0);
    }

    #[tokio::test]
    async fn test_spawn_during_settle_does_not_wait() {
        let refreshes = Refreshes::new();
        refreshes.spawn(tokio::time::sleep(Duration::from_millis(200))).await;

        let (settled, spawned) = tokio::join!(refreshes.settle(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tokio::time::timeout(Duration::from_millis(50), refreshes.spawn(async {})).await
        });

        assert!(spawned.is_ok());
        assert_eq!(settled, 1);
        assert_eq!(refreshes.pending().await, 1);
        assert_eq!(refreshes.settle().await, 1);
    }

    #[tokio::test]
    async fn test_spawn_reaps_finished() {
        let refreshes = Refreshes::new();
        refreshes.spawn(async {}).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        refreshes.spawn(tokio::time::sleep(Duration::from_millis(200))).await;
        assert_eq!(refreshes.pending().await, 1);
    }
}
