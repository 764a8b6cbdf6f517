use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running reconciliation loop's cancellation handle. Stopping a worker
/// is synchronous from the caller's perspective: `cancel()` signals the
/// loop, and the returned `JoinHandle` resolves once the current cycle has
/// finished — there is no mid-row interruption.
pub struct WorkerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the loop to observe cancellation and exit.
    pub async fn join(self) {
        let _ = self.join.await;
    }
}

/// Runs `cycle` on a fixed-period ticker until `cancel` fires. A tick that
/// arrives while the previous cycle is still catching up is coalesced
/// (`MissedTickBehavior::Delay`) rather than allowed to pile up.
pub fn spawn_interval_worker<F, Fut>(name: &'static str, period: Duration, mut cycle: F) -> WorkerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let cancel = CancellationToken::new();
    let cancel_for_loop = cancel.clone();
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(worker = name, period_secs = period.as_secs(), "worker starting");
        loop {
            tokio::select! {
                _ = cancel_for_loop.cancelled() => {
                    tracing::info!(worker = name, "worker stopped");
                    return;
                }
                _ = ticker.tick() => {
                    cycle().await;
                }
            }
        }
    });
    WorkerHandle { cancel, join }
}
