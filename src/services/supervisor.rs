use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const DEFAULT_RESTART_BACKOFF: Duration = Duration::from_secs(5);

/// Runs background services and restarts them when they fail.
///
/// A service is a factory producing a future from a cancellation token. If the
/// future errors, panics or returns before shutdown, it is started again after
/// the restart backoff. `shutdown` cancels every service and waits for them.
pub struct Supervisor {
    token: CancellationToken,
    restart_backoff: Duration,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_backoff(DEFAULT_RESTART_BACKOFF)
    }

    pub fn with_backoff(restart_backoff: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            restart_backoff,
            tasks: Vec::new(),
        }
    }

    /// Token cancelled on shutdown, for work running outside the supervisor
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn spawn<F, Fut>(&mut self, name: &'static str, factory: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let token = self.token.clone();
        let backoff = self.restart_backoff;

        let handle = tokio::spawn(async move {
            let mut attempt: u32 = 0;

            loop {
                attempt += 1;
                info!(service = name, attempt, "Starting service");

                // Nested task so a panic surfaces as a JoinError instead of killing the loop
                match tokio::spawn(factory(token.child_token())).await {
                    Ok(Ok(())) if token.is_cancelled() => break,
                    Ok(Ok(())) => warn!(service = name, "Service exited unexpectedly"),
                    Ok(Err(e)) => error!(service = name, error = %format!("{e:#}"), "Service failed"),
                    Err(e) => error!(service = name, error = %e, "Service panicked"),
                }

                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
            }

            info!(service = name, "Service stopped");
        });

        self.tasks.push((name, handle));
    }

    pub async fn shutdown(self) {
        self.token.cancel();

        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                warn!(service = name, error = %e, "Supervisor task ended abnormally");
            }
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_failing_service_is_restarted() {
        let mut supervisor = Supervisor::with_backoff(Duration::from_millis(1));
        let starts = Arc::new(AtomicUsize::new(0));

        let counter = starts.clone();
        supervisor.spawn("flaky", move |token| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    anyhow::bail!("boom");
                }
                token.cancelled().await;
                Ok(())
            }
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            while starts.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        supervisor.shutdown().await;
        assert_eq!(starts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_panicking_service_is_restarted() {
        let mut supervisor = Supervisor::with_backoff(Duration::from_millis(1));
        let starts = Arc::new(AtomicUsize::new(0));

        let counter = starts.clone();
        supervisor.spawn("panicky", move |token| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("first run explodes");
                }
                token.cancelled().await;
                Ok(())
            }
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            while starts.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_long_running_services() {
        let mut supervisor = Supervisor::new();
        let token = supervisor.token();

        supervisor.spawn("idle", |token| async move {
            token.cancelled().await;
            Ok(())
        });

        tokio::time::timeout(Duration::from_secs(5), supervisor.shutdown())
            .await
            .unwrap();
        assert!(token.is_cancelled());
    }
}
