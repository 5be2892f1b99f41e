// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Periodic refresh of server data

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::{KeyveveError, Result};

/// Run `task` now and then every `period` until `shutdown` turns true.
///
/// Ticks run one after another on a single task. A slow tick delays the next
/// one instead of overlapping it. A failed tick is logged and polling goes on.
/// Shutdown is checked between ticks, so an in-flight request is allowed to
/// finish. A zero `period` is rejected.
pub fn spawn_poller<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut task: F,
) -> Result<JoinHandle<()>>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send,
{
    if period.is_zero() {
        return Err(KeyveveError::InvalidValue(format!("poll period for {} must be positive", name)));
    }

    Ok(tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    debug!("Polling {}", name);
                    if let Err(e) = task().await {
                        warn!("Polling {} failed: {}", name, e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // sender gone, nobody can stop us any more
                        break;
                    }
                }
            }
        }

        debug!("Poller {} stopped", name);
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_polls_immediately_then_on_interval() {
        let (tx, rx) = watch::channel(false);
        let count = Arc::new(AtomicUsize::new(0));

        let handle = {
            let count = count.clone();
            spawn_poller("test", Duration::from_secs(30), rx, move || {
                let count = count.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }).unwrap()
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        tx.send(true).unwrap();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_polling() {
        let (tx, rx) = watch::channel(false);
        let count = Arc::new(AtomicUsize::new(0));

        let handle = {
            let count = count.clone();
            spawn_poller("failing", Duration::from_secs(10), rx, move || {
                let count = count.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err(KeyveveError::ApiStatus { status: 503, url: "/projects/1".to_string() })
                }
            }).unwrap()
        };

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        let handle = spawn_poller("orphan", Duration::from_secs(5), rx, || async { Ok(()) }).unwrap();
        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_period_is_rejected() {
        let (_tx, rx) = watch::channel(false);
        let result = spawn_poller("zero", Duration::ZERO, rx, || async { Ok(()) });
        assert!(matches!(result, Err(KeyveveError::InvalidValue(_))));
    }
}
