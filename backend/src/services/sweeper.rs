use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::storage::ReservationManager;

/// How often the stop flag is checked, independent of the sweep interval.
const STOP_POLL: Duration = Duration::from_secs(1);

/// Periodically reclaims locks abandoned by unfinished negotiations.
pub struct Sweeper {
    reservations: Arc<ReservationManager>,
    interval: Duration,
    stop: Arc<AtomicBool>,
}

impl Sweeper {
    pub fn new(reservations: Arc<ReservationManager>, interval: Duration, stop: Arc<AtomicBool>) -> Self {
        Self {
            reservations,
            // a zero period would spin
            interval: interval.max(Duration::from_millis(1)),
            stop,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        tracing::info!("Sweeper interval: {:?}", self.interval);

        let mut sweep_timer = tokio::time::interval(self.interval);
        sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick fires immediately
        sweep_timer.tick().await;

        let mut stop_poll = tokio::time::interval(STOP_POLL);
        stop_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let due = tokio::select! {
                _ = sweep_timer.tick() => true,
                _ = stop_poll.tick() => false,
            };
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            if !due {
                continue;
            }
            let released = self.reservations.sweep();
            if released > 0 {
                tracing::info!("Swept {} expired lock(s)", released);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweeper_reclaims_expired_locks() {
        let reservations = Arc::new(ReservationManager::new(Duration::from_millis(10)));
        assert!(reservations.try_lock("abandoned", 0));

        let stop = Arc::new(AtomicBool::new(false));
        let handle = Sweeper::new(reservations.clone(), Duration::from_millis(20), stop.clone()).spawn();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(reservations.len(), 0);

        stop.store(true, Ordering::SeqCst);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_long_interval_sweeper_stops_promptly() {
        let reservations = Arc::new(ReservationManager::new(Duration::from_secs(600)));
        let stop = Arc::new(AtomicBool::new(false));
        let handle = Sweeper::new(reservations, Duration::from_secs(3600), stop.clone()).spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.store(true, Ordering::SeqCst);

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper waited for its sweep interval")
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_keeps_live_locks() {
        let reservations = Arc::new(ReservationManager::new(Duration::from_secs(600)));
        assert!(reservations.try_lock("live", 0));

        let stop = Arc::new(AtomicBool::new(false));
        let handle = Sweeper::new(reservations.clone(), Duration::from_millis(10), stop.clone()).spawn();

        tokio::time::sleep(Duration::from_millis(60)).await;
        stop.store(true, Ordering::SeqCst);
        handle.await.unwrap();

        assert!(reservations.is_locked("live", 0));
    }
}
