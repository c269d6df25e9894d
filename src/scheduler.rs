use crate::client::CollectorClient;
use crate::config::DAY_SECS;
use crate::error::SimError;
use crate::simulator::Simulator;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyQuota {
    next_day: i64,
}

impl DailyQuota {
    pub fn starting_at(now_secs: i64) -> Self {
        Self {
            next_day: now_secs + DAY_SECS as i64,
        }
    }

    /// True when `now_secs` has reached the boundary. The next boundary is
    /// one day after this tick, not after the old boundary.
    pub fn roll(&mut self, now_secs: i64) -> bool {
        if now_secs < self.next_day {
            return false;
        }
        self.next_day = now_secs + DAY_SECS as i64;
        true
    }

    pub fn next_day(&self) -> i64 {
        self.next_day
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    Sleep(Duration),
    Immediate,
    Overrun(Duration),
}

/// Whole seconds left in the interval are slept; a sub-second remainder is
/// not. An overrun is reported, never made up.
pub fn pace(interval: Duration, elapsed: Duration) -> Pacing {
    match interval.checked_sub(elapsed) {
        Some(left) if left.as_secs() >= 1 => Pacing::Sleep(Duration::from_secs(left.as_secs())),
        Some(_) => Pacing::Immediate,
        None => Pacing::Overrun(elapsed - interval),
    }
}

/// Resolves on the first Ctrl-C. Kept alive for the whole run so the
/// handler stays installed and a signal landing mid-tick is not lost.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Drive ticks until a fatal error or until `shutdown` resolves. `shutdown`
/// is checked before every tick, whether or not the last one overran.
pub async fn run<C, F, S>(
    sim: &mut Simulator,
    client: &C,
    interval: Duration,
    mut clock: F,
    shutdown: S,
) -> Result<(), SimError>
where
    C: CollectorClient,
    F: FnMut() -> DateTime<Utc>,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut quota = DailyQuota::starting_at(clock().timestamp());
    info!("⏰ Ticking every {}s", interval.as_secs());

    let mut wait = Duration::ZERO;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("🛑 Interrupted, stopping");
                return Ok(());
            }
            _ = sleep(wait) => {}
        }

        let started = Instant::now();
        let now = clock();

        if quota.roll(now.timestamp()) {
            sim.reset_daily_budget();
            info!("🌅 Next budget reset at {}", quota.next_day());
        }

        sim.tick(client, now.timestamp_millis()).await?;

        wait = match pace(interval, started.elapsed()) {
            Pacing::Sleep(wait) => wait,
            Pacing::Immediate => Duration::ZERO,
            Pacing::Overrun(by) => {
                sim.metrics_mut().increment_overruns();
                warn!(
                    "⚠️ Tick overran the {}s interval by {:.3}s",
                    interval.as_secs(),
                    by.as_secs_f64()
                );
                Duration::ZERO
            }
        };
    }
}
