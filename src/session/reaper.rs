use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

use super::repository::SessionRepository;

/// Configuration for the session reaper
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// UTC hour of day (0-23) at which the daily run fires
    pub run_at_hour_utc: u32,
}

impl ReaperConfig {
    pub fn from_env() -> Self {
        let run_at_hour_utc = std::env::var("SESSION_REAPER_HOUR_UTC")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|h| *h < 24)
            .unwrap_or(4);

        Self { run_at_hour_utc }
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self { run_at_hour_utc: 4 }
    }
}

/// Starts the background task that deletes expired sessions once daily
/// at the configured UTC hour
#[instrument(skip(session_repository))]
pub async fn start_session_reaper(
    session_repository: Arc<dyn SessionRepository + Send + Sync>,
    config: ReaperConfig,
) {
    info!(
        run_at_hour_utc = config.run_at_hour_utc,
        "Starting session reaper background task"
    );

    loop {
        let wait = duration_until_next_run(Utc::now(), config.run_at_hour_utc);
        tokio::time::sleep(wait).await;

        reap_once(&session_repository).await;
    }
}

/// Runs a single reap pass. Deleting zero rows is a normal outcome;
/// running twice in succession deletes nothing new.
async fn reap_once(session_repository: &Arc<dyn SessionRepository + Send + Sync>) {
    match session_repository.cleanup_expired_sessions().await {
        Ok(removed_count) => {
            info!(removed_sessions = removed_count, "Session reap completed");
        }
        Err(e) => {
            error!(error = %e, "Session reap failed");
        }
    }
}

/// Time until the next occurrence of `hour:00:00` UTC, strictly in the future
fn duration_until_next_run(now: DateTime<Utc>, hour: u32) -> Duration {
    let today_run = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .expect("hour is validated to be < 24")
        .and_utc();

    let next_run = if today_run > now {
        today_run
    } else {
        today_run + chrono::Duration::days(1)
    };

    (next_run - now).to_std().unwrap_or(Duration::ZERO)
}
