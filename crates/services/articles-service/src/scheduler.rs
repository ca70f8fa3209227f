//! Popular articles background job.
//!
//! Rebuilds the popular-articles cache on a fixed period. The first run
//! happens right after start-up.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::services::ArticleService;
use common::{AppError, AppResult, PopularArticlesConfig};

pub struct PopularArticlesJob {
    service: Arc<dyn ArticleService>,
    config: PopularArticlesConfig,
}

impl PopularArticlesJob {
    pub fn new(service: Arc<dyn ArticleService>, config: PopularArticlesConfig) -> Self {
        Self { service, config }
    }

    /// Run the job on the current runtime until the handle is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let period = Duration::from_secs(self.config.refresh_interval_sec.max(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            period_sec = period.as_secs(),
            window_sec = self.config.window_sec,
            count = self.config.count,
            "Popular articles job started"
        );

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                tracing::error!(error = %e, "Popular articles refresh failed");
            }
        }
    }

    /// Refresh the cache from articles created within the configured window.
    pub async fn run_once(&self) -> AppResult<usize> {
        let date_from = i64::try_from(self.config.window_sec)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| {
                AppError::internal(format!(
                    "popular articles window of {}s is out of range",
                    self.config.window_sec
                ))
            })?;

        self.service
            .update_popular_articles(date_from, self.config.count)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockArticleService;

    fn config() -> PopularArticlesConfig {
        PopularArticlesConfig {
            refresh_interval_sec: 3600,
            window_sec: 86_400,
            count: 7,
        }
    }

    #[tokio::test]
    async fn test_run_once_uses_configured_window() {
        let mut service = MockArticleService::new();
        service
            .expect_update_popular_articles()
            .withf(|date_from, count| {
                let age = Utc::now() - *date_from;
                *count == 7
                    && age >= chrono::Duration::seconds(86_400)
                    && age < chrono::Duration::seconds(86_460)
            })
            .times(1)
            .returning(|_, _| Ok(3));

        let job = PopularArticlesJob::new(Arc::new(service), config());

        assert_eq!(job.run_once().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_out_of_range_window_fails_without_refreshing() {
        for window_sec in [u64::MAX, 9_300_000_000_000_000, 9_000_000_000_000] {
            let mut service = MockArticleService::new();
            service.expect_update_popular_articles().never();

            let job = PopularArticlesJob::new(
                Arc::new(service),
                PopularArticlesConfig {
                    window_sec,
                    ..config()
                },
            );

            let err = job.run_once().await.unwrap_err();
            assert!(matches!(err, AppError::Internal(msg) if msg.contains("out of range")));
        }
    }

    #[tokio::test]
    async fn test_failed_run_keeps_the_loop_alive() {
        let mut service = MockArticleService::new();
        service
            .expect_update_popular_articles()
            .times(1)
            .returning(|_, _| Err(AppError::internal("redis down")));

        let handle = PopularArticlesJob::new(Arc::new(service), config()).spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!handle.is_finished());
        handle.abort();
    }
}
