//! Background maintenance
//!
//! Two periodic jobs run on one task: failed keys are put back into rotation
//! every `ai.key_cooldown_secs`, and every
//! `interview.maintenance_interval_secs` the session sweep drops completed
//! sessions older than `interview.session_ttl_secs` plus open sessions with
//! no activity for `interview.session_idle_ttl_secs`. A zero period disables
//! its job.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::Config;
use crate::interview::{InterviewService, SessionStore};
use crate::keys::ProviderRegistry;

pub struct Maintenance {
    registry: Arc<ProviderRegistry>,
    store: Arc<SessionStore>,
    key_cooldown: Duration,
    session_ttl: Duration,
    idle_ttl: Duration,
    sweep_interval: Duration,
}

impl Maintenance {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<SessionStore>,
        key_cooldown: Duration,
        session_ttl: Duration,
        idle_ttl: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            key_cooldown,
            session_ttl,
            idle_ttl,
            sweep_interval,
        }
    }

    pub fn for_service(service: &InterviewService, config: &Config) -> Self {
        Self::new(
            Arc::clone(service.registry()),
            Arc::clone(service.store()),
            config.ai.key_cooldown(),
            Duration::from_secs(config.interview.session_ttl_secs),
            Duration::from_secs(config.interview.session_idle_ttl_secs),
            Duration::from_secs(config.interview.maintenance_interval_secs),
        )
    }

    /// Put every failed key back into rotation
    pub fn reset_keys(&self) {
        debug!("Resetting failed API keys");
        self.registry.reset_all_failed();
    }

    /// Purge expired completed sessions and abandoned open ones; returns
    /// how many were removed
    pub fn purge_sessions(&self) -> usize {
        self.store.purge_completed(self.session_ttl) + self.store.purge_idle(self.idle_ttl)
    }

    /// Run both jobs until the returned handle is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut key_timer = timer(self.key_cooldown);
            let mut sweep_timer = timer(self.sweep_interval);

            info!(
                "Maintenance started (key reset every {}s, session sweep every {}s)",
                self.key_cooldown.as_secs(),
                self.sweep_interval.as_secs()
            );

            loop {
                tokio::select! {
                    _ = tick(&mut key_timer) => self.reset_keys(),
                    _ = tick(&mut sweep_timer) => {
                        self.purge_sessions();
                    }
                }
            }
        })
    }
}

fn timer(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{ApiKey, Provider};
    use sdk::types::{Difficulty, ExperienceLevel, Language};

    use crate::interview::InterviewSession;

    fn registry() -> Arc<ProviderRegistry> {
        let mut registry = ProviderRegistry::new(Provider::DEFAULT_PRIORITY.to_vec());
        registry
            .add_provider(Provider::OpenAI, vec![ApiKey::new("k1")])
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_key_reset() {
        let registry = registry();
        registry.mark_failed(Provider::OpenAI, &ApiKey::new("k1"));

        let handle = Maintenance::new(
            Arc::clone(&registry),
            Arc::new(SessionStore::new()),
            Duration::from_secs(300),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            Duration::ZERO,
        )
        .spawn();

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert!(registry.available_keys(Provider::OpenAI).is_empty());

        tokio::time::sleep(Duration::from_secs(250)).await;
        assert_eq!(registry.available_keys(Provider::OpenAI).len(), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_purge_sessions_uses_ttl() {
        let store = Arc::new(SessionStore::new());
        let session =
            InterviewSession::new("s", "u", "role", ExperienceLevel::Mid, Language::English, 1);
        store.create(session).unwrap().lock().await.complete();

        let keep = Maintenance::new(
            registry(),
            Arc::clone(&store),
            Duration::ZERO,
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            Duration::ZERO,
        );
        assert_eq!(keep.purge_sessions(), 0);

        let drop_all = Maintenance::new(
            registry(),
            Arc::clone(&store),
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_secs(3600),
            Duration::ZERO,
        );
        assert_eq!(drop_all.purge_sessions(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_abandoned_sessions() {
        let store = Arc::new(SessionStore::new());
        let handle = store
            .create(InterviewSession::new(
                "paused",
                "u",
                "role",
                ExperienceLevel::Mid,
                Language::English,
                3,
            ))
            .unwrap();
        {
            let mut session = handle.lock().await;
            session.begin("Q1".to_string(), Difficulty::Easy).unwrap();
            session.pause().unwrap();
        }
        drop(handle);

        let sweep = Maintenance::new(
            registry(),
            Arc::clone(&store),
            Duration::ZERO,
            Duration::from_secs(86_400),
            Duration::ZERO,
            Duration::ZERO,
        );
        assert_eq!(sweep.purge_sessions(), 1);
        assert!(store.is_empty());

        store
            .create(InterviewSession::new(
                "active",
                "u",
                "role",
                ExperienceLevel::Mid,
                Language::English,
                3,
            ))
            .unwrap();
        let spawned = Maintenance::new(
            registry(),
            Arc::clone(&store),
            Duration::ZERO,
            Duration::from_secs(86_400),
            Duration::ZERO,
            Duration::from_secs(60),
        )
        .spawn();

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.is_empty());
        spawned.abort();
    }
}
