//! Shared application state for Axum handlers.
//!
//! Everything here is cheap to clone: the store and the services share
//! their records through `Arc`, and the tier table is built once and handed
//! to both the usage guard and the journal service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::error::AppResult;
use crate::procedures::Procedures;
use crate::services::{AuthService, JournalService};
use crate::store::Store;

/// How often idle sign-in limiter entries are dropped.
const SIGNIN_LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Users, dreams and reflections
    pub store: Store,
    /// The guard pipelines handlers are declared against
    pub procedures: Arc<Procedures>,
    /// Session token signing and verification
    pub tokens: TokenIssuer,
    pub auth: AuthService,
    pub journal: JournalService,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state from configuration with an empty store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the token secret is unusable.
    pub fn new(config: Config) -> AppResult<Self> {
        let config = Arc::new(config);
        let store = Store::new();
        let limits = Arc::new(config.tier_limits.clone());
        let tokens = TokenIssuer::new(&config.jwt_secret, config.jwt_expiry)?;

        Ok(Self {
            procedures: Arc::new(Procedures::new(Arc::clone(&limits))),
            auth: AuthService::new(store.clone(), tokens.clone(), Arc::clone(&config)),
            journal: JournalService::new(store.clone(), limits),
            store,
            tokens,
            started_at: Instant::now(),
            config,
        })
    }

    /// Seed records the application expects to exist (the demo account)
    /// and start sign-in limiter pruning. Call once per state.
    pub async fn initialize_defaults(&self) -> AppResult<()> {
        self.auth.ensure_demo_user().await?;
        info!(
            demo_email = %self.config.demo_user_email,
            "Default records initialized"
        );

        if self
            .auth
            .spawn_limiter_pruning(SIGNIN_LIMITER_PRUNE_INTERVAL)
            .is_some()
        {
            info!(
                interval_secs = SIGNIN_LIMITER_PRUNE_INTERVAL.as_secs(),
                "Sign-in limiter pruning started"
            );
        }
        Ok(())
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_usage_guard_and_journal_share_tier_table() {
        let state = AppState::new(Config::default()).unwrap();
        assert_eq!(**state.procedures.limits(), state.config.tier_limits);
    }

    #[tokio::test]
    async fn test_initialize_defaults_seeds_demo_user() {
        let state = AppState::new(Config::default()).unwrap();
        state.initialize_defaults().await.unwrap();

        let demo = state
            .store
            .user_by_email(&state.config.demo_user_email)
            .await
            .unwrap();
        assert!(demo.is_demo);
        assert_eq!(state.store.user_count().await, 1);
    }
}
