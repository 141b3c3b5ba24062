use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::{TokenIssuer, hash_password, verify_password};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{AuthResponse, SignInRequest, SignUpRequest, Tier, User};
use crate::store::Store;
use crate::validation::{validate_email, validate_name, validate_password};

/// Keyed by lower-cased email.
type SigninLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Placeholder hash for accounts that cannot sign in with a password.
/// It is not a valid bcrypt hash, so it never verifies.
const NO_PASSWORD: &str = "!";

/// Account creation, sign-in and the shared demo session.
///
/// Sign-in attempts are limited per email with a governor keyed limiter.
/// The limiter is checked before the password is verified, so a locked-out
/// email costs no bcrypt work.
#[derive(Clone)]
pub struct AuthService {
    store: Store,
    tokens: TokenIssuer,
    config: Arc<Config>,
    signin_limiter: Option<Arc<SigninLimiter>>,
}

impl AuthService {
    pub fn new(store: Store, tokens: TokenIssuer, config: Arc<Config>) -> Self {
        let signin_limiter = NonZeroU32::new(config.signin_attempts_per_minute)
            .map(|per_minute| Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))));

        Self {
            store,
            tokens,
            config,
            signin_limiter,
        }
    }

    /// Create a free-tier account and start a session for it.
    ///
    /// # Errors
    ///
    /// - `AppError::BadRequest` if the email, password or name is invalid
    /// - `AppError::Conflict` if the email is already registered
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn signup(&self, req: SignUpRequest) -> AppResult<AuthResponse> {
        let email = req.email.trim().to_lowercase();
        let name = req.name.trim().to_string();

        validate_email(&email)?;
        validate_password(&req.password)?;
        validate_name(&name)?;

        // Skip the bcrypt work for an obvious duplicate; insert_user still
        // enforces uniqueness.
        if self.store.user_by_email(&email).await.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let cost = self.config.bcrypt_cost;
        let password = req.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))??;

        let user = User {
            id: Uuid::new_v4(),
            is_admin: self.config.is_admin_email(&email),
            is_creator: self.config.is_creator_email(&email),
            email,
            name,
            password_hash,
            tier: Tier::Free,
            reflection_count_this_month: 0,
            is_demo: false,
            created_at: Utc::now(),
        };

        let user = self.store.insert_user(user).await?;
        info!(
            user_id = %user.id,
            is_admin = user.is_admin,
            is_creator = user.is_creator,
            "Account created"
        );

        self.session_for(&user)
    }

    /// Verify credentials and start a session.
    ///
    /// Unknown emails, wrong passwords and the demo account all produce the
    /// same `Unauthenticated` error.
    ///
    /// # Errors
    ///
    /// - `AppError::TooManyRequests` if the email has used up its attempts
    /// - `AppError::Unauthenticated` if the email is malformed or the
    ///   credentials do not match
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn signin(&self, req: SignInRequest) -> AppResult<AuthResponse> {
        let email = req.email.trim().to_lowercase();

        // Only well-formed addresses become limiter keys
        if validate_email(&email).is_err() {
            return Err(Self::signin_failed("invalid_email"));
        }

        if let Some(limiter) = &self.signin_limiter
            && limiter.check_key(&email).is_err()
        {
            warn!("Sign-in attempt limit exceeded");
            metrics::record_signin_failure("rate_limited");
            return Err(AppError::TooManyRequests(
                "Too many sign-in attempts. Please try again later.".to_string(),
            ));
        }

        let Some(user) = self.store.user_by_email(&email).await else {
            return Err(Self::signin_failed("unknown_email"));
        };

        if user.is_demo {
            return Err(Self::signin_failed("demo_account"));
        }

        let password = req.password;
        let password_hash = user.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await
                .map_err(|e| AppError::Internal(format!("Password check task failed: {e}")))?;

        if !matches {
            return Err(Self::signin_failed("bad_password"));
        }

        info!(user_id = %user.id, "Signed in");
        self.session_for(&user)
    }

    /// Drop limiter entries whose attempts have fully replenished.
    pub fn prune_signin_limiter(&self) {
        if let Some(limiter) = &self.signin_limiter {
            limiter.retain_recent();
            limiter.shrink_to_fit();
            debug!(tracked_emails = limiter.len(), "Sign-in limiter pruned");
        }
    }

    /// Prune the sign-in limiter every `every` until the runtime shuts down.
    ///
    /// Returns `None` when sign-in limiting is disabled.
    pub fn spawn_limiter_pruning(&self, every: Duration) -> Option<JoinHandle<()>> {
        self.signin_limiter.as_ref()?;

        let service = self.clone();
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                service.prune_signin_limiter();
            }
        }))
    }

    /// Start a session on the shared demo account.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the demo account has not been seeded.
    #[instrument(skip(self))]
    pub async fn demo_session(&self) -> AppResult<AuthResponse> {
        let user = self
            .store
            .user_by_email(&self.config.demo_user_email)
            .await
            .ok_or_else(|| AppError::NotFound("Demo account".to_string()))?;

        self.session_for(&user)
    }

    /// Seed the demo account if it does not exist yet.
    pub async fn ensure_demo_user(&self) -> AppResult<()> {
        if self
            .store
            .user_by_email(&self.config.demo_user_email)
            .await
            .is_some()
        {
            return Ok(());
        }

        let demo = User {
            id: Uuid::new_v4(),
            email: self.config.demo_user_email.clone(),
            name: "Demo Dreamer".to_string(),
            password_hash: NO_PASSWORD.to_string(),
            tier: Tier::Essential,
            reflection_count_this_month: 0,
            is_creator: false,
            is_admin: false,
            is_demo: true,
            created_at: Utc::now(),
        };

        match self.store.insert_user(demo).await {
            Ok(user) => {
                info!(user_id = %user.id, email = %user.email, "Demo account created");
                Ok(())
            }
            // Seeded concurrently
            Err(AppError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn session_for(&self, user: &User) -> AppResult<AuthResponse> {
        let (token, expires_at) = self.tokens.issue(user.id)?;
        Ok(AuthResponse {
            token,
            expires_at,
            user: user.profile(),
        })
    }

    fn signin_failed(reason: &'static str) -> AppError {
        warn!(reason, "Sign-in failed");
        metrics::record_signin_failure(reason);
        AppError::Unauthenticated(INVALID_CREDENTIALS.to_string())
    }
}
