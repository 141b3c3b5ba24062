use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::limits::TierLimits;
use crate::metrics;

use super::context::{AuthedContext, CallContext};
use super::guards::Guard;

/// A named, ordered guard pipeline.
///
/// Guards run in declaration order; the first failure ends the call and is
/// returned unchanged. Later guards never see a context an earlier guard
/// rejected.
#[derive(Debug, Clone)]
pub struct Procedure {
    name: &'static str,
    guards: Vec<Guard>,
}

impl Procedure {
    fn new(name: &'static str, guards: Vec<Guard>) -> Self {
        Self { name, guards }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    /// Run every guard against `ctx`.
    ///
    /// Every call is counted under this procedure's name as `admitted` or
    /// `rejected`.
    ///
    /// # Errors
    ///
    /// Returns the first guard failure (`Unauthenticated` or `Forbidden`).
    pub fn authorize(&self, ctx: &CallContext) -> AppResult<AuthedContext> {
        let mut admitted = None;

        for guard in &self.guards {
            match guard.check(ctx) {
                Ok(user) => admitted = Some(user),
                Err(err) => {
                    warn!(
                        procedure = self.name,
                        guard = guard.name(),
                        code = err.code(),
                        user_id = ?ctx.user.as_ref().map(|u| u.id),
                        request_id = ?ctx.request_id,
                        "Call rejected by guard"
                    );
                    metrics::record_guard_rejection(guard.name(), err.code());
                    metrics::record_procedure_call(self.name, "rejected");
                    return Err(err);
                }
            }
        }

        let user = admitted.ok_or_else(|| {
            AppError::Internal(format!("procedure '{}' has no guards", self.name))
        })?;

        debug!(procedure = self.name, user_id = %user.id, "Call authorized");
        metrics::record_procedure_call(self.name, "admitted");

        Ok(AuthedContext {
            user: Arc::clone(user),
            request_id: ctx.request_id.clone(),
        })
    }

    /// Authorize `ctx`, then run `handler` with the authorized context.
    ///
    /// The handler's result is returned unmodified; it never runs if a guard
    /// rejects the call.
    pub async fn call<F, Fut, T>(&self, ctx: &CallContext, handler: F) -> AppResult<T>
    where
        F: FnOnce(AuthedContext) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let authed = self.authorize(ctx)?;
        handler(authed).await
    }
}

/// The procedure variants handlers choose from.
///
/// Built once at startup; the tier table is injected here and shared by
/// every guard that enforces it.
///
/// | Procedure | Pipeline |
/// |---|---|
/// | `protected` | `is_authed` |
/// | `creator` | `is_creator_or_admin` |
/// | `premium` | `is_authed` → `is_premium` |
/// | `usage_limited` | `is_authed` → `check_usage_limit` |
/// | `write` | `is_authed` → `not_demo` |
#[derive(Debug, Clone)]
pub struct Procedures {
    pub protected: Procedure,
    pub creator: Procedure,
    pub premium: Procedure,
    pub usage_limited: Procedure,
    pub write: Procedure,
    limits: Arc<TierLimits>,
}

impl Procedures {
    pub fn new(limits: Arc<TierLimits>) -> Self {
        Self {
            protected: Procedure::new("protected", vec![Guard::IsAuthed]),
            creator: Procedure::new("creator", vec![Guard::IsCreatorOrAdmin]),
            premium: Procedure::new("premium", vec![Guard::IsAuthed, Guard::IsPremium]),
            usage_limited: Procedure::new(
                "usage_limited",
                vec![Guard::IsAuthed, Guard::CheckUsageLimit(Arc::clone(&limits))],
            ),
            write: Procedure::new("write", vec![Guard::IsAuthed, Guard::NotDemo]),
            limits,
        }
    }

    /// The tier table the usage guard enforces.
    pub fn limits(&self) -> &Arc<TierLimits> {
        &self.limits
    }
}
