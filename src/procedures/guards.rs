//! Authorization guards.
//!
//! Each guard is a pure function of the [`CallContext`]: it either returns
//! the resolved user or a classified [`AppError`]. A missing user is always
//! `Unauthenticated`, whichever guard sees it first; every other unmet
//! precondition is `Forbidden` with a guard-specific message.
//!
//! The creator/admin bypass is written out in each guard that honours it
//! rather than applied globally. `not_demo` deliberately has no bypass.

use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::limits::{MonthlyLimit, TierLimits};
use crate::models::User;

use super::context::CallContext;

pub const AUTHENTICATION_REQUIRED: &str = "Authentication required. Please sign in.";
pub const CREATOR_OR_ADMIN_REQUIRED: &str = "Creator or admin access required.";
pub const PREMIUM_REQUIRED: &str = "Premium tier required. Please upgrade your subscription.";
pub const DEMO_READ_ONLY: &str = "Demo accounts cannot modify data. Sign up to save changes.";

/// Message returned when a user has used up their monthly reflections.
pub fn usage_limit_reached(limit: MonthlyLimit) -> String {
    format!(
        "Monthly reflection limit reached ({limit}). Please upgrade or wait until next month."
    )
}

fn require_user(ctx: &CallContext) -> AppResult<&Arc<User>> {
    ctx.user
        .as_ref()
        .ok_or_else(|| AppError::Unauthenticated(AUTHENTICATION_REQUIRED.to_string()))
}

/// Admits any resolved user.
pub fn is_authed(ctx: &CallContext) -> AppResult<&Arc<User>> {
    require_user(ctx)
}

/// Admits creators and admins only.
pub fn is_creator_or_admin(ctx: &CallContext) -> AppResult<&Arc<User>> {
    let user = require_user(ctx)?;
    if user.is_creator || user.is_admin {
        Ok(user)
    } else {
        Err(AppError::Forbidden(CREATOR_OR_ADMIN_REQUIRED.to_string()))
    }
}

/// Admits paid tiers, plus creators and admins on any tier.
pub fn is_premium(ctx: &CallContext) -> AppResult<&Arc<User>> {
    let user = require_user(ctx)?;
    if user.tier.is_paid() || user.is_creator || user.is_admin {
        Ok(user)
    } else {
        Err(AppError::Forbidden(PREMIUM_REQUIRED.to_string()))
    }
}

/// Admits users still under their tier's monthly limit, plus creators and admins.
///
/// Reads the counter only; nothing is reserved. The reflection write path
/// re-checks under the store lock before incrementing.
pub fn check_usage_limit<'a>(
    ctx: &'a CallContext,
    limits: &TierLimits,
) -> AppResult<&'a Arc<User>> {
    let user = require_user(ctx)?;
    if user.is_creator || user.is_admin {
        return Ok(user);
    }

    let limit = limits.limit_for(user.tier);
    if limit.admits(user.reflection_count_this_month) {
        Ok(user)
    } else {
        Err(AppError::Forbidden(usage_limit_reached(limit)))
    }
}

/// Rejects demo accounts, regardless of any other flag they carry.
pub fn not_demo(ctx: &CallContext) -> AppResult<&Arc<User>> {
    let user = require_user(ctx)?;
    if user.is_demo {
        Err(AppError::Forbidden(DEMO_READ_ONLY.to_string()))
    } else {
        Ok(user)
    }
}

/// A guard as a pipeline step.
///
/// `CheckUsageLimit` owns a handle to the tier table it enforces, injected
/// when the procedures are built.
#[derive(Debug, Clone)]
pub enum Guard {
    IsAuthed,
    IsCreatorOrAdmin,
    IsPremium,
    CheckUsageLimit(Arc<TierLimits>),
    NotDemo,
}

impl Guard {
    pub fn name(&self) -> &'static str {
        match self {
            Guard::IsAuthed => "is_authed",
            Guard::IsCreatorOrAdmin => "is_creator_or_admin",
            Guard::IsPremium => "is_premium",
            Guard::CheckUsageLimit(_) => "check_usage_limit",
            Guard::NotDemo => "not_demo",
        }
    }

    pub fn check<'a>(&self, ctx: &'a CallContext) -> AppResult<&'a Arc<User>> {
        match self {
            Guard::IsAuthed => is_authed(ctx),
            Guard::IsCreatorOrAdmin => is_creator_or_admin(ctx),
            Guard::IsPremium => is_premium(ctx),
            Guard::CheckUsageLimit(limits) => check_usage_limit(ctx, limits),
            Guard::NotDemo => not_demo(ctx),
        }
    }
}
