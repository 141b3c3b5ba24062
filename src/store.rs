//! In-memory record store for users, dreams and reflections.
//!
//! # Thread Safety
//!
//! All records live behind a single `tokio::sync::RwLock`. Reads take the
//! shared lock; every write that must be consistent with a check (unique
//! email, dream ownership, the monthly reflection counter) performs the
//! check and the write under one exclusive lock acquisition.
//!
//! # Reflection Counter
//!
//! The `check_usage_limit` guard only reads the counter. Two concurrent
//! calls from the same user can both pass it, so [`Store::record_reflection`]
//! re-checks the limit and increments the counter together with the insert.
//! At most `limit` reflections are ever recorded in a month.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::limits::TierLimits;
use crate::models::{Dream, Reflection, Tier, User};
use crate::procedures::guards::usage_limit_reached;

#[derive(Debug, Default)]
struct Records {
    users: HashMap<Uuid, User>,
    /// Lower-cased email → user id
    emails: HashMap<String, Uuid>,
    dreams: HashMap<Uuid, Dream>,
    reflections: Vec<Reflection>,
}

impl Records {
    fn owned_dream(&self, user_id: Uuid, dream_id: Uuid) -> AppResult<&Dream> {
        self.dreams
            .get(&dream_id)
            .filter(|d| d.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Dream {dream_id}")))
    }
}

/// Shared handle to the record store. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Store {
    records: Arc<RwLock<Records>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if the email (case-insensitive) is taken.
    pub async fn insert_user(&self, user: User) -> AppResult<User> {
        let key = user.email.to_lowercase();
        let mut records = self.records.write().await;

        if records.emails.contains_key(&key) {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        records.emails.insert(key, user.id);
        records.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn user_by_id(&self, id: Uuid) -> Option<User> {
        self.records.read().await.users.get(&id).cloned()
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        let records = self.records.read().await;
        records
            .emails
            .get(&email.to_lowercase())
            .and_then(|id| records.users.get(id))
            .cloned()
    }

    /// All users, oldest first.
    pub async fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.records.read().await.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        users
    }

    pub async fn user_count(&self) -> usize {
        self.records.read().await.users.len()
    }

    pub async fn set_tier(&self, user_id: Uuid, tier: Tier) -> AppResult<User> {
        let mut records = self.records.write().await;
        let user = records
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {user_id}")))?;
        user.tier = tier;
        Ok(user.clone())
    }

    // =========================================================================
    // Dreams
    // =========================================================================

    pub async fn insert_dream(&self, dream: Dream) -> Dream {
        self.records
            .write()
            .await
            .dreams
            .insert(dream.id, dream.clone());
        dream
    }

    /// Dreams owned by `user_id`, newest first.
    pub async fn dreams_for(&self, user_id: Uuid) -> Vec<Dream> {
        let mut dreams: Vec<Dream> = self
            .records
            .read()
            .await
            .dreams
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        dreams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        dreams
    }

    /// A dream owned by `user_id`. Other users' dreams are reported as not found.
    pub async fn dream_for(&self, user_id: Uuid, dream_id: Uuid) -> AppResult<Dream> {
        self.records
            .read()
            .await
            .owned_dream(user_id, dream_id)
            .cloned()
    }

    /// Apply `update` to an owned dream and bump its `updated_at`.
    pub async fn update_dream<F>(&self, user_id: Uuid, dream_id: Uuid, update: F) -> AppResult<Dream>
    where
        F: FnOnce(&mut Dream),
    {
        let mut records = self.records.write().await;
        records.owned_dream(user_id, dream_id)?;

        let dream = records
            .dreams
            .get_mut(&dream_id)
            .ok_or_else(|| AppError::NotFound(format!("Dream {dream_id}")))?;
        update(dream);
        dream.updated_at = Utc::now();
        Ok(dream.clone())
    }

    /// Delete an owned dream together with its reflections.
    ///
    /// The monthly counter is not refunded.
    pub async fn delete_dream(&self, user_id: Uuid, dream_id: Uuid) -> AppResult<()> {
        let mut records = self.records.write().await;
        records.owned_dream(user_id, dream_id)?;

        records.dreams.remove(&dream_id);
        records.reflections.retain(|r| r.dream_id != dream_id);
        Ok(())
    }

    // =========================================================================
    // Reflections
    // =========================================================================

    /// Insert a reflection and count it against the author's monthly limit.
    ///
    /// The limit check, the insert and the counter increment happen under
    /// one write lock. Creators and admins are not limited.
    ///
    /// # Errors
    ///
    /// - `AppError::Unauthenticated` if the author no longer exists
    /// - `AppError::NotFound` if the dream is not the author's
    /// - `AppError::BadRequest` if the dream is archived
    /// - `AppError::Forbidden` if the author has reached their limit
    pub async fn record_reflection(
        &self,
        reflection: Reflection,
        limits: &TierLimits,
    ) -> AppResult<(Reflection, User)> {
        let mut records = self.records.write().await;

        let dream = records.owned_dream(reflection.user_id, reflection.dream_id)?;
        if !dream.status.accepts_reflections() {
            return Err(AppError::BadRequest(
                "Archived dreams cannot receive new reflections".to_string(),
            ));
        }

        let user = records
            .users
            .get_mut(&reflection.user_id)
            .ok_or_else(|| AppError::Unauthenticated("Account no longer exists".to_string()))?;

        if !user.has_elevated_role() {
            let limit = limits.limit_for(user.tier);
            if !limit.admits(user.reflection_count_this_month) {
                return Err(AppError::Forbidden(usage_limit_reached(limit)));
            }
        }

        user.reflection_count_this_month = user.reflection_count_this_month.saturating_add(1);
        let author = user.clone();

        records.reflections.push(reflection.clone());
        Ok((reflection, author))
    }

    /// Reflections by `user_id`, optionally for one dream, newest first.
    pub async fn reflections_for(&self, user_id: Uuid, dream_id: Option<Uuid>) -> Vec<Reflection> {
        let mut reflections: Vec<Reflection> = self
            .records
            .read()
            .await
            .reflections
            .iter()
            .filter(|r| r.user_id == user_id && dream_id.is_none_or(|id| r.dream_id == id))
            .cloned()
            .collect();
        reflections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reflections
    }
}
