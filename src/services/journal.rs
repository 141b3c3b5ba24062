use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::limits::TierLimits;
use crate::metrics;
use crate::models::{
    CreateDreamRequest, CreateReflectionRequest, Dream, DreamStatus, EvolutionReport, Reflection,
    UpdateDreamRequest, UsageResponse, User,
};
use crate::store::Store;
use crate::validation::{
    validate_dream_description, validate_dream_title, validate_reflection_answers,
};

/// Dreams, reflections and the reports built from them.
///
/// Every operation is scoped to the calling user; records owned by someone
/// else are reported as not found.
#[derive(Clone)]
pub struct JournalService {
    store: Store,
    limits: Arc<TierLimits>,
}

impl JournalService {
    pub fn new(store: Store, limits: Arc<TierLimits>) -> Self {
        Self { store, limits }
    }

    // =========================================================================
    // Dreams
    // =========================================================================

    #[instrument(skip(self, req), fields(user_id = %user_id))]
    pub async fn create_dream(&self, user_id: Uuid, req: CreateDreamRequest) -> AppResult<Dream> {
        let title = req.title.trim().to_string();
        validate_dream_title(&title)?;
        let description = normalize_description(req.description)?;

        let now = Utc::now();
        let dream = self
            .store
            .insert_dream(Dream {
                id: Uuid::new_v4(),
                user_id,
                title,
                description,
                target_date: req.target_date,
                category: req.category,
                status: DreamStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await;

        info!(dream_id = %dream.id, "Dream created");
        Ok(dream)
    }

    pub async fn list_dreams(&self, user_id: Uuid) -> Vec<Dream> {
        self.store.dreams_for(user_id).await
    }

    pub async fn get_dream(&self, user_id: Uuid, dream_id: Uuid) -> AppResult<Dream> {
        self.store.dream_for(user_id, dream_id).await
    }

    /// Apply a partial update. Fields are validated before anything changes.
    #[instrument(skip(self, req), fields(user_id = %user_id, dream_id = %dream_id))]
    pub async fn update_dream(
        &self,
        user_id: Uuid,
        dream_id: Uuid,
        req: UpdateDreamRequest,
    ) -> AppResult<Dream> {
        let title = req.title.map(|t| t.trim().to_string());
        if let Some(title) = &title {
            validate_dream_title(title)?;
        }
        let description = match req.description {
            Some(d) => Some(normalize_description(Some(d))?),
            None => None,
        };

        self.store
            .update_dream(user_id, dream_id, |dream| {
                if let Some(title) = title {
                    dream.title = title;
                }
                if let Some(description) = description {
                    dream.description = description;
                }
                if let Some(target_date) = req.target_date {
                    dream.target_date = target_date;
                }
                if let Some(category) = req.category {
                    dream.category = category;
                }
                if let Some(status) = req.status {
                    dream.status = status;
                }
            })
            .await
    }

    #[instrument(skip(self), fields(user_id = %user_id, dream_id = %dream_id))]
    pub async fn delete_dream(&self, user_id: Uuid, dream_id: Uuid) -> AppResult<()> {
        self.store.delete_dream(user_id, dream_id).await?;
        info!("Dream deleted");
        Ok(())
    }

    // =========================================================================
    // Reflections
    // =========================================================================

    /// Record a reflection and count it against the author's monthly limit.
    ///
    /// # Errors
    ///
    /// - `AppError::BadRequest` if an answer is invalid or the dream is archived
    /// - `AppError::NotFound` if the dream is not the caller's
    /// - `AppError::Forbidden` if the monthly limit was reached concurrently
    #[instrument(skip(self, req), fields(user_id = %user_id, dream_id = %req.dream_id))]
    pub async fn create_reflection(
        &self,
        user_id: Uuid,
        req: CreateReflectionRequest,
    ) -> AppResult<Reflection> {
        validate_reflection_answers(&req.answers)?;

        let reflection = Reflection {
            id: Uuid::new_v4(),
            user_id,
            dream_id: req.dream_id,
            answers: req.answers,
            tone: req.tone,
            created_at: Utc::now(),
        };

        let (reflection, author) = self
            .store
            .record_reflection(reflection, &self.limits)
            .await?;

        metrics::record_reflection_created(author.tier.as_str());
        info!(
            reflection_id = %reflection.id,
            used = author.reflection_count_this_month,
            "Reflection recorded"
        );

        Ok(reflection)
    }

    /// The caller's reflections, optionally narrowed to one of their dreams.
    pub async fn list_reflections(
        &self,
        user_id: Uuid,
        dream_id: Option<Uuid>,
    ) -> AppResult<Vec<Reflection>> {
        if let Some(dream_id) = dream_id {
            self.store.dream_for(user_id, dream_id).await?;
        }
        Ok(self.store.reflections_for(user_id, dream_id).await)
    }

    /// Summarize how the caller's reflections on a dream have evolved.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` if the dream is not the caller's
    /// - `AppError::BadRequest` if the dream has no reflections yet
    #[instrument(skip(self), fields(user_id = %user_id, dream_id = %dream_id))]
    pub async fn evolution_report(&self, user_id: Uuid, dream_id: Uuid) -> AppResult<EvolutionReport> {
        let dream = self.store.dream_for(user_id, dream_id).await?;
        let reflections = self.store.reflections_for(user_id, Some(dream_id)).await;

        EvolutionReport::from_reflections(&dream, &reflections).ok_or_else(|| {
            AppError::BadRequest(
                "Reflect on this dream at least once before generating an evolution report"
                    .to_string(),
            )
        })
    }

    // =========================================================================
    // Usage
    // =========================================================================

    /// Where `user` stands against their monthly reflection limit.
    ///
    /// Creators and admins always have room left.
    pub fn usage(&self, user: &User) -> UsageResponse {
        let limit = self.limits.limit_for(user.tier);
        let used = user.reflection_count_this_month;

        if user.has_elevated_role() {
            return UsageResponse {
                tier: user.tier,
                used,
                limit,
                remaining: None,
                can_reflect: true,
            };
        }

        UsageResponse {
            tier: user.tier,
            used,
            limit,
            remaining: limit.remaining(used),
            can_reflect: limit.admits(used),
        }
    }
}

/// Trim a description; blank becomes `None`.
fn normalize_description(description: Option<String>) -> AppResult<Option<String>> {
    let Some(description) = description else {
        return Ok(None);
    };
    let description = description.trim();
    validate_dream_description(description)?;
    Ok((!description.is_empty()).then(|| description.to_string()))
}
