use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Life area a dream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DreamCategory {
    Health,
    Career,
    Relationships,
    Financial,
    PersonalGrowth,
    Creative,
    Spiritual,
    Entrepreneurial,
    Educational,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DreamStatus {
    Active,
    Achieved,
    Archived,
    Released,
}

impl DreamStatus {
    /// Archived dreams are read-only: no new reflections.
    pub fn accepts_reflections(&self) -> bool {
        !matches!(self, DreamStatus::Archived)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dream {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub category: DreamCategory,
    pub status: DreamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Voice the reflection is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Gentle,
    Intense,
    Fusion,
}

/// The four reflection prompts and the user's answers to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionAnswers {
    pub dream: String,
    pub plan: String,
    pub relationship: String,
    pub offering: String,
}

impl ReflectionAnswers {
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("dream", self.dream.as_str()),
            ("plan", self.plan.as_str()),
            ("relationship", self.relationship.as_str()),
            ("offering", self.offering.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dream_id: Uuid,
    pub answers: ReflectionAnswers,
    pub tone: Tone,
    pub created_at: DateTime<Utc>,
}

/// Summary of how a dream's reflections have evolved over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionReport {
    pub dream_id: Uuid,
    pub dream_title: String,
    pub reflection_count: usize,
    pub first_reflection_at: DateTime<Utc>,
    pub latest_reflection_at: DateTime<Utc>,
    pub tone_distribution: BTreeMap<Tone, usize>,
    pub generated_at: DateTime<Utc>,
}

impl EvolutionReport {
    /// Build a report from a dream's reflections.
    ///
    /// Returns `None` when there is nothing to report on.
    pub fn from_reflections(dream: &Dream, reflections: &[Reflection]) -> Option<Self> {
        let first = reflections.iter().map(|r| r.created_at).min()?;
        let latest = reflections.iter().map(|r| r.created_at).max()?;

        let mut tone_distribution = BTreeMap::new();
        for reflection in reflections {
            *tone_distribution.entry(reflection.tone).or_insert(0) += 1;
        }

        Some(Self {
            dream_id: dream.id,
            dream_title: dream.title.clone(),
            reflection_count: reflections.len(),
            first_reflection_at: first,
            latest_reflection_at: latest,
            tone_distribution,
            generated_at: Utc::now(),
        })
    }
}
