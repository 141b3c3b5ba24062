use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::{DreamCategory, DreamStatus, ReflectionAnswers, Tier, Tone, UserProfile};
use crate::limits::MonthlyLimit;

/// Request to create a new account.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Request to sign in with email and password.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Issued session token plus the profile it belongs to.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

/// Request to create a new dream.
#[derive(Debug, Deserialize)]
pub struct CreateDreamRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default = "default_category")]
    pub category: DreamCategory,
}

fn default_category() -> DreamCategory {
    DreamCategory::Other
}

/// Partial update of a dream. Absent fields are left unchanged.
///
/// `target_date: null` clears the date; an absent `target_date` keeps it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDreamRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub target_date: Option<Option<NaiveDate>>,
    pub category: Option<DreamCategory>,
    pub status: Option<DreamStatus>,
}

/// Wraps any present value, `null` included, in `Some`. Paired with
/// `#[serde(default)]` so an absent field stays `None`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Request to record a reflection on a dream.
#[derive(Debug, Deserialize)]
pub struct CreateReflectionRequest {
    pub dream_id: Uuid,
    #[serde(flatten)]
    pub answers: ReflectionAnswers,
    #[serde(default = "default_tone")]
    pub tone: Tone,
}

fn default_tone() -> Tone {
    Tone::Fusion
}

/// Query parameters for listing reflections.
#[derive(Debug, Default, Deserialize)]
pub struct ListReflectionsQuery {
    pub dream_id: Option<Uuid>,
}

/// Where the caller stands against their monthly reflection limit.
#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    pub tier: Tier,
    pub used: u32,
    pub limit: MonthlyLimit,
    /// `None` when the limit does not apply (unlimited tier or elevated role).
    pub remaining: Option<u32>,
    pub can_reflect: bool,
}

/// Request to move a user to a different tier.
#[derive(Debug, Deserialize)]
pub struct UpdateTierRequest {
    pub tier: Tier,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub users: usize,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_target_date_absent_null_and_set() {
        let absent: UpdateDreamRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.target_date, None);

        let cleared: UpdateDreamRequest = serde_json::from_str(r#"{"target_date":null}"#).unwrap();
        assert_eq!(cleared.target_date, Some(None));

        let set: UpdateDreamRequest =
            serde_json::from_str(r#"{"target_date":"2027-06-01"}"#).unwrap();
        assert_eq!(
            set.target_date,
            Some(NaiveDate::from_ymd_opt(2027, 6, 1))
        );
    }
}
