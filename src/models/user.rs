use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier. Determines the monthly reflection ceiling.
///
/// `optimal` is accepted as an older name for `essential`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    #[serde(alias = "optimal")]
    Essential,
    Premium,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Essential, Tier::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Essential => "essential",
            Tier::Premium => "premium",
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, Tier::Free)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "essential" | "optimal" => Ok(Tier::Essential),
            "premium" => Ok(Tier::Premium),
            other => Err(format!("unknown tier '{other}'")),
        }
    }
}

/// A user record as seen by the authorization layer.
///
/// Resolved once per request and shared behind an `Arc`; nothing in the
/// procedure pipeline mutates it. Counter updates go through the store and
/// are visible from the next request on.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub tier: Tier,
    pub reflection_count_this_month: u32,
    pub is_creator: bool,
    pub is_admin: bool,
    pub is_demo: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creator and admin accounts bypass tier and usage restrictions.
    pub fn has_elevated_role(&self) -> bool {
        self.is_creator || self.is_admin
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

/// Public view of a user. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub tier: Tier,
    pub reflection_count_this_month: u32,
    pub is_creator: bool,
    pub is_admin: bool,
    pub is_demo: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            tier: user.tier,
            reflection_count_this_month: user.reflection_count_this_month,
            is_creator: user.is_creator,
            is_admin: user.is_admin,
            is_demo: user.is_demo,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_accepts_legacy_name() {
        let tier: Tier = serde_json::from_str("\"optimal\"").unwrap();
        assert_eq!(tier, Tier::Essential);
        assert_eq!(serde_json::to_string(&tier).unwrap(), "\"essential\"");
        assert_eq!("Optimal".parse::<Tier>().unwrap(), Tier::Essential);
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn test_only_free_is_unpaid() {
        let paid: Vec<Tier> = Tier::ALL.into_iter().filter(Tier::is_paid).collect();
        assert_eq!(paid, [Tier::Essential, Tier::Premium]);
    }

    #[test]
    fn test_profile_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "dreamer@example.com".to_string(),
            name: "Dreamer".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            tier: Tier::Free,
            reflection_count_this_month: 2,
            is_creator: false,
            is_admin: false,
            is_demo: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(user.profile()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["reflection_count_this_month"], 2);
    }
}
