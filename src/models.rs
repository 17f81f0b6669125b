use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Classification ============

/// Score tier, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Tier {
    #[default]
    Unknown,
    Beginner,
    Intermediate,
    Advanced,
    Veteran,
    Legendary,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Unknown => "Unknown",
            Tier::Beginner => "Beginner",
            Tier::Intermediate => "Intermediate",
            Tier::Advanced => "Advanced",
            Tier::Veteran => "Veteran",
            Tier::Legendary => "Legendary",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Confidence attached to the subscription estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        })
    }
}

// ============ Report Fragments ============

/// Fields extracted from the public profile page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub score: u64,
    pub tier: Tier,
    pub location: String,
    /// At most 100 characters.
    pub bio: String,
    pub account_age: String,
}

impl Default for ProfileInfo {
    fn default() -> Self {
        Self {
            score: 0,
            tier: Tier::Unknown,
            location: "Unknown".to_string(),
            bio: String::new(),
            account_age: "Unknown".to_string(),
        }
    }
}

/// One entry of the recent-achievements list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentAchievement {
    /// At most 30 characters.
    pub name: String,
    /// At most 20 characters.
    pub game: String,
    pub date: String,
}

/// Fields extracted from the achievements page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AchievementInfo {
    pub total_achievements: u64,
    /// No public source exposes this, so it stays 0.
    pub completed_games: u64,
    /// At most 5 entries.
    pub recent_achievements: Vec<RecentAchievement>,
}

/// Randomized subscription-likelihood estimate.
///
/// Nothing in here comes from a real entitlement signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionEstimate {
    pub has_subscription: bool,
    pub has_ultimate: bool,
    pub confidence: Confidence,
    pub subscription_type: String,
    pub featured_games: Vec<String>,
    /// `YYYY-MM-DD`, only when a subscription is indicated.
    pub expiry: Option<String>,
}

impl Default for SubscriptionEstimate {
    fn default() -> Self {
        Self {
            has_subscription: false,
            has_ultimate: false,
            confidence: Confidence::Low,
            subscription_type: "Standard".to_string(),
            featured_games: Vec::new(),
            expiry: None,
        }
    }
}

/// Playtime figures derived from the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaytimeEstimate {
    pub total_hours: u64,
    /// Rounded to one decimal place.
    pub avg_daily: f64,
    pub estimated_games: u64,
    pub last_active: String,
}

impl Default for PlaytimeEstimate {
    fn default() -> Self {
        Self {
            total_hours: 0,
            avg_daily: 0.0,
            estimated_games: 0,
            last_active: "Never".to_string(),
        }
    }
}

// ============ Report ============

/// The synthesized account report for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub handle: String,
    pub profile: ProfileInfo,
    pub achievements: AchievementInfo,
    pub subscription: SubscriptionEstimate,
    pub playtime: PlaytimeEstimate,
    /// Mirrors `subscription.has_subscription` and nothing else.
    pub qualified: bool,
}

impl Report {
    /// Fully defaulted report for `handle`.
    pub fn empty(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            profile: ProfileInfo::default(),
            achievements: AchievementInfo::default(),
            subscription: SubscriptionEstimate::default(),
            playtime: PlaytimeEstimate::default(),
            qualified: false,
        }
    }
}

// ============ HTTP DTOs ============

/// Body of `POST /api/v1/report`.
///
/// Only the identifier is accepted. Any other field (e.g. a password) is
/// rejected during deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportRequest {
    pub identifier: String,
}

/// Response of `POST /api/v1/report`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub report: Report,
    pub text: String,
}
