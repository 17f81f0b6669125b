//! Report assembly for a derived gamertag
//!
//! Four independent sub-lookups feed one `Report`:
//! 1. Profile page: score, location, bio, tier, account age
//! 2. Achievements page: total count and recent entries
//! 3. Subscription likelihood from the score (randomized)
//! 4. Playtime estimate from the score (randomized)
//!
//! Each page lookup catches its own failure and returns a defaulted
//! fragment, so a dead upstream degrades the report instead of failing it.
use crate::errors::AppError;
use crate::models::*;
use crate::random::{coin_flip, sample, RandomSource};
use crate::sources::PageSource;
use chrono::{DateTime, Duration, Local};
use regex::Regex;
use std::sync::{Arc, LazyLock};

const BIO_MAX_CHARS: usize = 100;
const ACHIEVEMENT_NAME_MAX_CHARS: usize = 30;
const ACHIEVEMENT_GAME_MAX_CHARS: usize = 20;
const MAX_RECENT_ACHIEVEMENTS: usize = 5;

/// Titles sampled for high-score subscription estimates.
pub const SUBSCRIPTION_CATALOG: [&str; 12] = [
    "Forza Horizon 5",
    "Halo Infinite",
    "Starfield",
    "Minecraft",
    "Sea of Thieves",
    "Grounded",
    "Psychonauts 2",
    "Microsoft Flight Simulator",
    "Age of Empires IV",
    "Gears 5",
    "Doom Eternal",
    "Fallout 76",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
}

static SCORE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)(\d+,?\d*)\s*G",
        r"(?i)Gamerscore:?\s*(\d+,?\d*)",
        r"(?i)(\d+,?\d*)\s*achievement points",
    ])
});

static LOCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)Location:?\s*([^<>\n]+)",
        r"(?i)From:?\s*([^<>\n]+)",
        r"(?i)Country:?\s*([^<>\n]+)",
    ])
});

static BIO_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)Bio:?\s*([^<>\n]+)",
        r"(?i)Tagline:?\s*([^<>\n]+)",
        r"(?i)About:?\s*([^<>\n]+)",
    ])
});

static ACHIEVEMENT_COUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)(\d+,?\d*)\s*achievements",
        r"(?i)achievements:?\s*(\d+,?\d*)",
        r"(?i)Total Achievements:?\s*(\d+,?\d*)",
    ])
});

/// Opening tag carrying the given class token.
fn class_tag(tag: &str, class: &str) -> String {
    format!(
        r#"(?is)<{tag}\b[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?{class}(?:\s[^"']*)?["'][^>]*>"#,
        tag = tag,
        class = regex::escape(class)
    )
}

fn class_element(tag: &str, class: &str) -> Option<Regex> {
    Regex::new(&format!(r"{}(.*?)</{}\s*>", class_tag(tag, class), tag)).ok()
}

static RECENT_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(&class_tag("div", "recent-achievement")).ok());
static ACHIEVEMENT_TITLE: LazyLock<Option<Regex>> =
    LazyLock::new(|| class_element("a", "achievement-title"));
static GAME_TITLE: LazyLock<Option<Regex>> = LazyLock::new(|| class_element("div", "game-title"));
static ACHIEVEMENT_DATE: LazyLock<Option<Regex>> = LazyLock::new(|| class_element("span", "date"));
static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());

/// First capture of the first pattern that matches.
fn first_capture<'a>(patterns: &[Regex], text: &'a str) -> Option<&'a str> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
}

fn parse_count(raw: &str) -> Option<u64> {
    raw.replace(',', "").parse().ok()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Tag-stripped, entity-decoded, trimmed text content of an HTML fragment.
fn inner_text(fragment: &str) -> String {
    let stripped = match TAG.as_ref() {
        Some(re) => re.replace_all(fragment, "").into_owned(),
        None => fragment.to_string(),
    };
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

fn element_text(re: &Option<Regex>, block: &str) -> Option<String> {
    re.as_ref()?
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| inner_text(m.as_str()))
}

// ============ Classification ============

/// Maps a score to its tier.
pub fn tier_for_score(score: u64) -> Tier {
    match score {
        s if s >= 100_000 => Tier::Legendary,
        s if s >= 50_000 => Tier::Veteran,
        s if s >= 20_000 => Tier::Advanced,
        s if s >= 5_000 => Tier::Intermediate,
        s if s > 0 => Tier::Beginner,
        _ => Tier::Unknown,
    }
}

/// Randomized account-age label, bucketed by the tier thresholds.
pub fn account_age_label(score: u64, rng: &dyn RandomSource) -> String {
    let years = match tier_for_score(score) {
        Tier::Legendary => rng.int_in(8, 12),
        Tier::Veteran => rng.int_in(5, 8),
        Tier::Advanced => rng.int_in(3, 5),
        Tier::Intermediate => rng.int_in(1, 3),
        Tier::Beginner => rng.int_in(0, 1),
        Tier::Unknown => 0,
    };

    match years {
        0 => "New account (< 1 year)".to_string(),
        1 => "~1 year".to_string(),
        n => format!("~{} years", n),
    }
}

// ============ Page Parsing ============

/// Builds the profile fragment from the profile page HTML.
pub fn parse_profile(html: &str, rng: &dyn RandomSource) -> ProfileInfo {
    let mut profile = ProfileInfo::default();

    if let Some(score) = first_capture(&SCORE_PATTERNS, html).and_then(parse_count) {
        profile.score = score;
    }
    if let Some(location) = first_capture(&LOCATION_PATTERNS, html) {
        profile.location = location.trim().to_string();
    }
    if let Some(bio) = first_capture(&BIO_PATTERNS, html) {
        profile.bio = truncate_chars(bio.trim(), BIO_MAX_CHARS);
    }

    profile.tier = tier_for_score(profile.score);
    profile.account_age = account_age_label(profile.score, rng);
    profile
}

/// Builds the achievements fragment from the achievements page HTML.
///
/// Only the first five `recent-achievement` blocks are considered, and a
/// block missing its title or game is dropped.
pub fn parse_achievements(html: &str) -> AchievementInfo {
    let mut info = AchievementInfo {
        total_achievements: first_capture(&ACHIEVEMENT_COUNT_PATTERNS, html)
            .and_then(parse_count)
            .unwrap_or(0),
        ..Default::default()
    };

    let Some(block_re) = RECENT_BLOCK.as_ref() else {
        return info;
    };

    let starts: Vec<(usize, usize)> = block_re
        .find_iter(html)
        .map(|m| (m.start(), m.end()))
        .collect();

    for (i, &(_, body_start)) in starts.iter().take(MAX_RECENT_ACHIEVEMENTS).enumerate() {
        let body_end = starts.get(i + 1).map(|&(s, _)| s).unwrap_or(html.len());
        let block = &html[body_start..body_end];

        let (Some(name), Some(game)) = (
            element_text(&ACHIEVEMENT_TITLE, block),
            element_text(&GAME_TITLE, block),
        ) else {
            continue;
        };

        info.recent_achievements.push(RecentAchievement {
            name: truncate_chars(&name, ACHIEVEMENT_NAME_MAX_CHARS),
            game: truncate_chars(&game, ACHIEVEMENT_GAME_MAX_CHARS),
            date: element_text(&ACHIEVEMENT_DATE, block).unwrap_or_else(|| "Recently".to_string()),
        });
    }

    info
}

// ============ Estimates ============

/// Randomized subscription likelihood for `score`.
///
/// Draw order: ultimate flag and catalogue sample (high tier only), the
/// coin flip (medium/low tiers), then the expiry offset.
pub fn subscription_for_score(
    score: u64,
    rng: &dyn RandomSource,
    now: DateTime<Local>,
) -> SubscriptionEstimate {
    let mut estimate = SubscriptionEstimate::default();

    if score > 50_000 {
        estimate.has_subscription = true;
        estimate.has_ultimate = coin_flip(rng);
        estimate.confidence = Confidence::High;
        estimate.subscription_type = if estimate.has_ultimate {
            "Ultimate".to_string()
        } else {
            "Game Pass".to_string()
        };
        estimate.featured_games = sample(rng, &SUBSCRIPTION_CATALOG[..], 3)
            .into_iter()
            .map(String::from)
            .collect();
    } else if score > 20_000 {
        estimate.has_subscription = coin_flip(rng);
        estimate.confidence = Confidence::Medium;
    } else if score > 5_000 {
        // one chance in three
        estimate.has_subscription = rng.int_in(0, 2) == 0;
        estimate.confidence = Confidence::Low;
    }

    if estimate.has_subscription && estimate.subscription_type == "Standard" {
        estimate.subscription_type = "Game Pass".to_string();
    }

    if estimate.has_subscription {
        let days = rng.int_in(1, 30);
        estimate.expiry = Some((now + Duration::days(days)).format("%Y-%m-%d").to_string());
    }

    estimate
}

/// Randomized playtime figures for `score`.
pub fn playtime_for_score(score: u64, rng: &dyn RandomSource) -> PlaytimeEstimate {
    let hours: u64 = if score == 0 {
        rng.int_in(0, 10).max(0) as u64
    } else {
        let base = i64::try_from(score / 30).unwrap_or(i64::MAX);
        let variance = rng.int_in(-10, 20);
        base.saturating_add(variance).max(0) as u64
    };

    let avg_daily = if hours > 365 {
        hours as f64 / 365.0
    } else {
        hours as f64 / 30.0
    };

    PlaytimeEstimate {
        total_hours: hours,
        avg_daily: (avg_daily * 10.0).round() / 10.0,
        estimated_games: (hours / 20).max(1),
        last_active: if hours > 0 { "Today" } else { "Never" }.to_string(),
    }
}

// ============ Assembler ============

/// Builds reports from a page source and a random source.
#[derive(Clone)]
pub struct ReportAssembler {
    source: Arc<dyn PageSource>,
    rng: Arc<dyn RandomSource>,
}

impl ReportAssembler {
    pub fn new(source: Arc<dyn PageSource>, rng: Arc<dyn RandomSource>) -> Self {
        Self { source, rng }
    }

    /// Profile fragment for `handle`, defaulted on any fetch failure.
    pub async fn lookup_profile(&self, handle: &str) -> ProfileInfo {
        match self.source.fetch_profile_page(handle).await {
            Ok(html) => parse_profile(&html, self.rng.as_ref()),
            Err(e) => {
                tracing::warn!("Profile lookup for {} failed, using defaults: {}", handle, e);
                ProfileInfo::default()
            }
        }
    }

    /// Achievements fragment for `handle`, defaulted on any fetch failure.
    pub async fn lookup_achievements(&self, handle: &str) -> AchievementInfo {
        match self.source.fetch_achievements_page(handle).await {
            Ok(html) => parse_achievements(&html),
            Err(e) => {
                tracing::warn!(
                    "Achievement lookup for {} failed, using defaults: {}",
                    handle,
                    e
                );
                AchievementInfo::default()
            }
        }
    }

    /// Subscription estimate for a score already fetched by the caller.
    pub fn estimate_subscription(&self, score: u64) -> SubscriptionEstimate {
        subscription_for_score(score, self.rng.as_ref(), Local::now())
    }

    /// Standalone subscription estimate: re-runs the profile lookup for the score.
    pub async fn estimate_subscription_for(&self, handle: &str) -> SubscriptionEstimate {
        let profile = self.lookup_profile(handle).await;
        self.estimate_subscription(profile.score)
    }

    pub fn estimate_playtime(&self, handle: &str, score: u64) -> PlaytimeEstimate {
        let playtime = playtime_for_score(score, self.rng.as_ref());
        tracing::debug!("Estimated {}h playtime for {}", playtime.total_hours, handle);
        playtime
    }

    /// Runs the sub-lookups in sequence and merges them.
    ///
    /// The profile score is the only value passed between steps.
    pub async fn assemble(&self, handle: &str) -> Result<Report, AppError> {
        if handle.trim().is_empty() {
            return Err(AppError::AssemblyError(
                "cannot assemble a report for an empty handle".to_string(),
            ));
        }

        tracing::info!("Assembling report for {}", handle);

        let profile = self.lookup_profile(handle).await;
        let subscription = self.estimate_subscription(profile.score);
        let achievements = self.lookup_achievements(handle).await;
        let playtime = self.estimate_playtime(handle, profile.score);

        let report = Report {
            handle: handle.to_string(),
            qualified: subscription.has_subscription,
            profile,
            achievements,
            subscription,
            playtime,
        };

        tracing::info!(
            "✓ Report ready for {} (tier: {}, estimated subscription: {})",
            report.handle,
            report.profile.tier,
            report.subscription.has_subscription
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(tier_for_score(0), Tier::Unknown);
        assert_eq!(tier_for_score(1), Tier::Beginner);
        assert_eq!(tier_for_score(4_999), Tier::Beginner);
        assert_eq!(tier_for_score(5_000), Tier::Intermediate);
        assert_eq!(tier_for_score(20_000), Tier::Advanced);
        assert_eq!(tier_for_score(50_000), Tier::Veteran);
        assert_eq!(tier_for_score(100_000), Tier::Legendary);
        assert_eq!(tier_for_score(150_000), Tier::Legendary);
    }

    #[test]
    fn test_account_age_labels() {
        assert_eq!(
            account_age_label(0, &ScriptedRandom::new([5])),
            "New account (< 1 year)"
        );
        assert_eq!(account_age_label(100, &ScriptedRandom::new([1])), "~1 year");
        assert_eq!(account_age_label(100, &ScriptedRandom::new([0])), "New account (< 1 year)");
        assert_eq!(account_age_label(150_000, &ScriptedRandom::new([10])), "~10 years");
        // clamped into [8, 12]
        assert_eq!(account_age_label(150_000, &ScriptedRandom::new([2])), "~8 years");
    }

    #[test]
    fn test_parse_profile_fields() {
        let html = "<div>Gamerscore: 12,345</div>\n<p>Location: Lisbon, Portugal</p>\n<p>Bio: Achievement hunter</p>";
        let profile = parse_profile(html, &ScriptedRandom::new([3]));

        assert_eq!(profile.score, 12_345);
        assert_eq!(profile.tier, Tier::Intermediate);
        assert_eq!(profile.location, "Lisbon, Portugal");
        assert_eq!(profile.bio, "Achievement hunter");
        assert_eq!(profile.account_age, "~3 years");
    }

    #[test]
    fn test_parse_profile_first_pattern_wins() {
        let html = "<span>150000 G</span><span>Gamerscore: 7</span>";
        assert_eq!(parse_profile(html, &ScriptedRandom::lowest()).score, 150_000);
    }

    #[test]
    fn test_parse_profile_truncates_bio() {
        let html = format!("<p>Tagline: {}</p>", "z".repeat(250));
        let profile = parse_profile(&html, &ScriptedRandom::lowest());
        assert_eq!(profile.bio.chars().count(), 100);
    }

    #[test]
    fn test_parse_profile_empty_page_keeps_defaults() {
        let profile = parse_profile("<html><body></body></html>", &ScriptedRandom::lowest());
        assert_eq!(profile.score, 0);
        assert_eq!(profile.tier, Tier::Unknown);
        assert_eq!(profile.location, "Unknown");
        assert_eq!(profile.bio, "");
        assert_eq!(profile.account_age, "New account (< 1 year)");
    }

    #[test]
    fn test_parse_achievements() {
        let html = r#"
            <p>Total: 1,204 achievements</p>
            <div class="recent-achievement">
                <a class="achievement-title" href="/a/1">A Very Long Achievement Name That Keeps Going</a>
                <div class="game-title">Microsoft Flight Simulator</div>
                <span class="date">12 Mar 2026</span>
            </div>
            <div class="recent-achievement">
                <div class="game-title">No Title Here</div>
            </div>
            <div class="recent-achievement">
                <a class="achievement-title">Rock &amp; Roll</a>
                <div class="game-title">Halo</div>
            </div>
        "#;
        let info = parse_achievements(html);

        assert_eq!(info.total_achievements, 1_204);
        assert_eq!(info.completed_games, 0);
        assert_eq!(info.recent_achievements.len(), 2);

        let first = &info.recent_achievements[0];
        assert_eq!(first.name, "A Very Long Achievement Name T");
        assert_eq!(first.game, "Microsoft Flight Sim");
        assert_eq!(first.date, "12 Mar 2026");

        let second = &info.recent_achievements[1];
        assert_eq!(second.name, "Rock & Roll");
        assert_eq!(second.date, "Recently");
    }

    #[test]
    fn test_parse_achievements_caps_at_five_blocks() {
        let block = r#"<div class="recent-achievement"><a class="achievement-title">N</a><div class="game-title">G</div></div>"#;
        let html = block.repeat(8);
        assert_eq!(parse_achievements(&html).recent_achievements.len(), 5);
    }

    #[test]
    fn test_subscription_high_score_is_deterministic() {
        // ultimate flip, three sample draws, expiry offset
        let rng = ScriptedRandom::new([1, 0, 1, 2, 5]);
        let estimate = subscription_for_score(150_000, &rng, fixed_now());

        assert!(estimate.has_subscription);
        assert!(estimate.has_ultimate);
        assert_eq!(estimate.confidence, Confidence::High);
        assert_eq!(estimate.subscription_type, "Ultimate");
        assert_eq!(
            estimate.featured_games,
            vec!["Forza Horizon 5", "Halo Infinite", "Starfield"]
        );
        assert_eq!(estimate.expiry.as_deref(), Some("2026-03-15"));
    }

    #[test]
    fn test_subscription_high_score_any_draws() {
        let rng = crate::random::ThreadRandom::new();
        for _ in 0..50 {
            let estimate = subscription_for_score(60_000, &rng, fixed_now());
            assert!(estimate.has_subscription);
            assert_eq!(estimate.confidence, Confidence::High);
            assert_eq!(estimate.featured_games.len(), 3);
            assert!(estimate.expiry.is_some());
        }
    }

    #[test]
    fn test_subscription_medium_and_low_tiers() {
        let medium = subscription_for_score(30_000, &ScriptedRandom::new([0]), fixed_now());
        assert!(!medium.has_subscription);
        assert_eq!(medium.confidence, Confidence::Medium);
        assert_eq!(medium.subscription_type, "Standard");
        assert!(medium.expiry.is_none());

        let low_hit = subscription_for_score(6_000, &ScriptedRandom::new([0, 30]), fixed_now());
        assert!(low_hit.has_subscription);
        assert_eq!(low_hit.confidence, Confidence::Low);
        assert_eq!(low_hit.subscription_type, "Game Pass");
        assert_eq!(low_hit.expiry.as_deref(), Some("2026-04-09"));

        let low_miss = subscription_for_score(6_000, &ScriptedRandom::new([2]), fixed_now());
        assert!(!low_miss.has_subscription);
    }

    #[test]
    fn test_subscription_none_below_threshold() {
        let estimate = subscription_for_score(5_000, &ScriptedRandom::new([1, 1, 1]), fixed_now());
        assert_eq!(estimate, SubscriptionEstimate::default());
    }

    #[test]
    fn test_playtime_formulas() {
        // 9000 / 30 = 300, + 20 = 320 hours
        let playtime = playtime_for_score(9_000, &ScriptedRandom::new([20]));
        assert_eq!(playtime.total_hours, 320);
        assert_eq!(playtime.avg_daily, 10.7);
        assert_eq!(playtime.estimated_games, 16);
        assert_eq!(playtime.last_active, "Today");

        // 30000 / 30 = 1000, - 10 = 990 hours -> per-year average
        let playtime = playtime_for_score(30_000, &ScriptedRandom::new([-10]));
        assert_eq!(playtime.total_hours, 990);
        assert_eq!(playtime.avg_daily, 2.7);
        assert_eq!(playtime.estimated_games, 49);
    }

    #[test]
    fn test_playtime_floors_at_zero() {
        let playtime = playtime_for_score(30, &ScriptedRandom::new([-10]));
        assert_eq!(playtime.total_hours, 0);
        assert_eq!(playtime.avg_daily, 0.0);
        assert_eq!(playtime.estimated_games, 1);
        assert_eq!(playtime.last_active, "Never");
    }

    #[test]
    fn test_playtime_zero_score_draws_hours() {
        let playtime = playtime_for_score(0, &ScriptedRandom::new([7]));
        assert_eq!(playtime.total_hours, 7);
        assert_eq!(playtime.avg_daily, 0.2);
        assert_eq!(playtime.estimated_games, 1);
    }
}
