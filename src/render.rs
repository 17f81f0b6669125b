use crate::models::Report;

/// Recent achievements shown in the text view.
pub const RENDERED_ACHIEVEMENTS: usize = 2;

pub const DISCLAIMER: &str =
    "Estimates only: built from public pages and randomized heuristics, not verified account data.";

/// Thousands separators for display, e.g. `12345` -> `12,345`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Formats a report as plain text.
pub fn render_report(report: &Report) -> String {
    let profile = &report.profile;
    let sub = &report.subscription;
    let ach = &report.achievements;
    let play = &report.playtime;

    let headline = if report.qualified {
        "SUBSCRIPTION LIKELY (estimated)"
    } else {
        "NO SUBSCRIPTION DETECTED (estimated)"
    };

    let mut lines = vec![
        "GAMERTAG REPORT".to_string(),
        headline.to_string(),
        String::new(),
        "Profile".to_string(),
        format!("  Gamertag: {}", report.handle),
        format!("  Tier: {}", profile.tier),
        format!("  Location: {}", profile.location),
        format!("  Account age: {}", profile.account_age),
    ];
    if !profile.bio.is_empty() {
        lines.push(format!("  Bio: {}", profile.bio));
    }

    lines.push(String::new());
    lines.push("Subscription (estimated)".to_string());
    lines.push(format!("  Type: {}", sub.subscription_type));
    lines.push(format!("  Subscription: {}", yes_no(sub.has_subscription)));
    lines.push(format!("  Ultimate: {}", yes_no(sub.has_ultimate)));
    lines.push(format!("  Confidence: {}", sub.confidence));
    if let Some(expiry) = &sub.expiry {
        lines.push(format!("  Expires: {}", expiry));
    }

    lines.push(String::new());
    lines.push("Achievements".to_string());
    lines.push(format!("  Total: {}", group_thousands(ach.total_achievements)));
    lines.push(format!("  Gamerscore: {}", group_thousands(profile.score)));
    if !ach.recent_achievements.is_empty() {
        lines.push("  Recent:".to_string());
        for entry in ach.recent_achievements.iter().take(RENDERED_ACHIEVEMENTS) {
            lines.push(format!("  - {} - {}", entry.name, entry.game));
        }
    }

    lines.push(String::new());
    lines.push("Playtime (estimated)".to_string());
    lines.push(format!("  Total hours: {}", group_thousands(play.total_hours)));
    lines.push(format!("  Avg daily: {:.1}h", play.avg_daily));
    lines.push(format!("  Games played: {}", play.estimated_games));
    lines.push(format!("  Last active: {}", play.last_active));

    lines.push(String::new());
    lines.push("Summary".to_string());
    lines.push(format!(
        "  Account appears {}",
        if profile.score > 0 { "active" } else { "new" }
    ));
    lines.push(format!(
        "  Subscription {}",
        if sub.has_subscription {
            "likely"
        } else {
            "not detected"
        }
    ));
    lines.push(format!(
        "  {}",
        if report.qualified {
            "QUALIFIED (estimate)"
        } else {
            "NOT QUALIFIED (estimate)"
        }
    ));

    lines.push(String::new());
    lines.push(DISCLAIMER.to_string());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecentAchievement;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_render_shows_two_recent_achievements() {
        let mut report = Report::empty("Ace");
        report.achievements.recent_achievements = (1..=5)
            .map(|i| RecentAchievement {
                name: format!("Ach{}", i),
                game: format!("Game{}", i),
                date: "Recently".to_string(),
            })
            .collect();

        let text = render_report(&report);
        assert!(text.contains("Ach1 - Game1"));
        assert!(text.contains("Ach2 - Game2"));
        assert!(!text.contains("Ach3"));
    }

    #[test]
    fn test_render_defaulted_report() {
        let text = render_report(&Report::empty("Ace"));
        assert!(text.contains("Gamertag: Ace"));
        assert!(text.contains("Tier: Unknown"));
        assert!(text.contains("Type: Standard"));
        assert!(text.contains("Account appears new"));
        assert!(text.contains("NOT QUALIFIED"));
        assert!(!text.contains("Expires"));
        assert!(text.ends_with(DISCLAIMER));
    }
}
