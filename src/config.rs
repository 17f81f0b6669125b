use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub profile_base_url: String,
    pub achievements_base_url: String,
    pub http_timeout_secs: u64,
}

fn base_url_from_env(var: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(var).unwrap_or_else(|_| default.to_string());
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", var);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", var);
    }
    Ok(url.trim_end_matches('/').to_string())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            profile_base_url: base_url_from_env("PROFILE_BASE_URL", "https://xboxgamertag.com")?,
            achievements_base_url: base_url_from_env(
                "ACHIEVEMENTS_BASE_URL",
                "https://www.trueachievements.com",
            )?,
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a positive integer"))
                .and_then(|secs: u64| {
                    if secs == 0 {
                        anyhow::bail!("HTTP_TIMEOUT_SECS must be a positive integer");
                    }
                    Ok(secs)
                })?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Profile Base URL: {}", config.profile_base_url);
        tracing::debug!("Achievements Base URL: {}", config.achievements_base_url);
        tracing::debug!("HTTP timeout: {}s", config.http_timeout_secs);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
