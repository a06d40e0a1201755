use serde::Deserialize;

const DEFAULT_PROVIDER_BASE_URL: &str = "https://servicio.infoexperto.com.ar";
const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub provider_base_url: String,
    pub provider_api_key: String,
    pub identity_base_url: String,
    /// `None` only when authentication is disabled.
    pub identity_api_key: Option<String>,
    pub auth_disabled: bool,
    /// Lifetime of cached provider reports; 0 turns the cache off.
    pub report_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let auth_disabled = std::env::var("AUTH_DISABLED")
            .map(|value| parse_flag(&value))
            .unwrap_or(Ok(false))?;

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            provider_base_url: base_url_var("INFOEXPERTO_BASE_URL", DEFAULT_PROVIDER_BASE_URL)?,
            provider_api_key: std::env::var("INFOEXPERTO_API_KEY")
                .map_err(|_| anyhow::anyhow!("INFOEXPERTO_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("INFOEXPERTO_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            identity_base_url: base_url_var("IDENTITY_BASE_URL", DEFAULT_IDENTITY_BASE_URL)?,
            identity_api_key: match std::env::var("IDENTITY_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
            {
                Some(key) => Some(key),
                None if auth_disabled => None,
                None => anyhow::bail!(
                    "IDENTITY_API_KEY environment variable required (or set AUTH_DISABLED=true)"
                ),
            },
            auth_disabled,
            report_cache_ttl_secs: std::env::var("REPORT_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("REPORT_CACHE_TTL_SECS must be a non-negative integer")
                })?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Report provider URL: {}", config.provider_base_url);
        tracing::debug!("Identity provider URL: {}", config.identity_base_url);
        tracing::debug!("Report cache TTL: {}s", config.report_cache_ttl_secs);
        tracing::debug!("Server Port: {}", config.port);
        if config.auth_disabled {
            tracing::warn!("AUTH_DISABLED=true: requests will not be authenticated");
        }

        Ok(config)
    }
}

fn base_url_var(name: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(name).unwrap_or_else(|_| default.to_string());
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        other => anyhow::bail!("AUTH_DISABLED must be a boolean, got '{}'", other),
    }
}
