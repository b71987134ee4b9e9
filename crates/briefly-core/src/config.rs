use std::env;

/// Application configuration loaded from environment variables (spec §6).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,

    // AI providers
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub voyage_api_key: Option<String>,
    pub ai_scoring_enabled: bool,

    // Reddit OAuth
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,

    // Ingestion
    pub ingestion_interval_minutes: u32,
    pub max_items_per_source: u32,

    // Cost controls
    pub max_embeddings_per_hour: u32,
    pub max_llm_calls_per_user_day: u32,

    // Briefing
    pub briefing_target_words: u32,
    pub briefing_num_items: usize,

    // SMTP (collaborator; consumed by delivery, not implemented here)
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_use_tls: bool,
    pub email_from: String,

    // Auth collaborator (consumed only, core doesn't implement auth)
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,

    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration for the worker/scheduler process.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379/0".into()),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|s| !s.is_empty()),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty()),
            voyage_api_key: env::var("VOYAGE_API_KEY").ok().filter(|s| !s.is_empty()),
            ai_scoring_enabled: env_bool("AI_SCORING_ENABLED", true),
            reddit_client_id: env::var("REDDIT_CLIENT_ID").ok().filter(|s| !s.is_empty()),
            reddit_client_secret: env::var("REDDIT_CLIENT_SECRET").ok().filter(|s| !s.is_empty()),
            reddit_user_agent: env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| "briefly/0.1".into()),
            ingestion_interval_minutes: env_parse("INGESTION_INTERVAL_MINUTES", 30),
            max_items_per_source: env_parse("MAX_ITEMS_PER_SOURCE", 100),
            max_embeddings_per_hour: env_parse("MAX_EMBEDDINGS_PER_HOUR", 1000),
            max_llm_calls_per_user_day: env_parse("MAX_LLM_CALLS_PER_USER_DAY", 50),
            briefing_target_words: env_parse("BRIEFING_TARGET_WORDS", 500),
            briefing_num_items: env_parse("BRIEFING_NUM_ITEMS", 10),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".into()),
            smtp_port: env_parse("SMTP_PORT", 587),
            smtp_user: env::var("SMTP_USER").ok().filter(|s| !s.is_empty()),
            smtp_password: env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
            smtp_use_tls: env_bool("SMTP_USE_TLS", true),
            email_from: env::var("EMAIL_FROM").unwrap_or_else(|_| "briefings@briefly.local".into()),
            access_token_expire_minutes: env_parse("ACCESS_TOKEN_EXPIRE_MINUTES", 60 * 24 * 7),
            refresh_token_expire_days: env_parse("REFRESH_TOKEN_EXPIRE_DAYS", 30),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            web_port: env_parse("WEB_PORT", 3000),
        }
    }

    /// Log presence/length of sensitive vars without leaking their contents.
    pub fn log_redacted(&self) {
        let vars: [(&str, &Option<String>); 4] = [
            ("ANTHROPIC_API_KEY", &self.anthropic_api_key),
            ("OPENAI_API_KEY", &self.openai_api_key),
            ("VOYAGE_API_KEY", &self.voyage_api_key),
            ("REDDIT_CLIENT_SECRET", &self.reddit_client_secret),
        ];
        for (name, value) in vars {
            match value {
                Some(v) => tracing::info!("{name} = ({} chars)", v.len()),
                None => tracing::info!("{name} = (unset)"),
            }
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}
