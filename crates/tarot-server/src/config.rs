use tarot_core::Dimensions;
use tarot_core::Temperature;
use tarot_core::CHUNK_OVERLAP_TOKENS;
use tarot_core::CHUNK_TARGET_TOKENS;
use tarot_core::DEFAULT_RAG_TEMPERATURE;
use tarot_core::DEFAULT_TOP_K;
use tarot_core::EMBEDDING_DIMENSIONS;

/// Everything the process needs at boot, read straight from the
/// environment in the teacher's `rbp_database::db()` / `Crypto::from_env()`
/// style (no generic config-loading framework — spec §1 Non-goals; spec §6
/// Config surface for the field list).
pub struct ReadingConfig {
    /// Regular-privilege Postgres connection string.
    pub database_url: String,
    /// Elevated-privilege connection string, used for corpus/index
    /// maintenance. Adapts the original Supabase "service role key vs anon
    /// key" split to a single Postgres instance (see DESIGN.md); falls back
    /// to `database_url` when unset.
    pub database_url_privileged: String,

    pub openai_api_key: String,
    pub openrouter_api_key: String,
    pub use_openrouter: bool,
    pub model_preset: String,

    pub rag_chunk_size: usize,
    pub rag_chunk_overlap: usize,
    pub rag_top_k: usize,
    pub rag_temperature: Temperature,
    pub embedding_dimensions: Dimensions,

    pub cors_origins: Vec<String>,
    pub frontend_url: String,
    pub api_v1_prefix: String,
    pub bind_addr: String,
    pub default_source: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl ReadingConfig {
    /// Loads `.env` (if present) then reads the environment. Unlike the
    /// teacher's `DB_URL`/`BIND_ADDR` reads, required values here still fall
    /// back to development defaults rather than panicking — a misconfigured
    /// deployment should come up degraded, not fail to start (spec §4.2).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let database_url = env_or("DATABASE_URL", "postgres://localhost/tarot");
        let database_url_privileged = std::env::var("DATABASE_URL_PRIVILEGED").unwrap_or_else(|_| database_url.clone());

        Self {
            database_url,
            database_url_privileged,
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            openrouter_api_key: env_or("OPENROUTER_API_KEY", ""),
            use_openrouter: env_parse_or("USE_OPENROUTER", false),
            model_preset: env_or("MODEL_PRESET", "gpt4omini_fast"),

            rag_chunk_size: env_parse_or("RAG_CHUNK_SIZE", CHUNK_TARGET_TOKENS),
            rag_chunk_overlap: env_parse_or("RAG_CHUNK_OVERLAP", CHUNK_OVERLAP_TOKENS),
            rag_top_k: env_parse_or("RAG_TOP_K", DEFAULT_TOP_K),
            rag_temperature: env_parse_or("RAG_TEMPERATURE", DEFAULT_RAG_TEMPERATURE),
            embedding_dimensions: env_parse_or("EMBEDDING_DIMENSIONS", EMBEDDING_DIMENSIONS),

            cors_origins: env_or("CORS_ORIGINS", "http://localhost:3000,http://localhost:3001")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            frontend_url: env_or("FRONTEND_URL", "http://localhost:3000"),
            api_v1_prefix: env_or("API_V1_PREFIX", "/api/v1"),
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
            default_source: env_or("DEFAULT_SOURCE", "pkt"),
        }
    }

    /// The base URL and key `HttpModelClient` talks to, depending on which
    /// provider is active (spec §C supplement, original `USE_OPENROUTER`).
    pub fn provider(&self) -> (&str, &str) {
        if self.use_openrouter {
            ("https://openrouter.ai/api/v1", &self.openrouter_api_key)
        } else {
            ("https://api.openai.com/v1", &self.openai_api_key)
        }
    }

    pub fn embedding_model(&self) -> &'static str {
        if self.use_openrouter {
            "openai/text-embedding-3-small"
        } else {
            "text-embedding-3-small"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_switches_on_use_openrouter() {
        let mut config = ReadingConfig::from_env();
        config.use_openrouter = true;
        config.openrouter_api_key = "or-key".to_string();
        let (base, key) = config.provider();
        assert_eq!(base, "https://openrouter.ai/api/v1");
        assert_eq!(key, "or-key");
    }
}
