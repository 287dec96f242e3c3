//! Configuration module for the adaptive learning orchestration core.

use serde::Deserialize;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// JWT secret used to verify tokens issued by the (external) auth service
    pub jwt_secret: String,
    /// Address to bind the server to
    pub bind_address: String,
    /// Shared admin key for the knobs/observability endpoints. Empty disables them.
    pub admin_api_key: String,

    // --- Scheduler / game orchestrator knobs (§6 "Admin knobs") ---
    pub scheduler_tick_interval_ms: u64,
    pub room_max_players_per_game: u32,
    pub room_bingo_slots_per_game: u32,
    pub room_question_time_limit_seconds: u32,
    pub room_intermission_duration_seconds: u32,

    // --- Content pipeline knobs ---
    pub content_generator_timeout_ms: u64,
    pub content_cache_ttl_seconds: u64,
    pub default_volume_mode: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env_var("DATABASE_URL")?,
            jwt_secret: env_var("JWT_SECRET")?,
            bind_address: env_var_or("BIND_ADDRESS", "0.0.0.0:8080"),
            admin_api_key: env_var_or("ADMIN_API_KEY", ""),

            scheduler_tick_interval_ms: env_var_parsed_or("SCHEDULER_TICK_INTERVAL_MS", 1_000)?,
            room_max_players_per_game: env_var_parsed_or("ROOM_MAX_PLAYERS_PER_GAME", 8)?,
            room_bingo_slots_per_game: env_var_parsed_or("ROOM_BINGO_SLOTS_PER_GAME", 4)?,
            room_question_time_limit_seconds: env_var_parsed_or(
                "ROOM_QUESTION_TIME_LIMIT_SECONDS",
                20,
            )?,
            room_intermission_duration_seconds: env_var_parsed_or(
                "ROOM_INTERMISSION_DURATION_SECONDS",
                30,
            )?,

            content_generator_timeout_ms: env_var_parsed_or("CONTENT_GENERATOR_TIMEOUT_MS", 8_000)?,
            content_cache_ttl_seconds: env_var_parsed_or("CONTENT_CACHE_TTL_SECONDS", 1_800)?,
            default_volume_mode: env_var_or("DEFAULT_VOLUME_MODE", "standard"),
        })
    }
}

fn env_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_var_parsed_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_or_uses_default() {
        let val = env_var_or("NON_EXISTENT_VAR_12345", "default_value");
        assert_eq!(val, "default_value");
    }

    #[test]
    fn test_env_var_parsed_or_uses_default_when_unset() {
        let val: u32 = env_var_parsed_or("NON_EXISTENT_VAR_67890", 42).unwrap();
        assert_eq!(val, 42);
    }

    #[test]
    fn test_env_var_parsed_or_rejects_invalid_value() {
        // SAFETY: test-only, single-threaded test process for this var name.
        unsafe {
            env::set_var("ADAPTIVE_CONFIG_TEST_BAD_INT", "not-a-number");
        }
        let result: Result<u32, ConfigError> =
            env_var_parsed_or("ADAPTIVE_CONFIG_TEST_BAD_INT", 1);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_, _))));
        unsafe {
            env::remove_var("ADAPTIVE_CONFIG_TEST_BAD_INT");
        }
    }
}
