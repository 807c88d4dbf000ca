// src/config.rs
use std::{net::SocketAddr, time::Duration};

use thiserror::Error;

use crate::services::{
    generation::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiConfig},
    session_router::SessionIdPolicy,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    MissingVar(&'static str),
    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub bind_addr: SocketAddr,
    pub session_id_policy: SessionIdPolicy,
    pub session_ttl: Option<Duration>,
    pub max_sessions: Option<usize>,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenv_outcome(dotenvy::dotenv()) {
            tracing::warn!(error = %err, "ignoring unreadable .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("GEMINI_API_KEY").ok_or(ConfigError::MissingVar("GEMINI_API_KEY"))?;

        let mut gemini = GeminiConfig::new(api_key);
        gemini.model = get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        gemini.base_url = get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        match parse::<u64>(get("GEMINI_TIMEOUT_SECS"), "GEMINI_TIMEOUT_SECS")? {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    key: "GEMINI_TIMEOUT_SECS",
                    reason: "timeout must be at least 1 second".to_string(),
                });
            }
            Some(secs) => gemini.timeout = Duration::from_secs(secs),
            None => {}
        }

        let bind_addr = parse::<SocketAddr>(get("BIND_ADDR"), "BIND_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let session_id_policy = match get("SESSION_ID_POLICY") {
            Some(raw) => raw
                .parse::<SessionIdPolicy>()
                .map_err(|reason| ConfigError::Invalid { key: "SESSION_ID_POLICY", reason })?,
            None => SessionIdPolicy::default(),
        };

        let session_ttl = parse::<u64>(get("SESSION_TTL_SECS"), "SESSION_TTL_SECS")?
            .filter(|&s| s > 0)
            .map(Duration::from_secs);
        let max_sessions = parse::<usize>(get("MAX_SESSIONS"), "MAX_SESSIONS")?.filter(|&n| n > 0);

        Ok(Self { gemini, bind_addr, session_id_policy, session_ttl, max_sessions })
    }
}

/// A missing `.env` is fine; any other load failure is passed back.
fn dotenv_outcome<T>(result: Result<T, dotenvy::Error>) -> Result<(), dotenvy::Error> {
    match result {
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err),
        Ok(_) => Ok(()),
    }
}

fn parse<T>(raw: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|v| {
        v.parse::<T>()
            .map_err(|e| ConfigError::Invalid { key, reason: e.to_string() })
    })
    .transpose()
}
