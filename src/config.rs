use secrecy::Secret;
use std::str::FromStr;

use crate::domain::{LifecyclePolicy, RejectBackTarget};
use crate::errors::AppError;

/// Process settings, read once from the environment (after `.env`).
#[derive(Debug)]
pub struct Settings {
    pub listen_addr: String,
    pub database_url: Option<String>,
    pub jwt_secret: Secret<String>,
    pub youtube_api_key: Option<Secret<String>>,
    pub youtube_max_pages: usize,
    pub policy: LifecyclePolicy,
    pub roll_max_attempts: u32,
    pub event_buffer: usize,
    pub bootstrap_admin: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("TOKEN")
            .ok_or_else(|| AppError::Validation("TOKEN must be set".to_string()))?;

        Ok(Self {
            listen_addr: get("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:3001".to_string()),
            database_url: get("DATABASE_URL"),
            jwt_secret: Secret::new(jwt_secret),
            youtube_api_key: get("YOUTUBE_API_KEY").map(Secret::new),
            youtube_max_pages: parse_or(get("YOUTUBE_MAX_PAGES"), "YOUTUBE_MAX_PAGES", 4)?,
            policy: LifecyclePolicy {
                reject_back_to: parse_or(
                    get("REJECT_BACK_TARGET"),
                    "REJECT_BACK_TARGET",
                    RejectBackTarget::default(),
                )?,
                require_deadline: parse_or(get("REQUIRE_DEADLINE"), "REQUIRE_DEADLINE", false)?,
            },
            roll_max_attempts: parse_or(get("ROLL_MAX_ATTEMPTS"), "ROLL_MAX_ATTEMPTS", 5)?.max(1),
            event_buffer: parse_or(get("EVENT_BUFFER"), "EVENT_BUFFER", 256)?,
            bootstrap_admin: get("BOOTSTRAP_ADMIN"),
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| {
            AppError::Validation(format!("Invalid value {:?} for {}: {}", value, key, e))
        }),
    }
}
