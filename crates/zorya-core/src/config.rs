//! Runtime configuration from environment variables, with a `.env` fallback
//! for local runs. Values already present in the process env win over `.env`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;

use crate::generation::{Backoff, GenerationConfig, RetryProfile, SoftRetryPolicy};
use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Telegram user id allowed to run admin commands.
    pub admin_id: i64,
    /// Chat id of the channel all scheduled posts go to.
    pub channel_chat_id: i64,
    /// Public channel link appended to posts and personal readings.
    pub channel_link: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_temperature: f64,
    pub tarot_history_file: PathBuf,
    pub users_file: PathBuf,
    /// Fixed UTC offset the schedule table is evaluated in.
    pub schedule_offset: FixedOffset,
    /// Log-only deadline for one personal reading end to end.
    pub soft_timeout: Duration,
    pub generation: GenerationConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let generation = GenerationConfig {
            bulk: RetryProfile {
                max_retries: env_u32("BULK_MAX_RETRIES", 5)?,
                base_delay: env_duration_ms("BULK_BASE_DELAY_MS", 5_000)?,
                request_timeout: env_duration_ms("BULK_TIMEOUT_MS", 120_000)?,
                backoff: Backoff::Exponential,
            },
            interactive: RetryProfile {
                max_retries: env_u32("INTERACTIVE_MAX_RETRIES", 2)?,
                base_delay: env_duration_ms("INTERACTIVE_BASE_DELAY_MS", 3_000)?,
                request_timeout: env_duration_ms("INTERACTIVE_TIMEOUT_MS", 80_000)?,
                backoff: Backoff::Linear,
            },
            soft_retry: SoftRetryPolicy::default(),
            min_provider_interval: env_duration_ms("PROVIDER_MIN_INTERVAL_MS", 2_000)?,
        };

        Ok(Self {
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            admin_id: required_i64("ADMIN_ID")?,
            channel_chat_id: required_i64("CHANNEL_CHAT_ID")?,
            channel_link: required("CHANNEL_LINK")?,
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: env_str("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            gemini_temperature: env_f64("GEMINI_TEMPERATURE", 0.9)?,
            tarot_history_file: PathBuf::from(
                env_str("TAROT_HISTORY_FILE").unwrap_or_else(|| "tarot_history.json".to_string()),
            ),
            users_file: PathBuf::from(
                env_str("USERS_FILE").unwrap_or_else(|| "users_store.json".to_string()),
            ),
            schedule_offset: offset_from_minutes(env_i64("SCHEDULE_UTC_OFFSET_MINUTES", 120)?)?,
            soft_timeout: env_duration_ms("GENERATION_SOFT_TIMEOUT_MS", 350_000)?,
            generation,
        })
    }
}

fn offset_from_minutes(minutes: i64) -> Result<FixedOffset> {
    i32::try_from(minutes * 60)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            Error::Config(format!(
                "SCHEDULE_UTC_OFFSET_MINUTES is out of range: {minutes}"
            ))
        })
}

fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim().trim_matches('"').trim_matches('\'')))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return;
    };
    for line in raw.lines() {
        let Some((key, value)) = parse_env_line(line) else {
            continue;
        };
        if std::env::var_os(key).is_none() {
            std::env::set_var(key, value);
        }
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(non_empty)
}

fn required(key: &str) -> Result<String> {
    env_str(key).ok_or_else(|| Error::Config(format!("{key} is not set")))
}

fn required_i64(key: &str) -> Result<i64> {
    required(key)?
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be an integer")))
}

fn env_i64(key: &str, default: i64) -> Result<i64> {
    match env_str(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key} must be an integer"))),
        None => Ok(default),
    }
}

fn env_u32(key: &str, default: u32) -> Result<u32> {
    match env_str(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key} must be a non-negative integer"))),
        None => Ok(default),
    }
}

fn env_f64(key: &str, default: f64) -> Result<f64> {
    match env_str(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key} must be a number"))),
        None => Ok(default),
    }
}

fn env_duration_ms(key: &str, default_ms: u64) -> Result<Duration> {
    let ms = match env_str(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key} must be a millisecond count")))?,
        None => default_ms,
    };
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_lines_parse_like_shell_assignments() {
        assert_eq!(parse_env_line("KEY=value"), Some(("KEY", "value")));
        assert_eq!(parse_env_line("  KEY = \"quoted\"  "), Some(("KEY", "quoted")));
        assert_eq!(parse_env_line("KEY='single'"), Some(("KEY", "single")));
        assert_eq!(parse_env_line("# comment"), None);
        assert_eq!(parse_env_line(""), None);
        assert_eq!(parse_env_line("no-assignment"), None);
    }

    #[test]
    fn offset_accepts_minutes_and_rejects_out_of_range() {
        assert_eq!(offset_from_minutes(120).unwrap().local_minus_utc(), 7_200);
        assert_eq!(offset_from_minutes(0).unwrap().local_minus_utc(), 0);
        assert_eq!(offset_from_minutes(-300).unwrap().local_minus_utc(), -18_000);
        assert!(offset_from_minutes(100_000).is_err());
    }
}
