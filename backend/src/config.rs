use std::str::FromStr;
use std::time::Duration;

use shared::validation::{MAX_DEVICE_ID_LENGTH, MAX_VIDEO_URL_LENGTH};
use tracing::warn;

pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Settings handed to [`crate::processor::VotingService`] at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct VotingConfig {
    /// Upper bound on every single store call.
    pub store_timeout: Duration,
    pub max_device_id_length: usize,
    pub max_video_url_length: usize,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            max_device_id_length: MAX_DEVICE_ID_LENGTH,
            max_video_url_length: MAX_VIDEO_URL_LENGTH,
        }
    }
}

impl VotingConfig {
    pub fn from_secrets(secrets: &shuttle_runtime::SecretStore) -> Self {
        Self::from_lookup(|key| secrets.get(key))
    }

    /// Builds a config from a key lookup, keeping defaults for missing or
    /// unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let store_timeout = parse_positive::<u64>(&lookup, "STORE_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.store_timeout);
        let max_device_id_length = parse_positive::<usize>(&lookup, "MAX_DEVICE_ID_LENGTH")
            .unwrap_or(defaults.max_device_id_length);
        let max_video_url_length = parse_positive::<usize>(&lookup, "MAX_VIDEO_URL_LENGTH")
            .unwrap_or(defaults.max_video_url_length);

        Self {
            store_timeout,
            max_device_id_length,
            max_video_url_length,
        }
    }
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        _ => {
            warn!("Ignoring invalid {} value {:?}, using default", key, raw);
            None
        }
    }
}
