//! Auth timing and validation settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Simulated round-trip for sign-in
    #[serde(with = "duration_ms")]
    pub sign_in_delay: Duration,
    /// Simulated round-trip for sign-up
    #[serde(with = "duration_ms")]
    pub sign_up_delay: Duration,
    /// How long a guarded view waits for a signed-in notification
    #[serde(with = "duration_ms")]
    pub restore_timeout: Duration,
    /// Maximum age of a session record that may be restored silently
    #[serde(with = "duration_ms")]
    pub freshness_window: Duration,
    pub min_password_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            sign_in_delay: Duration::from_millis(1000),
            sign_up_delay: Duration::from_millis(1500),
            restore_timeout: Duration::from_millis(3000),
            freshness_window: Duration::from_secs(24 * 60 * 60),
            min_password_len: 6,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
