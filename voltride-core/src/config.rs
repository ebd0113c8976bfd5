use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::otp::{CodeIssuer, FixedCodeIssuer, RandomCodeIssuer};
use crate::session::ACTIVE_DURATION_SECONDS;

/// How unlock codes are produced.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CodePolicy {
    #[default]
    Random,
    /// The constant demo code. Guessable; demonstrations only.
    Fixed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_active_duration")]
    pub active_duration_seconds: u32,
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    #[serde(default)]
    pub code_policy: CodePolicy,
    /// Mismatches allowed before the session is cancelled. `None` never locks out.
    #[serde(default)]
    pub max_code_attempts: Option<u32>,
}

fn default_active_duration() -> u32 { ACTIVE_DURATION_SECONDS }
fn default_tick_period_ms() -> u64 { 1000 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            active_duration_seconds: default_active_duration(),
            tick_period_ms: default_tick_period_ms(),
            code_policy: CodePolicy::default(),
            max_code_attempts: None,
        }
    }
}

impl SessionConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn issuer(&self) -> Arc<dyn CodeIssuer> {
        match self.code_policy {
            CodePolicy::Random => Arc::new(RandomCodeIssuer),
            CodePolicy::Fixed => Arc::new(FixedCodeIssuer::demo()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.active_duration_seconds, 900);
        assert_eq!(config.tick_period(), Duration::from_secs(1));
        assert_eq!(config.code_policy, CodePolicy::Random);
        assert!(config.max_code_attempts.is_none());
    }

    #[test]
    fn test_policy_names() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"code_policy":"fixed","max_code_attempts":3}"#).unwrap();
        assert_eq!(config.code_policy, CodePolicy::Fixed);
        assert_eq!(config.max_code_attempts, Some(3));
        assert_eq!(config.issuer().issue(None), "123456");
    }
}
