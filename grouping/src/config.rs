use serde::{Deserialize, Serialize};

/// Grouping settings: retry policy, local fallback, optional remote model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    pub retry: RetryConfig,
    pub local: LocalConfig,

    /// Remote classifier. Absent means local grouping only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

/// Backoff for remote grouping attempts.
///
/// The wait before retry `n` (zero-based) is
/// `min(base_delay_secs * 2^n, max_delay_secs)` plus up to `jitter` of
/// that again, drawn uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total primary attempts before falling back. At least 1.
    pub max_attempts: u32,
    pub base_delay_secs: f64,
    pub max_delay_secs: f64,
    /// Fraction of the delay added as random jitter, in `[0, 1]`.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 7,
            base_delay_secs: 15.0,
            max_delay_secs: 480.0,
            jitter: 0.25,
        }
    }
}

impl RetryConfig {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_secs: 0.0,
            max_delay_secs: 0.0,
            jitter: 0.0,
        }
    }
}

/// DBSCAN parameters for the local fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Maximum cosine distance between neighbours. Larger values give
    /// fewer, broader clusters.
    pub eps: f64,

    /// Neighbours (self included) needed for a core point. Larger values
    /// turn more items into noise before reassignment.
    pub min_points: usize,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            eps: 0.3,
            min_points: 2,
        }
    }
}

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// OpenAI-compatible chat endpoint used as the primary grouper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub model: String,

    /// Environment variable holding the API key. The key itself never
    /// appears in configuration files.
    pub api_key_env: String,

    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 120,
        }
    }
}

impl RemoteConfig {
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = GroupingConfig::default();
        assert_eq!(cfg.retry.max_attempts, 7);
        assert_eq!(cfg.retry.base_delay_secs, 15.0);
        assert_eq!(cfg.retry.max_delay_secs, 480.0);
        assert_eq!(cfg.retry.jitter, 0.25);
        assert_eq!(cfg.local.eps, 0.3);
        assert_eq!(cfg.local.min_points, 2);
        assert!(cfg.remote.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg: GroupingConfig = serde_yaml::from_str(
            "retry:\n  max_attempts: 3\nremote:\n  model: local-llm\n",
        )
        .unwrap();
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry.base_delay_secs, 15.0);
        let remote = cfg.remote.unwrap();
        assert_eq!(remote.model, "local-llm");
        assert_eq!(remote.base_url, DEFAULT_BASE_URL);
        assert_eq!(remote.api_key_env, DEFAULT_API_KEY_ENV);
    }

    #[test]
    fn test_missing_key_env() {
        let cfg = RemoteConfig {
            api_key_env: "ATLAS_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..RemoteConfig::default()
        };
        assert!(cfg.api_key().is_none());
    }
}
