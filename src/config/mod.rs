/// Configuration for validate-kubectl
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::k8s::KubectlClient;
use crate::utils::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

/// Plain-text file holding the current stable Kubernetes release
pub const STABLE_VERSION_URL: &str =
    "https://storage.googleapis.com/kubernetes-release/release/stable.txt";

/// Effective validator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// kubectl executable to query (name on PATH or absolute path)
    pub kubectl: String,

    /// URL of the stable release pointer file
    pub stable_url: String,

    /// Retry settings for fetching the stable pointer
    pub retry: RetryConfig,

    /// HTTP request timeout in seconds
    pub http_timeout_secs: u64,
}

/// Retry settings as they appear in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of GET attempts
    pub max_attempts: u32,

    /// Delay before the second attempt, doubled after each failure
    pub base_delay_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            kubectl: KubectlClient::default_binary(),
            stable_url: STABLE_VERSION_URL.to_string(),
            retry: RetryConfig::default(),
            http_timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_secs: 2,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.base_delay_secs))
    }
}

impl ValidatorConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ValidatorConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.kubectl.trim().is_empty() {
            anyhow::bail!("kubectl cannot be empty");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        if self.http_timeout_secs == 0 {
            anyhow::bail!("http_timeout_secs must be at least 1");
        }

        self.validate_url(&self.stable_url)?;

        Ok(())
    }

    fn validate_url(&self, raw: &str) -> anyhow::Result<()> {
        let url = url::Url::parse(raw)
            .map_err(|e| anyhow::anyhow!("Invalid stable_url {}: {}", raw, e))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => anyhow::bail!("Unsupported stable_url scheme: {}", scheme),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
