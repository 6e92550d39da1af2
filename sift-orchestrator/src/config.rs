//! Orchestrator configuration
//!
//! Defines all configurable parameters for the orchestrator: where it
//! listens, where its collaborators live, and how the task dispatcher and
//! collect retries are paced.

use std::time::Duration;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "prod" | "production" => Ok(Environment::Production),
            other => anyhow::bail!("unknown environment: {}", other),
        }
    }
}

/// How a collect request is retried while its build is still running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectRetryPolicy {
    /// Minimum delay before the next attempt
    pub delay: Duration,

    /// Total attempts, including the first one
    pub max_attempts: u32,
}

impl CollectRetryPolicy {
    /// Whether a request that already made `attempt` attempts may try again
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_attempts
    }
}

impl Default for CollectRetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(60),
            max_attempts: 30,
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// URL the task dispatcher uses to reach this orchestrator
    pub public_url: String,

    /// Postgres connection string; in-memory repositories when unset
    pub database_url: Option<String>,

    /// Path of the service catalog JSON document
    pub service_config_path: String,

    /// Base URL of the external build queue
    pub build_queue_url: String,

    /// Subscription URL for pulling notifications (development only)
    pub notification_pull_url: Option<String>,

    pub environment: Environment,

    pub collect_retry: CollectRetryPolicy,

    /// How often the dispatcher looks for due tasks
    pub dispatch_interval: Duration,

    /// Maximum tasks claimed per dispatch cycle
    pub dispatch_batch: usize,

    /// How long a claimed task stays invisible before redelivery
    pub task_lease: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(service_config_path: String) -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            public_url: "http://localhost:8080".to_string(),
            database_url: None,
            service_config_path,
            build_queue_url: "http://localhost:8090".to_string(),
            notification_pull_url: None,
            environment: Environment::Development,
            collect_retry: CollectRetryPolicy::default(),
            dispatch_interval: Duration::from_secs(1),
            dispatch_batch: 16,
            task_lease: Duration::from_secs(60),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - SIFT_BIND_ADDR (default: 0.0.0.0:8080)
    /// - SIFT_PUBLIC_URL (default: http://localhost:8080)
    /// - DATABASE_URL (default: unset, in-memory storage)
    /// - SIFT_SERVICE_CONFIG (default: service.json)
    /// - SIFT_BUILD_QUEUE_URL (default: http://localhost:8090)
    /// - SIFT_NOTIFICATION_PULL_URL (default: unset)
    /// - SIFT_ENVIRONMENT (default: development)
    /// - SIFT_COLLECT_RETRY_DELAY (seconds, default: 60)
    /// - SIFT_COLLECT_MAX_ATTEMPTS (default: 30)
    /// - SIFT_DISPATCH_INTERVAL (seconds, default: 1)
    /// - SIFT_DISPATCH_BATCH (default: 16)
    /// - SIFT_TASK_LEASE (seconds, default: 60)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::new(
            std::env::var("SIFT_SERVICE_CONFIG").unwrap_or_else(|_| "service.json".to_string()),
        );

        let environment = match std::env::var("SIFT_ENVIRONMENT") {
            Ok(s) => Environment::parse(&s)?,
            Err(_) => defaults.environment,
        };

        let collect_retry = CollectRetryPolicy {
            delay: env_secs("SIFT_COLLECT_RETRY_DELAY").unwrap_or(defaults.collect_retry.delay),
            max_attempts: env_parse("SIFT_COLLECT_MAX_ATTEMPTS")
                .unwrap_or(defaults.collect_retry.max_attempts),
        };

        Ok(Self {
            bind_addr: std::env::var("SIFT_BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_url: std::env::var("SIFT_PUBLIC_URL").unwrap_or(defaults.public_url),
            database_url: std::env::var("DATABASE_URL").ok(),
            build_queue_url: std::env::var("SIFT_BUILD_QUEUE_URL")
                .unwrap_or(defaults.build_queue_url),
            notification_pull_url: std::env::var("SIFT_NOTIFICATION_PULL_URL").ok(),
            environment,
            collect_retry,
            dispatch_interval: env_secs("SIFT_DISPATCH_INTERVAL")
                .unwrap_or(defaults.dispatch_interval),
            dispatch_batch: env_parse("SIFT_DISPATCH_BATCH").unwrap_or(defaults.dispatch_batch),
            task_lease: env_secs("SIFT_TASK_LEASE").unwrap_or(defaults.task_lease),
            service_config_path: defaults.service_config_path,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.service_config_path.is_empty() {
            anyhow::bail!("service_config_path cannot be empty");
        }

        for (name, url) in [
            ("public_url", &self.public_url),
            ("build_queue_url", &self.build_queue_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.collect_retry.max_attempts == 0 {
            anyhow::bail!("collect max_attempts must be greater than 0");
        }

        if self.dispatch_interval.is_zero() {
            anyhow::bail!("dispatch_interval must be greater than 0");
        }

        if self.dispatch_batch == 0 {
            anyhow::bail!("dispatch_batch must be greater than 0");
        }

        if self.task_lease.is_zero() {
            anyhow::bail!("task_lease must be greater than 0");
        }

        Ok(())
    }

    /// Whether the pull-style notification endpoint is exposed
    pub fn pull_enabled(&self) -> bool {
        self.environment != Environment::Production
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("service.json".to_string())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.collect_retry.delay, Duration::from_secs(60));
        assert_eq!(config.collect_retry.max_attempts, 30);
        assert!(config.database_url.is_none());
        assert!(config.pull_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.build_queue_url = "not-a-url".to_string();
        assert!(config.validate().is_err());
        config.build_queue_url = "https://builds.example.com".to_string();
        assert!(config.validate().is_ok());

        config.collect_retry.max_attempts = 0;
        assert!(config.validate().is_err());
        config.collect_retry.max_attempts = 1;

        config.dispatch_batch = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_disables_pull() {
        let mut config = Config::default();
        config.environment = Environment::Production;
        assert!(!config.pull_enabled());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("PROD").unwrap(), Environment::Production);
        assert_eq!(Environment::parse("dev").unwrap(), Environment::Development);
        assert!(Environment::parse("staging").is_err());
    }

    #[test]
    fn test_retry_policy_attempts() {
        let policy = CollectRetryPolicy {
            delay: Duration::from_secs(1),
            max_attempts: 3,
        };
        assert!(policy.allows_retry(0));
        assert!(policy.allows_retry(1));
        assert!(!policy.allows_retry(2));
        assert!(!policy.allows_retry(u32::MAX));
    }
}
