use std::path::PathBuf;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the party server
    pub server_url: String,
    /// Steady polling period while the game view is active
    pub poll_interval: Duration,
    /// Delay of the extra poll after a confirmed vote
    pub vote_repoll_delay: Duration,
    /// Delay of the extra poll after a confirmed task choice
    pub task_repoll_delay: Duration,
    /// Timeout for every HTTP request
    pub request_timeout: Duration,
    /// Where the session triple is persisted
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            poll_interval: Duration::from_millis(1000),
            vote_repoll_delay: Duration::from_millis(200),
            task_repoll_delay: Duration::from_millis(300),
            request_timeout: Duration::from_secs(10),
            session_file: PathBuf::from("actrix_session.json"),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn env_millis(key: &str) -> Option<Duration> {
    env_string(key)
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let poll_interval = match env_millis("ACTRIX_POLL_INTERVAL_MS") {
            Some(d) if d.is_zero() => {
                tracing::warn!("ACTRIX_POLL_INTERVAL_MS must be positive, using default");
                defaults.poll_interval
            }
            Some(d) => d,
            None => defaults.poll_interval,
        };

        let request_timeout = match env_string("ACTRIX_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
        {
            Some(d) if d.is_zero() => {
                tracing::warn!("ACTRIX_REQUEST_TIMEOUT_SECS must be positive, using default");
                defaults.request_timeout
            }
            Some(d) => d,
            None => defaults.request_timeout,
        };

        let config = Self {
            server_url: env_string("ACTRIX_SERVER_URL").unwrap_or(defaults.server_url),
            poll_interval,
            vote_repoll_delay: env_millis("ACTRIX_VOTE_REPOLL_MS")
                .unwrap_or(defaults.vote_repoll_delay),
            task_repoll_delay: env_millis("ACTRIX_TASK_REPOLL_MS")
                .unwrap_or(defaults.task_repoll_delay),
            request_timeout,
            session_file: env_string("ACTRIX_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
        };

        for (name, delay) in [
            ("ACTRIX_VOTE_REPOLL_MS", config.vote_repoll_delay),
            ("ACTRIX_TASK_REPOLL_MS", config.task_repoll_delay),
        ] {
            if delay >= config.poll_interval {
                tracing::warn!(
                    "{} ({:?}) is not shorter than the poll interval ({:?})",
                    name,
                    delay,
                    config.poll_interval
                );
            }
        }

        config
    }
}
