use std::path::PathBuf;
use std::time::Duration;

use replydesk_desk::queue::BulkConfig;

/// A configuration value that could not be parsed or is out of range.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidMillis { var: &'static str, value: String },

    #[error("{var} must be at least {minimum_ms}ms, got {value_ms}ms")]
    DelayBelowMinimum {
        var: &'static str,
        value_ms: u64,
        minimum_ms: u64,
    },

    #[error("{var} must be true or false, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
}

/// Worker configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local reply server.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    /// Base URL of the reply server (default: `http://localhost:5000`).
    pub server_url: String,
    /// Board snapshot to hydrate from (default: `board.json`).
    pub board_file: PathBuf,
    /// Inter-item delays for bulk runs.
    pub bulk: BulkConfig,
    /// Answer every confirmation prompt with yes (default: `false`).
    pub assume_yes: bool,
}

impl DeskConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `REPLYDESK_SERVER_URL`        | `http://localhost:5000` |
    /// | `REPLYDESK_BOARD_FILE`        | `board.json`            |
    /// | `REPLYDESK_GENERATE_DELAY_MS` | `500`                   |
    /// | `REPLYDESK_PENDING_DELAY_MS`  | `200`                   |
    /// | `REPLYDESK_ASSUME_YES`        | `false`                 |
    ///
    /// The delays may be raised but never lowered below their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = BulkConfig::default();

        let server_url = lookup("REPLYDESK_SERVER_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "http://localhost:5000".into());

        let board_file = lookup("REPLYDESK_BOARD_FILE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "board.json".into())
            .into();

        let generate_delay = millis(
            &lookup,
            "REPLYDESK_GENERATE_DELAY_MS",
            defaults.generate_delay,
        )?;
        let pending_delay = millis(
            &lookup,
            "REPLYDESK_PENDING_DELAY_MS",
            defaults.pending_delay,
        )?;

        let assume_yes = match lookup("REPLYDESK_ASSUME_YES") {
            None => false,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "no" => false,
                "1" | "true" | "yes" => true,
                _ => {
                    return Err(ConfigError::InvalidBool {
                        var: "REPLYDESK_ASSUME_YES",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            server_url,
            board_file,
            bulk: BulkConfig {
                generate_delay,
                pending_delay,
            },
            assume_yes,
        })
    }
}

/// Read a delay in milliseconds; `minimum` is both the default and the floor.
fn millis<F>(lookup: &F, var: &'static str, minimum: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(minimum);
    };
    let value_ms = value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidMillis { var, value })?;
    let delay = Duration::from_millis(value_ms);
    if delay < minimum {
        return Err(ConfigError::DelayBelowMinimum {
            var,
            value_ms,
            minimum_ms: minimum.as_millis() as u64,
        });
    }
    Ok(delay)
}
