//! Configuration Vault – reads/writes `~/.bonicbot/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use bonic_middleware::{COMMAND_TOPIC, FEEDBACK_TOPIC, ServoTopics};

/// Persisted user configuration stored in `~/.bonicbot/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Robot hostname or IP running `rosbridge_server`.
    #[serde(default = "default_host")]
    pub host: String,

    /// rosbridge WebSocket port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Topic the servo position controller listens on.
    #[serde(default = "default_command_topic")]
    pub command_topic: String,

    /// Topic carrying `sensor_msgs/JointState` feedback.
    #[serde(default = "default_feedback_topic")]
    pub feedback_topic: String,

    /// Refresh interval of the servo monitor, in seconds.
    #[serde(default = "default_monitor_rate")]
    pub monitor_rate_secs: f64,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    9090
}
fn default_command_topic() -> String {
    COMMAND_TOPIC.to_string()
}
fn default_feedback_topic() -> String {
    FEEDBACK_TOPIC.to_string()
}
fn default_monitor_rate() -> f64 {
    0.5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            command_topic: default_command_topic(),
            feedback_topic: default_feedback_topic(),
            monitor_rate_secs: default_monitor_rate(),
        }
    }
}

impl Config {
    /// `ws://host:port` of the rosbridge endpoint.
    pub fn rosbridge_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    pub fn topics(&self) -> ServoTopics {
        ServoTopics {
            command: self.command_topic.clone(),
            feedback: self.feedback_topic.clone(),
        }
    }
}

/// Return the path to `~/.bonicbot/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".bonicbot").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    if !is_valid_rate(cfg.monitor_rate_secs) {
        return Err(format!(
            "monitor_rate_secs must be a positive number of seconds, got {}",
            cfg.monitor_rate_secs
        ));
    }
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// `true` for a usable monitor refresh interval in seconds.
pub fn is_valid_rate(secs: f64) -> bool {
    secs.is_finite() && secs > 0.0
}

/// Apply `BONICBOT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `BONICBOT_HOST` | `host` |
/// | `BONICBOT_PORT` | `port` |
/// | `BONICBOT_MONITOR_RATE` | `monitor_rate_secs` |
///
/// Unparseable values, and rates that are not finite and positive, are
/// ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("BONICBOT_HOST") {
        cfg.host = v;
    }
    if let Ok(v) = std::env::var("BONICBOT_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.port = port;
    }
    if let Ok(v) = std::env::var("BONICBOT_MONITOR_RATE")
        && let Ok(rate) = v.parse::<f64>()
        && is_valid_rate(rate)
    {
        cfg.monitor_rate_secs = rate;
    }
}

/// Save the config to disk, creating `~/.bonicbot/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner-only directory (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
