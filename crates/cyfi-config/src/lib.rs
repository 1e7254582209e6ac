//! Daemon configuration, read from TOML. Every key has a default, so a
//! missing or partial file still yields a complete [`CyfiConfig`].

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CyfiConfig {
    pub display: DisplayConfig,
    pub volumio: VolumioConfig,
    pub command: CommandConfig,
    pub startup: StartupConfig,
    pub network: NetworkConfig,
    pub markers: MarkerConfig,
    pub playback: PlaybackConfig,
    pub clock: ClockConfig,
    pub system: SystemConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub logo_path: PathBuf,
    pub connecting_path: PathBuf,
    pub connected_path: PathBuf,
    pub loading_path: PathBuf,
    pub ready_new_path: PathBuf,
    pub ready_path: PathBuf,
    pub ready_loop_path: PathBuf,
    /// Seconds the startup logo stays up
    pub logo_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 64,
            logo_path: PathBuf::from("assets/logo.gif"),
            connecting_path: PathBuf::from("assets/connecting.gif"),
            connected_path: PathBuf::from("assets/connected.gif"),
            loading_path: PathBuf::from("assets/loading.gif"),
            ready_new_path: PathBuf::from("assets/ready_new.gif"),
            ready_path: PathBuf::from("assets/ready.gif"),
            ready_loop_path: PathBuf::from("assets/ready_loop.gif"),
            logo_secs: 12,
        }
    }
}

const MIN_POLL_INTERVAL_MS: u64 = 10;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct VolumioConfig {
    pub host: String,
    pub port: u16,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for VolumioConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            poll_interval_ms: 500,
            request_timeout_ms: 2000,
        }
    }
}

impl VolumioConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Never zero: a zero period would stop the poller.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommandConfig {
    pub socket_path: PathBuf,
    /// How long a client may take to send its token
    pub read_timeout_ms: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/cyfi.sock"),
            read_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StartupConfig {
    pub min_loading_secs: u64,
    pub connected_hold_secs: u64,
    pub probe_interval_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            min_loading_secs: 6,
            connected_hold_secs: 2,
            probe_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub probe_host: String,
    pub probe_port: u16,
    pub probe_timeout_secs: u64,
}

impl NetworkConfig {
    /// Never zero: connecting with a zero timeout always fails.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_host: "8.8.8.8".to_string(),
            probe_port: 53,
            probe_timeout_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarkerConfig {
    pub seen_ready_path: PathBuf,
    pub netconfigured_path: PathBuf,
    pub network_config_dir: PathBuf,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            seen_ready_path: PathBuf::from("/data/cyfi_first_run_done"),
            netconfigured_path: PathBuf::from("/data/configuration/netconfigured"),
            network_config_dir: PathBuf::from("/data/configuration/system_controller/network"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub show_now_playing_on_play: bool,
    pub clock_on_stop: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            show_now_playing_on_play: true,
            clock_on_stop: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClockConfig {
    /// strftime-style format
    pub format: String,
    pub show_date: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            format: "%H:%M".to_string(),
            show_date: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    /// Program and arguments run by the `shutdown` command
    pub shutdown_command: Vec<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            shutdown_command: ["sudo", "shutdown", "-h", "now"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CyfiConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Like [`CyfiConfig::load`], but a missing or broken file falls back to
    /// the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::warn!("Config: {} not found, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Config: Loaded {}", path.display());
                config
            }
            Err(e) => {
                log::error!("Config: {e:#}; using defaults");
                Self::default()
            }
        }
    }
}
