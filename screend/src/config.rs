//! Configuration for the screenshot daemon.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use screend_core::capture::framebuffer::DEFAULT_SYSFS_ROOT;
use screend_core::{DEFAULT_BACKLOG, DEFAULT_PORT};

/// Capture device used when neither the CLI nor the config names one.
pub const DEFAULT_DEVICE: &str = "/dev/graphics/fb0";

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Screen capture settings.
    pub capture: CaptureConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind the listening socket to.
    pub bind_address: IpAddr,
    /// TCP port for screenshot requests.
    pub port: u16,
    /// Pending-connection backlog.
    pub backlog: u32,
}

/// Screen capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frame-buffer device node.
    pub device: PathBuf,
    /// Directory holding the frame-buffer sysfs entries.
    pub sysfs_root: PathBuf,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ServerConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Socket address the listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.network.bind_address, self.network.port)
    }

    /// Backlog clamped to at least one pending connection.
    pub fn backlog(&self) -> u32 {
        self.network.backlog.max(1)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = ServerConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("port = 42380"));
        assert!(text.contains("/dev/graphics/fb0"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = ServerConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ServerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.network.port, 42380);
        assert_eq!(parsed.capture.device, PathBuf::from(DEFAULT_DEVICE));
        assert_eq!(parsed.listen_addr().to_string(), "0.0.0.0:42380");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let parsed: ServerConfig = toml::from_str("[network]\nport = 5000\n").unwrap();
        assert_eq!(parsed.network.port, 5000);
        assert_eq!(parsed.network.backlog, DEFAULT_BACKLOG);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn backlog_is_clamped() {
        let mut cfg = ServerConfig::default();
        cfg.network.backlog = 0;
        assert_eq!(cfg.backlog(), 1);
    }

    #[test]
    fn load_falls_back_on_missing_or_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ServerConfig::load(&dir.path().join("absent.toml"));
        assert_eq!(missing.network.port, DEFAULT_PORT);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "network = 7").unwrap();
        assert_eq!(ServerConfig::load(&bad).network.port, DEFAULT_PORT);

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[capture]\ndevice = \"/dev/fb1\"\n").unwrap();
        assert_eq!(
            ServerConfig::load(&good).capture.device,
            PathBuf::from("/dev/fb1")
        );
    }
}
