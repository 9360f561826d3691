// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.
//
// Read once at startup from an optional JSON file, then overridden from the
// environment. Never written back: the bridge keeps no state across restarts.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Default gateway port. The companion web client probes this port.
pub const DEFAULT_PORT: u16 = 8080;

/// Companion web client opened from the control surface.
pub const DEFAULT_CLIENT_URL: &str = "https://grahamthetvi.github.io/Graham_Braille_Editor/";

/// Document name shown in the OS print queue.
pub const DEFAULT_DOCUMENT_NAME: &str = "Braille Vibe Job";

/// Largest accepted request body. Base64 inflates by 4/3, so the largest
/// raw payload that fits is about three quarters of this.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024; // 64 MiB

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG_PATH: &str = "GRAHAM_BRIDGE_CONFIG";
pub const ENV_PORT: &str = "GRAHAM_BRIDGE_PORT";
pub const ENV_CLIENT_URL: &str = "GRAHAM_BRIDGE_CLIENT_URL";
pub const ENV_SIMULATE: &str = "GRAHAM_BRIDGE_SIMULATE";

/// Runtime settings for the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Loopback port for the HTTP gateway.
    pub port: u16,
    /// URL of the companion web client.
    pub client_url: String,
    /// Document name given to the spooler for every job.
    pub document_name: String,
    /// Maximum request body size accepted by the gateway, JSON framing and
    /// base64 expansion included.
    pub max_body_bytes: usize,
    /// Route jobs to the in-memory simulated port instead of the OS spooler.
    pub simulate: bool,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            client_url: DEFAULT_CLIENT_URL.into(),
            document_name: DEFAULT_DOCUMENT_NAME.into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            simulate: false,
            log_filter: None,
        }
    }
}

impl BridgeConfig {
    /// Load settings from `path`. A missing file yields the defaults; an
    /// unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(BridgeError::Io(e)),
        };
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GRAHAM_BRIDGE_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| BridgeError::Config(format!("{ENV_PORT}={port} is not a port")))?;
        }
        if let Some(url) = lookup(ENV_CLIENT_URL) {
            self.client_url = url;
        }
        if let Some(flag) = lookup(ENV_SIMULATE) {
            self.simulate = parse_flag(&flag).ok_or_else(|| {
                BridgeError::Config(format!("{ENV_SIMULATE}={flag} is not a boolean"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// The gateway address. Always loopback; there is no host setting.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(BridgeError::Config("port must be non-zero".into()));
        }
        if self.document_name.trim().is_empty() {
            return Err(BridgeError::Config("document_name must not be empty".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(BridgeError::Config("max_body_bytes must be non-zero".into()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_bind_loopback_8080() {
        let config = BridgeConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080".parse().unwrap());
        assert!(config.bind_addr().ip().is_loopback());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"port": 9191, "simulate": true, "max_body_bytes": 4096}"#,
        )
        .unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.port, 9191);
        assert!(config.simulate);
        assert_eq!(config.max_body_bytes, 4096);
        assert_eq!(config.document_name, DEFAULT_DOCUMENT_NAME);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ port: ").unwrap();

        assert!(matches!(
            BridgeConfig::load(&path),
            Err(BridgeError::Serialization(_))
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let config = BridgeConfig::default()
            .apply_env(env(&[(ENV_PORT, "9000"), (ENV_SIMULATE, "yes")]))
            .unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.simulate);
        assert_eq!(config.bind_addr(), "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn env_rejects_bad_port() {
        let result = BridgeConfig::default().apply_env(env(&[(ENV_PORT, "eighty")]));
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn zero_port_is_rejected() {
        let result = BridgeConfig::default().apply_env(env(&[(ENV_PORT, "0")]));
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }
}
