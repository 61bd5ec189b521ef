use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use dovestats_core::error::{DoveStatsError, Result};
use dovestats_core::protocol::ScopeKind;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub web: WebSection,

    #[serde(default)]
    pub dovecot: DovecotSection,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            web: WebSection::default(),
            dovecot: DovecotSection::default(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(DoveStatsError::UnsupportedVersion);
        }

        self.web.validate()?;
        self.dovecot.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_telemetry_path")]
    pub telemetry_path: String,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            telemetry_path: default_telemetry_path(),
        }
    }
}

impl WebSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !self.telemetry_path.starts_with('/') || self.telemetry_path == "/" {
            return Err(DoveStatsError::BadConfig(
                "web.telemetry_path must start with '/' and must not be '/'".into(),
            ));
        }
        if RESERVED_PATHS.contains(&self.telemetry_path.as_str()) {
            return Err(DoveStatsError::BadConfig(format!(
                "web.telemetry_path {:?} collides with a built-in endpoint",
                self.telemetry_path
            )));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            DoveStatsError::BadConfig(format!(
                "web.listen {:?} is not a socket address: {e}",
                self.listen
            ))
        })
    }
}

const RESERVED_PATHS: [&str; 2] = ["/healthz", "/readyz"];

fn default_listen() -> String {
    "0.0.0.0:9199".into()
}
fn default_telemetry_path() -> String {
    "/metrics".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DovecotSection {
    #[serde(default = "default_socket_path")]
    pub socket_path: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_scopes")]
    pub scopes: Vec<ScopeConfig>,
}

impl Default for DovecotSection {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            timeout_ms: default_timeout_ms(),
            scopes: default_scopes(),
        }
    }
}

impl DovecotSection {
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.is_empty() {
            return Err(DoveStatsError::BadConfig("dovecot.socket_path must not be empty".into()));
        }
        if !(100..=60000).contains(&self.timeout_ms) {
            return Err(DoveStatsError::BadConfig(
                "dovecot.timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if self.scopes.is_empty() {
            return Err(DoveStatsError::BadConfig("dovecot.scopes must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for s in &self.scopes {
            // The name goes verbatim into a tab/LF framed request line.
            if s.name.is_empty() || s.name.chars().any(|c| c.is_whitespace() || c.is_control()) {
                return Err(DoveStatsError::BadConfig(format!(
                    "dovecot.scopes: invalid scope name {:?}",
                    s.name
                )));
            }
            if !seen.insert(s.name.as_str()) {
                return Err(DoveStatsError::BadConfig(format!(
                    "dovecot.scopes: duplicate scope {:?}",
                    s.name
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_socket_path() -> String {
    "/var/run/dovecot/stats".into()
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_scopes() -> Vec<ScopeConfig> {
    vec![ScopeConfig::named("user")]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeConfig {
    pub name: String,

    /// Response format; falls back to Dovecot naming when unset.
    #[serde(default)]
    pub kind: Option<ScopeKindConfig>,
}

impl ScopeConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
        }
    }

    pub fn resolved_kind(&self) -> ScopeKind {
        match self.kind {
            Some(ScopeKindConfig::Global) => ScopeKind::Global,
            Some(ScopeKindConfig::Detail) => ScopeKind::Detail,
            None => ScopeKind::by_convention(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKindConfig {
    Global,
    Detail,
}
