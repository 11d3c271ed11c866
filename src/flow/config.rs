// SPDX-License-Identifier: MIT

//! Server configuration from the environment

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use super::error::FlowError;

pub const HOST_VAR: &str = "FITTINGFLOW_HOST";
pub const PORT_VAR: &str = "FITTINGFLOW_PORT";
pub const STATIC_DIR_VAR: &str = "FITTINGFLOW_STATIC_DIR";

/// Where the HTTP front end listens and what it serves
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for any path the API does not match
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, FlowError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    /// Unset or empty variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get(HOST_VAR) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = get(PORT_VAR) {
            config.port = port.trim().parse().map_err(|_| {
                FlowError::config(format!("{} must be a port number, got '{}'", PORT_VAR, port))
            })?;
        }
        if let Some(dir) = get(STATIC_DIR_VAR) {
            config.static_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Socket address to bind
    pub fn addr(&self) -> Result<SocketAddr, FlowError> {
        let ip: IpAddr = if self.host == "localhost" {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host
                .parse()
                .map_err(|_| FlowError::config(format!("invalid host address '{}'", self.host)))?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}
