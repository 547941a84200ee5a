use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;
use url::Url;

use crate::domain::annotators::default_annotators;

pub const DEFAULT_API_BASE: &str = "https://run.opencravat.org";
pub const DEFAULT_STORE_BASE: &str = "https://store.opencravat.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Stdio,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    pub bind_addr: String,
    pub bind_port: u16,
    pub api_base: Url,
    pub store_base: Url,
    pub protein_lookup_url: Option<Url>,
    pub upstream_timeout: Option<Duration>,
    pub default_annotators: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MCP_TRANSPORT must be one of: http, sse, stdio")]
    InvalidTransport,
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("{0} must be an absolute http(s) url")]
    InvalidUrl(&'static str),
    #[error("UPSTREAM_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
    #[error("OPENCRAVAT_DEFAULT_ANNOTATORS must name at least one annotator")]
    EmptyAnnotators,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let transport = match var("MCP_TRANSPORT")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            // The HTTP listener serves both POST /mcp and the SSE session routes.
            None | Some("http") | Some("sse") => Transport::Http,
            Some("stdio") => Transport::Stdio,
            Some(_) => return Err(ConfigError::InvalidTransport),
        };

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = var("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let api_base = parse_http_url(
            "OPENCRAVAT_API_BASE",
            &var("OPENCRAVAT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        )?;
        let store_base = parse_http_url(
            "OPENCRAVAT_STORE_BASE",
            &var("OPENCRAVAT_STORE_BASE").unwrap_or_else(|| DEFAULT_STORE_BASE.to_string()),
        )?;
        let protein_lookup_url = var("PROTEIN_LOOKUP_URL")
            .map(|value| parse_http_url("PROTEIN_LOOKUP_URL", &value))
            .transpose()?;

        let upstream_timeout = var("UPSTREAM_TIMEOUT_SECS")
            .map(|value| match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
                _ => Err(ConfigError::InvalidTimeout),
            })
            .transpose()?;

        let default_annotators = match var("OPENCRAVAT_DEFAULT_ANNOTATORS") {
            Some(list) => {
                let names = list
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>();
                if names.is_empty() {
                    return Err(ConfigError::EmptyAnnotators);
                }
                names
            }
            None => default_annotators(),
        };

        let config = Self {
            transport,
            bind_addr,
            bind_port,
            api_base,
            store_base,
            protein_lookup_url,
            upstream_timeout,
            default_annotators,
        };

        if config.transport == Transport::Http {
            let _ = config.bind_socket()?;
        }
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn parse_http_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidUrl(name))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(name));
    }
    Ok(url)
}
