use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Where plan offers come from. One source per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
    Scoring,
    Remote,
    Fixture,
}

impl FromStr for RecommendationSource {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scoring" | "local" => Ok(Self::Scoring),
            "remote" | "http" => Ok(Self::Remote),
            "fixture" | "mock" => Ok(Self::Fixture),
            _ => Err(ConfigError::InvalidSource(value.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ADVISOR_SOURCE must be scoring, remote or fixture (got '{0}')")]
    InvalidSource(String),
    #[error("ADVISOR_GATEWAY_URL is required when ADVISOR_SOURCE=remote")]
    MissingGatewayUrl,
    #[error("{name} must be a valid number (got '{value}')")]
    InvalidNumber { name: &'static str, value: String },
    #[error("ADVISOR_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub source: RecommendationSource,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub gateway: GatewayConfig,
    pub server: ServerConfig,
    pub session_dir: PathBuf,
    pub log_filter: String,
}

impl AdvisorConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let source = match var("ADVISOR_SOURCE") {
            Some(raw) => raw.parse()?,
            None => RecommendationSource::Scoring,
        };
        let url = var("ADVISOR_GATEWAY_URL");
        if source == RecommendationSource::Remote && url.is_none() {
            return Err(ConfigError::MissingGatewayUrl);
        }
        let timeout_secs: u64 = parse_number(
            var("ADVISOR_GATEWAY_TIMEOUT_SECS"),
            "ADVISOR_GATEWAY_TIMEOUT_SECS",
            30,
        )?;
        let port: u16 = parse_number(var("ADVISOR_PORT"), "ADVISOR_PORT", 3000)?;

        Ok(Self {
            gateway: GatewayConfig {
                source,
                url,
                api_key: var("ADVISOR_GATEWAY_KEY"),
                timeout: Duration::from_secs(timeout_secs),
            },
            server: ServerConfig {
                host: var("ADVISOR_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port,
            },
            session_dir: var("ADVISOR_SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".advisor")),
            log_filter: var("ADVISOR_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_number<T: FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}
