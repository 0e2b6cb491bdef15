//! Service configuration loaded from environment variables.

use std::time::Duration;

use vg_risk::{HourBasis, RiskEngineConfig};
use vg_types::{config_error, VgResult};

/// Transport settings for the HTTP front end.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Full `host:port`; takes precedence over `host`/`port` when set.
    pub addr: Option<String>,
    pub service_name: String,
    /// CORS allow-list. `*` allows any origin.
    pub allowed_origins: Vec<String>,
    pub rate_limit_window: Duration,
    /// Requests per client per window. `0` disables limiting.
    pub rate_limit_max_requests: u32,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
    pub engine: RiskEngineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            addr: None,
            service_name: "vigil-risk-engine".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            rate_limit_window: Duration::from_millis(900_000), // 15 min
            rate_limit_max_requests: 100,
            max_body_bytes: 100 * 1024,
            request_timeout: Duration::from_secs(10),
            engine: RiskEngineConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> VgResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> VgResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = get("VIGIL_ADDR") {
            config.addr = Some(addr.trim().to_string());
        }
        if let Some(host) = get("HOST") {
            config.host = host.trim().to_string();
        }
        if let Some(port) = get("PORT") {
            config.port = parse_number("PORT", &port)?;
        }
        if let Some(name) = get("SERVICE_NAME") {
            config.service_name = name.trim().to_string();
        }
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(window) = get("RATE_LIMIT_WINDOW_MS") {
            let millis: u64 = parse_number("RATE_LIMIT_WINDOW_MS", &window)?;
            if millis == 0 {
                return Err(config_error!("RATE_LIMIT_WINDOW_MS must be positive"));
            }
            config.rate_limit_window = Duration::from_millis(millis);
        }
        if let Some(max) = get("RATE_LIMIT_MAX_REQUESTS") {
            config.rate_limit_max_requests = parse_number("RATE_LIMIT_MAX_REQUESTS", &max)?;
        }
        if let Some(max) = get("MAX_BODY_BYTES") {
            config.max_body_bytes = parse_number("MAX_BODY_BYTES", &max)?;
        }
        if let Some(timeout) = get("REQUEST_TIMEOUT_MS") {
            let millis: u64 = parse_number("REQUEST_TIMEOUT_MS", &timeout)?;
            config.request_timeout = Duration::from_millis(millis);
        }
        if let Some(basis) = get("VIGIL_HOUR_BASIS") {
            config.engine.hour_basis = basis.parse::<HourBasis>()?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        self.addr
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.host, self.port))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> VgResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| config_error!("{key} must be a non-negative integer, got {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> VgResult<ServiceConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:3001");
        assert_eq!(config.rate_limit_window, Duration::from_secs(15 * 60));
        assert_eq!(config.engine.hour_basis, HourBasis::Local);
    }

    #[test]
    fn environment_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,,"),
            ("RATE_LIMIT_WINDOW_MS", "60000"),
            ("RATE_LIMIT_MAX_REQUESTS", "5"),
            ("MAX_BODY_BYTES", "2048"),
            ("REQUEST_TIMEOUT_MS", "250"),
            ("VIGIL_HOUR_BASIS", "utc"),
            ("SERVICE_NAME", "risk"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
        assert_eq!(config.rate_limit_max_requests, 5);
        assert_eq!(config.max_body_bytes, 2048);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.engine.hour_basis, HourBasis::Utc);
        assert_eq!(config.service_name, "risk");
    }

    #[test]
    fn full_address_wins() {
        let config = config_from(&[("VIGIL_ADDR", "127.0.0.1:9999"), ("PORT", "1")]).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9999");
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = config_from(&[("PORT", "  ")]).unwrap();
        assert_eq!(config.port, 3001);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for pairs in [
            [("PORT", "http")],
            [("PORT", "70000")],
            [("RATE_LIMIT_WINDOW_MS", "0")],
            [("RATE_LIMIT_MAX_REQUESTS", "-1")],
            [("VIGIL_HOUR_BASIS", "moon")],
        ] {
            let err = config_from(&pairs).unwrap_err();
            assert!(
                matches!(err, vg_types::VgError::Config(_)),
                "{pairs:?} gave {err}"
            );
        }
    }
}
