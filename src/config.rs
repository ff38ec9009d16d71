use crate::engine::LabelPrecedence;
use std::collections::HashMap;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub label_precedence: LabelPrecedence,
    pub max_events_per_request: usize,
    pub top_tokens_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            label_precedence: LabelPrecedence::Trusted,
            max_events_per_request: 10_000,
            top_tokens_limit: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let port = match env_map.get("PORT") {
            Some(s) => s.trim().parse::<u16>().map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?,
            None => defaults.port,
        };

        let bind_addr = match env_map.get("BIND_ADDR") {
            Some(s) => s.trim().parse::<IpAddr>().map_err(|_| {
                ConfigError::InvalidValue(
                    "BIND_ADDR".to_string(),
                    "must be an IPv4 or IPv6 address".to_string(),
                )
            })?,
            None => defaults.bind_addr,
        };

        let label_precedence = match env_map
            .get("LABEL_PRECEDENCE")
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("trusted") => LabelPrecedence::Trusted,
            Some("flow") => LabelPrecedence::FlowFirst,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "LABEL_PRECEDENCE".to_string(),
                    format!("must be trusted or flow, got {}", other),
                ))
            }
        };

        let max_events_per_request = parse_positive(
            &env_map,
            "MAX_EVENTS_PER_REQUEST",
            defaults.max_events_per_request,
        )?;
        let top_tokens_limit =
            parse_positive(&env_map, "TOP_TOKENS_LIMIT", defaults.top_tokens_limit)?;

        Ok(Config {
            port,
            bind_addr,
            label_precedence,
            max_events_per_request,
            top_tokens_limit,
        })
    }
}

fn parse_positive(
    env_map: &HashMap<String, String>,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(raw) = env_map.get(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be a positive integer".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = Config::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1");
        assert_eq!(config.label_precedence, LabelPrecedence::Trusted);
        assert_eq!(config.max_events_per_request, 10_000);
        assert_eq!(config.top_tokens_limit, 10);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_env_map(env(&[
            ("PORT", "9000"),
            ("BIND_ADDR", "0.0.0.0"),
            ("LABEL_PRECEDENCE", "Flow"),
            ("MAX_EVENTS_PER_REQUEST", "50"),
            ("TOP_TOKENS_LIMIT", "3"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0");
        assert_eq!(config.label_precedence, LabelPrecedence::FlowFirst);
        assert_eq!(config.max_events_per_request, 50);
        assert_eq!(config.top_tokens_limit, 3);
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::from_env_map(env(&[("PORT", "not_a_number")]));
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_bind_addr() {
        let result = Config::from_env_map(env(&[("BIND_ADDR", "localhost:80")]));
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "BIND_ADDR"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_label_precedence() {
        let result = Config::from_env_map(env(&[("LABEL_PRECEDENCE", "labels")]));
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "LABEL_PRECEDENCE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_limits_rejected() {
        for key in ["MAX_EVENTS_PER_REQUEST", "TOP_TOKENS_LIMIT"] {
            match Config::from_env_map(env(&[(key, "0")])) {
                Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, key),
                _ => panic!("Expected InvalidValue error for {}", key),
            }
        }
    }
}
