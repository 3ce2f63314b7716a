//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::TelemetryConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn first_set<F>(env: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| env(key))
        .find(|value| !value.trim().is_empty())
}

/// Apply `OTEL_*` style environment overrides.
///
/// `env` is the variable lookup, usually `|k| std::env::var(k).ok()`.
pub fn apply_env_overrides<F>(config: &mut TelemetryConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = first_set(&env, &["OTEL_SERVICE_NAME"]) {
        config.service.name = name;
    }
    if let Some(version) = first_set(&env, &["OTEL_SERVICE_VERSION"]) {
        config.service.version = version;
    }
    if let Some(namespace) = first_set(&env, &["OTEL_SERVICE_NAMESPACE", "K8S_NAMESPACE"]) {
        config.service.namespace = namespace;
    }
    if let Some(environment) = first_set(&env, &["OTEL_ENVIRONMENT", "APP_ENV"]) {
        config.service.environment = environment;
    }
    if let Some(instance) = first_set(
        &env,
        &["OTEL_SERVICE_INSTANCE_ID", "HOSTNAME", "POD_NAME", "K8S_POD_NAME"],
    ) {
        config.service.instance_id = Some(instance);
    }
    if let Some(raw) = first_set(&env, &["OTEL_LOG_LEVEL"]) {
        match otel_log_level(&raw) {
            Some(level) => config.logging.level = level.to_string(),
            None => tracing::warn!(value = %raw, "Ignoring unrecognized OTEL_LOG_LEVEL"),
        }
    }
}

/// Map an OpenTelemetry SDK log level onto a `tracing` filter level.
fn otel_log_level(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "none" | "off" => Some("off"),
        "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "verbose" | "all" | "trace" => Some("trace"),
        _ => None,
    }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<TelemetryConfig, ConfigError> {
    let config: TelemetryConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load configuration from an optional TOML file, apply process environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<TelemetryConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => TelemetryConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_partial_file() {
        let config = parse_config(
            r#"
            [service]
            name = "checkout"

            [metrics]
            init_delay_ms = 3000
            "#,
        )
        .unwrap();
        assert_eq!(config.service.name, "checkout");
        assert_eq!(config.metrics.init_delay_ms, 3000);
        assert!(config.metrics.enabled);
        assert_eq!(config.headers.client_ip[0], "x-real-ip");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let err = parse_config("[logging]\nlevel = \"chatty\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_config("[service"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides_with_fallbacks() {
        let mut config = TelemetryConfig::default();
        apply_env_overrides(
            &mut config,
            env_of(&[
                ("OTEL_SERVICE_NAME", "orders"),
                ("K8S_NAMESPACE", "shop"),
                ("HOSTNAME", "orders-7f9c"),
                ("OTEL_LOG_LEVEL", "DEBUG"),
            ]),
        );
        assert_eq!(config.service.name, "orders");
        assert_eq!(config.service.namespace, "shop");
        assert_eq!(config.service.instance_id.as_deref(), Some("orders-7f9c"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.service.environment, "development");
    }

    #[test]
    fn test_otel_log_level_none_disables_logging() {
        let mut config = TelemetryConfig::default();
        apply_env_overrides(&mut config, env_of(&[("OTEL_LOG_LEVEL", "none")]));
        assert_eq!(config.logging.level, "off");
        assert!(validate_config(&config).is_ok());

        apply_env_overrides(&mut config, env_of(&[("OTEL_LOG_LEVEL", "verbose")]));
        assert_eq!(config.logging.level, "trace");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_otel_log_level_is_ignored() {
        let mut config = TelemetryConfig::default();
        let before = config.logging.level.clone();
        apply_env_overrides(&mut config, env_of(&[("OTEL_LOG_LEVEL", "loud")]));
        assert_eq!(config.logging.level, before);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_explicit_env_beats_fallback() {
        let mut config = TelemetryConfig::default();
        apply_env_overrides(
            &mut config,
            env_of(&[
                ("OTEL_SERVICE_NAMESPACE", "explicit"),
                ("K8S_NAMESPACE", "implicit"),
                ("OTEL_ENVIRONMENT", ""),
                ("APP_ENV", "staging"),
            ]),
        );
        assert_eq!(config.service.namespace, "explicit");
        assert_eq!(config.service.environment, "staging");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
