use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wizard::validation::is_valid_email;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub relay: RelayConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// EmailJS send credentials. All three identifiers must be present for a
/// direct provider call; absence selects the mailto fallback instead of
/// being a configuration error.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub user_id: Option<SecretString>,
    pub public_key: Option<SecretString>,
    pub endpoint: String,
}

#[derive(Clone, Debug)]
pub struct EmailJsCredentials {
    pub service_id: String,
    pub template_id: String,
    pub user_id: SecretString,
}

impl ProviderConfig {
    /// The complete credential triple, with `user_id` falling back to
    /// `public_key` the way the hosting environment allows either.
    pub fn credentials(&self) -> Option<EmailJsCredentials> {
        let service_id = non_empty(self.service_id.as_deref())?;
        let template_id = non_empty(self.template_id.as_deref())?;
        let user_id = [&self.user_id, &self.public_key]
            .into_iter()
            .flatten()
            .find(|secret| !secret.expose_secret().trim().is_empty())?;

        Some(EmailJsCredentials {
            service_id: service_id.to_owned(),
            template_id: template_id.to_owned(),
            user_id: user_id.clone(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub recipient: String,
    pub mode: RelayMode,
    pub proxy_url: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayMode {
    /// The relay calls the provider endpoint itself using local credentials.
    Direct,
    /// The relay posts to the credential-hiding server proxy.
    Proxied,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub recipient: Option<String>,
    pub relay_mode: Option<RelayMode>,
    pub proxy_url: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                service_id: None,
                template_id: None,
                user_id: None,
                public_key: None,
                endpoint: "https://api.emailjs.com/api/v1.0/email/send".to_string(),
            },
            relay: RelayConfig {
                recipient: "partnerships@formwork.dev".to_string(),
                mode: RelayMode::Direct,
                proxy_url: None,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8787 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for RelayMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "proxied" => Ok(Self::Proxied),
            other => Err(ConfigError::Validation(format!(
                "unsupported relay mode `{other}` (expected direct|proxied)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("formwork.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(provider) = patch.provider {
            if let Some(service_id) = provider.service_id {
                self.provider.service_id = Some(service_id);
            }
            if let Some(template_id) = provider.template_id {
                self.provider.template_id = Some(template_id);
            }
            if let Some(provider_user_id_value) = provider.user_id {
                self.provider.user_id = Some(secret_value(provider_user_id_value));
            }
            if let Some(provider_public_key_value) = provider.public_key {
                self.provider.public_key = Some(secret_value(provider_public_key_value));
            }
            if let Some(endpoint) = provider.endpoint {
                self.provider.endpoint = endpoint;
            }
        }

        if let Some(relay) = patch.relay {
            if let Some(recipient) = relay.recipient {
                self.relay.recipient = recipient;
            }
            if let Some(mode) = relay.mode {
                self.relay.mode = mode;
            }
            if let Some(proxy_url) = relay.proxy_url {
                self.relay.proxy_url = Some(proxy_url);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Provider identifiers keep the bare names the hosting environment
        // already uses, so the same variables configure every deployment.
        if let Some(value) = read_env("EMAILJS_SERVICE_ID") {
            self.provider.service_id = Some(value);
        }
        if let Some(value) = read_env("EMAILJS_TEMPLATE_ID") {
            self.provider.template_id = Some(value);
        }
        if let Some(value) = read_env("EMAILJS_USER_ID") {
            self.provider.user_id = Some(secret_value(value));
        }
        if let Some(value) = read_env("EMAILJS_PUBLIC_KEY") {
            self.provider.public_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("FORMWORK_PROVIDER_ENDPOINT") {
            self.provider.endpoint = value;
        }

        if let Some(value) = read_env("FORMWORK_RECIPIENT") {
            self.relay.recipient = value;
        }
        if let Some(value) = read_env("FORMWORK_RELAY_MODE") {
            self.relay.mode = value.parse()?;
        }
        if let Some(value) = read_env("FORMWORK_PROXY_URL") {
            self.relay.proxy_url = Some(value);
        }

        if let Some(value) = read_env("FORMWORK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FORMWORK_SERVER_PORT") {
            self.server.port = parse_u16("FORMWORK_SERVER_PORT", &value)?;
        }

        let log_level =
            read_env("FORMWORK_LOGGING_LEVEL").or_else(|| read_env("FORMWORK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FORMWORK_LOGGING_FORMAT").or_else(|| read_env("FORMWORK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(recipient) = overrides.recipient {
            self.relay.recipient = recipient;
        }
        if let Some(relay_mode) = overrides.relay_mode {
            self.relay.mode = relay_mode;
        }
        if let Some(proxy_url) = overrides.proxy_url {
            self.relay.proxy_url = Some(proxy_url);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_provider(&self.provider)?;
        validate_relay(&self.relay)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("formwork.toml"), PathBuf::from("config/formwork.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_provider(provider: &ProviderConfig) -> Result<(), ConfigError> {
    let endpoint = provider.endpoint.trim();
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ConfigError::Validation(
            "provider.endpoint must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_relay(relay: &RelayConfig) -> Result<(), ConfigError> {
    let recipient = relay.recipient.trim();
    if recipient.is_empty() {
        return Err(ConfigError::Validation("relay.recipient is required".to_string()));
    }
    if !is_valid_email(recipient) {
        return Err(ConfigError::Validation(format!(
            "relay.recipient `{recipient}` is not a valid email address"
        )));
    }

    match relay.mode {
        RelayMode::Proxied => {
            let proxy_url = relay.proxy_url.as_deref().map(str::trim).unwrap_or_default();
            if proxy_url.is_empty() {
                return Err(ConfigError::Validation(
                    "relay.proxy_url is required when relay.mode is `proxied`".to_string(),
                ));
            }
            if !proxy_url.starts_with("http://") && !proxy_url.starts_with("https://") {
                return Err(ConfigError::Validation(
                    "relay.proxy_url must start with http:// or https://".to_string(),
                ));
            }
        }
        RelayMode::Direct => {
            if let Some(proxy_url) = relay.proxy_url.as_deref() {
                let trimmed = proxy_url.trim();
                if !trimmed.is_empty()
                    && !trimmed.starts_with("http://")
                    && !trimmed.starts_with("https://")
                {
                    return Err(ConfigError::Validation(
                        "relay.proxy_url must start with http:// or https://".to_string(),
                    ));
                }
            }
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address is required".to_string()));
    }
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    provider: Option<ProviderPatch>,
    relay: Option<RelayPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderPatch {
    service_id: Option<String>,
    template_id: Option<String>,
    user_id: Option<String>,
    public_key: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RelayPatch {
    recipient: Option<String>,
    mode: Option<RelayMode>,
    proxy_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, RelayMode};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    const ALL_VARS: &[&str] = &[
        "EMAILJS_SERVICE_ID",
        "EMAILJS_TEMPLATE_ID",
        "EMAILJS_USER_ID",
        "EMAILJS_PUBLIC_KEY",
        "FORMWORK_PROVIDER_ENDPOINT",
        "FORMWORK_RECIPIENT",
        "FORMWORK_RELAY_MODE",
        "FORMWORK_PROXY_URL",
        "FORMWORK_SERVER_BIND_ADDRESS",
        "FORMWORK_SERVER_PORT",
        "FORMWORK_LOGGING_LEVEL",
        "FORMWORK_LOG_LEVEL",
        "FORMWORK_LOGGING_FORMAT",
        "FORMWORK_LOG_FORMAT",
    ];

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate_without_provider_credentials() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.provider.credentials().is_none(),
            "missing credentials should resolve to the fallback path, not an error",
        )?;
        ensure(config.relay.mode == RelayMode::Direct, "default relay mode should be direct")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("TEST_EMAILJS_SERVICE", "service_abc123");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("formwork.toml");
            fs::write(
                &path,
                r#"
[provider]
service_id = "${TEST_EMAILJS_SERVICE}"
template_id = "template_contact"
user_id = "user_xyz"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.provider.service_id.as_deref() == Some("service_abc123"),
                "service id should be interpolated from the environment",
            )?;
            ensure(
                config.provider.credentials().is_some(),
                "complete provider section should yield credentials",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_EMAILJS_SERVICE"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("FORMWORK_RECIPIENT", "from-env@example.com");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("formwork.toml");
            fs::write(
                &path,
                r#"
[relay]
recipient = "from-file@example.com"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.relay.recipient == "from-env@example.com",
                "env recipient should win over file and default",
            )?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn proxied_mode_requires_a_proxy_url() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("FORMWORK_RELAY_MODE", "proxied");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("relay.proxy_url")
            );
            ensure(has_message, "validation failure should mention relay.proxy_url")
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn public_key_substitutes_for_a_missing_user_id() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("EMAILJS_SERVICE_ID", "service_abc");
        env::set_var("EMAILJS_TEMPLATE_ID", "template_contact");
        env::set_var("EMAILJS_PUBLIC_KEY", "public_key_value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let credentials = config
                .provider
                .credentials()
                .ok_or_else(|| "public key should complete the credential triple".to_string())?;

            ensure(
                credentials.user_id.expose_secret() == "public_key_value",
                "user id should fall back to the public key",
            )
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("FORMWORK_LOG_LEVEL", "warn");
        env::set_var("FORMWORK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warn log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("EMAILJS_USER_ID", "user-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("user-secret-value"),
                "debug output should not contain the provider user id",
            )
        })();

        clear_vars(ALL_VARS);
        result
    }
}
