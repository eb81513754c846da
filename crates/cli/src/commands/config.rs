use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use formwork_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_key: Option<&str>| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "provider.service_id",
        config.provider.service_id.as_deref().unwrap_or("<unset>"),
        source("provider.service_id", Some("EMAILJS_SERVICE_ID")),
    ));
    lines.push(render_line(
        "provider.template_id",
        config.provider.template_id.as_deref().unwrap_or("<unset>"),
        source("provider.template_id", Some("EMAILJS_TEMPLATE_ID")),
    ));

    let user_id = if config.provider.user_id.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "provider.user_id",
        user_id,
        source("provider.user_id", Some("EMAILJS_USER_ID")),
    ));
    let public_key = if config.provider.public_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "provider.public_key",
        public_key,
        source("provider.public_key", Some("EMAILJS_PUBLIC_KEY")),
    ));
    lines.push(render_line(
        "provider.endpoint",
        &config.provider.endpoint,
        source("provider.endpoint", Some("FORMWORK_PROVIDER_ENDPOINT")),
    ));

    lines.push(render_line(
        "relay.recipient",
        &config.relay.recipient,
        source("relay.recipient", Some("FORMWORK_RECIPIENT")),
    ));
    lines.push(render_line(
        "relay.mode",
        &format!("{:?}", config.relay.mode),
        source("relay.mode", Some("FORMWORK_RELAY_MODE")),
    ));
    lines.push(render_line(
        "relay.proxy_url",
        config.relay.proxy_url.as_deref().unwrap_or("<unset>"),
        source("relay.proxy_url", Some("FORMWORK_PROXY_URL")),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", Some("FORMWORK_SERVER_BIND_ADDRESS")),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", Some("FORMWORK_SERVER_PORT")),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", Some("FORMWORK_LOGGING_LEVEL")),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", Some("FORMWORK_LOGGING_FORMAT")),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("formwork.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/formwork.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
