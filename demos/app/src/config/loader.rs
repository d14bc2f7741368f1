use std::path::{Path, PathBuf};

use logkit::LogOption;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::validation::{RawConfig, validate};
use super::{AppConfig, ConfigError};

pub const ENV_PREFIX: &str = "APP";

const DEFAULT_CONFIG_NAME: &str = "app";
const EXTENSIONS: [&str; 2] = ["yaml", "yml"];
const DEFAULT_SEARCH_PATHS: [&str; 3] = ["./config", ".", "/etc/app"];

/// Keys that can be set from the environment even when neither the defaults
/// nor the file mention them.
const SCHEMA_KEYS: [&[&str]; 16] = [
    &["server", "port"],
    &["server", "name"],
    &["server", "environment"],
    &["service", "name"],
    &["service", "version"],
    &["service", "description"],
    &["logger", "engine"],
    &["logger", "level"],
    &["logger", "format"],
    &["logger", "output_paths"],
    &["logger", "development"],
    &["logger", "disable_caller"],
    &["logger", "disable_stacktrace"],
    &["logger", "otlp_endpoint"],
    &["logger", "otlp", "enabled"],
    &["logger", "otlp", "endpoint"],
];

const LIST_KEYS: [&[&str]; 1] = [&["logger", "output_paths"]];

/// Environment variable that overrides `path`: `["server", "port"]` →
/// `APP_SERVER_PORT`.
pub fn env_var_name(path: &[&str]) -> String {
    let mut name = ENV_PREFIX.to_string();
    for segment in path {
        name.push('_');
        name.push_str(&segment.replace(['.', '-'], "_").to_uppercase());
    }
    name
}

fn defaults() -> Value {
    let yaml = r#"
server:
  port: 8080
  name: config-demo
  environment: development
service:
  name: config-demo-api
  version: v1.0.0
  description: Configuration demo service
logger:
  development: false
  disable_caller: false
  disable_stacktrace: false
  output_paths: [stdout]
"#;
    serde_yaml::from_str(yaml).unwrap_or(Value::Mapping(Mapping::new()))
}

/// Recursively merge `overlay` onto `base`; mappings merge, anything else replaces.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn leaf_paths(value: &Value, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    match value {
        Value::Mapping(map) if !map.is_empty() => {
            for (key, child) in map {
                if let Some(key) = key.as_str() {
                    prefix.push(key.to_string());
                    leaf_paths(child, prefix, out);
                    prefix.pop();
                }
            }
        }
        _ if !prefix.is_empty() => out.push(prefix.clone()),
        _ => {}
    }
}

fn set_path(tree: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut node = tree;
    for segment in parents {
        if !node.is_mapping() {
            *node = Value::Mapping(Mapping::new());
        }
        node = match node {
            Value::Mapping(map) => map
                .entry(Value::String(segment.clone()))
                .or_insert_with(|| Value::Mapping(Mapping::new())),
            _ => return,
        };
    }
    if !node.is_mapping() {
        *node = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = node {
        map.insert(Value::String(last.clone()), value);
    }
}

fn get_path<'a>(tree: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(tree, |node, segment| node.get(segment.as_str()))
}

/// Interpret an environment value the way it would read in YAML. Only
/// scalars are accepted; anything else stays a string.
fn parse_env_value(raw: &str, is_list: bool) -> Value {
    if is_list {
        return Value::Sequence(
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        );
    }
    match serde_yaml::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

/// Apply `APP_*` overrides for every known key. Returns the variables used.
fn apply_env_overrides<F>(tree: &mut Value, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut paths = Vec::new();
    leaf_paths(tree, &mut Vec::new(), &mut paths);
    for key in SCHEMA_KEYS {
        let key: Vec<String> = key.iter().map(|s| s.to_string()).collect();
        if !paths.contains(&key) {
            paths.push(key);
        }
    }

    let mut applied = Vec::new();
    for path in paths {
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        let name = env_var_name(&segments);
        let Some(raw) = lookup(&name).filter(|raw| !raw.is_empty()) else {
            continue;
        };
        let current = get_path(tree, &path);
        let is_list = LIST_KEYS.iter().any(|key| *key == segments.as_slice())
            || matches!(current, Some(Value::Sequence(_)));
        // String keys keep the text as given: `1.10` stays `1.10`.
        let value = if matches!(current, Some(Value::String(_))) {
            Value::String(raw)
        } else {
            parse_env_value(&raw, is_list)
        };
        set_path(tree, &path, value);
        applied.push(name);
    }
    applied
}

/// Loads and holds the application configuration.
#[derive(Debug)]
pub struct ConfigManager {
    defaults: Value,
    config: Option<AppConfig>,
    source: Option<PathBuf>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            defaults: defaults(),
            config: None,
            source: None,
        }
    }

    /// Find, parse, overlay and validate the configuration.
    ///
    /// `config_path` is searched before the standard directories when it is
    /// non-empty. An empty `config_name` falls back to `APP_ENV`, then `app`.
    pub fn load(&mut self, config_path: &str, config_name: &str) -> Result<&AppConfig, ConfigError> {
        let name = if config_name.is_empty() {
            crate::env::env_or_default("APP_ENV", DEFAULT_CONFIG_NAME)
        } else {
            config_name.to_string()
        };

        let path = find_config_file(config_path, &name)?;
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let file: Value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        let mut tree = self.defaults.clone();
        if !file.is_null() {
            merge(&mut tree, file);
        }
        let applied = apply_env_overrides(&mut tree, |name| std::env::var(name).ok());
        debug!(path = %path.display(), env_overrides = ?applied, "configuration layered");

        let raw: RawConfig = serde_yaml::from_value(tree).map_err(ConfigError::Deserialize)?;
        let config = validate(raw)?;

        self.source = Some(path);
        Ok(&*self.config.insert(config))
    }

    pub fn config(&self) -> Option<&AppConfig> {
        self.config.as_ref()
    }

    /// Path of the file the configuration was loaded from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn to_logger_option(&self) -> Result<LogOption, ConfigError> {
        self.config
            .as_ref()
            .map(|config| config.logger.clone())
            .ok_or(ConfigError::NotLoaded)
    }
}

fn find_config_file(config_path: &str, name: &str) -> Result<PathBuf, ConfigError> {
    let dirs = std::iter::once(config_path)
        .filter(|dir| !dir.is_empty())
        .chain(DEFAULT_SEARCH_PATHS);

    let mut searched = Vec::new();
    for dir in dirs {
        for ext in EXTENSIONS {
            let candidate = Path::new(dir).join(format!("{name}.{ext}"));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        searched.push(dir.to_string());
    }
    Err(ConfigError::NotFound {
        name: name.to_string(),
        searched,
    })
}

/// Load `dir/name.yaml`; a bare file name is looked up in `./config` first.
pub fn load_config_from_file(file_path: &str) -> Result<(AppConfig, LogOption), ConfigError> {
    let (dir, file) = match file_path.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("./config", file_path),
    };
    let name = file
        .strip_suffix(".yaml")
        .or_else(|| file.strip_suffix(".yml"))
        .unwrap_or(file);

    let mut manager = ConfigManager::new();
    let config = manager.load(dir, name)?.clone();
    let option = manager.to_logger_option()?;
    Ok((config, option))
}

/// Load `${APP_ENV}.yaml`, defaulting to `app.yaml`.
pub fn load_config_from_env() -> Result<(AppConfig, LogOption), ConfigError> {
    let env = crate::env::env_or_default("APP_ENV", DEFAULT_CONFIG_NAME);
    load_config_from_file(&format!("{env}.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn tree(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name(&["server", "port"]), "APP_SERVER_PORT");
        assert_eq!(env_var_name(&["logger", "otlp", "endpoint"]), "APP_LOGGER_OTLP_ENDPOINT");
    }

    #[test]
    fn test_merge_keeps_defaults_for_missing_keys() {
        let mut base = defaults();
        merge(&mut base, tree("server:\n  port: 9090\nlogger:\n  level: warn\n"));
        assert_eq!(base["server"]["port"].as_u64(), Some(9090));
        assert_eq!(base["server"]["name"], Value::from("config-demo"));
        assert_eq!(base["logger"]["level"], Value::from("warn"));
        assert_eq!(base["logger"]["output_paths"][0], Value::from("stdout"));
    }

    #[test]
    fn test_env_overrides_parse_scalars_and_lists() {
        let mut base = defaults();
        let env: HashMap<&str, &str> = HashMap::from([
            ("APP_SERVER_PORT", "9000"),
            ("APP_LOGGER_DEVELOPMENT", "true"),
            ("APP_LOGGER_OUTPUT_PATHS", "stdout, logs/app.log"),
            ("APP_LOGGER_OTLP_ENDPOINT", "otel-collector:4317"),
            ("APP_LOGGER_ENGINE", "native"),
        ]);
        let applied = apply_env_overrides(&mut base, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(base["server"]["port"].as_u64(), Some(9000));
        assert_eq!(base["logger"]["development"], Value::from(true));
        assert_eq!(
            base["logger"]["output_paths"],
            tree("[stdout, logs/app.log]")
        );
        assert_eq!(base["logger"]["otlp"]["endpoint"], Value::from("otel-collector:4317"));
        assert_eq!(base["logger"]["engine"], Value::from("native"));
        // APP_LOGGER_OTLP_ENDPOINT names both the shorthand and the nested key.
        assert_eq!(base["logger"]["otlp_endpoint"], Value::from("otel-collector:4317"));
        assert_eq!(applied.len(), 6);
    }

    #[test]
    fn test_env_override_keeps_text_of_string_keys() {
        let mut base = defaults();
        let env: HashMap<&str, &str> = HashMap::from([
            ("APP_SERVICE_VERSION", "1.10"),
            ("APP_SERVER_NAME", "2024"),
        ]);
        apply_env_overrides(&mut base, |name| env.get(name).map(|v| v.to_string()));
        assert_eq!(base["service"]["version"], Value::from("1.10"));
        assert_eq!(base["server"]["name"], Value::from("2024"));
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let mut base = defaults();
        apply_env_overrides(&mut base, |name| (name == "APP_SERVER_PORT").then(String::new));
        assert_eq!(base["server"]["port"].as_u64(), Some(8080));
    }

    #[test]
    fn test_parse_env_value_keeps_non_scalars_as_strings() {
        assert_eq!(parse_env_value("a: b", false), Value::from("a: b"));
        assert_eq!(parse_env_value("[1, 2]", false), Value::from("[1, 2]"));
        assert_eq!(parse_env_value("info", false), Value::from("info"));
    }

    #[test]
    fn test_to_logger_option_before_load() {
        let manager = ConfigManager::new();
        assert!(matches!(
            manager.to_logger_option(),
            Err(ConfigError::NotLoaded)
        ));
    }
}
