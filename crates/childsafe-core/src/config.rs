// Configuration loading and parsing (config/assistant.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Config file name inside `<base>/config/` and `<base>/defaults/`.
pub const CONFIG_FILE: &str = "assistant.toml";

/// Environment variable overriding `backend.url`.
pub const API_URL_ENV: &str = "CHILDSAFE_API_URL";

/// Built-in copy of `defaults/assistant.toml`, written on first run when no
/// `defaults/` directory is available.
const BUILTIN_DEFAULTS: &str = include_str!("../../../defaults/assistant.toml");

const MAX_TOP_K: u32 = 50;
const MAX_EXAMPLES: usize = 9;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Full URL of the query endpoint, e.g. `http://localhost:8888/query`.
    pub url: String,
    /// Health endpoint. Derived from `url` when omitted.
    #[serde(default)]
    pub health_url: Option<String>,
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl BackendConfig {
    /// The configured health URL, or `url` with a trailing `/query` segment
    /// replaced by `/health`.
    pub fn resolved_health_url(&self) -> String {
        if let Some(url) = &self.health_url {
            return url.clone();
        }
        let trimmed = self.url.trim_end_matches('/');
        match trimmed.strip_suffix("/query") {
            Some(base) => format!("{base}/health"),
            None => format!("{trimmed}/health"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Bot message shown when a conversation starts.
    #[serde(default)]
    pub greeting: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            title: default_title(),
            greeting: None,
            examples: Vec::new(),
        }
    }
}

fn default_title() -> String {
    "ChildSafe Assistant".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Log directory, relative to the config base directory.
    #[serde(default = "default_log_dir")]
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: default_filter(),
            directory: default_log_dir(),
        }
    }
}

fn default_filter() -> String {
    "childsafe=info,warn".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/assistant.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Ensure `config/assistant.toml` exists under `base_dir`.
///
/// Missing files are copied from `defaults/` (skipping `.example` files). When
/// neither `defaults/` nor the config file exists, the built-in default is
/// written. Returns the files that were created.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut created = Vec::new();

    if defaults_dir.is_dir() {
        let entries =
            std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to read defaults directory: {e}"),
            })?;

        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to read defaults entry: {e}"),
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name() else {
                continue;
            };
            if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
                continue;
            }
            let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to read {}: {e}", path.display()),
            })?;
            let target = config_dir.join(file_name);
            if write_new(&target, &content)? {
                created.push(target);
            }
        }
    }

    let target = config_dir.join(CONFIG_FILE);
    if !target.exists() && write_new(&target, BUILTIN_DEFAULTS.as_bytes())? {
        created.push(target);
    }

    for path in &created {
        info!("Created config file {}", path.display());
    }
    Ok(created)
}

/// Pick the directory holding `config/` and `defaults/`.
///
/// An explicit directory wins. Otherwise the current directory is used when it
/// already has a `config/` or `defaults/` directory, and the platform config
/// directory when it does not.
pub fn resolve_base_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Ok(cwd) = std::env::current_dir() {
        if cwd.join("config").is_dir() || cwd.join("defaults").is_dir() {
            return cwd;
        }
    }
    match directories::ProjectDirs::from("za.org", "ChildSafe", "childsafe-chat") {
        Some(dirs) => dirs.config_dir().to_path_buf(),
        None => PathBuf::from("."),
    }
}

/// Resolve the base directory, create missing config files, and load.
///
/// `CHILDSAFE_API_URL` is not read here: the CLI's `--url` flag falls back
/// to it and is applied afterwards with [`override_url`].
pub fn load_config(explicit_dir: Option<&Path>) -> Result<(Config, PathBuf), ConfigError> {
    let base_dir = resolve_base_dir(explicit_dir);
    ensure_config_files(&base_dir)?;
    let config = load_config_from(&base_dir)?;
    Ok((config, base_dir))
}

/// Replace the query URL, re-validating the result.
pub fn override_url(config: &mut Config, url: &str) -> Result<(), ConfigError> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(());
    }
    config.backend.url = url.to_string();
    validate(config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// Create `target` with `content` unless it already exists.
fn write_new(target: &Path, content: &[u8]) -> Result<bool, ConfigError> {
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(mut dest) => {
            std::io::Write::write_all(&mut dest, content).map_err(|e| {
                ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    check_http_url("backend.url", &config.backend.url)?;
    if let Some(url) = &config.backend.health_url {
        check_http_url("backend.health_url", url)?;
    }

    if let Some(top_k) = config.backend.top_k {
        if !(1..=MAX_TOP_K).contains(&top_k) {
            return Err(ConfigError::ValidationError {
                field: "backend.top_k".into(),
                message: format!("must be between 1 and {MAX_TOP_K}, got {top_k}"),
            });
        }
    }

    if config.backend.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "backend.timeout_secs".into(),
            message: "must be > 0".into(),
        });
    }

    let examples = &config.ui.examples;
    if examples.len() > MAX_EXAMPLES {
        return Err(ConfigError::ValidationError {
            field: "ui.examples".into(),
            message: format!("at most {MAX_EXAMPLES} examples, got {}", examples.len()),
        });
    }
    if let Some(i) = examples.iter().position(|e| e.trim().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: format!("ui.examples[{i}]"),
            message: "must not be blank".into(),
        });
    }

    Ok(())
}

fn check_http_url(field: &str, url: &str) -> Result<(), ConfigError> {
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("http://")
        .or_else(|| lower.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ConfigError::ValidationError {
            field: field.into(),
            message: format!("must be an http(s) URL, got {url:?}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Fresh scratch directory with an empty `config/`.
    fn scratch(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("childsafe_config_{name}"));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    fn write_config(base: &Path, text: &str) {
        fs::write(base.join("config").join(CONFIG_FILE), text).unwrap();
    }

    fn minimal(extra: &str) -> String {
        format!("[backend]\nurl = \"http://localhost:8888/query\"\n{extra}")
    }

    #[test]
    fn builtin_defaults_load() {
        let tmp = scratch("builtin");
        write_config(&tmp, BUILTIN_DEFAULTS);
        let config = load_config_from(&tmp).expect("defaults should be valid");

        assert_eq!(config.backend.url, "http://localhost:8888/query");
        assert_eq!(config.backend.top_k, Some(5));
        assert_eq!(config.backend.timeout_secs, Some(60));
        assert_eq!(config.ui.title, "ChildSafe Assistant");
        assert!(config.ui.greeting.is_some());
        assert_eq!(config.ui.examples.len(), 4);
        assert_eq!(config.logging.directory, "logs");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn minimal_config_uses_section_defaults() {
        let tmp = scratch("minimal");
        write_config(&tmp, &minimal(""));
        let config = load_config_from(&tmp).unwrap();

        assert_eq!(config.backend.top_k, None);
        assert_eq!(config.backend.timeout_secs, None);
        assert_eq!(config.ui.title, "ChildSafe Assistant");
        assert!(config.ui.examples.is_empty());
        assert_eq!(config.logging.filter, "childsafe=info,warn");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn health_url_is_derived_from_query_url() {
        let mut backend = BackendConfig {
            url: "http://localhost:8888/query".into(),
            health_url: None,
            top_k: None,
            timeout_secs: None,
        };
        assert_eq!(backend.resolved_health_url(), "http://localhost:8888/health");

        backend.url = "https://chat.example/api/query/".into();
        assert_eq!(backend.resolved_health_url(), "https://chat.example/api/health");

        backend.url = "https://chat.example/ask".into();
        assert_eq!(backend.resolved_health_url(), "https://chat.example/ask/health");

        backend.health_url = Some("https://status.example/ok".into());
        assert_eq!(backend.resolved_health_url(), "https://status.example/ok");
    }

    #[test]
    fn rejects_non_http_url() {
        let tmp = scratch("bad_url");
        write_config(&tmp, "[backend]\nurl = \"localhost:8888/query\"\n");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "backend.url"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_top_k_out_of_range() {
        let tmp = scratch("top_k");
        write_config(&tmp, &minimal("top_k = 0\n"));
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "backend.top_k"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        write_config(&tmp, &minimal("top_k = 51\n"));
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ValidationError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_timeout() {
        let tmp = scratch("timeout");
        write_config(&tmp, &minimal("timeout_secs = 0\n"));
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "backend.timeout_secs")
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_blank_example() {
        let tmp = scratch("blank_example");
        write_config(&tmp, &minimal("\n[ui]\nexamples = [\"Who is ChildSafe?\", \"  \"]\n"));
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "ui.examples[1]"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_too_many_examples() {
        let tmp = scratch("many_examples");
        let list: Vec<String> = (0..10).map(|i| format!("\"q{i}\"")).collect();
        write_config(&tmp, &minimal(&format!("\n[ui]\nexamples = [{}]\n", list.join(", "))));
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "ui.examples"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_when_config_missing() {
        let tmp = scratch("missing");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch("invalid");
        write_config(&tmp, "this is not valid [[[ toml");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn override_url_revalidates() {
        let tmp = scratch("override");
        write_config(&tmp, &minimal(""));
        let mut config = load_config_from(&tmp).unwrap();

        override_url(&mut config, " https://assistant.example/query ").unwrap();
        assert_eq!(config.backend.url, "https://assistant.example/query");

        override_url(&mut config, "").unwrap();
        assert_eq!(config.backend.url, "https://assistant.example/query");

        assert!(override_url(&mut config, "ftp://nope").is_err());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_config_ignores_url_environment() {
        let tmp = scratch("load_ignores_env");
        write_config(&tmp, &minimal(""));
        std::env::set_var(API_URL_ENV, "not a url");

        let result = load_config(Some(&tmp));
        std::env::remove_var(API_URL_ENV);

        let (mut config, base) = result.expect("env value must not be validated here");
        assert_eq!(base, tmp);
        assert_eq!(config.backend.url, "http://localhost:8888/query");
        override_url(&mut config, "http://10.0.0.5:8888/query").unwrap();
        assert_eq!(config.backend.url, "http://10.0.0.5:8888/query");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_from_defaults() {
        let tmp = std::env::temp_dir().join("childsafe_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::write(defaults_dir.join(CONFIG_FILE), minimal("top_k = 7\n")).unwrap();
        fs::write(defaults_dir.join("assistant.toml.example"), "# template\n").unwrap();

        let created = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(created.len(), 1);
        assert!(!tmp.join("config/assistant.toml.example").exists());

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.backend.top_k, Some(7));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_keeps_existing() {
        let tmp = scratch("ensure_keeps");
        write_config(&tmp, "# custom\n");

        let created = ensure_config_files(&tmp).expect("should succeed");
        assert!(created.is_empty());
        let content = fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_writes_builtin_without_defaults() {
        let tmp = std::env::temp_dir().join("childsafe_config_ensure_builtin");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let created = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(created.len(), 1);
        let config = load_config_from(&tmp).expect("built-in defaults should load");
        assert_eq!(config.backend.url, "http://localhost:8888/query");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn explicit_base_dir_wins() {
        let dir = Path::new("/srv/childsafe");
        assert_eq!(resolve_base_dir(Some(dir)), dir.to_path_buf());
    }
}
