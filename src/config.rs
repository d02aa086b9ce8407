//! Configuration loading and command building.
//!
//! The config file lists the sources that can be tailed and the shell
//! command that streams each one's logs. It is plain JSON:
//!
//! ```json
//! {
//!   "max_lines": 10000,
//!   "max_line_bytes": 1048576,
//!   "tail": "100",
//!   "sources": {
//!     "api": {
//!       "command": "docker compose logs -f --tail {tail} api",
//!       "plain_command": "docker compose logs --tail {tail} api",
//!       "cwd": "~/src/shop",
//!       "env": { "COMPOSE_ANSI": "never" }
//!     }
//!   }
//! }
//! ```
//!
//! Lookup order: explicit path, `LOGDECK_CONFIG`, `./logdeck.json`, then
//! `<config dir>/logdeck/config.json`. A missing file means no sources.

// Rust guideline compliant 2026-01

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TAIL, MAX_LINES, MAX_LINE_BYTES};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "logdeck.json";

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "LOGDECK_CONFIG";

/// Tail value meaning "the whole history".
pub const TAIL_ALL: &str = "all";

fn default_max_lines() -> usize {
    MAX_LINES
}

fn default_max_line_bytes() -> usize {
    MAX_LINE_BYTES
}

fn default_tail() -> String {
    DEFAULT_TAIL.to_string()
}

/// How to tail one source.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceConfig {
    /// Shell command streaming the source's logs (`{name}`, `{tail}`
    /// are substituted).
    pub command: String,
    /// Command for `--no-tui` mode; defaults to `command`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_command: Option<String>,
    /// Working directory; `~` is expanded, relative paths resolve against
    /// the config file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Extra environment variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Configuration for logdeck.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Lines retained per tab.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
    /// Longest line kept; the rest of a longer line is dropped.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Default `--tail` value.
    #[serde(default = "default_tail")]
    pub tail: String,
    /// Sources by display name.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
    /// Directory of the file this was loaded from.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_lines: MAX_LINES,
            max_line_bytes: MAX_LINE_BYTES,
            tail: default_tail(),
            sources: BTreeMap::new(),
            base_dir: None,
        }
    }
}

impl Config {
    /// Load configuration, applying environment overrides.
    ///
    /// `explicit` (from `--config`) must exist if given; so must a file
    /// named by `LOGDECK_CONFIG`. Otherwise the first existing default
    /// location is used, or an empty config if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if a named file is missing, a file cannot be read
    /// or parsed, or the result fails validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_path(explicit)? {
            Some(path) => {
                log::info!("loading config from {}", path.display());
                Self::load_from_path(&path)?
            }
            None => {
                log::info!("no config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Find the config file to use, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file does not exist.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            return Ok(Some(path.to_path_buf()));
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if !path.is_file() {
                bail!("config file not found: {} (from {CONFIG_ENV})", path.display());
            }
            return Ok(Some(path));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Ok(Some(local));
        }
        Ok(dirs::config_dir()
            .map(|dir| dir.join("logdeck").join("config.json"))
            .filter(|path| path.is_file()))
    }

    /// Parse a config file without applying overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(|dir| if dir.as_os_str().is_empty() { Path::new(".") } else { dir })
            .map(Path::to_path_buf);
        Ok(config)
    }

    /// Apply `LOGDECK_MAX_LINES`, `LOGDECK_MAX_LINE_BYTES` and `LOGDECK_TAIL`.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric override is not a number.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("LOGDECK_MAX_LINES") {
            self.max_lines = value
                .trim()
                .parse()
                .with_context(|| format!("invalid LOGDECK_MAX_LINES: {value:?}"))?;
        }
        if let Some(value) = lookup("LOGDECK_MAX_LINE_BYTES") {
            self.max_line_bytes = value
                .trim()
                .parse()
                .with_context(|| format!("invalid LOGDECK_MAX_LINE_BYTES: {value:?}"))?;
        }
        if let Some(value) = lookup("LOGDECK_TAIL") {
            self.tail = value;
        }
        Ok(())
    }

    /// Check limits and that every source is runnable.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.max_lines == 0 {
            bail!("max_lines must be greater than 0");
        }
        if self.max_line_bytes == 0 {
            bail!("max_line_bytes must be greater than 0");
        }
        validate_tail(&self.tail)?;
        for (name, source) in &self.sources {
            if name.trim().is_empty() {
                bail!("source names must not be empty");
            }
            if source.command.trim().is_empty() {
                bail!("source {name} has an empty command");
            }
        }
        Ok(())
    }

    /// Configured source names, sorted.
    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    /// Resolve the sources to show: all of them if `requested` is empty,
    /// otherwise exactly the requested ones, in the order given.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first unknown source.
    pub fn select(&self, requested: &[String]) -> Result<Vec<String>> {
        if requested.is_empty() {
            return Ok(self.source_names());
        }
        for name in requested {
            if !self.sources.contains_key(name) {
                bail!(
                    "unknown source: {name} (available: {})",
                    self.source_names().join(", ")
                );
            }
        }
        Ok(requested.to_vec())
    }

    /// Tail value for the interactive viewer.
    ///
    /// `all` is replaced by the configured default, and a configured `all`
    /// by [`DEFAULT_TAIL`], so startup stays fast.
    #[must_use]
    pub fn viewer_tail(&self, flag: Option<&str>) -> String {
        match flag {
            Some(tail) if tail != TAIL_ALL => tail.to_string(),
            _ if self.tail != TAIL_ALL => self.tail.clone(),
            _ => DEFAULT_TAIL.to_string(),
        }
    }

    /// Build the streaming command for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not configured.
    pub fn command_for(&self, name: &str, tail: &str) -> Result<Command> {
        let source = self.source(name)?;
        Ok(self.shell_command(name, source, &source.command, tail))
    }

    /// Build the one-shot command used by plain mode.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not configured.
    pub fn plain_command_for(&self, name: &str, tail: &str) -> Result<Command> {
        let source = self.source(name)?;
        let template = source.plain_command.as_deref().unwrap_or(&source.command);
        Ok(self.shell_command(name, source, template, tail))
    }

    fn source(&self, name: &str) -> Result<&SourceConfig> {
        self.sources
            .get(name)
            .with_context(|| format!("unknown source: {name}"))
    }

    fn shell_command(&self, name: &str, source: &SourceConfig, template: &str, tail: &str) -> Command {
        let script = expand_template(template, name, tail);
        log::debug!("[{name}] command: {script}");

        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        if let Some(cwd) = &source.cwd {
            command.current_dir(self.resolve_cwd(cwd));
        }
        command.envs(&source.env);
        command
    }

    /// Expand `~` and anchor relative paths at the config directory.
    fn resolve_cwd(&self, cwd: &str) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(cwd).as_ref());
        match &self.base_dir {
            Some(base) if expanded.is_relative() => base.join(expanded),
            _ => expanded,
        }
    }
}

/// Substitute `{name}` and `{tail}` in a command template.
#[must_use]
pub fn expand_template(template: &str, name: &str, tail: &str) -> String {
    template.replace("{name}", name).replace("{tail}", tail)
}

/// Accept `all` or a non-negative line count.
///
/// # Errors
///
/// Returns an error for anything else.
pub fn validate_tail(tail: &str) -> Result<()> {
    if tail == TAIL_ALL || (!tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit())) {
        Ok(())
    } else {
        bail!("invalid tail value {tail:?} (expected a number or \"all\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::OsStr;

    fn write_config(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("logdeck.json");
        fs::write(&path, json).unwrap();
        path
    }

    fn args(command: &Command) -> Vec<&OsStr> {
        command.get_args().collect()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_lines, MAX_LINES);
        assert_eq!(config.max_line_bytes, MAX_LINE_BYTES);
        assert_eq!(config.tail, "100");
        assert!(config.sources.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_minimal_file_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{"sources": {"api": {"command": "echo hi"}}}"#);
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.max_lines, MAX_LINES);
        assert_eq!(config.max_line_bytes, MAX_LINE_BYTES);
        assert_eq!(config.tail, "100");
        assert_eq!(config.source_names(), vec!["api"]);
        assert_eq!(config.base_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_source_names_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"sources": {"web": {"command": "a"}, "api": {"command": "b"}, "db": {"command": "c"}}}"#,
        );
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.source_names(), vec!["api", "db", "web"]);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::resolve_path(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "{ not json");
        let err = Config::load_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.max_lines = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.max_line_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_line_bytes"));

        let mut config = Config::default();
        config.sources.insert("api".into(), SourceConfig::default());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("empty command"));

        let mut config = Config::default();
        config.tail = "ten".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("LOGDECK_MAX_LINES", "500"),
            ("LOGDECK_MAX_LINE_BYTES", " 4096 "),
            ("LOGDECK_TAIL", "all"),
        ]
        .into();
        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(ToString::to_string))
            .unwrap();
        assert_eq!(config.max_lines, 500);
        assert_eq!(config.max_line_bytes, 4096);
        assert_eq!(config.tail, "all");

        let mut config = Config::default();
        assert!(config
            .apply_overrides(|key| (key == "LOGDECK_MAX_LINES").then(|| "lots".to_string()))
            .is_err());
        assert!(config
            .apply_overrides(|key| (key == "LOGDECK_MAX_LINE_BYTES").then(|| "-1".to_string()))
            .is_err());
    }

    #[test]
    fn test_select() {
        let mut config = Config::default();
        for name in ["api", "db"] {
            config.sources.insert(name.into(), SourceConfig { command: "x".into(), ..Default::default() });
        }
        assert_eq!(config.select(&[]).unwrap(), vec!["api", "db"]);
        assert_eq!(config.select(&["db".into()]).unwrap(), vec!["db"]);
        let err = config.select(&["web".into()]).unwrap_err();
        assert!(err.to_string().contains("unknown source: web"));
    }

    #[test]
    fn test_viewer_tail() {
        let config = Config::default();
        assert_eq!(config.viewer_tail(None), "100");
        assert_eq!(config.viewer_tail(Some("all")), "100");
        assert_eq!(config.viewer_tail(Some("20")), "20");
    }

    #[test]
    fn test_viewer_tail_never_streams_everything() {
        let mut config = Config::default();
        config.tail = TAIL_ALL.into();
        assert_eq!(config.viewer_tail(None), DEFAULT_TAIL);
        assert_eq!(config.viewer_tail(Some("all")), DEFAULT_TAIL);
        assert_eq!(config.viewer_tail(Some("5")), "5");
    }

    #[test]
    fn test_max_line_bytes_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{"max_line_bytes": 256, "sources": {}}"#);
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.max_line_bytes, 256);
        config.validate().unwrap();
    }

    #[test]
    fn test_command_for_expands_template() {
        let mut config = Config::default();
        config.sources.insert(
            "api".into(),
            SourceConfig {
                command: "tail -n {tail} -f /var/log/{name}.log".into(),
                plain_command: Some("tail -n {tail} /var/log/{name}.log".into()),
                ..Default::default()
            },
        );

        let command = config.command_for("api", "50").unwrap();
        assert_eq!(command.get_program(), "sh");
        assert_eq!(args(&command), vec!["-c", "tail -n 50 -f /var/log/api.log"]);

        let plain = config.plain_command_for("api", "all").unwrap();
        assert_eq!(args(&plain), vec!["-c", "tail -n all /var/log/api.log"]);

        assert!(config.command_for("web", "50").is_err());
    }

    #[test]
    fn test_plain_command_defaults_to_command() {
        let mut config = Config::default();
        config
            .sources
            .insert("api".into(), SourceConfig { command: "echo {name}".into(), ..Default::default() });
        let plain = config.plain_command_for("api", "1").unwrap();
        assert_eq!(args(&plain), vec!["-c", "echo api"]);
    }

    #[test]
    fn test_relative_cwd_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"sources": {"api": {"command": "pwd", "cwd": "services/api", "env": {"A": "1"}}}}"#,
        );
        let config = Config::load_from_path(&path).unwrap();
        let command = config.command_for("api", "1").unwrap();
        assert_eq!(command.get_current_dir(), Some(dir.path().join("services/api").as_path()));
        let envs: Vec<_> = command.get_envs().collect();
        assert_eq!(envs, vec![(OsStr::new("A"), Some(OsStr::new("1")))]);
    }

    #[test]
    fn test_absolute_cwd_is_kept() {
        let mut config = Config::default();
        config.base_dir = Some(PathBuf::from("/etc"));
        config.sources.insert(
            "api".into(),
            SourceConfig { command: "pwd".into(), cwd: Some("/tmp".into()), ..Default::default() },
        );
        let command = config.command_for("api", "1").unwrap();
        assert_eq!(command.get_current_dir(), Some(Path::new("/tmp")));
    }

    #[test]
    fn test_validate_tail() {
        assert!(validate_tail("all").is_ok());
        assert!(validate_tail("0").is_ok());
        assert!(validate_tail("250").is_ok());
        assert!(validate_tail("").is_err());
        assert!(validate_tail("-5").is_err());
    }
}
