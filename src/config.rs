//! Run settings for the command-line tool.
//!
//! Each setting is resolved from, in order: command-line flags, environment
//! variables, the `[run]` section of `tapebf.toml` in the user's config
//! directory, and built-in defaults.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use cross_xdg::BaseDirs;
use tracing::Level;

use crate::resolve::MatchStrategy;

pub const ENV_TIMEOUT_MS: &str = "TAPEBF_TIMEOUT_MS";
pub const ENV_MAX_STEPS: &str = "TAPEBF_MAX_STEPS";
pub const ENV_RESOLVER: &str = "TAPEBF_RESOLVER";
pub const ENV_LOG: &str = "TAPEBF_LOG";

pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_LOG_LEVEL: Level = Level::WARN;

const CONFIG_FILE: &str = "tapebf.toml";

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub timeout_ms: Option<u64>,
    pub max_steps: Option<usize>,
    pub resolver: Option<MatchStrategy>,
    /// `--debug`: log every dispatched instruction.
    pub debug: bool,
}

/// Values found in the `[run]` section of the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    pub timeout_ms: Option<u64>,
    pub max_steps: Option<usize>,
    pub resolver: Option<MatchStrategy>,
    pub log_level: Option<Level>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Explicit wall-clock limit; see [`RunSettings::wall_clock_limit`].
    pub timeout_ms: Option<u64>,
    pub max_steps: Option<usize>,
    pub resolver: MatchStrategy,
    pub log_level: Level,
    /// Values that were present but unusable, to be logged once logging is up.
    pub warnings: Vec<String>,
}

impl RunSettings {
    /// Resolve against the process environment and the user's config file.
    pub fn resolve(overrides: &RunOverrides) -> Self {
        let file = load_file_config().unwrap_or_default();
        Self::resolve_with(overrides, |key| std::env::var(key).ok(), &file)
    }

    /// Resolve with an explicit environment lookup and file config.
    pub fn resolve_with<E>(overrides: &RunOverrides, env: E, file: &FileConfig) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();
        let from_env = |key: &str| -> Option<String> {
            let raw = env(key)?;
            let trimmed = raw.trim();
            if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
        };

        let timeout_ms = overrides
            .timeout_ms
            .or_else(|| parse_or_warn(ENV_TIMEOUT_MS, from_env(ENV_TIMEOUT_MS), &mut warnings))
            .or(file.timeout_ms);

        let max_steps = overrides
            .max_steps
            .or_else(|| parse_or_warn(ENV_MAX_STEPS, from_env(ENV_MAX_STEPS), &mut warnings))
            .or(file.max_steps);

        let resolver = overrides
            .resolver
            .or_else(|| parse_or_warn(ENV_RESOLVER, from_env(ENV_RESOLVER), &mut warnings))
            .or(file.resolver)
            .unwrap_or_default();

        let log_level = if overrides.debug {
            Level::TRACE
        } else {
            parse_or_warn(ENV_LOG, from_env(ENV_LOG), &mut warnings)
                .or(file.log_level)
                .unwrap_or(DEFAULT_LOG_LEVEL)
        };

        Self {
            timeout_ms,
            max_steps,
            resolver,
            log_level,
            warnings,
        }
    }

    /// Wall-clock limit for a run. An explicit timeout always applies. The
    /// default only applies when `,` cannot be waiting on someone typing.
    pub fn wall_clock_limit(&self, interactive_input: bool) -> Option<Duration> {
        match self.timeout_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None if interactive_input => None,
            None => Some(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
        }
    }
}

fn parse_or_warn<T: FromStr>(name: &str, raw: Option<String>, warnings: &mut Vec<String>) -> Option<T> {
    let raw = raw?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warnings.push(format!("ignoring {name}={raw:?}: not a valid value"));
            None
        }
    }
}

/// Path of the config file, e.g. `~/.config/tapebf.toml` on Linux and macOS.
pub fn config_path() -> Option<PathBuf> {
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push(CONFIG_FILE);
    Some(path)
}

fn load_file_config() -> Option<FileConfig> {
    let content = fs::read_to_string(config_path()?).ok()?;
    Some(parse_config(&content))
}

/// Parse the `[run]` section of a config file.
///
/// Only flat `key = value` lines are understood; values may be quoted.
/// Unknown keys, other sections and unparsable values are skipped.
pub fn parse_config(content: &str) -> FileConfig {
    let mut in_run = false;
    let mut map: HashMap<String, String> = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_run = line[1..line.len() - 1].trim() == "run";
            continue;
        }
        if !in_run {
            continue;
        }
        if let Some((key, val_raw)) = line.split_once('=') {
            let val_raw = val_raw.trim();
            let val = val_raw
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(val_raw);
            map.insert(key.trim().to_string(), val.to_string());
        }
    }

    fn get<T: FromStr>(map: &HashMap<String, String>, key: &str) -> Option<T> {
        map.get(key).and_then(|v| v.parse().ok())
    }

    FileConfig {
        timeout_ms: get(&map, "timeout_ms"),
        max_steps: get(&map, "max_steps"),
        resolver: get(&map, "resolver"),
        log_level: get(&map, "log_level"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = RunSettings::resolve_with(&RunOverrides::default(), no_env, &FileConfig::default());
        assert_eq!(s.timeout_ms, None);
        assert_eq!(s.max_steps, None);
        assert_eq!(s.resolver, MatchStrategy::Table);
        assert_eq!(s.log_level, Level::WARN);
        assert!(s.warnings.is_empty());
    }

    #[test]
    fn flags_beat_env_beat_file() {
        let file = FileConfig {
            timeout_ms: Some(10),
            max_steps: Some(20),
            resolver: Some(MatchStrategy::Scan),
            log_level: Some(Level::INFO),
        };
        let env = |key: &str| match key {
            ENV_TIMEOUT_MS => Some("30".to_string()),
            ENV_MAX_STEPS => Some("40".to_string()),
            _ => None,
        };
        let flags = RunOverrides {
            timeout_ms: Some(50),
            ..RunOverrides::default()
        };

        let s = RunSettings::resolve_with(&flags, env, &file);
        assert_eq!(s.timeout_ms, Some(50));
        assert_eq!(s.max_steps, Some(40));
        assert_eq!(s.resolver, MatchStrategy::Scan);
        assert_eq!(s.log_level, Level::INFO);
    }

    #[test]
    fn bad_env_values_fall_through_with_a_warning() {
        let env = |key: &str| (key == ENV_MAX_STEPS).then(|| "lots".to_string());
        let file = FileConfig {
            max_steps: Some(7),
            ..FileConfig::default()
        };
        let s = RunSettings::resolve_with(&RunOverrides::default(), env, &file);
        assert_eq!(s.max_steps, Some(7));
        assert_eq!(s.warnings.len(), 1);
        assert!(s.warnings[0].contains(ENV_MAX_STEPS));
    }

    #[test]
    fn default_timeout_is_skipped_for_interactive_input() {
        let s = RunSettings::resolve_with(&RunOverrides::default(), no_env, &FileConfig::default());
        assert_eq!(s.wall_clock_limit(true), None);
        assert_eq!(
            s.wall_clock_limit(false),
            Some(Duration::from_millis(DEFAULT_TIMEOUT_MS))
        );
    }

    #[test]
    fn explicit_timeout_applies_to_interactive_input() {
        let env = |key: &str| (key == ENV_TIMEOUT_MS).then(|| "250".to_string());
        let s = RunSettings::resolve_with(&RunOverrides::default(), env, &FileConfig::default());
        assert_eq!(s.wall_clock_limit(true), Some(Duration::from_millis(250)));
        assert_eq!(s.wall_clock_limit(false), Some(Duration::from_millis(250)));
    }

    #[test]
    fn debug_flag_forces_trace_logging() {
        let env = |key: &str| (key == ENV_LOG).then(|| "error".to_string());
        let flags = RunOverrides {
            debug: true,
            ..RunOverrides::default()
        };
        let s = RunSettings::resolve_with(&flags, env, &FileConfig::default());
        assert_eq!(s.log_level, Level::TRACE);
    }

    #[test]
    fn parses_run_section_only() {
        let cfg = parse_config(
            r#"
# tapebf settings
[colors]
timeout_ms = 1

[run]
timeout_ms = 500
max_steps = "1000"
resolver = "scan"
log_level = debug
unknown = 3
"#,
        );
        assert_eq!(
            cfg,
            FileConfig {
                timeout_ms: Some(500),
                max_steps: Some(1000),
                resolver: Some(MatchStrategy::Scan),
                log_level: Some(Level::DEBUG),
            }
        );
    }

    #[test]
    fn unparsable_file_values_are_skipped() {
        let cfg = parse_config("[run]\ntimeout_ms = soon\nresolver = jit\n");
        assert_eq!(cfg, FileConfig::default());
    }
}
