use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::protocol::ReconnectPolicy;
use crate::results::DEFAULT_MAX_SNIPPETS;

pub const DEFAULT_SERVER: &str = "127.0.0.1:9020";
pub const DEFAULT_RECONNECT_INITIAL_MS: u64 = 250;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 8000;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub server: Option<String>,
    pub subpath: Option<String>,
    pub edit: bool,
    pub reconnect: bool,
    pub reconnect_initial_ms: Option<u64>,
    pub reconnect_max_ms: Option<u64>,
    pub max_snippets: Option<usize>,
    pub wire_log: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            server: other.server.clone().or_else(|| self.server.clone()),
            subpath: other.subpath.clone().or_else(|| self.subpath.clone()),
            edit: self.edit || other.edit,
            reconnect: self.reconnect || other.reconnect,
            reconnect_initial_ms: other.reconnect_initial_ms.or(self.reconnect_initial_ms),
            reconnect_max_ms: other.reconnect_max_ms.or(self.reconnect_max_ms),
            max_snippets: other.max_snippets.or(self.max_snippets),
            wire_log: other.wire_log.clone().or_else(|| self.wire_log.clone()),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }

    pub fn server(&self) -> &str {
        self.server.as_deref().unwrap_or(DEFAULT_SERVER)
    }

    pub fn subpath(&self) -> &str {
        self.subpath.as_deref().unwrap_or_default()
    }

    pub fn max_snippets(&self) -> usize {
        self.max_snippets.unwrap_or(DEFAULT_MAX_SNIPPETS)
    }

    /// Reconnect policy; the backoff bounds only matter with `--reconnect`.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        if !self.reconnect {
            return ReconnectPolicy::Disabled;
        }
        let initial = self
            .reconnect_initial_ms
            .unwrap_or(DEFAULT_RECONNECT_INITIAL_MS);
        let max = self.reconnect_max_ms.unwrap_or(DEFAULT_RECONNECT_MAX_MS).max(initial);
        ReconnectPolicy::Backoff {
            initial: Duration::from_millis(initial),
            max: Duration::from_millis(max),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("fuzzynote").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("fuzzynote")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("fuzzynote").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("fuzzynote")
                .join("config");
        }
    }

    PathBuf::from(".fuzzynoterc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".fuzzynoterc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# fuzzynote defaults (saved with --save)".to_string());
    if let Some(server) = &flags.server {
        lines.push(format!("--server {server}"));
    }
    if let Some(subpath) = &flags.subpath {
        lines.push(format!("--subpath {subpath}"));
    }
    if flags.edit {
        lines.push("--edit".to_string());
    }
    if flags.reconnect {
        lines.push("--reconnect".to_string());
    }
    if let Some(ms) = flags.reconnect_initial_ms {
        lines.push(format!("--reconnect-initial-ms {ms}"));
    }
    if let Some(ms) = flags.reconnect_max_ms {
        lines.push(format!("--reconnect-max-ms {ms}"));
    }
    if let Some(n) = flags.max_snippets {
        lines.push(format!("--max-snippets {n}"));
    }
    if let Some(path) = &flags.wire_log {
        lines.push(format!("--wire-log {}", path.display()));
    }
    if let Some(path) = &flags.log_file {
        lines.push(format!("--log-file {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pull known flags out of a token list, accepting `--flag value` and
/// `--flag=value`. Unknown tokens and unparseable values are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        match name {
            "--edit" => flags.edit = true,
            "--reconnect" => flags.reconnect = true,
            "--server" | "--subpath" | "--reconnect-initial-ms" | "--reconnect-max-ms"
            | "--max-snippets" | "--wire-log" | "--log-file" => {
                let value = match inline {
                    Some(value) => Some(value),
                    None => {
                        let next = tokens.get(i + 1).map(String::as_str);
                        if next.is_some() {
                            i += 1;
                        }
                        next
                    }
                };
                if let Some(value) = value {
                    apply_value(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--server" => flags.server = Some(value.to_string()),
        "--subpath" => flags.subpath = Some(value.to_string()),
        "--reconnect-initial-ms" => flags.reconnect_initial_ms = value.parse().ok(),
        "--reconnect-max-ms" => flags.reconnect_max_ms = value.parse().ok(),
        "--max-snippets" => flags.max_snippets = value.parse().ok(),
        "--wire-log" => flags.wire_log = Some(PathBuf::from(value)),
        "--log-file" => flags.log_file = Some(PathBuf::from(value)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "fuzzynote",
            "--server",
            "notes.local:9020",
            "--edit",
            "--reconnect",
            "--reconnect-initial-ms=100",
            "--max-snippets",
            "3",
            "--wire-log=wire.log",
            "--log-file",
            "fuzzynote.log",
            "stray",
        ]);
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.server.as_deref(), Some("notes.local:9020"));
        assert!(flags.edit);
        assert!(flags.reconnect);
        assert_eq!(flags.reconnect_initial_ms, Some(100));
        assert_eq!(flags.max_snippets, Some(3));
        assert_eq!(flags.wire_log, Some(PathBuf::from("wire.log")));
        assert_eq!(flags.log_file, Some(PathBuf::from("fuzzynote.log")));
        assert_eq!(flags.subpath, None);
    }

    #[test]
    fn test_parse_ignores_bad_numbers() {
        let flags = parse_flag_tokens(&tokens(&["--max-snippets", "many"]));
        assert_eq!(flags.max_snippets, None);
        assert_eq!(flags.max_snippets(), DEFAULT_MAX_SNIPPETS);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            edit: true,
            server: Some("a:1".to_string()),
            max_snippets: Some(2),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            reconnect: true,
            server: Some("b:2".to_string()),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.edit);
        assert!(merged.reconnect);
        assert_eq!(merged.server(), "b:2");
        assert_eq!(merged.max_snippets(), 2);
    }

    #[test]
    fn test_defaults() {
        let flags = ConfigFlags::default();
        assert_eq!(flags.server(), DEFAULT_SERVER);
        assert_eq!(flags.subpath(), "");
        assert_eq!(flags.reconnect_policy(), ReconnectPolicy::Disabled);
    }

    #[test]
    fn test_reconnect_policy_uses_bounds() {
        let flags = ConfigFlags {
            reconnect: true,
            reconnect_initial_ms: Some(500),
            reconnect_max_ms: Some(100),
            ..ConfigFlags::default()
        };
        assert_eq!(
            flags.reconnect_policy(),
            ReconnectPolicy::Backoff {
                initial: Duration::from_millis(500),
                max: Duration::from_millis(500),
            }
        );
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".fuzzynoterc");
        let flags = ConfigFlags {
            server: Some("notes.local:9020".to_string()),
            subpath: Some("team".to_string()),
            edit: true,
            reconnect: true,
            reconnect_initial_ms: Some(100),
            reconnect_max_ms: Some(2000),
            max_snippets: Some(4),
            wire_log: Some(PathBuf::from("wire.log")),
            log_file: Some(PathBuf::from("fuzzynote.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let loaded = load_config_flags(&dir.path().join("missing")).unwrap();
        assert_eq!(loaded, ConfigFlags::default());
    }
}
