//! Configuration reading.
//!
//! Config files are git's INI-like format. Two scopes are merged: the
//! user-scope file (`~/.gitconfig`) underlays the repo-scope file
//! (`<git_dir>/config`); a missing file is the same as an empty one.
//! Keys flatten to `"section.key"` with section and key lowercased.

mod parse;
pub mod types;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use types::{parse_bool, AutoCrlf};

/// Errors from config parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error in {file} line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("forbidden config key: {0}")]
    ForbiddenKey(String),

    #[error("invalid boolean config value: {0}")]
    InvalidBool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A flattened, merged key-value view of the configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    entries: HashMap<String, String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single config file's bytes.
    pub fn from_bytes(data: &[u8], filename: &str) -> Result<Self, ConfigError> {
        let entries = parse::parse_flat(data, filename)?;
        Ok(Self { entries })
    }

    /// Load and merge the user-scope and repo-scope files for a repository.
    pub fn load(git_dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Some(path) = user_config_path() {
            config.merge_file(&path)?;
        }
        config.merge_file(&git_dir.join("config"))?;

        Ok(config)
    }

    /// Parse `path` and overlay its entries; a missing file is a no-op.
    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let parsed = parse::parse_flat(&data, &path.display().to_string())?;
        self.entries.extend(parsed);
        Ok(())
    }

    /// Look up a flattened key like `"core.autocrlf"`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // --- Typed options ---

    /// `core.autocrlf`: governs line-ending normalization on hash/write.
    pub fn auto_crlf(&self) -> AutoCrlf {
        AutoCrlf::from_value(self.get("core.autocrlf"))
    }

    /// `core.ignorecase`: case folding for ignore-rule matching.
    pub fn ignore_case(&self) -> bool {
        self.get("core.ignorecase")
            .map(|v| parse_bool(v).unwrap_or(false))
            .unwrap_or(false)
    }

    /// `user.name` (read but not consumed by the read side).
    pub fn user_name(&self) -> Option<&str> {
        self.get("user.name")
    }

    /// `user.email` (read but not consumed by the read side).
    pub fn user_email(&self) -> Option<&str> {
        self.get("user.email")
    }

    /// `commit.gpgsign` (read but not consumed by the read side).
    pub fn commit_gpg_sign(&self) -> bool {
        self.get("commit.gpgsign")
            .map(|v| parse_bool(v).unwrap_or(false))
            .unwrap_or(false)
    }

    /// `init.defaultbranch` (read but not consumed by the read side).
    pub fn default_branch(&self) -> Option<&str> {
        self.get("init.defaultbranch")
    }
}

/// The user-scope config path: `$HOME/.gitconfig`, or `%USERPROFILE%` on
/// Windows.
fn user_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(".gitconfig"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattened_lookup() {
        let config =
            Config::from_bytes(b"[core]\n\tautocrlf = input\n\tignorecase = true\n", "<test>")
                .unwrap();
        assert_eq!(config.get("core.autocrlf"), Some("input"));
        assert_eq!(config.auto_crlf(), AutoCrlf::Input);
        assert!(config.ignore_case());
    }

    #[test]
    fn missing_keys_default() {
        let config = Config::new();
        assert_eq!(config.auto_crlf(), AutoCrlf::Off);
        assert!(!config.ignore_case());
        assert!(!config.commit_gpg_sign());
        assert!(config.user_name().is_none());
    }

    #[test]
    fn repo_scope_overlays_user_scope() {
        let mut config =
            Config::from_bytes(b"[user]\n\tname = Global\n\temail = g@x.io\n", "<user>").unwrap();
        let repo = parse::parse_flat(b"[user]\n\tname = Local\n", "<repo>").unwrap();
        config.entries.extend(repo);

        assert_eq!(config.user_name(), Some("Local"));
        assert_eq!(config.user_email(), Some("g@x.io"));
    }

    #[test]
    fn load_merges_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path().join(".git");
        std::fs::create_dir_all(&git_dir).unwrap();
        std::fs::write(git_dir.join("config"), "[core]\n\tautocrlf = true\n").unwrap();

        let config = Config::load(&git_dir).unwrap();
        assert_eq!(config.auto_crlf(), AutoCrlf::On);
    }

    #[test]
    fn missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        // Nothing from the repo scope; user scope may or may not exist on the
        // machine running the tests, so only assert the repo-side keys.
        assert_eq!(config.get("core.autocrlf"), None);
    }

    #[test]
    fn forbidden_keys_rejected() {
        for input in [
            b"[core]\n\t__proto__ = x\n".as_slice(),
            b"[constructor]\n\tkey = x\n".as_slice(),
            b"[core]\n\tprototype = x\n".as_slice(),
        ] {
            assert!(matches!(
                Config::from_bytes(input, "<test>"),
                Err(ConfigError::ForbiddenKey(_))
            ));
        }
    }
}
