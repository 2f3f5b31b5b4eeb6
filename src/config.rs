//! Generator configuration.
//!
//! The naming style comes from `--style`. Everything else is read from an
//! optional `modelgen.toml` in the template home (`--home`, a `--remote`
//! clone, or `~/.modelgen`).

use crate::error::{ModelError, ModelResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File looked up in the template home.
pub const SETTINGS_FILE: &str = "modelgen.toml";

const HOME_DIR_NAME: &str = ".modelgen";

/// How generated file names are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingStyle {
    /// `user_roles`
    #[default]
    Snake,
    /// `userroles`
    Flat,
    /// `userRoles`
    Camel,
}

impl NamingStyle {
    pub fn parse(style: &str) -> ModelResult<Self> {
        match style.trim() {
            "" | "go_zero" | "snake_case" | "snake" => Ok(Self::Snake),
            "gozero" | "flatcase" | "flat" => Ok(Self::Flat),
            "goZero" | "camelCase" | "camel" => Ok(Self::Camel),
            other => Err(ModelError::Config(format!(
                "unknown style '{}', expected one of go_zero, gozero, goZero",
                other
            ))),
        }
    }

    /// Spell `name` in this style.
    pub fn format(&self, name: &str) -> String {
        let words = split_words(name);
        match self {
            Self::Snake => words.join("_"),
            Self::Flat => words.concat(),
            Self::Camel => words
                .iter()
                .enumerate()
                .map(|(i, w)| if i == 0 { w.clone() } else { capitalize(w) })
                .collect(),
        }
    }
}

/// Lowercase words of an identifier, split on `_`, `-`, spaces and
/// lower-to-upper case changes.
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `user` -> `User`
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Settings read from `modelgen.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Derives put on every generated struct.
    pub derives: Vec<String>,
    /// Text emitted at the top of every generated file.
    pub header: Option<String>,
    /// First segment of generated cache keys.
    pub cache_prefix: String,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            derives: vec!["Debug".to_string(), "Clone".to_string()],
            header: None,
            cache_prefix: "cache".to_string(),
        }
    }
}

impl TemplateSettings {
    pub fn from_toml(input: &str) -> ModelResult<Self> {
        toml::from_str(input).map_err(|e| ModelError::Config(format!("{}: {}", SETTINGS_FILE, e)))
    }
}

/// Resolved configuration handed to the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub style: NamingStyle,
    pub templates: TemplateSettings,
}

impl Config {
    /// Configuration for `style` with default template settings.
    pub fn new(style: &str) -> ModelResult<Self> {
        Ok(Self {
            style: NamingStyle::parse(style)?,
            templates: TemplateSettings::default(),
        })
    }

    /// Configuration for `style`, picking up `modelgen.toml` from `home`.
    pub fn load(style: &str, home: Option<&Path>) -> ModelResult<Self> {
        let mut config = Self::new(style)?;
        if let Some(home) = home {
            let path = home.join(SETTINGS_FILE);
            if path.is_file() {
                let content = std::fs::read_to_string(&path)?;
                config.templates = TemplateSettings::from_toml(&content)?;
                tracing::debug!(path = %path.display(), "loaded template settings");
            }
        }
        Ok(config)
    }
}

/// The default template home, `~/.modelgen`.
pub fn default_home() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(HOME_DIR_NAME))
}

/// Shallow-clone `remote` into the user cache directory and return the
/// checkout path.
pub fn clone_remote(remote: &str, branch: Option<&str>) -> ModelResult<PathBuf> {
    let repo = remote
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .map(|s| s.trim_end_matches(".git"))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ModelError::Config(format!("cannot derive repository name from '{}'", remote)))?;

    let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
    let dest = base.join("modelgen").join(repo);
    if dest.exists() {
        std::fs::remove_dir_all(&dest)?;
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cmd = Command::new("git");
    cmd.arg("clone").arg("--depth").arg("1");
    if let Some(branch) = branch.filter(|b| !b.trim().is_empty()) {
        cmd.arg("--branch").arg(branch.trim());
    }
    cmd.arg(remote).arg(&dest);

    let output = cmd.output()?;
    if !output.status.success() {
        return Err(ModelError::Config(format!(
            "git clone {} failed: {}",
            remote,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(dest)
}
