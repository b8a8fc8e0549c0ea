use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::command::{Catalog, CommandDefinition};
use crate::{clog_debug, Error, Result};

const DEFAULT_TMUX_SESSION: &str = "commander";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// tmux session that hosts the windows commander creates.
    pub tmux_session: Option<String>,
    /// Extra restricted patterns, checked before the built-in defaults.
    #[serde(default, alias = "restrictedPatterns")]
    pub restricted_patterns: Vec<String>,
    #[serde(default)]
    pub commands: Vec<CommandDefinition>,
}

impl Config {
    pub fn commander_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or(Error::NoHomeDir)?
            .join(".commander"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::commander_dir()?.join("commander.toml"))
    }

    /// Resolve an explicit `--config` path, falling back to the default location.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(expand_tilde(&path.to_string_lossy())),
            None => Self::config_path(),
        }
    }

    pub fn effective_session(&self) -> &str {
        self.tmux_session.as_deref().unwrap_or(DEFAULT_TMUX_SESSION)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        clog_debug!("Config::load_from path={}", path.display());
        if !path.exists() {
            clog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config = Self::parse(&fs::read_to_string(path)?)?;
        clog_debug!(
            "Config loaded: commands={}, restricted_patterns={}, tmux_session={:?}",
            config.commands.len(),
            config.restricted_patterns.len(),
            config.tmux_session
        );
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        for def in &config.commands {
            def.validate()?;
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                clog_debug!("Creating config directory: {}", parent.display());
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        clog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn add_command(&mut self, def: CommandDefinition) -> Result<()> {
        def.validate()?;
        self.commands.push(def);
        Ok(())
    }

    /// Build a fresh catalog from the current command list.
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.commands.clone())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
