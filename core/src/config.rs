// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timing configuration for a session, stored as TOML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seconds a player has to pick a peg once a roll is committed
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
    /// The warning is raised this many seconds before the timeout
    #[serde(default = "default_timeout_warning_secs")]
    pub timeout_warning_secs: u64,
    /// Delay between throwing the die and committing its value
    #[serde(default = "default_roll_settle_ms")]
    pub roll_settle_ms: u64,
    /// How long a roll with no legal move stays visible before the turn ends
    #[serde(default = "default_no_moves_display_ms")]
    pub no_moves_display_ms: u64,
    /// Spacing between forced HOME exits in a roll-of-1 chain
    #[serde(default = "default_forced_move_delay_ms")]
    pub forced_move_delay_ms: u64,
}

fn default_turn_timeout_secs() -> u64 {
    30
}

fn default_timeout_warning_secs() -> u64 {
    10
}

fn default_roll_settle_ms() -> u64 {
    1000
}

fn default_no_moves_display_ms() -> u64 {
    1500
}

fn default_forced_move_delay_ms() -> u64 {
    800
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: default_turn_timeout_secs(),
            timeout_warning_secs: default_timeout_warning_secs(),
            roll_settle_ms: default_roll_settle_ms(),
            no_moves_display_ms: default_no_moves_display_ms(),
            forced_move_delay_ms: default_forced_move_delay_ms(),
        }
    }
}

impl GameConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    /// Delay from timer start until the warning fires
    pub fn warning_delay(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs.saturating_sub(self.timeout_warning_secs))
    }

    pub fn roll_settle(&self) -> Duration {
        Duration::from_millis(self.roll_settle_ms)
    }

    pub fn no_moves_display(&self) -> Duration {
        Duration::from_millis(self.no_moves_display_ms)
    }

    pub fn forced_move_delay(&self) -> Duration {
        Duration::from_millis(self.forced_move_delay_ms)
    }
}

/// Load the config at `path`, writing the defaults there first if the file
/// does not exist yet
pub fn load_config(path: &Path) -> Result<GameConfig> {
    if !path.exists() {
        tracing::info!("Config file not found, creating default at: {}", path.display());
        let config = GameConfig::default();
        save_config(path, &config)?;
        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str::<GameConfig>(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn save_config(path: &Path, config: &GameConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let toml_content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, toml_content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    tracing::info!("Saved config to: {}", path.display());
    Ok(())
}
