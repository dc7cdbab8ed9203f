// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trouble CLI - terminal front end for a local game
//!
//! The binary owns a [`trouble_core::GameSession`], feeds it commands typed
//! on stdin and drives its clock from a tokio interval. Parsing and rendering
//! live here so they can be tested without a terminal.

pub mod command;
pub mod render;

pub use command::{parse_command, Command};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("io", "trouble", "trouble").context("Failed to determine config directory")
}

/// `config.toml` in the user's config directory
pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Snapshot of the game in progress, in the user's data directory
pub fn default_snapshot_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("session.cbor"))
}
