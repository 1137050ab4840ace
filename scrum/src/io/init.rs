//! Initialization helpers for `.scrum/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use super::config::{ScrumConfig, write_config};

/// Canonical paths within `.scrum/` for a project root.
#[derive(Debug, Clone)]
pub struct ScrumPaths {
    pub root: PathBuf,
    pub scrum_dir: PathBuf,
    pub config_path: PathBuf,
    pub gitignore_path: PathBuf,
}

impl ScrumPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let scrum_dir = root.join(".scrum");
        Self {
            root: root.clone(),
            scrum_dir: scrum_dir.clone(),
            config_path: scrum_dir.join("config.toml"),
            gitignore_path: scrum_dir.join(".gitignore"),
        }
    }

    /// Session directory configured by `cfg`.
    pub fn sessions_dir(&self, cfg: &ScrumConfig) -> PathBuf {
        cfg.session_dir_in(&self.root)
    }
}

/// Options for `init_scrum`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite the existing config and gitignore.
    pub force: bool,
}

/// Create `.scrum/` scaffolding in `root`.
///
/// Fails if `.scrum/` already exists unless `options.force` is set. Stored
/// sessions are never touched, even with `force`.
pub fn init_scrum(root: &Path, options: &InitOptions) -> Result<ScrumPaths> {
    let paths = ScrumPaths::new(root);
    if paths.scrum_dir.exists() && !options.force {
        return Err(anyhow!(
            "scrum init: .scrum already exists (use --force to overwrite)"
        ));
    }
    if paths.scrum_dir.exists() && !paths.scrum_dir.is_dir() {
        return Err(anyhow!("scrum init: .scrum exists but is not a directory"));
    }

    let cfg = ScrumConfig::default();
    create_dir(&paths.scrum_dir)?;
    create_dir(&paths.sessions_dir(&cfg))?;
    write_config(&paths.config_path, &cfg)?;
    fs::write(&paths.gitignore_path, SCRUM_GITIGNORE)
        .with_context(|| format!("write file {}", paths.gitignore_path.display()))?;

    info!(root = %root.display(), "initialized .scrum");
    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

const SCRUM_GITIGNORE: &str = "*.tmp\n";
