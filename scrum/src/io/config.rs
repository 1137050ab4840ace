//! Scrum configuration stored under `.scrum/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::persona::Persona;
use crate::io::session_store::validate_session_id;

/// Environment variable that switches model calls to proxy mode.
pub const PROXY_API_BASE_ENV: &str = "LITELLM_PROXY_API_BASE";

/// Scrum configuration (TOML).
///
/// Edited by humans; missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScrumConfig {
    /// Directory holding session files, relative to the project root.
    pub session_dir: PathBuf,

    /// Session used when a command does not name one.
    pub default_session: String,

    /// Upper bound for rendered persona instructions, in bytes.
    pub prompt_budget_bytes: usize,

    pub models: ModelsConfig,

    pub proxy: ProxyConfig,
}

/// Model alias per persona.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelsConfig {
    pub orchestrator: String,
    pub product_owner: String,
    pub scrum_master: String,
    pub dev_team: String,
    pub qa: String,
    pub architect: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Proxy base URL. `LITELLM_PROXY_API_BASE` takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Name of the environment variable holding the proxy key.
    pub api_key_env: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            orchestrator: Persona::Orchestrator.default_model().to_string(),
            product_owner: Persona::ProductOwner.default_model().to_string(),
            scrum_master: Persona::ScrumMaster.default_model().to_string(),
            dev_team: Persona::DevTeam.default_model().to_string(),
            qa: Persona::Qa.default_model().to_string(),
            architect: Persona::Architect.default_model().to_string(),
        }
    }
}

impl ModelsConfig {
    pub fn alias_for(&self, persona: Persona) -> &str {
        match persona {
            Persona::Orchestrator => &self.orchestrator,
            Persona::ProductOwner => &self.product_owner,
            Persona::ScrumMaster => &self.scrum_master,
            Persona::DevTeam => &self.dev_team,
            Persona::Qa => &self.qa,
            Persona::Architect => &self.architect,
        }
    }
}

impl Default for ScrumConfig {
    fn default() -> Self {
        Self {
            session_dir: PathBuf::from(".scrum/sessions"),
            default_session: "default".to_string(),
            prompt_budget_bytes: 16_000,
            models: ModelsConfig::default(),
            proxy: ProxyConfig {
                api_base: None,
                api_key_env: "LITELLM_PROXY_API_KEY".to_string(),
            },
        }
    }
}

impl ScrumConfig {
    pub fn validate(&self) -> Result<()> {
        if self.prompt_budget_bytes == 0 {
            return Err(anyhow!("prompt_budget_bytes must be > 0"));
        }
        if self.session_dir.as_os_str().is_empty() {
            return Err(anyhow!("session_dir must not be empty"));
        }
        validate_session_id(&self.default_session).context("default_session")?;
        for persona in Persona::ALL {
            if self.models.alias_for(persona).trim().is_empty() {
                return Err(anyhow!("models.{} must not be empty", persona.key()));
            }
        }
        if self.proxy.api_key_env.trim().is_empty() {
            return Err(anyhow!("proxy.api_key_env must not be empty"));
        }
        Ok(())
    }

    /// Session directory resolved against the project root.
    pub fn session_dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.session_dir)
    }

    /// Proxy base URL after applying the environment override.
    pub fn proxy_api_base(&self) -> Option<String> {
        self.resolve_proxy_api_base(std::env::var(PROXY_API_BASE_ENV).ok())
    }

    fn resolve_proxy_api_base(&self, from_env: Option<String>) -> Option<String> {
        from_env
            .filter(|base| !base.trim().is_empty())
            .or_else(|| self.proxy.api_base.clone())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ScrumConfig::default()`.
pub fn load_config(path: &Path) -> Result<ScrumConfig> {
    if !path.exists() {
        let cfg = ScrumConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ScrumConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ScrumConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
