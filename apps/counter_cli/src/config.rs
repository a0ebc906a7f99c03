use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::{ControllerConfig, RefreshPolicy};
use serde::Deserialize;
use shared::domain::{Cluster, Commitment, DEFAULT_MUTATION_FEE_LAMPORTS, PROGRAM_ID};
use solana_sdk::pubkey::Pubkey;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "counter.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rpc_url: String,
    pub program_id: Pubkey,
    pub keypair_path: PathBuf,
    pub fee_lamports: u64,
    pub commitment: Commitment,
    pub refresh_attempts: u32,
    pub refresh_max_delay_ms: u64,
    /// Single read after the full settle delay instead of backing off.
    pub fixed_settle: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let refresh = RefreshPolicy::default();
        Self {
            rpc_url: Cluster::default().rpc_url().into(),
            program_id: PROGRAM_ID,
            keypair_path: default_keypair_path(),
            fee_lamports: DEFAULT_MUTATION_FEE_LAMPORTS,
            commitment: Commitment::default(),
            refresh_attempts: refresh.max_attempts,
            refresh_max_delay_ms: refresh.max_delay.as_millis() as u64,
            fixed_settle: false,
        }
    }
}

/// Keys accepted in `counter.toml`; every one is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    rpc_url: Option<String>,
    program_id: Option<String>,
    keypair: Option<PathBuf>,
    fee_lamports: Option<u64>,
    commitment: Option<String>,
    refresh_attempts: Option<u32>,
    refresh_max_delay_ms: Option<u64>,
    fixed_settle: Option<bool>,
}

/// Values given on the command line. They win over file and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub keypair: Option<PathBuf>,
}

impl Settings {
    pub fn controller_config(&self) -> ControllerConfig {
        let refresh = if self.fixed_settle {
            RefreshPolicy::fixed_settle()
        } else {
            RefreshPolicy {
                max_attempts: self.refresh_attempts,
                max_delay: Duration::from_millis(self.refresh_max_delay_ms),
                ..RefreshPolicy::default()
            }
        };
        ControllerConfig {
            program_id: self.program_id,
            commitment: self.commitment.to_config(),
            mutation_fee_lamports: self.fee_lamports,
            refresh,
        }
    }
}

fn default_keypair_path() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join(".config").join("solana").join("id.json")
}

/// Defaults, then the config file, then `COUNTER__*` environment variables,
/// then command-line overrides.
pub fn load_settings(config_path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<Settings> {
    load_settings_with(config_path, overrides, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    config_path: Option<&Path>,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if let Some(file_cfg) = read_config_file(&path, required)? {
        apply_file(&mut settings, file_cfg)?;
    }

    if let Some(v) = env("COUNTER__RPC_URL") {
        settings.rpc_url = resolve_rpc_url(&v)?;
    }
    if let Some(v) = env("COUNTER__PROGRAM_ID") {
        settings.program_id = parse_program_id(&v)?;
    }
    if let Some(v) = env("COUNTER__KEYPAIR") {
        settings.keypair_path = PathBuf::from(v);
    }
    if let Some(v) = env("COUNTER__FEE_LAMPORTS") {
        settings.fee_lamports = v
            .trim()
            .parse()
            .with_context(|| format!("COUNTER__FEE_LAMPORTS is not a number: '{v}'"))?;
    }
    if let Some(v) = env("COUNTER__COMMITMENT") {
        settings.commitment = parse_commitment(&v)?;
    }
    if let Some(v) = env("COUNTER__FIXED_SETTLE") {
        settings.fixed_settle = v
            .trim()
            .parse()
            .with_context(|| format!("COUNTER__FIXED_SETTLE must be true or false: '{v}'"))?;
    }

    if let Some(v) = &overrides.rpc_url {
        settings.rpc_url = resolve_rpc_url(v)?;
    }
    if let Some(v) = &overrides.keypair {
        settings.keypair_path = v.clone();
    }

    if settings.refresh_attempts == 0 {
        bail!("refresh_attempts must be at least 1");
    }
    Ok(settings)
}

fn read_config_file(path: &Path, required: bool) -> anyhow::Result<Option<FileSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config '{}'", path.display()))
        }
    };
    let parsed = toml::from_str::<FileSettings>(&raw)
        .with_context(|| format!("invalid config file '{}'", path.display()))?;
    Ok(Some(parsed))
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) -> anyhow::Result<()> {
    if let Some(v) = file_cfg.rpc_url {
        settings.rpc_url = resolve_rpc_url(&v)?;
    }
    if let Some(v) = file_cfg.program_id {
        settings.program_id = parse_program_id(&v)?;
    }
    if let Some(v) = file_cfg.keypair {
        settings.keypair_path = v;
    }
    if let Some(v) = file_cfg.fee_lamports {
        settings.fee_lamports = v;
    }
    if let Some(v) = file_cfg.commitment {
        settings.commitment = parse_commitment(&v)?;
    }
    if let Some(v) = file_cfg.refresh_attempts {
        settings.refresh_attempts = v;
    }
    if let Some(v) = file_cfg.refresh_max_delay_ms {
        settings.refresh_max_delay_ms = v;
    }
    if let Some(v) = file_cfg.fixed_settle {
        settings.fixed_settle = v;
    }
    Ok(())
}

/// Accepts a cluster moniker or an http(s) URL.
pub fn resolve_rpc_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if let Ok(cluster) = Cluster::from_str(raw) {
        return Ok(cluster.rpc_url().to_string());
    }
    let url = Url::parse(raw).with_context(|| format!("invalid RPC url '{raw}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        other => bail!("unsupported RPC url scheme '{other}' in '{raw}'"),
    }
}

fn parse_program_id(raw: &str) -> anyhow::Result<Pubkey> {
    Pubkey::from_str(raw.trim()).with_context(|| format!("invalid program id '{raw}'"))
}

fn parse_commitment(raw: &str) -> anyhow::Result<Commitment> {
    Commitment::from_str(raw).map_err(anyhow::Error::msg)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
