//! Subcommand implementations

pub mod collect;
pub mod communities;
pub mod config;
pub mod scan;

use anyhow::{Context, Result, bail};
use img_harvest_adapters::communities::load_community_list;
use img_harvest_domain::Community;
use secrecy::SecretString;

use crate::config::AppConfig;

/// Read a required value from the named environment variable
pub(crate) fn load_env(env_var: &str, what: &str) -> Result<String> {
    if env_var.trim().is_empty() {
        bail!("No env var configured for {}", what);
    }

    let value = std::env::var(env_var)
        .with_context(|| format!("Missing env var {} for {}", env_var, what))?;

    if value.trim().is_empty() {
        bail!("Env var {} is empty for {}", env_var, what);
    }

    Ok(value)
}

pub(crate) fn load_secret(env_var: &str, what: &str) -> Result<SecretString> {
    load_env(env_var, what).map(|value| SecretString::new(value.into()))
}

/// Load the configured community list, refusing an empty one
pub(crate) async fn load_communities(config: &AppConfig) -> Result<Vec<Community>> {
    let path = &config.general.communities_file;
    let list = load_community_list(path)
        .await
        .context("Failed to load community list")?;

    if list.communities.is_empty() {
        bail!("No valid communities in {}", path.display());
    }

    Ok(list.communities)
}
