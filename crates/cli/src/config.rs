//! Configuration loading and management

use anyhow::{Context, Result, bail};
use img_harvest_domain::usecases::{
    LivenessConfig, MaintenanceConfig, PlaceholderSignature, ReconcileConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub collect: CollectConfig,

    #[serde(default)]
    pub liveness: LivenessSettings,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub reddit: RedditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_communities_file")]
    pub communities_file: PathBuf,

    #[serde(default = "default_summary_file")]
    pub summary_file: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    #[serde(default = "default_post_limit")]
    pub post_limit: usize,

    #[serde(default = "default_supported_formats")]
    pub supported_formats: Vec<String>,

    #[serde(default = "default_exclude_domains")]
    pub exclude_domains: Vec<String>,

    #[serde(default)]
    pub compare_duplicates: bool,

    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessSettings {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff")]
    pub backoff_secs: u64,

    /// 0 disables throttling
    #[serde(default = "default_rate_per_second")]
    pub rate_per_second: f64,

    #[serde(default = "default_placeholder_height")]
    pub placeholder_height: u32,

    #[serde(default = "default_placeholder_width")]
    pub placeholder_width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_true")]
    pub prune_unknown: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_client_id_env")]
    pub client_id_env: String,

    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,

    #[serde(default = "default_username_env")]
    pub username_env: String,

    #[serde(default = "default_password_env")]
    pub password_env: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_communities_file() -> PathBuf {
    PathBuf::from("./sub_list.csv")
}

fn default_summary_file() -> PathBuf {
    PathBuf::from("./new_img.csv")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> u64 {
    3600
}

fn default_post_limit() -> usize {
    20
}

fn default_supported_formats() -> Vec<String> {
    vec!["jpg".to_string(), "png".to_string(), "jpeg".to_string()]
}

fn default_exclude_domains() -> Vec<String> {
    vec!["i.imgur.com".to_string()]
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> u64 {
    1
}

fn default_rate_per_second() -> f64 {
    2.0
}

fn default_placeholder_height() -> u32 {
    60
}

fn default_placeholder_width() -> u32 {
    130
}

fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    "reddit".to_string()
}

fn default_client_id_env() -> String {
    "REDDIT_CLIENT_ID".to_string()
}

fn default_client_secret_env() -> String {
    "REDDIT_CLIENT_SECRET".to_string()
}

fn default_username_env() -> String {
    "REDDIT_USERNAME".to_string()
}

fn default_password_env() -> String {
    "REDDIT_PASSWORD".to_string()
}

fn default_user_agent() -> String {
    format!("img-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_auth_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_api_base_url() -> String {
    "https://oauth.reddit.com".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            communities_file: default_communities_file(),
            summary_file: default_summary_file(),
            log_level: default_log_level(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            post_limit: default_post_limit(),
            supported_formats: default_supported_formats(),
            exclude_domains: default_exclude_domains(),
            compare_duplicates: false,
            dry_run: false,
        }
    }
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff(),
            rate_per_second: default_rate_per_second(),
            placeholder_height: default_placeholder_height(),
            placeholder_width: default_placeholder_width(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            prune_unknown: default_true(),
        }
    }
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            client_id_env: default_client_id_env(),
            client_secret_env: default_client_secret_env(),
            username_env: default_username_env(),
            password_env: default_password_env(),
            user_agent: default_user_agent(),
            auth_base_url: default_auth_base_url(),
            api_base_url: default_api_base_url(),
        }
    }
}

/// One request every ~17 minutes
const MIN_RATE_PER_SECOND: f64 = 0.001;

impl LivenessSettings {
    pub fn to_domain(&self) -> Result<LivenessConfig> {
        if self.max_attempts == 0 {
            bail!("liveness.max_attempts must be at least 1");
        }
        let rate = self.rate_per_second;
        if !rate.is_finite() || rate < 0.0 || (rate > 0.0 && rate < MIN_RATE_PER_SECOND) {
            bail!(
                "liveness.rate_per_second must be 0 or at least {}, got {}",
                MIN_RATE_PER_SECOND,
                rate
            );
        }

        Ok(LivenessConfig {
            placeholder: PlaceholderSignature {
                height: self.placeholder_height,
                width: self.placeholder_width,
            },
            timeout: Duration::from_secs(self.timeout_secs),
            max_attempts: self.max_attempts,
            backoff: Duration::from_secs(self.backoff_secs),
            max_requests_per_second: (self.rate_per_second > 0.0).then_some(self.rate_per_second),
        })
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("IMG_HARVEST")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("collect.supported_formats")
                .with_list_parse_key("collect.exclude_domains")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn reconcile_config(&self, dry_run: bool) -> Result<ReconcileConfig> {
        if self.collect.post_limit == 0 {
            bail!("collect.post_limit must be at least 1");
        }

        Ok(ReconcileConfig {
            post_limit: self.collect.post_limit,
            supported_formats: self.collect.supported_formats.clone(),
            excluded_domains: self.collect.exclude_domains.clone(),
            compare_duplicates: self.collect.compare_duplicates,
            dry_run: dry_run || self.collect.dry_run,
            liveness: self.liveness.to_domain()?,
        })
    }

    pub fn maintenance_config(&self, dry_run: bool) -> Result<MaintenanceConfig> {
        Ok(MaintenanceConfig {
            prune_unknown: self.scan.prune_unknown,
            dry_run,
            liveness: self.liveness.to_domain()?,
        })
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# img-harvest configuration

[general]
data_dir = "./data"
communities_file = "./sub_list.csv"
summary_file = "./new_img.csv"
log_level = "info"
# Used by `collect --watch`
poll_interval_secs = 3600

[collect]
post_limit = 20
supported_formats = ["jpg", "png", "jpeg"]
# The placeholder heuristic cannot judge these hosts
exclude_domains = ["i.imgur.com"]
compare_duplicates = false
dry_run = false

[liveness]
timeout_secs = 30
max_attempts = 3
backoff_secs = 1
# 0 disables throttling
rate_per_second = 2.0
placeholder_height = 60
placeholder_width = 130

[scan]
# Also drop entries that could not be fetched
prune_unknown = true

[reddit]
provider = "reddit"  # reddit, stub
client_id_env = "REDDIT_CLIENT_ID"
client_secret_env = "REDDIT_CLIENT_SECRET"
username_env = "REDDIT_USERNAME"
password_env = "REDDIT_PASSWORD"
user_agent = "img-harvest/0.1 (by u/your_username)"
auth_base_url = "https://www.reddit.com"
api_base_url = "https://oauth.reddit.com"
"#
        .to_string()
    }
}
