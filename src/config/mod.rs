//! # Configuration Management Module
//!
//! Centralized, TOML-backed configuration for ntmbot with defaults for every
//! section and environment overrides for secrets.
//!
//! ## Configuration Structure
//!
//! - [`BotConfig`] - Command prefix, reply limits, team tags, transport choice
//! - [`DiscordConfig`] - Gateway token
//! - [`TownStarConfig`] - Town Star API endpoints, secret and craft data settings
//! - [`OpenSeaConfig`] - OpenSea endpoints, paging limits and known collections
//! - [`StorageConfig`] - Data directory for caches
//! - [`LoggingConfig`] - Log level and log files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ntmbot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load("config.toml").await?;
//!     config.apply_env_overrides();
//!     println!("Prefix: {}", config.bot.command_prefix);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! name = "NTM Discord Bot"
//! command_prefix = "!"
//! transport = "discord"
//!
//! [townstar]
//! api_base = "https://townstar.sandbox-games.com"
//! craft_data_url = "https://townstar.sandbox-games.com/launch/files/assets/24578485/1/CraftsData.json"
//!
//! [opensea.collections.town-star]
//! contract_address = "0xc36cf0cfcb5d905b8b513860db0cfe63f6cf9f5c"
//! ```
//!
//! ## Environment Integration
//!
//! Secrets are best kept out of the file: `DISCORD_BOT_KEY`, `TOWNSTAR_SECRET`
//! and `OPENSEA_API_KEY` override their config counterparts when set and
//! non-empty. Precedence: Environment > Config file > Defaults.

use anyhow::{anyhow, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::fs;

/// Prefix characters accepted for chat commands.
pub const ALLOWED_COMMAND_PREFIXES: [char; 6] = ['!', '^', '+', '$', '/', '>'];

const GALA_CONTRACT_ADDRESS: &str = "0xc36cf0cfcb5d905b8b513860db0cfe63f6cf9f5c";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub name: String,
    /// One of [`ALLOWED_COMMAND_PREFIXES`]; anything else falls back to `!`.
    pub command_prefix: String,
    /// "discord" or "console"
    #[serde(default = "default_transport")]
    pub transport: String,
    /// Replies longer than this are split into several messages (bytes).
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Minimum gap between two replies to the same author (ms). 0 disables.
    #[serde(default = "default_reply_cooldown_ms")]
    pub reply_cooldown_ms: u64,
    /// Name fragment used by the team leaderboard command.
    pub team_tag: String,
    /// Name fragment used by the scholar leaderboard command.
    pub scholar_tag: String,
    /// Largest quantity accepted by the craft command.
    #[serde(default = "default_max_craft_quantity")]
    pub max_craft_quantity: u64,
    /// Leaderboard entries listed per reply.
    #[serde(default = "default_max_leaderboard_entries")]
    pub max_leaderboard_entries: usize,
}

fn default_transport() -> String {
    "discord".to_string()
}

fn default_max_message_size() -> usize {
    1900
}

fn default_reply_cooldown_ms() -> u64 {
    1500
}

fn default_max_craft_quantity() -> u64 {
    1000
}

fn default_max_leaderboard_entries() -> usize {
    25
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "NTM Discord Bot".to_string(),
            command_prefix: "!".to_string(),
            transport: default_transport(),
            max_message_size: default_max_message_size(),
            reply_cooldown_ms: default_reply_cooldown_ms(),
            team_tag: "NTM".to_string(),
            scholar_tag: "NTM-S".to_string(),
            max_craft_quantity: default_max_craft_quantity(),
            max_leaderboard_entries: default_max_leaderboard_entries(),
        }
    }
}

impl BotConfig {
    /// The effective command prefix character.
    pub fn prefix_char(&self) -> char {
        let mut chars = self.command_prefix.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if ALLOWED_COMMAND_PREFIXES.contains(&c) => c,
            _ => {
                warn!(
                    "Invalid command prefix '{}', defaulting to '!'",
                    self.command_prefix
                );
                '!'
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Prefer the `DISCORD_BOT_KEY` environment variable.
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TownStarConfig {
    pub api_base: String,
    /// Authentication token. Prefer the `TOWNSTAR_SECRET` environment variable.
    #[serde(default)]
    pub secret: String,
    pub craft_data_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Upper rank fetched from the weekly leaderboard.
    #[serde(default = "default_leaderboard_stop")]
    pub leaderboard_stop: u32,
    /// Bound on craft expansion depth.
    #[serde(default = "default_max_craft_depth")]
    pub max_craft_depth: usize,
}

fn default_leaderboard_stop() -> u32 {
    10000
}

fn default_max_craft_depth() -> usize {
    crate::craft::DEFAULT_MAX_DEPTH
}

impl Default for TownStarConfig {
    fn default() -> Self {
        Self {
            api_base: "https://townstar.sandbox-games.com".to_string(),
            secret: String::new(),
            craft_data_url:
                "https://townstar.sandbox-games.com/launch/files/assets/24578485/1/CraftsData.json"
                    .to_string(),
            timeout_seconds: 10,
            leaderboard_stop: default_leaderboard_stop(),
            max_craft_depth: default_max_craft_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub contract_address: String,
    /// Human readable collection name for replies; defaults to the slug.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Answer from the local asset cache only; never scan the collection.
    #[serde(default)]
    pub cache_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenSeaConfig {
    pub api_base: String,
    /// API key. Prefer the `OPENSEA_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: String,
    /// Assets requested per page while scanning a collection.
    pub page_limit: u32,
    /// Scanning stops at this offset.
    pub total_limit: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// How long a name that a full scan did not find is answered from memory
    /// (seconds). 0 disables.
    pub miss_ttl_seconds: u64,
    /// Collections reachable through `os-<slug>`, keyed by slug.
    pub collections: BTreeMap<String, CollectionConfig>,
}

impl Default for OpenSeaConfig {
    fn default() -> Self {
        let mut collections = BTreeMap::new();
        collections.insert(
            "town-star".to_string(),
            CollectionConfig {
                contract_address: GALA_CONTRACT_ADDRESS.to_string(),
                display_name: Some("Town Star".to_string()),
                cache_only: false,
            },
        );
        collections.insert(
            "mirandus".to_string(),
            CollectionConfig {
                contract_address: GALA_CONTRACT_ADDRESS.to_string(),
                display_name: Some("Mirandus".to_string()),
                cache_only: false,
            },
        );
        Self {
            api_base: "https://api.opensea.io/api/v1".to_string(),
            api_key: String::new(),
            page_limit: 50,
            total_limit: 9000,
            timeout_seconds: 10,
            miss_ttl_seconds: 600,
            collections,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

/// Without a `[logging]` section both log files are used; inside the section
/// an omitted `file` or `error_file` turns that file off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
    /// Errors are additionally appended here.
    #[serde(default)]
    pub error_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("logs/combined.log".to_string()),
            error_file: Some("logs/error.log".to_string()),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub townstar: TownStarConfig,
    #[serde(default)]
    pub opensea: OpenSeaConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Replace secrets with values from the environment when present.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let pick = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = pick("DISCORD_BOT_KEY") {
            self.discord.token = token;
        }
        if let Some(secret) = pick("TOWNSTAR_SECRET") {
            self.townstar.secret = secret;
        }
        if let Some(key) = pick("OPENSEA_API_KEY") {
            self.opensea.api_key = key;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot: BotConfig::default(),
            discord: DiscordConfig::default(),
            townstar: TownStarConfig::default(),
            opensea: OpenSeaConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.bot.prefix_char(), '!');
        assert_eq!(config.bot.max_craft_quantity, 1000);
        assert_eq!(config.bot.team_tag, "NTM");
        assert_eq!(config.opensea.page_limit, 50);
        assert!(config.opensea.collections.contains_key("town-star"));
        assert!(config.opensea.collections.contains_key("mirandus"));
    }

    #[test]
    fn test_prefix_fallback() {
        let mut bot = Config::default().bot;
        for (prefix, expected) in [("^", '^'), (" / ", '/'), ("#", '!'), ("!!", '!'), ("", '!')] {
            bot.command_prefix = prefix.to_string();
            assert_eq!(bot.prefix_char(), expected, "prefix {:?}", prefix);
        }
    }

    #[test]
    fn test_toml_roundtrip_keeps_collections() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(
            parsed.opensea.collections["mirandus"].contract_address,
            GALA_CONTRACT_ADDRESS
        );
        assert_eq!(parsed.townstar.craft_data_url, config.townstar.craft_data_url);
    }

    #[test]
    fn test_minimal_file_uses_section_defaults() {
        let minimal = r#"
            [bot]
            name = "Test"
            command_prefix = "^"
            team_tag = "ABC"
            scholar_tag = "ABC-S"

            [storage]
            data_dir = "/tmp/x"

            [logging]
            level = "debug"
        "#;
        let parsed: Config = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.bot.max_message_size, 1900);
        assert_eq!(parsed.townstar.leaderboard_stop, 10000);
        assert!(parsed.logging.file.is_none());
        assert_eq!(parsed.opensea.collections.len(), 2);
    }

    #[test]
    fn test_empty_and_partial_files_load() {
        let empty: Config = toml::from_str("").unwrap();
        assert_eq!(empty.bot.prefix_char(), '!');
        assert_eq!(empty.storage.data_dir, "./data");
        assert_eq!(empty.logging.level, "info");
        assert_eq!(empty.logging.file.as_deref(), Some("logs/combined.log"));

        let partial: Config = toml::from_str(
            r#"
            [bot]
            team_tag = "XYZ"

            [townstar]
            secret = "abc"

            [opensea]
            page_limit = 20
            "#,
        )
        .unwrap();
        assert_eq!(partial.bot.team_tag, "XYZ");
        assert_eq!(partial.bot.scholar_tag, "NTM-S");
        assert_eq!(partial.bot.max_message_size, 1900);
        assert_eq!(partial.townstar.secret, "abc");
        assert_eq!(partial.townstar.timeout_seconds, 10);
        assert_eq!(partial.townstar.api_base, TownStarConfig::default().api_base);
        assert_eq!(partial.opensea.page_limit, 20);
        assert_eq!(partial.opensea.total_limit, 9000);
        assert_eq!(partial.opensea.collections.len(), 2);
    }

    #[test]
    fn test_env_overrides_skip_blank_values() {
        let env: HashMap<&str, &str> = [("TOWNSTAR_SECRET", "s3cret"), ("OPENSEA_API_KEY", "  ")]
            .into_iter()
            .collect();
        let mut config = Config::default();
        config.opensea.api_key = "from-file".to_string();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.townstar.secret, "s3cret");
        assert_eq!(config.opensea.api_key, "from-file");
        assert!(config.discord.token.is_empty());
    }
}
