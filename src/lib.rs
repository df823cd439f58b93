//! # ntmbot - Town Star Team Chat Bot
//!
//! ntmbot answers Town Star questions in a team chat: weekly competition
//! standings, OpenSea data for game NFTs and, most importantly, the full bill
//! of base materials needed to craft an item.
//!
//! ## Features
//!
//! - **Crafting Costs**: Recursive, multiplier-weighted expansion of the Town Star craft graph with cycle and depth protection.
//! - **Weekly Leaderboard**: Authenticated Town Star session with automatic renewal, filtered by town name.
//! - **OpenSea Lookups**: Name-to-token index cached on disk, filled lazily from collection pages.
//! - **Transports**: Discord gateway (feature `discord`) or a local console.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ntmbot::bot::BotServer;
//! use ntmbot::config::Config;
//! use ntmbot::transport::console::spawn_console;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load("config.toml").await?;
//!     config.apply_env_overrides();
//!
//!     let mut server = BotServer::new(config).await?;
//!     server.attach_transport(spawn_console());
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`craft`] - Craft dataset, name normalization and the cost resolver
//! - [`townstar`] - Town Star session, leaderboard and craft data provider
//! - [`opensea`] - OpenSea client and asset index
//! - [`bot`] - Command parsing, reply rendering and the server loop
//! - [`transport`] - Discord and console message transports
//! - [`config`] - Configuration management
//! - [`storage`] - Locked, atomic JSON file persistence
//! - [`validation`] - Chat argument sanitization
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Transport     │ ← Discord / console
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Bot Server    │ ← Parsing, rate limiting, replies
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Services      │ ← Town Star, craft resolver, OpenSea
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Storage       │ ← Craft data and asset caches
//! └─────────────────┘
//! ```

pub mod bot;
pub mod config;
pub mod craft;
pub mod logutil;
pub mod opensea;
pub mod storage;
pub mod townstar;
pub mod transport;
pub mod validation;
