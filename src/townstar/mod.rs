//! # Town Star Module
//!
//! Access to the Town Star game backend:
//!
//! - [`session`] - the `x-sessionid` capability token
//! - [`client`] - authentication and the weekly competition leaderboard
//! - [`craft_data`] - the craft dataset feeding [`crate::craft`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ntmbot::config::Config;
//! use ntmbot::townstar::{filter_by_name, TownStarClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let mut client = TownStarClient::new(config.townstar.clone());
//!     let users = client.weekly_leaderboard().await?;
//!     for user in filter_by_name(&users, "NTM") {
//!         println!("{} #{} {}", user.name, user.rank, user.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod craft_data;
pub mod session;

pub use client::{filter_by_name, LeaderboardUser, TownStarClient};
pub use craft_data::{CraftDataProvider, CraftDataSource, LoadedCraftData};
pub use session::TownStarSession;
