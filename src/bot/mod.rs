//! # Bot Module
//!
//! The chat front end: [`public`] parses command text, [`render`] formats
//! replies and [`server`] ties both to the Town Star, craft and OpenSea
//! services.

pub mod public;
pub mod render;
pub mod server;

pub use public::{PublicCommand, PublicCommandParser, PublicState};
pub use server::{chunk_utf8, BotServer, CRAFT_DATA_UNAVAILABLE, LEADERBOARD_UNAVAILABLE};
