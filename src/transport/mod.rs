//! # Transport Module
//!
//! A transport moves chat text between a messaging platform and the
//! [`BotServer`](crate::bot::BotServer). Every transport produces the same pair
//! of channels:
//!
//! ```text
//! platform ──ChatEvent──→ events_rx ──→ BotServer ──→ outgoing_tx ──OutgoingReply──→ platform
//! ```
//!
//! - [`console`] - stdin/stdout, for local testing
//! - `discord` - Discord gateway via `serenity` (feature `discord`)

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub mod console;
#[cfg(feature = "discord")]
pub mod discord;

/// One incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    /// Where replies go back to (platform channel id).
    pub channel: String,
    pub author: String,
    pub author_is_bot: bool,
    pub content: String,
}

/// One outgoing chat message, already sized for the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    pub channel: String,
    pub content: String,
}

/// Channels and background tasks of a running transport.
pub struct TransportHandles {
    pub events_rx: mpsc::UnboundedReceiver<ChatEvent>,
    pub outgoing_tx: mpsc::UnboundedSender<OutgoingReply>,
    pub tasks: Vec<JoinHandle<()>>,
}
