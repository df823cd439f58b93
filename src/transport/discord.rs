//! Discord transport over the `serenity` gateway client.

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use serenity::all::{ChannelId, GatewayIntents};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};
use serenity::Client;
use tokio::sync::mpsc;

use super::{ChatEvent, OutgoingReply, TransportHandles};
use crate::logutil::escape_log;

struct Handler {
    events_tx: mpsc::UnboundedSender<ChatEvent>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, _ctx: Context, msg: Message) {
        let event = ChatEvent {
            channel: msg.channel_id.get().to_string(),
            author: msg.author.id.get().to_string(),
            author_is_bot: msg.author.bot,
            content: msg.content.clone(),
        };
        debug!(
            "discord message in {} from {}: {}",
            event.channel,
            event.author,
            escape_log(&event.content)
        );
        if self.events_tx.send(event).is_err() {
            warn!("Bot server is gone; dropping Discord message");
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Connected to Discord as {}", ready.user.name);
    }
}

/// Connect to the Discord gateway and start forwarding messages.
pub async fn spawn_discord(token: &str) -> Result<TransportHandles> {
    if token.trim().is_empty() {
        return Err(anyhow!(
            "Discord token missing: set DISCORD_BOT_KEY or [discord].token"
        ));
    }
    let (events_tx, events_rx) = mpsc::unbounded_channel::<ChatEvent>();
    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<OutgoingReply>();

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(token.trim(), intents)
        .event_handler(Handler { events_tx })
        .await
        .map_err(|e| anyhow!("Failed to build Discord client: {}", e))?;
    let http = client.http.clone();

    let gateway = tokio::spawn(async move {
        if let Err(e) = client.start().await {
            error!("Discord gateway stopped: {}", e);
        }
    });

    let writer = tokio::spawn(async move {
        while let Some(reply) = outgoing_rx.recv().await {
            let channel = match reply.channel.parse::<u64>() {
                Ok(id) if id != 0 => ChannelId::new(id),
                _ => {
                    warn!("Invalid Discord channel id '{}'", reply.channel);
                    continue;
                }
            };
            if let Err(e) = channel.say(&http, &reply.content).await {
                warn!("Failed to send Discord reply to {}: {}", reply.channel, e);
            }
        }
    });

    Ok(TransportHandles {
        events_rx,
        outgoing_tx,
        tasks: vec![gateway, writer],
    })
}
