use anyhow::Result;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Duration, Instant};

use super::public::{PublicCommand, PublicCommandParser, PublicState};
use super::render;
use crate::config::Config;
use crate::craft::{normalize_craft_name, CraftError, CraftGraphResolver};
use crate::logutil::escape_log;
use crate::opensea::{AssetLookup, AssetStore, OpenSeaClient};
use crate::storage::ensure_data_dir;
use crate::townstar::{filter_by_name, CraftDataProvider, TownStarClient};
use crate::transport::{ChatEvent, OutgoingReply, TransportHandles};

pub const LEADERBOARD_UNAVAILABLE: &str = "Unable to retrieve weekly leaderboard.";
pub const CRAFT_DATA_UNAVAILABLE: &str = "Unable to generate craft data";

const SUGGESTION_LIMIT: usize = 5;
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Services a command needs, shared by every in-flight command task.
struct CommandContext {
    config: Config,
    prefix: char,
    resolver: CraftGraphResolver,
    craft_data: CraftDataProvider,
    townstar: Mutex<TownStarClient>,
    opensea: Mutex<OpenSeaClient>,
}

/// # Bot Server - Command Loop
///
/// Owns every service the chat commands need and drives them from the
/// events of one transport:
///
/// ```text
///                  ChatEvent
/// ┌─────────────┐ ───────────→ ┌─────────────┐ ──→ TownStarClient
/// │  Transport  │              │  BotServer  │ ──→ CraftDataProvider + CraftGraphResolver
/// └─────────────┘ ←─────────── └─────────────┘ ──→ OpenSeaClient
///                OutgoingReply
/// ```
///
/// The loop parses and rate limits each message itself, then runs the
/// command on its own task and queues the reply from there. A long OpenSea
/// scan only holds the OpenSea client; craft and leaderboard commands keep
/// being answered.
///
/// ## Usage
///
/// ```rust,no_run
/// use ntmbot::bot::BotServer;
/// use ntmbot::config::Config;
/// use ntmbot::transport::console::spawn_console;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Config::load("config.toml").await?;
///     let mut server = BotServer::new(config).await?;
///     server.attach_transport(spawn_console());
///     server.run().await?;
///     Ok(())
/// }
/// ```
///
/// Without an attached transport, [`route_chat_event`](Self::route_chat_event)
/// answers inline and replies are collected in memory for
/// [`sent_messages`](Self::sent_messages).
pub struct BotServer {
    ctx: Arc<CommandContext>,
    public_parser: PublicCommandParser,
    public_state: PublicState,
    events_rx: Option<mpsc::UnboundedReceiver<ChatEvent>>,
    outgoing_tx: Option<mpsc::UnboundedSender<OutgoingReply>>,
    transport_tasks: Vec<JoinHandle<()>>,
    last_prune: Instant,
    #[doc(hidden)]
    pub(crate) test_messages: Vec<(String, String)>, // (channel, text) sent without a transport
}

impl BotServer {
    /// Build the server and its services from configuration.
    pub async fn new(config: Config) -> Result<Self> {
        ensure_data_dir(&config.storage.data_dir).await?;
        let store = AssetStore::open(&config.storage.data_dir).await?;
        let prefix = config.bot.prefix_char();

        let ctx = CommandContext {
            prefix,
            resolver: CraftGraphResolver::new().with_max_depth(config.townstar.max_craft_depth),
            craft_data: CraftDataProvider::new(&config.townstar, &config.storage.data_dir),
            townstar: Mutex::new(TownStarClient::new(config.townstar.clone())),
            opensea: Mutex::new(OpenSeaClient::new(config.opensea.clone(), store)),
            config,
        };
        Ok(Self {
            public_parser: PublicCommandParser::new(prefix, ctx.config.bot.max_craft_quantity),
            public_state: PublicState::new(std::time::Duration::from_millis(
                ctx.config.bot.reply_cooldown_ms,
            )),
            ctx: Arc::new(ctx),
            events_rx: None,
            outgoing_tx: None,
            transport_tasks: Vec::new(),
            last_prune: Instant::now(),
            test_messages: Vec::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    /// Wire a running transport into the server.
    pub fn attach_transport(&mut self, handles: TransportHandles) {
        self.events_rx = Some(handles.events_rx);
        self.outgoing_tx = Some(handles.outgoing_tx);
        self.transport_tasks = handles.tasks;
    }

    /// Process chat events until the transport closes or Ctrl-C.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "{} started (prefix '{}')",
            self.ctx.config.bot.name,
            self.public_parser.prefix()
        );
        let mut events_rx = match self.events_rx.take() {
            Some(rx) => rx,
            None => return Err(anyhow::anyhow!("No transport attached")),
        };
        let outgoing_tx = match self.outgoing_tx.clone() {
            Some(tx) => tx,
            None => return Err(anyhow::anyhow!("No transport attached")),
        };
        let mut commands: JoinSet<()> = JoinSet::new();
        let mut periodic = tokio::time::interval(PRUNE_INTERVAL);
        periodic.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = periodic.tick() => {
                    self.housekeeping();
                }
                Some(joined) = commands.join_next(), if !commands.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Command task failed: {}", e);
                    }
                }
                event = events_rx.recv() => {
                    match event {
                        Some(event) => {
                            if let Some(command) = self.accept(&event) {
                                let ctx = Arc::clone(&self.ctx);
                                let tx = outgoing_tx.clone();
                                commands.spawn(async move {
                                    let reply = ctx.handle_command(command, &event.content).await;
                                    let max = ctx.config.bot.max_message_size;
                                    if let Err(e) = queue_reply(&tx, &event.channel, &reply, max) {
                                        warn!("{}", e);
                                    }
                                });
                            }
                        }
                        None => {
                            info!("Transport event channel closed");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        if !commands.is_empty() {
            info!("Abandoning {} in-flight command(s)", commands.len());
        }
        commands.abort_all();
        self.shutdown();
        Ok(())
    }

    fn housekeeping(&mut self) {
        if self.last_prune.elapsed() >= PRUNE_INTERVAL {
            self.public_state.prune_expired();
            self.last_prune = Instant::now();
        }
    }

    fn shutdown(&mut self) {
        for task in self.transport_tasks.drain(..) {
            task.abort();
        }
        info!("{} stopped", self.ctx.config.bot.name);
    }

    /// Parse and rate limit one message. `None` when there is nothing to
    /// answer.
    fn accept(&mut self, event: &ChatEvent) -> Option<PublicCommand> {
        if event.author_is_bot {
            return None;
        }
        let command = self.public_parser.parse(&event.content);
        if command == PublicCommand::Unknown {
            return None;
        }
        debug!(
            "Command from {} in {}: {}",
            event.author,
            event.channel,
            escape_log(&event.content)
        );
        if !self.public_state.should_reply(&event.author) {
            debug!("Cooldown active for {}; ignoring", event.author);
            return None;
        }
        Some(command)
    }

    /// Handle one incoming message to completion: parse, rate limit,
    /// dispatch, reply.
    pub async fn route_chat_event(&mut self, event: ChatEvent) -> Result<()> {
        let command = match self.accept(&event) {
            Some(command) => command,
            None => return Ok(()),
        };
        let reply = self.ctx.handle_command(command, &event.content).await;
        self.send_reply(&event.channel, &reply)
    }

    fn send_reply(&mut self, channel: &str, text: &str) -> Result<()> {
        let max = self.ctx.config.bot.max_message_size;
        match &self.outgoing_tx {
            Some(tx) => queue_reply(tx, channel, text, max),
            None => {
                if text.is_empty() {
                    return Ok(());
                }
                for chunk in chunk_utf8(text, max) {
                    debug!("Mock send to {}: {}", channel, escape_log(&chunk));
                    self.test_messages.push((channel.to_string(), chunk));
                }
                Ok(())
            }
        }
    }

    /// Feed a message as if it arrived from `author` on the `test` channel.
    #[doc(hidden)]
    pub async fn route_test_message(&mut self, author: &str, content: &str) -> Result<()> {
        self.route_chat_event(ChatEvent {
            channel: "test".to_string(),
            author: author.to_string(),
            author_is_bot: false,
            content: content.to_string(),
        })
        .await
    }

    /// Replies collected while no transport is attached.
    #[doc(hidden)]
    pub fn sent_messages(&self) -> &Vec<(String, String)> {
        &self.test_messages
    }
}

impl CommandContext {
    async fn handle_command(&self, command: PublicCommand, raw: &str) -> String {
        match command {
            PublicCommand::Help => render::help_text(self.prefix, &self.config.opensea.collections),
            PublicCommand::Weekly(Some(name)) => {
                self.leaderboard_reply("Town Star Weekly Competition", &name).await
            }
            PublicCommand::Weekly(None) => {
                let tag = &self.config.bot.team_tag;
                let title = format!("{} Town Star Weekly Competition", tag);
                self.leaderboard_reply(&title, tag).await
            }
            PublicCommand::WeeklyScholars => {
                let title = format!(
                    "{} Town Star Weekly Competition - Scholars",
                    self.config.bot.team_tag
                );
                self.leaderboard_reply(&title, &self.config.bot.scholar_tag).await
            }
            PublicCommand::OpenSea { collection, asset } => {
                self.opensea_reply(&collection, &asset, raw).await
            }
            PublicCommand::Craft { item, quantity } => self.craft_reply(&item, quantity).await,
            PublicCommand::Invalid(reason) => reason,
            PublicCommand::Unknown => String::new(),
        }
    }

    async fn leaderboard_reply(&self, title: &str, fragment: &str) -> String {
        let fetched = self.townstar.lock().await.weekly_leaderboard().await;
        match fetched {
            Ok(users) => {
                let matches = filter_by_name(&users, fragment);
                render::leaderboard(
                    title,
                    fragment,
                    &matches,
                    self.config.bot.max_leaderboard_entries,
                )
            }
            Err(e) => {
                warn!("Weekly leaderboard failed: {}", e);
                LEADERBOARD_UNAVAILABLE.to_string()
            }
        }
    }

    async fn opensea_reply(&self, slug: &str, name: &str, raw: &str) -> String {
        let label = match self.config.opensea.collections.get(slug) {
            Some(c) => c.display_name.clone().unwrap_or_else(|| slug.to_string()),
            None => return format!("`{}` is not supported", raw.trim()),
        };
        let lookup = self.opensea.lock().await.find_asset(slug, name).await;
        match lookup {
            Ok(AssetLookup::Found { asset, detail }) => render::asset_report(&label, &asset, &detail),
            Ok(AssetLookup::NotFound) => format!("Unable to find {} in OpenSea", name),
            Ok(AssetLookup::UnknownCollection) => format!("`{}` is not supported", raw.trim()),
            Err(e) => {
                warn!("OpenSea lookup for '{}' in {} failed: {}", name, slug, e);
                format!("Unable to find {} in OpenSea", name)
            }
        }
    }

    async fn craft_reply(&self, raw_item: &str, quantity: u64) -> String {
        let item = normalize_craft_name(raw_item);
        let loaded = match self.craft_data.load().await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Craft data unavailable: {}", e);
                return CRAFT_DATA_UNAVAILABLE.to_string();
            }
        };
        match self.resolver.resolve_known(&item, &loaded.dataset, quantity) {
            Ok(result) => render::craft_report(&item, quantity, &result),
            Err(CraftError::ItemNotFound(_)) => {
                warn!("Craft item '{}' (from '{}') is not in the dataset", item, escape_log(raw_item));
                let suggestions = loaded.dataset.suggest(raw_item, SUGGESTION_LIMIT);
                render::no_such_item(&item, &suggestions)
            }
            Err(e) => {
                warn!("Craft resolution for '{}' failed: {}", item, e);
                format!("{}: {}", CRAFT_DATA_UNAVAILABLE, e)
            }
        }
    }
}

/// Chunk `text` and queue every piece on the transport.
fn queue_reply(
    tx: &mpsc::UnboundedSender<OutgoingReply>,
    channel: &str,
    text: &str,
    max_bytes: usize,
) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    for chunk in chunk_utf8(text, max_bytes) {
        let reply = OutgoingReply {
            channel: channel.to_string(),
            content: chunk,
        };
        tx.send(reply)
            .map_err(|e| anyhow::anyhow!("Failed to queue reply: {}", e))?;
    }
    Ok(())
}

/// Chunk a UTF-8 string into <= max_bytes segments without splitting codepoints.
/// Splits on newline boundaries preferentially, then falls back to byte slicing.
pub fn chunk_utf8(text: &str, max_bytes: usize) -> Vec<String> {
    let max_bytes = max_bytes.max(4);
    if text.len() <= max_bytes {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max_bytes {
            chunks.push(remaining.to_string());
            break;
        }
        let mut end = max_bytes;
        while end > 0 && !remaining.is_char_boundary(end) {
            end -= 1;
        }
        let slice = &remaining[..end];
        if let Some(pos) = slice.rfind('\n') {
            // only when it does not leave a tiny chunk
            if pos > 0 && pos + 1 >= end / 2 {
                chunks.push(slice[..pos].to_string());
                remaining = &remaining[pos + 1..];
                continue;
            }
        }
        chunks.push(slice.to_string());
        remaining = &remaining[end..];
    }
    chunks
}
