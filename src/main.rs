//! Binary entrypoint for the ntmbot CLI.
//!
//! Commands:
//! - `start [--console]` - run the bot on Discord, or on stdin/stdout with `--console`
//! - `init` - create a starter `config.toml` and the data directory
//! - `craft <ITEM...> [-q N] [--dataset FILE]` - print the materials needed for an item
//! - `status` - print configuration and cache summary
//!
//! See the library crate docs for module-level details: `ntmbot::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::Path;

use ntmbot::bot::BotServer;
use ntmbot::config::Config;
use ntmbot::craft::{normalize_craft_name, CraftDataset, CraftError, CraftGraphResolver};
use ntmbot::logutil::redact;
use ntmbot::opensea::AssetStore;
use ntmbot::storage::{ensure_data_dir, read_text_file};
use ntmbot::townstar::{CraftDataProvider, CraftDataSource};

#[derive(Parser)]
#[command(name = "ntmbot")]
#[command(about = "Town Star team chat bot: leaderboards, crafting costs and OpenSea lookups")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Start {
        /// Read commands from stdin instead of connecting to Discord
        #[arg(long)]
        console: bool,
    },
    /// Initialize a new configuration
    Init,
    /// Print the base materials needed to craft an item
    Craft {
        /// Item name, e.g. "blue steel"
        #[arg(required = true)]
        item: Vec<String>,
        /// Number of items to craft
        #[arg(short, long, default_value_t = 1)]
        quantity: u64,
        /// Read the craft dataset from this file instead of fetching it
        #[arg(long)]
        dataset: Option<String>,
    },
    /// Show configuration and cache status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init writes the config, so there is nothing to load yet
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start { console } => {
            let mut config = load_config(&cli.config).await?;
            config.apply_env_overrides();
            info!("Starting ntmbot v{}", env!("CARGO_PKG_VERSION"));

            let use_console = console || config.bot.transport.eq_ignore_ascii_case("console");
            let mut server = BotServer::new(config.clone()).await?;
            if use_console {
                info!("Using console transport; type commands, Ctrl-D to quit");
                server.attach_transport(ntmbot::transport::console::spawn_console());
            } else {
                server.attach_transport(start_discord(&config).await?);
            }
            server.run().await?;
        }
        Commands::Init => {
            if Path::new(&cli.config).exists() {
                return Err(anyhow!(
                    "{} already exists; remove it first to regenerate",
                    cli.config
                ));
            }
            Config::create_default(&cli.config).await?;
            let config = Config::default();
            ensure_data_dir(&config.storage.data_dir).await?;
            println!("Created {} and {}", cli.config, config.storage.data_dir);
            println!("Set DISCORD_BOT_KEY, TOWNSTAR_SECRET and OPENSEA_API_KEY before `ntmbot start`.");
        }
        Commands::Craft {
            item,
            quantity,
            dataset,
        } => {
            let mut config = pre_config.unwrap_or_default();
            config.apply_env_overrides();
            run_craft(&config, &item.join(" "), quantity, dataset.as_deref()).await?;
        }
        Commands::Status => {
            let mut config = load_config(&cli.config).await?;
            config.apply_env_overrides();
            print_status(&config).await?;
        }
    }

    Ok(())
}

async fn load_config(path: &str) -> Result<Config> {
    Config::load(path)
        .await
        .map_err(|e| anyhow!("{} (run `ntmbot init` to create one)", e))
}

#[cfg(feature = "discord")]
async fn start_discord(config: &Config) -> Result<ntmbot::transport::TransportHandles> {
    ntmbot::transport::discord::spawn_discord(&config.discord.token).await
}

#[cfg(not(feature = "discord"))]
async fn start_discord(_config: &Config) -> Result<ntmbot::transport::TransportHandles> {
    Err(anyhow!(
        "Built without the `discord` feature; use `start --console`"
    ))
}

async fn run_craft(config: &Config, raw_item: &str, quantity: u64, dataset_path: Option<&str>) -> Result<()> {
    let dataset = match dataset_path {
        Some(path) => {
            let raw = read_text_file(Path::new(path))
                .await?
                .ok_or_else(|| anyhow!("Dataset file {} not found", path))?;
            CraftDataset::from_json(&raw).map_err(|e| anyhow!("{}: {}", path, e))?
        }
        None => {
            let provider = CraftDataProvider::new(&config.townstar, &config.storage.data_dir);
            let loaded = provider.load().await?;
            if loaded.source == CraftDataSource::Cached {
                warn!("Using cached craft data from {}", provider.cache_path().display());
            }
            loaded.dataset
        }
    };

    let item = normalize_craft_name(raw_item);
    let resolver = CraftGraphResolver::new().with_max_depth(config.townstar.max_craft_depth);
    match resolver.resolve_known(&item, &dataset, quantity) {
        Ok(result) => {
            println!("{}", ntmbot::bot::render::craft_report(&item, quantity, &result));
            Ok(())
        }
        Err(CraftError::ItemNotFound(_)) => {
            let suggestions = dataset.suggest(raw_item, 5);
            Err(anyhow!(ntmbot::bot::render::no_such_item(&item, &suggestions)))
        }
        Err(e) => Err(e.into()),
    }
}

async fn print_status(config: &Config) -> Result<()> {
    println!("ntmbot v{}", env!("CARGO_PKG_VERSION"));
    println!("Bot name: {}", config.bot.name);
    println!("Command prefix: {}", config.bot.prefix_char());
    println!("Transport: {}", config.bot.transport);
    println!("Discord token: {}", redact(&config.discord.token));
    println!("Town Star API: {}", config.townstar.api_base);
    println!("Town Star secret: {}", redact(&config.townstar.secret));
    println!("OpenSea API key: {}", redact(&config.opensea.api_key));
    for (slug, collection) in &config.opensea.collections {
        println!(
            "  collection {}{}",
            slug,
            if collection.cache_only { " (cache only)" } else { "" }
        );
    }
    println!("Data directory: {}", config.storage.data_dir);

    let provider = CraftDataProvider::new(&config.townstar, &config.storage.data_dir);
    match provider.load_cached().await {
        Ok(Some(dataset)) => println!("Cached craft data: {} recipes", dataset.len()),
        Ok(None) => println!("Cached craft data: none"),
        Err(e) => println!("Cached craft data: unreadable ({})", e),
    }
    match AssetStore::open(&config.storage.data_dir).await {
        Ok(store) => println!("OpenSea asset index: {} assets", store.len()),
        Err(e) => println!("OpenSea asset index: unreadable ({})", e),
    }
    Ok(())
}

fn open_append(path: &str) -> Option<std::fs::File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    // serenity and its HTTP stack are chatty below warn
    builder.filter_module("serenity", log::LevelFilter::Warn);
    builder.filter_module("tracing", log::LevelFilter::Warn);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_deref())
        .and_then(open_append)
        .map(|f| Arc::new(Mutex::new(f)));
    let error_file = config
        .as_ref()
        .and_then(|c| c.logging.error_file.as_deref())
        .and_then(open_append)
        .map(|f| Arc::new(Mutex::new(f)));

    if log_file.is_none() && error_file.is_none() {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    } else {
        // Echo to the console only in the foreground
        let is_tty = atty::is(atty::Stream::Stdout) || log_file.is_none();
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());

            if let Some(ref file) = log_file {
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
            }
            if record.level() == log::Level::Error {
                if let Some(ref file) = error_file {
                    if let Ok(mut guard) = file.lock() {
                        let _ = writeln!(guard, "{}", line);
                    }
                }
            }

            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    }
    let _ = builder.try_init();
}
