//! Public channel utilities: per-author cooldowns and the command parser.
//!
//! Commands are recognized only when the message starts with the configured
//! prefix (default `!`) followed by a keyword, e.g. `!tsweekly ThirstyGoat` or
//! `!tscraft Blue Steel 3`. Anything else is ordinary conversation and parses
//! to [`PublicCommand::Unknown`].
use log::trace;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::validation::{sanitize_query, validate_craft_quantity};

#[derive(Debug, Default)]
pub struct PublicState {
    pub last_reply: HashMap<String, Instant>, // author -> last reply
    pub reply_cooldown: Duration,
}

impl PublicState {
    pub fn new(reply_cooldown: Duration) -> Self {
        Self {
            last_reply: HashMap::new(),
            reply_cooldown,
        }
    }

    pub fn prune_expired(&mut self) {
        let now = Instant::now();
        // Drop authors idle for a while; they would pass the cooldown anyway
        let ttl = self.reply_cooldown.max(Duration::from_secs(30 * 60));
        self.last_reply.retain(|_, t| now.duration_since(*t) < ttl);
    }

    pub fn should_reply(&mut self, author: &str) -> bool {
        if self.reply_cooldown.is_zero() {
            return true;
        }
        let now = Instant::now();
        match self.last_reply.get(author) {
            Some(last) if now.duration_since(*last) < self.reply_cooldown => false,
            _ => {
                self.last_reply.insert(author.to_string(), now);
                true
            }
        }
    }
}

/// Prefix-aware public command parser
pub struct PublicCommandParser {
    prefix: char,
    max_craft_quantity: u64,
}

fn looks_numeric(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

impl PublicCommandParser {
    pub fn new(prefix: char, max_craft_quantity: u64) -> Self {
        Self {
            prefix,
            max_craft_quantity,
        }
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub fn parse(&self, raw: &str) -> PublicCommand {
        let trimmed = raw.trim();
        let body = match trimmed.strip_prefix(self.prefix) {
            Some(b) => b,
            None => return PublicCommand::Unknown,
        };
        let (keyword, rest) = match body.find(char::is_whitespace) {
            Some(idx) => (&body[..idx], body[idx..].trim()),
            None => (body, ""),
        };
        let keyword = keyword.to_ascii_lowercase();

        match keyword.as_str() {
            "bot-commands" | "help" => {
                trace!("Parsed HELP from '{}'", raw);
                PublicCommand::Help
            }
            "tsweekly" => {
                if rest.is_empty() {
                    return PublicCommand::Weekly(None);
                }
                match sanitize_query(rest) {
                    Ok(name) => {
                        trace!("Parsed TSWEEKLY '{}' from '{}'", name, raw);
                        PublicCommand::Weekly(Some(name))
                    }
                    Err(e) => PublicCommand::Invalid(e.to_string()),
                }
            }
            "tssweekly" => PublicCommand::WeeklyScholars,
            "tscraft" => self.parse_craft(rest),
            k if k.starts_with("os-") && k.len() > 3 => {
                let collection = k[3..].to_string();
                if rest.is_empty() {
                    return PublicCommand::Invalid("Opensea request was malformed".into());
                }
                match sanitize_query(rest) {
                    Ok(asset) => {
                        trace!("Parsed OPENSEA {} '{}' from '{}'", collection, asset, raw);
                        PublicCommand::OpenSea { collection, asset }
                    }
                    Err(e) => PublicCommand::Invalid(e.to_string()),
                }
            }
            _ => PublicCommand::Unknown,
        }
    }

    fn parse_craft(&self, rest: &str) -> PublicCommand {
        let mut tokens: Vec<&str> = rest.split_whitespace().collect();
        let mut quantity = 1;
        if tokens.len() > 1 && tokens.last().is_some_and(|t| looks_numeric(t)) {
            let raw_qty = tokens.pop().unwrap_or("1");
            quantity = match validate_craft_quantity(raw_qty, self.max_craft_quantity) {
                Ok(q) => q,
                Err(e) => return PublicCommand::Invalid(e.to_string()),
            };
        }
        match sanitize_query(&tokens.join(" ")) {
            Ok(item) => {
                trace!("Parsed TSCRAFT '{}' x{}", item, quantity);
                PublicCommand::Craft { item, quantity }
            }
            Err(_) => PublicCommand::Invalid("Item name required".into()),
        }
    }
}

impl Default for PublicCommandParser {
    fn default() -> Self {
        Self::new('!', 1000)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PublicCommand {
    Help,
    Weekly(Option<String>),
    WeeklyScholars,
    OpenSea { collection: String, asset: String },
    Craft { item: String, quantity: u64 },
    Unknown,
    Invalid(String),
}
