//! Plain-text reply formatting.

use std::collections::BTreeMap;

use crate::config::CollectionConfig;
use crate::craft::ResolutionResult;
use crate::opensea::{AssetDetail, CachedAsset};
use crate::townstar::LeaderboardUser;

pub const NO_SALE_DATA: &str = "No sale data available";

/// Command overview for the help command.
pub fn help_text(prefix: char, collections: &BTreeMap<String, CollectionConfig>) -> String {
    let mut out = String::from("Supported Bot Commands:\n\n");
    out.push_str(&format!(
        "`{p}tsweekly` - Weekly leaderboard for team towns\n\
         `{p}tsweekly name` - Weekly leaderboard position for all towns with name in it, e.g. `{p}tsweekly ThirstyGoat`\n\
         `{p}tssweekly` - Weekly leaderboard for team scholars\n\
         `{p}tscraft item [quantity]` - Materials needed to craft an item, e.g. `{p}tscraft Blue Steel 2`\n",
        p = prefix
    ));
    for (slug, collection) in collections {
        let label = collection.display_name.as_deref().unwrap_or(slug.as_str());
        out.push_str(&format!(
            "`{}os-{} NFT Name` - OpenSea information for an item in the {} collection\n",
            prefix, slug, label
        ));
    }
    out.push_str(&format!("`{}bot-commands` - This message", prefix));
    out
}

/// Leaderboard listing, capped at `max` rows.
pub fn leaderboard(title: &str, fragment: &str, users: &[&LeaderboardUser], max: usize) -> String {
    if users.is_empty() {
        return format!("{}\nNo towns found with {} in their name.", title, fragment);
    }
    let mut out = format!("{} ({} with {} in their name)\n", title, users.len(), fragment);
    for user in users.iter().take(max) {
        out.push_str(&format!("{} - Rank: {} Score: {}\n", user.name, user.rank, user.score));
    }
    if users.len() > max {
        out.push_str(&format!("... and {} more", users.len() - max));
    }
    out.trim_end().to_string()
}

/// Bill of materials for `quantity` x `item`. Totals in `result` already
/// include the quantity.
pub fn craft_report(item: &str, quantity: u64, result: &ResolutionResult) -> String {
    if result.is_empty() {
        return format!("{} needs no craftable materials.", item);
    }
    let width = result.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = format!("Crafting {} x {} requires:\n```\n", quantity, item);
    for (name, amount) in result.iter() {
        out.push_str(&format!("{:<width$}  {}\n", name, amount, width = width));
    }
    out.push_str("```");
    out
}

/// Reply for an item that is not in the dataset.
pub fn no_such_item(item: &str, suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        format!("No such item: {}", item)
    } else {
        format!("No such item: {}. Did you mean: {}?", item, suggestions.join(", "))
    }
}

/// Summary of an OpenSea asset.
pub fn asset_report(collection_label: &str, asset: &CachedAsset, detail: &AssetDetail) -> String {
    let name = detail.name.as_deref().unwrap_or(asset.name.as_str());
    let collection = detail
        .collection
        .as_ref()
        .and_then(|c| c.name.as_deref())
        .unwrap_or(collection_label);
    let mut out = format!("OpenSea {} Asset: {}\n", collection, name);
    if let Some(description) = detail.description.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push_str(&format!("{}\n", description.trim()));
    }
    if let Some(sales) = detail.num_sales {
        out.push_str(&format!("Sales: {}\n", sales));
    }
    let last_sale = detail
        .last_sale
        .as_ref()
        .and_then(|s| s.display_price())
        .unwrap_or_else(|| NO_SALE_DATA.to_string());
    out.push_str(&format!("Last sale price: {}\n", last_sale));
    if let Some(link) = detail.permalink.as_deref() {
        out.push_str(&format!("{}\n", link));
    }
    if let Some(image) = detail.image_url.as_deref().filter(|u| !u.is_empty()) {
        out.push_str(&format!("{}\n", image));
    }
    out.trim_end().to_string()
}
