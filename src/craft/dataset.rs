//! Town Star craft dataset: the `CraftsData.json` document keyed by item name.
//!
//! Each entry describes how one unit of an item is produced through up to three
//! `ReqN`/`ValueN` requirement slots. A slot named `none` is inert. Only the
//! requirement slots are modelled; the remaining fields of the document
//! (`Class`, `CityPrice`, `Time0`..) are ignored on load.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Sentinel used by the dataset for an unused requirement slot.
pub const REQUIREMENT_NONE: &str = "none";

/// Number of requirement slots a recipe carries.
pub const REQUIREMENT_SLOTS: usize = 3;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("malformed craft data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("craft data contains no recipes")]
    Empty,

    #[error("recipe for {item} has {count} requirements (max 3)")]
    TooManyRequirements { item: String, count: usize },
}

fn none_name() -> String {
    REQUIREMENT_NONE.to_string()
}

// Missing, null and blank names all collapse to the inert sentinel.
fn de_requirement_name<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let name = Option::<String>::deserialize(d)?;
    Ok(match name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => none_name(),
    })
}

// Quantities are published as JSON numbers; integral floats (`2.0`) are accepted,
// negative or fractional values reject the whole document.
fn de_quantity<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let number = Option::<serde_json::Number>::deserialize(d)?;
    let Some(n) = number else { return Ok(0) };
    if let Some(v) = n.as_u64() {
        return Ok(v);
    }
    match n.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(serde::de::Error::custom(format!(
            "invalid requirement quantity {}",
            n
        ))),
    }
}

/// How one unit of an item is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftRecipe {
    #[serde(rename = "Req1", default = "none_name", deserialize_with = "de_requirement_name")]
    pub req1: String,
    #[serde(rename = "Value1", default, deserialize_with = "de_quantity")]
    pub value1: u64,
    #[serde(rename = "Req2", default = "none_name", deserialize_with = "de_requirement_name")]
    pub req2: String,
    #[serde(rename = "Value2", default, deserialize_with = "de_quantity")]
    pub value2: u64,
    #[serde(rename = "Req3", default = "none_name", deserialize_with = "de_requirement_name")]
    pub req3: String,
    #[serde(rename = "Value3", default, deserialize_with = "de_quantity")]
    pub value3: u64,
}

impl Default for CraftRecipe {
    fn default() -> Self {
        Self {
            req1: none_name(),
            value1: 0,
            req2: none_name(),
            value2: 0,
            req3: none_name(),
            value3: 0,
        }
    }
}

impl CraftRecipe {
    /// Build a recipe from `(name, quantity)` pairs, filling slots in order.
    pub fn from_requirements(item: &str, reqs: &[(&str, u64)]) -> Result<Self, DatasetError> {
        if reqs.len() > REQUIREMENT_SLOTS {
            return Err(DatasetError::TooManyRequirements {
                item: item.to_string(),
                count: reqs.len(),
            });
        }
        let mut recipe = Self::default();
        let slots = [
            (&mut recipe.req1, &mut recipe.value1),
            (&mut recipe.req2, &mut recipe.value2),
            (&mut recipe.req3, &mut recipe.value3),
        ];
        for ((name, qty), (slot_name, slot_qty)) in reqs.iter().zip(slots) {
            *slot_name = name.to_string();
            *slot_qty = *qty;
        }
        Ok(recipe)
    }

    /// All three slots in order, inert ones included.
    pub fn slots(&self) -> [(&str, u64); REQUIREMENT_SLOTS] {
        [
            (self.req1.as_str(), self.value1),
            (self.req2.as_str(), self.value2),
            (self.req3.as_str(), self.value3),
        ]
    }

    /// Slots that name a real requirement.
    pub fn requirements(&self) -> impl Iterator<Item = (&str, u64)> {
        self.slots()
            .into_iter()
            .filter(|(name, _)| !is_inert(name))
    }

    pub fn is_raw(&self) -> bool {
        self.requirements().next().is_none()
    }
}

/// True for the `none` sentinel.
pub fn is_inert(name: &str) -> bool {
    name == REQUIREMENT_NONE
}

/// Item name -> recipe mapping. Immutable once loaded for a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CraftDataset {
    recipes: HashMap<String, CraftRecipe>,
}

impl CraftDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the published JSON document.
    pub fn from_json(content: &str) -> Result<Self, DatasetError> {
        let recipes: HashMap<String, CraftRecipe> =
            serde_json::from_str(content.trim_start_matches('\u{feff}'))?;
        if recipes.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { recipes })
    }

    pub fn insert(&mut self, item: impl Into<String>, recipe: CraftRecipe) {
        self.recipes.insert(item.into(), recipe);
    }

    pub fn get(&self, item: &str) -> Option<&CraftRecipe> {
        self.recipes.get(item)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.recipes.contains_key(item)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Case-insensitive substring matches on item names, sorted, at most `limit`.
    /// Underscores and spaces in the query are treated alike.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        let needle = query.trim().to_lowercase().replace(' ', "_");
        if needle.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<String> = self
            .recipes
            .keys()
            .filter(|name| name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort();
        hits.truncate(limit);
        hits
    }
}

impl FromIterator<(String, CraftRecipe)> for CraftDataset {
    fn from_iter<I: IntoIterator<Item = (String, CraftRecipe)>>(iter: I) -> Self {
        Self {
            recipes: iter.into_iter().collect(),
        }
    }
}
