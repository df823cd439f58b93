//! Crafting cost resolution.
//!
//! Walks the "item requires N of sub-item" graph from a root item and produces a
//! flattened, multiplier-weighted bill of materials. The walk is depth-first and
//! iterative: every node expanded along a path multiplies the quantities of its
//! requirements by the product of edge quantities from the root.
//!
//! The source data carries no acyclicity guarantee. Expansion therefore tracks
//! the items on the current path (not a global visited set, so diamond-shaped
//! graphs still accumulate once per path) and enforces a maximum depth.

use log::trace;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

use super::dataset::{is_inert, CraftDataset, CraftRecipe, REQUIREMENT_SLOTS};

/// Materials obtained passively; never reported and never expanded.
pub const PASSIVE_MATERIALS: [&str; 4] = ["Energy", "Water_Drum", "Crude_Oil", "Water"];

/// Default bound on expansion depth. Real Town Star chains are under ten deep.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CraftError {
    #[error("no such craft item: {0}")]
    ItemNotFound(String),

    #[error("invalid quantity {0}: must be at least 1")]
    InvalidQuantity(u64),

    #[error("requirement cycle detected: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("expanding {item} exceeded the maximum depth of {max_depth}")]
    DepthExceeded { item: String, max_depth: usize },

    #[error("quantity overflow while expanding {item}")]
    QuantityOverflow { item: String },
}

pub fn is_passive(name: &str) -> bool {
    PASSIVE_MATERIALS.contains(&name)
}

/// Material totals in first-discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl ResolutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, material: &str, amount: u64) -> Result<(), CraftError> {
        match self.index.get(material) {
            Some(&i) => {
                let slot = &mut self.entries[i].1;
                *slot = slot
                    .checked_add(amount)
                    .ok_or_else(|| CraftError::QuantityOverflow {
                        item: material.to_string(),
                    })?;
            }
            None => {
                self.index.insert(material.to_string(), self.entries.len());
                self.entries.push((material.to_string(), amount));
            }
        }
        Ok(())
    }

    pub fn get(&self, material: &str) -> Option<u64> {
        self.index.get(material).map(|&i| self.entries[i].1)
    }

    pub fn contains(&self, material: &str) -> bool {
        self.index.contains_key(material)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    /// Name-sorted copy, for order-insensitive comparison.
    pub fn to_sorted_map(&self) -> BTreeMap<String, u64> {
        self.entries.iter().cloned().collect()
    }
}

struct Frame<'a> {
    item: &'a str,
    multiplier: u64,
    slots: [(&'a str, u64); REQUIREMENT_SLOTS],
    next: usize,
}

impl<'a> Frame<'a> {
    fn new(item: &'a str, multiplier: u64, recipe: &'a CraftRecipe) -> Self {
        Self {
            item,
            multiplier,
            slots: recipe.slots(),
            next: 0,
        }
    }
}

/// Computes transitive material requirements over a [`CraftDataset`].
///
/// The resolver is a pure function of its inputs; one instance can serve any
/// number of concurrent requests.
#[derive(Debug, Clone)]
pub struct CraftGraphResolver {
    max_depth: usize,
}

impl Default for CraftGraphResolver {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CraftGraphResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound expansion depth (root counts as depth 1). Clamped to at least 1.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Total non-passive materials needed for `quantity` units of `root`.
    ///
    /// A root missing from the dataset has no requirements and yields an empty
    /// result; use [`resolve_known`](Self::resolve_known) to tell that apart from
    /// an item that genuinely needs nothing.
    pub fn resolve(
        &self,
        root: &str,
        dataset: &CraftDataset,
        quantity: u64,
    ) -> Result<ResolutionResult, CraftError> {
        if quantity == 0 {
            return Err(CraftError::InvalidQuantity(quantity));
        }
        let mut result = ResolutionResult::new();
        let Some(recipe) = dataset.get(root) else {
            trace!("craft root '{}' not in dataset; nothing to expand", root);
            return Ok(result);
        };

        let mut on_path: HashSet<&str> = HashSet::from([root]);
        let mut stack = vec![Frame::new(root, quantity, recipe)];

        while let Some(frame) = stack.last_mut() {
            let Some(&(name, qty)) = frame.slots.get(frame.next) else {
                let done = frame.item;
                on_path.remove(done);
                stack.pop();
                continue;
            };
            frame.next += 1;
            let multiplier = frame.multiplier;

            if is_inert(name) || is_passive(name) {
                continue;
            }

            let amount = qty
                .checked_mul(multiplier)
                .ok_or_else(|| CraftError::QuantityOverflow {
                    item: name.to_string(),
                })?;
            result.add(name, amount)?;

            // Raw resource: counted, never expanded.
            let Some(sub_recipe) = dataset.get(name) else {
                continue;
            };

            if on_path.contains(name) {
                let mut path: Vec<String> = stack.iter().map(|f| f.item.to_string()).collect();
                path.push(name.to_string());
                return Err(CraftError::CycleDetected { path });
            }
            if stack.len() >= self.max_depth {
                return Err(CraftError::DepthExceeded {
                    item: name.to_string(),
                    max_depth: self.max_depth,
                });
            }

            on_path.insert(name);
            stack.push(Frame::new(name, amount, sub_recipe));
        }

        Ok(result)
    }

    /// Like [`resolve`](Self::resolve) but reports a root missing from the
    /// dataset as [`CraftError::ItemNotFound`].
    pub fn resolve_known(
        &self,
        root: &str,
        dataset: &CraftDataset,
        quantity: u64,
    ) -> Result<ResolutionResult, CraftError> {
        if !dataset.contains(root) {
            return Err(CraftError::ItemNotFound(root.to_string()));
        }
        self.resolve(root, dataset, quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(json: &str) -> CraftDataset {
        CraftDataset::from_json(json).expect("dataset")
    }

    #[test]
    fn results_keep_discovery_order() {
        let ds = dataset(
            r#"{"A": {"Req1": "C", "Value1": 1, "Req2": "B", "Value2": 1},
                "C": {"Req1": "D", "Value1": 1}}"#,
        );
        let result = CraftGraphResolver::new().resolve("A", &ds, 1).unwrap();
        let names: Vec<&str> = result.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["C", "D", "B"]);
    }

    #[test]
    fn zero_quantity_rejected() {
        let ds = dataset(r#"{"A": {"Req1": "B", "Value1": 1}}"#);
        assert_eq!(
            CraftGraphResolver::new().resolve("A", &ds, 0),
            Err(CraftError::InvalidQuantity(0))
        );
    }

    #[test]
    fn zero_quantity_edges_still_listed() {
        let ds = dataset(r#"{"A": {"Req1": "B", "Value1": 0}}"#);
        let r = CraftGraphResolver::new().resolve("A", &ds, 5).unwrap();
        assert_eq!(r.get("B"), Some(0));
    }

    #[test]
    fn overflow_is_reported() {
        let ds = dataset(
            r#"{"A": {"Req1": "B", "Value1": 4294967296},
                "B": {"Req1": "C", "Value1": 4294967296}}"#,
        );
        let err = CraftGraphResolver::new().resolve("A", &ds, 2).unwrap_err();
        assert_eq!(err, CraftError::QuantityOverflow { item: "C".into() });
    }

    #[test]
    fn indirect_cycle_reports_path() {
        let ds = dataset(
            r#"{"A": {"Req1": "B", "Value1": 1},
                "B": {"Req1": "C", "Value1": 1},
                "C": {"Req1": "A", "Value1": 1}}"#,
        );
        match CraftGraphResolver::new().resolve("A", &ds, 1) {
            Err(CraftError::CycleDetected { path }) => {
                assert_eq!(path, vec!["A", "B", "C", "A"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn depth_limit_applies_to_long_chains() {
        let ds = dataset(
            r#"{"A": {"Req1": "B", "Value1": 1},
                "B": {"Req1": "C", "Value1": 1},
                "C": {"Req1": "D", "Value1": 1},
                "D": {"Req1": "E", "Value1": 1}}"#,
        );
        let shallow = CraftGraphResolver::new().with_max_depth(2);
        assert!(matches!(
            shallow.resolve("A", &ds, 1),
            Err(CraftError::DepthExceeded { max_depth: 2, .. })
        ));
        let deep = CraftGraphResolver::new().with_max_depth(4);
        let r = deep.resolve("A", &ds, 1).unwrap();
        assert_eq!(r.get("E"), Some(1));
    }

    #[test]
    fn resolve_known_flags_missing_root() {
        let ds = dataset(r#"{"A": {"Req1": "B", "Value1": 1}}"#);
        assert_eq!(
            CraftGraphResolver::new().resolve_known("Nope", &ds, 1),
            Err(CraftError::ItemNotFound("Nope".into()))
        );
    }
}
