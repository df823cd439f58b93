//! # Crafting Cost Module
//!
//! Answers "what does it take to make N of this item?" for Town Star crafts.
//!
//! - [`dataset`] - the craft dataset (item -> up to three `(requirement, quantity)` slots)
//! - [`resolver`] - transitive, multiplier-weighted expansion into base materials
//! - [`normalize`] - user text to dataset key conversion (`"candy canes"` -> `Candy_Canes`)
//!
//! ## Usage
//!
//! ```rust
//! use ntmbot::craft::{normalize_craft_name, CraftDataset, CraftGraphResolver};
//!
//! let dataset = CraftDataset::from_json(
//!     r#"{"Candy_Canes": {"Req1": "Sugar", "Value1": 2, "Req2": "Energy", "Value2": 5},
//!         "Sugar": {"Req1": "Sugar_Cane", "Value1": 3}}"#,
//! ).unwrap();
//! let item = normalize_craft_name("candy canes");
//! let bill = CraftGraphResolver::new().resolve_known(&item, &dataset, 10).unwrap();
//! assert_eq!(bill.get("Sugar"), Some(20));
//! assert_eq!(bill.get("Sugar_Cane"), Some(60));
//! assert_eq!(bill.get("Energy"), None); // passive
//! ```
//!
//! The requested quantity is folded into the traversal as the initial
//! multiplier. Presentation code must not multiply the totals again.

pub mod dataset;
pub mod normalize;
pub mod resolver;

pub use dataset::{CraftDataset, CraftRecipe, DatasetError, REQUIREMENT_NONE};
pub use normalize::normalize_craft_name;
pub use resolver::{
    is_passive, CraftError, CraftGraphResolver, ResolutionResult, DEFAULT_MAX_DEPTH,
    PASSIVE_MATERIALS,
};
