//! # OpenSea Module
//!
//! Marketplace lookups for NFT collections configured under
//! `[opensea.collections.<slug>]`.
//!
//! OpenSea has no search-by-name endpoint, so names are resolved through a
//! local [`AssetStore`] that is filled by scanning collection pages on a miss.

pub mod asset_store;
pub mod client;
pub mod types;

pub use asset_store::AssetStore;
pub use client::{AssetLookup, OpenSeaClient};
pub use types::{AssetDetail, CachedAsset, LastSale};
