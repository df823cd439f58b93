//! OpenSea REST payloads. Only the fields the bot reads are modelled; every
//! field tolerates being absent.

use serde::{Deserialize, Deserializer, Serialize};

/// Explicit `null` reads as the field's default, like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of `GET /assets`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetPage {
    #[serde(default)]
    pub assets: Vec<AssetElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetElement {
    #[serde(default)]
    pub token_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A cached pointer from an asset name to its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAsset {
    pub token_id: String,
    pub name: String,
    pub contract_address: String,
    pub collection: String,
}

/// `GET /asset/{contract}/{token_id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetDetail {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub num_sales: Option<u64>,
    #[serde(default)]
    pub last_sale: Option<LastSale>,
    #[serde(default)]
    pub collection: Option<CollectionRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastSale {
    /// Integer amount in the payment token's smallest unit, as a string.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_price: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_token: PaymentToken,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentToken {
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub decimals: u32,
}

impl LastSale {
    /// `total_price / 10^decimals` followed by the token symbol, e.g.
    /// `"0.25 ETH"`. `None` when the price is not a number.
    pub fn display_price(&self) -> Option<String> {
        let raw: f64 = self.total_price.trim().parse().ok()?;
        let value = raw / 10f64.powi(self.payment_token.decimals as i32);
        let symbol = self.payment_token.symbol.trim();
        if symbol.is_empty() {
            Some(format!("{}", value))
        } else {
            Some(format!("{} {}", value, symbol))
        }
    }
}
