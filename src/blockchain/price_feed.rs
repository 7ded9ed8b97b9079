//! Pyth Hermes price service client.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;

const PRICE_FEED_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct FeedAttributes {
    #[serde(default)]
    base: String,
    #[serde(default)]
    quote_currency: String,
}

#[derive(Debug, Deserialize)]
struct PriceFeed {
    id: String,
    attributes: FeedAttributes,
}

#[derive(Clone, Debug)]
pub struct PythClient {
    http: reqwest::Client,
    base_url: String,
}

impl PythClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(PRICE_FEED_TIMEOUT)
            .build()
            .context("Failed to build price feed HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<url::Url> {
        url::Url::parse_with_params(&format!("{}{}", self.base_url, path), params)
            .with_context(|| format!("Invalid price service URL {}", self.base_url))
    }

    /// Price feed id for `symbol`, preferring the USD quote.
    pub async fn price_feed_id(&self, symbol: &str) -> Result<String> {
        let feeds: Vec<PriceFeed> = self
            .http
            .get(self.endpoint("/v2/price_feeds", &[("query", symbol), ("asset_type", "crypto")])?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Unexpected price feed listing")?;

        let matching: Vec<&PriceFeed> = feeds
            .iter()
            .filter(|feed| feed.attributes.base.eq_ignore_ascii_case(symbol))
            .collect();
        matching
            .iter()
            .find(|feed| feed.attributes.quote_currency == "USD")
            .or_else(|| matching.first())
            .map(|feed| feed.id.clone())
            .ok_or_else(|| anyhow!("No price feed found for {}", symbol))
    }

    /// Latest price of `feed_id` as a decimal string.
    pub async fn latest_price(&self, feed_id: &str) -> Result<String> {
        let body: Value = self
            .http
            .get(self.endpoint("/v2/updates/price/latest", &[("ids[]", feed_id)])?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Unexpected price update response")?;

        let price = &body["parsed"][0]["price"];
        let mantissa = price["price"]
            .as_str()
            .ok_or_else(|| anyhow!("No price data found for {}", feed_id))?;
        let expo = price["expo"]
            .as_i64()
            .ok_or_else(|| anyhow!("No price exponent found for {}", feed_id))?;
        scale_price(mantissa, expo)
    }
}

/// Renders `mantissa * 10^expo` exactly, without trailing zeros.
pub fn scale_price(mantissa: &str, expo: i64) -> Result<String> {
    let (negative, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(anyhow!("invalid price mantissa '{}'", mantissa));
    }

    let mut rendered = if expo >= 0 {
        format!("{}{}", digits, "0".repeat(expo as usize))
    } else {
        let scale = expo.unsigned_abs() as usize;
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            int_part.to_string()
        } else {
            format!("{}.{}", int_part, frac_part)
        }
    };
    if negative {
        rendered.insert(0, '-');
    }
    Ok(rendered)
}
