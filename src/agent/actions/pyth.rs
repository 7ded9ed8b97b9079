// src/agent/actions/pyth.rs

use async_trait::async_trait;

use crate::{
    agent::registry::{
        ActionArgs, ActionContext, ActionDescriptor, ActionError, ActionHandler, ActionOutcome,
        ArgumentSchema, FieldKind,
    },
    blockchain::models::Network,
};

const FETCH_PRICE_FEED_ID_DESCRIPTION: &str = r#"
Fetch the price feed ID for a given token symbol (e.g. BTC, ETH) from Pyth."#;

const FETCH_PRICE_DESCRIPTION: &str = r#"
Fetch the price of a given price feed from Pyth.

Inputs:
- Pyth price feed ID

Important notes:
- Do not assume that a random ID is a Pyth price feed ID. If you are confused, ask a clarifying question.
- This action only fetches price inputs from Pyth price feeds. No other source.
- If you are asked to fetch the price from Pyth for a ticker symbol such as BTC, you must first use the fetch_price_feed_id action to retrieve the price feed ID before invoking the fetch_price action."#;

// Prices come from an off-chain service.
fn any_network(_network: &Network) -> bool {
    true
}

pub fn descriptors() -> Vec<ActionDescriptor> {
    vec![
        ActionDescriptor::new(
            "fetch_price_feed_id",
            FETCH_PRICE_FEED_ID_DESCRIPTION,
            "Error fetching price feed ID",
            ArgumentSchema::new().required(
                "token_symbol",
                FieldKind::Text,
                "The token symbol to fetch the price feed ID for",
            ),
            any_network,
            FetchPriceFeedId,
        ),
        ActionDescriptor::new(
            "fetch_price",
            FETCH_PRICE_DESCRIPTION,
            "Error fetching price",
            ArgumentSchema::new().required(
                "price_feed_id",
                FieldKind::Text,
                "The price feed ID to fetch the price for",
            ),
            any_network,
            FetchPrice,
        ),
    ]
}

struct FetchPriceFeedId;

#[async_trait]
impl ActionHandler for FetchPriceFeedId {
    async fn execute(&self, ctx: &ActionContext, args: &ActionArgs) -> Result<ActionOutcome, ActionError> {
        let symbol = args.required_text("token_symbol")?;
        let feed_id = ctx.prices.price_feed_id(symbol).await?;
        Ok(ActionOutcome::text(feed_id))
    }
}

struct FetchPrice;

#[async_trait]
impl ActionHandler for FetchPrice {
    async fn execute(&self, ctx: &ActionContext, args: &ActionArgs) -> Result<ActionOutcome, ActionError> {
        let feed_id = args.required_text("price_feed_id")?;
        let price = ctx.prices.latest_price(feed_id).await?;
        Ok(ActionOutcome::text(price))
    }
}
