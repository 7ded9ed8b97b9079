//! Tests for the on-chain and price actions against mocked endpoints

mod common;

use mockito::{mock, Matcher, Mock};
use serde_json::json;

use common::{context_with, RecordingSwaps, TEST_ADDRESS, TOKEN};
use onchain_agent_server::agent::{actions::default_registry, registry::ActionContext};

const RECIPIENT: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

fn rpc_url(path: &str) -> String {
    format!("{}/{}", mockito::server_url(), path)
}

/// RPC mock answering `method` at `/<path>` with `result`.
fn rpc_mock(path: &str, method: &str, result: &str) -> Mock {
    mock("POST", format!("/{}", path).as_str())
        .match_body(Matcher::PartialJson(json!({ "method": method })))
        .with_header("content-type", "application/json")
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string())
        .create()
}

/// Mocks for a successful send: nonce, gas estimate, gas price and broadcast.
fn send_mocks(path: &str) -> Vec<Mock> {
    vec![
        rpc_mock(path, "eth_getTransactionCount", "0x0"),
        rpc_mock(path, "eth_estimateGas", "0x5208"),
        rpc_mock(path, "eth_gasPrice", "0x3b9aca00"),
        rpc_mock(path, "eth_sendRawTransaction", TX_HASH),
    ]
}

fn context(chain_id: &str, path: &str) -> ActionContext {
    context_with(
        chain_id,
        &rpc_url(path),
        "http://127.0.0.1:9",
        RecordingSwaps::succeeding("0x0"),
    )
}

#[tokio::test]
async fn test_native_transfer_returns_transaction_hash() {
    let _mocks = send_mocks("actions-native");
    let ctx = context("84532", "actions-native");

    let result = default_registry()
        .unwrap()
        .execute(
            "native_transfer",
            &json!({"to": RECIPIENT, "value": "1000"}),
            &ctx,
        )
        .await;

    assert_eq!(
        result.text(),
        format!("Transferred 1000 wei to {}.\nTransaction hash: {}", RECIPIENT, TX_HASH)
    );
    assert_eq!(result.tx_hash(), Some(TX_HASH));
}

#[tokio::test]
async fn test_rejected_broadcast_is_reported_and_nonce_is_refetched() {
    let path = "actions-rejected";
    let nonce = mock("POST", format!("/{}", path).as_str())
        .match_body(Matcher::PartialJson(json!({"method": "eth_getTransactionCount"})))
        .with_header("content-type", "application/json")
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0x4"}).to_string())
        .expect(2)
        .create();
    let _gas = rpc_mock(path, "eth_estimateGas", "0x5208");
    let _price = rpc_mock(path, "eth_gasPrice", "0x3b9aca00");
    let _broadcast = mock("POST", format!("/{}", path).as_str())
        .match_body(Matcher::PartialJson(json!({"method": "eth_sendRawTransaction"})))
        .with_header("content-type", "application/json")
        .with_body(
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "insufficient funds"}})
                .to_string(),
        )
        .create();

    let registry = default_registry().unwrap();
    let ctx = context("84532", path);
    let args = json!({"to": RECIPIENT, "value": "1000"});

    let first = registry.execute("native_transfer", &args, &ctx).await;
    let second = registry.execute("native_transfer", &args, &ctx).await;

    for result in [&first, &second] {
        assert!(
            result.text().starts_with("Error transferring the asset: "),
            "{}",
            result.text()
        );
        assert!(result.text().contains("insufficient funds"));
        assert_eq!(result.tx_hash(), None);
    }
    // A failed broadcast must not consume the nonce.
    nonce.assert();
}

#[tokio::test]
async fn test_wallet_details_reports_native_balance() {
    let _balance = rpc_mock("actions-details", "eth_getBalance", "0xde0b6b3a7640000");
    let ctx = context("8453", "actions-details");

    let result = default_registry()
        .unwrap()
        .execute("get_wallet_details", &json!({}), &ctx)
        .await;

    assert_eq!(
        result.text(),
        format!(
            "Wallet Details:\n- Address: {}\n- Network:\n  * Protocol Family: evm\n  * Chain ID: 8453\n- Native Balance: 1000000000000000000 wei",
            TEST_ADDRESS
        )
    );
}

#[tokio::test]
async fn test_get_balance_decodes_token_balance() {
    let encoded = format!("0x{:064x}", 42);
    let _call = rpc_mock("actions-erc20-balance", "eth_call", &encoded);
    let ctx = context("8453", "actions-erc20-balance");

    let result = default_registry()
        .unwrap()
        .execute("get_balance", &json!({"contract_address": TOKEN}), &ctx)
        .await;

    assert_eq!(result.text(), format!("Balance of {} is 42", TOKEN));
}

#[tokio::test]
async fn test_wrap_eth_sends_deposit_with_value() {
    let path = "actions-wrap";
    let _nonce = rpc_mock(path, "eth_getTransactionCount", "0x0");
    // deposit() to WETH carrying 0.0001 ETH.
    let estimate = mock("POST", format!("/{}", path).as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"method": "eth_estimateGas"})),
            Matcher::Regex(r#""data":"0xd0e30db0""#.to_string()),
            Matcher::Regex(r#""value":"0x5af3107a4000""#.to_string()),
            Matcher::Regex(r#""to":"0x4200000000000000000000000000000000000006""#.to_string()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0xb71b"}).to_string())
        .create();
    let _price = rpc_mock(path, "eth_gasPrice", "0x3b9aca00");
    let _broadcast = rpc_mock(path, "eth_sendRawTransaction", TX_HASH);

    let result = default_registry()
        .unwrap()
        .execute(
            "wrap_eth",
            &json!({"amount_to_wrap": "100000000000000"}),
            &context("8453", path),
        )
        .await;

    assert_eq!(result.text(), format!("Wrapped ETH with transaction hash: {}", TX_HASH));
    estimate.assert();
}

#[tokio::test]
async fn test_wrap_eth_is_refused_off_base() {
    let registry = default_registry().unwrap();
    let result = registry
        .execute(
            "wrap_eth",
            &json!({"amount_to_wrap": "100000000000000"}),
            &context("1", "actions-wrap-unreachable"),
        )
        .await;

    assert_eq!(
        result.text(),
        "Error wrapping ETH: network evm:1 is not supported by this action"
    );
}

#[tokio::test]
async fn test_erc20_transfer_encodes_recipient_and_amount() {
    let path = "actions-erc20-transfer";
    let _nonce = rpc_mock(path, "eth_getTransactionCount", "0x0");
    let calldata = format!(
        r#""data":"0xa9059cbb{:0>64}{:064x}""#,
        RECIPIENT.trim_start_matches("0x"),
        5_000_000u64
    );
    let estimate = mock("POST", format!("/{}", path).as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"method": "eth_estimateGas"})),
            Matcher::Regex(calldata),
            Matcher::Regex(format!(r#""to":"{}""#, TOKEN)),
        ]))
        .with_header("content-type", "application/json")
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0xfde8"}).to_string())
        .create();
    let _price = rpc_mock(path, "eth_gasPrice", "0x3b9aca00");
    let _broadcast = rpc_mock(path, "eth_sendRawTransaction", TX_HASH);

    let result = default_registry()
        .unwrap()
        .execute(
            "transfer",
            &json!({"amount": "5000000", "contract_address": TOKEN, "destination": RECIPIENT}),
            &context("1", path),
        )
        .await;

    assert_eq!(
        result.text(),
        format!(
            "Transferred 5000000 of {} to {}.\nTransaction hash for the transfer: {}",
            TOKEN, RECIPIENT, TX_HASH
        )
    );
    assert_eq!(result.tx_hash(), Some(TX_HASH));
    estimate.assert();
}

#[tokio::test]
async fn test_price_actions_read_from_price_service() {
    let _feeds = mock("GET", "/actions-pyth/v2/price_feeds")
        .match_query(Matcher::UrlEncoded("query".into(), "ETH".into()))
        .with_header("content-type", "application/json")
        .with_body(
            json!([{"id": "feed-eth-usd", "attributes": {"base": "ETH", "quote_currency": "USD"}}])
                .to_string(),
        )
        .create();
    let _latest = mock("GET", "/actions-pyth/v2/updates/price/latest")
        .match_query(Matcher::UrlEncoded("ids[]".into(), "feed-eth-usd".into()))
        .with_header("content-type", "application/json")
        .with_body(
            json!({"parsed": [{"id": "feed-eth-usd", "price": {"price": "312345000000", "expo": -8}}]})
                .to_string(),
        )
        .create();

    let ctx = context_with(
        "1",
        "http://127.0.0.1:9",
        &format!("{}/actions-pyth", mockito::server_url()),
        RecordingSwaps::succeeding("0x0"),
    );
    let registry = default_registry().unwrap();

    let feed = registry
        .execute("fetch_price_feed_id", &json!({"token_symbol": "ETH"}), &ctx)
        .await;
    assert_eq!(feed.text(), "feed-eth-usd");

    let price = registry
        .execute("fetch_price", &json!({"price_feed_id": feed.text()}), &ctx)
        .await;
    assert_eq!(price.text(), "3123.45");

    let blank = registry
        .execute("fetch_price", &json!({"price_feed_id": ""}), &ctx)
        .await;
    assert!(blank.text().starts_with("Error fetching price: "), "{}", blank.text());
}
