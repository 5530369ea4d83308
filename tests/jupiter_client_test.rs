//! Integration tests for the Jupiter HTTP adapter against a mock server

use std::time::Duration;

use jito_swap::services::{JupiterClient, SwapAggregator};
use jito_swap::types::QuoteRequest;
use jito_swap::{Pubkey, SwapError};
use mockito::Matcher;
use serde_json::json;

const SOL: &str = "So11111111111111111111111111111111111111112";
const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

fn quote_request() -> QuoteRequest {
    QuoteRequest {
        input_mint: SOL.parse().unwrap(),
        output_mint: USDC.parse().unwrap(),
        amount: 1_000_000,
        slippage_bps: 150,
    }
}

fn quote_body() -> serde_json::Value {
    json!({
        "inputMint": SOL,
        "inAmount": "1000000",
        "outputMint": USDC,
        "outAmount": "154321",
        "otherAmountThreshold": "152006",
        "swapMode": "ExactIn",
        "slippageBps": 150,
        "priceImpactPct": "0",
        "routePlan": [{ "percent": 100, "swapInfo": { "ammKey": "x", "label": "Whirlpool" } }]
    })
}

#[tokio::test]
async fn test_quote_sends_expected_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/quote")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("inputMint".into(), SOL.into()),
            Matcher::UrlEncoded("outputMint".into(), USDC.into()),
            Matcher::UrlEncoded("amount".into(), "1000000".into()),
            Matcher::UrlEncoded("slippageBps".into(), "150".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(quote_body().to_string())
        .create_async()
        .await;

    let client = JupiterClient::new(server.url(), Duration::from_secs(5)).unwrap();
    let quote = client.quote(&quote_request()).await.expect("quote");

    assert_eq!(quote.out_amount, 154_321);
    assert_eq!(quote.slippage_bps, 150);
    assert_eq!(quote.route_plan.len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_quote_without_route_fails() {
    let mut server = mockito::Server::new_async().await;
    let mut body = quote_body();
    body["routePlan"] = json!([]);
    server
        .mock("GET", "/quote")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = JupiterClient::new(server.url(), Duration::from_secs(5)).unwrap();
    let err = client.quote(&quote_request()).await.unwrap_err();
    assert!(matches!(err, SwapError::Quote(_)));
}

#[tokio::test]
async fn test_quote_http_error_is_reported() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/quote")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":"Could not find any route","errorCode":"COULD_NOT_FIND_ANY_ROUTE"}"#)
        .create_async()
        .await;

    let client = JupiterClient::new(server.url(), Duration::from_secs(5)).unwrap();
    match client.quote(&quote_request()).await {
        Err(SwapError::Quote(msg)) => assert!(msg.contains("Could not find any route")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_swap_instructions_round_trip() {
    let user = Pubkey::new_unique();
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/quote")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(quote_body().to_string())
        .create_async()
        .await;
    let mock = server
        .mock("POST", "/swap-instructions")
        .match_header("x-api-key", "secret")
        .match_body(Matcher::PartialJson(json!({
            "quoteResponse": quote_body(),
            "userPublicKey": user.to_string(),
            "wrapAndUnwrapSol": true,
        })))
        .with_status(200)
        .with_body(
            json!({
                "computeBudgetInstructions": [],
                "setupInstructions": [],
                "swapInstruction": {
                    "programId": "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4",
                    "accounts": [{ "pubkey": user.to_string(), "isSigner": true, "isWritable": true }],
                    "data": "AQID"
                },
                "cleanupInstruction": null,
                "addressLookupTableAddresses": []
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = JupiterClient::new(server.url(), Duration::from_secs(5))
        .unwrap()
        .with_api_key(Some("secret".to_string()));
    let quote = client.quote(&quote_request()).await.expect("quote");
    let ixs = client.swap_instructions(&quote, &user).await.expect("instructions");

    assert_eq!(ixs.swap_instruction.data, "AQID");
    assert!(ixs.cleanup_instruction.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_swap_instructions_error_field_fails() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/quote")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(quote_body().to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/swap-instructions")
        .with_status(200)
        .with_body(r#"{"error":"Slippage tolerance exceeded"}"#)
        .create_async()
        .await;

    let client = JupiterClient::new(server.url(), Duration::from_secs(5)).unwrap();
    let quote = client.quote(&quote_request()).await.expect("quote");
    match client.swap_instructions(&quote, &Pubkey::new_unique()).await {
        Err(SwapError::Instructions(msg)) => assert!(msg.contains("Slippage tolerance")),
        other => panic!("unexpected result: {:?}", other),
    }
}
