//! Jupiter aggregator HTTP adapter

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tracing::debug;

use super::SwapAggregator;
use crate::config::JupiterConfig;
use crate::errors::SwapError;
use crate::types::{Quote, QuoteRequest, SwapInstructions};

/// Client for the Jupiter swap API (`/quote`, `/swap-instructions`)
#[derive(Debug, Clone)]
pub struct JupiterClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl JupiterClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SwapError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwapError::Configuration(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        })
    }

    pub fn from_config(config: &JupiterConfig) -> Result<Self, SwapError> {
        let client = Self::new(&config.api_url, Duration::from_secs(config.timeout_secs))?;
        Ok(client.with_api_key(config.api_key.clone()))
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }

    /// Read the body as JSON; non-2xx responses become `on_error` with the body text
    async fn read_json(
        response: reqwest::Response,
        on_error: fn(String) -> SwapError,
    ) -> Result<Value, SwapError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| on_error(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(on_error(format!("HTTP {}: {}", status, body)));
        }
        serde_json::from_str(&body)
            .map_err(|e| on_error(format!("invalid JSON response: {} ({})", e, body)))
    }
}

#[async_trait]
impl SwapAggregator for JupiterClient {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, SwapError> {
        let url = format!("{}/quote", self.base_url);
        debug!(
            url = %url,
            input_mint = %request.input_mint,
            output_mint = %request.output_mint,
            amount = request.amount,
            slippage_bps = request.slippage_bps,
            "Requesting quote"
        );

        let response = self
            .authorize(self.http.get(&url).query(&[
                ("inputMint", request.input_mint.to_string()),
                ("outputMint", request.output_mint.to_string()),
                ("amount", request.amount.to_string()),
                ("slippageBps", request.slippage_bps.to_string()),
            ]))
            .send()
            .await
            .map_err(|e| SwapError::Quote(format!("request failed: {}", e)))?;

        let body = Self::read_json(response, SwapError::Quote).await?;
        if let Some(err) = body.get("error") {
            return Err(SwapError::Quote(err.to_string()));
        }
        Quote::from_response(body)
    }

    async fn swap_instructions(
        &self,
        quote: &Quote,
        user: &Pubkey,
    ) -> Result<SwapInstructions, SwapError> {
        let url = format!("{}/swap-instructions", self.base_url);
        let payload = json!({
            "quoteResponse": quote.raw(),
            "userPublicKey": user.to_string(),
            "wrapAndUnwrapSol": true,
        });

        let response = self
            .authorize(self.http.post(&url).json(&payload))
            .send()
            .await
            .map_err(|e| SwapError::Instructions(format!("request failed: {}", e)))?;

        let body = Self::read_json(response, SwapError::Instructions).await?;
        if let Some(err) = body.get("error") {
            return Err(SwapError::Instructions(err.to_string()));
        }

        let instructions: SwapInstructions = serde_json::from_value(body)
            .map_err(|e| SwapError::Instructions(format!("malformed instruction set: {}", e)))?;
        debug!(
            setup = instructions.setup_instructions.len(),
            has_cleanup = instructions.cleanup_instruction.is_some(),
            lookup_tables = instructions.address_lookup_table_addresses.len(),
            "Swap instructions received"
        );
        Ok(instructions)
    }
}
