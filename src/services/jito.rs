//! Jito block engine JSON-RPC adapter
//!
//! Bundles are submitted through `sendBundle` and tracked with
//! `getInflightBundleStatuses`. The public block engine throttles hard, so
//! every request waits on a client-side rate limiter first.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::BundleService;
use crate::config::JitoConfig;
use crate::errors::SwapError;
use crate::tx_builder::BundleEnvelope;
use crate::types::{BundleId, BundleStatus};

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct InflightStatuses {
    #[serde(default)]
    value: Option<Vec<InflightStatus>>,
}

#[derive(Debug, Deserialize)]
struct InflightStatus {
    bundle_id: String,
    status: String,
    #[serde(default)]
    landed_slot: Option<u64>,
}

impl InflightStatus {
    fn to_status(&self) -> BundleStatus {
        match self.status.as_str() {
            "Landed" => match self.landed_slot {
                Some(slot) => BundleStatus::Landed { slot },
                None => {
                    warn!(bundle_id = %self.bundle_id, "Landed status without landed_slot");
                    BundleStatus::Pending
                }
            },
            "Failed" => BundleStatus::Failed,
            "Pending" => BundleStatus::Pending,
            // "Invalid" means the engine does not know the id (yet or anymore)
            _ => BundleStatus::Unknown,
        }
    }
}

/// Client for the Jito block engine bundle API
#[derive(Clone)]
pub struct JitoClient {
    http: Client,
    base_url: String,
    auth_uuid: Option<String>,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl JitoClient {
    pub fn new(
        base_url: impl Into<String>,
        requests_per_second: u32,
        timeout: Duration,
    ) -> Result<Self, SwapError> {
        let rps = NonZeroU32::new(requests_per_second).ok_or_else(|| {
            SwapError::Configuration("jito requests_per_second must be > 0".to_string())
        })?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwapError::Configuration(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_uuid: None,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        })
    }

    pub fn from_config(config: &JitoConfig) -> Result<Self, SwapError> {
        let client = Self::new(
            &config.block_engine_url,
            config.requests_per_second,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(client.with_auth(config.auth_uuid.clone()))
    }

    pub fn with_auth(mut self, auth_uuid: Option<String>) -> Self {
        self.auth_uuid = auth_uuid;
        self
    }

    async fn call<T>(&self, path: &str, method: &str, params: Value) -> Result<T, SwapError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url, path);
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(uuid) = &self.auth_uuid {
            request = request.header("x-jito-auth", uuid);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SwapError::bundler(format!("{} request failed: {}", method, e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SwapError::bundler(format!("{} body read failed: {}", method, e)))?;

        if !status.is_success() {
            return Err(SwapError::bundler(format!("{} HTTP {}: {}", method, status, text)));
        }

        let envelope: RpcEnvelope<T> = serde_json::from_str(&text)
            .map_err(|e| SwapError::bundler(format!("{} invalid response: {} ({})", method, e, text)))?;

        if let Some(err) = envelope.error {
            return Err(SwapError::bundler(format!(
                "{} rejected ({}): {}",
                method, err.code, err.message
            )));
        }
        envelope
            .result
            .ok_or_else(|| SwapError::bundler(format!("{} returned no result", method)))
    }
}

impl std::fmt::Debug for JitoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JitoClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.auth_uuid.is_some())
            .finish()
    }
}

#[async_trait]
impl BundleService for JitoClient {
    async fn send_bundle(&self, bundle: &BundleEnvelope) -> Result<BundleId, SwapError> {
        let params = json!([bundle.encoded_transactions(), { "encoding": "base64" }]);
        let id: String = self.call("bundles", "sendBundle", params).await?;
        debug!(bundle_id = %id, transactions = bundle.len(), "sendBundle accepted");
        Ok(BundleId::new(id))
    }

    async fn bundle_status(&self, id: &BundleId) -> Result<Option<BundleStatus>, SwapError> {
        let params = json!([[id.as_str()]]);
        let statuses: InflightStatuses = self
            .call("getInflightBundleStatuses", "getInflightBundleStatuses", params)
            .await?;

        Ok(statuses
            .value
            .unwrap_or_default()
            .iter()
            .find(|s| s.bundle_id == id.as_str())
            .map(InflightStatus::to_status))
    }
}
