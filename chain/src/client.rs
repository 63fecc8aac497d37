//! Chain client trait and implementations
//!
//! The validator talks to the chain through [`ChainClient`] so the scoring
//! pipeline can run against a mock in tests. The production implementation
//! is a JSON-RPC-over-HTTP client; SCALE storage decoding stays on the
//! gateway side.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use oceans_core::{SubnetId, Uid};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ChainError, Result};
use crate::metagraph::Metagraph;
use crate::position::LiquidityPosition;

/// Chain operations used by the validator.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current block height.
    async fn block(&self) -> Result<u64>;

    /// Metagraph of a subnet.
    async fn metagraph(&self, netuid: SubnetId) -> Result<Metagraph>;

    /// Liquidity positions a coldkey holds on a subnet's pool.
    async fn liquidity_positions(
        &self,
        netuid: SubnetId,
        coldkey: &str,
    ) -> Result<Vec<LiquidityPosition>>;

    /// Raw `Swap.AlphaSqrtPrice` fixed-point value for a subnet.
    async fn alpha_sqrt_price(&self, netuid: SubnetId) -> Result<u128>;

    /// Emit quantised weights for the given UIDs.
    async fn set_weights(
        &self,
        netuid: SubnetId,
        uids: &[Uid],
        weights: &[u16],
        version_key: u64,
    ) -> Result<()>;
}

// ── JSON-RPC implementation ──────────────────────────────────

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct MetagraphResponse {
    netuid: SubnetId,
    block: u64,
    uids: Vec<Uid>,
    hotkeys: Vec<String>,
    coldkeys: Vec<String>,
    stakes: Vec<f64>,
    #[serde(default)]
    weights_version: u64,
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    id: u64,
    price_low: f64,
    price_high: f64,
    liquidity: u64,
}

/// JSON-RPC client against a subtensor gateway.
pub struct SubtensorRpc {
    client: reqwest::Client,
    endpoint: String,
    wallet_name: String,
}

impl SubtensorRpc {
    pub fn new(endpoint: impl Into<String>, wallet_name: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            wallet_name: wallet_name.into(),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        debug!(method, "rpc call");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let envelope: RpcEnvelope = response.json().await?;
        if let Some(err) = envelope.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        envelope
            .result
            .ok_or_else(|| ChainError::BadResponse(format!("{method}: missing result")))
    }
}

#[async_trait]
impl ChainClient for SubtensorRpc {
    async fn block(&self) -> Result<u64> {
        let result = self.call("chain_getBlockNumber", json!([])).await?;
        result
            .as_u64()
            .ok_or_else(|| ChainError::BadResponse("block number not a u64".to_string()))
    }

    async fn metagraph(&self, netuid: SubnetId) -> Result<Metagraph> {
        let result = self.call("subnet_getMetagraph", json!([netuid])).await?;
        let mg: MetagraphResponse = serde_json::from_value(result)
            .map_err(|e| ChainError::BadResponse(format!("metagraph: {e}")))?;

        if mg.uids.is_empty() {
            return Err(ChainError::EmptyMetagraph { netuid });
        }
        if mg.uids.len() != mg.hotkeys.len()
            || mg.uids.len() != mg.coldkeys.len()
            || mg.uids.len() != mg.stakes.len()
        {
            return Err(ChainError::BadResponse(
                "metagraph vectors have mismatched lengths".to_string(),
            ));
        }

        Ok(Metagraph::new(
            mg.netuid,
            mg.block,
            mg.uids,
            mg.hotkeys,
            mg.coldkeys,
            mg.stakes,
            mg.weights_version,
        ))
    }

    async fn liquidity_positions(
        &self,
        netuid: SubnetId,
        coldkey: &str,
    ) -> Result<Vec<LiquidityPosition>> {
        let result = self
            .call("swap_getLiquidityList", json!([netuid, coldkey]))
            .await?;
        let positions: Vec<PositionResponse> = serde_json::from_value(result)
            .map_err(|e| ChainError::BadResponse(format!("positions: {e}")))?;

        Ok(positions
            .into_iter()
            .map(|p| LiquidityPosition {
                id: p.id,
                price_low: p.price_low,
                price_high: p.price_high,
                liquidity: p.liquidity,
            })
            .collect())
    }

    async fn alpha_sqrt_price(&self, netuid: SubnetId) -> Result<u128> {
        // u128 does not survive JSON numbers; the gateway returns a string.
        let result = self.call("swap_alphaSqrtPrice", json!([netuid])).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ChainError::BadResponse("sqrt price not a string".to_string()))?;
        raw.parse::<u128>()
            .map_err(|e| ChainError::BadResponse(format!("sqrt price: {e}")))
    }

    async fn set_weights(
        &self,
        netuid: SubnetId,
        uids: &[Uid],
        weights: &[u16],
        version_key: u64,
    ) -> Result<()> {
        let result = self
            .call(
                "subnet_setWeights",
                json!([self.wallet_name, netuid, uids, weights, version_key]),
            )
            .await?;
        match result.get("success").and_then(Value::as_bool) {
            Some(true) => Ok(()),
            _ => Err(ChainError::WeightsRejected(
                result
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown reason")
                    .to_string(),
            )),
        }
    }
}

// ── In-memory mock ───────────────────────────────────────────

/// Emission recorded by [`MockChain::set_weights`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEmission {
    pub netuid: SubnetId,
    pub uids: Vec<Uid>,
    pub weights: Vec<u16>,
    pub version_key: u64,
}

/// Deterministic in-memory chain used in tests and dry runs.
#[derive(Default)]
pub struct MockChain {
    pub block: u64,
    pub metagraphs: HashMap<SubnetId, Metagraph>,
    pub positions: HashMap<(SubnetId, String), Vec<LiquidityPosition>>,
    pub sqrt_prices: HashMap<SubnetId, u128>,
    emissions: Mutex<Vec<RecordedEmission>>,
}

impl MockChain {
    pub fn new(block: u64) -> Self {
        Self {
            block,
            ..Self::default()
        }
    }

    pub fn with_metagraph(mut self, mg: Metagraph) -> Self {
        self.metagraphs.insert(mg.netuid, mg);
        self
    }

    pub fn with_positions(
        mut self,
        netuid: SubnetId,
        coldkey: &str,
        positions: Vec<LiquidityPosition>,
    ) -> Self {
        self.positions.insert((netuid, coldkey.to_string()), positions);
        self
    }

    /// Store a plain price; encoded into U64F64 sqrt form internally.
    pub fn with_price(mut self, netuid: SubnetId, price: f64) -> Self {
        let sqrt_p = price.sqrt();
        let raw = (sqrt_p * (u64::MAX as f64 + 1.0)) as u128;
        self.sqrt_prices.insert(netuid, raw);
        self
    }

    /// Weight emissions recorded so far.
    pub fn emissions(&self) -> Vec<RecordedEmission> {
        self.emissions.lock().expect("emissions lock").clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn block(&self) -> Result<u64> {
        Ok(self.block)
    }

    async fn metagraph(&self, netuid: SubnetId) -> Result<Metagraph> {
        self.metagraphs
            .get(&netuid)
            .cloned()
            .ok_or(ChainError::EmptyMetagraph { netuid })
    }

    async fn liquidity_positions(
        &self,
        netuid: SubnetId,
        coldkey: &str,
    ) -> Result<Vec<LiquidityPosition>> {
        Ok(self
            .positions
            .get(&(netuid, coldkey.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn alpha_sqrt_price(&self, netuid: SubnetId) -> Result<u128> {
        Ok(self.sqrt_prices.get(&netuid).copied().unwrap_or(0))
    }

    async fn set_weights(
        &self,
        netuid: SubnetId,
        uids: &[Uid],
        weights: &[u16],
        version_key: u64,
    ) -> Result<()> {
        self.emissions.lock().expect("emissions lock").push(RecordedEmission {
            netuid,
            uids: uids.to_vec(),
            weights: weights.to_vec(),
            version_key,
        });
        Ok(())
    }
}
