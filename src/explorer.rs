// Block explorer client (Etherscan-compatible `account/txlist`)
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ExplorerConfig;
use crate::error::{Error, Result};
use crate::firewall::{
    timestamp_from_unix, BroadcastedTx, FeeModel, Quantity, Signature, TransactionDescriptor,
    TxFields,
};

/// Message Etherscan returns with status "0" for an address with no history
const NO_TRANSACTIONS: &str = "No transactions found";

/// Raw transaction row. Etherscan encodes every number as a decimal string.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerTx {
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub nonce: String,
    pub value: String,
    #[serde(default)]
    pub input: String,
    pub gas: String,
    #[serde(rename = "gasPrice")]
    pub gas_price: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    // Signature fields are absent from txlist; some compatible explorers add them
    #[serde(default)]
    pub r: Option<String>,
    #[serde(default)]
    pub s: Option<String>,
    #[serde(default)]
    pub v: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct TxListResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

impl ExplorerTx {
    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        let seconds: i64 = self.time_stamp.parse().map_err(|_| {
            Error::Validation(format!("{}: bad timeStamp {:?}", self.hash, self.time_stamp))
        })?;
        timestamp_from_unix(seconds)
    }

    /// Whether this row was sent to `address` (case-insensitive)
    pub fn is_inbound_to(&self, address: &str) -> bool {
        !self.to.is_empty() && self.to.eq_ignore_ascii_case(address)
    }

    /// Build a broadcasted descriptor for policy evaluation.
    ///
    /// Missing `r`/`s`/`v` become `0x0`; a decimal `v` is re-encoded as hex.
    pub fn to_descriptor(&self, network: &str) -> Result<TransactionDescriptor> {
        let nonce: u64 = self.nonce.parse().map_err(|_| {
            Error::Validation(format!("{}: bad nonce {:?}", self.hash, self.nonce))
        })?;

        let fields = TxFields {
            network: network.to_string(),
            from: self.from.clone(),
            to: self.to.clone(),
            nonce,
            value: self.value.clone(),
            input: if self.input.is_empty() {
                "0x".to_string()
            } else {
                self.input.clone()
            },
        };
        let fee = FeeModel::legacy(Quantity::parse(&self.gas)?, Quantity::parse(&self.gas_price)?);

        let v = match &self.v {
            Some(Value::String(v)) => v.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "0x0".to_string(),
        };
        let signature = Signature::new(
            self.r.as_deref().unwrap_or("0x0"),
            self.s.as_deref().unwrap_or("0x0"),
            &v,
        )?;

        let tx = BroadcastedTx::new(fields, fee, signature, self.timestamp()?)?
            .with_hash(self.hash.clone());
        Ok(tx.into())
    }
}

pub struct ExplorerClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ExplorerClient {
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config(
                "explorer.api_key is not set (RISKMON__EXPLORER__API_KEY)".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fetch the address's transaction list, newest first
    pub async fn list_transactions(&self, address: &str) -> Result<Vec<ExplorerTx>> {
        debug!("Fetching transaction list for {}", address);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("module", "account"),
                ("action", "txlist"),
                ("address", address),
                ("startblock", "0"),
                ("endblock", "99999999"),
                ("sort", "desc"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Explorer(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Explorer(format!("HTTP {}: {}", status, body)));
        }

        let data: TxListResponse = response
            .json()
            .await
            .map_err(|e| Error::Explorer(format!("Failed to parse txlist response: {}", e)))?;

        if data.status != "1" {
            if data.message.starts_with(NO_TRANSACTIONS) {
                info!("No transactions found for {}", address);
                return Ok(Vec::new());
            }
            // On errors `result` holds a human-readable reason
            let reason = data.result.as_str().unwrap_or_default();
            return Err(Error::Explorer(format!("{} {}", data.message, reason).trim().to_string()));
        }

        serde_json::from_value(data.result)
            .map_err(|e| Error::Explorer(format!("Unexpected txlist rows: {}", e)))
    }

    /// Transactions sent to `address` at or after `cutoff`
    pub async fn recent_inbound(
        &self,
        address: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ExplorerTx>> {
        let transactions = self.list_transactions(address).await?;
        let total = transactions.len();

        let recent: Vec<ExplorerTx> = transactions
            .into_iter()
            .filter(|tx| tx.is_inbound_to(address))
            .filter(|tx| match tx.timestamp() {
                Ok(ts) => ts >= cutoff,
                Err(e) => {
                    warn!("Skipping explorer row: {}", e);
                    false
                }
            })
            .collect();

        debug!(
            "{} of {} transactions are inbound to {} since {}",
            recent.len(),
            total,
            address,
            cutoff
        );
        Ok(recent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firewall::EvaluationMode;
    use crate::firewall::wire::PolicyEvent;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TARGET: &str = "0xd756bF764ad08E0B67E7466FFA7A52D788935344";

    fn row(hash: &str, to: &str, time_stamp: i64) -> Value {
        json!({
            "blockNumber": "21890000",
            "timeStamp": time_stamp.to_string(),
            "hash": hash,
            "nonce": "16469",
            "from": "0x61ed4b62e03798305818607c7160b2abff15cfed",
            "to": to,
            "value": "1000000000",
            "gas": "30400",
            "gasPrice": "10000000000000",
            "isError": "0",
            "input": "0x",
            "confirmations": "12"
        })
    }

    fn client_for(server: &MockServer) -> ExplorerClient {
        ExplorerClient::new(&ExplorerConfig {
            base_url: format!("{}/api", server.uri()),
            api_key: "ekey".to_string(),
            network: "eth".to_string(),
            timeout_ms: 5_000,
        })
        .unwrap()
    }

    #[test]
    fn test_to_descriptor_defaults_signature() {
        let tx: ExplorerTx = serde_json::from_value(row("0x01", TARGET, 1_740_051_499)).unwrap();
        let descriptor = tx.to_descriptor("eth").unwrap();
        assert_eq!(descriptor.mode(), EvaluationMode::Broadcasted);
        assert_eq!(descriptor.tx_hash(), Some("0x01"));

        let body = serde_json::to_value(PolicyEvent::from_descriptor(&descriptor)).unwrap();
        assert_eq!(body["datetime"], "2025-02-20T11:38:19.000Z");
        assert_eq!(body["data"]["gasLimit"], "0x76c0");
        assert_eq!(body["data"]["gasPrice"], "0x9184e72a000");
        assert_eq!(body["data"]["nonce"], 16469);
        assert_eq!(body["data"]["r"], "0x0");
        assert_eq!(body["data"]["s"], "0x0");
        assert_eq!(body["data"]["yParityOrV"], "0x0");
    }

    #[test]
    fn test_to_descriptor_converts_decimal_v() {
        let mut value = row("0x02", TARGET, 1_740_051_499);
        value["r"] = json!("0xc7f9");
        value["s"] = json!("0x1dd7");
        value["v"] = json!("37");
        let tx: ExplorerTx = serde_json::from_value(value).unwrap();
        let descriptor = tx.to_descriptor("eth").unwrap();
        let body = serde_json::to_value(PolicyEvent::from_descriptor(&descriptor)).unwrap();
        assert_eq!(body["data"]["yParityOrV"], "0x25");
        assert_eq!(body["data"]["r"], "0xc7f9");
    }

    #[test]
    fn test_inbound_match_ignores_case() {
        let tx: ExplorerTx =
            serde_json::from_value(row("0x03", &TARGET.to_lowercase(), 0)).unwrap();
        assert!(tx.is_inbound_to(TARGET));
        let creation: ExplorerTx = serde_json::from_value(row("0x04", "", 0)).unwrap();
        assert!(!creation.is_inbound_to(TARGET));
    }

    #[tokio::test]
    async fn test_recent_inbound_filters_direction_and_time() {
        let server = MockServer::start().await;
        let now = Utc::now().timestamp();
        Mock::given(method("GET"))
            .and(query_param("module", "account"))
            .and(query_param("action", "txlist"))
            .and(query_param("address", TARGET))
            .and(query_param("sort", "desc"))
            .and(query_param("apikey", "ekey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "message": "OK",
                "result": [
                    row("0xnew", &TARGET.to_lowercase(), now - 60),
                    row("0xout", "0x0000000000000000000000000000000000000001", now - 60),
                    row("0xold", TARGET, now - 48 * 3600),
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cutoff = Utc::now() - chrono::Duration::hours(24);
        let recent = client_for(&server).recent_inbound(TARGET, cutoff).await.unwrap();
        let hashes: Vec<&str> = recent.iter().map(|tx| tx.hash.as_str()).collect();
        assert_eq!(hashes, vec!["0xnew"]);
    }

    #[tokio::test]
    async fn test_no_transactions_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "0",
                "message": "No transactions found",
                "result": []
            })))
            .mount(&server)
            .await;

        let txs = client_for(&server).list_transactions(TARGET).await.unwrap();
        assert!(txs.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "0",
                "message": "NOTOK",
                "result": "Invalid API Key"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).list_transactions(TARGET).await.unwrap_err();
        assert!(matches!(err, Error::Explorer(ref m) if m.contains("Invalid API Key")));
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).list_transactions(TARGET).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
