//! Fireblocks REST client
//!
//! Every request is authenticated with the API key header and a short-lived
//! RS256 JWT signed by the API user's private key. The token binds the request
//! path and a SHA-256 hash of the exact body bytes sent.
//!
//! API Documentation: https://developers.fireblocks.com/reference/api-overview

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::CustodyConfig;
use crate::error::{Error, Result};

use super::types::{
    AssetBalance, AssetWallet, DepositAddress, InternalTransfer, TransferReceipt, VaultAccount,
};
use super::CustodyProvider;

/// Token lifetime in seconds
const TOKEN_TTL_SECS: i64 = 55;

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaims {
    uri: String,
    nonce: String,
    iat: i64,
    exp: i64,
    sub: String,
    #[serde(rename = "bodyHash")]
    body_hash: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateVaultRequest<'a> {
    name: &'a str,
    #[serde(rename = "hiddenOnUI")]
    hidden_on_ui: bool,
}

#[derive(Debug, Serialize)]
struct CreateAddressRequest<'a> {
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct TransferPeer<'a> {
    #[serde(rename = "type")]
    peer_type: &'static str,
    id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferExtra<'a> {
    source_address: &'a str,
    destination_address: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTransactionRequest<'a> {
    operation: &'static str,
    asset_id: &'a str,
    source: TransferPeer<'a>,
    destination: TransferPeer<'a>,
    amount: &'a str,
    note: &'a str,
    extra_parameters: TransferExtra<'a>,
}

impl<'a> From<&'a InternalTransfer> for CreateTransactionRequest<'a> {
    fn from(transfer: &'a InternalTransfer) -> Self {
        Self {
            operation: "TRANSFER",
            asset_id: &transfer.asset_id,
            source: TransferPeer {
                peer_type: "VAULT_ACCOUNT",
                id: &transfer.vault_id,
            },
            destination: TransferPeer {
                peer_type: "VAULT_ACCOUNT",
                id: &transfer.vault_id,
            },
            amount: &transfer.amount,
            note: &transfer.note,
            extra_parameters: TransferExtra {
                source_address: &transfer.source_address,
                destination_address: &transfer.destination_address,
            },
        }
    }
}

/// Fireblocks API client
pub struct FireblocksClient {
    client: Client,
    base_url: String,
    api_key: String,
    signing_key: EncodingKey,
}

impl FireblocksClient {
    /// Create a client from configuration, reading the signing key from disk
    pub fn new(config: &CustodyConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config(
                "custody.api_key is not set (RISKMON__CUSTODY__API_KEY)".to_string(),
            ));
        }
        if config.secret_key_path.trim().is_empty() {
            return Err(Error::Config(
                "custody.secret_key_path is not set (RISKMON__CUSTODY__SECRET_KEY_PATH)"
                    .to_string(),
            ));
        }

        let pem = std::fs::read(&config.secret_key_path).map_err(|e| {
            Error::Io(format!(
                "Cannot read custody key {}: {}",
                config.secret_key_path, e
            ))
        })?;

        Self::from_pem(
            &config.base_url,
            &config.api_key,
            &pem,
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn from_pem(base_url: &str, api_key: &str, pem: &[u8], timeout: Duration) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| Error::Config(format!("Invalid custody RSA key: {}", e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            signing_key,
        })
    }

    /// Sign a request for `path` (including any query string) with `body`
    fn sign(&self, path: &str, body: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AuthClaims {
            uri: path.to_string(),
            nonce: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            sub: self.api_key.clone(),
            body_hash: hex::encode(Sha256::digest(body.as_bytes())),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| Error::Custody(format!("Failed to sign request: {}", e)))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T> {
        let body = body.unwrap_or_default();
        let token = self.sign(path, &body)?;
        let url = format!("{}{}", self.base_url, path);

        debug!("{} {}", method, path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("X-API-Key", &self.api_key)
            .bearer_auth(token);
        if !body.is_empty() {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Custody(format!("{} {} failed: {}", method, path, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Custody(format!("Failed to read response for {}: {}", path, e)))?;

        if !status.is_success() {
            return Err(Error::CustodyStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::Custody(format!("Failed to parse response for {}: {}", path, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_string(body)?;
        self.request(Method::POST, path, Some(body)).await
    }
}

#[async_trait]
impl CustodyProvider for FireblocksClient {
    async fn list_vault_accounts(&self) -> Result<Vec<VaultAccount>> {
        self.get("/v1/vault/accounts").await
    }

    async fn get_vault_account(&self, vault_id: &str) -> Result<VaultAccount> {
        self.get(&format!("/v1/vault/accounts/{}", vault_id)).await
    }

    async fn create_vault_account(&self, name: &str, hidden_on_ui: bool) -> Result<VaultAccount> {
        self.post("/v1/vault/accounts", &CreateVaultRequest { name, hidden_on_ui })
            .await
    }

    async fn create_vault_asset(&self, vault_id: &str, asset_id: &str) -> Result<AssetWallet> {
        self.post(
            &format!("/v1/vault/accounts/{}/{}", vault_id, asset_id),
            &serde_json::json!({}),
        )
        .await
    }

    async fn get_deposit_addresses(
        &self,
        vault_id: &str,
        asset_id: &str,
    ) -> Result<Vec<DepositAddress>> {
        self.get(&format!(
            "/v1/vault/accounts/{}/{}/addresses",
            vault_id, asset_id
        ))
        .await
    }

    async fn generate_address(
        &self,
        vault_id: &str,
        asset_id: &str,
        description: &str,
    ) -> Result<DepositAddress> {
        let mut created: DepositAddress = self
            .post(
                &format!("/v1/vault/accounts/{}/{}/addresses", vault_id, asset_id),
                &CreateAddressRequest { description },
            )
            .await?;
        // The create response echoes only address/tag; keep the label we asked for
        if created.description.is_none() {
            created.description = Some(description.to_string());
        }
        Ok(created)
    }

    async fn get_asset_balance(&self, vault_id: &str, asset_id: &str) -> Result<AssetBalance> {
        self.get(&format!("/v1/vault/accounts/{}/{}", vault_id, asset_id))
            .await
    }

    async fn create_transaction(&self, transfer: &InternalTransfer) -> Result<TransferReceipt> {
        self.post("/v1/transactions", &CreateTransactionRequest::from(transfer))
            .await
    }
}
