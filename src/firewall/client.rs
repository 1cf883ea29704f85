//! Policy-evaluation HTTP client
//!
//! One `evaluate` call is one authenticated POST. Failures are returned to the
//! caller as-is; nothing here retries, batches, or polls for a later verdict.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::config::FirewallConfig;
use crate::error::{Error, Result};

use super::descriptor::TransactionDescriptor;
use super::verdict::EvaluationVerdict;
use super::wire::{PolicyEvent, PolicyResponse};

/// Submits transactions to the policy engine and normalizes its verdict
pub struct RiskEvaluationClient {
    client: Client,
    endpoint: String,
    bearer_token: String,
}

impl RiskEvaluationClient {
    /// Create a client from configuration.
    ///
    /// The request timeout comes from `timeout_ms`; the token must be set.
    pub fn new(config: &FirewallConfig) -> Result<Self> {
        if config.bearer_token.trim().is_empty() {
            return Err(Error::Config(
                "firewall.bearer_token is not set (RISKMON__FIREWALL__BEARER_TOKEN)".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(
            client,
            config.endpoint.clone(),
            config.bearer_token.clone(),
        ))
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(client: Client, endpoint: String, bearer_token: String) -> Self {
        Self {
            client,
            endpoint,
            bearer_token,
        }
    }

    /// Submit a descriptor for evaluation.
    ///
    /// The evaluation mode is the descriptor's variant: broadcasted
    /// transactions go out as `transaction:broadcasted` with their signature
    /// and timestamp, drafts as `transaction:prebroadcast`.
    pub async fn evaluate(&self, descriptor: &TransactionDescriptor) -> Result<EvaluationVerdict> {
        let context = descriptor.context();
        let event = PolicyEvent::from_descriptor(descriptor);

        debug!("Submitting {} for {}", context, descriptor.label());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.bearer_token)
            .json(&event)
            .send()
            .await
            .map_err(|e| Error::Transport {
                context: context.clone(),
                status: e.status().map(|s| s.as_u16()),
                message: format!("request failed: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::Transport {
            context: context.clone(),
            status: Some(status.as_u16()),
            message: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(Error::Transport {
                context,
                status: Some(status.as_u16()),
                message: format!("policy API returned {}: {}", status, body),
            });
        }

        let parsed = PolicyResponse::from_body(&body).map_err(|message| Error::Protocol {
            context: context.clone(),
            message,
            body: body.clone(),
        })?;

        let verdict = parsed.into_verdict();
        info!("{} -> {}", descriptor.label(), verdict);
        if verdict.action().requires_follow_up() {
            info!(
                "Manual review required for {}; use event id {} to follow up",
                descriptor.label(),
                verdict.event_id()
            );
        }

        Ok(verdict)
    }
}
