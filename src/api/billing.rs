//! Billing dashboards: wallet summary, per-agent usage and the transaction
//! ledger. Read-only; wallet arithmetic lives upstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, ClientError};

use super::{decode_data, decode_page, Page};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSummary {
    pub balance_cents: i64,
    pub currency: String,
    #[serde(default)]
    pub auto_recharge_enabled: bool,
    #[serde(default)]
    pub low_balance_threshold_cents: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub agent_id: String,
    pub agent_name: Option<String>,
    pub minutes: f64,
    pub cost_cents: i64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub amount_cents: i64,
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn wallet_summary(client: &ApiClient) -> Result<WalletSummary, ClientError> {
    let envelope = client.get("/billing/wallet").await?;
    decode_data(envelope)
}

pub async fn usage(client: &ApiClient, limit: i64, offset: i64) -> Result<Page<UsageRecord>, ClientError> {
    let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
    let envelope = client.get_with("/billing/usage", &query).await?;
    decode_page(envelope)
}

pub async fn transactions(
    client: &ApiClient,
    limit: i64,
    offset: i64,
) -> Result<Page<Transaction>, ClientError> {
    let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
    let envelope = client.get_with("/billing/transactions", &query).await?;
    decode_page(envelope)
}
