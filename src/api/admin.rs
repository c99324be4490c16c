//! Superadmin tenant console: client account CRUD and user invitations.
//!
//! Role gating on these calls is informational (the CLI refuses early with a
//! clearer message); the upstream independently enforces authorization on
//! every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::claims::Role;
use crate::client::{ApiClient, ClientError};

use super::{decode_data, decode_page, Page};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAccount {
    pub id: String,
    pub name: String,
    pub active: bool,
    #[serde(default)]
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub active: Option<bool>,
}

pub async fn list_clients(client: &ApiClient, active_only: bool) -> Result<Page<ClientAccount>, ClientError> {
    let query;
    let query_slice: &[(&str, String)] = if active_only {
        query = [("active_only", "true".to_string())];
        &query
    } else {
        &[]
    };

    let envelope = client.get_with("/admin/clients", query_slice).await?;
    decode_page(envelope)
}

pub async fn get_client(client: &ApiClient, id: &str) -> Result<ClientAccount, ClientError> {
    let envelope = client.get(&format!("/admin/clients/{id}")).await?;
    decode_data(envelope)
}

pub async fn create_client(
    client: &ApiClient,
    name: &str,
    contact_email: Option<&str>,
) -> Result<ClientAccount, ClientError> {
    let mut body = json!({ "name": name });
    if let Some(email) = contact_email {
        body["contact_email"] = json!(email);
    }

    let envelope = client.post("/admin/clients", &body).await?;
    decode_data(envelope)
}

pub async fn update_client(
    client: &ApiClient,
    id: &str,
    update: &ClientUpdate,
) -> Result<ClientAccount, ClientError> {
    let mut body = Map::new();
    if let Some(name) = &update.name {
        body.insert("name".into(), json!(name));
    }
    if let Some(email) = &update.contact_email {
        body.insert("contact_email".into(), json!(email));
    }
    if let Some(active) = update.active {
        body.insert("active".into(), json!(active));
    }

    let envelope = client.put(&format!("/admin/clients/{id}"), &Value::Object(body)).await?;
    decode_data(envelope)
}

pub async fn delete_client(client: &ApiClient, id: &str) -> Result<(), ClientError> {
    client.delete(&format!("/admin/clients/{id}")).await?;
    Ok(())
}

pub async fn invite_user(
    client: &ApiClient,
    client_id: &str,
    email: &str,
    role: Role,
) -> Result<Invitation, ClientError> {
    let body = json!({ "email": email, "role": role.as_str() });
    let envelope = client.post(&format!("/admin/clients/{client_id}/invitations"), &body).await?;
    decode_data(envelope)
}
