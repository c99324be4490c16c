//! Authentication flows: login, invitation signup, password reset, refresh
//! and logout. Successful credential exchanges store the returned token
//! pair; logout clears it even when the upstream call fails.

use serde_json::json;

use crate::claims::{decode_claims, DecodedClaims};
use crate::client::{ApiClient, ClientError};
use crate::session::TokenPair;

use super::decode_data;

/// Exchange credentials for a token pair and store it.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<TokenPair, ClientError> {
    let body = json!({ "email": email, "password": password });
    let envelope = client.post("/auth/login", &body).await?;

    let pair: TokenPair = decode_data(envelope)?;
    client
        .session()
        .store(&pair)
        .map_err(|err| ClientError::InvalidResponse(format!("could not persist session: {err}")))?;

    Ok(pair)
}

/// Complete a signup from an emailed invitation token.
pub async fn accept_invitation(
    client: &ApiClient,
    invitation_token: &str,
    password: &str,
) -> Result<TokenPair, ClientError> {
    let body = json!({ "token": invitation_token, "password": password });
    let envelope = client.post("/auth/invitations/accept", &body).await?;

    let pair: TokenPair = decode_data(envelope)?;
    client
        .session()
        .store(&pair)
        .map_err(|err| ClientError::InvalidResponse(format!("could not persist session: {err}")))?;

    Ok(pair)
}

pub async fn request_password_reset(client: &ApiClient, email: &str) -> Result<(), ClientError> {
    let body = json!({ "email": email });
    client.post("/auth/password-reset/request", &body).await?;
    Ok(())
}

pub async fn reset_password(
    client: &ApiClient,
    reset_token: &str,
    new_password: &str,
) -> Result<(), ClientError> {
    let body = json!({ "token": reset_token, "password": new_password });
    client.post("/auth/password-reset/confirm", &body).await?;
    Ok(())
}

/// Force a token rotation outside of the automatic 401 recovery.
pub async fn refresh(client: &ApiClient) -> Result<(), ClientError> {
    client.refresh_session().await
}

/// Tell the upstream to revoke the session, then drop the local pair. The
/// local clear happens regardless of what the upstream says.
pub async fn logout(client: &ApiClient) -> Result<(), ClientError> {
    let result = client.post("/auth/logout", &json!({})).await;
    let _ = client.session().clear();

    match result {
        Ok(_) | Err(ClientError::Backend { .. }) | Err(ClientError::SessionExpired) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Claims decoded from the stored access token, if any. Informational only.
pub fn current_claims(client: &ApiClient) -> Option<DecodedClaims> {
    client.session().access_token().and_then(|token| decode_claims(&token))
}
