//! Feature-level API modules.
//!
//! Thin, typed wrappers over `ApiClient` for each area of the portal's REST
//! surface. All of them decode through the canonical envelope; none of them
//! re-implement retry or error shaping.

pub mod admin;
pub mod auth;
pub mod billing;

use serde::de::DeserializeOwned;

use crate::client::ClientError;
use crate::envelope::{Envelope, Pagination};

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

/// Decode an envelope's data into a typed value.
pub(crate) fn decode_data<T: DeserializeOwned>(envelope: Envelope) -> Result<T, ClientError> {
    serde_json::from_value(envelope.data)
        .map_err(|err| ClientError::InvalidResponse(err.to_string()))
}

/// Decode an envelope carrying a list plus optional pagination.
pub(crate) fn decode_page<T: DeserializeOwned>(envelope: Envelope) -> Result<Page<T>, ClientError> {
    let pagination = envelope.pagination;
    let items = serde_json::from_value(envelope.data)
        .map_err(|err| ClientError::InvalidResponse(err.to_string()))?;
    Ok(Page { items, pagination })
}
