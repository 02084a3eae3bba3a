//! Typed wrappers for the daemon RPC methods this crate uses directly.
//!
//! Each wrapper calls [`Supervisor::request`] and decodes the `result`
//! object into a record, failing with `ResponseMismatch` when the shape is off.

use crate::daemon::{Params, Supervisor};
use crate::error::{Result, SdkError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DaemonStatus {
    #[serde(default)]
    pub is_running: bool,
    pub installation_id: Option<String>,
    #[serde(flatten)]
    pub extra: Params,
}

/// A resolved claim; fields beyond the common ones stay in `extra`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claim {
    pub claim_id: String,
    pub name: Option<String>,
    pub canonical_url: Option<String>,
    #[serde(flatten)]
    pub extra: Params,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamInfo {
    /// Opaque address on the daemon's streaming port
    pub streaming_url: Option<String>,
    pub claim_id: Option<String>,
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Params,
}

fn decode<T: DeserializeOwned>(value: Value, field: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        tracing::debug!(field = %field, error = %e, "Failed to decode RPC result");
        SdkError::mismatch(field)
    })
}

fn decode_version(result: &Params) -> Result<String> {
    result
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SdkError::mismatch("version"))
}

/// Build resolve params; keys in `options` win, `urls` included.
fn resolve_params(urls: &[&str], options: Params) -> Params {
    let mut params = Params::new();
    params.insert("urls".to_string(), Value::from(urls.to_vec()));
    params.extend(options);
    params
}

/// Human-readable text of a per-item `error` marker
fn error_reason(error: &Value) -> String {
    match error {
        Value::String(text) => text.clone(),
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

fn item_error(url: &str, entry: &Value) -> Option<SdkError> {
    entry.get("error").map(|error| SdkError::ResourceResolveFailed {
        url: url.to_string(),
        reason: error_reason(error),
    })
}

fn decode_claim(url: &str, mut result: Params) -> Result<Claim> {
    let entry = result.remove(url).ok_or_else(|| SdkError::mismatch(url))?;
    if let Some(err) = item_error(url, &entry) {
        return Err(err);
    }
    decode(entry, "claim_id")
}

impl Supervisor {
    pub async fn status(&self) -> Result<DaemonStatus> {
        let result = self.request("status", Params::new()).await?;
        decode(Value::Object(result), "status")
    }

    pub async fn version(&self) -> Result<String> {
        let result = self.request("version", Params::new()).await?;
        decode_version(&result)
    }

    /// Resolve several URLs in one call. Entries are returned as sent by the
    /// daemon, including per-URL error markers.
    pub async fn resolve(&self, urls: &[&str], options: Params) -> Result<HashMap<String, Value>> {
        let result = self.request("resolve", resolve_params(urls, options)).await?;
        Ok(result.into_iter().collect())
    }

    pub async fn resolve_one(&self, url: &str) -> Result<Claim> {
        let result = self
            .request("resolve", resolve_params(&[url], Params::new()))
            .await?;
        decode_claim(url, result)
    }

    pub async fn get(&self, uri: &str, options: Params) -> Result<StreamInfo> {
        let mut params = Params::new();
        params.insert("uri".to_string(), Value::from(uri));
        params.extend(options);

        let result = Value::Object(self.request("get", params).await?);
        if let Some(err) = item_error(uri, &result) {
            return Err(err);
        }
        decode(result, "streaming_url")
    }

    /// Ask the daemon to shut itself down.
    pub async fn stop(&self) -> Result<()> {
        self.request("stop", Params::new()).await?;
        Ok(())
    }
}
