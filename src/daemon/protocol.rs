//! JSON envelopes exchanged with the daemon's RPC endpoint
//!
//! Request:  `{"method": "<name>", "params": {...}}`
//! Response: `{"result": {...}}`

use crate::error::{Result, SdkError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters and results are JSON objects
pub type Params = Map<String, Value>;

/// RPC request sent to the daemon
#[derive(Serialize, Debug)]
pub struct RpcRequest<'a> {
    pub method: &'a str,
    pub params: &'a Params,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: &'a Params) -> Self {
        Self { method, params }
    }
}

/// Raw response body; only `result` is part of the contract
#[derive(Deserialize, Debug)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<Value>,
}

/// Decode a response body into its `result` object.
pub fn decode_result(body: &[u8]) -> Result<Params> {
    let response: RpcResponse =
        serde_json::from_slice(body).map_err(|_| SdkError::mismatch("result"))?;

    match response.result {
        Some(Value::Object(result)) => Ok(result),
        _ => {
            if let Some(error) = response.error {
                tracing::debug!(error = %error, "Daemon returned an error payload");
            }
            Err(SdkError::mismatch("result"))
        }
    }
}
