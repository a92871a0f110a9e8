// JSON-RPC 2.0 wire types

use catalog_lib::CatalogError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const UNAUTHORIZED: i32 = -32003;
pub const NOT_FOUND: i32 = -32004;
pub const SERVER_ERROR: i32 = -32000;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    /// The typed catalog error, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(e: impl Display) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {}", e))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Unknown method: {}", method))
    }

    pub fn invalid_params(e: impl Display) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {}", e))
    }
}

impl From<CatalogError> for JsonRpcError {
    fn from(error: CatalogError) -> Self {
        let code = match &error {
            CatalogError::NotFound(_) => NOT_FOUND,
            CatalogError::Unauthorized(_) => UNAUTHORIZED,
            CatalogError::InvalidRequest(_) => INVALID_PARAMS,
            _ => SERVER_ERROR,
        };

        Self {
            code,
            message: error.to_string(),
            data: serde_json::to_value(&error).ok(),
        }
    }
}
