use serde::de::DeserializeOwned;

use crate::ipc::error::HandlerErr;

/// Decodes `params.<key>`; absent and `null` both count as missing.
pub fn optional_param<T: DeserializeOwned>(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<T>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| HandlerErr::bad_params(format!("invalid params.{key}: {e}"))),
    }
}

pub fn required_param<T: DeserializeOwned>(
    params: &serde_json::Value,
    key: &str,
) -> Result<T, HandlerErr> {
    optional_param(params, key)?
        .ok_or_else(|| HandlerErr::bad_params(format!("missing params.{key}")))
}
