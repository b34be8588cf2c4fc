use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::EngineError;
use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::types::Request;

pub fn parse_params<T: DeserializeOwned>(req: &Request) -> Result<T, serde_json::Value> {
    let raw = if req.params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        req.params.clone()
    };
    serde_json::from_value(raw).map_err(|e| err(&req.id, "bad_params", e.to_string(), None))
}

/// Serializes an engine result into the response envelope.
pub fn respond<T: Serialize>(req: &Request, r: Result<T, EngineError>) -> serde_json::Value {
    match r {
        Ok(v) => match serde_json::to_value(v) {
            Ok(value) => ok(&req.id, value),
            Err(e) => err(&req.id, "internal", e.to_string(), None),
        },
        Err(e) => engine_err(&req.id, &e),
    }
}
