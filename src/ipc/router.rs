use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    tracing::debug!(id = %req.id, method = %req.method, "request");

    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::config::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::score::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::diagnostics::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::grades::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::competency::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::evolution::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::class::try_handle(state, &req) {
        return resp;
    }

    tracing::warn!(method = %req.method, "unknown method");
    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use serde_json::json;

    fn call(state: &mut AppState, method: &str, params: serde_json::Value) -> serde_json::Value {
        handle_request(
            state,
            Request {
                id: "t".to_string(),
                method: method.to_string(),
                params,
            },
        )
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let mut state = AppState::new(EngineConfig::default());
        let resp = call(&mut state, "nope", json!({}));
        assert_eq!(resp["ok"], json!(false));
        assert_eq!(resp["error"]["code"], json!("not_implemented"));
    }

    #[test]
    fn engine_errors_carry_code_and_field() {
        let mut state = AppState::new(EngineConfig::default());
        let resp = call(
            &mut state,
            "score.compute",
            json!({ "marks": [], "questionCount": 0 }),
        );
        assert_eq!(resp["error"]["code"], json!("invalid_input"));
        assert_eq!(resp["error"]["details"]["field"], json!("questionCount"));
    }

    #[test]
    fn malformed_params_are_bad_params() {
        let mut state = AppState::new(EngineConfig::default());
        let resp = call(&mut state, "diagnostics.aggregate", json!({ "tiers": "ABC" }));
        assert_eq!(resp["error"]["code"], json!("bad_params"));
    }

    #[test]
    fn score_compute_includes_tier() {
        let mut state = AppState::new(EngineConfig::default());
        let resp = call(
            &mut state,
            "score.compute",
            json!({ "marks": [
                { "value": 1 }, { "value": 1 }, { "value": 0.5 }, { "value": 0 }, { "value": 1 },
                { "value": 1 }, { "value": 0 }, { "value": 1 }, { "value": 1 }, { "value": 1 }
            ], "questionCount": 10 }),
        );
        assert_eq!(resp["ok"], json!(true), "{}", resp);
        assert_eq!(resp["result"]["rawScore"], json!(7.5));
        assert_eq!(resp["result"]["percentage"], json!(75.0));
        assert_eq!(resp["result"]["tier"], json!("C"));
    }
}
