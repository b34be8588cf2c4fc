use crate::config::EngineConfig;
use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn config_value(state: &AppState) -> serde_json::Value {
    json!({
        "active": state.config(),
        "base": state.base(),
        "override": state.override_patch(),
    })
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, config_value(state))
}

fn handle_config_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    if !req.params.is_object() {
        return err(&req.id, "bad_params", "params must be an object", None);
    }
    match state.update_override(&req.params) {
        Ok(()) => {
            tracing::info!("config override updated");
            ok(&req.id, config_value(state))
        }
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_config_clear_override(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.clear_override();
    tracing::info!("config override cleared");
    ok(&req.id, config_value(state))
}

fn handle_config_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match EngineConfig::from_file(&path).and_then(|cfg| state.replace_base(cfg)) {
        Ok(()) => ok(&req.id, config_value(state)),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "config.get" => Some(handle_config_get(state, req)),
        "config.update" => Some(handle_config_update(state, req)),
        "config.clearOverride" => Some(handle_config_clear_override(state, req)),
        "config.load" => Some(handle_config_load(state, req)),
        _ => None,
    }
}
