use crate::calc::diagnostic::{aggregate, classify_set, DiagnosticSet, DiagnosticTiers};
use crate::ipc::helpers::{parse_params, respond};
use crate::ipc::types::{AppState, Request};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AggregateParams {
    tiers: DiagnosticTiers,
}

fn handle_diagnostics_aggregate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: AggregateParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(req, aggregate(&params.tiers, state.config()))
}

#[derive(Debug, Deserialize)]
struct ClassifySetParams {
    diagnostics: DiagnosticSet,
}

fn handle_diagnostics_classify_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: ClassifySetParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(req, classify_set(&params.diagnostics, state.config()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "diagnostics.aggregate" => Some(handle_diagnostics_aggregate(state, req)),
        "diagnostics.classifySet" => Some(handle_diagnostics_classify_set(state, req)),
        _ => None,
    }
}
