use crate::calc::evolution::Direction;
use crate::calc::period::{compute_grade, evolution_factor_for, grade_from_results, ComponentAverages, GradedResult};
use crate::calc::types::{InclusionPolicy, TierCode};
use crate::ipc::helpers::{parse_params, respond};
use crate::ipc::types::{AppState, Request};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputeParams {
    #[serde(flatten)]
    components: ComponentAverages,
    /// Explicit multiplier; wins over `direction`.
    evolution_factor: Option<f64>,
    direction: Option<Direction>,
}

fn handle_grades_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: ComputeParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cfg = state.config();
    let factor = params.evolution_factor.unwrap_or_else(|| {
        evolution_factor_for(params.direction.unwrap_or(Direction::Unknown), cfg)
    });
    respond(req, compute_grade(&params.components, factor, &cfg.period_weights))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FromResultsParams {
    results: Vec<GradedResult>,
    previous_tier: Option<TierCode>,
    current_tier: Option<TierCode>,
    inclusion_policy: Option<InclusionPolicy>,
}

fn handle_grades_from_results(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: FromResultsParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cfg = state.config();
    let policy = params.inclusion_policy.unwrap_or(cfg.inclusion_policy);
    respond(
        req,
        grade_from_results(
            &params.results,
            params.previous_tier,
            params.current_tier,
            policy,
            cfg,
        ),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.compute" => Some(handle_grades_compute(state, req)),
        "grades.fromResults" => Some(handle_grades_from_results(state, req)),
        _ => None,
    }
}
