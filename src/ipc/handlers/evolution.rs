use crate::calc::evolution::{class_tally, compare_scores, compare_tiers, TierTransition};
use crate::calc::types::TierCode;
use crate::ipc::error::ok;
use crate::ipc::helpers::parse_params;
use crate::ipc::types::{AppState, Request};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct CompareParams {
    previous: Option<TierCode>,
    current: Option<TierCode>,
}

fn handle_evolution_compare(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: CompareParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(&req.id, json!(compare_tiers(params.previous, params.current)))
}

#[derive(Debug, Deserialize)]
struct CompareScoresParams {
    previous: Option<f64>,
    current: Option<f64>,
    band: Option<f64>,
}

fn handle_evolution_compare_scores(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: CompareScoresParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let band = params.band.unwrap_or(state.config().score_stable_band);
    ok(
        &req.id,
        json!(compare_scores(params.previous, params.current, band)),
    )
}

#[derive(Debug, Deserialize)]
struct TallyParams {
    transitions: Vec<TierTransition>,
}

fn handle_evolution_class_tally(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: TallyParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let per_student: Vec<serde_json::Value> = params
        .transitions
        .iter()
        .map(|t| {
            json!({
                "studentId": t.student_id,
                "movement": compare_tiers(t.previous, t.current),
            })
        })
        .collect();
    ok(
        &req.id,
        json!({
            "tally": class_tally(&params.transitions),
            "students": per_student,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "evolution.compare" => Some(handle_evolution_compare(state, req)),
        "evolution.compareScores" => Some(handle_evolution_compare_scores(state, req)),
        "evolution.classTally" => Some(handle_evolution_class_tally(state, req)),
        _ => None,
    }
}
