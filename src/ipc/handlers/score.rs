use crate::calc::score::{compute, AssessmentResult};
use crate::calc::tier::{classify, Scheme};
use crate::calc::types::{AnswerMark, Tier};
use crate::ipc::helpers::{parse_params, respond};
use crate::ipc::types::{AppState, Request};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreParams {
    marks: Vec<AnswerMark>,
    question_count: usize,
    #[serde(default)]
    absent: bool,
}

#[derive(Debug, Serialize)]
struct ScoreResponse {
    #[serde(flatten)]
    result: AssessmentResult,
    tier: Option<Tier>,
}

fn handle_score_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: ScoreParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let r = compute(&params.marks, params.question_count, params.absent).and_then(|result| {
        let tier = match result.scored_percentage() {
            Some(p) => Some(classify(p, &state.config().percentage_scale)?),
            None => None,
        };
        Ok(ScoreResponse { result, tier })
    });
    respond(req, r)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyParams {
    value: f64,
    #[serde(default = "default_scheme")]
    scheme: Scheme,
}

fn default_scheme() -> Scheme {
    Scheme::Percentage
}

fn handle_tier_classify(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: ClassifyParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let r = classify(params.value, state.config().scale(params.scheme))
        .map(|tier| json!({ "tier": tier, "scheme": params.scheme }));
    respond(req, r)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "score.compute" => Some(handle_score_compute(state, req)),
        "tier.classify" => Some(handle_tier_classify(state, req)),
        _ => None,
    }
}
