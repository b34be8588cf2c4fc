use crate::calc::competency::{class_summary, heat_map, profile, StudentProfile};
use crate::calc::types::{AnswerMark, InclusionPolicy};
use crate::config::EngineConfig;
use crate::ipc::error::ok;
use crate::ipc::helpers::{parse_params, respond};
use crate::ipc::types::{AppState, Request};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ProfileParams {
    diagnostics: Vec<Vec<AnswerMark>>,
}

fn handle_competency_profile(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: ProfileParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(&req.id, json!(profile(&params.diagnostics, state.config())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentMarks {
    student_id: String,
    #[serde(default)]
    diagnostics: Vec<Vec<AnswerMark>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassParams {
    students: Vec<StudentMarks>,
    enrolled_count: Option<usize>,
    inclusion_policy: Option<InclusionPolicy>,
}

fn student_profiles(students: &[StudentMarks], cfg: &EngineConfig) -> Vec<StudentProfile> {
    students
        .iter()
        .map(|s| StudentProfile {
            student_id: s.student_id.clone(),
            profile: profile(&s.diagnostics, cfg),
        })
        .collect()
}

fn handle_competency_class_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: ClassParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cfg = state.config();
    let policy = params.inclusion_policy.unwrap_or(cfg.inclusion_policy);
    let profiles = student_profiles(&params.students, cfg);
    let r = class_summary(&profiles, params.enrolled_count, policy, cfg).map(|summary| {
        json!({
            "inclusionPolicy": policy,
            "perCompetency": summary,
            "students": profiles,
        })
    });
    respond(req, r)
}

fn handle_competency_heat_map(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: ClassParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cfg = state.config();
    let profiles = student_profiles(&params.students, cfg);
    respond(req, heat_map(&profiles, cfg).map(|rows| json!({ "rows": rows })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "competency.profile" => Some(handle_competency_profile(state, req)),
        "competency.classSummary" => Some(handle_competency_class_summary(state, req)),
        "competency.heatMap" => Some(handle_competency_heat_map(state, req)),
        _ => None,
    }
}
