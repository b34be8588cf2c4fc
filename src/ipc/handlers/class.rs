use crate::calc::class::{classify_class, grade_class, StudentDiagnostics, StudentGradeInput};
use crate::calc::types::InclusionPolicy;
use crate::ipc::error::ok;
use crate::ipc::helpers::parse_params;
use crate::ipc::types::{AppState, Request};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ClassifyParams {
    students: Vec<StudentDiagnostics>,
}

fn handle_class_classify(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: ClassifyParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(&req.id, json!(classify_class(&params.students, state.config())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GradesParams {
    students: Vec<StudentGradeInput>,
    inclusion_policy: Option<InclusionPolicy>,
}

fn handle_class_grades(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params: GradesParams = match parse_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cfg = state.config();
    let policy = params.inclusion_policy.unwrap_or(cfg.inclusion_policy);
    ok(&req.id, json!(grade_class(&params.students, policy, cfg)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "class.classify" => Some(handle_class_classify(state, req)),
        "class.grades" => Some(handle_class_grades(state, req)),
        _ => None,
    }
}
