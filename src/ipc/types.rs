use serde::Deserialize;

use crate::config::{merge_json, EngineConfig};
use crate::error::Result;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Sidecar state: the policy only. No student data survives a request.
pub struct AppState {
    base: EngineConfig,
    override_patch: Option<serde_json::Value>,
    active: EngineConfig,
}

impl AppState {
    pub fn new(base: EngineConfig) -> Self {
        Self {
            active: base.clone(),
            base,
            override_patch: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.active
    }

    pub fn base(&self) -> &EngineConfig {
        &self.base
    }

    pub fn override_patch(&self) -> Option<&serde_json::Value> {
        self.override_patch.as_ref()
    }

    /// Merges `patch` into the current override. State is untouched when
    /// the merged config does not validate.
    pub fn update_override(&mut self, patch: &serde_json::Value) -> Result<()> {
        let active = self.active.with_overrides(patch)?;
        let mut merged = self
            .override_patch
            .take()
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
        merge_json(&mut merged, patch);
        self.override_patch = Some(merged);
        self.active = active;
        Ok(())
    }

    pub fn clear_override(&mut self) {
        self.override_patch = None;
        self.active = self.base.clone();
    }

    /// Swaps the base config, re-applying any override on top of it.
    pub fn replace_base(&mut self, base: EngineConfig) -> Result<()> {
        let active = match &self.override_patch {
            Some(p) => base.with_overrides(p)?,
            None => base.clone(),
        };
        self.base = base;
        self.active = active;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn override_layers_over_base_and_clears() {
        let mut state = AppState::new(EngineConfig::default());
        state
            .update_override(&json!({ "scoreStableBand": 3.0 }))
            .expect("override");
        state
            .update_override(&json!({ "competencyTrendThreshold": 20.0 }))
            .expect("override");
        assert_eq!(state.config().score_stable_band, 3.0);
        assert_eq!(state.config().competency_trend_threshold, 20.0);

        let mut base = EngineConfig::default();
        base.score_stable_band = 9.0;
        base.diagnostic_weights.d1 = 5.0;
        state.replace_base(base).expect("replace base");
        assert_eq!(state.config().score_stable_band, 3.0);
        assert_eq!(state.config().diagnostic_weights.d1, 5.0);

        state.clear_override();
        assert_eq!(state.config().score_stable_band, 9.0);
        assert!(state.override_patch().is_none());
    }

    #[test]
    fn rejected_override_keeps_previous_state() {
        let mut state = AppState::new(EngineConfig::default());
        let bad = json!({ "periodWeights": { "evaluations": -1.0 } });
        assert!(state.update_override(&bad).is_err());
        assert_eq!(state.config(), &EngineConfig::default());
        assert!(state.override_patch().is_none());
    }
}
