use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("invalid config value for {field}: {reason}")]
    Config { field: String, reason: String },

    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable code used in sidecar error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidInput { .. } => "invalid_input",
            EngineError::Config { .. } => "bad_config",
            EngineError::Io(_) | EngineError::Toml(_) | EngineError::Json(_) => {
                "config_load_failed"
            }
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            EngineError::InvalidInput { field, .. } | EngineError::Config { field, .. } => {
                Some(field.as_str())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_taxonomy() {
        assert_eq!(EngineError::invalid("marks", "empty").code(), "invalid_input");
        assert_eq!(EngineError::config("tierPoints", "bad").code(), "bad_config");
        let io = EngineError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "x"));
        assert_eq!(io.code(), "config_load_failed");
        assert_eq!(io.field(), None);
    }

    #[test]
    fn message_names_the_field() {
        let e = EngineError::invalid("questionCount", "must be greater than zero");
        assert_eq!(
            e.to_string(),
            "invalid input for questionCount: must be greater than zero"
        );
        assert_eq!(e.field(), Some("questionCount"));
    }
}
