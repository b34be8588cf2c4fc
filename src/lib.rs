pub mod calc;
pub mod config;
pub mod error;
pub mod ipc;
pub mod logging;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
