pub mod class;
pub mod competency;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod evolution;
pub mod grades;
pub mod score;
