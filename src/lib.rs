pub mod ai;
pub mod config;
pub mod logger;
pub mod models;
pub mod server;
pub mod utils;

// Re-exports for convenience
pub use ai::{evaluate_answer, CompletionClient, Evaluator, Oracle, OracleError};
pub use config::{CliOverrides, ConfigError, ConfigLoader, ServiceConfig};
pub use models::{Evaluation, EvaluationRequest, EvaluationResult, ScoreValue, ValidationError};
pub use server::{router, run_server, AppState};
