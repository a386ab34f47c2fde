pub mod client;
pub mod evaluator;
pub mod prompts;

// Public API exports
pub use client::{CompletionClient, Oracle, OracleError};
pub use evaluator::{
    evaluate_answer, normalize_feedback, parse_score, Evaluator, FALLBACK_FEEDBACK,
    FEEDBACK_MARKER,
};
