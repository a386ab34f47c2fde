use regex::Regex;
use std::sync::Arc;

use crate::ai::client::{Oracle, OracleError};
use crate::ai::prompts::{feedback_prompt, scoring_prompt};
use crate::models::{Evaluation, EvaluationRequest, EvaluationResult, ScoreValue};
use crate::utils::truncate_string;

/// Appended to every piece of feedback that came from the model.
pub const FEEDBACK_MARKER: &str = "\t.....{AI generated feedback.}";

/// Feedback sent back when either oracle call failed.
pub const FALLBACK_FEEDBACK: &str = "Error processing answer. Please try again.\nAI generated feedback.";

const MAX_FEEDBACK_LINES: usize = 2;

lazy_static::lazy_static! {
    static ref SCORE_DIGITS: Regex = Regex::new(r"[0-9]{1,3}").unwrap();
}

/// First run of up to three ASCII digits, clamped to 100. No digits gives 0.
pub fn parse_score(raw: &str) -> ScoreValue {
    SCORE_DIGITS
        .find(raw)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(ScoreValue::new)
        .unwrap_or_default()
}

/// Trim, keep the first two lines joined by a space, then add the marker.
pub fn normalize_feedback(raw: &str) -> String {
    let kept: Vec<&str> = raw.trim().lines().take(MAX_FEEDBACK_LINES).collect();
    format!("{}{}", kept.join(" "), FEEDBACK_MARKER)
}

fn scored_result(request: &EvaluationRequest, score: ScoreValue, feedback: String) -> EvaluationResult {
    EvaluationResult {
        question: request.question.clone(),
        correct_answer: request.correct_answer.clone(),
        user_answer: request.user_answer.clone(),
        score: score.to_string(),
        feedback,
    }
}

pub fn degraded_result(request: &EvaluationRequest) -> EvaluationResult {
    scored_result(request, ScoreValue::default(), FALLBACK_FEEDBACK.to_string())
}

/// Combine the oracle outcome into the final evaluation. Any failure throws
/// away whatever partial result existed and yields the degraded payload.
pub fn settle(
    request: &EvaluationRequest,
    outcome: Result<(ScoreValue, String), OracleError>,
) -> Evaluation {
    match outcome {
        Ok((score, feedback)) => Evaluation::Scored(scored_result(request, score, feedback)),
        Err(e) => {
            tracing::error!(error = %e, "answer evaluation failed, returning fallback");
            Evaluation::Degraded(degraded_result(request))
        }
    }
}

async fn consult_oracle(
    oracle: &dyn Oracle,
    question: &str,
    correct_answer: &str,
    user_answer: &str,
) -> Result<(ScoreValue, String), OracleError> {
    let raw_score = oracle
        .complete(&scoring_prompt(question, correct_answer, user_answer))
        .await?;
    let score = parse_score(&raw_score);
    tracing::debug!(raw = %raw_score, score = score.value(), "score reply parsed");

    let raw_feedback = oracle
        .complete(&feedback_prompt(question, correct_answer, user_answer))
        .await?;

    Ok((score, normalize_feedback(&raw_feedback)))
}

/// Score `request` and produce feedback with two sequential oracle calls.
pub async fn evaluate_answer(
    oracle: &dyn Oracle,
    request: &EvaluationRequest,
    max_field_chars: usize,
) -> Evaluation {
    tracing::info!(
        question_chars = request.question.chars().count(),
        correct_answer_chars = request.correct_answer.chars().count(),
        user_answer_chars = request.user_answer.chars().count(),
        "starting answer evaluation"
    );

    let question = truncate_string(&request.question, max_field_chars);
    let correct_answer = truncate_string(&request.correct_answer, max_field_chars);
    let user_answer = truncate_string(&request.user_answer, max_field_chars);

    let outcome = consult_oracle(oracle, &question, &correct_answer, &user_answer).await;
    let evaluation = settle(request, outcome);

    if let Evaluation::Scored(result) = &evaluation {
        tracing::info!(score = %result.score, "answer evaluated");
    }
    evaluation
}

/// Shared handle the HTTP layer evaluates through.
#[derive(Clone)]
pub struct Evaluator {
    oracle: Arc<dyn Oracle>,
    max_field_chars: usize,
}

impl Evaluator {
    pub fn new(oracle: Arc<dyn Oracle>, max_field_chars: usize) -> Self {
        Self {
            oracle,
            max_field_chars,
        }
    }

    pub async fn evaluate(&self, request: &EvaluationRequest) -> Evaluation {
        evaluate_answer(self.oracle.as_ref(), request, self.max_field_chars).await
    }
}

#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::Mutex;

/// Scripted reply for [`ScriptedOracle`].
#[cfg(test)]
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
}

/// Oracle double that replays scripted replies and records every prompt.
#[cfg(test)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedOracle {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Reply::Text(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail) => Err(OracleError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "scripted failure".to_string(),
            }),
            None => Err(OracleError::InvalidResponse),
        }
    }
}
