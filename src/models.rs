use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

use crate::utils::is_blank;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields,
}

/// Body of `POST /evaluate` as received. Every field is optional here so a
/// missing or non-string one surfaces as [`ValidationError`] instead of a
/// decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationPayload {
    #[serde(default, deserialize_with = "string_or_none")]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub correct_answer: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub user_answer: Option<String>,
}

// Numbers, booleans, objects and null all count as absent.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// A request that passed validation: all three fields are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub question: String,
    pub correct_answer: String,
    pub user_answer: String,
}

impl EvaluationRequest {
    pub fn new(
        question: impl Into<String>,
        correct_answer: impl Into<String>,
        user_answer: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        EvaluationPayload {
            question: Some(question.into()),
            correct_answer: Some(correct_answer.into()),
            user_answer: Some(user_answer.into()),
        }
        .try_into()
    }
}

impl TryFrom<EvaluationPayload> for EvaluationRequest {
    type Error = ValidationError;

    fn try_from(payload: EvaluationPayload) -> Result<Self, Self::Error> {
        if is_blank(payload.question.as_deref())
            || is_blank(payload.correct_answer.as_deref())
            || is_blank(payload.user_answer.as_deref())
        {
            return Err(ValidationError::MissingFields);
        }

        Ok(Self {
            question: payload.question.unwrap_or_default(),
            correct_answer: payload.correct_answer.unwrap_or_default(),
            user_answer: payload.user_answer.unwrap_or_default(),
        })
    }
}

/// Percentage in `0..=100` parsed from the oracle's scoring reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ScoreValue(u8);

impl ScoreValue {
    pub const MAX: u8 = 100;

    /// Values above 100 are clamped.
    pub fn new(value: u32) -> Self {
        Self(value.min(Self::MAX as u32) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ScoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Response body for both the scored and the degraded outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub question: String,
    pub correct_answer: String,
    pub user_answer: String,
    pub score: String,
    pub feedback: String,
}

/// Final state of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Scored(EvaluationResult),
    Degraded(EvaluationResult),
}

impl Evaluation {
    pub fn result(&self) -> &EvaluationResult {
        match self {
            Evaluation::Scored(r) | Evaluation::Degraded(r) => r,
        }
    }

    pub fn into_result(self) -> EvaluationResult {
        match self {
            Evaluation::Scored(r) | Evaluation::Degraded(r) => r,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Evaluation::Degraded(_))
    }
}
