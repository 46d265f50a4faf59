//! Quiz scoring.

use std::collections::HashMap;

use db::quiz::Question;
use serde::Serialize;
use thiserror::Error;

/// Minimum percentage that counts as a pass.
pub const PASS_THRESHOLD: i32 = 85;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GradeError {
    #[error("Quiz has no questions")]
    EmptyQuiz,

    #[error("Question {0} has no correct answer")]
    MalformedQuestion(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeResult {
    pub score: i32,
    pub passed: bool,
    pub correct: usize,
    pub total: usize,
    pub outcomes: Vec<QuestionOutcome>,
}

/// Grades one attempt from scratch.
///
/// `selections` maps question id to the chosen answer, given either as the
/// answer id or as its exact text. Unanswered questions count as wrong and
/// selections for unknown questions are ignored.
pub fn grade(
    questions: &[&Question],
    selections: &HashMap<String, String>,
) -> Result<GradeResult, GradeError> {
    if questions.is_empty() {
        return Err(GradeError::EmptyQuiz);
    }

    let mut outcomes = Vec::with_capacity(questions.len());
    for question in questions {
        let key = question
            .correct_answer()
            .ok_or_else(|| GradeError::MalformedQuestion(question.id.clone()))?;
        let correct = selections
            .get(&question.id)
            .is_some_and(|picked| *picked == key.id || *picked == key.text);
        outcomes.push(QuestionOutcome {
            question_id: question.id.clone(),
            correct,
            explanation: question.explanation.clone(),
        });
    }

    let total = outcomes.len();
    let correct = outcomes.iter().filter(|o| o.correct).count();
    let score = percentage(correct, total);

    Ok(GradeResult {
        score,
        passed: score >= PASS_THRESHOLD,
        correct,
        total,
        outcomes,
    })
}

/// `round(100 * correct / total)`, halves rounded away from zero.
fn percentage(correct: usize, total: usize) -> i32 {
    ((correct as f64 / total as f64) * 100.0).round() as i32
}
