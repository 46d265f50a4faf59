//! Quiz payload stored inside a QUIZ lesson's `content` column.
//!
//! The payload is plain JSON:
//! `{ instructions, questions: [{ id, order, text, explanation?, answers: [{ id, text, is_correct }] }] }`.
//! Ids may be omitted on write; [`QuizPayload::normalize`] fills them in and
//! renumbers question order from the array position.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Quiz content is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Lesson {0} is not a quiz")]
    NotAQuiz(String),

    #[error("A quiz needs at least one question")]
    EmptyQuiz,

    #[error("Question {0} has no text")]
    BlankQuestion(usize),

    #[error("Question {question} has an answer with no text")]
    BlankAnswer { question: usize },

    #[error("Question {question} must have exactly one correct answer (found {found})")]
    CorrectAnswerCount { question: usize, found: usize },

    #[error("Duplicate question id '{0}'")]
    DuplicateQuestionId(String),

    #[error("Duplicate answer id '{answer}' in question '{question}'")]
    DuplicateAnswerId { question: String, answer: String },

    #[error("Question {question} has two answers reading '{text}'")]
    DuplicateAnswerText { question: usize, text: String },

    #[error("Question order must run 1..{0} without gaps")]
    OrderNotDense(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizPayload {
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub order: i32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// What a learner sees before submitting: no correctness flags, no explanations.
#[derive(Debug, Clone, Serialize)]
pub struct LearnerQuiz {
    pub instructions: String,
    pub questions: Vec<LearnerQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LearnerQuestion {
    pub id: String,
    pub order: i32,
    pub text: String,
    pub answers: Vec<LearnerAnswer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LearnerAnswer {
    pub id: String,
    pub text: String,
}

impl Question {
    pub fn correct_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| a.is_correct)
    }
}

impl QuizPayload {
    pub fn parse(content: &str) -> Result<Self, QuizError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_content(&self) -> Result<String, QuizError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Assigns ids to questions and answers that lack one and renumbers
    /// question order from the array position.
    pub fn normalize(mut self) -> Self {
        for (idx, question) in self.questions.iter_mut().enumerate() {
            if question.id.trim().is_empty() {
                question.id = crate::new_id();
            }
            question.order = idx as i32 + 1;
            for answer in question.answers.iter_mut() {
                if answer.id.trim().is_empty() {
                    answer.id = crate::new_id();
                }
            }
        }
        self
    }

    /// Checks the structural rules every stored quiz must satisfy.
    ///
    /// Question numbers in errors are 1-based array positions.
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.questions.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }

        let mut question_ids = HashSet::new();
        let mut orders: Vec<i32> = Vec::with_capacity(self.questions.len());

        for (idx, question) in self.questions.iter().enumerate() {
            let number = idx + 1;
            if question.text.trim().is_empty() {
                return Err(QuizError::BlankQuestion(number));
            }
            if !question_ids.insert(question.id.as_str()) {
                return Err(QuizError::DuplicateQuestionId(question.id.clone()));
            }

            let mut answer_ids = HashSet::new();
            let mut answer_texts = HashSet::new();
            for answer in &question.answers {
                let text = answer.text.trim();
                if text.is_empty() {
                    return Err(QuizError::BlankAnswer { question: number });
                }
                // Answers can be picked by text.
                if !answer_texts.insert(text) {
                    return Err(QuizError::DuplicateAnswerText {
                        question: number,
                        text: text.to_owned(),
                    });
                }
                if !answer_ids.insert(answer.id.as_str()) {
                    return Err(QuizError::DuplicateAnswerId {
                        question: question.id.clone(),
                        answer: answer.id.clone(),
                    });
                }
            }

            let found = question.answers.iter().filter(|a| a.is_correct).count();
            if found != 1 {
                return Err(QuizError::CorrectAnswerCount {
                    question: number,
                    found,
                });
            }
            orders.push(question.order);
        }

        orders.sort_unstable();
        let dense = orders
            .iter()
            .enumerate()
            .all(|(idx, order)| *order == idx as i32 + 1);
        if !dense {
            return Err(QuizError::OrderNotDense(self.questions.len()));
        }
        Ok(())
    }

    /// Questions sorted by (order, id).
    pub fn ordered_questions(&self) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self.questions.iter().collect();
        questions.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        questions
    }

    /// Question ids in display order.
    pub fn question_ids(&self) -> Vec<String> {
        self.ordered_questions()
            .into_iter()
            .map(|q| q.id.clone())
            .collect()
    }

    /// Rewrites question order from `(id, order)` pairs and stores the array
    /// in that order. Ids not listed keep their current order.
    pub fn apply_order(&mut self, assignments: &[(String, i32)]) {
        for question in self.questions.iter_mut() {
            if let Some((_, order)) = assignments.iter().find(|(id, _)| *id == question.id) {
                question.order = *order;
            }
        }
        self.questions
            .sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    }

    pub fn learner_view(&self) -> LearnerQuiz {
        LearnerQuiz {
            instructions: self.instructions.clone(),
            questions: self
                .ordered_questions()
                .into_iter()
                .map(|q| LearnerQuestion {
                    id: q.id.clone(),
                    order: q.order,
                    text: q.text.clone(),
                    answers: q
                        .answers
                        .iter()
                        .map(|a| LearnerAnswer {
                            id: a.id.clone(),
                            text: a.text.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
