//! Sequential unlock rule.
//!
//! The first lesson of a module is always open. Every later lesson opens once
//! the lesson right before it is completed. Nothing here is persisted; callers
//! derive it again on every read and every progress write.

use std::collections::{HashMap, HashSet};

use db::models::{lesson, lesson_progress};
use serde::Serialize;

/// Anything with a stable id and a 1-based position among its siblings.
pub trait Sequenced {
    fn id(&self) -> &str;
    fn position(&self) -> i32;
}

impl Sequenced for lesson::Model {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> i32 {
        self.position
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonUnlock {
    pub lesson_id: String,
    pub position: i32,
    pub is_unlocked: bool,
    pub completed: bool,
}

/// Ids of the lessons a user has completed, from a progress map keyed by lesson id.
pub fn completed_ids(progress: &HashMap<String, lesson_progress::Model>) -> HashSet<String> {
    progress
        .values()
        .filter(|p| p.completed)
        .map(|p| p.lesson_id.clone())
        .collect()
}

/// Evaluates the unlock state of every lesson, returned in (position, id) order.
///
/// The input order does not matter. A lesson without a completed record counts
/// as not completed.
pub fn evaluate_unlocks<L: Sequenced>(lessons: &[L], completed: &HashSet<String>) -> Vec<LessonUnlock> {
    let mut ordered: Vec<&L> = lessons.iter().collect();
    ordered.sort_by(|a, b| a.position().cmp(&b.position()).then_with(|| a.id().cmp(b.id())));

    let mut previous_completed = true;
    ordered
        .into_iter()
        .map(|lesson| {
            let done = completed.contains(lesson.id());
            let unlock = LessonUnlock {
                lesson_id: lesson.id().to_owned(),
                position: lesson.position(),
                is_unlocked: previous_completed,
                completed: done,
            };
            previous_completed = done;
            unlock
        })
        .collect()
}

/// Unlock state of a single lesson, or `None` when it is not in `lessons`.
pub fn is_lesson_unlocked<L: Sequenced>(
    lessons: &[L],
    completed: &HashSet<String>,
    lesson_id: &str,
) -> Option<bool> {
    evaluate_unlocks(lessons, completed)
        .into_iter()
        .find(|u| u.lesson_id == lesson_id)
        .map(|u| u.is_unlocked)
}
