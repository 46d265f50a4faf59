use db::models::lesson::{self, LessonType};
use serde::Serialize;

/// Lesson as returned to authors after a write. Content is served by
/// `GET /lessons/{lesson_id}`.
#[derive(Debug, Serialize)]
pub struct LessonResponse {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub description: String,
    pub lesson_type: LessonType,
    pub duration: Option<i32>,
    pub order: i32,
    pub is_published: bool,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<lesson::Model> for LessonResponse {
    fn from(lesson: lesson::Model) -> Self {
        Self {
            id: lesson.id,
            module_id: lesson.module_id,
            title: lesson.title,
            description: lesson.description,
            lesson_type: lesson.lesson_type,
            duration: lesson.duration,
            order: lesson.position,
            is_published: lesson.is_published,
            version: lesson.version,
            created_at: lesson.created_at.to_rfc3339(),
            updated_at: lesson.updated_at.to_rfc3339(),
        }
    }
}
