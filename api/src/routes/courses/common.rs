use db::models::course::{self, CourseLevel};
use db::models::enrollment;
use db::models::module;
use serde::Serialize;
use services::enrollment::EnrollOutcome;

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: i32,
    pub level: CourseLevel,
    pub tags: Vec<String>,
    pub teacher_id: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<course::Model> for CourseResponse {
    fn from(course: course::Model) -> Self {
        let tags = course.tag_list();
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            duration: course.duration,
            level: course.level,
            tags,
            teacher_id: course.teacher_id,
            version: course.version,
            created_at: course.created_at.to_rfc3339(),
            updated_at: course.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModuleResponse {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub order: i32,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<module::Model> for ModuleResponse {
    fn from(module: module::Model) -> Self {
        Self {
            id: module.id,
            course_id: module.course_id,
            title: module.title,
            description: module.description,
            order: module.position,
            version: module.version,
            created_at: module.created_at.to_rfc3339(),
            updated_at: module.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub enrolled_at: String,
    pub progress: f64,
    pub status: EnrollOutcome,
}

impl EnrollmentResponse {
    pub fn new(row: enrollment::Model, status: EnrollOutcome) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            course_id: row.course_id,
            enrolled_at: row.enrolled_at.to_rfc3339(),
            progress: row.progress,
            status,
        }
    }
}
