//! Course, module and lesson authoring.
//!
//! Every write validates its input before touching the database. Deletes
//! cascade explicitly inside one transaction and leave the surviving siblings
//! renumbered 1..n.

use chrono::Utc;
use db::models::course::CourseLevel;
use db::models::lesson::LessonType;
use db::models::{course, enrollment, lesson, lesson_progress, module};
use db::quiz::QuizPayload;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use validator::Validate;

use crate::access::{find_course, lesson_context, module_context, require_staff, Viewer};
use crate::error::{EngineError, EngineResult};
use crate::reorder::{touch_parent, ReorderCoordinator, ReorderScope};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CourseInput {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,

    #[validate(range(min = 0, message = "Duration must be zero or more minutes"))]
    pub duration: i32,

    pub level: CourseLevel,

    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ModuleInput {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LessonInput {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,

    pub lesson_type: LessonType,

    #[validate(range(min = 0, message = "Duration must be zero or more minutes"))]
    pub duration: Option<i32>,

    /// Text for ordinary lessons; a quiz object (or its JSON text) for QUIZ.
    #[serde(default)]
    pub content: Value,

    #[serde(default)]
    pub is_published: bool,
}

/// Turns submitted lesson content into what is stored in `lessons.content`.
fn resolve_content(lesson_type: LessonType, content: Value) -> EngineResult<String> {
    if lesson_type != LessonType::Quiz {
        return match content {
            Value::Null => Ok(String::new()),
            Value::String(text) => Ok(text),
            _ => Err(EngineError::validation("Lesson content must be text")),
        };
    }

    let parsed: Result<QuizPayload, serde_json::Error> = match content {
        Value::Null => return Err(EngineError::validation("Quiz lessons need a quiz payload")),
        Value::String(text) => serde_json::from_str(&text),
        other => serde_json::from_value(other),
    };
    let quiz = parsed
        .map_err(|e| EngineError::validation(format!("Quiz payload is not valid: {e}")))?
        .normalize();
    quiz.validate()?;
    Ok(quiz.to_content()?)
}

pub struct ContentService;

impl ContentService {
    pub async fn list_courses(db: &DatabaseConnection) -> EngineResult<Vec<course::Model>> {
        Ok(course::Model::all_by_title(db).await?)
    }

    pub async fn create_course(
        db: &DatabaseConnection,
        viewer: &Viewer,
        input: CourseInput,
    ) -> EngineResult<course::Model> {
        input.validate()?;
        if !viewer.can_author() {
            return Err(EngineError::forbidden("Only instructors and admins can create courses"));
        }

        let now = Utc::now();
        let created = course::ActiveModel {
            id: Set(db::new_id()),
            title: Set(input.title.trim().to_owned()),
            description: Set(input.description),
            duration: Set(input.duration),
            level: Set(input.level),
            tags: Set(course::Model::tags_to_json(&input.tags)),
            teacher_id: Set(viewer.user_id.clone()),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(course_id = %created.id, teacher_id = %created.teacher_id, "Course created");
        Ok(created)
    }

    pub async fn update_course(
        db: &DatabaseConnection,
        viewer: &Viewer,
        course_id: &str,
        input: CourseInput,
    ) -> EngineResult<course::Model> {
        input.validate()?;
        let existing = find_course(db, course_id).await?;
        require_staff(viewer, &existing)?;

        let mut active: course::ActiveModel = existing.into();
        active.title = Set(input.title.trim().to_owned());
        active.description = Set(input.description);
        active.duration = Set(input.duration);
        active.level = Set(input.level);
        active.tags = Set(course::Model::tags_to_json(&input.tags));
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    /// Removes a course with its modules, lessons, progress and enrollments.
    pub async fn delete_course(
        db: &DatabaseConnection,
        viewer: &Viewer,
        course_id: &str,
    ) -> EngineResult<()> {
        let existing = find_course(db, course_id).await?;
        require_staff(viewer, &existing)?;

        let txn = db.begin().await?;
        let module_ids: Vec<String> = module::Model::for_course(&txn, course_id)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();
        for module_id in &module_ids {
            delete_module_rows(&txn, module_id).await?;
        }
        enrollment::Entity::delete_many()
            .filter(enrollment::Column::CourseId.eq(course_id))
            .exec(&txn)
            .await?;
        course::Entity::delete_by_id(course_id.to_owned())
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(course_id, modules = module_ids.len(), "Course deleted");
        Ok(())
    }

    /// Appends a module at the end of the course.
    pub async fn create_module(
        db: &DatabaseConnection,
        viewer: &Viewer,
        course_id: &str,
        input: ModuleInput,
    ) -> EngineResult<module::Model> {
        input.validate()?;
        let course = find_course(db, course_id).await?;
        require_staff(viewer, &course)?;

        let txn = db.begin().await?;
        let now = Utc::now();
        let created = module::ActiveModel {
            id: Set(db::new_id()),
            course_id: Set(course_id.to_owned()),
            title: Set(input.title.trim().to_owned()),
            description: Set(input.description),
            position: Set(module::Model::next_position(&txn, course_id).await?),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        touch_parent(&txn, ReorderScope::Modules, course_id).await?;
        txn.commit().await?;

        info!(course_id, module_id = %created.id, position = created.position, "Module created");
        Ok(created)
    }

    pub async fn update_module(
        db: &DatabaseConnection,
        viewer: &Viewer,
        module_id: &str,
        input: ModuleInput,
    ) -> EngineResult<module::Model> {
        input.validate()?;
        let (existing, course) = module_context(db, module_id).await?;
        require_staff(viewer, &course)?;

        let mut active: module::ActiveModel = existing.into();
        active.title = Set(input.title.trim().to_owned());
        active.description = Set(input.description);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    pub async fn delete_module(
        db: &DatabaseConnection,
        viewer: &Viewer,
        module_id: &str,
    ) -> EngineResult<()> {
        let (existing, course) = module_context(db, module_id).await?;
        require_staff(viewer, &course)?;

        let txn = db.begin().await?;
        delete_module_rows(&txn, module_id).await?;
        ReorderCoordinator::renormalize(&txn, ReorderScope::Modules, &existing.course_id).await?;
        txn.commit().await?;

        info!(course_id = %existing.course_id, module_id, "Module deleted");
        Ok(())
    }

    /// Appends a lesson at the end of the module.
    pub async fn create_lesson(
        db: &DatabaseConnection,
        viewer: &Viewer,
        module_id: &str,
        input: LessonInput,
    ) -> EngineResult<lesson::Model> {
        input.validate()?;
        let (_, course) = module_context(db, module_id).await?;
        require_staff(viewer, &course)?;
        let content = resolve_content(input.lesson_type, input.content)?;

        let txn = db.begin().await?;
        let now = Utc::now();
        let created = lesson::ActiveModel {
            id: Set(db::new_id()),
            module_id: Set(module_id.to_owned()),
            title: Set(input.title.trim().to_owned()),
            description: Set(input.description),
            lesson_type: Set(input.lesson_type),
            duration: Set(input.duration),
            content: Set(content),
            position: Set(lesson::Model::next_position(&txn, module_id).await?),
            is_published: Set(input.is_published),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        touch_parent(&txn, ReorderScope::Lessons, module_id).await?;
        txn.commit().await?;

        info!(module_id, lesson_id = %created.id, lesson_type = %created.lesson_type, "Lesson created");
        Ok(created)
    }

    /// Replaces a lesson's fields. Its position and progress are kept.
    pub async fn update_lesson(
        db: &DatabaseConnection,
        viewer: &Viewer,
        lesson_id: &str,
        input: LessonInput,
    ) -> EngineResult<lesson::Model> {
        input.validate()?;
        let ctx = lesson_context(db, lesson_id).await?;
        require_staff(viewer, &ctx.course)?;
        let content = resolve_content(input.lesson_type, input.content)?;

        let txn = db.begin().await?;
        let mut active: lesson::ActiveModel = ctx.lesson.into();
        active.title = Set(input.title.trim().to_owned());
        active.description = Set(input.description);
        active.lesson_type = Set(input.lesson_type);
        active.duration = Set(input.duration);
        active.content = Set(content);
        active.is_published = Set(input.is_published);
        active.update(&txn).await?;

        // The content may hold a question order, so holders of the old
        // version must go stale even if a reorder landed in between.
        if !lesson::Model::increment_version(&txn, lesson_id).await? {
            return Err(EngineError::not_found("Lesson not found"));
        }
        let updated = lesson::Entity::find_by_id(lesson_id.to_owned())
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("Lesson not found"))?;
        txn.commit().await?;
        Ok(updated)
    }

    pub async fn delete_lesson(
        db: &DatabaseConnection,
        viewer: &Viewer,
        lesson_id: &str,
    ) -> EngineResult<()> {
        let ctx = lesson_context(db, lesson_id).await?;
        require_staff(viewer, &ctx.course)?;

        let txn = db.begin().await?;
        delete_lesson_rows(&txn, lesson_id).await?;
        ReorderCoordinator::renormalize(&txn, ReorderScope::Lessons, &ctx.module.id).await?;
        txn.commit().await?;

        info!(module_id = %ctx.module.id, lesson_id, "Lesson deleted");
        Ok(())
    }
}

async fn delete_lesson_rows<C: ConnectionTrait>(db: &C, lesson_id: &str) -> EngineResult<()> {
    lesson_progress::Entity::delete_many()
        .filter(lesson_progress::Column::LessonId.eq(lesson_id))
        .exec(db)
        .await?;
    lesson::Entity::delete_by_id(lesson_id.to_owned())
        .exec(db)
        .await?;
    Ok(())
}

async fn delete_module_rows<C: ConnectionTrait>(db: &C, module_id: &str) -> EngineResult<()> {
    let lesson_ids: Vec<String> = lesson::Model::for_module(db, module_id)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect();
    for lesson_id in &lesson_ids {
        delete_lesson_rows(db, lesson_id).await?;
    }
    module::Entity::delete_by_id(module_id.to_owned())
        .exec(db)
        .await?;
    Ok(())
}
