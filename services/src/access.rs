use std::collections::HashSet;

use db::models::user::UserRole;
use db::models::{course, enrollment, lesson, lesson_progress, module};
use sea_orm::{ConnectionTrait, EntityTrait};

use crate::error::{EngineError, EngineResult};
use crate::unlock::{completed_ids, is_lesson_unlocked};

/// The authenticated caller, as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: String,
    pub role: UserRole,
}

impl Viewer {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Instructors and admins may create courses.
    pub fn can_author(&self) -> bool {
        matches!(self.role, UserRole::Instructor | UserRole::Admin)
    }

    /// Admins manage every course; instructors manage the ones they own.
    pub fn is_staff_for(&self, course: &course::Model) -> bool {
        self.is_admin()
            || (self.role == UserRole::Instructor && course.teacher_id == self.user_id)
    }
}

/// A lesson with the module and course it belongs to.
#[derive(Debug, Clone)]
pub struct LessonContext {
    pub lesson: lesson::Model,
    pub module: module::Model,
    pub course: course::Model,
}

pub async fn find_course<C: ConnectionTrait>(db: &C, course_id: &str) -> EngineResult<course::Model> {
    course::Entity::find_by_id(course_id.to_owned())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("Course not found"))
}

/// Loads a module and its course.
pub async fn module_context<C: ConnectionTrait>(
    db: &C,
    module_id: &str,
) -> EngineResult<(module::Model, course::Model)> {
    let module = module::Entity::find_by_id(module_id.to_owned())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("Module not found"))?;
    let course = find_course(db, &module.course_id).await?;
    Ok((module, course))
}

pub async fn lesson_context<C: ConnectionTrait>(db: &C, lesson_id: &str) -> EngineResult<LessonContext> {
    let lesson = lesson::Entity::find_by_id(lesson_id.to_owned())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::not_found("Lesson not found"))?;
    let (module, course) = module_context(db, &lesson.module_id).await?;
    Ok(LessonContext {
        lesson,
        module,
        course,
    })
}

pub fn require_staff(viewer: &Viewer, course: &course::Model) -> EngineResult<()> {
    if viewer.is_staff_for(course) {
        Ok(())
    } else {
        Err(EngineError::forbidden("You do not manage this course"))
    }
}

pub async fn require_enrollment<C: ConnectionTrait>(
    db: &C,
    viewer: &Viewer,
    course_id: &str,
) -> EngineResult<()> {
    if enrollment::Model::is_enrolled(db, &viewer.user_id, course_id).await? {
        Ok(())
    } else {
        Err(EngineError::forbidden("You are not enrolled in this course"))
    }
}

/// Published lessons of a module with the viewer's completion state.
pub async fn learner_lessons<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    module_id: &str,
) -> EngineResult<(Vec<lesson::Model>, HashSet<String>)> {
    let lessons: Vec<lesson::Model> = lesson::Model::for_module(db, module_id)
        .await?
        .into_iter()
        .filter(|l| l.is_published)
        .collect();
    let ids: Vec<String> = lessons.iter().map(|l| l.id.clone()).collect();
    let progress = lesson_progress::Model::map_for_lessons(db, user_id, &ids).await?;
    Ok((lessons, completed_ids(&progress)))
}

/// What a lesson read or write is allowed to do once the gate passed.
#[derive(Debug, Clone)]
pub struct LessonAccess {
    pub ctx: LessonContext,
    pub is_staff: bool,
}

/// Resolves a lesson and checks that `viewer` may open it.
///
/// Staff of the course always pass, unless `require_enrolled` is set, in which
/// case they need an enrollment like everyone else. Learners must be enrolled,
/// the lesson must be published, and the unlock rule is evaluated against the
/// learner's stored progress.
pub async fn open_lesson<C: ConnectionTrait>(
    db: &C,
    viewer: &Viewer,
    lesson_id: &str,
    require_enrolled: bool,
) -> EngineResult<LessonAccess> {
    let ctx = lesson_context(db, lesson_id).await?;
    let is_staff = viewer.is_staff_for(&ctx.course);

    if is_staff {
        if require_enrolled {
            require_enrollment(db, viewer, &ctx.course.id).await?;
        }
        return Ok(LessonAccess { ctx, is_staff });
    }

    if !ctx.lesson.is_published {
        return Err(EngineError::not_found("Lesson not found"));
    }
    require_enrollment(db, viewer, &ctx.course.id).await?;

    let (lessons, completed) = learner_lessons(db, &viewer.user_id, &ctx.module.id).await?;
    if is_lesson_unlocked(&lessons, &completed, &ctx.lesson.id) != Some(true) {
        return Err(EngineError::forbidden("Lesson is locked"));
    }

    Ok(LessonAccess { ctx, is_staff })
}
