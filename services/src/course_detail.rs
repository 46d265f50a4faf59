//! Read models for courses and lessons, annotated with the viewer's unlock
//! and completion state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use db::models::course::CourseLevel;
use db::models::lesson::LessonType;
use db::models::{enrollment, lesson, lesson_progress, module};
use db::quiz::{LearnerQuiz, QuizPayload};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::Value;

use crate::access::{find_course, lesson_context, open_lesson, require_staff, Viewer};
use crate::error::{EngineError, EngineResult};
use crate::unlock::{completed_ids, evaluate_unlocks};

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: i32,
    pub level: CourseLevel,
    pub tags: Vec<String>,
    pub teacher_id: String,
    pub version: i64,
    pub is_staff: bool,
    pub is_enrolled: bool,
    pub progress: Option<f64>,
    pub modules: Vec<ModuleDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub order: i32,
    pub version: i64,
    pub lessons: Vec<LessonSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub lesson_type: LessonType,
    pub duration: Option<i32>,
    pub order: i32,
    pub is_published: bool,
    pub is_unlocked: bool,
    pub completed: bool,
    pub score: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonDetail {
    #[serde(flatten)]
    pub summary: LessonSummary,
    pub module_id: String,
    pub course_id: String,
    /// Text for ordinary lessons. For quizzes: the learner view for learners,
    /// the full payload for staff.
    pub content: Value,
    pub time_spent: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
}

fn summarize(
    lesson: &lesson::Model,
    is_unlocked: bool,
    progress: Option<&lesson_progress::Model>,
) -> LessonSummary {
    LessonSummary {
        id: lesson.id.clone(),
        title: lesson.title.clone(),
        description: lesson.description.clone(),
        lesson_type: lesson.lesson_type,
        duration: lesson.duration,
        order: lesson.position,
        is_published: lesson.is_published,
        is_unlocked,
        completed: progress.is_some_and(|p| p.completed),
        score: progress.and_then(|p| p.score),
    }
}

pub struct CourseDetailService;

impl CourseDetailService {
    /// Course with ordered modules and lessons.
    ///
    /// Learners must be enrolled and only see published lessons. Staff see
    /// every lesson, all unlocked.
    pub async fn course_detail(
        db: &DatabaseConnection,
        viewer: &Viewer,
        course_id: &str,
    ) -> EngineResult<CourseDetail> {
        let course = find_course(db, course_id).await?;
        let is_staff = viewer.is_staff_for(&course);
        let enrollment_row = enrollment::Model::find_for(db, &viewer.user_id, course_id).await?;
        if !is_staff && enrollment_row.is_none() {
            return Err(EngineError::forbidden("You are not enrolled in this course"));
        }

        let mut by_module: HashMap<String, Vec<lesson::Model>> = HashMap::new();
        for lesson in lesson::Model::for_course(db, course_id).await? {
            if is_staff || lesson.is_published {
                by_module.entry(lesson.module_id.clone()).or_default().push(lesson);
            }
        }
        let lesson_ids: Vec<String> = by_module.values().flatten().map(|l| l.id.clone()).collect();
        let progress = lesson_progress::Model::map_for_lessons(db, &viewer.user_id, &lesson_ids).await?;
        let completed = completed_ids(&progress);

        let modules = module::Model::for_course(db, course_id)
            .await?
            .into_iter()
            .map(|m| {
                let lessons = by_module.remove(&m.id).unwrap_or_default();
                let unlocks: HashMap<String, bool> = evaluate_unlocks(&lessons, &completed)
                    .into_iter()
                    .map(|u| (u.lesson_id, u.is_unlocked))
                    .collect();
                let mut summaries: Vec<LessonSummary> = lessons
                    .iter()
                    .map(|l| {
                        let unlocked = is_staff || unlocks.get(&l.id).copied().unwrap_or(false);
                        summarize(l, unlocked, progress.get(&l.id))
                    })
                    .collect();
                summaries.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
                ModuleDetail {
                    id: m.id,
                    title: m.title,
                    description: m.description,
                    order: m.position,
                    version: m.version,
                    lessons: summaries,
                }
            })
            .collect();

        let tags = course.tag_list();
        Ok(CourseDetail {
            id: course.id,
            title: course.title,
            description: course.description,
            duration: course.duration,
            level: course.level,
            tags,
            teacher_id: course.teacher_id,
            version: course.version,
            is_staff,
            is_enrolled: enrollment_row.is_some(),
            progress: enrollment_row.map(|e| e.progress),
            modules,
        })
    }

    /// A single lesson with its content, guarded by the unlock rule for learners.
    pub async fn lesson_detail(
        db: &DatabaseConnection,
        viewer: &Viewer,
        lesson_id: &str,
    ) -> EngineResult<LessonDetail> {
        let access = open_lesson(db, viewer, lesson_id, false).await?;
        let lesson = &access.ctx.lesson;
        let progress = lesson_progress::Model::find_for(db, &viewer.user_id, lesson_id).await?;

        let content = if lesson.is_quiz() {
            let quiz = lesson.quiz()?;
            if access.is_staff {
                serde_json::to_value(&quiz)?
            } else {
                serde_json::to_value(quiz.learner_view())?
            }
        } else {
            Value::String(lesson.content.clone())
        };

        Ok(LessonDetail {
            summary: summarize(lesson, true, progress.as_ref()),
            module_id: access.ctx.module.id.clone(),
            course_id: access.ctx.course.id.clone(),
            content,
            time_spent: progress.as_ref().map(|p| p.time_spent),
            completed_at: progress.as_ref().and_then(|p| p.completed_at),
        })
    }

    /// Quiz questions without correctness flags.
    pub async fn quiz_for_learner(
        db: &DatabaseConnection,
        viewer: &Viewer,
        lesson_id: &str,
    ) -> EngineResult<LearnerQuiz> {
        let access = open_lesson(db, viewer, lesson_id, false).await?;
        if !access.ctx.lesson.is_quiz() {
            return Err(EngineError::validation("Lesson is not a quiz"));
        }
        Ok(access.ctx.lesson.quiz()?.learner_view())
    }

    /// The full answer key. Course staff only.
    pub async fn quiz_key(
        db: &DatabaseConnection,
        viewer: &Viewer,
        lesson_id: &str,
    ) -> EngineResult<QuizPayload> {
        let ctx = lesson_context(db, lesson_id).await?;
        require_staff(viewer, &ctx.course)?;
        if !ctx.lesson.is_quiz() {
            return Err(EngineError::validation("Lesson is not a quiz"));
        }
        Ok(ctx.lesson.quiz()?)
    }
}
