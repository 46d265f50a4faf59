//! Enrollment ledger and course progress aggregation.

use chrono::{DateTime, Utc};
use db::models::{course, enrollment, lesson, lesson_progress};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, SqlErr};
use serde::Serialize;
use tracing::info;

use crate::access::{find_course, require_enrollment, Viewer};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollOutcome {
    Created,
    AlreadyEnrolled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseProgress {
    pub course_id: String,
    pub progress: f64,
    pub completed_lessons: u64,
    pub total_lessons: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentSummary {
    pub enrollment_id: String,
    pub course_id: String,
    pub course_title: String,
    pub enrolled_at: DateTime<Utc>,
    pub progress: f64,
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Completion percentage over a course's published lessons.
fn percentage(completed: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

pub struct EnrollmentService;

impl EnrollmentService {
    /// Enrolls a user. Enrolling twice is not an error: the existing row is
    /// returned with [`EnrollOutcome::AlreadyEnrolled`].
    pub async fn enroll(
        db: &DatabaseConnection,
        user_id: &str,
        course_id: &str,
    ) -> EngineResult<(enrollment::Model, EnrollOutcome)> {
        find_course(db, course_id).await?;

        if let Some(existing) = enrollment::Model::find_for(db, user_id, course_id).await? {
            return Ok((existing, EnrollOutcome::AlreadyEnrolled));
        }

        match enrollment::Model::create(db, user_id, course_id).await {
            Ok(_) => {
                // Progress rows survive an unenroll, so a returning learner
                // starts from what they already completed.
                Self::compute_course_progress(db, user_id, course_id).await?;
                let created = enrollment::Model::find_for(db, user_id, course_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Enrollment not found"))?;
                info!(user_id, course_id, progress = created.progress, "Enrolled");
                Ok((created, EnrollOutcome::Created))
            }
            Err(err) if is_unique_violation(&err) => {
                let existing = enrollment::Model::find_for(db, user_id, course_id)
                    .await?
                    .ok_or_else(|| EngineError::Database(err))?;
                Ok((existing, EnrollOutcome::AlreadyEnrolled))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn unenroll(db: &DatabaseConnection, user_id: &str, course_id: &str) -> EngineResult<()> {
        let existing = enrollment::Model::find_for(db, user_id, course_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Enrollment not found"))?;
        enrollment::Entity::delete_by_id(existing.id).exec(db).await?;
        info!(user_id, course_id, "Unenrolled");
        Ok(())
    }

    /// Recomputes a learner's progress in a course and caches it on the
    /// enrollment row (if there is one).
    pub async fn compute_course_progress<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        course_id: &str,
    ) -> EngineResult<f64> {
        Ok(Self::progress_breakdown(db, user_id, course_id).await?.progress)
    }

    async fn progress_breakdown<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        course_id: &str,
    ) -> EngineResult<CourseProgress> {
        let published: Vec<String> = lesson::Model::for_course(db, course_id)
            .await?
            .into_iter()
            .filter(|l| l.is_published)
            .map(|l| l.id)
            .collect();
        let completed = lesson_progress::Model::count_completed(db, user_id, &published).await?;
        let total = published.len() as u64;
        let progress = percentage(completed, total);

        enrollment::Model::set_progress(db, user_id, course_id, progress).await?;

        Ok(CourseProgress {
            course_id: course_id.to_owned(),
            progress,
            completed_lessons: completed,
            total_lessons: total,
        })
    }

    /// Progress of the viewer in one course. Requires an enrollment.
    pub async fn course_progress(
        db: &DatabaseConnection,
        viewer: &Viewer,
        course_id: &str,
    ) -> EngineResult<CourseProgress> {
        find_course(db, course_id).await?;
        require_enrollment(db, viewer, course_id).await?;
        Self::progress_breakdown(db, &viewer.user_id, course_id).await
    }

    /// A learner's enrollments with freshly computed progress.
    pub async fn list_for_user(
        db: &DatabaseConnection,
        user_id: &str,
    ) -> EngineResult<Vec<EnrollmentSummary>> {
        let enrollments = enrollment::Model::list_for_user(db, user_id).await?;
        let mut summaries = Vec::with_capacity(enrollments.len());
        for row in enrollments {
            let Some(course) = course::Entity::find_by_id(row.course_id.clone()).one(db).await? else {
                continue;
            };
            let progress = Self::compute_course_progress(db, user_id, &course.id).await?;
            summaries.push(EnrollmentSummary {
                enrollment_id: row.id,
                course_id: course.id,
                course_title: course.title,
                enrolled_at: row.enrolled_at,
                progress,
            });
        }
        Ok(summaries)
    }
}
