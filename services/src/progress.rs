//! Progress tracker: records attempts and completions per user and lesson.
//!
//! Writes go through [`ProgressService::upsert`]. It inserts the row if it is
//! missing (falling back to an update when a concurrent insert won), always
//! overwrites the latest score and time spent, and flips `completed` with a
//! separate conditional update so completion can never be undone.

use std::collections::HashMap;

use db::models::lesson_progress;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::access::{learner_lessons, open_lesson, LessonAccess, Viewer};
use crate::enrollment::{is_unique_violation, EnrollmentService};
use crate::error::{EngineError, EngineResult};
use crate::grader::{grade, GradeResult, PASS_THRESHOLD};
use crate::unlock::{evaluate_unlocks, LessonUnlock};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProgressInput {
    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    #[validate(range(min = 0, message = "Time spent cannot be negative"))]
    pub time_spent: i64,

    #[validate(range(min = 0, max = 100, message = "Score must be between 0 and 100"))]
    pub score: Option<i32>,
}

impl ProgressInput {
    pub fn completed(time_spent: i64) -> Self {
        Self {
            completed: true,
            time_spent,
            score: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuizSubmission {
    /// Question id to the selected answer id (or its exact text).
    #[serde(default)]
    pub answers: HashMap<String, String>,

    #[serde(default)]
    #[validate(range(min = 0, message = "Time spent cannot be negative"))]
    pub time_spent: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub progress: lesson_progress::Model,
    /// True only for the write that moved the lesson to completed.
    pub newly_completed: bool,
    pub course_progress: f64,
    /// Unlock state of the lesson's module after this write.
    pub unlocks: Vec<LessonUnlock>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizReport {
    pub grade: GradeResult,
    #[serde(flatten)]
    pub report: ProgressReport,
}

pub struct ProgressService;

impl ProgressService {
    /// Records a lesson attempt for the viewer.
    ///
    /// For QUIZ lessons a completion needs a score and only sticks when the
    /// score reaches the pass threshold; below it the attempt is kept without
    /// completing the lesson. Scores sent for other lessons are dropped.
    pub async fn record_progress(
        db: &DatabaseConnection,
        viewer: &Viewer,
        lesson_id: &str,
        input: ProgressInput,
    ) -> EngineResult<ProgressReport> {
        input.validate()?;
        let access = open_lesson(db, viewer, lesson_id, true).await?;

        let (score, complete) = if access.ctx.lesson.is_quiz() {
            match (input.completed, input.score) {
                (true, None) => {
                    return Err(EngineError::validation(
                        "A score is required to complete a quiz lesson",
                    ));
                }
                (true, Some(score)) => (Some(score), score >= PASS_THRESHOLD),
                (false, score) => (score, false),
            }
        } else {
            (None, input.completed)
        };

        Self::upsert(db, viewer, &access, score, input.time_spent, complete).await
    }

    /// Grades a quiz attempt and records it. Retries are unlimited; each one is
    /// graded from scratch and overwrites the latest score.
    pub async fn submit_quiz(
        db: &DatabaseConnection,
        viewer: &Viewer,
        lesson_id: &str,
        submission: QuizSubmission,
    ) -> EngineResult<QuizReport> {
        submission.validate()?;
        let access = open_lesson(db, viewer, lesson_id, true).await?;
        if !access.ctx.lesson.is_quiz() {
            return Err(EngineError::validation("Lesson is not a quiz"));
        }

        let quiz = access.ctx.lesson.quiz()?;
        let result = grade(&quiz.ordered_questions(), &submission.answers)?;
        info!(
            user_id = %viewer.user_id,
            lesson_id,
            score = result.score,
            passed = result.passed,
            "Quiz graded"
        );

        let report = Self::upsert(
            db,
            viewer,
            &access,
            Some(result.score),
            submission.time_spent,
            result.passed,
        )
        .await?;

        Ok(QuizReport {
            grade: result,
            report,
        })
    }

    async fn upsert(
        db: &DatabaseConnection,
        viewer: &Viewer,
        access: &LessonAccess,
        score: Option<i32>,
        time_spent: i64,
        complete: bool,
    ) -> EngineResult<ProgressReport> {
        let user_id = viewer.user_id.as_str();
        let lesson_id = access.ctx.lesson.id.as_str();

        if lesson_progress::Model::find_for(db, user_id, lesson_id).await?.is_some() {
            lesson_progress::Model::update_attempt(db, user_id, lesson_id, score, time_spent).await?;
        } else {
            match lesson_progress::Model::insert_attempt(db, user_id, lesson_id, score, time_spent).await {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => {
                    lesson_progress::Model::update_attempt(db, user_id, lesson_id, score, time_spent)
                        .await?;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let newly_completed = complete
            && lesson_progress::Model::mark_completed(db, user_id, lesson_id).await?;
        if newly_completed {
            info!(user_id, lesson_id, "Lesson completed");
        }

        let progress = lesson_progress::Model::find_for(db, user_id, lesson_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Progress record not found"))?;
        let course_progress =
            EnrollmentService::compute_course_progress(db, user_id, &access.ctx.course.id).await?;
        let (lessons, completed) = learner_lessons(db, user_id, &access.ctx.module.id).await?;

        Ok(ProgressReport {
            progress,
            newly_completed,
            course_progress,
            unlocks: evaluate_unlocks(&lessons, &completed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course_detail::CourseDetailService;
    use crate::enrollment::EnrollmentService;
    use crate::fixtures;
    use db::models::user::UserRole;
    use db::test_utils::setup_test_db;

    fn all_right(quiz_lesson: &db::models::lesson::Model) -> HashMap<String, String> {
        let quiz = quiz_lesson.quiz().unwrap();
        quiz.questions
            .iter()
            .map(|q| (q.id.clone(), q.correct_answer().unwrap().id.clone()))
            .collect()
    }

    fn right_count(quiz_lesson: &db::models::lesson::Model, right: usize) -> HashMap<String, String> {
        let quiz = quiz_lesson.quiz().unwrap();
        quiz.ordered_questions()
            .into_iter()
            .enumerate()
            .map(|(i, q)| {
                let pick = q
                    .answers
                    .iter()
                    .find(|a| a.is_correct == (i < right))
                    .unwrap();
                (q.id.clone(), pick.id.clone())
            })
            .collect()
    }

    #[tokio::test]
    async fn completion_is_sticky_across_failed_retries() {
        let db = setup_test_db().await;
        let teacher = fixtures::user(&db, "t1", UserRole::Instructor).await;
        let student = fixtures::user(&db, "s1", UserRole::Student).await;
        let course = fixtures::course(&db, &teacher, "Rust").await;
        let module = fixtures::module(&db, &teacher, &course.id, "One").await;
        let quiz = fixtures::quiz_lesson(&db, &teacher, &module.id, "Quiz", 4).await;
        EnrollmentService::enroll(&db, &student.user_id, &course.id).await.unwrap();

        let pass = ProgressService::submit_quiz(
            &db,
            &student,
            &quiz.id,
            QuizSubmission {
                answers: all_right(&quiz),
                time_spent: 60,
            },
        )
        .await
        .unwrap();
        assert!(pass.grade.passed);
        assert!(pass.report.newly_completed);

        let retry = ProgressService::submit_quiz(
            &db,
            &student,
            &quiz.id,
            QuizSubmission {
                answers: right_count(&quiz, 1),
                time_spent: 90,
            },
        )
        .await
        .unwrap();
        assert_eq!(retry.grade.score, 25);
        assert!(!retry.report.newly_completed);
        assert!(retry.report.progress.completed);
        assert_eq!(retry.report.progress.score, Some(25));
        assert_eq!(retry.report.progress.time_spent, 90);

        let not_done = ProgressService::record_progress(
            &db,
            &student,
            &quiz.id,
            ProgressInput {
                completed: false,
                time_spent: 5,
                score: None,
            },
        )
        .await
        .unwrap();
        assert!(not_done.progress.completed);
    }

    #[tokio::test]
    async fn quiz_completion_needs_a_passing_score() {
        let db = setup_test_db().await;
        let teacher = fixtures::user(&db, "t1", UserRole::Instructor).await;
        let student = fixtures::user(&db, "s1", UserRole::Student).await;
        let course = fixtures::course(&db, &teacher, "Rust").await;
        let module = fixtures::module(&db, &teacher, &course.id, "One").await;
        let quiz = fixtures::quiz_lesson(&db, &teacher, &module.id, "Quiz", 2).await;
        EnrollmentService::enroll(&db, &student.user_id, &course.id).await.unwrap();

        let err = ProgressService::record_progress(&db, &student, &quiz.id, ProgressInput::completed(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let low = ProgressService::record_progress(
            &db,
            &student,
            &quiz.id,
            ProgressInput {
                completed: true,
                time_spent: 1,
                score: Some(84),
            },
        )
        .await
        .unwrap();
        assert!(!low.progress.completed);
        assert_eq!(low.progress.score, Some(84));

        let high = ProgressService::record_progress(
            &db,
            &student,
            &quiz.id,
            ProgressInput {
                completed: true,
                time_spent: 1,
                score: Some(85),
            },
        )
        .await
        .unwrap();
        assert!(high.progress.completed);
        assert!(high.progress.completed_at.is_some());
    }

    #[tokio::test]
    async fn non_quiz_scores_are_dropped() {
        let db = setup_test_db().await;
        let teacher = fixtures::user(&db, "t1", UserRole::Instructor).await;
        let student = fixtures::user(&db, "s1", UserRole::Student).await;
        let course = fixtures::course(&db, &teacher, "Rust").await;
        let module = fixtures::module(&db, &teacher, &course.id, "One").await;
        let lesson = fixtures::text_lesson(&db, &teacher, &module.id, "A", true).await;
        EnrollmentService::enroll(&db, &student.user_id, &course.id).await.unwrap();

        let report = ProgressService::record_progress(
            &db,
            &student,
            &lesson.id,
            ProgressInput {
                completed: true,
                time_spent: 12,
                score: Some(40),
            },
        )
        .await
        .unwrap();
        assert!(report.progress.completed);
        assert_eq!(report.progress.score, None);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_writing() {
        let db = setup_test_db().await;
        let teacher = fixtures::user(&db, "t1", UserRole::Instructor).await;
        let student = fixtures::user(&db, "s1", UserRole::Student).await;
        let course = fixtures::course(&db, &teacher, "Rust").await;
        let module = fixtures::module(&db, &teacher, &course.id, "One").await;
        let lesson = fixtures::text_lesson(&db, &teacher, &module.id, "A", true).await;
        EnrollmentService::enroll(&db, &student.user_id, &course.id).await.unwrap();

        let err = ProgressService::record_progress(
            &db,
            &student,
            &lesson.id,
            ProgressInput {
                completed: false,
                time_spent: -1,
                score: Some(101),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(lesson_progress::Model::find_for(&db, &student.user_id, &lesson.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn locked_and_unenrolled_writes_are_forbidden() {
        let db = setup_test_db().await;
        let teacher = fixtures::user(&db, "t1", UserRole::Instructor).await;
        let student = fixtures::user(&db, "s1", UserRole::Student).await;
        let course = fixtures::course(&db, &teacher, "Rust").await;
        let module = fixtures::module(&db, &teacher, &course.id, "One").await;
        let first = fixtures::text_lesson(&db, &teacher, &module.id, "A", true).await;
        let second = fixtures::text_lesson(&db, &teacher, &module.id, "B", true).await;

        let err = ProgressService::record_progress(&db, &student, &first.id, ProgressInput::completed(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));

        EnrollmentService::enroll(&db, &student.user_id, &course.id).await.unwrap();
        let err = ProgressService::record_progress(&db, &student, &second.id, ProgressInput::completed(1))
            .await
            .unwrap_err();
        match err {
            EngineError::Forbidden(msg) => assert_eq!(msg, "Lesson is locked"),
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unpublished_lessons_are_invisible_and_never_gate() {
        let db = setup_test_db().await;
        let teacher = fixtures::user(&db, "t1", UserRole::Instructor).await;
        let student = fixtures::user(&db, "s1", UserRole::Student).await;
        let course = fixtures::course(&db, &teacher, "Rust").await;
        let module = fixtures::module(&db, &teacher, &course.id, "One").await;
        let draft = fixtures::text_lesson(&db, &teacher, &module.id, "Draft", false).await;
        let live = fixtures::text_lesson(&db, &teacher, &module.id, "Live", true).await;
        EnrollmentService::enroll(&db, &student.user_id, &course.id).await.unwrap();

        let err = ProgressService::record_progress(&db, &student, &draft.id, ProgressInput::completed(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));

        // The draft sits at position 1 but learners never see it, so the
        // published lesson is first for them.
        let report = ProgressService::record_progress(&db, &student, &live.id, ProgressInput::completed(1))
            .await
            .unwrap();
        assert!(report.progress.completed);
        assert_eq!(report.course_progress, 100.0);
    }

    /// Intro module, L1 (text) then L2 (quiz): enroll, finish L1, fail L2, pass L2.
    #[tokio::test]
    async fn intro_module_walkthrough() {
        let db = setup_test_db().await;
        let teacher = fixtures::user(&db, "t1", UserRole::Instructor).await;
        let student = fixtures::user(&db, "s1", UserRole::Student).await;
        let course = fixtures::course(&db, &teacher, "Rust").await;
        let intro = fixtures::module(&db, &teacher, &course.id, "Intro").await;
        let l1 = fixtures::text_lesson(&db, &teacher, &intro.id, "L1", true).await;
        let l2 = fixtures::quiz_lesson(&db, &teacher, &intro.id, "L2", 4).await;

        let (_, outcome) = EnrollmentService::enroll(&db, &student.user_id, &course.id)
            .await
            .unwrap();
        assert_eq!(outcome, crate::enrollment::EnrollOutcome::Created);

        let detail = CourseDetailService::course_detail(&db, &student, &course.id)
            .await
            .unwrap();
        let lessons = &detail.modules[0].lessons;
        assert!(lessons[0].is_unlocked);
        assert!(!lessons[1].is_unlocked);

        let after_l1 = ProgressService::record_progress(&db, &student, &l1.id, ProgressInput::completed(120))
            .await
            .unwrap();
        assert_eq!(after_l1.course_progress, 50.0);
        assert!(after_l1.unlocks[1].is_unlocked);

        let failed = ProgressService::submit_quiz(
            &db,
            &student,
            &l2.id,
            QuizSubmission {
                answers: right_count(&l2, 3),
                time_spent: 30,
            },
        )
        .await
        .unwrap();
        assert_eq!(failed.grade.score, 75);
        assert!(!failed.grade.passed);
        assert!(!failed.report.progress.completed);
        assert_eq!(failed.report.course_progress, 50.0);

        let passed = ProgressService::submit_quiz(
            &db,
            &student,
            &l2.id,
            QuizSubmission {
                answers: all_right(&l2),
                time_spent: 45,
            },
        )
        .await
        .unwrap();
        assert_eq!(passed.grade.score, 100);
        assert!(passed.report.progress.completed);
        assert_eq!(passed.report.course_progress, 100.0);
    }
}
