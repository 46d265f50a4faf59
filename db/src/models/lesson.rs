use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, DbErr, JoinType, PaginatorTrait, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::quiz::{QuizError, QuizPayload};

/// A single unit of course content.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub description: String,
    pub lesson_type: LessonType,
    /// Optional duration in minutes.
    pub duration: Option<i32>,
    /// Opaque rich text, or a serialized [`QuizPayload`] for quiz lessons.
    pub content: String,
    /// 1-based position within the module.
    pub position: i32,
    pub is_published: bool,
    /// Bumped whenever the quiz question order is rewritten or the lesson is edited.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "lesson_type_enum")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LessonType {
    #[sea_orm(string_value = "TEXT")]
    Text,

    #[sea_orm(string_value = "VIDEO")]
    Video,

    #[sea_orm(string_value = "AUDIO")]
    Audio,

    #[sea_orm(string_value = "QUIZ")]
    Quiz,

    #[sea_orm(string_value = "INTERACTIVE")]
    Interactive,

    #[sea_orm(string_value = "ASSIGNMENT")]
    Assignment,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::module::Entity",
        from = "Column::ModuleId",
        to = "super::module::Column::Id"
    )]
    Module,

    #[sea_orm(has_many = "super::lesson_progress::Entity")]
    Progress,
}

impl Related<super::module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Module.def()
    }
}

impl Related<super::lesson_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_quiz(&self) -> bool {
        self.lesson_type == LessonType::Quiz
    }

    /// Decodes the embedded quiz. Fails for non-quiz lessons and corrupt content.
    pub fn quiz(&self) -> Result<QuizPayload, QuizError> {
        if !self.is_quiz() {
            return Err(QuizError::NotAQuiz(self.id.clone()));
        }
        QuizPayload::parse(&self.content)
    }

    /// All lessons of a module in display order, ties broken by id.
    pub async fn for_module<C: ConnectionTrait>(
        db: &C,
        module_id: &str,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ModuleId.eq(module_id))
            .order_by_asc(Column::Position)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Every lesson in a course. Callers bucket them by `module_id`.
    pub async fn for_course<C: ConnectionTrait>(
        db: &C,
        course_id: &str,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .join(JoinType::InnerJoin, Relation::Module.def())
            .filter(super::module::Column::CourseId.eq(course_id))
            .order_by_asc(Column::Position)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Position a newly created lesson should take (append).
    pub async fn next_position<C: ConnectionTrait>(db: &C, module_id: &str) -> Result<i32, DbErr> {
        let siblings = Entity::find()
            .filter(Column::ModuleId.eq(module_id))
            .count(db)
            .await?;
        Ok(siblings as i32 + 1)
    }

    /// Writes one lesson's position. Returns `false` if the row is gone or
    /// belongs to another module.
    pub async fn set_position<C: ConnectionTrait>(
        db: &C,
        module_id: &str,
        lesson_id: &str,
        position: i32,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Position, Expr::value(position))
            .filter(Column::Id.eq(lesson_id))
            .filter(Column::ModuleId.eq(module_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Replaces the stored content and moves the version from `expected` to
    /// `expected + 1` in one conditional statement.
    ///
    /// Returns `false` when another writer already moved the version.
    pub async fn replace_content_versioned<C: ConnectionTrait>(
        db: &C,
        id: &str,
        expected: i64,
        content: String,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Content, Expr::value(content))
            .col_expr(Column::Version, Expr::value(expected + 1))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::Version.eq(expected))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Adds one to the version in SQL. Used by edits that replace content
    /// without holding an expected version. Returns `false` if the row is gone.
    pub async fn increment_version<C: ConnectionTrait>(db: &C, id: &str) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Version, Expr::col(Column::Version).add(1))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }
}
