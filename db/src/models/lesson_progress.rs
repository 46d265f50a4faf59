use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, PaginatorTrait, Set};
use serde::Serialize;
use std::collections::HashMap;

/// Per-user, per-lesson completion record.
///
/// `completed` only ever moves from `false` to `true`. Nothing in this module
/// writes `false` to an existing row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "lesson_progress")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub lesson_id: String,
    pub completed: bool,
    pub score: Option<i32>,
    /// Seconds spent on the lesson, as last reported.
    pub time_spent: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lesson::Entity",
        from = "Column::LessonId",
        to = "super::lesson::Column::Id"
    )]
    Lesson,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lesson.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_for<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        lesson_id: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::LessonId.eq(lesson_id))
            .one(db)
            .await
    }

    /// Progress rows for one user over a set of lessons, keyed by lesson id.
    pub async fn map_for_lessons<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        lesson_ids: &[String],
    ) -> Result<HashMap<String, Model>, DbErr> {
        if lesson_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::LessonId.is_in(lesson_ids.iter().cloned()))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|r| (r.lesson_id.clone(), r)).collect())
    }

    pub async fn count_completed<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        lesson_ids: &[String],
    ) -> Result<u64, DbErr> {
        if lesson_ids.is_empty() {
            return Ok(0);
        }
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::LessonId.is_in(lesson_ids.iter().cloned()))
            .filter(Column::Completed.eq(true))
            .count(db)
            .await
    }

    /// Inserts a new, not yet completed record.
    pub async fn insert_attempt<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        lesson_id: &str,
        score: Option<i32>,
        time_spent: i64,
    ) -> Result<Model, DbErr> {
        let active = ActiveModel {
            id: Set(crate::new_id()),
            user_id: Set(user_id.to_owned()),
            lesson_id: Set(lesson_id.to_owned()),
            completed: Set(false),
            score: Set(score),
            time_spent: Set(time_spent),
            completed_at: Set(None),
            updated_at: Set(Utc::now()),
        };
        active.insert(db).await
    }

    /// Overwrites the latest attempt data. Leaves `completed` untouched.
    pub async fn update_attempt<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        lesson_id: &str,
        score: Option<i32>,
        time_spent: i64,
    ) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Score, Expr::value(score))
            .col_expr(Column::TimeSpent, Expr::value(time_spent))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::LessonId.eq(lesson_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Flips `completed` to `true` if it is not already.
    ///
    /// Returns `true` only for the write that performed the transition.
    pub async fn mark_completed<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        lesson_id: &str,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Completed, Expr::value(true))
            .col_expr(Column::CompletedAt, Expr::value(Some(Utc::now())))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::LessonId.eq(lesson_id))
            .filter(Column::Completed.eq(false))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }
}
