use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, DbErr, PaginatorTrait, QueryOrder};
use serde::Serialize;

/// A course module: an ordered group of lessons inside a course.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "modules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    /// 1-based position within the course.
    pub position: i32,
    /// Bumped on every lesson reorder in this module.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,

    #[sea_orm(has_many = "super::lesson::Entity")]
    Lessons,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lessons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// All modules of a course in display order. Ties (which only a broken
    /// write could produce) fall back to id so the result is deterministic.
    pub async fn for_course<C: ConnectionTrait>(
        db: &C,
        course_id: &str,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::Position)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Position a newly created module should take (append).
    pub async fn next_position<C: ConnectionTrait>(db: &C, course_id: &str) -> Result<i32, DbErr> {
        let siblings = Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .count(db)
            .await?;
        Ok(siblings as i32 + 1)
    }

    /// Writes one module's position. Returns `false` if the row is gone or
    /// belongs to another course.
    pub async fn set_position<C: ConnectionTrait>(
        db: &C,
        course_id: &str,
        module_id: &str,
        position: i32,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Position, Expr::value(position))
            .filter(Column::Id.eq(module_id))
            .filter(Column::CourseId.eq(course_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Moves the version from `expected` to `expected + 1`.
    ///
    /// Returns `false` when another writer already moved it.
    pub async fn bump_version<C: ConnectionTrait>(
        db: &C,
        id: &str,
        expected: i64,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Version, Expr::value(expected + 1))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::Version.eq(expected))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Adds one to the version in SQL, so concurrent bumps never collapse
    /// onto the same number. Returns `false` if the row is gone.
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
