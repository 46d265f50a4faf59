use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, QueryOrder, Set};
use serde::Serialize;

/// One row per (user, course) pair in the enrollment ledger.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub enrolled_at: DateTime<Utc>,
    /// Cached completion percentage (0 to 100). Recomputed on demand.
    #[sea_orm(column_type = "Double")]
    pub progress: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_for<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::CourseId.eq(course_id))
            .one(db)
            .await
    }

    pub async fn is_enrolled<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        course_id: &str,
    ) -> Result<bool, DbErr> {
        Ok(Self::find_for(db, user_id, course_id).await?.is_some())
    }

    /// Inserts a fresh enrollment with zero progress.
    ///
    /// Fails with a unique-constraint violation if the pair already exists.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        course_id: &str,
    ) -> Result<Model, DbErr> {
        let active = ActiveModel {
            id: Set(crate::new_id()),
            user_id: Set(user_id.to_owned()),
            course_id: Set(course_id.to_owned()),
            enrolled_at: Set(Utc::now()),
            progress: Set(0.0),
        };
        active.insert(db).await
    }

    pub async fn list_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_asc(Column::EnrolledAt)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn set_progress<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        course_id: &str,
        progress: f64,
    ) -> Result<(), DbErr> {
        Entity::update_many()
            .col_expr(Column::Progress, Expr::value(progress))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::CourseId.eq(course_id))
            .exec(db)
            .await?;
        Ok(())
    }
}
