use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, DbErr, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A course offered on the platform. Owns an ordered list of modules.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub description: String,
    /// Expected duration in minutes.
    pub duration: i32,
    pub level: CourseLevel,
    /// JSON array of tag strings, kept sorted and deduplicated.
    pub tags: Json,
    /// Owning instructor (or admin).
    pub teacher_id: String,
    /// Bumped on every module reorder; used as the compare-and-swap token.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "course_level_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CourseLevel {
    #[sea_orm(string_value = "beginner")]
    Beginner,

    #[sea_orm(string_value = "intermediate")]
    Intermediate,

    #[sea_orm(string_value = "advanced")]
    Advanced,

    #[sea_orm(string_value = "expert")]
    Expert,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,

    #[sea_orm(has_many = "super::module::Entity")]
    Modules,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Modules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decodes the stored tag array. Non-string entries are skipped.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Normalizes a tag set for storage: trimmed, non-empty, sorted, unique.
    pub fn tags_to_json(tags: &[String]) -> Json {
        let mut cleaned: Vec<String> = tags
            .iter()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect();
        cleaned.sort();
        cleaned.dedup();
        Json::from(cleaned)
    }

    pub async fn all_by_title<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>, DbErr> {
        Entity::find().order_by_asc(Column::Title).all(db).await
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
