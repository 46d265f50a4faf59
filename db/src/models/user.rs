use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Mirror of an identity issued by the external authentication service.
///
/// The engine never authenticates users itself; it keeps this row so ownership
/// and enrollment foreign keys resolve.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Opaque identifier, identical to the JWT `sub` claim.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Platform-wide role carried in the JWT.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UserRole {
    #[sea_orm(string_value = "student")]
    Student,

    #[sea_orm(string_value = "instructor")]
    Instructor,

    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        id: &str,
        username: &str,
        email: Option<&str>,
        role: UserRole,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let active = ActiveModel {
            id: Set(id.to_owned()),
            username: Set(username.to_owned()),
            email: Set(email.map(str::to_owned)),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active.insert(db).await
    }

    /// Makes sure a mirror row exists for an authenticated identity and that
    /// its role matches the token. Username falls back to the id.
    pub async fn sync<C: ConnectionTrait>(
        db: &C,
        id: &str,
        username: Option<&str>,
        email: Option<&str>,
        role: UserRole,
    ) -> Result<Model, DbErr> {
        match Entity::find_by_id(id.to_owned()).one(db).await? {
            Some(existing) if existing.role == role => Ok(existing),
            Some(existing) => {
                let mut active: ActiveModel = existing.into();
                active.role = Set(role);
                active.updated_at = Set(Utc::now());
                active.update(db).await
            }
            None => Self::create(db, id, username.unwrap_or(id), email, role).await,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
