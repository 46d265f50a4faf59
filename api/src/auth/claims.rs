use db::models::user::UserRole;
use serde::{Deserialize, Serialize};
use services::Viewer;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Stable user id issued by the identity service.
    pub sub: String,
    pub exp: usize,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::new(self.0.sub.clone(), self.0.role)
    }
}
