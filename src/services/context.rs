use uuid::Uuid;

use crate::db::enums::UserRole;
use crate::db::models::user::AuthUser;
use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl RequestContext {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin privileges required"))
        }
    }
}

impl From<&AuthUser> for RequestContext {
    fn from(user: &AuthUser) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }
}
