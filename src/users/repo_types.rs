use sqlx::FromRow;

use crate::users::dto::{CreateUserRequest, UpdateUserRequest};

/// User row in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRecord {
    pub id: Option<i64>, // assigned by storage on first save
    pub email: String,
    pub name: String,
    pub password: String, // stored as given, see DESIGN.md
    pub username: String,
}

impl UserRecord {
    /// Overwrites every mutable field. Absent values are not merged.
    pub fn overwrite(&mut self, req: UpdateUserRequest) {
        self.email = req.email;
        self.name = req.name;
        self.password = req.password;
        self.username = req.username;
    }
}

impl From<CreateUserRequest> for UserRecord {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            id: None,
            email: req.email,
            name: req.name,
            password: req.password,
            username: req.username,
        }
    }
}
