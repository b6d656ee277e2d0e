use serde::{Deserialize, Deserializer, Serialize};

use crate::users::repo_types::UserRecord;

/// Public view of a user. `id` is the decimal form of the row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub username: String,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id.map(|id| id.to_string()).unwrap_or_default(),
            email: r.email,
            name: r.name,
            password: r.password,
            username: r.username,
        }
    }
}

/// Request body for `PUT /users`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub username: String,
}

/// Request body for `POST /users/:id`. Every field replaces the stored one.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub username: String,
}

/// `?page=&size=` binds to absent rather than failing.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub size: Option<i64>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
