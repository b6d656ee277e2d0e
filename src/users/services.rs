use tracing::{info, warn};

use crate::error::AppError;
use crate::state::AppState;
use crate::users::dto::{CreateUserRequest, Pagination, UpdateUserRequest, User};
use crate::users::repo_types::UserRecord;

fn parse_id(id: &str) -> Result<i64, AppError> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidId(id.to_string()))
}

async fn load(st: &AppState, id: &str) -> Result<UserRecord, AppError> {
    let key = parse_id(id)?;
    match st.users.find_by_id(key).await? {
        Some(record) => Ok(record),
        None => {
            warn!(user_id = %id, "user not found");
            Err(AppError::user_not_found(id))
        }
    }
}

/// All users when either bound is missing, otherwise one zero-based page.
pub async fn get_all_users(st: &AppState, p: Pagination) -> Result<Vec<User>, AppError> {
    let records = match (p.page, p.size) {
        (Some(page), Some(size)) => {
            if page < 0 {
                return Err(AppError::Validation("page must not be negative".into()));
            }
            if size < 1 {
                return Err(AppError::Validation("size must be greater than zero".into()));
            }
            if page.checked_mul(size).is_none() {
                return Err(AppError::Validation("page is out of range".into()));
            }
            st.users.find_all_paged(page, size).await?
        }
        _ => st.users.find_all().await?,
    };
    Ok(records.into_iter().map(User::from).collect())
}

pub async fn get_user_by_id(st: &AppState, id: &str) -> Result<User, AppError> {
    load(st, id).await.map(User::from)
}

pub async fn create_user(st: &AppState, req: CreateUserRequest) -> Result<User, AppError> {
    let saved = st.users.save(UserRecord::from(req)).await?;
    let user = User::from(saved);
    info!(user_id = %user.id, "user created");
    Ok(user)
}

pub async fn update_user(
    st: &AppState,
    id: &str,
    req: UpdateUserRequest,
) -> Result<User, AppError> {
    let mut record = load(st, id).await?;
    record.overwrite(req);
    let user = User::from(st.users.save(record).await?);
    info!(user_id = %user.id, "user updated");
    Ok(user)
}

/// Removes the user and hands back its last stored state.
pub async fn delete_user(st: &AppState, id: &str) -> Result<User, AppError> {
    let record = load(st, id).await?;
    st.users.delete(&record).await?;
    info!(user_id = %id, "user deleted");
    Ok(User::from(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_req(n: u32) -> CreateUserRequest {
        CreateUserRequest {
            email: format!("user{}@test.com", n),
            name: format!("User{}", n),
            password: "password".into(),
            username: format!("username{}", n),
        }
    }

    async fn seeded(count: u32) -> AppState {
        let st = AppState::in_memory();
        for n in 1..=count {
            create_user(&st, create_req(n)).await.unwrap();
        }
        st
    }

    fn expect_not_found(err: AppError, id: &str) {
        match err {
            AppError::NotFound(msg) => assert_eq!(msg, format!("No user found with id: {}", id)),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_returns_request_fields_and_numeric_id() {
        let st = AppState::in_memory();
        let user = create_user(&st, create_req(1)).await.unwrap();
        assert!(!user.id.is_empty());
        assert!(user.id.parse::<i64>().is_ok());
        assert_eq!(user.email, "user1@test.com");
        assert_eq!(user.name, "User1");
        assert_eq!(user.password, "password");
        assert_eq!(user.username, "username1");
    }

    #[tokio::test]
    async fn create_and_update_take_free_form_email() {
        let st = AppState::in_memory();
        let mut req = create_req(1);
        req.email = "admin".into();
        let created = create_user(&st, req).await.unwrap();
        assert_eq!(created.email, "admin");

        let update = UpdateUserRequest {
            email: "root".into(),
            name: "Root".into(),
            password: "p".into(),
            username: "root".into(),
        };
        let updated = update_user(&st, &created.id, update).await.unwrap();
        assert_eq!(updated.email, "root");
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let st = seeded(1).await;
        expect_not_found(get_user_by_id(&st, "99").await.unwrap_err(), "99");

        let update = UpdateUserRequest {
            email: "x@y.com".into(),
            name: "X".into(),
            password: "p".into(),
            username: "x".into(),
        };
        expect_not_found(update_user(&st, "99", update).await.unwrap_err(), "99");
        expect_not_found(delete_user(&st, "99").await.unwrap_err(), "99");
    }

    #[tokio::test]
    async fn non_numeric_id_is_invalid() {
        let st = seeded(1).await;
        let err = get_user_by_id(&st, "abc").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidId(ref raw) if raw == "abc"));
    }

    #[tokio::test]
    async fn update_overwrites_every_field() {
        let st = seeded(1).await;
        let update = UpdateUserRequest {
            email: "new@test.com".into(),
            name: String::new(),
            password: "changed".into(),
            username: "renamed".into(),
        };
        let updated = update_user(&st, "1", update).await.unwrap();
        let fetched = get_user_by_id(&st, "1").await.unwrap();

        assert_eq!(updated, fetched);
        assert_eq!(fetched.id, "1");
        assert_eq!(fetched.email, "new@test.com");
        assert_eq!(fetched.name, "");
        assert_eq!(fetched.password, "changed");
        assert_eq!(fetched.username, "renamed");
    }

    #[tokio::test]
    async fn delete_returns_last_state_and_removes() {
        let st = seeded(2).await;
        let deleted = delete_user(&st, "2").await.unwrap();
        assert_eq!(deleted.id, "2");
        assert_eq!(deleted.email, "user2@test.com");
        expect_not_found(get_user_by_id(&st, "2").await.unwrap_err(), "2");
    }

    #[tokio::test]
    async fn list_without_both_bounds_returns_everything() {
        let st = seeded(8).await;
        let all = get_all_users(&st, Pagination::default()).await.unwrap();
        assert_eq!(all.len(), 8);

        let only_page = Pagination { page: Some(1), size: None };
        assert_eq!(get_all_users(&st, only_page).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn list_pages_by_ascending_id() {
        let st = seeded(8).await;
        let page = get_all_users(&st, Pagination { page: Some(1), size: Some(3) })
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "5", "6"]);

        let last = get_all_users(&st, Pagination { page: Some(2), size: Some(3) })
            .await
            .unwrap();
        assert_eq!(last.len(), 2);
    }

    #[tokio::test]
    async fn list_rejects_out_of_range_bounds() {
        let st = seeded(1).await;
        let negative = Pagination { page: Some(-1), size: Some(3) };
        assert!(matches!(
            get_all_users(&st, negative).await.unwrap_err(),
            AppError::Validation(_)
        ));
        let empty = Pagination { page: Some(0), size: Some(0) };
        assert!(matches!(
            get_all_users(&st, empty).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
