use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::AppError,
    state::AppState,
    users::{
        dto::{CreateUserRequest, Pagination, UpdateUserRequest, User},
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).put(create_user))
        .route(
            "/users/:id",
            get(get_user).post(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, query))]
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    let Query(p) = query?;
    let users = services::get_all_users(&state, p).await?;
    Ok(Json(users))
}

/// PUT /users → 201 with `Location: /users/{id}`
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let user = services::create_user(&state, req).await?;
    let location = format!("/users/{}", user.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(user)))
}

#[instrument(skip(state, path))]
pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let Path(id) = path?;
    Ok(Json(services::get_user_by_id(&state, &id).await?))
}

#[instrument(skip(state, path, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Path(id) = path?;
    let Json(req) = payload?;
    Ok(Json(services::update_user(&state, &id, req).await?))
}

#[instrument(skip(state, path))]
pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let Path(id) = path?;
    Ok(Json(services::delete_user(&state, &id).await?))
}
