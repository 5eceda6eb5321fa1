//! HTTP routes.

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use service_base::persistence::{Page, PageRequest};
use service_base::{BusinessException, PathParams, ResultEnvelope, ValidJson, ValidQuery};

use crate::domain::{CreateUserRequest, UpdateUserRequest, User};
use crate::service::UserService;

type ApiResult<T> = Result<ResultEnvelope<T>, BusinessException>;

/// User routes, without the shared layers.
pub fn routes(service: UserService) -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .with_state(service)
}

async fn list_users(State(service): State<UserService>, ValidQuery(page): ValidQuery<PageRequest>) -> ApiResult<Page<User>> {
    Ok(ResultEnvelope::success(service.list(page).await?))
}

async fn create_user(
    State(service): State<UserService>,
    ValidJson(request): ValidJson<CreateUserRequest>,
) -> ApiResult<User> {
    Ok(ResultEnvelope::success_with_message("用户创建成功", service.create(request).await?))
}

async fn get_user(State(service): State<UserService>, PathParams(id): PathParams<u64>) -> ApiResult<User> {
    Ok(ResultEnvelope::success(service.get(id).await?))
}

async fn update_user(
    State(service): State<UserService>,
    PathParams(id): PathParams<u64>,
    ValidJson(request): ValidJson<UpdateUserRequest>,
) -> ApiResult<User> {
    Ok(ResultEnvelope::success(service.update(id, request).await?))
}

async fn delete_user(State(service): State<UserService>, PathParams(id): PathParams<u64>) -> ApiResult<()> {
    service.delete(id).await?;
    Ok(ResultEnvelope::success_empty())
}
