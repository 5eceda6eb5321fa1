//! User business rules.
//!
//! Every operation runs under [`service_layer::guard`], so callers only ever
//! see a [`BusinessException`].

use std::sync::Arc;

use service_base::persistence::{AuditFields, Auditable, Page, PageRequest};
use service_base::{BusinessException, ErrorCode, ServiceError, service_layer};
use tracing::info;

use crate::domain::{CreateUserRequest, USERNAME_TAKEN, UpdateUserRequest, User};
use crate::repository::InMemoryUserRepository;

const USER_NOT_FOUND_MESSAGE: &str = "用户不存在";

fn user_not_found() -> ServiceError {
    BusinessException::with_message(ErrorCode::NOT_FOUND, USER_NOT_FOUND_MESSAGE).into()
}

/// User operations.
#[derive(Debug, Clone)]
pub struct UserService {
    repository: Arc<InMemoryUserRepository>,
}

impl UserService {
    /// Create a service over `repository`.
    #[must_use]
    pub const fn new(repository: Arc<InMemoryUserRepository>) -> Self {
        Self { repository }
    }

    /// Register a user.
    ///
    /// # Errors
    ///
    /// `USERNAME_TAKEN` if the username is already registered.
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, BusinessException> {
        service_layer::guard("UserService::create", async move {
            let mut user = User {
                id: 0,
                username: request.username,
                email: request.email,
                nickname: request.nickname,
                audit: AuditFields::default(),
            };
            user.touch_insert();
            let user = self
                .repository
                .insert(user)
                .await
                .ok_or_else(|| ServiceError::business(USERNAME_TAKEN))?;
            info!(user_id = user.id, username = %user.username, "User created");
            Ok::<_, ServiceError>(user)
        })
        .await
    }

    /// Fetch a user.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` if no such user exists.
    pub async fn get(&self, id: u64) -> Result<User, BusinessException> {
        service_layer::guard("UserService::get", async {
            self.repository.find(id).await.ok_or_else(user_not_found)
        })
        .await
    }

    /// One page of users.
    ///
    /// # Errors
    ///
    /// Never fails for the in-memory store; the signature matches the other operations.
    pub async fn list(&self, page: PageRequest) -> Result<Page<User>, BusinessException> {
        service_layer::guard("UserService::list", async {
            Ok::<_, ServiceError>(self.repository.page(&page).await)
        })
        .await
    }

    /// Change a user's email or nickname.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` if no such user exists.
    pub async fn update(&self, id: u64, request: UpdateUserRequest) -> Result<User, BusinessException> {
        service_layer::guard("UserService::update", async move {
            let mut user = self.repository.find(id).await.ok_or_else(user_not_found)?;
            if let Some(email) = request.email {
                user.email = email;
            }
            if let Some(nickname) = request.nickname {
                user.nickname = Some(nickname);
            }
            user.touch_update();
            if !self.repository.update(user.clone()).await {
                return Err(user_not_found());
            }
            Ok::<_, ServiceError>(user)
        })
        .await
    }

    /// Remove a user.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` if no such user exists.
    pub async fn delete(&self, id: u64) -> Result<(), BusinessException> {
        service_layer::guard("UserService::delete", async {
            if self.repository.delete(id).await {
                info!(user_id = id, "User deleted");
                Ok(())
            } else {
                Err(user_not_found())
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryUserRepository::default()))
    }

    fn request(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            nickname: None,
        }
    }

    #[tokio::test]
    async fn test_create_fills_audit_fields() {
        let user = service().create(request("alice")).await.unwrap();
        assert_eq!(user.id, 1);
        assert!(user.audit.created_time.is_some());
        assert_eq!(user.audit.created_time, user.audit.updated_time);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_business_error() {
        let service = service();
        service.create(request("alice")).await.unwrap();
        let err = service.create(request("alice")).await.unwrap_err();
        assert_eq!(err.error_code(), USERNAME_TAKEN);
        assert_eq!(err.message(), "用户名已存在");
    }

    #[tokio::test]
    async fn test_missing_user() {
        let err = service().get(99).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::NOT_FOUND);
        assert_eq!(err.message(), USER_NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn test_update_keeps_created_time() {
        let service = service();
        let created = service.create(request("bob")).await.unwrap();
        let updated = service
            .update(
                created.id,
                UpdateUserRequest {
                    nickname: Some("Bobby".to_string()),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nickname.as_deref(), Some("Bobby"));
        assert_eq!(updated.email, "bob@example.com");
        assert_eq!(updated.audit.created_time, created.audit.created_time);
        assert!(updated.audit.updated_time >= created.audit.updated_time);
    }

    #[tokio::test]
    async fn test_list_pages_in_id_order() {
        let service = service();
        for name in ["ann", "ben", "cat"] {
            service.create(request(name)).await.unwrap();
        }
        let page = service.list(PageRequest::new(2, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].username, "cat");
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service();
        let user = service.create(request("dan")).await.unwrap();
        service.delete(user.id).await.unwrap();
        assert!(service.delete(user.id).await.is_err());
    }
}
