//! User entity and request payloads.

use serde::{Deserialize, Serialize};
use service_base::ErrorCode;
use service_base::persistence::{AuditFields, Auditable};
use validator::Validate;

/// Username already registered.
pub const USERNAME_TAKEN: ErrorCode = ErrorCode::new("USERNAME_TAKEN", 10001, "用户名已存在");

/// Stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier
    pub id: u64,
    /// Unique login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Audit timestamps
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Auditable for User {
    fn audit_fields_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Login name
    #[validate(length(min = 3, max = 20, message = "用户名长度必须在3到20之间"))]
    pub username: String,
    /// Contact email
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    /// Display name
    #[validate(length(max = 30, message = "昵称不能超过30个字符"))]
    pub nickname: Option<String>,
}

/// Body of `PUT /users/{id}`. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New contact email
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: Option<String>,
    /// New display name
    #[validate(length(max = 30, message = "昵称不能超过30个字符"))]
    pub nickname: Option<String>,
}
