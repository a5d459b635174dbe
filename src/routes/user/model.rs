use serde::{Deserialize, Serialize};

pub const USERNAME_MAX_LEN: usize = 150;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub username: String,
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub token: String,
    pub expires_at: i64,
}

impl RegisterRequest {
    /// 用户名只允许字母、数字、下划线和 `@.+-`
    pub fn validate(&self) -> Result<(), &'static str> {
        let username = self.username.trim();
        if username.is_empty() || username.chars().count() > USERNAME_MAX_LEN {
            return Err("username must be 1-150 characters");
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "_@.+-".contains(c))
        {
            return Err("username may only contain letters, digits and _@.+-");
        }
        if self.password.is_empty() {
            return Err("password must not be empty");
        }
        Ok(())
    }
}
