use axum::{body::Bytes, extract::State};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    AppState,
    error::AppError,
    resource::Envelope,
    routes::parse_body,
    utils::{generate_token, hash_password, verify_password},
};

use super::model::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

#[axum::debug_handler]
pub async fn register(State(state): State<AppState>, body: Bytes) -> Result<Envelope, AppError> {
    let req: RegisterRequest = match read_request(&body) {
        Ok(req) => req,
        Err(envelope) => return Ok(envelope),
    };
    req.validate()
        .map_err(|message| AppError::Validation(message.to_string()))?;

    // bcrypt 是 CPU 密集操作，不在异步工作线程上执行
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = state
        .repositories
        .users
        .create(req.username.trim(), &password_hash)
        .await?
        .ok_or(AppError::UserExists)?;

    let (token, expires_at) =
        generate_token(user.id, &state.config).map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!("Registered user {}", user.id);
    Ok(Envelope::ok(serde_json::to_value(RegisterResponse {
        user_id: user.id,
        username: user.username,
        token,
        expires_at,
    })?))
}

#[axum::debug_handler]
pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Envelope, AppError> {
    let req: LoginRequest = match read_request(&body) {
        Ok(req) => req,
        Err(envelope) => return Ok(envelope),
    };

    let user = state
        .repositories
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let password = req.password;
    let password_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::Unauthorized);
    }

    let (token, expires_at) =
        generate_token(user.id, &state.config).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Envelope::ok(serde_json::to_value(LoginResponse {
        user_id: user.id,
        token,
        expires_at,
    })?))
}

// 反序列化失败统一返回 400，不透露具体缺少哪个字段
fn read_request<T: DeserializeOwned>(body: &Bytes) -> Result<T, Envelope> {
    let args = parse_body(body)?;
    serde_json::from_value(Value::Object(args)).map_err(|e| {
        tracing::debug!("Invalid credentials payload: {}", e);
        Envelope::bad_request("username and password are required")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_a_bad_request() {
        let envelope =
            read_request::<LoginRequest>(&Bytes::from_static(br#"{"username":"a"}"#)).unwrap_err();
        assert_eq!(envelope.status_code, 400);
        let body = envelope.data.unwrap().to_string();
        assert!(!body.contains("missing field"), "{body}");
    }

    #[test]
    fn well_formed_body_is_deserialized() {
        let req = read_request::<LoginRequest>(&Bytes::from_static(
            br#"{"username":"a","password":"b"}"#,
        ))
        .unwrap();
        assert_eq!(req.username, "a");
        assert_eq!(req.password, "b");
    }
}
