use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::resource::Identity;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户ID
    pub exp: i64,    // 过期时间
    pub iat: i64,    // 签发时间
}

impl Claims {
    /// 令牌对应的调用方身份；`sub` 不是合法 ID 时视为匿名
    pub fn identity(&self) -> Identity {
        self.sub
            .parse()
            .map(Identity::Account)
            .unwrap_or(Identity::Anonymous)
    }
}

pub fn generate_token(
    user_id: i64,
    config: &Config,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let lifetime =
        Duration::from_std(config.jwt_expiration()).unwrap_or_else(|_| Duration::hours(24));
    let expiration = (now + lifetime).timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration,
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;

    Ok((token, expiration))
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> Config {
        Config {
            server_host: "127.0.0.1".into(),
            server_port: 3000,
            api_base_uri: "/api".into(),
            database_url: None,
            redis_url: None,
            jwt_secret: secret.into(),
            jwt_expiration_secs: 3600,
            task_rate_limit: "60/60".into(),
            custom_list_rate_limit: "30/60".into(),
            counter_purge_interval_secs: 60,
        }
    }

    #[test]
    fn token_round_trip_yields_account_identity() {
        let config = config("secret");
        let (token, expiration) = generate_token(42, &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.exp, expiration);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.identity(), Identity::Account(42));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) = generate_token(1, &config("one")).unwrap();
        assert!(verify_token(&token, &config("two")).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hashed = hash_password("123").unwrap();
        assert!(verify_password("123", &hashed).unwrap());
        assert!(!verify_password("1234", &hashed).unwrap());
    }
}
