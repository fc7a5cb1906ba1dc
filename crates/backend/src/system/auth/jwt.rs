use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::{Role, TokenClaims};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::OnceCell;
use rand::Rng;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

use crate::shared::data::db::get_connection;

const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24;
const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 90;
const JWT_SECRET_KEY: &str = "jwt_secret";

static JWT_SECRET: OnceCell<String> = OnceCell::new();

/// Claims для пользователя с временем жизни access-токена
pub fn new_claims(user_id: &str, username: &str, role: Role) -> TokenClaims {
    let now = Utc::now();
    TokenClaims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role,
        exp: (now + chrono::Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    }
}

pub fn encode_claims(claims: &TokenClaims, secret: &str) -> Result<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")
}

pub fn decode_claims(token: &str, secret: &str) -> Result<TokenClaims> {
    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;
    Ok(data.claims)
}

pub async fn generate_access_token(user_id: &str, username: &str, role: Role) -> Result<String> {
    let secret = get_jwt_secret().await?;
    encode_claims(&new_claims(user_id, username, role), &secret)
}

pub async fn validate_token(token: &str) -> Result<TokenClaims> {
    let secret = get_jwt_secret().await?;
    decode_claims(token, &secret)
}

pub fn generate_refresh_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn calculate_refresh_token_expiration() -> String {
    (Utc::now() + chrono::Duration::days(REFRESH_TOKEN_LIFETIME_DAYS)).to_rfc3339()
}

/// Секрет подписи: кэш процесса → sys_settings → новый случайный
pub async fn get_jwt_secret() -> Result<String> {
    if let Some(secret) = JWT_SECRET.get() {
        return Ok(secret.clone());
    }
    let db = get_connection()?;
    let secret = match load_secret(db).await? {
        Some(secret) => secret,
        None => {
            let secret = generate_jwt_secret();
            save_secret(db, &secret).await?;
            tracing::info!("Generated new JWT secret");
            secret
        }
    };
    Ok(cache_secret(secret))
}

/// Кладёт секрет в кэш процесса; возвращает действующий (первый записанный)
pub(crate) fn cache_secret(secret: String) -> String {
    JWT_SECRET.get_or_init(|| secret).clone()
}

/// 256 бит из криптографического генератора, base64
fn generate_jwt_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let bytes: [u8; 32] = rand::thread_rng().gen();
    general_purpose::STANDARD.encode(bytes)
}

async fn load_secret(db: &DatabaseConnection) -> Result<Option<String>> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT value FROM sys_settings WHERE key = ?",
            [JWT_SECRET_KEY.into()],
        ))
        .await?;
    match row {
        Some(row) => Ok(Some(row.try_get("", "value")?)),
        None => Ok(None),
    }
}

async fn save_secret(db: &DatabaseConnection, secret: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT OR REPLACE INTO sys_settings (key, value, description, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
        [
            JWT_SECRET_KEY.into(),
            secret.to_string().into(),
            "Auto-generated JWT secret".into(),
            now.clone().into(),
            now.into(),
        ],
    ))
    .await
    .context("Failed to save JWT secret")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::testing::memory_db;

    #[test]
    fn test_claims_roundtrip_with_role() {
        let claims = new_claims("u-1", "maria", Role::Manager);
        let token = encode_claims(&claims, "secret").unwrap();
        let decoded = decode_claims(&token, "secret").unwrap();
        assert_eq!(decoded.sub, "u-1");
        assert_eq!(decoded.role, Role::Manager);
        assert!(decode_claims(&token, "other").is_err());
    }

    #[test]
    fn test_generated_secret_is_256_bit() {
        use base64::{engine::general_purpose, Engine as _};
        let secret = generate_jwt_secret();
        assert_eq!(general_purpose::STANDARD.decode(secret).unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_secret_persisted_in_settings() {
        let db = memory_db().await;
        assert!(load_secret(&db).await.unwrap().is_none());
        save_secret(&db, "abc").await.unwrap();
        assert_eq!(load_secret(&db).await.unwrap().as_deref(), Some("abc"));
    }
}
