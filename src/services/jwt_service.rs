//! Servicio JWT
//!
//! Tokens HS256 con `sub` (id de cuenta), `role` y `jti`. El `jti` es lo que
//! se revoca al cerrar sesión.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::models::account::{Account, Role};
use crate::utils::errors::{AppError, AppResult};

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub role: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Identidad extraída de un token válido
#[derive(Debug, Clone, PartialEq)]
pub struct TokenIdentity {
    pub account_id: Uuid,
    pub role: Role,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Configuración JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_duration: Duration,
}

impl From<&EnvironmentConfig> for JwtConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::seconds(config.jwt_expiration as i64),
        }
    }
}

#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Genera un token de acceso para la cuenta
    pub fn generate_access_token(&self, account: &Account) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + self.config.access_token_duration;

        let claims = JwtClaims {
            sub: account.id.to_string(),
            role: account.role.as_str().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Jwt(format!("Error generando token: {}", e)))
    }

    /// Valida firma y expiración y devuelve la identidad del token
    pub fn validate_token(&self, token: &str) -> AppResult<TokenIdentity> {
        let validation = Validation::new(self.config.algorithm);

        let claims = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Jwt(format!("Token inválido: {}", e)))?;

        let account_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Jwt("Token con sub inválido".to_string()))?;
        let token_id = Uuid::parse_str(&claims.jti)
            .map_err(|_| AppError::Jwt("Token con jti inválido".to_string()))?;
        let role = Role::from_str(&claims.role)
            .ok_or_else(|| AppError::Jwt("Rol inválido en el token".to_string()))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AppError::Jwt("Expiración inválida en el token".to_string()))?;

        Ok(TokenIdentity {
            account_id,
            role,
            token_id,
            expires_at,
        })
    }
}

/// Extraer el token del header Authorization
pub fn extract_bearer(auth_header: &str) -> AppResult<&str> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Header Authorization debe comenzar con 'Bearer '".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Token vacío".to_string()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::hours(1),
        })
    }

    fn account(role: Role) -> Account {
        Account {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "x".to_string(),
            role,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let jwt = service();
        let admin = account(Role::Admin);

        let token = jwt.generate_access_token(&admin).unwrap();
        let identity = jwt.validate_token(&token).unwrap();

        assert_eq!(identity.account_id, admin.id);
        assert_eq!(identity.role, Role::Admin);
        assert!(identity.expires_at > Utc::now());
    }

    #[test]
    fn test_each_token_has_its_own_id() {
        let jwt = service();
        let user = account(Role::User);

        let a = jwt.validate_token(&jwt.generate_access_token(&user).unwrap()).unwrap();
        let b = jwt.validate_token(&jwt.generate_access_token(&user).unwrap()).unwrap();
        assert_ne!(a.token_id, b.token_id);
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let other = JwtService::new(JwtConfig {
            secret: "other-secret".to_string(),
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::hours(1),
        });
        let token = other.generate_access_token(&account(Role::User)).unwrap();

        assert!(matches!(service().validate_token(&token), Err(AppError::Jwt(_))));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(extract_bearer("Basic abc").is_err());
        assert!(extract_bearer("Bearer ").is_err());
    }
}
