use axum::async_trait;
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use clap::ValueEnum;
use gb_common::model::Requester;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum AuthMode {
    /// A backend-for-frontend authenticates with a shared key and forwards the
    /// end user in `X-User-Id`.
    ApiKey,
    Jwt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum JwtAlgorithm {
    Hs256,
    Hs384,
    Hs512,
    Rs256,
    Es256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtKeyKind {
    Secret,
    RsaPem,
    EcPem,
}

impl JwtAlgorithm {
    pub fn key_kind(self) -> JwtKeyKind {
        match self {
            JwtAlgorithm::Hs256 | JwtAlgorithm::Hs384 | JwtAlgorithm::Hs512 => JwtKeyKind::Secret,
            JwtAlgorithm::Rs256 => JwtKeyKind::RsaPem,
            JwtAlgorithm::Es256 => JwtKeyKind::EcPem,
        }
    }

    fn algorithm(self) -> Algorithm {
        match self {
            JwtAlgorithm::Hs256 => Algorithm::HS256,
            JwtAlgorithm::Hs384 => Algorithm::HS384,
            JwtAlgorithm::Hs512 => Algorithm::HS512,
            JwtAlgorithm::Rs256 => Algorithm::RS256,
            JwtAlgorithm::Es256 => Algorithm::ES256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_public_key: Option<String>,
    pub jwt_algorithm: JwtAlgorithm,
}

impl AuthConfig {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::ApiKey,
            api_key: Some(key.into()),
            jwt_secret: None,
            jwt_public_key: None,
            jwt_algorithm: JwtAlgorithm::Hs256,
        }
    }

    fn decoding_key(&self) -> Result<DecodingKey, ApiError> {
        match self.jwt_algorithm.key_kind() {
            JwtKeyKind::Secret => {
                let secret = self
                    .jwt_secret
                    .as_deref()
                    .ok_or_else(|| ApiError::Unauthorized("missing JWT_SECRET".into()))?;
                Ok(DecodingKey::from_secret(secret.as_bytes()))
            }
            kind => {
                let pem = self
                    .jwt_public_key
                    .as_deref()
                    .ok_or_else(|| ApiError::Unauthorized("missing JWT_PUBLIC_KEY".into()))?;
                let key = match kind {
                    JwtKeyKind::RsaPem => DecodingKey::from_rsa_pem(pem.as_bytes()),
                    _ => DecodingKey::from_ec_pem(pem.as_bytes()),
                };
                key.map_err(|err| ApiError::Unauthorized(format!("invalid JWT_PUBLIC_KEY: {err}")))
            }
        }
    }
}

/// Identity resolved for one request.
///
/// Missing end-user credentials yield [`Requester::Anonymous`]; services decide
/// whether that is enough. Credentials that are present but invalid are
/// rejected here.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub requester: Requester,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: Option<usize>,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);

        let requester = match config.mode {
            AuthMode::ApiKey => authorize_api_key(parts, &config)?,
            AuthMode::Jwt => authorize_jwt(parts, &config)?,
        };
        Ok(AuthUser { requester })
    }
}

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::Unauthorized("user id must be a UUID".into()))
}

fn authorize_api_key(parts: &Parts, config: &AuthConfig) -> Result<Requester, ApiError> {
    let expected = config
        .api_key
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("missing GB_API_KEY".into()))?;

    let provided = parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing X-API-Key header".into()))?;

    if provided != expected {
        return Err(ApiError::Unauthorized("invalid API key".into()));
    }

    match parts.headers.get(USER_ID_HEADER) {
        None => Ok(Requester::Anonymous),
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| ApiError::Unauthorized("unreadable X-User-Id header".into()))?;
            Ok(Requester::User(parse_user_id(raw)?))
        }
    }
}

fn authorize_jwt(parts: &Parts, config: &AuthConfig) -> Result<Requester, ApiError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(Requester::Anonymous);
    };

    let header = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("unreadable Authorization header".into()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("expected Bearer token".into()))?;

    let validation = Validation::new(config.jwt_algorithm.algorithm());
    let data = decode::<Claims>(token, &config.decoding_key()?, &validation)
        .map_err(|err| ApiError::Unauthorized(format!("invalid token: {err}")))?;

    Ok(Requester::User(parse_user_id(&data.claims.sub)?))
}
