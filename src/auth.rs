use axum::{RequestPartsExt, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
};

/// Bearer token claims issued by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // opaque user id
    pub username: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(user_id: &str, username: &str, jwt_secret: &str) -> Result<(String, Self)> {
        let now = Utc::now();
        let exp = now + Duration::hours(24);

        let claims = Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(jwt_secret.as_ref()),
        )?;

        Ok((token, claims))
    }

    pub fn verify(token: &str, jwt_secret: &str) -> Result<Self> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(jwt_secret.as_ref()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

/// The acting principal. Extraction fails with 401 when no valid token is sent.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Authentication("Missing authorization header".to_string()))?;

        let claims = Claims::verify(bearer.token(), &state.config.jwt_secret)?;

        if claims.sub.trim().is_empty() {
            return Err(AppError::Authentication(
                "Token has no subject".to_string(),
            ));
        }

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
        })
    }
}
