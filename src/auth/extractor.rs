//! Authenticated-user extractor
//!
//! Handlers declare `user: CurrentUser` to require a valid bearer
//! token. The verified identity is cached in request extensions so
//! layered extractors do not verify twice.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::core::state::ServerState;
use crate::utils::AppError;

use super::jwt::{Claims, JwtError};

/// Identity taken from a verified token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub role: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims.sub.parse().map_err(|_| AppError::invalid_token())?;
        Ok(Self {
            id,
            name: claims.name,
            role: claims.role,
        })
    }
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(AppError::unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(AppError::unauthorized)?;

        let claims = state.jwt_service.verify(token).map_err(|e| match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            JwtError::InvalidToken(reason) => {
                tracing::warn!(target: "security", %reason, "rejected bearer token");
                AppError::invalid_token()
            }
        })?;

        let user = CurrentUser::try_from(claims)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
