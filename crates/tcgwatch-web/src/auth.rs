//! 호출자 식별.
//!
//! `Authorization: Bearer <jwt>` 헤더를 검증해 [`CallerIdentity`]를 얻는다.
//! 헤더가 없거나 토큰이 유효하지 않으면 익명 호출로 취급하고, 인증 요구
//! 여부는 각 연산이 판단한다.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use tcgwatch_core::models::identity::CallerIdentity;
use tracing::debug;

use crate::AppState;

/// 요청의 호출자 (익명이면 `None`)
#[derive(Debug, Clone)]
pub struct Caller(pub Option<CallerIdentity>);

impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(Caller(None));
        };
        match state.verifier.verify(token) {
            Ok(identity) => Ok(Caller(Some(identity))),
            Err(e) => {
                debug!("토큰 검증 실패, 익명 처리: {e}");
                Ok(Caller(None))
            }
        }
    }
}

/// `Bearer ` 접두사를 뗀 토큰
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}
