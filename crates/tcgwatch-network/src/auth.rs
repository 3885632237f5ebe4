//! JWT 호출자 검증.
//!
//! `IdentityVerifier` 포트 구현. HS256 서명과 만료를 확인하고
//! `sub` 클레임을 사용자 ID로 쓴다.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::models::identity::CallerIdentity;
use tcgwatch_core::ports::auth::IdentityVerifier;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// HS256 JWT 검증기
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<CallerIdentity, CoreError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| CoreError::Auth(format!("토큰 검증 실패: {e}")))?;

        if data.claims.sub.trim().is_empty() {
            return Err(CoreError::Auth("sub 클레임이 비어 있음".to_string()));
        }
        Ok(CallerIdentity::new(data.claims.sub))
    }
}
