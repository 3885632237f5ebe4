//! 호출자 인증 포트.

use crate::error::CoreError;
use crate::models::identity::CallerIdentity;

/// Bearer 토큰을 검증해 호출자 식별 정보를 얻는다.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<CallerIdentity, CoreError>;
}
