//! 호출자 식별 정보.

use serde::{Deserialize, Serialize};

/// 검증된 호출자. 토큰의 `sub` 클레임에서 온다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// 사용자 ID
    pub uid: String,
}

impl CallerIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}
