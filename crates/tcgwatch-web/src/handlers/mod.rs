//! API 핸들러 모듈.

pub mod alerts;
pub mod callables;
pub mod health;

use serde::Serialize;

/// 호출 가능 연산의 성공 응답 `{"success": true}`
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
