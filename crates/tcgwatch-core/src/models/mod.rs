//! TCGWatch 도메인 모델.
//!
//! 모니터링 저장소에 기록되는 레코드와 알림 파이프라인이 주고받는 값 타입.
//! 외부 호출자와 주고받는 필드명은 camelCase로 직렬화한다.

pub mod alert;
pub mod collection;
pub mod error_report;
pub mod identity;
pub mod performance;
pub mod transaction;
