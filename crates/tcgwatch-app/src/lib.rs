//! # tcgwatch-app
//!
//! 서버 조립과 실행.
//!
//! - [`wiring`]: 설정과 비밀값으로 어댑터/서비스 생성
//! - [`scheduler`]: 배치 비우기, 실패 거래 점검, 보존 정리, 에러 폭주 감시 루프
//! - [`lifecycle`]: 종료 신호 전파

pub mod lifecycle;
pub mod scheduler;
pub mod wiring;
