//! # tcgwatch-network
//!
//! 외부 채널 어댑터.
//!
//! ## 모듈
//! - `slack`: Slack Web API `chat.postMessage` (ChatNotifier 구현)
//! - `smtp`: lettre SMTP 발송 (EmailNotifier 구현)
//! - `auth`: HS256 JWT 호출자 검증 (IdentityVerifier 구현)
//! - `disabled`: 비밀값이 없을 때 쓰는 비활성 채널

pub mod auth;
pub mod disabled;
pub mod slack;
pub mod smtp;
