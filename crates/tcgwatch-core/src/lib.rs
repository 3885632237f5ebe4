//! # tcgwatch-core
//!
//! TCGWatch 도메인 모델, 포트(trait) 정의, 임계값 레지스트리, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 성능 샘플, 에러 레코드, 알림, 거래
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`thresholds`]: 불변 임계값/라우팅 레지스트리
//! - [`template`]: 알림 메시지 자리표시자 치환
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 애플리케이션 설정 구조체
//! - [`config_manager`]: 설정 파일 관리 (로드/저장)

pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;
pub mod template;
pub mod thresholds;
