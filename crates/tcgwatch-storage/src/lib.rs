//! # tcgwatch-storage
//!
//! 로컬 저장소 어댑터.
//! SQLite 기반 모니터링 컬렉션(performance, errors, alerts, transactions)
//! 저장, 시간 창 집계, 보존 정리를 담당한다.
//!
//! ## 모듈
//! - `sqlite`: 모니터링 저장소 (MonitoringStore 구현)
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod sqlite;
