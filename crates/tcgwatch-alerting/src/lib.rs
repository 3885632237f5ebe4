//! # tcgwatch-alerting
//!
//! 모니터링 규칙 엔진.
//!
//! ## 모듈
//! - [`ingestion`]: 성능 샘플/에러 수집과 임계값 평가
//! - [`aggregation`]: `timestamp > now - window` 건수 집계
//! - [`dispatcher`]: 채팅/이메일 템플릿 렌더링과 병렬 발송
//! - [`direct`]: 호출자 요청 단일 채널 발송
//! - [`batcher`]: 인스턴스별 알림 큐 (critical 즉시, 나머지 주기 배치)
//! - [`events`]: 에러 생성 이벤트 버스
//! - [`watchers`]: 에러 폭주, 실패 거래 감시
//! - [`tiers`]: 에러율/응답 시간/실패 거래 단계별 점검
//! - [`retention`]: 보존 기간이 지난 레코드 정리
//! - [`format`]: 시간 창/초과율 표기

pub mod aggregation;
pub mod batcher;
pub mod direct;
pub mod dispatcher;
pub mod events;
pub mod format;
pub mod ingestion;
pub mod retention;
pub mod tiers;
pub mod watchers;

#[cfg(test)]
pub(crate) mod testing;
