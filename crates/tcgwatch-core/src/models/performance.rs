//! 성능 샘플 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 핵심 애플리케이션 메트릭 이름. 레지스트리는 이 이름들에 대한 규칙을 반드시 가진다.
pub mod metric {
    pub const PAGE_LOAD: &str = "pageLoad";
    pub const API_RESPONSE: &str = "apiResponse";
    pub const RENDER_TIME: &str = "renderTime";
    pub const DATABASE_QUERY: &str = "databaseQuery";

    /// 시작 시 검증 대상
    pub const CORE: [&str; 4] = [PAGE_LOAD, API_RESPONSE, RENDER_TIME, DATABASE_QUERY];
}

/// 호출자가 보고한 완료된 측정 한 건 (recordPerformance 입력)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    /// 측정이 일어난 화면 경로
    pub route: String,
    /// 소요 시간 (밀리초)
    pub load_time: f64,
    /// 메트릭 종류 (예: "pageLoad", "deckBuilder.save")
    pub metric_type: String,
    /// 호출자가 보낸 사용자 ID. 신뢰하지 않으며 저장 시 인증 주체로 대체된다.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// 저장된 성능 샘플. 생성 후 변경되지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    pub route: String,
    pub metric_type: String,
    pub load_time: f64,
    /// 서버가 부여한 시각
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}
