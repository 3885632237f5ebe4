//! 최근 알림 레코드 조회.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tcgwatch_core::models::alert::AlertRecord;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    /// 최대 조회 개수 (기본 50, 최대 500)
    pub limit: Option<usize>,
}

impl AlertsQuery {
    pub fn limit_or_default(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// GET /api/alerts?limit= (인증 필요, 최신순)
pub async fn list_alerts(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<AlertsQuery>, QueryRejection>,
) -> Result<Json<Vec<AlertRecord>>, ApiError> {
    if caller.is_none() {
        return Err(ApiError::Unauthenticated);
    }
    let Query(params) = query?;
    let alerts = state.store.recent_alerts(params.limit_or_default()).await?;
    Ok(Json(alerts))
}
