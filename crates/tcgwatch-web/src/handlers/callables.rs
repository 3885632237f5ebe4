//! 호출 가능 연산 핸들러.
//!
//! 본문 파싱 후 서비스에 위임한다. 응답은 성공 여부만 담고, 생성된 알림
//! 레코드나 발송 결과는 돌려주지 않는다.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tcgwatch_core::models::alert::AlertPayload;
use tcgwatch_core::models::error_report::ErrorReport;
use tcgwatch_core::models::performance::PerformanceReport;

use super::SuccessResponse;
use crate::auth::Caller;
use crate::error::ApiError;
use crate::AppState;

/// POST /api/recordPerformance
pub async fn record_performance(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<PerformanceReport>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(report) = body?;
    state
        .ingestion
        .record_performance(caller.as_ref(), report)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/recordError
pub async fn record_error(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<ErrorReport>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(report) = body?;
    state.ingestion.record_error(caller.as_ref(), report).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/sendAlertEmail
pub async fn send_alert_email(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<AlertPayload>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(payload) = body?;
    state.direct.send_alert_email(caller.as_ref(), &payload).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/sendSlackAlert
pub async fn send_slack_alert(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<AlertPayload>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(payload) = body?;
    state.direct.send_slack_alert(caller.as_ref(), &payload).await?;
    Ok(Json(SuccessResponse::ok()))
}
