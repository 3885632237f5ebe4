//! 응답 시간 측정 미들웨어.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::debug;

use crate::AppState;

/// 요청 처리 시간을 재서 응답 시간 단계 점검에 넘긴다
pub async fn track_response_time(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    if let Some(tiers) = &state.tiers {
        if let Some(severity) = tiers.check_response_time(elapsed_ms, &path) {
            debug!("느린 응답 [{severity}] {path}: {elapsed_ms:.0}ms");
        }
    }
    response
}
