//! # tcgwatch-web
//!
//! 모니터링 HTTP 서버. Axum 기반.
//!
//! ## 엔드포인트
//! - `POST /api/recordPerformance`: 성능 샘플 기록 (인증 필요)
//! - `POST /api/recordError`: 에러 기록 (인증 선택)
//! - `POST /api/sendAlertEmail`, `POST /api/sendSlackAlert`: 직접 발송 (인증 필요)
//! - `GET /api/alerts`: 최근 알림 레코드
//! - `GET /api/health`
//!
//! 모든 `/api` 요청의 처리 시간은 응답 시간 단계 점검으로 넘어간다.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod timing;

use axum::middleware;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tcgwatch_alerting::direct::DirectAlertService;
use tcgwatch_alerting::ingestion::IngestionService;
use tcgwatch_alerting::tiers::TieredAlerts;
use tcgwatch_core::config::WebConfig;
use tcgwatch_core::ports::auth::IdentityVerifier;
use tcgwatch_core::ports::storage::MonitoringStore;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// 포트 바인드 최대 시도 횟수
const MAX_PORT_ATTEMPTS: u16 = 10;

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionService>,
    pub direct: Arc<DirectAlertService>,
    pub store: Arc<dyn MonitoringStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
    /// 없으면 응답 시간 점검을 하지 않는다
    pub tiers: Option<Arc<TieredAlerts>>,
}

/// 라우터 구성
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            timing::track_response_time,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 모니터링 HTTP 서버
pub struct WebServer {
    config: WebConfig,
    state: AppState,
}

impl WebServer {
    pub fn new(state: AppState, config: WebConfig) -> Self {
        Self { config, state }
    }

    /// 서버 실행
    ///
    /// 설정 포트가 사용 중이면 다음 포트를 차례로 시도한다.
    /// `MAX_PORT_ATTEMPTS`번 모두 실패하면 마지막 에러를 돌려준다.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let host = if self.config.allow_external {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };
        let app = build_router(self.state);

        let base_port = self.config.port;
        let mut last_error = None;

        for attempt in 0..MAX_PORT_ATTEMPTS {
            let Some(port) = base_port.checked_add(attempt) else {
                break;
            };

            let addr: SocketAddr = match format!("{host}:{port}").parse() {
                Ok(a) => a,
                Err(e) => {
                    error!("잘못된 주소 {host}:{port}: {e}");
                    continue;
                }
            };

            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    if attempt > 0 {
                        warn!("포트 {base_port} 사용 불가, 대체 포트 {port} 사용");
                    }
                    info!("모니터링 서버 시작: http://{addr}");

                    axum::serve(listener, app)
                        .with_graceful_shutdown(async move {
                            loop {
                                if *shutdown_rx.borrow() {
                                    info!("웹 서버 종료 신호 수신");
                                    break;
                                }
                                if shutdown_rx.changed().await.is_err() {
                                    break;
                                }
                            }
                        })
                        .await?;

                    info!("모니터링 서버 종료");
                    return Ok(());
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    warn!("포트 {port} 이미 사용 중, 다음 포트 시도...");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!(
                    "포트 {}-{} 모두 사용 불가",
                    base_port,
                    base_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
                ),
            )
        }))
    }

    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.config.port)
    }
}
