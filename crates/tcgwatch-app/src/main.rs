//! # tcgwatch
//!
//! 모니터링 서버 바이너리. 설정 로드, 의존성 조립, 스케줄러와 HTTP 서버
//! 실행, 시그널 대기.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tcgwatch_app::lifecycle::LifecycleManager;
use tcgwatch_app::scheduler::{Scheduler, SchedulerConfig};
use tcgwatch_app::wiring::{self, Channels, Services};
use tcgwatch_core::config::{AuthSecrets, NotificationSecrets};
use tcgwatch_core::ports::clock::SystemClock;
use tcgwatch_network::auth::JwtVerifier;
use tcgwatch_storage::sqlite::SqliteStorage;
use tcgwatch_web::WebServer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Pokemon TCG 마켓플레이스 모니터링/알림 서버
#[derive(Parser, Debug)]
#[command(name = "tcgwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP 포트 (설정 파일 값을 덮어씀)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// 데이터 디렉토리 (DB, 대체 설정 파일 위치)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

const LOG_TARGETS: [&str; 7] = [
    "tcgwatch",
    "tcgwatch_app",
    "tcgwatch_core",
    "tcgwatch_storage",
    "tcgwatch_network",
    "tcgwatch_alerting",
    "tcgwatch_web",
];

fn log_filter(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .chain(std::iter::once(format!("tower_http={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(&args.log_level))),
        )
        .init();

    info!("TCGWatch 시작 (v{})", env!("CARGO_PKG_VERSION"));

    // ── 설정 ──
    let data_dir = wiring::resolve_data_dir(args.data_dir.as_deref());
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("데이터 디렉토리 생성 실패: {}", data_dir.display()))?;

    let config_manager = wiring::resolve_config_manager(args.config.as_deref(), &data_dir)
        .context("설정 로드 실패")?;
    info!("설정 파일: {}", config_manager.config_path().display());

    let mut config = config_manager.get();
    if let Some(port) = args.port {
        config.web.port = port;
    }

    let auth = AuthSecrets::from_env().context("호출자 인증 설정 누락")?;
    let secrets = NotificationSecrets::from_env();
    info!("알림 비밀값: {secrets:?}");

    // ── 저장소 ──
    let db_path = wiring::resolve_db_path(&config, &data_dir);
    let store = Arc::new(SqliteStorage::open(&db_path).context("SQLite 저장소 열기 실패")?);

    // ── 서비스 조립 ──
    let channels = Channels::from_secrets(&config, &secrets).context("알림 채널 생성 실패")?;
    let services = Services::build(&config, store, channels, Arc::new(SystemClock));
    let verifier = Arc::new(JwtVerifier::new(&auth.jwt_secret));

    let lifecycle = LifecycleManager::new();

    // ── 스케줄러 ──
    let scheduler = Scheduler::new(SchedulerConfig::from_app_config(&config), &services);
    let scheduler_shutdown = lifecycle.subscribe();
    let scheduler_task = tokio::spawn(async move {
        scheduler.run(scheduler_shutdown).await;
    });

    // ── HTTP 서버 ──
    let web_server = WebServer::new(services.web_state(verifier), config.web.clone());
    info!("모니터링 API: {}/api", web_server.url());
    let web_shutdown = lifecycle.subscribe();
    let web_task = tokio::spawn(async move {
        if let Err(e) = web_server.run(web_shutdown).await {
            error!("웹 서버 오류: {e}");
        }
    });

    info!("TCGWatch 실행 중 (Ctrl+C로 종료)");
    lifecycle.wait_for_signal().await;

    let _ = tokio::join!(scheduler_task, web_task);
    info!("TCGWatch 종료");
    Ok(())
}
