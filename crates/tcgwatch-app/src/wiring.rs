//! 의존성 조립.
//!
//! 포트 구현체를 고르고 서비스 그래프를 만든다. 비밀값이 없는 채널은
//! [`DisabledChannel`]로 대체되어 발송 실패가 로그로만 남는다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tcgwatch_alerting::aggregation::AggregationQuery;
use tcgwatch_alerting::batcher::AlertBatcher;
use tcgwatch_alerting::direct::DirectAlertService;
use tcgwatch_alerting::dispatcher::NotificationDispatcher;
use tcgwatch_alerting::events::EventBus;
use tcgwatch_alerting::ingestion::IngestionService;
use tcgwatch_alerting::retention::RetentionSweeper;
use tcgwatch_alerting::tiers::TieredAlerts;
use tcgwatch_alerting::watchers::{ErrorBurstWatcher, FailedTransactionWatcher};
use tcgwatch_core::config::{AppConfig, NotificationSecrets};
use tcgwatch_core::config_manager::ConfigManager;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::ports::auth::IdentityVerifier;
use tcgwatch_core::ports::clock::Clock;
use tcgwatch_core::ports::notifier::{ChatNotifier, EmailNotifier};
use tcgwatch_core::ports::storage::MonitoringStore;
use tcgwatch_network::disabled::DisabledChannel;
use tcgwatch_network::slack::SlackClient;
use tcgwatch_network::smtp::{SmtpMailer, SmtpSettings};
use tcgwatch_web::AppState;
use tracing::{info, warn};

const DB_FILE: &str = "tcgwatch.db";

/// 알림 채널 쌍
pub struct Channels {
    pub chat: Arc<dyn ChatNotifier>,
    pub email: Arc<dyn EmailNotifier>,
}

impl Channels {
    /// 환경 비밀값으로 채널 생성
    pub fn from_secrets(config: &AppConfig, secrets: &NotificationSecrets) -> Result<Self, CoreError> {
        let chat: Arc<dyn ChatNotifier> = match secrets.slack_token.as_deref() {
            Some(token) => Arc::new(SlackClient::new(
                &config.notifications.slack_api_base,
                token,
                config.request_timeout(),
            )?),
            None => {
                warn!("TCGWATCH_SLACK_TOKEN 없음: 채팅 알림 비활성");
                Arc::new(DisabledChannel::new("chat"))
            }
        };

        let email: Arc<dyn EmailNotifier> = match secrets.smtp() {
            Some((host, user, pass, from)) => Arc::new(SmtpMailer::new(&SmtpSettings {
                host: host.to_string(),
                port: config.notifications.smtp_port,
                username: user.to_string(),
                password: pass.to_string(),
                from: from.to_string(),
            })?),
            None => {
                warn!("TCGWATCH_EMAIL_* 일부 없음: 이메일 알림 비활성");
                Arc::new(DisabledChannel::new("email"))
            }
        };

        Ok(Self { chat, email })
    }
}

/// 조립된 서비스 묶음
pub struct Services {
    pub store: Arc<dyn MonitoringStore>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub batcher: Arc<AlertBatcher>,
    pub events: EventBus,
    pub ingestion: Arc<IngestionService>,
    pub direct: Arc<DirectAlertService>,
    pub burst_watcher: Arc<ErrorBurstWatcher>,
    pub failed_watcher: Arc<FailedTransactionWatcher>,
    pub sweeper: Arc<RetentionSweeper>,
    pub tiers: Arc<TieredAlerts>,
}

impl Services {
    pub fn build(
        config: &AppConfig,
        store: Arc<dyn MonitoringStore>,
        channels: Channels,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = Arc::new(config.monitoring.clone());
        let dispatcher = Arc::new(
            NotificationDispatcher::new(registry.clone(), channels.chat, channels.email)
                .with_clock(clock.clone()),
        );
        let batcher = Arc::new(AlertBatcher::new(dispatcher.clone(), registry.clone()));
        let events = EventBus::default();
        let aggregation = AggregationQuery::new(store.clone(), clock.clone());
        let tiers = Arc::new(TieredAlerts::new(
            registry.clone(),
            batcher.clone(),
            aggregation.clone(),
        ));

        let ingestion = IngestionService::new(store.clone(), registry.clone(), clock.clone())
            .with_batcher(batcher.clone())
            .with_event_bus(events.clone());

        Self {
            ingestion: Arc::new(ingestion),
            direct: Arc::new(DirectAlertService::new(dispatcher.clone())),
            burst_watcher: Arc::new(ErrorBurstWatcher::new(
                aggregation.clone(),
                registry.clone(),
                dispatcher.clone(),
            )),
            failed_watcher: Arc::new(
                FailedTransactionWatcher::new(aggregation, registry.clone(), dispatcher.clone())
                    .with_tiers(tiers.clone()),
            ),
            sweeper: Arc::new(RetentionSweeper::new(
                store.clone(),
                clock,
                config.monitoring.retention.clone(),
            )),
            store,
            dispatcher,
            batcher,
            events,
            tiers,
        }
    }

    /// 웹 핸들러 상태
    pub fn web_state(&self, verifier: Arc<dyn IdentityVerifier>) -> AppState {
        AppState {
            ingestion: self.ingestion.clone(),
            direct: self.direct.clone(),
            store: self.store.clone(),
            verifier,
            tiers: Some(self.tiers.clone()),
        }
    }
}

/// 설정 관리자 결정. `--config`가 있으면 그 경로, 없으면 플랫폼 기본 경로.
/// 플랫폼 경로를 못 쓰면 데이터 디렉토리 아래 `config.json`.
pub fn resolve_config_manager(
    explicit: Option<&Path>,
    data_dir: &Path,
) -> Result<ConfigManager, CoreError> {
    if let Some(path) = explicit {
        return ConfigManager::with_path(path.to_path_buf());
    }
    ConfigManager::new().or_else(|e| {
        warn!("기본 설정 경로 사용 불가, 데이터 디렉토리 사용: {e}");
        ConfigManager::with_path(data_dir.join("config.json"))
    })
}

/// 데이터 디렉토리 결정: CLI 인자 → 플랫폼 기본 → 현재 디렉토리
///
/// - macOS: `~/Library/Application Support/com.pokemon-tcg.tcgwatch`
/// - Linux: `~/.local/share/tcgwatch`
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| ConfigManager::data_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// DB 파일 경로: 설정의 `storage.db_path`가 우선
pub fn resolve_db_path(config: &AppConfig, data_dir: &Path) -> PathBuf {
    let path = config
        .storage
        .db_path
        .clone()
        .unwrap_or_else(|| data_dir.join(DB_FILE));
    info!("DB 경로: {}", path.display());
    path
}
