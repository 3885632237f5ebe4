//! 임계값 레지스트리.
//!
//! 메트릭/에러/거래 범주별 수치 임계값과 시간 창, 그리고 알림 라우팅
//! (채팅 채널, 이메일 수신자, 메시지 템플릿)을 담는 불변 설정 값.
//! 프로세스 시작 시 한 번 만들어 `Arc<MonitoringConfig>`로 주입한다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::CoreError;
use crate::models::alert::{AlertSeverity, QueueSeverity};
use crate::models::collection::Collection;
use crate::models::performance::metric;

/// 임계값 범주
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdCategory {
    /// 키 = 메트릭 이름
    Performance,
    /// 키 = "critical" | "burst"
    Error,
    /// 키 = "failedCount"
    Transaction,
}

/// 조회 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRule {
    /// 초과(성능) 또는 도달(건수) 기준값
    pub limit: f64,
    /// 집계 시간 창. 성능 규칙은 단일 샘플 비교라 0
    pub window_ms: u64,
    /// 기본 심각도. 성능 규칙은 limit의 2배를 넘으면 critical로 올라간다.
    pub severity: AlertSeverity,
}

/// 에러 키
pub const ERROR_CRITICAL_KEY: &str = "critical";
/// 전역 에러 폭주 키
pub const ERROR_BURST_KEY: &str = "burst";
/// 실패 거래 키
pub const TRANSACTION_FAILED_KEY: &str = "failedCount";

/// 시간 창/보존 기간 상한 (10년). 시각 계산이 넘치지 않는 범위로 묶는다.
pub const MAX_WINDOW_MS: u64 = 315_360_000_000;

/// 라우트 템플릿이 내용을 담지 못할 때 쓰는 채팅 템플릿
pub const DEFAULT_CHAT_TEMPLATE: &str = "🔔 *ALERTE {type}*\nÉvénement: {message}\nDétails: {details}";

/// 최상위 모니터링 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub performance: PerformanceThresholds,
    #[serde(default)]
    pub errors: ErrorThresholds,
    #[serde(default)]
    pub transactions: TransactionThresholds,
    #[serde(default)]
    pub retention: RetentionPolicy,
    /// 알림 종류별 라우팅
    #[serde(default = "default_routes")]
    pub routes: BTreeMap<String, NotificationRoute>,
    #[serde(default)]
    pub email: EmailTemplates,
    #[serde(default)]
    pub batching: BatchingPolicy,
    /// 단계별 배치 알림 기준
    #[serde(default)]
    pub tiers: TieredThresholds,
}

// ============================================================
// 범주별 임계값
// ============================================================

/// 성능 메트릭 임계값 (밀리초)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    #[serde(default = "default_performance_thresholds")]
    pub thresholds: BTreeMap<String, u64>,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            thresholds: default_performance_thresholds(),
        }
    }
}

/// 건수 + 시간 창 임계값
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowThreshold {
    pub threshold: u64,
    pub time_window_ms: u64,
}

/// 에러 임계값과 치명 후보 패턴
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorThresholds {
    /// 같은 메시지 반복 기준
    #[serde(default = "default_error_window")]
    pub critical: WindowThreshold,
    /// 전체 에러 폭주 기준 (에러 생성 트리거)
    #[serde(default = "default_error_window")]
    pub burst: WindowThreshold,
    /// 소문자 비교용 부분 문자열 목록
    #[serde(default = "default_error_patterns")]
    pub patterns: Vec<String>,
}

impl Default for ErrorThresholds {
    fn default() -> Self {
        Self {
            critical: default_error_window(),
            burst: default_error_window(),
            patterns: default_error_patterns(),
        }
    }
}

/// 실패 거래 임계값
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionThresholds {
    #[serde(default = "default_failed_count")]
    pub failed_count: u64,
    #[serde(default = "default_transaction_window_ms")]
    pub time_window_ms: u64,
    /// 점검 주기
    #[serde(default = "default_transaction_check_interval_ms")]
    pub check_interval_ms: u64,
}

impl Default for TransactionThresholds {
    fn default() -> Self {
        Self {
            failed_count: default_failed_count(),
            time_window_ms: default_transaction_window_ms(),
            check_interval_ms: default_transaction_check_interval_ms(),
        }
    }
}

/// 보존 정책
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// 보존 기간 (밀리초)
    #[serde(default = "default_retention_period_ms")]
    pub period_ms: u64,
    /// 실행 1회당 컬렉션별 최대 삭제 건수
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// 정리 대상 컬렉션
    #[serde(default = "default_retained_collections")]
    pub collections: Vec<Collection>,
    /// 정리 주기
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            period_ms: default_retention_period_ms(),
            page_size: default_page_size(),
            collections: default_retained_collections(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

/// medium/high/critical 3단계 기준 (값이 기준 이상이면 해당 단계)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityTiers {
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
}

impl SeverityTiers {
    /// 가장 높은 도달 단계. medium 미만이면 None.
    pub fn classify(&self, value: f64) -> Option<QueueSeverity> {
        if value >= self.critical as f64 {
            Some(QueueSeverity::Critical)
        } else if value >= self.high as f64 {
            Some(QueueSeverity::High)
        } else if value >= self.medium as f64 {
            Some(QueueSeverity::Medium)
        } else {
            None
        }
    }

    /// 단계별 기준값
    pub fn limit_for(&self, severity: QueueSeverity) -> Option<u64> {
        match severity {
            QueueSeverity::Medium => Some(self.medium),
            QueueSeverity::High => Some(self.high),
            QueueSeverity::Critical => Some(self.critical),
            QueueSeverity::Low => None,
        }
    }

    fn is_ordered(&self) -> bool {
        0 < self.medium && self.medium <= self.high && self.high <= self.critical
    }
}

/// 배치 큐로 들어가는 단계별 점검 기준
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieredThresholds {
    /// 분당 에러 수
    #[serde(default = "default_error_rate_tiers")]
    pub error_rate: SeverityTiers,
    /// 응답 시간 (밀리초)
    #[serde(default = "default_response_time_tiers")]
    pub response_time: SeverityTiers,
    /// 시간당 실패 거래 수
    #[serde(default = "default_failed_transaction_tiers")]
    pub failed_transactions: SeverityTiers,
    /// 에러율 표본 주기이자 집계 창
    #[serde(default = "default_error_rate_interval_ms")]
    pub error_rate_interval_ms: u64,
}

impl Default for TieredThresholds {
    fn default() -> Self {
        Self {
            error_rate: default_error_rate_tiers(),
            response_time: default_response_time_tiers(),
            failed_transactions: default_failed_transaction_tiers(),
            error_rate_interval_ms: default_error_rate_interval_ms(),
        }
    }
}

// ============================================================
// 알림 라우팅
// ============================================================

/// 알림 종류 하나의 전달 경로
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRoute {
    /// 채팅 채널 이름
    pub channel: String,
    /// 이메일 수신자
    pub recipients: Vec<String>,
    /// 채팅 메시지 템플릿
    #[serde(default = "default_chat_template")]
    pub template: String,
}

/// 이메일 제목/본문 템플릿
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplates {
    #[serde(default = "default_subject_template")]
    pub subject_template: String,
    #[serde(default = "default_body_template")]
    pub body_template: String,
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,
}

impl Default for EmailTemplates {
    fn default() -> Self {
        Self {
            subject_template: default_subject_template(),
            body_template: default_body_template(),
            dashboard_url: default_dashboard_url(),
        }
    }
}

/// 배치 큐 정책
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchingPolicy {
    /// 큐 비우기 주기
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// 그룹 키 → 라우트 키
    #[serde(default = "default_batch_routes")]
    pub routes: BTreeMap<String, String>,
    /// 매핑이 없는 그룹 키가 쓰는 라우트
    #[serde(default = "default_fallback_route")]
    pub fallback_route: String,
}

impl Default for BatchingPolicy {
    fn default() -> Self {
        Self {
            flush_interval_ms: default_flush_interval_ms(),
            routes: default_batch_routes(),
            fallback_route: default_fallback_route(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl MonitoringConfig {
    /// 기본 레지스트리
    pub fn default_config() -> Self {
        Self {
            performance: PerformanceThresholds::default(),
            errors: ErrorThresholds::default(),
            transactions: TransactionThresholds::default(),
            retention: RetentionPolicy::default(),
            routes: default_routes(),
            email: EmailTemplates::default(),
            batching: BatchingPolicy::default(),
            tiers: TieredThresholds::default(),
        }
    }

    /// 범주/키로 규칙 조회. 부수 효과 없음.
    pub fn threshold_for(&self, category: ThresholdCategory, key: &str) -> Option<ThresholdRule> {
        match category {
            ThresholdCategory::Performance => {
                self.performance
                    .thresholds
                    .get(key)
                    .map(|&limit| ThresholdRule {
                        limit: limit as f64,
                        window_ms: 0,
                        severity: AlertSeverity::Warning,
                    })
            }
            ThresholdCategory::Error => {
                let window = match key {
                    ERROR_CRITICAL_KEY => self.errors.critical,
                    ERROR_BURST_KEY => self.errors.burst,
                    _ => return None,
                };
                Some(ThresholdRule {
                    limit: window.threshold as f64,
                    window_ms: window.time_window_ms,
                    severity: AlertSeverity::Critical,
                })
            }
            ThresholdCategory::Transaction => (key == TRANSACTION_FAILED_KEY).then(|| ThresholdRule {
                limit: self.transactions.failed_count as f64,
                window_ms: self.transactions.time_window_ms,
                severity: AlertSeverity::Critical,
            }),
        }
    }

    /// 소문자 메시지가 패턴 중 하나라도 포함하면 치명 후보
    pub fn is_critical_candidate(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        self.errors
            .patterns
            .iter()
            .any(|pattern| lowered.contains(&pattern.to_lowercase()))
    }

    /// 알림 종류의 전달 경로
    pub fn route(&self, alert_type: &str) -> Option<&NotificationRoute> {
        self.routes.get(alert_type)
    }

    /// 배치 그룹 키가 쓸 라우트 키.
    /// 라우트 이름과 같으면 그대로, 아니면 매핑, 그래도 없으면 fallback.
    pub fn batch_route_for<'a>(&'a self, kind: &'a str) -> &'a str {
        if self.routes.contains_key(kind) {
            return kind;
        }
        self.batching
            .routes
            .get(kind)
            .map(String::as_str)
            .unwrap_or(self.batching.fallback_route.as_str())
    }

    /// 시작 시 검증. 핵심 메트릭 규칙 누락은 설정 에러다.
    pub fn validate(&self) -> Result<(), CoreError> {
        for name in metric::CORE {
            if !self.performance.thresholds.contains_key(name) {
                return Err(CoreError::Config(format!("성능 임계값 누락: {name}")));
            }
        }
        if let Some((name, _)) = self.performance.thresholds.iter().find(|(_, v)| **v == 0) {
            return Err(CoreError::Config(format!("성능 임계값은 0보다 커야 함: {name}")));
        }
        for (name, window) in [
            (ERROR_CRITICAL_KEY, self.errors.critical),
            (ERROR_BURST_KEY, self.errors.burst),
        ] {
            if window.time_window_ms == 0 || window.threshold == 0 {
                return Err(CoreError::Config(format!("에러 임계값 오류: {name}")));
            }
        }
        if self.transactions.time_window_ms == 0 || self.transactions.failed_count == 0 {
            return Err(CoreError::Config("거래 임계값 오류".to_string()));
        }
        for (name, window) in [
            ("errors.critical", self.errors.critical.time_window_ms),
            ("errors.burst", self.errors.burst.time_window_ms),
            ("transactions.time_window_ms", self.transactions.time_window_ms),
            ("retention.period_ms", self.retention.period_ms),
            ("tiers.error_rate_interval_ms", self.tiers.error_rate_interval_ms),
        ] {
            if window == 0 || window > MAX_WINDOW_MS {
                return Err(CoreError::Config(format!(
                    "시간 범위 오류: {name}={window} (1..={MAX_WINDOW_MS})"
                )));
            }
        }
        for (name, interval) in [
            ("batching.flush_interval_ms", self.batching.flush_interval_ms),
            ("transactions.check_interval_ms", self.transactions.check_interval_ms),
            ("retention.sweep_interval_ms", self.retention.sweep_interval_ms),
        ] {
            if interval == 0 {
                return Err(CoreError::Config(format!("주기는 0보다 커야 함: {name}")));
            }
        }
        if self.retention.page_size == 0 {
            return Err(CoreError::Config("정리 페이지 크기는 0보다 커야 함".to_string()));
        }
        for (name, tiers) in [
            ("error_rate", self.tiers.error_rate),
            ("response_time", self.tiers.response_time),
            ("failed_transactions", self.tiers.failed_transactions),
        ] {
            if !tiers.is_ordered() {
                return Err(CoreError::Config(format!(
                    "단계 기준은 0 < medium <= high <= critical 이어야 함: {name}"
                )));
            }
        }
        if !self.routes.contains_key(&self.batching.fallback_route) {
            return Err(CoreError::Config(format!(
                "배치 fallback 라우트 없음: {}",
                self.batching.fallback_route
            )));
        }
        if let Some((kind, target)) = self
            .batching
            .routes
            .iter()
            .find(|(_, target)| !self.routes.contains_key(target.as_str()))
        {
            return Err(CoreError::Config(format!(
                "배치 라우트 대상 없음: {kind} → {target}"
            )));
        }
        debug!(
            "임계값 레지스트리 검증 완료: 메트릭 {}개, 라우트 {}개",
            self.performance.thresholds.len(),
            self.routes.len()
        );
        Ok(())
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_performance_thresholds() -> BTreeMap<String, u64> {
    let flat: [(&str, u64); 16] = [
        (metric::PAGE_LOAD, 2000),
        (metric::API_RESPONSE, 1000),
        (metric::RENDER_TIME, 500),
        (metric::DATABASE_QUERY, 800),
        ("cardImageLoad", 1500),
        ("searchResponse", 1200),
        ("cardAnimation", 300),
        ("deckLoading", 1000),
        ("cardPreview", 800),
        ("cardZoom", 500),
        ("cardRotation", 200),
        ("cardFlip", 400),
        ("filterApply", 300),
        ("sortingChange", 200),
        ("cartUpdate", 600),
        ("wishlistSync", 1000),
    ];
    let deck_builder: [(&str, u64); 8] = [
        ("load", 1500),
        ("save", 800),
        ("validate", 500),
        ("import", 1200),
        ("export", 700),
        ("cardAdd", 300),
        ("cardRemove", 300),
        ("statsUpdate", 400),
    ];
    let trading: [(&str, u64); 5] = [
        ("offerCreate", 1000),
        ("offerAccept", 1500),
        ("offerCancel", 800),
        ("chatLoad", 600),
        ("messageSync", 400),
    ];

    let mut map: BTreeMap<String, u64> = flat.iter().map(|&(k, v)| (k.to_string(), v)).collect();
    map.extend(deck_builder.iter().map(|&(k, v)| (format!("deckBuilder.{k}"), v)));
    map.extend(trading.iter().map(|&(k, v)| (format!("trading.{k}"), v)));
    map
}

fn default_error_window() -> WindowThreshold {
    WindowThreshold {
        threshold: 10,
        time_window_ms: 300_000,
    }
}

fn default_error_patterns() -> Vec<String> {
    [
        // 결제/거래
        "paiement échoué",
        "erreur de transaction",
        "échec de validation du paiement",
        // 인프라
        "erreur de connexion base de données",
        "erreur de service pokemon tcg",
        "limite d'api dépassée",
        // 보안
        "authentification échouée",
        "token invalide",
        "accès non autorisé",
        "faille de sécurité",
        "violation de données",
        // 재고/가격
        "stock insuffisant",
        "prix invalide",
        "erreur de conversion de devise",
        // 덱/거래소/컬렉션
        "deck invalide",
        "offre expirée",
        "carte indisponible",
        "limite de collection atteinte",
        "format de deck non valide",
        // 계정
        "restriction d'âge",
        "compte limité",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_failed_count() -> u64 {
    3
}
fn default_transaction_window_ms() -> u64 {
    3_600_000
}
fn default_transaction_check_interval_ms() -> u64 {
    3_600_000
}
fn default_retention_period_ms() -> u64 {
    2_592_000_000
}
fn default_page_size() -> usize {
    500
}
fn default_retained_collections() -> Vec<Collection> {
    vec![Collection::Performance, Collection::Errors]
}
fn default_sweep_interval_ms() -> u64 {
    86_400_000
}
fn default_flush_interval_ms() -> u64 {
    60_000
}
fn default_error_rate_tiers() -> SeverityTiers {
    SeverityTiers {
        medium: 5,
        high: 10,
        critical: 20,
    }
}
fn default_response_time_tiers() -> SeverityTiers {
    SeverityTiers {
        medium: 1000,
        high: 3000,
        critical: 5000,
    }
}
fn default_failed_transaction_tiers() -> SeverityTiers {
    SeverityTiers {
        medium: 3,
        high: 5,
        critical: 10,
    }
}
fn default_error_rate_interval_ms() -> u64 {
    60_000
}
fn default_fallback_route() -> String {
    "critical".to_string()
}

fn default_batch_routes() -> BTreeMap<String, String> {
    [
        ("error", "critical"),
        ("error_rate", "critical"),
        ("failed_transactions", "critical"),
        ("response_time", "performance"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_chat_template() -> String {
    DEFAULT_CHAT_TEMPLATE.to_string()
}

fn default_routes() -> BTreeMap<String, NotificationRoute> {
    let domain = "pokemon-tcg.com";
    let route = |key: &str, recipients: &[&str], template: Option<&str>| {
        (
            key.to_string(),
            NotificationRoute {
                channel: format!("pokemon-tcg-{key}"),
                recipients: recipients.iter().map(|r| format!("{r}@{domain}")).collect(),
                template: template.map(String::from).unwrap_or_else(default_chat_template),
            },
        )
    };

    [
        route("critical", &["admin", "tech-lead"], Some(CRITICAL_TEMPLATE)),
        route("performance", &["dev-team"], Some(PERFORMANCE_TEMPLATE)),
        route("security", &["security"], Some(SECURITY_TEMPLATE)),
        route("business", &["business"], Some(BUSINESS_TEMPLATE)),
        route("support", &["support"], None),
        route("trading", &["trading"], Some(TRADING_TEMPLATE)),
        route("content", &["content"], None),
        route("deck", &["deck-support"], Some(DECK_TEMPLATE)),
    ]
    .into_iter()
    .collect()
}

const CRITICAL_TEMPLATE: &str = "🚨 *ALERTE CRITIQUE*
Événement: {message}
Impact: {impact}
Détails: {details}
Actions requises: {actions}
CC: {mentions}";

const PERFORMANCE_TEMPLATE: &str = "⚠️ *ALERTE PERFORMANCE*
Métrique: {metric}
Valeur: {value}
Seuil: {threshold}
Impact: {impact}
Tendance: {trend}
Actions suggérées: {actions}";

const SECURITY_TEMPLATE: &str = "🔒 *ALERTE SÉCURITÉ*
Type: {type}
Détails: {details}
Impact: {impact}
Mesures prises: {measures}
Actions requises: {actions}";

const BUSINESS_TEMPLATE: &str = "💼 *ALERTE BUSINESS*
Indicateur: {indicator}
Valeur actuelle: {value}
Objectif: {target}
Écart: {gap}
Impact estimé: {impact}
Recommandations: {recommendations}";

const TRADING_TEMPLATE: &str = "🔄 *ALERTE TRADING*
Type: {type}
Volume: {volume}
Tendance: {trend}
Anomalies: {anomalies}
Actions suggérées: {actions}";

const DECK_TEMPLATE: &str = "🎴 *NOTIFICATION DECK*
Événement: {event}
Détails: {details}
Impact: {impact}
Recommandations: {recommendations}";

fn default_subject_template() -> String {
    "[Pokemon TCG] {type} - {summary}".to_string()
}

fn default_dashboard_url() -> String {
    "https://pokemon-tcg.com/admin/monitoring".to_string()
}

fn default_body_template() -> String {
    r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background: #1a237e; color: white; padding: 20px; border-radius: 5px 5px 0 0;">
    <h2 style="margin: 0;">{title}</h2>
    <p style="margin: 5px 0 0 0; opacity: 0.8;">{date}</p>
  </div>
  <div style="background: #fff; padding: 20px; border: 1px solid #e0e0e0;">
    <div style="background: #f5f5f5; padding: 15px; border-radius: 5px; margin-bottom: 20px;">
      <h3 style="color: #1a237e; margin-top: 0;">Résumé</h3>
      <p>{description}</p>
    </div>
    <div style="margin-bottom: 20px;">
      <h3 style="color: #1a237e;">Détails</h3>
      <table style="width: 100%; border-collapse: collapse;">
        <tr><td style="padding: 8px;"><strong>Type:</strong></td><td style="padding: 8px;">{type}</td></tr>
        <tr><td style="padding: 8px;"><strong>Sévérité:</strong></td><td style="padding: 8px;">{severity}</td></tr>
        <tr><td style="padding: 8px;"><strong>Impact:</strong></td><td style="padding: 8px;">{impact}</td></tr>
      </table>
    </div>
    <div style="background: #e3f2fd; padding: 15px; border-radius: 5px; margin-bottom: 20px;">
      <h3 style="color: #1a237e; margin-top: 0;">Données Techniques</h3>
      <pre style="background: #fff; padding: 10px; border-radius: 3px; overflow-x: auto;">{details}</pre>
    </div>
    <div style="background: #e8f5e9; padding: 15px; border-radius: 5px;">
      <h3 style="color: #1a237e; margin-top: 0;">Actions Recommandées</h3>
      <ul style="margin: 0; padding-left: 20px;">{actions}</ul>
    </div>
  </div>
  <div style="background: #f5f5f5; padding: 15px; border-radius: 0 0 5px 5px; font-size: 0.9em; color: #666;">
    <p style="margin: 0;">
      Cet email a été envoyé automatiquement par le système de monitoring de Pokemon TCG Marketplace.<br>
      Pour plus d'informations, consultez le <a href="{dashboardUrl}" style="color: #1a237e;">tableau de bord</a>.
    </p>
  </div>
</div>"#
        .to_string()
}
