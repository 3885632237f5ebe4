//! 애플리케이션 설정 구조체.
//!
//! 웹 서버, 저장소, 모니터링 레지스트리, 알림 채널 설정을 정의한다.
//! 비밀값(토큰, SMTP 계정, JWT 키)은 파일에 두지 않고 환경변수에서만 읽는다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::thresholds::MonitoringConfig;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 서버 설정
    #[serde(default)]
    pub web: WebConfig,
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 임계값 레지스트리
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// 알림 채널 설정
    #[serde(default)]
    pub notifications: NotificationConfig,
}

// ============================================================
// 웹 서버 설정
// ============================================================

/// HTTP 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// 포트 (기본: 8787)
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 외부 접근 허용 여부 (false: 127.0.0.1 only)
    #[serde(default)]
    pub allow_external: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            allow_external: false,
        }
    }
}

// ============================================================
// 저장소 설정
// ============================================================

/// 로컬 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite DB 파일 경로 (None이면 플랫폼 기본 경로)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

// ============================================================
// 알림 채널 설정
// ============================================================

/// 알림 채널 설정 (비밀값 제외)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Slack Web API 기본 URL
    #[serde(default = "default_slack_api_base")]
    pub slack_api_base: String,
    /// Slack 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// SMTP 포트 (STARTTLS)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            slack_api_base: default_slack_api_base(),
            request_timeout_ms: default_request_timeout_ms(),
            smtp_port: default_smtp_port(),
        }
    }
}

/// 알림 채널 비밀값 (환경변수 전용)
#[derive(Clone, Default)]
pub struct NotificationSecrets {
    pub slack_token: Option<String>,
    pub email_host: Option<String>,
    pub email_user: Option<String>,
    pub email_pass: Option<String>,
    pub email_from: Option<String>,
}

impl std::fmt::Debug for NotificationSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSecrets")
            .field("slack_token", &self.slack_token.as_ref().map(|_| "***"))
            .field("email_host", &self.email_host)
            .field("email_user", &self.email_user)
            .field("email_pass", &self.email_pass.as_ref().map(|_| "***"))
            .field("email_from", &self.email_from)
            .finish()
    }
}

impl NotificationSecrets {
    /// `TCGWATCH_SLACK_TOKEN`, `TCGWATCH_EMAIL_{HOST,USER,PASS,FROM}`
    pub fn from_env() -> Self {
        Self {
            slack_token: env_var("TCGWATCH_SLACK_TOKEN"),
            email_host: env_var("TCGWATCH_EMAIL_HOST"),
            email_user: env_var("TCGWATCH_EMAIL_USER"),
            email_pass: env_var("TCGWATCH_EMAIL_PASS"),
            email_from: env_var("TCGWATCH_EMAIL_FROM"),
        }
    }

    /// 이메일 발송에 필요한 값이 모두 있으면 (host, user, pass, from)
    pub fn smtp(&self) -> Option<(&str, &str, &str, &str)> {
        Some((
            self.email_host.as_deref()?,
            self.email_user.as_deref()?,
            self.email_pass.as_deref()?,
            self.email_from.as_deref()?,
        ))
    }
}

/// 호출자 인증 비밀값
#[derive(Clone)]
pub struct AuthSecrets {
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSecrets").field("jwt_secret", &"***").finish()
    }
}

impl AuthSecrets {
    /// `TCGWATCH_JWT_SECRET` 필수
    pub fn from_env() -> Result<Self, CoreError> {
        env_var("TCGWATCH_JWT_SECRET")
            .map(|jwt_secret| Self { jwt_secret })
            .ok_or_else(|| CoreError::Config("TCGWATCH_JWT_SECRET 환경 변수가 없습니다".to_string()))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            web: WebConfig::default(),
            storage: StorageConfig::default(),
            monitoring: MonitoringConfig::default_config(),
            notifications: NotificationConfig::default(),
        }
    }

    /// Slack 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.notifications.request_timeout_ms)
    }

    /// 배치 큐 비우기 주기
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.monitoring.batching.flush_interval_ms)
    }

    /// 실패 거래 점검 주기
    pub fn transaction_check_interval(&self) -> Duration {
        Duration::from_millis(self.monitoring.transactions.check_interval_ms)
    }

    /// 보존 정리 주기
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.monitoring.retention.sweep_interval_ms)
    }

    /// 에러율 표본 주기
    pub fn error_rate_interval(&self) -> Duration {
        Duration::from_millis(self.monitoring.tiers.error_rate_interval_ms)
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_web_port() -> u16 {
    8787
}
fn default_slack_api_base() -> String {
    "https://slack.com/api".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_smtp_port() -> u16 {
    587
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.web.port, 8787);
        assert_eq!(config.notifications.smtp_port, 587);
        assert_eq!(config.flush_interval(), Duration::from_secs(60));
        assert_eq!(config.transaction_check_interval(), Duration::from_secs(3600));
        assert_eq!(config.sweep_interval(), Duration::from_secs(86_400));
    }

    #[test]
    fn smtp_requires_all_fields() {
        let mut secrets = NotificationSecrets {
            email_host: Some("smtp.example.com".to_string()),
            email_user: Some("bot".to_string()),
            email_pass: Some("pw".to_string()),
            ..Default::default()
        };
        assert!(secrets.smtp().is_none());

        secrets.email_from = Some("alerts@pokemon-tcg.com".to_string());
        let (host, _, _, from) = secrets.smtp().unwrap();
        assert_eq!(host, "smtp.example.com");
        assert_eq!(from, "alerts@pokemon-tcg.com");
    }

    #[test]
    fn secrets_are_masked_in_debug() {
        let secrets = NotificationSecrets {
            slack_token: Some("xoxb-secret".to_string()),
            ..Default::default()
        };
        assert!(!format!("{secrets:?}").contains("xoxb-secret"));
    }
}
