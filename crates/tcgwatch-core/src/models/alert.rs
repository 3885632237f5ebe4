//! 알림 모델.
//!
//! - [`AlertRecord`]: 임계값 초과 시 남기는 로그 레코드 (변경 불가)
//! - [`AlertQueueEntry`]: 배치 큐에 잠시 머무는 인메모리 항목
//! - [`AlertPayload`]: 알림 채널로 보낼 메시지 한 건

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 저장되는 알림의 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Critical,
    Performance,
    Security,
    Error,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Performance => "performance",
            Self::Security => "security",
            Self::Error => "error",
        }
    }

    /// 저장소 문자열에서 복원
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "performance" => Some(Self::Performance),
            "security" => Some(Self::Security),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 저장되는 알림의 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// 임계값 초과 로그
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// 저장소가 부여한 ID (저장 전에는 None)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub details: Map<String, Value>,
    /// 원인 레코드의 시각 이상
    pub timestamp: DateTime<Utc>,
}

/// 배치 큐 심각도. 선언 순서가 곧 우선순위다 (low < medium < high < critical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl QueueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl From<AlertSeverity> for QueueSeverity {
    fn from(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Warning => Self::Medium,
            AlertSeverity::Critical => Self::Critical,
        }
    }
}

impl fmt::Display for QueueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 배치 큐 항목. 프로세스 재시작 시 유실된다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertQueueEntry {
    /// 그룹화 키 (예: "performance", "error_rate")
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub severity: QueueSeverity,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    pub timestamp: DateTime<Utc>,
}

impl AlertQueueEntry {
    pub fn new(kind: impl Into<String>, message: impl Into<String>, severity: QueueSeverity) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            severity,
            metadata: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl From<&AlertRecord> for AlertQueueEntry {
    fn from(record: &AlertRecord) -> Self {
        Self {
            kind: record.alert_type.as_str().to_string(),
            message: record.message.clone(),
            severity: record.severity.into(),
            metadata: Some(record.details.clone()),
            timestamp: record.timestamp,
        }
    }
}

/// 채널로 보낼 알림 (sendSlackAlert / sendAlertEmail 입력)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// 라우팅 키 (critical, performance, security, business, ...)
    #[serde(rename = "type")]
    pub alert_type: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<Value>,
    /// 템플릿 보조 값 (metric, value, impact, actions, mentions, ...)
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl AlertPayload {
    pub fn new(alert_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            alert_type: alert_type.into(),
            message: message.into(),
            details: None,
            metadata: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
