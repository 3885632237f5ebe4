//! 알림 디스패처.
//!
//! 알림 종류로 라우트(채널, 수신자, 템플릿)를 찾아 메시지를 렌더링하고
//! 채팅/이메일로 보낸다. 두 채널 발송은 동시에 진행하며 실패는 로그만
//! 남기고 재시도하지 않는다.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::models::alert::AlertPayload;
use tcgwatch_core::ports::clock::{Clock, SystemClock};
use tcgwatch_core::ports::notifier::{ChatNotifier, EmailMessage, EmailNotifier};
use tcgwatch_core::template::{self, TemplateValues, CHAT_PLACEHOLDERS, EMAIL_PLACEHOLDERS};
use tcgwatch_core::thresholds::{MonitoringConfig, NotificationRoute, DEFAULT_CHAT_TEMPLATE};
use tracing::{debug, error};

/// 이메일 본문 날짜 형식
const EMAIL_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// 양 채널 발송 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub chat_delivered: bool,
    pub email_delivered: bool,
}

/// 알림 디스패처
pub struct NotificationDispatcher {
    registry: Arc<MonitoringConfig>,
    chat: Arc<dyn ChatNotifier>,
    email: Arc<dyn EmailNotifier>,
    clock: Arc<dyn Clock>,
}

impl NotificationDispatcher {
    pub fn new(
        registry: Arc<MonitoringConfig>,
        chat: Arc<dyn ChatNotifier>,
        email: Arc<dyn EmailNotifier>,
    ) -> Self {
        Self {
            registry,
            chat,
            email,
            clock: Arc::new(SystemClock),
        }
    }

    /// 이메일 날짜에 쓸 시계 교체
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn route(&self, alert_type: &str) -> Result<&NotificationRoute, CoreError> {
        self.registry
            .route(alert_type)
            .ok_or_else(|| CoreError::NotFound {
                resource_type: "NotificationRoute".to_string(),
                id: alert_type.to_string(),
            })
    }

    /// 채팅 채널 이름과 본문
    pub fn render_chat(&self, payload: &AlertPayload) -> Result<(String, String), CoreError> {
        let route = self.route(&payload.alert_type)?;
        let meta = payload.metadata.as_ref();

        let mut values = TemplateValues::new();
        values
            .set("message", payload.message.as_str())
            .set("details", details_text(payload.details.as_ref()))
            .set("type", payload.alert_type.as_str());
        let mut content = vec!["message", "details"];
        for name in [
            "metric", "value", "impact", "actions", "mentions", "threshold", "trend", "measures",
        ] {
            if let Some(text) = meta_text(meta, name) {
                values.set(name, text);
                content.push(name);
            }
        }

        // 라우트 템플릿이 이 알림의 내용을 하나도 담지 못하면 기본 템플릿으로
        let shows_content = content
            .iter()
            .any(|name| route.template.contains(&format!("{{{name}}}")));
        let template = if shows_content {
            route.template.as_str()
        } else {
            DEFAULT_CHAT_TEMPLATE
        };

        let text = template::render(template, CHAT_PLACEHOLDERS, &values);
        Ok((route.channel.clone(), text))
    }

    /// 모든 수신자를 담은 이메일 한 통
    pub fn render_email(&self, payload: &AlertPayload) -> Result<EmailMessage, CoreError> {
        let route = self.route(&payload.alert_type)?;
        if route.recipients.is_empty() {
            return Err(CoreError::Config(format!(
                "이메일 수신자 없음: {}",
                payload.alert_type
            )));
        }
        let meta = payload.metadata.as_ref();
        let upper = payload.alert_type.to_uppercase();
        let templates = &self.registry.email;

        let mut subject_values = TemplateValues::new();
        subject_values
            .set("type", upper.as_str())
            .set("summary", payload.message.as_str());

        let mut body_values = TemplateValues::new();
        body_values
            .set("title", format!("Alerte {upper}"))
            .set("type", payload.alert_type.as_str())
            .set("date", format_date(self.clock.now()))
            .set("description", payload.message.as_str())
            .set("details", details_text(payload.details.as_ref()))
            .set("dashboardUrl", templates.dashboard_url.as_str());
        if let Some(severity) = meta_text(meta, "severity") {
            body_values.set("severity", severity);
        }
        if let Some(impact) = meta_text(meta, "impact") {
            body_values.set("impact", impact);
        }
        if let Some(actions) = meta.and_then(|m| m.get("actions")) {
            body_values.set("actions", actions_html(actions));
        }

        Ok(EmailMessage {
            to: route.recipients.clone(),
            subject: template::render(&templates.subject_template, EMAIL_PLACEHOLDERS, &subject_values),
            html_body: template::render(&templates.body_template, EMAIL_PLACEHOLDERS, &body_values),
        })
    }

    /// 채팅 채널로 발송
    pub async fn send_chat(&self, payload: &AlertPayload) -> Result<(), CoreError> {
        let (channel, text) = self.render_chat(payload)?;
        self.chat.post_message(&channel, &text).await?;
        debug!("채팅 알림 발송: #{channel} [{}]", payload.alert_type);
        Ok(())
    }

    /// 이메일로 발송
    pub async fn send_email(&self, payload: &AlertPayload) -> Result<(), CoreError> {
        let message = self.render_email(payload)?;
        self.email.send(&message).await?;
        debug!(
            "이메일 알림 발송: {} → {}",
            payload.alert_type,
            message.to_header()
        );
        Ok(())
    }

    /// 두 채널에 동시에 발송. 한쪽 실패가 다른 쪽을 막지 않는다.
    pub async fn dispatch_both(&self, payload: &AlertPayload) -> DispatchOutcome {
        let (chat, email) = tokio::join!(self.send_chat(payload), self.send_email(payload));
        DispatchOutcome {
            chat_delivered: log_failure("채팅", payload, chat),
            email_delivered: log_failure("이메일", payload, email),
        }
    }

    /// 채팅 채널에만 발송
    pub async fn dispatch_chat_only(&self, payload: &AlertPayload) -> DispatchOutcome {
        let chat = self.send_chat(payload).await;
        DispatchOutcome {
            chat_delivered: log_failure("채팅", payload, chat),
            email_delivered: false,
        }
    }
}

fn log_failure(channel: &str, payload: &AlertPayload, result: Result<(), CoreError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            error!(
                "{channel} 알림 발송 실패 [{}] {}: {e}",
                payload.alert_type, payload.message
            );
            false
        }
    }
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format(EMAIL_DATE_FORMAT).to_string()
}

/// details는 들여쓰기 JSON, 없으면 빈 문자열
fn details_text(details: Option<&Value>) -> String {
    match details {
        None | Some(Value::Null) => String::new(),
        Some(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
    }
}

/// 메타데이터 값을 템플릿 문자열로
fn meta_text(meta: Option<&Map<String, Value>>, key: &str) -> Option<String> {
    match meta?.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

/// 이메일 본문의 `<ul>` 안에 들어갈 항목
fn actions_html(actions: &Value) -> String {
    match actions {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => format!("<li>{s}</li>"),
                other => format!("<li>{other}</li>"),
            })
            .collect(),
        Value::String(s) => format!("<li>{s}</li>"),
        Value::Null => String::new(),
        other => format!("<li>{other}</li>"),
    }
}
