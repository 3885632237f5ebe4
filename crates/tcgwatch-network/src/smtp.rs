//! SMTP 이메일 발송.
//!
//! `EmailNotifier` 포트 구현. 알림 한 건은 모든 수신자를 `To`에 담은
//! 메일 한 통이다 (수신자끼리 서로 보임).

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tcgwatch_core::error::CoreError;
use tcgwatch_core::ports::notifier::{EmailMessage, EmailNotifier};
use tracing::debug;

/// SMTP 접속 정보
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// SMTP 발송기: `EmailNotifier` 포트 구현
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// STARTTLS 릴레이로 발송기 생성 (연결은 첫 발송 때 맺는다)
    pub fn new(settings: &SmtpSettings) -> Result<Self, CoreError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| CoreError::Config(format!("발신 주소 파싱 실패: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| CoreError::Config(format!("SMTP 전송 생성 실패: {e}")))?
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .port(settings.port)
            .build();

        Ok(Self { transport, from })
    }

    /// 포트 메시지를 lettre 메시지로 변환
    pub fn build_message(&self, message: &EmailMessage) -> Result<Message, CoreError> {
        if message.to.is_empty() {
            return Err(CoreError::Validation {
                field: "to".to_string(),
                message: "수신자가 없습니다".to_string(),
            });
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_HTML);

        for recipient in &message.to {
            let mailbox: Mailbox = recipient
                .parse()
                .map_err(|e| CoreError::Delivery(format!("수신 주소 파싱 실패 ({recipient}): {e}")))?;
            builder = builder.to(mailbox);
        }

        builder
            .body(message.html_body.clone())
            .map_err(|e| CoreError::Delivery(format!("이메일 생성 실패: {e}")))
    }
}

#[async_trait]
impl EmailNotifier for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), CoreError> {
        let email = self.build_message(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| CoreError::Delivery(format!("이메일 발송 실패: {e}")))?;

        debug!("이메일 발송 완료: {} ({})", message.subject, message.to_header());
        Ok(())
    }
}
