//! 호출자가 직접 요청하는 알림 발송 (sendAlertEmail / sendSlackAlert).
//!
//! 배치를 거치지 않고 한 채널로만 보낸다. 인증된 호출자만 쓸 수 있고,
//! 배치 발송과 달리 실패가 호출자에게 `Internal`로 돌아간다.

use std::sync::Arc;
use tcgwatch_core::error::CallError;
use tcgwatch_core::models::alert::AlertPayload;
use tcgwatch_core::models::identity::CallerIdentity;
use tracing::info;

use crate::dispatcher::NotificationDispatcher;

const EMAIL_FAILED: &str = "Erreur lors de l'envoi de l'email";
const CHAT_FAILED: &str = "Erreur lors de l'envoi de l'alerte Slack";

/// 직접 발송 서비스
pub struct DirectAlertService {
    dispatcher: Arc<NotificationDispatcher>,
}

impl DirectAlertService {
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub async fn send_alert_email(
        &self,
        caller: Option<&CallerIdentity>,
        payload: &AlertPayload,
    ) -> Result<(), CallError> {
        let caller = caller.ok_or(CallError::Unauthenticated)?;
        self.dispatcher
            .send_email(payload)
            .await
            .map_err(|e| CallError::internal(EMAIL_FAILED, &e))?;
        info!("직접 이메일 알림 [{}] 요청자={}", payload.alert_type, caller.uid);
        Ok(())
    }

    pub async fn send_slack_alert(
        &self,
        caller: Option<&CallerIdentity>,
        payload: &AlertPayload,
    ) -> Result<(), CallError> {
        let caller = caller.ok_or(CallError::Unauthenticated)?;
        self.dispatcher
            .send_chat(payload)
            .await
            .map_err(|e| CallError::internal(CHAT_FAILED, &e))?;
        info!("직접 채팅 알림 [{}] 요청자={}", payload.alert_type, caller.uid);
        Ok(())
    }
}
