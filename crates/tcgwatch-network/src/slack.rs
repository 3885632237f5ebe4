//! Slack 채팅 채널 클라이언트.
//!
//! `ChatNotifier` 포트 구현. Bot 토큰으로 `chat.postMessage`를 호출한다.
//! 재시도하지 않는다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::ports::notifier::ChatNotifier;
use tracing::debug;

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    mrkdwn: bool,
}

/// Slack Web API 응답. HTTP 200이어도 `ok: false`일 수 있다.
#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack 클라이언트: `ChatNotifier` 포트 구현
pub struct SlackClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl SlackClient {
    /// 새 Slack 클라이언트 생성
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// 응답 상태 코드 확인 및 에러 매핑
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, CoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_else(|e| {
            tracing::warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });

        match status.as_u16() {
            401 | 403 => Err(CoreError::Auth(format!("Slack 인증 실패: {text}"))),
            429 => Err(CoreError::Delivery("Slack 요청 한도 초과".to_string())),
            _ => Err(CoreError::Network(format!("Slack API 에러 ({status}): {text}"))),
        }
    }
}

#[async_trait]
impl ChatNotifier for SlackClient {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), CoreError> {
        let url = format!("{}/chat.postMessage", self.api_base);
        let body = PostMessageRequest {
            channel,
            text,
            mrkdwn: true,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("Slack 요청 실패: {e}")))?;

        let parsed: PostMessageResponse = Self::check_response(resp)
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Network(format!("Slack 응답 파싱 실패: {e}")))?;

        if !parsed.ok {
            return Err(CoreError::Delivery(format!(
                "Slack 게시 거부 ({channel}): {}",
                parsed.error.unwrap_or_else(|| "unknown_error".to_string())
            )));
        }

        debug!("Slack 게시 완료: #{channel}");
        Ok(())
    }
}
