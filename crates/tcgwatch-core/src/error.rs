//! TCGWatch 핵심 에러 타입.
//!
//! 어댑터 crate는 라이브러리 에러를 `CoreError`로 매핑하고,
//! 호출자에게 노출되는 경계에서는 [`CallError`]로 축약한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류 (임계값 누락, 잘못된 시간 창 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 저장소 읽기/쓰기 실패
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 알림 채널 전달 실패 (Slack 응답 ok=false, SMTP 거부 등)
    #[error("알림 전달 실패: {0}")]
    Delivery(String),

    /// 인증 실패 (토큰 서명 불일치, 만료 등)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "NotificationRoute")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 호출 가능한 연산(recordPerformance 등)이 호출자에게 돌려주는 에러.
///
/// 호출자는 두 가지 종류만 구분한다. 임계값 조회 실패나 비치명 분류는
/// 에러가 아니라 조용한 건너뛰기로 처리되므로 여기에 나타나지 않는다.
#[derive(Debug, Error)]
pub enum CallError {
    /// 호출자 식별 정보가 필요한데 없음
    #[error("Authentification requise")]
    Unauthenticated,

    /// 저장 또는 전달 실패
    #[error("{0}")]
    Internal(String),
}

impl CallError {
    /// 원인 에러를 로그에 남긴 뒤 호출자용 메시지로 감싼다.
    pub fn internal(message: impl Into<String>, cause: &CoreError) -> Self {
        let message = message.into();
        tracing::error!("{message}: {cause}");
        Self::Internal(message)
    }
}

impl From<CoreError> for CallError {
    fn from(err: CoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_maps_to_internal() {
        let err: CallError = CoreError::Storage("디스크 가득 참".to_string()).into();
        assert!(matches!(err, CallError::Internal(ref m) if m.contains("디스크 가득 참")));
    }

    #[test]
    fn internal_keeps_caller_message_only() {
        let cause = CoreError::Storage("UNIQUE constraint failed".to_string());
        let err = CallError::internal("Erreur lors de l'enregistrement des métriques", &cause);
        assert_eq!(
            err.to_string(),
            "Erreur lors de l'enregistrement des métriques"
        );
    }

    #[test]
    fn unauthenticated_message() {
        assert_eq!(
            CallError::Unauthenticated.to_string(),
            "Authentification requise"
        );
    }
}
