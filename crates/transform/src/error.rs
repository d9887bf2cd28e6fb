//! 변환기 에러 타입
//!
//! [`LogTransformError`]는 변환기 구성 및 내부 단계에서 발생하는 에러를 표현합니다.
//! 레코드 단위 변환에서 호출자에게 전파되는 에러는
//! [`TransformError`](siemnorm_core::error::TransformError) 하나뿐이며,
//! 여기 정의된 `Encoding`, `Validation`은 변환기 내부에서 처리되고 로그로만 남습니다.

use siemnorm_core::error::{ConfigError, ParseError, SiemnormError};

/// 변환기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogTransformError {
    /// 패킷 캡처 디코딩 실패
    #[error("encoding error: {field}: {reason}")]
    Encoding {
        /// 디코딩 대상 필드
        field: String,
        /// 실패 사유
        reason: String,
    },

    /// IP 타입 표준 필드의 값이 IP 리터럴이 아님
    #[error("validation error: '{value}' is not an IP literal for {path}")]
    Validation {
        /// 표준 스키마 경로
        path: String,
        /// 원시 값
        value: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<LogTransformError> for SiemnormError {
    fn from(err: LogTransformError) -> Self {
        match err {
            LogTransformError::Config { field, reason } => {
                SiemnormError::Config(ConfigError::InvalidValue { field, reason })
            }
            LogTransformError::Regex(e) => SiemnormError::Config(ConfigError::InvalidValue {
                field: "forwarded_for_pattern".to_owned(),
                reason: e.to_string(),
            }),
            LogTransformError::Encoding { field, reason } => {
                SiemnormError::Parse(ParseError::Decode { field, reason })
            }
            LogTransformError::Validation { path, value } => {
                SiemnormError::Parse(ParseError::InvalidIp { path, value })
            }
        }
    }
}
