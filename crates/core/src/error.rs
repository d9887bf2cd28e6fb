//! 에러 타입 -- 도메인별 에러 정의

/// siemnorm 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SiemnormError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 레코드 변환 에러
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// 필드 값 해석 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 필드 값 해석 에러
///
/// 변환 중에는 내부에서 처리되고 로그로만 남습니다.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 인코딩된 필드 디코딩 실패
    #[error("failed to decode {field}: {reason}")]
    Decode { field: String, reason: String },

    /// IP 리터럴이 아닌 값
    #[error("'{value}' is not an IP literal for {path}")]
    InvalidIp { path: String, value: String },
}

/// 레코드 변환 에러
///
/// 변환기가 호출자에게 전파하는 유일한 실패는 입력 형식 오류입니다.
/// 호출자는 이를 "레코드 건너뛰기" 신호로 취급해야 합니다.
/// 디코딩 실패, IP 검증 실패, 값 대체는 변환기 내부에서 처리되며 전파되지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// 헤더 세그먼트 부족 또는 메시지 필드 누락
    #[error("illegal format: {reason} (segments: {segments}, expected at least {expected})")]
    Format {
        /// 실제 세그먼트 수
        segments: usize,
        /// 필요한 최소 세그먼트 수
        expected: usize,
        /// 실패 사유
        reason: String,
    },
}

impl TransformError {
    /// 레코드를 건너뛰어야 하는 에러인지 여부
    pub fn is_drop(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_display() {
        let err = TransformError::Format {
            segments: 3,
            expected: 8,
            reason: "too few header segments".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("illegal format"));
        assert!(msg.contains('3'));
        assert!(msg.contains('8'));
        assert!(err.is_drop());
    }

    #[test]
    fn converts_to_top_level_error() {
        let err = TransformError::Format {
            segments: 0,
            expected: 8,
            reason: "missing message".to_owned(),
        };
        let top: SiemnormError = err.into();
        assert!(matches!(top, SiemnormError::Transform(_)));
    }

    #[test]
    fn parse_error_converts_to_top_level_error() {
        let err = ParseError::Decode {
            field: "TrendMicroDsPacketData".to_owned(),
            reason: "Invalid padding".to_owned(),
        };
        let top: SiemnormError = err.into();
        assert!(matches!(top, SiemnormError::Parse(_)));
        assert!(!top.to_string().contains("config"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "general.log_level".to_owned(),
            reason: "must be one of: info".to_owned(),
        };
        assert!(err.to_string().contains("general.log_level"));
    }
}
