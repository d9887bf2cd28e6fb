//! 설정 관리 -- siemnorm.toml 파싱 및 런타임 설정
//!
//! [`SiemnormConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SIEMNORM_DEEPSECURITY_PACKET_DATA_FIELD=...` 형식)
//! 3. 설정 파일 (`siemnorm.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), siemnorm_core::error::SiemnormError> {
//! use siemnorm_core::config::SiemnormConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SiemnormConfig::load("siemnorm.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SiemnormConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SiemnormError};

/// 허용하는 message 크기 상한 (64MB)
pub const MAX_MESSAGE_BYTES_LIMIT: usize = 64 * 1024 * 1024;

/// siemnorm 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiemnormConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// Deep Security 변환 설정
    #[serde(default)]
    pub deepsecurity: DeepSecurityConfig,
}

impl SiemnormConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SiemnormError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값으로 대체하여 로드합니다.
    ///
    /// 파일이 존재하지만 파싱에 실패하면 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SiemnormError> {
        match Self::load(path.as_ref()).await {
            Err(SiemnormError::Config(ConfigError::FileNotFound { path })) => {
                warn!(path = %path, "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SiemnormError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SiemnormError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SiemnormError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SiemnormError> {
        toml::from_str(toml_str).map_err(|e| {
            SiemnormError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SIEMNORM_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SIEMNORM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SIEMNORM_GENERAL_LOG_FORMAT");

        // Deep Security
        override_string(
            &mut self.deepsecurity.packet_data_field,
            "SIEMNORM_DEEPSECURITY_PACKET_DATA_FIELD",
        );
        override_csv(
            &mut self.deepsecurity.tenant_fields,
            "SIEMNORM_DEEPSECURITY_TENANT_FIELDS",
        );
        override_string(
            &mut self.deepsecurity.device_address_field,
            "SIEMNORM_DEEPSECURITY_DEVICE_ADDRESS_FIELD",
        );
        override_bool(
            &mut self.deepsecurity.rewrite_ids_reset,
            "SIEMNORM_DEEPSECURITY_REWRITE_IDS_RESET",
        );
        override_bool(
            &mut self.deepsecurity.decode_packet_data,
            "SIEMNORM_DEEPSECURITY_DECODE_PACKET_DATA",
        );
        override_usize(
            &mut self.deepsecurity.max_message_bytes,
            "SIEMNORM_DEEPSECURITY_MAX_MESSAGE_BYTES",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SiemnormError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.deepsecurity.packet_data_field.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "deepsecurity.packet_data_field".to_owned(),
                reason: "field name must not be empty".to_owned(),
            }
            .into());
        }

        if self.deepsecurity.device_address_field.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "deepsecurity.device_address_field".to_owned(),
                reason: "field name must not be empty".to_owned(),
            }
            .into());
        }

        if self.deepsecurity.tenant_fields.iter().any(|f| f.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "deepsecurity.tenant_fields".to_owned(),
                reason: "field names must not be empty".to_owned(),
            }
            .into());
        }

        let max = self.deepsecurity.max_message_bytes;
        if max == 0 || max > MAX_MESSAGE_BYTES_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "deepsecurity.max_message_bytes".to_owned(),
                reason: format!("must be 1-{MAX_MESSAGE_BYTES_LIMIT}"),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// Deep Security 변환 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepSecurityConfig {
    /// base64 패킷 캡처가 담긴 원시 필드
    pub packet_data_field: String,
    /// 표준 스키마에 속하지 않아 항상 제거하는 테넌트 식별 필드
    pub tenant_fields: Vec<String>,
    /// source.ip 대체에 사용하는 장비 주소 필드
    pub device_address_field: String,
    /// `IDS:Reset` 액션을 `DetectOnly:NotReset`으로 재작성할지 여부
    pub rewrite_ids_reset: bool,
    /// 패킷 캡처 디코딩 여부
    pub decode_packet_data: bool,
    /// 허용하는 최대 message 크기 (바이트)
    pub max_message_bytes: usize,
}

impl Default for DeepSecurityConfig {
    fn default() -> Self {
        Self {
            packet_data_field: "TrendMicroDsPacketData".to_owned(),
            tenant_fields: vec![
                "TrendMicroDsTenant".to_owned(),
                "TrendMicroDsTenantId".to_owned(),
            ],
            device_address_field: "dvc".to_owned(),
            rewrite_ids_reset: true,
            decode_packet_data: true,
            max_message_bytes: 1024 * 1024, // 1MB
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
