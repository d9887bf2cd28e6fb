//! 변환기 설정
//!
//! [`TransformConfig`]는 core의 [`DeepSecurityConfig`](siemnorm_core::config::DeepSecurityConfig)를
//! 기반으로 Deep Security 변환기의 런타임 설정을 제공합니다.
//!
//! # 사용 예시
//! ```
//! use siemnorm_core::config::SiemnormConfig;
//! use siemnorm_transform::config::TransformConfig;
//!
//! let core_config = SiemnormConfig::default();
//! let config = TransformConfig::from_core(&core_config.deepsecurity);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use siemnorm_core::config::{DeepSecurityConfig, MAX_MESSAGE_BYTES_LIMIT};

use crate::error::LogTransformError;

/// Deep Security 변환기 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// 패킷 캡처 필드명
    pub packet_data_field: String,
    /// 마지막에 제거하는 테넌트 필드 목록
    pub tenant_fields: Vec<String>,
    /// source.ip 대체에 사용하는 장비 주소 필드
    pub device_address_field: String,
    /// `IDS:Reset` 재작성 여부
    pub rewrite_ids_reset: bool,
    /// 패킷 캡처 디코딩 여부
    pub decode_packet_data: bool,
    /// 최대 message 크기 (바이트)
    pub max_message_bytes: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self::from_core(&DeepSecurityConfig::default())
    }
}

impl TransformConfig {
    /// core의 `DeepSecurityConfig`에서 변환기 설정을 생성합니다.
    pub fn from_core(core: &DeepSecurityConfig) -> Self {
        Self {
            packet_data_field: core.packet_data_field.clone(),
            tenant_fields: core.tenant_fields.clone(),
            device_address_field: core.device_address_field.clone(),
            rewrite_ids_reset: core.rewrite_ids_reset,
            decode_packet_data: core.decode_packet_data,
            max_message_bytes: core.max_message_bytes,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogTransformError> {
        if self.packet_data_field.trim().is_empty() {
            return Err(LogTransformError::Config {
                field: "packet_data_field".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.device_address_field.trim().is_empty() {
            return Err(LogTransformError::Config {
                field: "device_address_field".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.max_message_bytes == 0 || self.max_message_bytes > MAX_MESSAGE_BYTES_LIMIT {
            return Err(LogTransformError::Config {
                field: "max_message_bytes".to_owned(),
                reason: format!("must be 1-{}", MAX_MESSAGE_BYTES_LIMIT),
            });
        }

        if self.tenant_fields.iter().any(|f| f.is_empty()) {
            return Err(LogTransformError::Config {
                field: "tenant_fields".to_owned(),
                reason: "field names must not be empty".to_owned(),
            });
        }

        Ok(())
    }
}

/// 변환기 설정 빌더
#[derive(Debug, Default)]
pub struct TransformConfigBuilder {
    config: TransformConfig,
}

impl TransformConfigBuilder {
    /// 기본값으로 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 패킷 캡처 필드명을 설정합니다.
    pub fn packet_data_field(mut self, field: impl Into<String>) -> Self {
        self.config.packet_data_field = field.into();
        self
    }

    /// 테넌트 필드 목록을 설정합니다.
    pub fn tenant_fields(mut self, fields: Vec<String>) -> Self {
        self.config.tenant_fields = fields;
        self
    }

    /// 장비 주소 필드를 설정합니다.
    pub fn device_address_field(mut self, field: impl Into<String>) -> Self {
        self.config.device_address_field = field.into();
        self
    }

    /// `IDS:Reset` 재작성 여부를 설정합니다.
    pub fn rewrite_ids_reset(mut self, enabled: bool) -> Self {
        self.config.rewrite_ids_reset = enabled;
        self
    }

    /// 패킷 캡처 디코딩 여부를 설정합니다.
    pub fn decode_packet_data(mut self, enabled: bool) -> Self {
        self.config.decode_packet_data = enabled;
        self
    }

    /// 최대 message 크기를 설정합니다.
    pub fn max_message_bytes(mut self, bytes: usize) -> Self {
        self.config.max_message_bytes = bytes;
        self
    }

    /// 설정을 검증하고 `TransformConfig`를 생성합니다.
    pub fn build(self) -> Result<TransformConfig, LogTransformError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
