//! siemnorm 로그 소스별 변환기
//!
//! 벤더 고유 형식의 보안 이벤트를 공통 중첩 스키마로 정규화합니다.
//! 현재는 Trend Micro Deep Security IPS 이벤트를 지원합니다.
//!
//! # 모듈 구성
//!
//! - [`kv`]: `k=v` 속성 본문 파서 (`\=` 이스케이프, 여러 단어 값)
//! - [`schema`]: 정적 매핑 테이블 기반 표준 스키마 매핑, IP 검증, 장비 주소 대체
//! - [`packet`]: base64 패킷 캡처 디코딩, 쿠키 제거, X-Forwarded-For 추출
//! - [`deepsecurity`]: 전체 변환 오케스트레이션 ([`LogTransform`](siemnorm_core::LogTransform) 구현)
//! - [`config`]: 변환기 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! message -> header split -> KeyValueParser -> act rewrite -> SchemaMapper -> PacketPostProcessor -> tenant cleanup
//!               |                 |                               |                  |
//!         agent/rule/event    top-level keys              canonical paths      source.ip override
//! ```
//!
//! # 사용 예시
//! ```
//! use serde_json::json;
//! use siemnorm_core::{LogTransform, Node};
//! use siemnorm_transform::DeepSecurityTransform;
//!
//! let transform = DeepSecurityTransform::new(Default::default()).unwrap();
//! let mut record = Node::from(json!({
//!     "message": "CEF:0|Trend Micro|Deep Security Agent|20.0|1001|Rule|6|src=1.1.1.1 act=Log"
//! }));
//! let out = transform.transform(&mut record).unwrap();
//! assert_eq!(out.resolve("source.ip"), Some(&Node::from("1.1.1.1")));
//! ```

pub mod config;
pub mod deepsecurity;
pub mod error;
pub mod kv;
pub mod packet;
pub mod schema;

// --- 주요 타입 re-export ---

// 변환기
pub use deepsecurity::DeepSecurityTransform;

// 설정
pub use config::{TransformConfig, TransformConfigBuilder};

// 에러
pub use error::LogTransformError;

// 속성 파서
pub use kv::{AttributeTable, KeyValueParser};

// 스키마 매핑
pub use schema::{DEEPSECURITY_MAPPING, MappingReport, SchemaMapper, SchemaMappingTable};

// 패킷 캡처
pub use packet::{PacketCapturePostProcessor, PacketReport};
