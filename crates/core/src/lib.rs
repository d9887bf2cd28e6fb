//! siemnorm 공통 크레이트
//!
//! 로그 소스별 변환기가 공유하는 레코드 모델, 경로 연산, 에러 타입, 설정을 제공합니다.
//!
//! # 모듈 구성
//!
//! - [`record`]: 중첩 레코드 모델 ([`Node`])과 경로 조회/생성/병합/삭제
//! - [`pipeline`]: 로그 소스별 변환 trait ([`LogTransform`])
//! - [`error`]: 도메인 에러 타입
//! - [`config`]: `siemnorm.toml` 설정
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod record;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, ParseError, SiemnormError, TransformError};

// 설정
pub use config::{DeepSecurityConfig, GeneralConfig, SiemnormConfig};

// 변환 trait
pub use pipeline::LogTransform;

// 레코드
pub use record::{BuildOutcome, DROPPED, Node, Record};
