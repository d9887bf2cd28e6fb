//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 레코더(exporter) 설치는 호출자의 책임입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `siemnorm_`
//! - 모듈명: `transform_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(siemnorm_core::metrics::TRANSFORM_RECORDS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 로그 소스 레이블 키 (deepsecurity 등)
pub const LABEL_SOURCE: &str = "source";

// ─── Transform 메트릭 ──────────────────────────────────────────────

/// Transform: 입력된 전체 레코드 수 (counter, label: source)
pub const TRANSFORM_RECORDS_TOTAL: &str = "siemnorm_transform_records_total";

/// Transform: 형식 오류로 건너뛴 레코드 수 (counter, label: source)
pub const TRANSFORM_RECORDS_DROPPED_TOTAL: &str = "siemnorm_transform_records_dropped_total";

/// Transform: 표준 스키마로 매핑된 필드 수 (counter, label: source)
pub const TRANSFORM_FIELDS_MAPPED_TOTAL: &str = "siemnorm_transform_fields_mapped_total";

/// Transform: IP 검증 실패로 매핑을 건너뛴 필드 수 (counter, label: source)
pub const TRANSFORM_INVALID_IP_TOTAL: &str = "siemnorm_transform_invalid_ip_total";

/// Transform: DROPPED로 대체된 값 수 (counter, label: source)
pub const TRANSFORM_VALUES_DROPPED_TOTAL: &str = "siemnorm_transform_values_dropped_total";

/// Transform: 패킷 캡처 디코딩 실패 수 (counter, label: source)
pub const TRANSFORM_PACKET_DECODE_ERRORS_TOTAL: &str =
    "siemnorm_transform_packet_decode_errors_total";

/// Transform: X-Forwarded-For로 source.ip를 덮어쓴 횟수 (counter, label: source)
pub const TRANSFORM_FORWARDED_OVERRIDES_TOTAL: &str =
    "siemnorm_transform_forwarded_overrides_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다. 레코더가 없으면 아무 효과가 없습니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        TRANSFORM_RECORDS_TOTAL,
        "Total number of records handed to a log transform"
    );
    describe_counter!(
        TRANSFORM_RECORDS_DROPPED_TOTAL,
        "Total number of records skipped because of an illegal format"
    );
    describe_counter!(
        TRANSFORM_FIELDS_MAPPED_TOTAL,
        "Total number of raw fields mapped onto the canonical schema"
    );
    describe_counter!(
        TRANSFORM_INVALID_IP_TOTAL,
        "Total number of IP-typed fields left unmapped after failed validation"
    );
    describe_counter!(
        TRANSFORM_VALUES_DROPPED_TOTAL,
        "Total number of values replaced with the DROPPED placeholder"
    );
    describe_counter!(
        TRANSFORM_PACKET_DECODE_ERRORS_TOTAL,
        "Total number of packet capture fields that failed base64 decoding"
    );
    describe_counter!(
        TRANSFORM_FORWARDED_OVERRIDES_TOTAL,
        "Total number of source.ip overrides taken from X-Forwarded-For"
    );
}
