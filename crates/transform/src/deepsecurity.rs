//! Deep Security IPS 이벤트 변환기
//!
//! Deep Security는 `|`로 구분된 CEF 스타일 헤더 뒤에 key=value 속성 본문을 붙여 이벤트를 보냅니다.
//!
//! ```text
//! CEF:0|Trend Micro|Deep Security Agent|20.0|1000123|Rule name|6|src=1.1.1.1 dst=2.2.2.2 act=Reset
//! ```
//!
//! # 변환 순서
//! 1. `message`를 `|`로 분할 (8개 미만이면 건너뛰기)
//! 2. 헤더 → `agent.name`, `rule.name`, `event.severity`
//! 3. 속성 본문 → 레코드 최상위 키
//! 4. `act`의 `IDS:Reset` → `DetectOnly:NotReset`
//! 5. 표준 스키마 매핑 및 장비 주소 대체
//! 6. 패킷 캡처 후처리
//! 7. 테넌트 필드 제거
//!
//! 헤더 분할은 단순 분할이므로 헤더 값 안에 `|`가 있으면 세그먼트가 밀립니다.
//! 8번째 이후 세그먼트는 무시합니다.

use metrics::counter;
use siemnorm_core::config::DeepSecurityConfig;
use siemnorm_core::error::TransformError;
use siemnorm_core::metrics as m;
use siemnorm_core::pipeline::LogTransform;
use siemnorm_core::record::{Node, Record};
use tracing::{debug, warn};

use crate::config::TransformConfig;
use crate::error::LogTransformError;
use crate::kv::KeyValueParser;
use crate::packet::{PacketCapturePostProcessor, PacketReport};
use crate::schema::{DEEPSECURITY_MAPPING, MappingReport, SchemaMapper};

/// 로그 소스 이름
pub const SOURCE_NAME: &str = "deepsecurity";

/// 원시 이벤트 텍스트 필드
pub const MESSAGE_FIELD: &str = "message";

/// 헤더 세그먼트 최소 개수
const MIN_SEGMENTS: usize = 8;

/// 속성 본문 세그먼트 위치
const ATTRIBUTE_SEGMENT: usize = 7;

/// 오해를 부르는 액션 표기와 그 대체값
const IDS_RESET: &str = "IDS:Reset";
const IDS_RESET_REPLACEMENT: &str = "DetectOnly:NotReset";

/// 액션 필드
const ACTION_FIELD: &str = "act";

/// Deep Security 변환기
///
/// 생성 후 불변이며 여러 스레드에서 공유할 수 있습니다.
#[derive(Debug, Clone)]
pub struct DeepSecurityTransform {
    config: TransformConfig,
    parser: KeyValueParser,
    mapper: SchemaMapper,
    packet: PacketCapturePostProcessor,
}

impl DeepSecurityTransform {
    /// 설정을 검증하고 변환기를 생성합니다.
    pub fn new(config: TransformConfig) -> Result<Self, LogTransformError> {
        config.validate()?;
        let mapper = SchemaMapper::new(DEEPSECURITY_MAPPING, config.device_address_field.clone());
        let packet = PacketCapturePostProcessor::new(
            config.packet_data_field.clone(),
            config.decode_packet_data,
        )?;

        Ok(Self {
            config,
            parser: KeyValueParser::new(),
            mapper,
            packet,
        })
    }

    /// core 설정 섹션으로 변환기를 생성합니다.
    pub fn from_core(core: &DeepSecurityConfig) -> Result<Self, LogTransformError> {
        Self::new(TransformConfig::from_core(core))
    }

    /// 현재 설정
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// 레코드를 건너뛰는 형식 오류를 기록하고 생성합니다.
    fn reject(&self, segments: usize, reason: &str) -> TransformError {
        warn!(segments, expected = MIN_SEGMENTS, reason, "illegal format");
        counter!(m::TRANSFORM_RECORDS_DROPPED_TOTAL, m::LABEL_SOURCE => SOURCE_NAME).increment(1);
        TransformError::Format {
            segments,
            expected: MIN_SEGMENTS,
            reason: reason.to_owned(),
        }
    }

    /// 헤더 세그먼트를 agent/rule/event 필드로 기록합니다.
    fn apply_header(record: &mut Record, segments: &[&str]) {
        record.set_path("agent.name", Node::Text(segments[1..4].join(" ")));
        record.set_path("rule.name", Node::Text(segments[4..6].join(" ")));
        record.set_path("event.severity", Node::from(segments[6]));
    }

    /// 속성 본문을 파싱하여 레코드 최상위에 기록하고 속성 수를 반환합니다.
    fn apply_attributes(&self, record: &mut Record, body: &str) -> usize {
        let table = self.parser.parse(body);
        let count = table.len();
        for (key, value) in table {
            record.insert(key, Node::Text(value));
        }
        count
    }

    /// `act` 값의 `IDS:Reset`을 `DetectOnly:NotReset`으로 바꿉니다.
    fn rewrite_action(&self, record: &mut Record) {
        if !self.config.rewrite_ids_reset {
            return;
        }
        if let Some(Node::Text(action)) = record.get_mut(ACTION_FIELD) {
            if action.contains(IDS_RESET) {
                *action = action.replace(IDS_RESET, IDS_RESET_REPLACEMENT);
            }
        }
    }

    fn record_metrics(mapping: &MappingReport, packet: &PacketReport) {
        counter!(m::TRANSFORM_FIELDS_MAPPED_TOTAL, m::LABEL_SOURCE => SOURCE_NAME)
            .increment(mapping.mapped as u64);
        counter!(m::TRANSFORM_INVALID_IP_TOTAL, m::LABEL_SOURCE => SOURCE_NAME)
            .increment(mapping.skipped_invalid_ip as u64);
        counter!(m::TRANSFORM_VALUES_DROPPED_TOTAL, m::LABEL_SOURCE => SOURCE_NAME)
            .increment(mapping.dropped as u64);
        if packet.decode_failed {
            counter!(m::TRANSFORM_PACKET_DECODE_ERRORS_TOTAL, m::LABEL_SOURCE => SOURCE_NAME)
                .increment(1);
        }
        if packet.forwarded_for.is_some() {
            counter!(m::TRANSFORM_FORWARDED_OVERRIDES_TOTAL, m::LABEL_SOURCE => SOURCE_NAME)
                .increment(1);
        }
    }
}

impl LogTransform for DeepSecurityTransform {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    fn transform<'r>(&self, record: &'r mut Record) -> Result<&'r mut Record, TransformError> {
        counter!(m::TRANSFORM_RECORDS_TOTAL, m::LABEL_SOURCE => SOURCE_NAME).increment(1);

        let message = match record.get(MESSAGE_FIELD).and_then(Node::as_str) {
            Some(message) => message.to_owned(),
            None => return Err(self.reject(0, "missing or non-string message")),
        };

        if message.len() > self.config.max_message_bytes {
            return Err(self.reject(
                0,
                &format!(
                    "message size {} exceeds maximum {}",
                    message.len(),
                    self.config.max_message_bytes
                ),
            ));
        }

        let segments: Vec<&str> = message.split('|').collect();
        if segments.len() < MIN_SEGMENTS {
            return Err(self.reject(segments.len(), "too few header segments"));
        }

        Self::apply_header(record, &segments);
        let attributes = self.apply_attributes(record, segments[ATTRIBUTE_SEGMENT]);
        self.rewrite_action(record);

        let mapping = self.mapper.map(record);
        let packet = self.packet.process(record);

        for field in &self.config.tenant_fields {
            record.remove(field);
        }

        Self::record_metrics(&mapping, &packet);
        debug!(
            attributes,
            mapped = mapping.mapped,
            skipped_invalid_ip = mapping.skipped_invalid_ip,
            device_fallback = mapping.device_fallback,
            packet = packet.present,
            "deepsecurity record transformed"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transform() -> DeepSecurityTransform {
        DeepSecurityTransform::new(TransformConfig::default()).unwrap()
    }

    fn record(message: &str) -> Record {
        Node::from(json!({ "message": message }))
    }

    const SAMPLE: &str = "CEF:0|Trend Micro|Deep Security Agent|20.0|1000123|SQL Injection|6|\
                          src=1.1.1.1 dst=2.2.2.2 act=IDS:Reset";

    #[test]
    fn source_name_is_deepsecurity() {
        assert_eq!(transform().source_name(), "deepsecurity");
    }

    #[test]
    fn header_fields_are_written() {
        let mut rec = record(SAMPLE);
        let out = transform().transform(&mut rec).unwrap();
        assert_eq!(
            out.resolve("agent.name"),
            Some(&Node::from("Trend Micro Deep Security Agent 20.0"))
        );
        assert_eq!(
            out.resolve("rule.name"),
            Some(&Node::from("1000123 SQL Injection"))
        );
        assert_eq!(out.resolve("event.severity"), Some(&Node::from("6")));
    }

    #[test]
    fn reset_action_is_rewritten_and_mapped() {
        let mut rec = record(SAMPLE);
        let out = transform().transform(&mut rec).unwrap();
        assert_eq!(
            out.resolve("event.action"),
            Some(&Node::from("DetectOnly:NotReset"))
        );
        assert_eq!(out.get("act"), None);
    }

    #[test]
    fn rewrite_can_be_disabled() {
        let config = TransformConfig {
            rewrite_ids_reset: false,
            ..Default::default()
        };
        let transform = DeepSecurityTransform::new(config).unwrap();
        let mut rec = record(SAMPLE);
        let out = transform.transform(&mut rec).unwrap();
        assert_eq!(out.resolve("event.action"), Some(&Node::from("IDS:Reset")));
    }

    #[test]
    fn too_few_segments_is_format_error() {
        let mut rec = record("CEF:0|a|b|c");
        let err = transform().transform(&mut rec).unwrap_err();
        assert!(err.is_drop());
        assert!(matches!(
            err,
            TransformError::Format {
                segments: 4,
                expected: 8,
                ..
            }
        ));
    }

    #[test]
    fn missing_message_is_format_error() {
        let mut rec = Node::from(json!({"other": "x"}));
        assert!(transform().transform(&mut rec).is_err());

        let mut rec = Node::from(json!({"message": 12}));
        assert!(transform().transform(&mut rec).is_err());
    }

    #[test]
    fn oversized_message_is_format_error() {
        let config = TransformConfig {
            max_message_bytes: 16,
            ..Default::default()
        };
        let transform = DeepSecurityTransform::new(config).unwrap();
        let mut rec = record(SAMPLE);
        assert!(transform.transform(&mut rec).unwrap_err().is_drop());
    }

    #[test]
    fn extra_segments_are_ignored() {
        let mut rec = record("CEF:0|v|p|1|sig|name|5|src=1.1.1.1|cnt=9");
        let out = transform().transform(&mut rec).unwrap();
        assert_eq!(out.resolve("source.ip"), Some(&Node::from("1.1.1.1")));
        assert_eq!(out.resolve("event.count"), None);
    }

    #[test]
    fn tenant_fields_are_removed() {
        let mut rec = Node::from(json!({
            "message": "CEF:0|v|p|1|sig|name|5|cnt=1",
            "TrendMicroDsTenant": "Primary",
            "TrendMicroDsTenantId": "0",
        }));
        let out = transform().transform(&mut rec).unwrap();
        assert_eq!(out.get("TrendMicroDsTenant"), None);
        assert_eq!(out.get("TrendMicroDsTenantId"), None);
    }

    #[test]
    fn tenant_fields_from_body_are_removed() {
        let mut rec = record("CEF:0|v|p|1|sig|name|5|TrendMicroDsTenant=Primary cnt=1");
        let out = transform().transform(&mut rec).unwrap();
        assert_eq!(out.get("TrendMicroDsTenant"), None);
        assert_eq!(out.resolve("event.count"), Some(&Node::from("1")));
    }

    #[test]
    fn existing_siblings_survive_header_write() {
        let mut rec = Node::from(json!({
            "message": "CEF:0|v|p|1|sig|name|5|cnt=1",
            "agent": {"type": "fluentd"},
        }));
        let out = transform().transform(&mut rec).unwrap();
        assert_eq!(out.resolve("agent.type"), Some(&Node::from("fluentd")));
        assert_eq!(out.resolve("agent.name"), Some(&Node::from("v p 1")));
    }

    #[test]
    fn message_field_is_kept() {
        let mut rec = record(SAMPLE);
        let out = transform().transform(&mut rec).unwrap();
        assert_eq!(out.get("message"), Some(&Node::from(SAMPLE)));
    }
}
