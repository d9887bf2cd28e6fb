//! 표준 스키마 매핑
//!
//! [`SchemaMapper`]는 (표준 경로, 원시 키) 쌍의 정적 테이블을 순서대로 적용하여
//! 벤더 필드를 표준 중첩 필드로 옮깁니다.
//!
//! 각 쌍에 대해:
//! 1. 원시 키(공백으로 구분된 별칭 허용)로 값을 조회, 없거나 비어 있으면 건너뜀
//! 2. 표준 경로에 `ip` 세그먼트가 있으면 값이 IPv4/IPv6 리터럴인지 검증.
//!    실패하면 병합도 삭제도 하지 않음
//! 3. 표준 경로로 중첩 구조를 만들어 레코드에 병합한 뒤, 값을 찾은 원시 키를 삭제
//!
//! 루프가 끝난 뒤 `source.ip`가 없고 장비 주소 필드가 있으면 이를 `source.ip`로 사용합니다.

use std::net::IpAddr;

use siemnorm_core::record::{Node, Record};
use tracing::debug;

use crate::error::LogTransformError;

/// 출발지 IP 표준 경로
pub const SOURCE_IP: &str = "source.ip";

/// IP 검증 대상임을 나타내는 경로 세그먼트
const IP_SEGMENT: &str = "ip";

/// Deep Security 필드 → 표준 스키마 매핑
pub const DEEPSECURITY_MAPPING: SchemaMappingTable = SchemaMappingTable::new(&[
    ("destination.ip", "dst"),
    ("destination.port", "dpt"),
    ("destination.mac", "dmac"),
    ("destination.bytes", "out"),
    ("source.ip", "src"),
    ("source.port", "spt"),
    ("source.mac", "smac"),
    ("source.bytes", "in"),
    ("network.transport", "proto"),
    ("event.action", "act"),
    ("server.name", "fluent_hostname"),
    ("file.path", "fname"),
    ("event.count", "cnt"),
    ("rule.category", "cs1"),
    ("host.id", "cn1"),
    ("event.original", "msg"),
]);

/// (표준 경로, 원시 키) 쌍의 정적 매핑 테이블
///
/// 원시 키는 공백으로 구분된 하나 이상의 dot notation 별칭입니다.
#[derive(Debug, Clone, Copy)]
pub struct SchemaMappingTable {
    pairs: &'static [(&'static str, &'static str)],
}

impl SchemaMappingTable {
    /// 정적 쌍 목록으로 테이블을 생성합니다.
    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self { pairs }
    }

    /// 테이블 순서대로 (표준 경로, 원시 키)를 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.pairs.iter().copied()
    }

    /// 매핑 쌍 수
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// 매핑 결과 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingReport {
    /// 표준 경로로 옮겨진 필드 수
    pub mapped: usize,
    /// IP 검증 실패로 건너뛴 필드 수
    pub skipped_invalid_ip: usize,
    /// 값이 DROPPED로 대체된 필드 수
    pub dropped: usize,
    /// 장비 주소로 source.ip를 채웠는지 여부
    pub device_fallback: bool,
}

/// 표준 스키마 매퍼
#[derive(Debug, Clone)]
pub struct SchemaMapper {
    /// 매핑 테이블
    table: SchemaMappingTable,
    /// source.ip 대체에 사용하는 장비 주소 필드
    device_address_field: String,
}

impl SchemaMapper {
    /// 매핑 테이블과 장비 주소 필드로 매퍼를 생성합니다.
    pub fn new(table: SchemaMappingTable, device_address_field: impl Into<String>) -> Self {
        Self {
            table,
            device_address_field: device_address_field.into(),
        }
    }

    /// 사용 중인 매핑 테이블
    pub fn table(&self) -> SchemaMappingTable {
        self.table
    }

    /// 레코드를 제자리에서 표준 스키마로 매핑합니다.
    pub fn map(&self, record: &mut Record) -> MappingReport {
        let mut report = MappingReport::default();

        for (canonical, raw_key) in self.table.iter() {
            let Some((alias, value)) = record
                .resolve_with_path(raw_key)
                .map(|(alias, value)| (alias, value.clone()))
            else {
                continue;
            };

            if is_ip_path(canonical) {
                if let Err(e) = validate_ip(canonical, &value) {
                    debug!(canonical, alias, error = %e, "skipping unmappable IP field");
                    report.skipped_invalid_ip += 1;
                    continue;
                }
            }

            let outcome = Node::try_build_path(canonical, &value);
            if outcome.dropped {
                debug!(canonical, alias, "value replaced with DROPPED placeholder");
                report.dropped += 1;
            }
            record.merge(outcome.node);
            record.delete_path(alias);
            report.mapped += 1;
        }

        report.device_fallback = self.apply_device_fallback(record);
        report
    }

    /// `source.ip`가 비어 있으면 장비 주소를 출발지로 사용합니다.
    fn apply_device_fallback(&self, record: &mut Record) -> bool {
        if record.resolve(SOURCE_IP).is_some() {
            return false;
        }
        let Some(device) = record.resolve(&self.device_address_field).cloned() else {
            return false;
        };

        debug!(device = %device, "using device address as source.ip");
        record.set_path(SOURCE_IP, device);
        true
    }
}

/// 경로에 `ip` 세그먼트가 있는지 여부
pub fn is_ip_path(path: &str) -> bool {
    path.split('.').any(|segment| segment == IP_SEGMENT)
}

/// 값이 IPv4/IPv6 리터럴인지 검증합니다.
pub fn validate_ip(path: &str, value: &Node) -> Result<IpAddr, LogTransformError> {
    let text = value.to_string();
    text.parse::<IpAddr>()
        .map_err(|_| LogTransformError::Validation {
            path: path.to_owned(),
            value: text,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Node::from(value)
    }

    fn mapper() -> SchemaMapper {
        SchemaMapper::new(DEEPSECURITY_MAPPING, "dvc")
    }

    #[test]
    fn maps_and_removes_raw_fields() {
        let mut rec = record(json!({"src": "1.1.1.1", "dst": "2.2.2.2", "act": "Accept"}));
        let report = mapper().map(&mut rec);

        assert_eq!(report.mapped, 3);
        assert_eq!(
            rec,
            record(json!({
                "source": {"ip": "1.1.1.1"},
                "destination": {"ip": "2.2.2.2"},
                "event": {"action": "Accept"},
            }))
        );
    }

    #[test]
    fn invalid_ip_is_skipped_and_raw_key_kept() {
        let mut rec = record(json!({"dst": "not-an-ip", "dpt": "443"}));
        let report = mapper().map(&mut rec);

        assert_eq!(report.skipped_invalid_ip, 1);
        assert_eq!(rec.resolve("destination.ip"), None);
        assert_eq!(rec.get("dst"), Some(&Node::from("not-an-ip")));
        assert_eq!(rec.resolve("destination.port"), Some(&Node::from("443")));
    }

    #[test]
    fn ip_with_surrounding_whitespace_is_rejected() {
        let mut rec = record(json!({"src": " 1.1.1.1\t"}));
        let report = mapper().map(&mut rec);

        assert_eq!(report.skipped_invalid_ip, 1);
        assert_eq!(rec.resolve("source.ip"), None);
        assert_eq!(rec.get("src"), Some(&Node::from(" 1.1.1.1\t")));
    }

    #[test]
    fn ipv6_literal_is_accepted() {
        let mut rec = record(json!({"src": "2001:db8::1"}));
        mapper().map(&mut rec);
        assert_eq!(rec.resolve("source.ip"), Some(&Node::from("2001:db8::1")));
        assert_eq!(rec.get("src"), None);
    }

    #[test]
    fn numeric_values_become_strings() {
        let mut rec = record(json!({"cnt": 7, "in": 1500}));
        mapper().map(&mut rec);
        assert_eq!(rec.resolve("event.count"), Some(&Node::from("7")));
        assert_eq!(rec.resolve("source.bytes"), Some(&Node::from("1500")));
    }

    #[test]
    fn sequence_values_become_strings() {
        let mut rec = record(json!({"cnt": ["1", "2"]}));
        mapper().map(&mut rec);
        assert_eq!(rec.resolve("event.count"), Some(&Node::from(r#"["1","2"]"#)));
        assert_eq!(rec.get("cnt"), None);
    }

    #[test]
    fn mapped_values_merge_with_existing_siblings() {
        let mut rec = record(json!({"event": {"severity": "6"}, "act": "Reset"}));
        mapper().map(&mut rec);
        assert_eq!(
            rec.get("event"),
            Some(&record(json!({"severity": "6", "action": "Reset"})))
        );
    }

    #[test]
    fn unsafe_value_is_dropped_but_mapped() {
        let mut rec = record(json!({"msg": r#"say "hi""#}));
        let report = mapper().map(&mut rec);
        assert_eq!(report.dropped, 1);
        assert_eq!(rec.resolve("event.original"), Some(&Node::from("DROPPED")));
        assert_eq!(rec.get("msg"), None);
    }

    #[test]
    fn device_address_fills_missing_source_ip() {
        let mut rec = record(json!({"dvc": "10.0.0.5", "spt": "5555"}));
        let report = mapper().map(&mut rec);
        assert!(report.device_fallback);
        assert_eq!(
            rec.get("source"),
            Some(&record(json!({"ip": "10.0.0.5", "port": "5555"})))
        );
        assert_eq!(rec.get("dvc"), Some(&Node::from("10.0.0.5")));
    }

    #[test]
    fn device_address_does_not_override_source_ip() {
        let mut rec = record(json!({"dvc": "10.0.0.5", "src": "1.1.1.1"}));
        let report = mapper().map(&mut rec);
        assert!(!report.device_fallback);
        assert_eq!(rec.resolve("source.ip"), Some(&Node::from("1.1.1.1")));
    }

    #[test]
    fn alias_fallback_deletes_matching_alias_only() {
        const TABLE: SchemaMappingTable =
            SchemaMappingTable::new(&[("host.name", "hostname device.name")]);
        let mut rec = record(json!({"device": {"name": "ips-01", "model": "x"}}));
        SchemaMapper::new(TABLE, "dvc").map(&mut rec);

        assert_eq!(rec.resolve("host.name"), Some(&Node::from("ips-01")));
        assert_eq!(rec.get("device"), Some(&record(json!({"model": "x"}))));
    }

    #[test]
    fn empty_values_are_skipped() {
        let mut rec = record(json!({"src": "", "proto": "TCP"}));
        let report = mapper().map(&mut rec);
        assert_eq!(report.mapped, 1);
        assert_eq!(rec.get("src"), Some(&Node::from("")));
    }

    #[test]
    fn ip_path_detection_uses_segments() {
        assert!(is_ip_path("source.ip"));
        assert!(is_ip_path("ip"));
        assert!(!is_ip_path("source.ipv4"));
        assert!(!is_ip_path("network.zip"));
    }

    #[test]
    fn deepsecurity_table_order_is_stable() {
        let first: Vec<_> = DEEPSECURITY_MAPPING.iter().take(2).collect();
        assert_eq!(
            first,
            vec![("destination.ip", "dst"), ("destination.port", "dpt")]
        );
        assert_eq!(DEEPSECURITY_MAPPING.len(), 16);
    }
}
