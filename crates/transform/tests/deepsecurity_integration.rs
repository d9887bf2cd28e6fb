//! 통합 테스트 -- Deep Security 이벤트 변환 전체 흐름 검증

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

use siemnorm_core::config::SiemnormConfig;
use siemnorm_core::error::TransformError;
use siemnorm_core::pipeline::LogTransform;
use siemnorm_core::record::{DROPPED, Node, Record};
use siemnorm_transform::{DeepSecurityTransform, KeyValueParser, TransformConfig};

const HEADER: &str = "CEF:0|Trend Micro|Deep Security Agent|20.0.0|1008610|Block Administrative Share|8|";

fn transform() -> DeepSecurityTransform {
    DeepSecurityTransform::new(TransformConfig::default()).expect("default config is valid")
}

fn event(body: &str) -> Record {
    Node::from(json!({ "message": format!("{HEADER}{body}") }))
}

/// 기본 속성 매핑 후 원시 키가 사라지는지 검증
#[test]
fn test_basic_body_maps_to_canonical_fields() {
    let table = KeyValueParser::new().parse("src=1.1.1.1 dst=2.2.2.2 act=Accept");
    let pairs: Vec<_> = table.iter().collect();
    assert_eq!(
        pairs,
        vec![("src", "1.1.1.1"), ("dst", "2.2.2.2"), ("act", "Accept")]
    );

    let mut record = event("src=1.1.1.1 dst=2.2.2.2 act=Accept");
    let out = transform().transform(&mut record).expect("well-formed event");

    assert_eq!(out.resolve("source.ip"), Some(&Node::from("1.1.1.1")));
    assert_eq!(out.resolve("destination.ip"), Some(&Node::from("2.2.2.2")));
    assert_eq!(out.resolve("event.action"), Some(&Node::from("Accept")));
    for raw in ["src", "dst", "act"] {
        assert_eq!(out.get(raw), None, "raw key {raw} should be removed");
    }
}

/// 이스케이프된 구분자와 마지막 필드 보정 검증
#[test]
fn test_escaped_delimiter_and_trailing_field() {
    let mut record = event(r"cnt=1 msg=a\=b fname=C:\Windows\evil.exe");
    let out = transform().transform(&mut record).expect("well-formed event");

    assert_eq!(out.resolve("event.count"), Some(&Node::from("1")));
    assert_eq!(out.resolve("event.original"), Some(&Node::from("a=b")));
    assert_eq!(
        out.resolve("file.path"),
        Some(&Node::from(r"C:\Windows\evil.exe"))
    );
    assert_eq!(out.get(r"C:\Windows\evil.exe"), None);
}

/// IP 검증 실패 시 원시 키 유지 검증
#[test]
fn test_invalid_ip_leaves_raw_key() {
    let mut record = event("dst=not-an-ip dpt=445 proto=TCP");
    let out = transform().transform(&mut record).expect("well-formed event");

    assert_eq!(out.resolve("destination.ip"), None);
    assert_eq!(out.get("dst"), Some(&Node::from("not-an-ip")));
    assert_eq!(out.resolve("destination.port"), Some(&Node::from("445")));
    assert_eq!(out.resolve("network.transport"), Some(&Node::from("TCP")));
}

/// 패킷 캡처의 쿠키 제거와 X-Forwarded-For 덮어쓰기 검증
#[test]
fn test_packet_scrub_and_forwarded_override() {
    let capture = STANDARD.encode("Cookie: abc\nGET / HTTP/1.1\nX-Forwarded-For: 9.9.9.9");
    let mut record = event(&format!(
        "src=10.1.1.1 spt=51000 TrendMicroDsPacketData={capture}"
    ));
    let out = transform().transform(&mut record).expect("well-formed event");

    assert_eq!(
        out.get("TrendMicroDsPacketData"),
        Some(&Node::from("GET / HTTP/1.1\nX-Forwarded-For: 9.9.9.9"))
    );
    assert_eq!(out.resolve("source.ip"), Some(&Node::from("9.9.9.9")));
    assert_eq!(out.resolve("source.port"), Some(&Node::from("51000")));
}

/// 점 네 개짜리 주소가 아닌 X-Forwarded-For 값은 source.ip를 바꾸지 않는지 검증
#[test]
fn test_overlong_forwarded_for_keeps_source_ip() {
    let capture = STANDARD.encode("GET / HTTP/1.1\nX-Forwarded-For: 10.0.0.1234\nA");
    let mut record = event(&format!("src=1.1.1.1 TrendMicroDsPacketData={capture}"));
    let out = transform().transform(&mut record).expect("well-formed event");

    assert_eq!(out.resolve("source.ip"), Some(&Node::from("1.1.1.1")));
}

/// 장비 주소 대체 검증
#[test]
fn test_device_address_fallback() {
    let mut record = event("dvc=172.16.0.10 dst=2.2.2.2");
    let out = transform().transform(&mut record).expect("well-formed event");

    assert_eq!(out.resolve("source.ip"), Some(&Node::from("172.16.0.10")));
    assert_eq!(out.get("dvc"), Some(&Node::from("172.16.0.10")));
}

/// 잘못된 형식은 건너뛰기 신호로 처리되는지 검증
#[test]
fn test_malformed_message_signals_drop() {
    let mut record = Node::from(json!({"message": "a|b|c"}));
    let result = transform().transform(&mut record);

    match result {
        Err(TransformError::Format { segments, .. }) => assert_eq!(segments, 3),
        other => panic!("expected format error, got {other:?}"),
    }
}

/// 따옴표가 포함된 값은 DROPPED로 대체되는지 검증
#[test]
fn test_value_with_quote_is_dropped() {
    let mut record = event(r#"cs1="quoted" cnt=2"#);
    let out = transform().transform(&mut record).expect("well-formed event");

    assert_eq!(out.resolve("rule.category"), Some(&Node::from(DROPPED)));
    assert_eq!(out.resolve("event.count"), Some(&Node::from("2")));
}

/// 헤더 필드가 매핑 결과와 같은 부모 아래 공존하는지 검증
#[test]
fn test_header_and_mapped_fields_share_parents() {
    let mut record = event("cs1=Intrusion cnt=3 act=IDS:Reset");
    let out = transform().transform(&mut record).expect("well-formed event");

    assert_eq!(
        out.get("rule"),
        Some(&Node::from(json!({
            "name": "1008610 Block Administrative Share",
            "category": "Intrusion",
        })))
    );
    assert_eq!(
        out.get("event"),
        Some(&Node::from(json!({
            "severity": "8",
            "count": "3",
            "action": "DetectOnly:NotReset",
        })))
    );
}

/// 설정 파일 값이 변환기에 반영되는지 검증
#[test]
fn test_transform_from_core_config() {
    let config = SiemnormConfig::parse(
        r#"
[deepsecurity]
packet_data_field = "Pcap"
decode_packet_data = false
"#,
    )
    .expect("valid toml");
    let transform = DeepSecurityTransform::from_core(&config.deepsecurity).expect("valid config");

    let mut record = event("src=1.1.1.1 Pcap=Q29va2llOiBh");
    let out = transform.transform(&mut record).expect("well-formed event");
    assert_eq!(out.get("Pcap"), Some(&Node::from("Q29va2llOiBh")));
}

/// 변환기를 여러 스레드에서 공유할 수 있는지 검증
#[test]
fn test_transform_is_shareable_across_threads() {
    let shared: Arc<dyn LogTransform> = Arc::new(transform());

    std::thread::scope(|scope| {
        for i in 0..4 {
            let shared = Arc::clone(&shared);
            scope.spawn(move || {
                let mut record = event(&format!("src=10.0.0.{i} cnt={i}"));
                let out = shared.transform(&mut record).expect("well-formed event");
                assert_eq!(
                    out.resolve("source.ip"),
                    Some(&Node::from(format!("10.0.0.{i}")))
                );
            });
        }
    });
}
