#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::json;

use siemnorm_core::pipeline::LogTransform;
use siemnorm_core::record::Node;
use siemnorm_transform::{DeepSecurityTransform, TransformConfig};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 헤더 세그먼트 (`|`로 결합)
    header: Vec<String>,
    /// 속성 본문
    body: String,
    /// 패킷 캡처 필드 값
    packet: Option<String>,
    /// 장비 주소
    dvc: Option<String>,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(transform) = DeepSecurityTransform::new(TransformConfig::default()) else {
        return;
    };

    let mut segments: Vec<String> = input.header.into_iter().take(10).collect();
    segments.push(input.body);
    let mut record = Node::from(json!({ "message": segments.join("|") }));
    if let Some(packet) = input.packet {
        record.insert("TrendMicroDsPacketData", Node::from(packet));
    }
    if let Some(dvc) = input.dvc {
        record.insert("dvc", Node::from(dvc));
    }

    // 형식 오류 이외의 실패는 없어야 함
    if let Err(e) = transform.transform(&mut record) {
        assert!(e.is_drop());
    }
});
