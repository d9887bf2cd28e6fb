//! 패킷 캡처 후처리
//!
//! Deep Security는 탐지 패킷을 base64로 인코딩하여 지정 필드에 싣습니다.
//! [`PacketCapturePostProcessor`]는 이를 텍스트로 되돌리고, 쿠키 헤더를 제거하며,
//! `X-Forwarded-For` 헤더가 있으면 그 주소를 `source.ip`로 사용합니다.
//!
//! 디코딩에 실패해도 원래 텍스트에 대해 쿠키 제거와 헤더 검색은 계속 수행합니다.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use siemnorm_core::record::{Node, Record};
use tracing::{debug, warn};

use crate::error::LogTransformError;
use crate::schema::SOURCE_IP;

/// 기본 패킷 캡처 필드
pub const DEFAULT_PACKET_FIELD: &str = "TrendMicroDsPacketData";

/// 프록시가 붙인 원 출발지 주소 헤더
///
/// 주소 뒤에 숫자나 `.`이 이어지면 점 네 개짜리 주소가 아니므로 매치하지 않습니다.
const FORWARDED_FOR_PATTERN: &str =
    r"X-Forwarded-For: ([0-9]{1,3}(?:\.[0-9]{1,3}){3})(?:[^0-9.]|$)";

/// 제거 대상 헤더 접두어 (소문자)
const COOKIE_PREFIX: &str = "cookie";

/// 후처리 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketReport {
    /// 패킷 필드가 있었는지 여부
    pub present: bool,
    /// base64 디코딩 성공 여부
    pub decoded: bool,
    /// 디코딩 실패 여부 (원본 유지)
    pub decode_failed: bool,
    /// 제거된 쿠키 라인 수
    pub cookies_removed: usize,
    /// source.ip를 덮어쓴 X-Forwarded-For 주소
    pub forwarded_for: Option<String>,
}

/// 패킷 캡처 후처리기
#[derive(Debug, Clone)]
pub struct PacketCapturePostProcessor {
    /// 패킷 캡처 필드명
    field: String,
    /// base64 디코딩 수행 여부
    decode: bool,
    /// 컴파일된 X-Forwarded-For 패턴
    forwarded_for: Regex,
}

impl PacketCapturePostProcessor {
    /// 필드명과 디코딩 여부로 후처리기를 생성합니다.
    pub fn new(field: impl Into<String>, decode: bool) -> Result<Self, LogTransformError> {
        Ok(Self {
            field: field.into(),
            decode,
            forwarded_for: Regex::new(FORWARDED_FOR_PATTERN)?,
        })
    }

    /// 패킷 캡처 필드명
    pub fn field(&self) -> &str {
        &self.field
    }

    /// 레코드의 패킷 캡처 필드를 제자리에서 후처리합니다.
    ///
    /// 필드가 없거나 문자열이 아니면 아무것도 하지 않습니다.
    pub fn process(&self, record: &mut Record) -> PacketReport {
        let mut report = PacketReport::default();
        let Some(raw) = record.get(&self.field).and_then(Node::as_str) else {
            return report;
        };
        let raw = raw.to_owned();
        report.present = true;

        let text = if self.decode {
            match decode_capture(&self.field, &raw) {
                Ok(text) => {
                    report.decoded = true;
                    text
                }
                Err(e) => {
                    warn!(field = %self.field, error = %e, "packet capture decode failed, keeping original");
                    report.decode_failed = true;
                    raw
                }
            }
        } else {
            raw
        };

        let (scrubbed, removed) = scrub_cookies(&text);
        report.cookies_removed = removed;

        if let Some(ip) = self.find_forwarded_for(&scrubbed).map(str::to_owned) {
            debug!(ip = %ip, "X-Forwarded-For overrides source.ip");
            record.set_path(SOURCE_IP, Node::from(ip.as_str()));
            report.forwarded_for = Some(ip);
        }

        record.insert(self.field.clone(), Node::Text(scrubbed));
        report
    }

    /// 텍스트에서 첫 번째 X-Forwarded-For IPv4 주소를 찾습니다.
    pub fn find_forwarded_for<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.forwarded_for
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// base64 패킷 캡처를 텍스트로 디코딩합니다.
///
/// ASCII 공백은 디코딩 전에 제거합니다. UTF-8이 아닌 바이트는 `\xNN`으로 표기합니다.
pub fn decode_capture(field: &str, encoded: &str) -> Result<String, LogTransformError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| LogTransformError::Encoding {
            field: field.to_owned(),
            reason: e.to_string(),
        })?;
    Ok(backslash_replace(&bytes))
}

/// 유효하지 않은 UTF-8 바이트를 소문자 `\xNN` 표기로 바꿉니다.
fn backslash_replace(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
        for byte in chunk.invalid() {
            out.push_str(&format!("\\x{byte:02x}"));
        }
    }
    out
}

/// `cookie`로 시작하는 라인(대소문자 무시, 앞 공백 무시)을 제거합니다.
///
/// 남은 라인과 제거된 라인 수를 반환합니다.
pub fn scrub_cookies(text: &str) -> (String, usize) {
    let mut removed = 0;
    let kept: Vec<&str> = text
        .split('\n')
        .filter(|line| {
            let is_cookie = line
                .trim_start()
                .to_lowercase()
                .starts_with(COOKIE_PREFIX);
            if is_cookie {
                removed += 1;
            }
            !is_cookie
        })
        .collect();
    (kept.join("\n"), removed)
}
