//! key=value 속성 본문 파서
//!
//! Deep Security 로그의 마지막 헤더 세그먼트는 `k1=v1 단어들 k2=v2 ... kN=vN` 형식의
//! 속성 본문입니다. 값 안의 `=`는 `\=`로 이스케이프됩니다.
//!
//! # 알고리즘
//! 1. `\=`를 내부 센티넬로 치환하여 구분자에서 제외
//! 2. 이스케이프되지 않은 `=`로 분할, 첫 조각은 첫 번째 키 이름
//! 3. 이후 각 조각을 공백으로 나누어, 마지막 토큰은 **다음** 키 이름,
//!    나머지 토큰(공백 하나로 결합)은 **현재** 키의 값
//! 4. 마지막 조각의 "다음 키"는 뒤따르는 `=`가 없으므로 직전 키의 값 뒤에
//!    구분자 없이 이어 붙여 그 키의 최종 값으로 사용
//!
//! 키 이름에 공백이 없다고 가정하므로, 값 안에 `word=` 형태의 토큰이 있으면
//! 잘못 분할됩니다. 이는 형식 자체의 제약입니다.
//!
//! # 사용 예시
//! ```
//! use siemnorm_transform::kv::KeyValueParser;
//!
//! let table = KeyValueParser::new().parse("src=1.1.1.1 dst=2.2.2.2 act=Accept");
//! assert_eq!(table.get("src"), Some("1.1.1.1"));
//! assert_eq!(table.get("act"), Some("Accept"));
//! ```

use tracing::trace;

/// 이스케이프된 구분자
const ESCAPED_DELIMITER: &str = "\\=";

/// 이스케이프된 구분자를 잠시 대신하는 내부 토큰 (Unicode 사설 영역)
const ESCAPE_SENTINEL: &str = "\u{E000}EQ\u{E000}";

/// 키-값 구분자
const DELIMITER: char = '=';

/// 파싱된 속성 테이블
///
/// 삽입 순서를 유지하며 키는 중복되지 않습니다.
/// 같은 키가 다시 나오면 첫 위치를 유지한 채 값만 덮어씁니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    entries: Vec<(String, String)>,
}

impl AttributeTable {
    /// 키의 값을 조회합니다.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 속성 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 속성이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 삽입 순서대로 (키, 값)을 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 키 또는 값이 비어 있으면 무시합니다.
    fn insert(&mut self, key: &str, value: String) {
        if key.is_empty() || value.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_owned(), value)),
        }
    }
}

impl IntoIterator for AttributeTable {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// key=value 속성 본문 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueParser;

impl KeyValueParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 속성 본문을 순서 있는 속성 테이블로 파싱합니다.
    ///
    /// `=`가 하나도 없는 본문은 빈 테이블을 반환합니다.
    pub fn parse(&self, body: &str) -> AttributeTable {
        let masked = body.replace(ESCAPED_DELIMITER, ESCAPE_SENTINEL);
        let mut chunks = masked.split(DELIMITER);
        let mut table = AttributeTable::default();

        let mut next_key = chunks.next().unwrap_or_default().trim().to_owned();
        // 마지막으로 처리한 (키, 계산된 값), 꼬리 보정에 사용
        let mut last: Option<(String, String)> = None;

        for chunk in chunks {
            let mut tokens: Vec<&str> = chunk.split_whitespace().collect();
            let current_key = std::mem::replace(
                &mut next_key,
                tokens.pop().unwrap_or_default().to_owned(),
            );
            let value = tokens.join(" ");

            table.insert(&current_key, unmask(&value));
            last = Some((current_key, value));
        }

        // 꼬리 보정: 마지막 "다음 키"는 실제로는 직전 키 값의 끝부분
        if let Some((key, mut value)) = last {
            value.push_str(&next_key);
            table.insert(&key, unmask(&value));
        }

        trace!(attributes = table.len(), "parsed attribute body");
        table
    }
}

fn unmask(value: &str) -> String {
    value.replace(ESCAPE_SENTINEL, "=")
}
