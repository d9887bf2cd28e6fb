//! 레코드 모델 -- 중첩 필드 구조와 경로 연산
//!
//! [`Node`]는 로그 레코드의 한 노드를 나타내는 태그드 variant입니다.
//! 모든 로그 소스 변환은 이 타입 위에서 동작하며, 다음 세 가지 경로 연산을 공유합니다.
//!
//! - [`Node::resolve`]: dot notation 경로(공백으로 구분된 별칭 허용)로 값 조회
//! - [`Node::build_path`]: 경로 위치에 값을 담은 단일 가지 중첩 구조 생성
//! - [`Node::merge`]: 새로 만든 중첩 구조를 기존 레코드에 병합
//!
//! # 사용 예시
//! ```
//! use siemnorm_core::record::Node;
//!
//! let mut record = Node::object();
//! record.merge(Node::build_path("source.ip", &Node::from("10.0.0.1")));
//! assert_eq!(
//!     record.resolve("source.ip").and_then(Node::as_str),
//!     Some("10.0.0.1"),
//! );
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// 안전하게 표현할 수 없는 값을 대신하는 리프 값
pub const DROPPED: &str = "DROPPED";

/// 변환 대상 레코드
///
/// 최상위는 항상 [`Node::Nested`]여야 합니다.
pub type Record = Node;

/// 레코드 노드
///
/// JSON 값과 1:1로 대응하며, `serde_json::Value`와 상호 변환됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Node {
    /// 값 없음
    #[default]
    Null,
    /// 불리언
    Bool(bool),
    /// 숫자
    Number(serde_json::Number),
    /// 문자열 스칼라
    Text(String),
    /// 순서 있는 시퀀스
    Sequence(Vec<Node>),
    /// 문자열 키 매핑
    Nested(BTreeMap<String, Node>),
}

/// [`Node::try_build_path`]의 결과
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    /// 생성된 중첩 구조
    pub node: Node,
    /// 리프 값이 [`DROPPED`]로 대체되었는지 여부
    pub dropped: bool,
}

impl Node {
    /// 빈 매핑 노드를 생성합니다.
    pub fn object() -> Self {
        Self::Nested(BTreeMap::new())
    }

    /// 문자열 스칼라이면 내용을 반환합니다.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 매핑 노드이면 내부 맵을 반환합니다.
    pub fn as_nested(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Self::Nested(map) => Some(map),
            _ => None,
        }
    }

    /// 매핑 노드이면 내부 맵을 가변 참조로 반환합니다.
    pub fn as_nested_mut(&mut self) -> Option<&mut BTreeMap<String, Node>> {
        match self {
            Self::Nested(map) => Some(map),
            _ => None,
        }
    }

    /// 매핑 노드 여부
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::Nested(_))
    }

    /// 매핑 노드의 최상위 키를 조회합니다. 경로 해석은 하지 않습니다.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_nested().and_then(|map| map.get(key))
    }

    /// 매핑 노드의 최상위 키를 가변 참조로 조회합니다.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.as_nested_mut().and_then(|map| map.get_mut(key))
    }

    /// 매핑 노드에 최상위 키를 설정합니다.
    ///
    /// 매핑이 아닌 노드는 변경하지 않고 `false`를 반환합니다.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) -> bool {
        match self.as_nested_mut() {
            Some(map) => {
                map.insert(key.into(), value);
                true
            }
            None => false,
        }
    }

    /// 매핑 노드에서 최상위 키를 제거합니다.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.as_nested_mut().and_then(|map| map.remove(key))
    }

    /// 값이 "비어 있는지" 판단합니다.
    ///
    /// `Null`, `false`, 0, 빈 문자열, 빈 시퀀스, 빈 매핑은 비어 있는 값으로 취급합니다.
    /// 경로 조회는 비어 있는 값을 "값 없음"과 동일하게 처리합니다.
    pub fn is_empty_value(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
            Self::Text(s) => s.is_empty(),
            Self::Sequence(items) => items.is_empty(),
            Self::Nested(map) => map.is_empty(),
        }
    }

    // --- PathResolver ---

    /// 공백으로 구분된 하나 이상의 dot notation 경로로 값을 조회합니다.
    ///
    /// 경로는 왼쪽부터 순서대로 시도하며, 비어 있지 않은 첫 번째 값을 반환합니다.
    /// 각 세그먼트는 정수로 해석되면 시퀀스 인덱스로, 아니면 매핑 키로 사용합니다.
    /// 키 없음, 컨테이너 타입 불일치, 인덱스 범위 초과는 모두 `None`입니다.
    pub fn resolve(&self, path_expr: &str) -> Option<&Node> {
        self.resolve_with_path(path_expr).map(|(_, node)| node)
    }

    /// [`resolve`](Self::resolve)와 같지만, 값을 찾은 별칭 경로도 함께 반환합니다.
    pub fn resolve_with_path<'p>(&self, path_expr: &'p str) -> Option<(&'p str, &Node)> {
        path_expr.split_whitespace().find_map(|path| {
            self.lookup(path)
                .filter(|node| !node.is_empty_value())
                .map(|node| (path, node))
        })
    }

    /// 단일 dot notation 경로를 따라 내려갑니다. 빈 값도 그대로 반환합니다.
    fn lookup(&self, path: &str) -> Option<&Node> {
        path.split('.')
            .try_fold(self, |node, segment| node.child(segment))
    }

    fn child(&self, segment: &str) -> Option<&Node> {
        match segment.parse::<i64>() {
            Ok(index) => match self {
                Self::Sequence(items) => sequence_index(items.len(), index).map(|i| &items[i]),
                _ => None,
            },
            Err(_) => self.get(segment),
        }
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut Node> {
        match segment.parse::<i64>() {
            Ok(index) => match self {
                Self::Sequence(items) => {
                    sequence_index(items.len(), index).map(move |i| &mut items[i])
                }
                _ => None,
            },
            Err(_) => self.as_nested_mut().and_then(|map| map.get_mut(segment)),
        }
    }

    /// 단일 dot notation 경로의 값을 제거합니다.
    ///
    /// 리프만 제거하며, 비게 된 상위 컨테이너는 그대로 둡니다.
    pub fn delete_path(&mut self, path: &str) -> Option<Node> {
        let (parent_path, leaf) = match path.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, path),
        };

        let parent = match parent_path {
            Some(parent_path) => parent_path
                .split('.')
                .try_fold(self, |node, segment| node.child_mut(segment))?,
            None => self,
        };

        match leaf.parse::<i64>() {
            Ok(index) => match parent {
                Self::Sequence(items) => {
                    sequence_index(items.len(), index).map(|i| items.remove(i))
                }
                _ => None,
            },
            Err(_) => parent.remove(leaf),
        }
    }

    // --- NestedPathBuilder ---

    /// 경로 위치에 값을 담은 단일 가지 중첩 구조를 생성합니다.
    ///
    /// 매핑은 리프에 그대로 삽입하고, 나머지는 문자열로 저장합니다.
    /// 시퀀스는 JSON 텍스트로 직렬화됩니다.
    /// 안전하게 표현할 수 없는 값은 [`DROPPED`]로 대체됩니다.
    pub fn build_path(path: &str, value: &Node) -> Node {
        let outcome = Self::try_build_path(path, value);
        if outcome.dropped {
            debug!(path, "value replaced with DROPPED placeholder");
        }
        outcome.node
    }

    /// [`build_path`](Self::build_path)의 결과에 대체 여부를 함께 반환합니다.
    ///
    /// 이스케이프되지 않은 큰따옴표(`"`)를 포함한 스칼라는 [`DROPPED`]로 대체됩니다.
    pub fn try_build_path(path: &str, value: &Node) -> BuildOutcome {
        let (leaf, dropped) = match value {
            Self::Nested(_) => (value.clone(), false),
            Self::Sequence(_) => (Self::Text(value.to_string()), false),
            scalar => {
                let text = scalar.to_string();
                if has_unescaped_quote(&text) {
                    (Self::Text(DROPPED.to_owned()), true)
                } else {
                    (Self::Text(text), false)
                }
            }
        };

        BuildOutcome {
            node: wrap_path(path, leaf),
            dropped,
        }
    }

    /// 값을 변환 없이 경로 위치에 설정합니다.
    ///
    /// [`put_path`](Self::put_path)와 달리 스칼라를 문자열로 바꾸거나
    /// [`DROPPED`]로 대체하지 않습니다. 경로 상의 기존 형제 키는 유지됩니다.
    pub fn set_path(&mut self, path: &str, value: Node) -> &mut Self {
        self.merge(wrap_path(path, value))
    }

    /// 경로 위치에 값을 생성하여 현재 레코드에 병합합니다.
    ///
    /// 값이 [`DROPPED`]로 대체되었으면 `true`를 반환합니다.
    pub fn put_path(&mut self, path: &str, value: &Node) -> bool {
        let outcome = Self::try_build_path(path, value);
        if outcome.dropped {
            debug!(path, "value replaced with DROPPED placeholder");
        }
        self.merge(outcome.node);
        outcome.dropped
    }

    // --- DeepMerger ---

    /// `src`를 현재 노드에 병합하고 현재 노드를 반환합니다.
    ///
    /// 키별 규칙:
    /// - 대상에 없는 키: 삽입
    /// - 양쪽 모두 매핑: 재귀 병합
    /// - 동일한 리프: 변경 없음
    /// - 그 외: `src` 값으로 덮어쓰기 (기존 값의 문자열 표현이 새 값에 포함된 경우 포함)
    ///
    /// 현재 노드나 `src`가 매핑이 아니면 현재 노드를 `src`로 교체합니다.
    pub fn merge(&mut self, src: Node) -> &mut Self {
        match src {
            Self::Nested(incoming) => match &mut *self {
                Self::Nested(dst) => merge_maps(dst, incoming),
                slot => *slot = Self::Nested(incoming),
            },
            other => *self = other,
        }
        self
    }
}

/// 병합 충돌의 해석
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// 기존 값의 문자열 표현이 새 값에 포함됨 (같은 값의 다른 표현)
    Supersedes,
    /// 서로 무관한 값, 나중 값 우선
    Conflict,
}

fn merge_maps(dst: &mut BTreeMap<String, Node>, src: BTreeMap<String, Node>) {
    for (key, incoming) in src {
        match dst.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if existing.is_nested() && incoming.is_nested() {
                    existing.merge(incoming);
                    continue;
                }
                if *existing == incoming {
                    continue;
                }

                let resolution = if incoming.to_string().contains(&existing.to_string()) {
                    Resolution::Supersedes
                } else {
                    Resolution::Conflict
                };
                trace!(key = slot.key().as_str(), ?resolution, "overwriting leaf on merge");
                *slot.get_mut() = incoming;
            }
        }
    }
}

fn wrap_path(path: &str, leaf: Node) -> Node {
    path.rsplit('.').fold(leaf, |acc, segment| {
        let mut map = BTreeMap::new();
        map.insert(segment.to_owned(), acc);
        Node::Nested(map)
    })
}

/// 음수 인덱스는 끝에서부터 셉니다.
fn sequence_index(len: usize, index: i64) -> Option<usize> {
    let resolved = if index < 0 {
        i64::try_from(len).ok()?.checked_add(index)?
    } else {
        index
    };
    usize::try_from(resolved).ok().filter(|i| *i < len)
}

fn has_unescaped_quote(text: &str) -> bool {
    let mut escaped = false;
    for ch in text.chars() {
        match ch {
            '\\' => escaped = !escaped,
            '"' if !escaped => return true,
            _ => escaped = false,
        }
    }
    false
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Sequence(_) | Self::Nested(_) => {
                let value = serde_json::Value::from(self.clone());
                write!(f, "{value}")
            }
        }
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Nested(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<Node> for serde_json::Value {
    fn from(node: Node) -> Self {
        match node {
            Node::Null => Self::Null,
            Node::Bool(b) => Self::Bool(b),
            Node::Number(n) => Self::Number(n),
            Node::Text(s) => Self::String(s),
            Node::Sequence(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Node::Nested(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}
